use super::*;

use std::io::Cursor;
use std::path::PathBuf;

use crate::schema::{AreaKind, AttrType, AuthorityArea, Class, IndexKind, Registry};

#[test]
fn parse_translate_validate_emit_round_trip() {
    let mut class = Class::new("network", PathBuf::from("/tmp/net"));
    class.add_attribute(
        crate::schema::Attribute::new("ID", 1, AttrType::Id, IndexKind::Exact)
            .set_primary_key(true)
            .set_required(true),
    );
    class.add_attribute(crate::schema::Attribute::new(
        "Network-Name",
        2,
        AttrType::Text,
        IndexKind::All,
    ));

    let mut registry = Registry::new();
    let mut area = AuthorityArea::new("net", AreaKind::Primary, PathBuf::from("/tmp/net"));
    area.add_class(class);
    registry.add_area(area);
    registry.assign_global_ids();
    let class = registry.area("net").unwrap().class("network").unwrap();

    let mut cursor = Cursor::new(b"ID:1\nNetwork-Name:ACME-NET\n---\n".to_vec());
    let outcome = AnonymousRecord::parse_next(&mut cursor).unwrap().unwrap();
    let anon = match outcome {
        ParseOutcome::Record(r) => r,
        ParseOutcome::Deleted => panic!("expected a live record"),
    };

    let typed = anon.translate(class, "net", true).unwrap();
    assert!(validate(&typed, class, ValidationMode::FIND_ALL).unwrap().is_empty());

    let mut out = Vec::new();
    typed.to_anonymous().emit(&mut out).unwrap();
    assert_eq!(out, b"ID:1\nNetwork-Name:ACME-NET\n---\n".to_vec());
}
