use super::*;

use std::io::Cursor;
use std::path::PathBuf;

use crate::schema::{AttrType, Class, IndexKind};

fn sample_class() -> Class {
    let mut class = Class::new("network", PathBuf::from("/tmp/net"));
    class.add_attribute(
        crate::schema::Attribute::new("ID", 1, AttrType::Id, IndexKind::Exact).set_primary_key(true),
    );
    class.add_attribute(crate::schema::Attribute::new(
        "Network-Name",
        2,
        AttrType::Text,
        IndexKind::All,
    ));
    class
}

#[test]
fn parse_single_record() {
    let text = "ID:1\nNetwork-Name:ACME-NET\n---\n";
    let mut cursor = Cursor::new(text.as_bytes());

    let outcome = AnonymousRecord::parse_next(&mut cursor).unwrap().unwrap();
    let record = match outcome {
        ParseOutcome::Record(r) => r,
        ParseOutcome::Deleted => panic!("expected a live record"),
    };
    assert_eq!(
        record.pairs,
        vec![
            ("ID".to_string(), "1".to_string()),
            ("Network-Name".to_string(), "ACME-NET".to_string()),
        ]
    );

    assert!(AnonymousRecord::parse_next(&mut cursor).unwrap().is_none());
}

#[test]
fn parse_record_with_no_trailing_separator_at_eof() {
    let text = "ID:1\nNetwork-Name:ACME-NET\n";
    let mut cursor = Cursor::new(text.as_bytes());

    let outcome = AnonymousRecord::parse_next(&mut cursor).unwrap().unwrap();
    match outcome {
        ParseOutcome::Record(r) => assert_eq!(r.pairs.len(), 2),
        ParseOutcome::Deleted => panic!("expected a live record"),
    }
}

#[test]
fn parse_multi_line_continuation_joins_with_newline() {
    let text = "Notes:first line\\\nsecond line\n---\n";
    let mut cursor = Cursor::new(text.as_bytes());

    let outcome = AnonymousRecord::parse_next(&mut cursor).unwrap().unwrap();
    match outcome {
        ParseOutcome::Record(r) => {
            assert_eq!(r.pairs[0], ("Notes".to_string(), "first line\nsecond line".to_string()))
        }
        ParseOutcome::Deleted => panic!("expected a live record"),
    }
}

#[test]
fn parse_soft_deleted_record_is_consumed_and_reported() {
    let text = "_D:1\n_Network-Name:ACME-NET\n---\nID:2\n---\n";
    let mut cursor = Cursor::new(text.as_bytes());

    assert!(matches!(
        AnonymousRecord::parse_next(&mut cursor).unwrap().unwrap(),
        ParseOutcome::Deleted
    ));
    let next = AnonymousRecord::parse_next(&mut cursor).unwrap().unwrap();
    match next {
        ParseOutcome::Record(r) => assert_eq!(r.pairs[0].1, "2"),
        ParseOutcome::Deleted => panic!("expected the second record to be live"),
    }
}

#[test]
fn emit_round_trips_multi_line_values() {
    let record = AnonymousRecord::new(vec![("Notes".to_string(), "a\nb".to_string())]);
    let mut buf = Vec::new();
    record.emit(&mut buf).unwrap();
    assert_eq!(String::from_utf8(buf).unwrap(), "Notes:a\\\nb\n---\n");
}

#[test]
fn translate_strict_rejects_unknown_attribute() {
    let class = sample_class();
    let anon = AnonymousRecord::new(vec![("Bogus".to_string(), "x".to_string())]);

    let err = anon.translate(&class, "net", true).unwrap_err();
    assert_eq!(err.kind(), "UNKNOWN_ATTRIBUTE");

    let typed = anon.translate(&class, "net", false).unwrap();
    assert_eq!(typed.fields[0].global_id, 0);
}

#[test]
fn translate_binds_global_id_and_round_trips_to_anonymous() {
    let mut class = sample_class();
    let mut registry = crate::schema::Registry::new();
    let mut area = crate::schema::AuthorityArea::new(
        "net",
        crate::schema::AreaKind::Primary,
        PathBuf::from("/tmp/net"),
    );
    area.add_class(std::mem::replace(&mut class, Class::new("x", PathBuf::from("/tmp"))));
    registry.add_area(area);
    registry.assign_global_ids();
    let class = registry.area("net").unwrap().class("network").unwrap();

    let anon = AnonymousRecord::new(vec![
        ("ID".to_string(), "1".to_string()),
        ("Network-Name".to_string(), "ACME-NET".to_string()),
    ]);
    let typed = anon.translate(class, "net", true).unwrap();
    assert_ne!(typed.fields[1].global_id, 0);
    assert_eq!(typed.id(), Some("1"));
    assert_eq!(typed.to_anonymous(), anon);
}
