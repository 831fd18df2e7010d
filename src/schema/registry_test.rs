use super::*;

use std::path::PathBuf;

use crate::schema::{AreaKind, AttrType, Class, IndexKind};

fn attr(name: &str, local_id: u32) -> crate::schema::Attribute {
    crate::schema::Attribute::new(name, local_id, AttrType::Text, IndexKind::Exact)
}

#[test]
fn same_attribute_name_across_areas_shares_global_id() {
    let mut net_a = Class::new("network", PathBuf::from("/tmp/a"));
    net_a.add_attribute(attr("network-name", 1));

    let mut net_b = Class::new("network", PathBuf::from("/tmp/b"));
    net_b.add_attribute(attr("network-name", 1));

    let mut area_a = AuthorityArea::new("a", AreaKind::Primary, PathBuf::from("/tmp/a"));
    area_a.add_class(net_a);
    let mut area_b = AuthorityArea::new("b", AreaKind::Primary, PathBuf::from("/tmp/b"));
    area_b.add_class(net_b);

    let mut registry = Registry::new();
    registry.add_area(area_a).add_area(area_b);
    registry.assign_global_ids();

    let id_a = registry.area("a").unwrap().class("network").unwrap().attributes[0].global_id;
    let id_b = registry.area("b").unwrap().class("network").unwrap().attributes[0].global_id;
    assert_eq!(id_a, id_b);
    assert_ne!(id_a, 0);
}

#[test]
fn distinct_names_get_distinct_ids() {
    assert_ne!(Registry::new().define_attribute("handle"), Registry::new().define_attribute("handle") + 1);

    let mut registry = Registry::new();
    let h = registry.define_attribute("handle");
    let n = registry.define_attribute("network-name");
    assert_ne!(h, n);
    assert_eq!(registry.define_attribute("handle"), h);
}

#[test]
fn lookup_class_reports_unknown_area_and_class() {
    let mut registry = Registry::new();
    let mut area = AuthorityArea::new("net", AreaKind::Primary, PathBuf::from("/tmp/net"));
    area.add_class(Class::new("network", PathBuf::from("/tmp/net")));
    registry.add_area(area);

    assert_eq!(
        registry.lookup_class("missing", "network").unwrap_err().kind(),
        "UNKNOWN_AUTH_AREA"
    );
    assert_eq!(
        registry.lookup_class("net", "missing").unwrap_err().kind(),
        "UNKNOWN_CLASS"
    );
    assert!(registry.lookup_class("net", "network").is_ok());
}
