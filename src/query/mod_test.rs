use super::*;

use std::fs;
use std::path::PathBuf;

use crate::files::FileRegistry;
use crate::index::{build_indexes, IndexBuildInput};
use crate::schema::{AttrType, Attribute, Class, IndexKind as SchemaIndexKind};

fn built() -> (tempfile::TempDir, Class) {
    let dir = tempfile::tempdir().unwrap();
    let mut class = Class::new("network", PathBuf::from("/tmp"));
    class.add_attribute(
        Attribute::new("ID", 1, AttrType::Id, SchemaIndexKind::Exact).set_primary_key(true),
    );
    class.add_attribute(Attribute::new("Handle", 2, AttrType::Text, SchemaIndexKind::Exact));
    class.add_attribute(Attribute::new("Comment", 3, AttrType::Text, SchemaIndexKind::Exact));
    for attr in class.attributes.iter_mut() {
        attr.global_id = attr.local_id;
    }

    fs::write(
        dir.path().join("network.tmp"),
        b"ID:1\nHandle:ACME-1\nComment:Primary contact\n---\nID:2\nHandle:WIDGET-1\nComment:Secondary contact\n---\n",
    )
    .unwrap();
    let mut registry = FileRegistry::load(dir.path().to_path_buf()).unwrap();
    build_indexes(
        &class,
        "net",
        &mut registry,
        vec![IndexBuildInput {
            base_filename: "network.tmp".to_string(),
        }],
        &crate::index::IndexerConfig::default(),
    )
    .unwrap();
    (dir, class)
}

#[test]
fn disjunction_unions_hits_across_conjuncts() {
    let (dir, class) = built();
    let registry = FileRegistry::load(dir.path().to_path_buf()).unwrap();

    let first = Conjunct::new(
        Term::new(Some("Handle"), SearchType::Binary, Compare::Full, "ACME-1"),
        vec![],
    );
    let second = Conjunct::new(
        Term::new(Some("Handle"), SearchType::Binary, Compare::Full, "WIDGET-1"),
        vec![],
    );
    let query = Query::new(vec![first, second]);
    let outcome = run_query(&registry, &class, "net", &query, &QueryPolicy::default()).unwrap();

    assert_eq!(outcome.records.len(), 2);
}

#[test]
fn overlapping_disjuncts_deduplicate_to_a_single_hit() {
    let (dir, class) = built();
    let registry = FileRegistry::load(dir.path().to_path_buf()).unwrap();

    let first = Conjunct::new(
        Term::new(Some("Handle"), SearchType::Binary, Compare::Full, "ACME-1"),
        vec![],
    );
    let second = Conjunct::new(
        Term::new(Some("Comment"), SearchType::FullScan, Compare::Substring, "PRIMARY"),
        vec![],
    );
    let query = Query::new(vec![first, second]);
    let outcome = run_query(&registry, &class, "net", &query, &QueryPolicy::default()).unwrap();

    assert_eq!(outcome.records.len(), 1);
    assert_eq!(outcome.records[0].value_of("Handle"), Some("ACME-1"));
}
