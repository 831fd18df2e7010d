use super::*;

use std::path::PathBuf;

use crate::files::FileRegistry;
use crate::schema::{AttrType, Attribute, Class, IndexKind};

struct Fixture {
    _dir: tempfile::TempDir,
    class: Class,
    registry: FileRegistry,
    soa_path: PathBuf,
}

fn fixture() -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let data_dir = dir.path().join("data");
    std::fs::create_dir_all(&data_dir).unwrap();

    let mut class = Class::new("network", data_dir.clone());
    class.add_attribute(Attribute::new("ID", 1, AttrType::Id, IndexKind::Exact).set_primary_key(true));
    class.add_attribute(
        Attribute::new("Handle", 2, AttrType::Text, IndexKind::Exact)
            .set_primary_key(true)
            .set_required(true),
    );
    class.add_attribute(Attribute::new("Updated", 3, AttrType::Text, IndexKind::None));
    class.add_attribute(Attribute::new("Guard-Scheme", 4, AttrType::Text, IndexKind::None));
    class.add_attribute(Attribute::new("Guard-Info", 5, AttrType::Text, IndexKind::None));
    for attr in class.attributes.iter_mut() {
        attr.global_id = attr.local_id;
    }

    let registry = FileRegistry::load(data_dir).unwrap();
    let soa_path = dir.path().join("soa");
    Fixture {
        _dir: dir,
        class,
        registry,
        soa_path,
    }
}

#[test]
fn add_assigns_a_fresh_id_and_bumps_the_soa() {
    let mut f = fixture();
    let record = add(&f.class, "net", &mut f.registry, &f.soa_path, "Handle:ACME-1\n---\n").unwrap();

    assert!(record.id().is_some());
    assert!(record.updated().is_some());
    assert!(record.locator.is_some());

    let soa = Soa::load(&f.soa_path).unwrap();
    assert_eq!(soa.serial.as_str(), record.updated().unwrap());
    assert_eq!(soa.updated.as_str(), record.updated().unwrap());
}

#[test]
fn add_discards_any_id_supplied_in_the_spool() {
    let mut f = fixture();
    let record = add(&f.class, "net", &mut f.registry, &f.soa_path, "ID:BOGUS\nHandle:ACME-1\n---\n").unwrap();
    assert_ne!(record.id(), Some("BOGUS"));
}

#[test]
fn duplicate_primary_key_is_rejected() {
    let mut f = fixture();
    add(&f.class, "net", &mut f.registry, &f.soa_path, "Handle:ACME-1\n---\n").unwrap();

    let err = add(&f.class, "net", &mut f.registry, &f.soa_path, "Handle:ACME-1\n---\n").unwrap_err();
    assert_eq!(err.kind(), "NON_UNIQUE_KEY");
}

#[test]
fn crypt_pw_guard_info_is_rewritten_away_from_plaintext() {
    let mut f = fixture();
    let record = add(
        &f.class,
        "net",
        &mut f.registry,
        &f.soa_path,
        "Handle:ACME-1\nGuard-Scheme:crypt-pw\nGuard-Info:hunter2\n---\n",
    )
    .unwrap();

    assert_ne!(record.value_of("Guard-Info"), Some("hunter2"));
}

#[test]
fn pw_scheme_guard_info_is_left_as_is() {
    let mut f = fixture();
    let record = add(
        &f.class,
        "net",
        &mut f.registry,
        &f.soa_path,
        "Handle:ACME-1\nGuard-Scheme:password\nGuard-Info:hunter2\n---\n",
    )
    .unwrap();

    assert_eq!(record.value_of("Guard-Info"), Some("hunter2"));
}

#[test]
fn missing_required_attribute_fails_validation() {
    let mut f = fixture();
    let err = add(&f.class, "net", &mut f.registry, &f.soa_path, "Guard-Scheme:pw\n---\n").unwrap_err();
    assert_eq!(err.kind(), "MISSING_ATTRIBUTE");
}
