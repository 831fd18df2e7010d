//! End-to-end scenarios exercising schema setup, write path, query
//! engine, and guardian authorization together (§8).

use std::path::PathBuf;

use regex::Regex;

use crate::auth::{self, Credentials};
use crate::codec::AnonymousRecord;
use crate::files::{FileKind, FileRegistry};
use crate::ids;
use crate::index::{build_indexes, IndexBuildInput};
use crate::query::{Compare, Conjunct, Query, QueryPolicy, SearchType, Term};
use crate::schema::{AreaKind, AttrType, Attribute, AuthorityArea, Class, IndexKind};
use crate::write::{self, Soa};

struct Fixture {
    _dir: tempfile::TempDir,
    class: Class,
    area: AuthorityArea,
    registry: FileRegistry,
    soa_path: PathBuf,
}

fn contact_class(data_dir: PathBuf) -> Class {
    let mut class = Class::new("contact", data_dir);
    class.add_attribute(Attribute::new("ID", 1, AttrType::Id, IndexKind::Exact).set_primary_key(true));
    class.add_attribute(Attribute::new("Name", 2, AttrType::Text, IndexKind::All));
    class.add_attribute(Attribute::new("Phone", 3, AttrType::Text, IndexKind::None));
    class.add_attribute(Attribute::new("Email", 4, AttrType::Text, IndexKind::Exact));
    class.add_attribute(Attribute::new("Network", 5, AttrType::Text, IndexKind::Cidr));
    class.add_attribute(Attribute::new("Updated", 6, AttrType::Text, IndexKind::None));
    for attr in class.attributes.iter_mut() {
        attr.global_id = attr.local_id;
    }
    class
}

fn fixture() -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let data_dir = dir.path().join("data");
    std::fs::create_dir_all(&data_dir).unwrap();

    let class = contact_class(data_dir.clone());
    let mut area = AuthorityArea::new("a", AreaKind::Primary, data_dir.clone());
    area.add_class(class.clone());

    let registry = FileRegistry::load(data_dir).unwrap();
    let soa_path = dir.path().join("soa");
    Fixture { _dir: dir, class, area, registry, soa_path }
}

fn full_term(attr: &str, value: &str) -> Term {
    Term::new(Some(attr), SearchType::Binary, Compare::Full, value)
}

fn run(registry: &FileRegistry, class: &Class, area_name: &str, term: Term, policy: &QueryPolicy) -> crate::Result<Vec<crate::codec::TypedRecord>> {
    let query = Query::new(vec![Conjunct::new(term, vec![])]);
    Ok(crate::query::run_query(registry, class, area_name, &query, policy)?.records)
}

#[test]
fn scenario_1_add_then_query_by_name_returns_a_freshly_stamped_record() {
    let mut f = fixture();
    write::add(&f.class, "a", &mut f.registry, &f.soa_path, "Name:John Smith\nPhone:555-1212\n---\n").unwrap();

    let hits = run(&f.registry, &f.class, "a", full_term("Name", "John Smith"), &QueryPolicy::default()).unwrap();
    assert_eq!(hits.len(), 1);

    let id_re = Regex::new(r"^\d{14}\d+\.a$").unwrap();
    let updated_re = Regex::new(r"^\d{14}000$").unwrap();
    assert!(id_re.is_match(hits[0].id().unwrap()), "unexpected ID shape: {:?}", hits[0].id());
    assert!(updated_re.is_match(hits[0].updated().unwrap()), "unexpected Updated shape: {:?}", hits[0].updated());

    let soa = Soa::load(&f.soa_path).unwrap();
    assert_eq!(soa.serial.as_str(), hits[0].updated().unwrap());
    assert_eq!(soa.updated.as_str(), hits[0].updated().unwrap());
}

#[test]
fn scenario_2_prefix_query_matches_both_emails_and_is_rejected_when_wildcards_are_disabled() {
    let mut f = fixture();
    write::add(&f.class, "a", &mut f.registry, &f.soa_path, "Name:Alice\nEmail:alice@example.com\n---\n").unwrap();
    write::add(&f.class, "a", &mut f.registry, &f.soa_path, "Name:Alicia\nEmail:alicia@example.org\n---\n").unwrap();

    let prefix_term = Term::new(Some("Email"), SearchType::Binary, Compare::Prefix, "alic");
    let hits = run(&f.registry, &f.class, "a", prefix_term.clone(), &QueryPolicy::default()).unwrap();
    assert_eq!(hits.len(), 2);

    let strict = QueryPolicy { allow_wildcard: false, ..QueryPolicy::default() };
    let err = run(&f.registry, &f.class, "a", prefix_term, &strict).unwrap_err();
    assert_eq!(err.kind(), "QUERY_TOO_COMPLEX");
}

#[test]
fn scenario_3_cidr_descent_finds_a_covering_network_and_nothing_outside_it() {
    let mut f = fixture();
    write::add(&f.class, "a", &mut f.registry, &f.soa_path, "Name:Net\nNetwork:192.0.2.0/24\n---\n").unwrap();

    let covered = Term::new(Some("Network"), SearchType::Cidr, Compare::Full, "192.0.2.128");
    let hits = run(&f.registry, &f.class, "a", covered, &QueryPolicy::default()).unwrap();
    assert_eq!(hits.len(), 1);

    let disjoint = Term::new(Some("Network"), SearchType::Cidr, Compare::Full, "192.0.3.0/24");
    let hits = run(&f.registry, &f.class, "a", disjoint, &QueryPolicy::default()).unwrap();
    assert!(hits.is_empty());
}

#[test]
fn scenario_4_soundex_index_matches_a_phonetically_similar_name() {
    let mut f = fixture();
    write::add(&f.class, "a", &mut f.registry, &f.soa_path, "Name:Smyth\n---\n").unwrap();

    let hits = run(&f.registry, &f.class, "a", full_term("Name", "Smith"), &QueryPolicy::default()).unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].value_of("Name"), Some("Smyth"));
}

fn guardian_class(data_dir: PathBuf) -> Class {
    let mut class = Class::new("Guardian", data_dir);
    class.add_attribute(Attribute::new("ID", 1, AttrType::Id, IndexKind::Exact).set_primary_key(true));
    class.add_attribute(Attribute::new("Handle", 2, AttrType::Text, IndexKind::Exact).set_required(true));
    class.add_attribute(Attribute::new("Updated", 3, AttrType::Text, IndexKind::None));
    class.add_attribute(Attribute::new("Guard-Scheme", 4, AttrType::Text, IndexKind::None));
    class.add_attribute(Attribute::new("Guard-Info", 5, AttrType::Text, IndexKind::None));
    for attr in class.attributes.iter_mut() {
        attr.global_id = attr.local_id;
    }
    class
}

struct GuardedFixture {
    _dir: tempfile::TempDir,
    class: Class,
    area: AuthorityArea,
    registry: FileRegistry,
    soa_path: PathBuf,
    id: String,
    updated: String,
    stored_info: String,
}

/// A `Guardian`-class record written directly (bypassing `write::add`'s
/// random salt) so its crypted `Guard-Info` is reproducible.
fn guarded_fixture() -> GuardedFixture {
    let dir = tempfile::tempdir().unwrap();
    let data_dir = dir.path().join("data");
    std::fs::create_dir_all(&data_dir).unwrap();

    let class = guardian_class(data_dir.clone());
    let mut area = AuthorityArea::new("a", AreaKind::Primary, data_dir.clone());
    area.add_class(class.clone());
    let mut registry = FileRegistry::load(data_dir).unwrap();
    let soa_path = dir.path().join("soa");

    let id = ids::generate_id("a");
    let updated = ids::now_updated();
    let stored_info = auth::crypt("s3cret", "ab").unwrap();

    let pairs = vec![
        ("ID".to_string(), id.clone()),
        ("Handle".to_string(), "NET-GUARD".to_string()),
        ("Updated".to_string(), updated.clone()),
        ("Guard-Scheme".to_string(), "crypt-pw".to_string()),
        ("Guard-Info".to_string(), stored_info.clone()),
    ];
    let typed = AnonymousRecord::new(pairs).translate(&class, "a", true).unwrap();
    let base_filename = write::materialize_data_file(&class, &typed.to_anonymous()).unwrap();
    build_indexes(
        &class,
        "a",
        &mut registry,
        vec![IndexBuildInput { base_filename }],
        &crate::index::IndexerConfig::default(),
    )
    .unwrap();

    GuardedFixture { _dir: dir, class, area, registry, soa_path, id, updated, stored_info }
}

fn replace_spool(id: &str, updated: &str, new_handle: &str, stored_info: &str) -> String {
    format!(
        "ID:{id}\nUpdated:{updated}\n---\nID:{id}\nUpdated:{updated}\nHandle:{handle}\nGuard-Scheme:crypt-pw\nGuard-Info:{info}\n---\n",
        id = id,
        updated = updated,
        handle = new_handle,
        info = stored_info,
    )
}

#[test]
fn scenario_5_crypt_pw_guardian_accepts_matching_credentials_and_rejects_wrong_ones() {
    let mut f = guarded_fixture();
    let spool = replace_spool(&f.id, &f.updated, "NET-GUARD", &f.stored_info);

    let good = Credentials { scheme: "crypt-pw", info: "s3cret" };
    let replaced = write::modify(&f.class, &f.area, &mut f.registry, &f.soa_path, None, None, &good, &spool).unwrap();
    assert_eq!(replaced.value_of("Guard-Info"), Some(f.stored_info.as_str()));

    let new_updated = replaced.updated().unwrap().to_string();
    let spool_again = replace_spool(&f.id, &new_updated, "NET-GUARD", &f.stored_info);
    let wrong = Credentials { scheme: "crypt-pw", info: "wrong" };
    let err =
        write::modify(&f.class, &f.area, &mut f.registry, &f.soa_path, None, None, &wrong, &spool_again).unwrap_err();
    assert_eq!(err.kind(), "UNAUTH_REGIST");

    let hits = run(&f.registry, &f.class, "a", full_term("ID", &f.id), &QueryPolicy::default()).unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].value_of("Guard-Info"), Some(f.stored_info.as_str()));
    assert_eq!(hits[0].updated(), Some(new_updated.as_str()));
}

#[test]
fn scenario_6_modify_with_a_stale_updated_value_fails_and_leaves_storage_untouched() {
    let mut f = fixture();
    let original =
        write::add(&f.class, "a", &mut f.registry, &f.soa_path, "Name:Carol\nPhone:555-0100\n---\n").unwrap();

    let exact_lines_before: u64 = f
        .registry
        .descriptors()
        .iter()
        .filter(|d| d.kind == FileKind::ExactIndex)
        .map(|d| d.record_count)
        .sum();

    let spool = format!(
        "ID:{id}\nUpdated:stale-timestamp\n---\nID:{id}\nUpdated:stale-timestamp\nName:Caroline\n---\n",
        id = original.id().unwrap(),
    );
    let creds = Credentials { scheme: "pw", info: "irrelevant" };
    let err = write::modify(&f.class, &f.area, &mut f.registry, &f.soa_path, None, None, &creds, &spool)
        .unwrap_err();
    assert_eq!(err.kind(), "OUTDATED_OBJ");

    let hits = run(&f.registry, &f.class, "a", full_term("ID", original.id().unwrap()), &QueryPolicy::default())
        .unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].value_of("Name"), Some("Carol"));

    let exact_lines_after: u64 = f
        .registry
        .descriptors()
        .iter()
        .filter(|d| d.kind == FileKind::ExactIndex)
        .map(|d| d.record_count)
        .sum();
    assert_eq!(exact_lines_before, exact_lines_after);
}
