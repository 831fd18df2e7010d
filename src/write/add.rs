//! *Add* (§4.7): Read the spool, Check uniqueness and validity, Commit
//! a new data file, index it, and bump the SOA.

use std::path::Path;

use crate::codec::{validate, ValidationMode};
use crate::files::{FileKind, FileRegistry};
use crate::index::{build_indexes, IndexBuildInput, IndexerConfig};
use crate::query::{Compare, Conjunct, Query, QueryPolicy, SearchType, Term};
use crate::schema::{AttrType, Class};
use crate::write::{materialize_data_file, normalize_guard_fields, parse_one_record, Soa};
use crate::{err_at, ids, Result};

/// Add a record to `class` in authority area `area_name`. `registry`
/// must be this (class, area)'s file registry, `soa_path` the area's
/// SOA file.
pub fn add(
    class: &Class,
    area_name: &str,
    registry: &mut FileRegistry,
    soa_path: &Path,
    spool: &str,
) -> Result<crate::codec::TypedRecord> {
    let anon = parse_one_record(spool)?;
    let mut typed = anon.translate(class, area_name, true)?;
    typed.fields.retain(|f| !f.attr_name.eq_ignore_ascii_case("ID"));

    if let Some(parser) = &class.external_parser {
        let mut buf = Vec::new();
        typed.to_anonymous().emit(&mut buf)?;
        let raw = err_at!(IOError, String::from_utf8(buf))?;
        let rewritten = parser.parse(&raw)?;
        typed = crate::codec::AnonymousRecord::new(rewritten).translate(class, area_name, true)?;
    }

    reject_duplicate(class, area_name, registry, &typed)?;

    let id = ids::generate_id(area_name);
    set_field(&mut typed, class, "ID", &id);
    let updated = ids::now_updated();
    set_field(&mut typed, class, "Updated", &updated);

    normalize_guard_fields(&mut typed)?;
    validate(&typed, class, ValidationMode::PROTOCOL_ERRORS)?;

    let base_filename = materialize_data_file(class, &typed.to_anonymous())?;
    let published = build_indexes(
        class,
        area_name,
        registry,
        vec![IndexBuildInput { base_filename }],
        &IndexerConfig::default(),
    )?;
    log::debug!("add committed record {} to {}/{}", id, area_name, class.name);
    let data_file_id = published
        .iter()
        .find(|d| d.kind == FileKind::Data)
        .map(|d| d.file_id)
        .unwrap_or(0);

    let mut soa = Soa::load(soa_path)?;
    soa.bump(&updated);
    soa.save(soa_path)?;

    Ok(typed.with_locator(data_file_id, 0))
}

fn set_field(record: &mut crate::codec::TypedRecord, class: &Class, name: &str, value: &str) {
    let (global_id, local_id, attr_type) = match class.attribute(name) {
        Some(attr) => (attr.global_id, attr.local_id, attr.attr_type),
        None => (0, 0, AttrType::Text),
    };
    record.fields.retain(|f| !f.attr_name.eq_ignore_ascii_case(name));
    record.fields.push(crate::codec::TypedField {
        attr_name: name.to_string(),
        global_id,
        local_id,
        attr_type,
        value: value.to_string(),
    });
}

/// Uniqueness is enforced over the class's non-`ID` primary-key
/// attributes; a class with none configured has nothing to check
/// (§9 Open Question: no-op when the primary-key list is empty).
fn reject_duplicate(
    class: &Class,
    area_name: &str,
    registry: &FileRegistry,
    record: &crate::codec::TypedRecord,
) -> Result<()> {
    let pk_attrs: Vec<_> = class
        .attributes
        .iter()
        .filter(|a| a.primary_key && a.attr_type != AttrType::Id)
        .collect();
    if pk_attrs.is_empty() {
        return Ok(());
    }

    let mut terms = Vec::new();
    for attr in &pk_attrs {
        if let Some(value) = record.value_of(&attr.name) {
            terms.push(Term::new(Some(&attr.name), SearchType::Binary, Compare::Full, value));
        }
    }
    if terms.is_empty() {
        return Ok(());
    }

    let leaf = terms.remove(0);
    let query = Query::new(vec![Conjunct::new(leaf, terms)]);
    let outcome = crate::query::run_query(registry, class, area_name, &query, &QueryPolicy::default())?;
    if outcome.records.is_empty() {
        Ok(())
    } else {
        err_at!(DuplicateKey, msg: "a record already matches this class's primary key(s)")
    }
}

#[cfg(test)]
#[path = "add_test.rs"]
mod add_test;
