//! *Modify* (§4.7): locate the old identity, authorize against it,
//! validate the replacement, then commit as delete-old+add-new under a
//! single new `Updated`.

use std::path::Path;

use crate::auth::{self, Credentials};
use crate::codec::{validate, TypedRecord, ValidationMode};
use crate::files::{FileKind, FileRegistry};
use crate::index::{build_indexes, IndexBuildInput, IndexerConfig};
use crate::schema::{AuthorityArea, Class};
use crate::write::delete::{locate, soft_delete_record};
use crate::write::{materialize_data_file, normalize_guard_fields, parse_two_records, Soa};
use crate::{err_at, ids, Result};

/// Replace the record named by the spool's old-identity half with its
/// replacement half, provided the replacement agrees with the current
/// live record on `ID` and `Updated` and the caller authorizes.
#[allow(clippy::too_many_arguments)]
pub fn modify(
    class: &Class,
    area: &AuthorityArea,
    registry: &mut FileRegistry,
    soa_path: &Path,
    guardian_class: Option<&Class>,
    guardian_registry: Option<&FileRegistry>,
    creds: &Credentials,
    spool: &str,
) -> Result<TypedRecord> {
    let (old_anon, replacement_anon) = parse_two_records(spool)?;
    let old_typed = old_anon.translate(class, &area.name, false)?;
    let (old_id, old_updated) = match (old_typed.id(), old_typed.updated()) {
        (Some(id), Some(updated)) => (id.to_string(), updated.to_string()),
        _ => return err_at!(InvalidRecord, msg: "old-identity record must carry ID and Updated"),
    };

    let live = locate(class, area, registry, &old_id, &old_updated)?;
    auth::authorize(&live, class, area, guardian_class, guardian_registry, creds)?;

    let mut replacement = replacement_anon.translate(class, &area.name, true)?;
    match (replacement.id(), replacement.updated()) {
        (Some(id), Some(updated)) if id == old_id.as_str() && updated == old_updated.as_str() => {}
        _ => {
            return err_at!(
                InvalidRecord,
                msg: "replacement must echo the current ID and Updated of the record it replaces"
            )
        }
    }

    if replacement.value_of("Guard-Scheme") != live.value_of("Guard-Scheme")
        || replacement.value_of("Guard-Info") != live.value_of("Guard-Info")
    {
        normalize_guard_fields(&mut replacement)?;
    }

    let new_updated = ids::now_updated();
    set_field(&mut replacement, class, "Updated", &new_updated);
    validate(&replacement, class, ValidationMode::PROTOCOL_ERRORS)?;

    let (data_file_no, offset) = match live.locator {
        Some(loc) => loc,
        None => return err_at!(IndexMissing, msg: "located record carries no locator"),
    };
    let descriptor = match registry.descriptor(data_file_no) {
        Some(d) => d.clone(),
        None => return err_at!(IndexMissing, msg: "data file {} not in registry", data_file_no),
    };
    let path = registry.dir().join(&descriptor.filename);
    soft_delete_record(&path, offset)?;
    registry.modify_file_list(
        vec![],
        vec![],
        vec![crate::files::Modify {
            file_id: data_file_no,
            size: descriptor.size,
            record_count: descriptor.record_count.saturating_sub(1),
        }],
        vec![],
        vec![],
    )?;
    log::debug!("modify soft-deleted old identity {} at file {}:{}", old_id, data_file_no, offset);

    let base_filename = materialize_data_file(class, &replacement.to_anonymous())?;
    let published = build_indexes(
        class,
        &area.name,
        registry,
        vec![IndexBuildInput { base_filename }],
        &IndexerConfig::default(),
    )?;
    log::debug!("modify committed replacement for {} in {}/{}", old_id, area.name, class.name);
    let new_data_file_id = published
        .iter()
        .find(|d| d.kind == FileKind::Data)
        .map(|d| d.file_id)
        .unwrap_or(0);

    let mut soa = Soa::load(soa_path)?;
    soa.bump(&new_updated);
    soa.save(soa_path)?;

    Ok(replacement.with_locator(new_data_file_id, 0))
}

fn set_field(record: &mut TypedRecord, class: &Class, name: &str, value: &str) {
    use crate::schema::AttrType;
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

#[cfg(test)]
#[path = "modify_test.rs"]
mod modify_test;
