//! *Delete* (§4.7): locate by `ID`/`Updated`, authorize, soft-delete in
//! place, and bump the SOA.

use std::fs;
use std::io::{BufRead, BufReader, Seek, SeekFrom, Write};
use std::path::Path;

use crate::auth::{self, Credentials};
use crate::files::{FileRegistry, Modify};
use crate::query::{Compare, Conjunct, Query, QueryPolicy, SearchType, Term};
use crate::schema::{AuthorityArea, Class};
use crate::write::Soa;
use crate::{err_at, ids, util, Result};

/// Locate the live record with `id` whose `Updated` equals `updated`,
/// authorize it, soft-delete it, and bump the SOA. Fails `OUTDATED_OBJ`
/// if no candidate survives the `Updated` filter (§4.7).
#[allow(clippy::too_many_arguments)]
pub fn delete(
    class: &Class,
    area: &AuthorityArea,
    registry: &mut FileRegistry,
    soa_path: &Path,
    guardian_class: Option<&Class>,
    guardian_registry: Option<&FileRegistry>,
    creds: &Credentials,
    id: &str,
    updated: &str,
) -> Result<()> {
    let record = locate(class, area, registry, id, updated)?;
    auth::authorize(&record, class, area, guardian_class, guardian_registry, creds)?;

    let (data_file_no, offset) = match record.locator {
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
        vec![Modify {
            file_id: data_file_no,
            size: descriptor.size,
            record_count: descriptor.record_count.saturating_sub(1),
        }],
        vec![],
        vec![],
    )?;
    log::debug!("delete committed: soft-deleted {} at file {}:{}", id, data_file_no, offset);

    let new_updated = ids::now_updated();
    let mut soa = Soa::load(soa_path)?;
    soa.bump(&new_updated);
    soa.save(soa_path)
}

/// Shared by *Modify* and *Delete*: find the candidate matching both
/// `id` and `updated`, failing `OUTDATED_OBJ` if none remain once the
/// `Updated` filter is applied.
pub(crate) fn locate(
    class: &Class,
    area: &AuthorityArea,
    registry: &FileRegistry,
    id: &str,
    updated: &str,
) -> Result<crate::codec::TypedRecord> {
    let leaf = Term::new(Some("ID"), SearchType::Binary, Compare::Full, id);
    let query = Query::new(vec![Conjunct::new(leaf, vec![])]);
    let outcome = crate::query::run_query(registry, class, &area.name, &query, &QueryPolicy::default())?;

    match outcome.records.into_iter().find(|r| r.updated() == Some(updated)) {
        Some(r) => Ok(r),
        None => err_at!(OutdatedObject, msg: "no live record {} with Updated={:?}", id, updated),
    }
}

/// Overwrite the first byte of every line in the record's byte range,
/// up to but not including the `---` separator, with `_` (§4.7, §5:
/// "write-through (unbuffered) to avoid partial persistence").
pub(crate) fn soft_delete_record(path: &Path, offset: u64) -> Result<()> {
    let mut reader_handle = util::open_file_r(path)?;
    err_at!(IOError, reader_handle.seek(SeekFrom::Start(offset)))?;
    let mut reader = BufReader::new(reader_handle);

    let mut line_starts = Vec::new();
    let mut pos = offset;
    loop {
        let mut raw = String::new();
        let n = err_at!(IOError, reader.read_line(&mut raw))?;
        if n == 0 {
            break;
        }
        if raw.trim_end_matches(['\n', '\r']).starts_with("---") {
            break;
        }
        line_starts.push(pos);
        pos += n as u64;
    }

    let mut writer = err_at!(IOError, fs::OpenOptions::new().write(true).open(path))?;
    for start in line_starts {
        err_at!(IOError, writer.seek(SeekFrom::Start(start)))?;
        err_at!(IOError, writer.write_all(b"_"))?;
    }
    err_at!(IOError, writer.sync_all())?;
    Ok(())
}

#[cfg(test)]
#[path = "delete_test.rs"]
mod delete_test;
