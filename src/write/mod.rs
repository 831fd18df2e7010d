//! Write path: add/modify/delete, each a Read/Check/Commit pipeline
//! sharing the same data-file and SOA mechanics (§4.7).

mod add;
mod delete;
mod modify;
mod soa;

pub use add::add;
pub use delete::delete;
pub use modify::modify;
pub use soa::Soa;

use std::io::Cursor;

use crate::codec::{AnonymousRecord, ParseOutcome, TypedRecord};
use crate::schema::Class;
use crate::{err_at, Result};

/// Parse a spool expected to hold exactly one record (§4.7 *Add*: "spool
/// must contain exactly one record").
pub(crate) fn parse_one_record(spool: &str) -> Result<AnonymousRecord> {
    let mut reader = Cursor::new(spool.as_bytes());
    let record = match AnonymousRecord::parse_next(&mut reader)? {
        Some(ParseOutcome::Record(r)) => r,
        Some(ParseOutcome::Deleted) => {
            return err_at!(InvalidRecord, msg: "spool record is soft-deleted")
        }
        None => return err_at!(EmptyRecord, msg: "spool holds no record"),
    };
    match AnonymousRecord::parse_next(&mut reader)? {
        None => Ok(record),
        Some(_) => err_at!(TooManyRecords, msg: "spool holds more than one record"),
    }
}

/// Parse a spool expected to hold exactly two records: the old
/// identity, then the replacement (§4.7 *Modify*).
pub(crate) fn parse_two_records(spool: &str) -> Result<(AnonymousRecord, AnonymousRecord)> {
    let mut reader = Cursor::new(spool.as_bytes());
    let old = match AnonymousRecord::parse_next(&mut reader)? {
        Some(ParseOutcome::Record(r)) => r,
        Some(ParseOutcome::Deleted) => {
            return err_at!(InvalidRecord, msg: "spool's old-identity record is soft-deleted")
        }
        None => return err_at!(EmptyRecord, msg: "spool holds no old-identity record"),
    };
    let replacement = match AnonymousRecord::parse_next(&mut reader)? {
        Some(ParseOutcome::Record(r)) => r,
        Some(ParseOutcome::Deleted) => {
            return err_at!(InvalidRecord, msg: "spool's replacement record is soft-deleted")
        }
        None => return err_at!(EmptyRecord, msg: "spool holds no replacement record"),
    };
    match AnonymousRecord::parse_next(&mut reader)? {
        None => Ok((old, replacement)),
        Some(_) => err_at!(TooManyRecords, msg: "spool holds more than two records"),
    }
}

/// Write `record` into a fresh file in `class.data_dir`, ready to be
/// handed to [crate::index::build_indexes] as an [crate::index::IndexBuildInput].
pub(crate) fn materialize_data_file(class: &Class, record: &AnonymousRecord) -> Result<String> {
    let mut tmp = err_at!(
        IOError,
        tempfile::Builder::new().prefix("write-").suffix(".tmp").tempfile_in(&class.data_dir)
    )?;
    record.emit(&mut tmp)?;
    err_at!(IOError, tmp.as_file_mut().sync_all())?;
    let path = match tmp.keep() {
        Ok((_file, path)) => path,
        Err(e) => return err_at!(IOError, msg: "failed to persist data file: {}", e),
    };
    Ok(path.file_name().unwrap().to_string_lossy().to_string())
}

/// Rewrite `Guard-Info` to its crypted form when `Guard-Scheme`
/// normalizes to `crypt-pw` (§4.7 "Guardian passwords are rewritten if
/// the scheme demands it"). A salt is derived from the process clock
/// rather than a CSPRNG dependency (see `DESIGN.md`).
pub(crate) fn normalize_guard_fields(record: &mut TypedRecord) -> Result<()> {
    let scheme = match record.value_of("Guard-Scheme") {
        Some(s) => s.to_string(),
        None => return Ok(()),
    };
    if crate::auth::normalize_scheme(&scheme) != "crypt-pw" {
        return Ok(());
    }
    let plaintext = match record.value_of("Guard-Info") {
        Some(s) => s.to_string(),
        None => return Ok(()),
    };
    let salt = gen_salt();
    let crypted = crate::auth::crypt(&plaintext, &salt)?;
    for field in record.fields.iter_mut() {
        if field.attr_name.eq_ignore_ascii_case("Guard-Info") {
            field.value = crypted.clone();
        }
    }
    Ok(())
}

const SALT_ALPHABET: &[u8; 64] =
    b"./0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

fn gen_salt() -> String {
    let nanos = chrono::Local::now().timestamp_subsec_nanos();
    let pid = std::process::id();
    let a = SALT_ALPHABET[(pid as usize) % SALT_ALPHABET.len()];
    let b = SALT_ALPHABET[(nanos as usize) % SALT_ALPHABET.len()];
    String::from_utf8(vec![a, b]).unwrap()
}
