//! Guardian authorization (§4.8).

use std::ffi::CString;

use crate::codec::TypedRecord;
use crate::files::FileRegistry;
use crate::query::{Compare, Conjunct, Query, QueryPolicy, SearchType, Term};
use crate::schema::{AuthorityArea, Class};
use crate::{err_at, Result};

/// Credentials presented by a registrant, as forwarded by the protocol
/// layer (out of this crate's scope).
pub struct Credentials<'a> {
    pub scheme: &'a str,
    pub info: &'a str,
}

pub(crate) fn normalize_scheme(name: &str) -> String {
    match name.to_ascii_lowercase().as_str() {
        "pw" | "passwd" | "password" => "pw".to_string(),
        other => other.to_string(),
    }
}

/// Is `record` guarded at all (§4.8 (a)/(b)/(c))? `Guardian`-class
/// records always guard themselves.
pub fn is_guarded(record: &TypedRecord, class: &Class, area: &AuthorityArea) -> bool {
    class.name.eq_ignore_ascii_case("Guardian")
        || !area.guardian_ids.is_empty()
        || record.value_of("Guardian").is_some()
}

/// Authorize `creds` against `record`'s guardian(s) (§4.8).
///
/// `guardian_class`/`guardian_registry` locate the authority area's
/// `Guardian` class and its published indexes, needed to resolve an
/// `ID` reference into a guardian record; both may be `None` only when
/// `record` is itself a `Guardian`-class record, which guards itself.
pub fn authorize(
    record: &TypedRecord,
    class: &Class,
    area: &AuthorityArea,
    guardian_class: Option<&Class>,
    guardian_registry: Option<&FileRegistry>,
    creds: &Credentials,
) -> Result<()> {
    if class.name.eq_ignore_ascii_case("Guardian") {
        return authorize_against(record, creds);
    }

    let mut candidate_ids = area.guardian_ids.clone();
    if let Some(reference) = record.value_of("Guardian") {
        candidate_ids.push(reference.to_string());
    }
    if candidate_ids.is_empty() {
        return err_at!(Unauthenticated, msg: "record is not guarded");
    }

    let (g_class, g_registry) = match (guardian_class, guardian_registry) {
        (Some(c), Some(r)) => (c, r),
        _ => {
            return err_at!(
                Unauthenticated,
                msg: "no Guardian class available to resolve guardian references"
            )
        }
    };

    for id in candidate_ids {
        let guardian_record = match resolve_guardian(g_class, g_registry, &area.name, &id) {
            Some(r) => r,
            None => {
                log::warn!("stale guardian reference {:?} on {}/{}", id, area.name, class.name);
                continue;
            }
        };
        if authorize_against(&guardian_record, creds).is_ok() {
            return Ok(());
        }
    }
    err_at!(CredentialMismatch, msg: "no guardian matched supplied credentials")
}

fn resolve_guardian(
    guardian_class: &Class,
    guardian_registry: &FileRegistry,
    area_name: &str,
    id: &str,
) -> Option<TypedRecord> {
    let leaf = Term::new(Some("ID"), SearchType::Binary, Compare::Full, id);
    let query = Query::new(vec![Conjunct::new(leaf, vec![])]);
    let outcome =
        crate::query::run_query(guardian_registry, guardian_class, area_name, &query, &QueryPolicy::default())
            .ok()?;
    outcome.records.into_iter().next()
}

fn authorize_against(guardian: &TypedRecord, creds: &Credentials) -> Result<()> {
    let stored_scheme = guardian.value_of("Guard-Scheme").unwrap_or("pw");
    let stored_info = match guardian.value_of("Guard-Info") {
        Some(s) => s,
        None => return err_at!(Unauthenticated, msg: "guardian record has no Guard-Info"),
    };
    if credentials_match(creds.scheme, creds.info, stored_scheme, stored_info)? {
        Ok(())
    } else {
        err_at!(CredentialMismatch, msg: "credentials did not match guardian")
    }
}

/// A guardian "fails closed": a scheme mismatch or an unrecognized
/// scheme is a non-match, not an error, so a caller with several
/// candidate guardians keeps trying the rest (§4.8).
fn credentials_match(supplied_scheme: &str, supplied_info: &str, stored_scheme: &str, stored_info: &str) -> Result<bool> {
    let supplied = normalize_scheme(supplied_scheme);
    let stored = normalize_scheme(stored_scheme);
    if supplied != stored {
        return Ok(false);
    }
    match stored.as_str() {
        "pw" => Ok(supplied_info.as_bytes() == stored_info.as_bytes()),
        "crypt-pw" => Ok(crypt(supplied_info, stored_info)? == stored_info),
        _ => Ok(false),
    }
}

/// `crypt(3)` via libc, matching the historical `crypt-pw` scheme
/// (§4.8). `stored_info` supplies the salt embedded in its own prefix.
pub(crate) fn crypt(key: &str, stored_info: &str) -> Result<String> {
    let c_key = err_at!(Fatal, CString::new(key))?;
    let c_salt = err_at!(Fatal, CString::new(stored_info))?;
    // SAFETY: `crypt` returns a pointer into a static buffer owned by
    // libc; it is copied into an owned `String` before this function
    // returns, and before any other thread could plausibly call
    // `crypt` again (this crate's request model is single-threaded per
    // worker, §5 "Process model").
    let result = unsafe { libc::crypt(c_key.as_ptr(), c_salt.as_ptr()) };
    if result.is_null() {
        return err_at!(Fatal, msg: "crypt(3) returned NULL");
    }
    let owned = unsafe { std::ffi::CStr::from_ptr(result) }.to_string_lossy().into_owned();
    Ok(owned)
}

#[cfg(test)]
#[path = "auth_test.rs"]
mod auth_test;
