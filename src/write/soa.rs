//! Authority-area SOA file: serial number and last-updated timestamp,
//! bumped once per commit (§4.7, §5 "SOA file: replaced via
//! write-to-temp-then-rename").

use std::fs;
use std::path::Path;

use crate::{err_at, util, Result};

/// `serial` is the `<YYYYMMDDhhmmss000>` timestamp string itself, the
/// same canonical form as `Updated` — not an incrementing counter
/// (`original_source/rwhoisd/server/reg_utils.c:275`:
/// `auth_area->serial_no = xstrdup(updated_str)`).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Soa {
    pub serial: String,
    pub updated: String,
}

impl Soa {
    /// A missing SOA file is a fresh area: empty serial, no prior update.
    pub fn load(path: &Path) -> Result<Soa> {
        if !path.exists() {
            return Ok(Soa {
                serial: String::new(),
                updated: String::new(),
            });
        }
        let text = err_at!(IOError, fs::read_to_string(path))?;
        let mut serial = String::new();
        let mut updated = String::new();
        for line in text.lines() {
            if let Some(rest) = line.strip_prefix("Serial-Number:") {
                serial = rest.trim().to_string();
            } else if let Some(rest) = line.strip_prefix("Updated:") {
                updated = rest.trim().to_string();
            }
        }
        Ok(Soa { serial, updated })
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let text = format!("Serial-Number: {}\nUpdated: {}\n", self.serial, self.updated);
        util::atomic_replace(path, text.as_bytes())
    }

    /// Stamp both the serial and `updated` to the same timestamp string
    /// (one per commit).
    pub fn bump(&mut self, updated: &str) {
        self.serial = updated.to_string();
        self.updated = updated.to_string();
    }
}

#[cfg(test)]
#[path = "soa_test.rs"]
mod soa_test;
