//! `ID` and `Updated` timestamp formatting (§7: "ID format", "Updated
//! format").

use chrono::Local;

/// `YYYYMMDDhhmmss<pid>.<authority-area-name>`.
pub fn generate_id(area_name: &str) -> String {
    format!(
        "{}{}.{}",
        Local::now().format("%Y%m%d%H%M%S"),
        std::process::id(),
        area_name
    )
}

/// `YYYYMMDDhhmmss000`; the trailing three digits are reserved.
pub fn now_updated() -> String {
    format!("{}000", Local::now().format("%Y%m%d%H%M%S"))
}

#[cfg(test)]
#[path = "ids_test.rs"]
mod ids_test;
