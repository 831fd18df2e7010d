//! Status: read-only counters aggregation (§6 "Status counters"),
//! derived entirely from the file registry and schema registry rather
//! than a running server's in-memory config.

use std::collections::HashMap;
use std::path::Path;

use crate::files::{FileKind, FileRegistry};
use crate::schema::AuthorityArea;
use crate::write::Soa;
use crate::Result;

/// Live record count for one class within an area.
pub struct ClassCount {
    pub class_name: String,
    pub live_records: u64,
}

/// Everything `status()` reports for a single authority area.
pub struct AreaStatus {
    pub area_name: String,
    pub classes: Vec<ClassCount>,
    pub data_bytes: u64,
    pub index_bytes: u64,
    pub soa_serial: String,
}

/// Aggregate counters for `area`. `registries` must hold one loaded
/// [FileRegistry] per class name in `area`.
pub fn collect(area: &AuthorityArea, registries: &HashMap<String, FileRegistry>, soa_path: &Path) -> Result<AreaStatus> {
    let mut classes = Vec::with_capacity(area.classes.len());
    let mut data_bytes = 0u64;
    let mut index_bytes = 0u64;

    for class in &area.classes {
        let live_records = match registries.get(&class.name) {
            Some(registry) => {
                for descriptor in registry.descriptors() {
                    match descriptor.kind {
                        FileKind::Data => data_bytes += descriptor.size,
                        FileKind::ExactIndex | FileKind::CidrIndex | FileKind::SoundexIndex => {
                            index_bytes += descriptor.size
                        }
                    }
                }
                registry
                    .descriptors()
                    .iter()
                    .filter(|d| d.kind == FileKind::Data)
                    .map(|d| d.record_count)
                    .sum()
            }
            None => 0,
        };
        classes.push(ClassCount { class_name: class.name.clone(), live_records });
    }

    let soa_serial = Soa::load(soa_path)?.serial;

    Ok(AreaStatus { area_name: area.name.clone(), classes, data_bytes, index_bytes, soa_serial })
}

#[cfg(test)]
#[path = "status_test.rs"]
mod status_test;
