//! Repack: consolidate a kind's scattered index files into one sorted
//! file per kind (§4.9).

use std::path::PathBuf;
use std::time::Duration;

use crate::files::{FileDescriptor, FileKind, FileRegistry, NewFile};
use crate::index::{external_sort, write_temp_index, IndexLine, IndexerConfig};
use crate::{err_at, Result};

/// Filters and mode for one repack pass.
pub struct RepackOptions {
    /// Only consider files whose name contains this substring.
    pub name_contains: Option<String>,
    /// Only consider files at or under this size, in bytes.
    pub max_size: Option<u64>,
    /// Perform every step except the registry rename and the unlink.
    pub dry_run: bool,
    /// How long to wait after the registry swap before unlinking the
    /// superseded physical files, so in-flight readers that acquired
    /// the old master list finish first (§5 "Ordering").
    pub grace: Duration,
    /// Sizing knobs for the external sort the consolidation pass runs.
    pub indexer: IndexerConfig,
}

impl Default for RepackOptions {
    fn default() -> RepackOptions {
        RepackOptions {
            name_contains: None,
            max_size: None,
            dry_run: false,
            grace: Duration::from_secs(0),
            indexer: IndexerConfig::default(),
        }
    }
}

impl RepackOptions {
    /// Start from the default (no filters, live run, no grace period);
    /// use the `set_*` methods to narrow it (teacher idiom from
    /// `robt::Config`).
    pub fn new() -> RepackOptions {
        RepackOptions::default()
    }

    /// Only consolidate files whose name contains `substr`.
    pub fn set_name_contains(&mut self, substr: Option<String>) -> &mut Self {
        self.name_contains = substr;
        self
    }

    /// Only consolidate files at or under `max_size` bytes.
    pub fn set_max_size(&mut self, max_size: Option<u64>) -> &mut Self {
        self.max_size = max_size;
        self
    }

    /// Perform every step except the registry rename and the unlink.
    pub fn set_dry_run(&mut self, dry_run: bool) -> &mut Self {
        self.dry_run = dry_run;
        self
    }

    /// How long to wait after the registry swap before unlinking the
    /// superseded physical files.
    pub fn set_grace(&mut self, grace: Duration) -> &mut Self {
        self.grace = grace;
        self
    }

    /// Override the external sort's shard-threshold sizing.
    pub fn set_indexer_config(&mut self, indexer: IndexerConfig) -> &mut Self {
        self.indexer = indexer;
        self
    }
}

/// What one kind's consolidation did or would do.
pub struct KindReport {
    pub kind: FileKind,
    pub consolidated_from: Vec<u64>,
    pub new_file_id: Option<u64>,
    pub lines_written: u64,
}

/// Consolidate every index kind that has two or more files matching
/// `options` into a single sorted file each.
pub fn repack(registry: &mut FileRegistry, options: &RepackOptions) -> Result<Vec<KindReport>> {
    let mut reports = Vec::new();
    for kind in [FileKind::ExactIndex, FileKind::CidrIndex, FileKind::SoundexIndex] {
        if let Some(report) = repack_kind(registry, kind, options)? {
            reports.push(report);
        }
    }
    Ok(reports)
}

fn matches(descriptor: &FileDescriptor, options: &RepackOptions) -> bool {
    if let Some(substr) = &options.name_contains {
        if !descriptor.filename.contains(substr.as_str()) {
            return false;
        }
    }
    if let Some(ceiling) = options.max_size {
        if descriptor.size > ceiling {
            return false;
        }
    }
    true
}

fn repack_kind(registry: &mut FileRegistry, kind: FileKind, options: &RepackOptions) -> Result<Option<KindReport>> {
    let candidates: Vec<FileDescriptor> = registry
        .descriptors()
        .iter()
        .filter(|d| d.kind == kind && matches(d, options))
        .cloned()
        .collect();
    if candidates.len() < 2 {
        return Ok(None);
    }
    log::debug!("repacking {} {:?} file(s)", candidates.len(), kind);

    let dir = registry.dir().to_path_buf();
    let mut lines = Vec::new();
    for descriptor in &candidates {
        lines.extend(read_index_lines(&dir.join(&descriptor.filename))?);
    }
    let sorted = external_sort(lines, &options.indexer);
    let consolidated_from: Vec<u64> = candidates.iter().map(|d| d.file_id).collect();

    if options.dry_run {
        return Ok(Some(KindReport {
            kind,
            consolidated_from,
            new_file_id: None,
            lines_written: sorted.len() as u64,
        }));
    }

    let label = match kind {
        FileKind::ExactIndex => "exact",
        FileKind::CidrIndex => "cidr",
        FileKind::SoundexIndex => "soundex",
        FileKind::Data => "data",
    };
    let (base_filename, size) = write_temp_index(&dir, label, &sorted)?;
    let added = registry.modify_file_list(
        vec![NewFile {
            kind,
            base_filename,
            size,
            record_count: sorted.len() as u64,
            locked: true,
        }],
        consolidated_from.clone(),
        vec![],
        vec![],
        vec![],
    )?;
    let new_file_id = added.first().map(|d| d.file_id);
    log::info!("repack committed {:?} consolidating {:?} into file_id {:?}", kind, consolidated_from, new_file_id);

    if options.grace > Duration::from_secs(0) {
        std::thread::sleep(options.grace);
    }
    for descriptor in &candidates {
        let old_path: PathBuf = dir.join(&descriptor.filename);
        std::fs::remove_file(&old_path).ok();
    }

    Ok(Some(KindReport {
        kind,
        consolidated_from,
        new_file_id,
        lines_written: sorted.len() as u64,
    }))
}

fn read_index_lines(path: &std::path::Path) -> Result<Vec<IndexLine>> {
    let text = err_at!(IOError, std::fs::read_to_string(path))?;
    let mut lines = Vec::new();
    for line in text.lines() {
        if line.trim().is_empty() {
            continue;
        }
        lines.push(IndexLine::decode(line)?);
    }
    Ok(lines)
}

#[cfg(test)]
#[path = "repack_test.rs"]
mod repack_test;
