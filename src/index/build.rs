use rayon::prelude::*;

use std::io::{self, BufRead, Read};
use std::path::Path;

use crate::codec::{AnonymousRecord, ParseOutcome, TypedRecord};
use crate::files::{FileDescriptor, FileKind, FileRegistry, Modify, NewFile};
use crate::index::{IndexLine, IndexerConfig};
use crate::schema::{Class, IndexKind};
use crate::{err_at, phonetic, util, Result};

/// A data file already written to the class's data directory under
/// `base_filename`, awaiting registration and indexing.
pub struct IndexBuildInput {
    pub base_filename: String,
}

/// Emit one index line per applicable kind for every indexable field
/// of `record` (§4.5). `EXACT` fires whenever the value canonicalizes
/// to something non-empty; `CIDR` and `SOUNDEX` only when the value is
/// eligible for them.
pub fn emit_index_lines(
    record: &TypedRecord,
    class: &Class,
    data_file_no: u64,
    offset: u64,
) -> Vec<(FileKind, IndexLine)> {
    let mut out = Vec::new();

    for field in &record.fields {
        let attr = match class.attribute(&field.attr_name) {
            Some(a) => a,
            None => continue,
        };

        for kind in attr.index_kind.concrete_kinds() {
            let key = match kind {
                IndexKind::Exact => Some(canonicalize_exact(&field.value)),
                IndexKind::Cidr => crate::net::Prefix::parse_for_indexing(&field.value)
                    .ok()
                    .map(|p| p.to_string()),
                IndexKind::Soundex => phonetic::metaphone(&field.value),
                IndexKind::None | IndexKind::All => None,
            };
            let key = match key {
                Some(k) if !k.is_empty() => k,
                _ => continue,
            };
            let file_kind = match kind {
                IndexKind::Exact => FileKind::ExactIndex,
                IndexKind::Cidr => FileKind::CidrIndex,
                IndexKind::Soundex => FileKind::SoundexIndex,
                IndexKind::None | IndexKind::All => continue,
            };
            out.push((
                file_kind,
                IndexLine {
                    offset,
                    data_file_no,
                    deleted: false,
                    attribute_id: attr.global_id,
                    key,
                },
            ));
        }
    }
    out
}

pub(crate) fn canonicalize_exact(value: &str) -> String {
    value.chars().filter(|c| !c.is_control()).collect::<String>().trim().to_uppercase()
}

/// Parallel sort across `rayon`'s thread pool for batches above
/// `config.shard_threshold()`; a plain sort is not worth the thread hop
/// for small ones.
pub(crate) fn external_sort(mut lines: Vec<IndexLine>, config: &IndexerConfig) -> Vec<IndexLine> {
    if lines.len() > config.shard_threshold() {
        lines.par_sort_unstable_by(|a, b| a.sort_key().cmp(&b.sort_key()));
    } else {
        lines.sort_unstable_by(|a, b| a.sort_key().cmp(&b.sort_key()));
    }
    lines
}

/// Tracks bytes consumed through a `BufRead` so each record's start
/// offset can be recovered without re-seeking.
struct Counting<R> {
    inner: R,
    pos: u64,
}

impl<R: Read> Read for Counting<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.pos += n as u64;
        Ok(n)
    }
}

impl<R: BufRead> BufRead for Counting<R> {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        self.inner.fill_buf()
    }

    fn consume(&mut self, amt: usize) {
        self.inner.consume(amt);
        self.pos += amt as u64;
    }
}

/// Build and publish indexes for a batch of newly-written data files
/// (§4.5). `new_data_files` names files already present, unregistered,
/// in `registry.dir()`.
pub fn build_indexes(
    class: &Class,
    area_name: &str,
    registry: &mut FileRegistry,
    new_data_files: Vec<IndexBuildInput>,
    config: &IndexerConfig,
) -> Result<Vec<FileDescriptor>> {
    let dir = registry.dir().to_path_buf();

    let mut add_data = Vec::with_capacity(new_data_files.len());
    for input in &new_data_files {
        let path = dir.join(&input.base_filename);
        let size = err_at!(IOError, std::fs::metadata(&path))?.len();
        add_data.push(NewFile {
            kind: FileKind::Data,
            base_filename: input.base_filename.clone(),
            size,
            record_count: 0,
            locked: false,
        });
    }
    let added_data = registry.modify_file_list(add_data, vec![], vec![], vec![], vec![])?;
    log::debug!("registered {} new data file(s) for {}/{}", added_data.len(), area_name, class.name);

    match index_added_data(class, area_name, &dir, &added_data) {
        Ok((exact, cidr, soundex, zero_record_ids, live_counts)) => {
            finish_build(registry, &dir, exact, cidr, soundex, zero_record_ids, live_counts, config)
        }
        Err(e) => {
            let ids: Vec<u64> = added_data.iter().map(|d| d.file_id).collect();
            if let Err(rollback_err) = registry.modify_file_list(vec![], ids, vec![], vec![], vec![]) {
                log::warn!("index build rollback failed to unregister data files: {}", rollback_err);
            }
            for d in &added_data {
                std::fs::remove_file(dir.join(&d.filename)).ok();
            }
            log::info!("aborted index build for {}/{}: {}", area_name, class.name, e);
            Err(e)
        }
    }
}

type ScanResult = (Vec<IndexLine>, Vec<IndexLine>, Vec<IndexLine>, Vec<u64>, Vec<Modify>);

fn index_added_data(
    class: &Class,
    area_name: &str,
    dir: &Path,
    added_data: &[FileDescriptor],
) -> Result<ScanResult> {
    let mut exact_lines = Vec::new();
    let mut cidr_lines = Vec::new();
    let mut soundex_lines = Vec::new();
    let mut zero_record_ids = Vec::new();
    let mut live_counts = Vec::new();

    for descriptor in added_data {
        let path = dir.join(&descriptor.filename);
        let file = util::open_file_r(&path)?;
        let mut reader = Counting {
            inner: io::BufReader::new(file),
            pos: 0,
        };
        let mut live = 0u64;
        loop {
            let start = reader.pos;
            match AnonymousRecord::parse_next(&mut reader)? {
                None => break,
                Some(ParseOutcome::Deleted) => continue,
                Some(ParseOutcome::Record(anon)) => {
                    live += 1;
                    let typed = anon.translate(class, area_name, false)?;
                    for (kind, line) in emit_index_lines(&typed, class, descriptor.file_id, start) {
                        match kind {
                            FileKind::ExactIndex => exact_lines.push(line),
                            FileKind::CidrIndex => cidr_lines.push(line),
                            FileKind::SoundexIndex => soundex_lines.push(line),
                            FileKind::Data => {}
                        }
                    }
                }
            }
        }
        if live == 0 {
            zero_record_ids.push(descriptor.file_id);
        } else {
            live_counts.push(Modify {
                file_id: descriptor.file_id,
                size: descriptor.size,
                record_count: live,
            });
        }
    }

    Ok((exact_lines, cidr_lines, soundex_lines, zero_record_ids, live_counts))
}

fn finish_build(
    registry: &mut FileRegistry,
    dir: &Path,
    exact_lines: Vec<IndexLine>,
    cidr_lines: Vec<IndexLine>,
    soundex_lines: Vec<IndexLine>,
    zero_record_ids: Vec<u64>,
    live_counts: Vec<Modify>,
    config: &IndexerConfig,
) -> Result<Vec<FileDescriptor>> {
    let mut add_indexes = Vec::new();
    let mut temp_paths = Vec::new();

    for (kind, lines, label) in [
        (FileKind::ExactIndex, exact_lines, "exact"),
        (FileKind::CidrIndex, cidr_lines, "cidr"),
        (FileKind::SoundexIndex, soundex_lines, "soundex"),
    ] {
        if lines.is_empty() {
            continue;
        }
        let sorted = external_sort(lines, config);
        match write_temp_index(dir, label, &sorted) {
            Ok((base_filename, size)) => {
                temp_paths.push(dir.join(&base_filename));
                add_indexes.push(NewFile {
                    kind,
                    base_filename,
                    size,
                    record_count: sorted.len() as u64,
                    locked: true,
                });
            }
            Err(e) => {
                for p in &temp_paths {
                    std::fs::remove_file(p).ok();
                }
                return Err(e);
            }
        }
    }

    let lock_ids: Vec<u64> = live_counts.iter().map(|m| m.file_id).collect();
    let published = registry.modify_file_list(add_indexes, zero_record_ids, live_counts, lock_ids, vec![])?;
    log::debug!("published {} index file(s)", published.len());
    Ok(published)
}

pub(crate) fn write_temp_index(dir: &Path, label: &str, lines: &[IndexLine]) -> Result<(String, u64)> {
    let mut tmp = err_at!(
        IOError,
        tempfile::Builder::new().prefix(&format!("{}-", label)).suffix(".idx").tempfile_in(dir)
    )?;
    for line in lines {
        err_at!(IOError, std::io::Write::write_all(&mut tmp, line.encode().as_bytes()))?;
    }
    err_at!(IOError, tmp.as_file_mut().sync_all())?;
    let path = match tmp.keep() {
        Ok((_file, path)) => path,
        Err(e) => return err_at!(IOError, msg: "failed to persist index temp file: {}", e),
    };
    let size = err_at!(IOError, std::fs::metadata(&path))?.len();
    let base_filename = path.file_name().unwrap().to_string_lossy().to_string();
    Ok((base_filename, size))
}

#[cfg(test)]
#[path = "build_test.rs"]
mod build_test;
