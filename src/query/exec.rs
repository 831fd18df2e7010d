//! Index-backed executor (§4.6 "Per-leaf dispatch" through "Hit limits").

use std::collections::HashSet;
use std::fs;
use std::io::{BufRead, BufReader, Seek, SeekFrom};
use std::path::Path;

use crate::codec::{AnonymousRecord, ParseOutcome, TypedRecord};
use crate::files::{FileKind, FileRegistry};
use crate::index::{self, IndexLine};
use crate::query::plan::{self, QueryPolicy};
use crate::query::tree::{Compare, Query, Term};
use crate::schema::{AttrType, Class, IndexKind};
use crate::{err_at, phonetic, util, Result};

/// Outcome of [run_query]: the matched records in discovery order, and
/// whether `policy.hit_limit` cut the scan short. Hitting the limit is
/// non-fatal (§4.6, §7): it truncates the response, it never discards
/// what was already found.
pub struct QueryOutcome {
    pub records: Vec<TypedRecord>,
    pub hit_limit_exceeded: bool,
}

/// Run `query` against `class`'s published indexes in `registry.dir()`
/// and return the matching records, in the order they were found,
/// together with a marker for whether `policy.hit_limit` truncated the
/// scan (a limit of 0 means unlimited).
pub fn run_query(
    registry: &FileRegistry,
    class: &Class,
    area_name: &str,
    query: &Query,
    policy: &QueryPolicy,
) -> Result<QueryOutcome> {
    let mut seen: HashSet<(String, String, u64, u64)> = HashSet::new();
    let mut results = Vec::new();
    let mut hit_limit_exceeded = false;

    'disjuncts: for conjunct in &query.disjuncts {
        for term in &conjunct.terms {
            plan::check_policy(term, policy)?;
        }

        let resolution = plan::resolve_leaf(conjunct.leaf(), class);
        if plan::is_empty_resolution(&resolution) {
            continue;
        }

        for kind in &resolution.kinds {
            let candidates = match kind {
                IndexKind::Exact => scan_exact(registry, conjunct.leaf())?,
                IndexKind::Soundex => scan_soundex(registry, conjunct.leaf())?,
                IndexKind::Cidr => scan_cidr(registry, conjunct.leaf())?,
                IndexKind::None | IndexKind::All => Vec::new(),
            };

            for line in candidates {
                if line.deleted {
                    continue;
                }
                if let Some(global_id) = resolution.global_id {
                    if line.attribute_id != global_id {
                        continue;
                    }
                } else if is_id_attribute(class, line.attribute_id) {
                    // An unnamed (INDEX_ALL) query never surfaces a hit
                    // on an ID-typed attribute (§4.6).
                    continue;
                }

                let key = (area_name.to_string(), class.name.clone(), line.data_file_no, line.offset);
                if seen.contains(&key) {
                    continue;
                }

                let record = load_record(registry, class, area_name, line.data_file_no, line.offset)?;
                if !passes_and_list(&record, conjunct.and_list()) {
                    continue;
                }

                seen.insert(key);
                if policy.hit_limit != 0 && results.len() as u64 >= policy.hit_limit {
                    hit_limit_exceeded = true;
                    break 'disjuncts;
                }
                results.push(record);
            }
        }
    }

    Ok(QueryOutcome { records: results, hit_limit_exceeded })
}

fn is_id_attribute(class: &Class, global_id: u32) -> bool {
    class
        .attributes
        .iter()
        .any(|a| a.global_id == global_id && a.attr_type == AttrType::Id)
}

fn passes_and_list(record: &TypedRecord, and_list: &[Term]) -> bool {
    and_list.iter().all(|term| {
        let needle = term.value.to_uppercase();
        record.fields.iter().any(|field| {
            let name_matches = match &term.attr_name {
                Some(name) => field.attr_name.eq_ignore_ascii_case(name),
                None => true,
            };
            name_matches && term.compare.matches(&field.value.to_uppercase(), &needle)
        })
    })
}

fn load_record(
    registry: &FileRegistry,
    class: &Class,
    area_name: &str,
    data_file_no: u64,
    offset: u64,
) -> Result<TypedRecord> {
    let descriptor = match registry.descriptor(data_file_no) {
        Some(d) => d,
        None => return err_at!(IndexMissing, msg: "data file {} not in registry", data_file_no),
    };
    let path = registry.dir().join(&descriptor.filename);
    let mut file = util::open_file_r(&path)?;
    err_at!(IOError, file.seek(SeekFrom::Start(offset)))?;
    let mut reader = BufReader::new(file);
    match AnonymousRecord::parse_next(&mut reader)? {
        Some(ParseOutcome::Record(anon)) => {
            let typed = anon.translate(class, area_name, false)?;
            Ok(typed.with_locator(data_file_no, offset))
        }
        _ => err_at!(IndexMissing, msg: "no live record at {}:{}", data_file_no, offset),
    }
}

fn find_index_file(registry: &FileRegistry, kind: FileKind) -> Option<&Path> {
    registry
        .descriptors()
        .iter()
        .find(|d| d.kind == kind)
        .map(|d| d.filename.as_ref())
}

fn load_index_lines(registry: &FileRegistry, kind: FileKind) -> Result<Vec<IndexLine>> {
    let filename = match find_index_file(registry, kind) {
        Some(f) => f.to_path_buf(),
        None => return Ok(Vec::new()),
    };
    let path = registry.dir().join(&filename);
    let text = err_at!(IOError, fs::read_to_string(&path))?;
    let mut lines = Vec::new();
    for line in text.lines() {
        if !line.is_empty() {
            lines.push(IndexLine::decode(line)?);
        }
    }
    Ok(lines)
}

/// Binary search on `(key, attribute_id)` order (§4.6 "Binary search
/// protocol"): the in-memory equivalent of snapping each probed offset
/// back to a line boundary, since the whole sorted file is held as a
/// `Vec` rather than re-read by byte offset.
fn lower_bound<'a>(lines: &'a [IndexLine], key: &str) -> usize {
    lines.partition_point(|l| l.key.as_str() < key)
}

fn scan_exact(registry: &FileRegistry, leaf: &Term) -> Result<Vec<IndexLine>> {
    let lines = load_index_lines(registry, FileKind::ExactIndex)?;
    let needle = index::canonicalize_exact(&leaf.value);
    Ok(exact_style_scan(&lines, leaf.compare, &needle))
}

fn scan_soundex(registry: &FileRegistry, leaf: &Term) -> Result<Vec<IndexLine>> {
    let lines = load_index_lines(registry, FileKind::SoundexIndex)?;
    let needle = match phonetic::metaphone(&leaf.value) {
        Some(m) => m,
        None => return Ok(Vec::new()),
    };
    Ok(exact_style_scan(&lines, leaf.compare, &needle))
}

/// Shared by `EXACT-INDEX` and `SOUNDEX-INDEX` dispatch, which the
/// specification describes identically once the query value has been
/// canonicalized (§4.6: "rewrite the query value ... then behave like
/// `EXACT-INDEX`").
fn exact_style_scan(lines: &[IndexLine], compare: Compare, needle: &str) -> Vec<IndexLine> {
    if plan::needs_full_scan(compare) {
        lines.iter().filter(|l| compare.matches(&l.key, needle)).cloned().collect()
    } else {
        let start = lower_bound(lines, needle);
        lines[start..]
            .iter()
            .take_while(|l| compare.matches(&l.key, needle))
            .cloned()
            .collect()
    }
}

fn scan_cidr(registry: &FileRegistry, leaf: &Term) -> Result<Vec<IndexLine>> {
    let lines = load_index_lines(registry, FileKind::CidrIndex)?;
    // A value that isn't a parseable network address simply has no
    // hits in this index, rather than failing the whole query — this
    // matters for an unnamed (`INDEX_ALL`) leaf, which tries every
    // index kind regardless of what shape the value happens to be.
    let prefix = match crate::net::Prefix::parse_for_searching(&leaf.value) {
        Ok(p) => p,
        Err(_) => return Ok(Vec::new()),
    };

    let mut out = Vec::new();
    for len in prefix.walk_lengths() {
        let masked = prefix.masked_to(len).to_string();
        let start = lower_bound(&lines, &masked);
        out.extend(lines[start..].iter().take_while(|l| l.key == masked).cloned());
    }
    Ok(out)
}

#[cfg(test)]
#[path = "exec_test.rs"]
mod exec_test;
