//! Common file-system helpers shared by the file registry, indexer, and
//! write path: append-mode file creation, write-through writes, and
//! write-to-temp-then-rename for the files the spec requires to be
//! replaced atomically (SOA, `local.db`).

use fs2::FileExt;

use std::{
    ffi, fs,
    io::Write,
    path::{Path, PathBuf},
};

use crate::{err_at, Result};

pub mod dotlock;

/// Create a file in append mode, truncating any previous file of the
/// same name. Parent directories are created as needed.
pub fn create_file_a(path: &Path) -> Result<fs::File> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            err_at!(IOError, fs::create_dir_all(parent))?;
        }
    }
    fs::remove_file(path).ok(); // best-effort; fine if it didn't exist
    let mut opts = fs::OpenOptions::new();
    err_at!(IOError, opts.append(true).create_new(true).open(path))
}

/// Open an existing file in append mode.
pub fn open_file_a(path: &Path) -> Result<fs::File> {
    let mut opts = fs::OpenOptions::new();
    err_at!(IOError, opts.append(true).open(path))
}

/// Open an existing file for reading.
pub fn open_file_r(path: &Path) -> Result<fs::File> {
    err_at!(IOError, fs::OpenOptions::new().read(true).open(path))
}

/// Write `data` to `file` and immediately `sync_all`, so soft-delete and
/// SOA writes are never left half-flushed in an OS buffer (§5: "write
/// through").
pub fn sync_write(file: &mut fs::File, data: &[u8]) -> Result<usize> {
    let n = err_at!(IOError, file.write(data))?;
    if n != data.len() {
        return err_at!(IOError, msg: "partial write {}/{}", n, data.len());
    }
    err_at!(IOError, file.sync_all())?;
    Ok(n)
}

/// Replace `path`'s contents atomically: write `data` to a sibling temp
/// file, `sync_all`, then `rename` over `path`. Used for the SOA file and
/// for `local.db` (the rename itself happens while the dot-lock in
/// [dotlock] is held, so no reader ever observes a half-written file).
pub fn atomic_replace(path: &Path, data: &[u8]) -> Result<()> {
    let tmp = sibling_tmp_path(path);
    {
        let mut f = err_at!(IOError, fs::File::create(&tmp))?;
        sync_write(&mut f, data)?;
    }
    err_at!(IOError, fs::rename(&tmp, path))
}

fn sibling_tmp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| ffi::OsString::from("tmp"));
    name.push(".tmp");
    match path.parent() {
        Some(parent) => parent.join(name),
        None => PathBuf::from(name),
    }
}

/// Partition `items` into at most `shards` contiguous, roughly
/// equal-sized slices; mirrors the teacher's `as_sharded_array` helper,
/// used by the indexer to fan its external-merge sort across
/// `num_cpus::get()` workers.
pub fn as_sharded_array<T>(items: &[T], mut shards: usize) -> Vec<&[T]> {
    let mut n = items.len();
    let mut begin = 0;
    let mut acc = vec![];
    while begin < items.len() && shards > 0 {
        let m = ((n as f64) / (shards as f64)).ceil() as usize;
        let end = (begin + m).min(items.len());
        acc.push(&items[begin..end]);
        begin = end;
        n = n.saturating_sub(m);
        shards -= 1;
    }
    acc
}
