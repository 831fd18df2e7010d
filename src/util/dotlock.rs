//! Advisory dot-lock used to serialize the full read-modify-write cycle
//! against `local.db` (§4.2, §5). Mirrors the teacher's use of
//! `fs2::FileExt` in `robt::Reader`, but held exclusively and for the
//! whole mutation rather than just while reading a block.

use fs2::FileExt;

use std::{fs, path::Path};

use crate::{err_at, Result};

/// RAII guard over an exclusive lock on a `.lock` file sitting next to
/// the resource being protected. Dropping the guard releases the lock.
pub struct DotLock {
    _file: fs::File,
}

impl DotLock {
    /// Block until the lock is acquired.
    pub fn acquire(lock_path: &Path) -> Result<DotLock> {
        let file = open_or_create(lock_path)?;
        err_at!(LockBusy, file.lock_exclusive())?;
        Ok(DotLock { _file: file })
    }

    /// Acquire without blocking; fails with [crate::Error::LockBusy] if
    /// another writer currently holds it.
    pub fn try_acquire(lock_path: &Path) -> Result<DotLock> {
        let file = open_or_create(lock_path)?;
        err_at!(LockBusy, file.try_lock_exclusive())?;
        Ok(DotLock { _file: file })
    }
}

impl Drop for DotLock {
    fn drop(&mut self) {
        FileExt::unlock(&self._file).ok();
    }
}

fn open_or_create(lock_path: &Path) -> Result<fs::File> {
    if let Some(parent) = lock_path.parent() {
        if !parent.as_os_str().is_empty() {
            err_at!(IOError, fs::create_dir_all(parent))?;
        }
    }
    err_at!(
        IOError,
        fs::OpenOptions::new()
            .create(true)
            .write(true)
            .open(lock_path)
    )
}

#[cfg(test)]
#[path = "dotlock_test.rs"]
mod dotlock_test;
