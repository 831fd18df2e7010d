use std::fs;
use std::path::PathBuf;

use crate::files::{FileDescriptor, NewFile};
use crate::util::{self, dotlock::DotLock};
use crate::{err_at, Result};

/// A patch applied to an existing descriptor's mutable counters
/// (§4.2's `modify` action).
pub struct Modify {
    pub file_id: u64,
    pub size: u64,
    pub record_count: u64,
}

/// Per-(class, authority-area) master file list, backed by `local.db`
/// in the class's data directory.
pub struct FileRegistry {
    dir: PathBuf,
    descriptors: Vec<FileDescriptor>,
}

impl FileRegistry {
    fn local_db_path(&self) -> PathBuf {
        self.dir.join("local.db")
    }

    fn lock_path(&self) -> PathBuf {
        self.dir.join(".local.db.lock")
    }

    /// Load the registry, taking the dot-lock briefly while reading
    /// (§5: "Readers of the master file list take the same dot-lock
    /// briefly"). A missing `local.db` is an empty registry.
    pub fn load(dir: PathBuf) -> Result<FileRegistry> {
        let path = dir.join("local.db");
        if !path.exists() {
            return Ok(FileRegistry {
                dir,
                descriptors: Vec::new(),
            });
        }

        let lock_path = dir.join(".local.db.lock");
        let _guard = DotLock::acquire(&lock_path)?;

        let text = err_at!(IOError, fs::read_to_string(&path))?;
        let mut descriptors = Vec::new();
        for line in text.lines() {
            if line.trim().is_empty() {
                continue;
            }
            descriptors.push(FileDescriptor::from_line(line)?);
        }
        Ok(FileRegistry { dir, descriptors })
    }

    pub fn dir(&self) -> &std::path::Path {
        &self.dir
    }

    pub fn descriptors(&self) -> &[FileDescriptor] {
        &self.descriptors
    }

    pub fn descriptor(&self, file_id: u64) -> Option<&FileDescriptor> {
        self.descriptors.iter().find(|d| d.file_id == file_id)
    }

    /// The sole mutator: performs `add`, `delete`, `modify`, `unlock`,
    /// `lock` in a single rewrite of `local.db` under the dot-lock
    /// (§4.2). Returns the descriptors materialized for `add`, in
    /// order, with their allocated file-ids and final filenames.
    pub fn modify_file_list(
        &mut self,
        add: Vec<NewFile>,
        delete: Vec<u64>,
        modify: Vec<Modify>,
        lock: Vec<u64>,
        unlock: Vec<u64>,
    ) -> Result<Vec<FileDescriptor>> {
        log::debug!(
            "modify_file_list on {:?}: add={} delete={} modify={} lock={} unlock={}",
            self.dir,
            add.len(),
            delete.len(),
            modify.len(),
            lock.len(),
            unlock.len(),
        );
        let lock_path = self.lock_path();
        let _guard = DotLock::acquire(&lock_path)?;

        self.descriptors.retain(|d| !delete.contains(&d.file_id));

        for patch in &modify {
            if let Some(d) = self.descriptors.iter_mut().find(|d| d.file_id == patch.file_id) {
                d.size = patch.size;
                d.record_count = patch.record_count;
            }
        }
        for file_id in &lock {
            if let Some(d) = self.descriptors.iter_mut().find(|d| d.file_id == *file_id) {
                d.locked = true;
            }
        }
        for file_id in &unlock {
            if let Some(d) = self.descriptors.iter_mut().find(|d| d.file_id == *file_id) {
                d.locked = false;
            }
        }

        let mut next_id = self.descriptors.iter().map(|d| d.file_id).max().unwrap_or(0) + 1;
        let mut added = Vec::with_capacity(add.len());
        for new_file in add {
            let file_id = next_id;
            next_id += 1;

            let final_name = new_file.kind.final_filename(&new_file.base_filename, file_id);
            let from = self.dir.join(&new_file.base_filename);
            let to = self.dir.join(&final_name);
            err_at!(IOError, fs::rename(&from, &to))?;

            let descriptor = FileDescriptor {
                kind: new_file.kind,
                filename: final_name,
                file_id,
                size: new_file.size,
                record_count: new_file.record_count,
                locked: new_file.locked,
                handle: None,
            };
            self.descriptors.push(descriptor.clone());
            added.push(descriptor);
        }

        let text = self
            .descriptors
            .iter()
            .map(FileDescriptor::to_line)
            .collect::<Vec<_>>()
            .join("\n");
        let mut text = text;
        if !text.is_empty() {
            text.push('\n');
        }
        util::atomic_replace(&self.local_db_path(), text.as_bytes())?;
        log::info!("local.db rewritten under {:?}: {} file(s) registered", self.dir, self.descriptors.len());

        Ok(added)
    }
}

#[cfg(test)]
#[path = "registry_test.rs"]
mod registry_test;
