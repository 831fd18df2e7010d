use std::fs;

use crate::{err_at, Result};

/// What a listed file holds (§4.2).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FileKind {
    Data,
    ExactIndex,
    CidrIndex,
    SoundexIndex,
}

impl FileKind {
    fn suffix(self) -> &'static str {
        match self {
            FileKind::Data => "data",
            FileKind::ExactIndex => "exact",
            FileKind::CidrIndex => "cidr",
            FileKind::SoundexIndex => "soundex",
        }
    }

    fn code(self) -> &'static str {
        match self {
            FileKind::Data => "DATA",
            FileKind::ExactIndex => "EXACT-INDEX",
            FileKind::CidrIndex => "CIDR-INDEX",
            FileKind::SoundexIndex => "SOUNDEX-INDEX",
        }
    }

    fn from_code(code: &str) -> Result<FileKind> {
        match code {
            "DATA" => Ok(FileKind::Data),
            "EXACT-INDEX" => Ok(FileKind::ExactIndex),
            "CIDR-INDEX" => Ok(FileKind::CidrIndex),
            "SOUNDEX-INDEX" => Ok(FileKind::SoundexIndex),
            other => err_at!(InvalidFile, msg: "unknown file kind: {:?}", other),
        }
    }

    /// Materialize the final on-disk filename for a file of this kind
    /// once it has been allocated a file-id (§4.2: "renaming their
    /// generated `base_filename` template with a freshly allocated
    /// file-id").
    pub fn final_filename(self, base_filename: &str, file_id: u64) -> String {
        format!("{}-{:08}.{}", base_filename, file_id, self.suffix())
    }
}

/// One row of the master file list. `handle` is never persisted; it is
/// populated on demand when a caller needs to read or append to the
/// file and dropped once no longer needed.
pub struct FileDescriptor {
    pub kind: FileKind,
    pub filename: String,
    pub file_id: u64,
    pub size: u64,
    pub record_count: u64,
    pub locked: bool,
    pub handle: Option<fs::File>,
}

impl Clone for FileDescriptor {
    fn clone(&self) -> FileDescriptor {
        FileDescriptor {
            kind: self.kind,
            filename: self.filename.clone(),
            file_id: self.file_id,
            size: self.size,
            record_count: self.record_count,
            locked: self.locked,
            handle: None,
        }
    }
}

impl std::fmt::Debug for FileDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("FileDescriptor")
            .field("kind", &self.kind)
            .field("filename", &self.filename)
            .field("file_id", &self.file_id)
            .field("size", &self.size)
            .field("record_count", &self.record_count)
            .field("locked", &self.locked)
            .finish()
    }
}

impl FileDescriptor {
    /// `type:<kind> file:<relpath> file_no:<n> size:<bytes>
    /// num_recs:<n> lock:<0|1>` (§6 "Master file list").
    pub fn to_line(&self) -> String {
        format!(
            "type:{} file:{} file_no:{} size:{} num_recs:{} lock:{}",
            self.kind.code(),
            self.filename,
            self.file_id,
            self.size,
            self.record_count,
            self.locked as u8,
        )
    }

    pub fn from_line(line: &str) -> Result<FileDescriptor> {
        let kind = FileKind::from_code(field(line, "type")?)?;
        let filename = field(line, "file")?.to_string();
        let file_id = err_at!(InvalidFile, field(line, "file_no")?.parse::<u64>())?;
        let size = err_at!(InvalidFile, field(line, "size")?.parse::<u64>())?;
        let record_count = err_at!(InvalidFile, field(line, "num_recs")?.parse::<u64>())?;
        let lock = field(line, "lock")?;
        let locked = match lock {
            "0" => false,
            "1" => true,
            other => return err_at!(InvalidFile, msg: "malformed lock field {:?} in {:?}", other, line),
        };

        Ok(FileDescriptor {
            kind,
            filename,
            file_id,
            size,
            record_count,
            locked,
            handle: None,
        })
    }
}

/// Find the value of `key:value` token `key` among `line`'s
/// whitespace-separated fields.
fn field<'a>(line: &'a str, key: &str) -> Result<&'a str> {
    let prefix = format!("{}:", key);
    match line.split_whitespace().find_map(|tok| tok.strip_prefix(prefix.as_str())) {
        Some(v) => Ok(v),
        None => err_at!(InvalidFile, msg: "missing {:?} field in {:?}", key, line),
    }
}

/// A pending `add` entry handed to [crate::files::FileRegistry::modify_file_list].
pub struct NewFile {
    pub kind: FileKind,
    pub base_filename: String,
    pub size: u64,
    pub record_count: u64,
    pub locked: bool,
}

#[cfg(test)]
#[path = "descriptor_test.rs"]
mod descriptor_test;
