use crate::{err_at, Result};

/// One line of an index file: `offset:data_file_no:deleted_flag:attribute_id:key`
/// (§4.5).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IndexLine {
    pub offset: u64,
    pub data_file_no: u64,
    pub deleted: bool,
    pub attribute_id: u32,
    pub key: String,
}

impl IndexLine {
    /// Sort key used by external sort and by the query engine's binary
    /// search: ascending `(key, attribute_id)`, byte-lexicographic.
    pub fn sort_key(&self) -> (&str, u32) {
        (self.key.as_str(), self.attribute_id)
    }

    pub fn encode(&self) -> String {
        format!(
            "{}:{}:{}:{}:{}\n",
            self.offset,
            self.data_file_no,
            self.deleted as u8,
            self.attribute_id,
            self.key,
        )
    }

    pub fn decode(line: &str) -> Result<IndexLine> {
        let line = line.trim_end_matches('\n');
        let mut parts = line.splitn(5, ':');
        let offset = parse_u64(&mut parts, line)?;
        let data_file_no = parse_u64(&mut parts, line)?;
        let deleted = parse_u64(&mut parts, line)? != 0;
        let attribute_id = parse_u64(&mut parts, line)? as u32;
        let key = match parts.next() {
            Some(k) => k.to_string(),
            None => return err_at!(InvalidFile, msg: "malformed index line: {:?}", line),
        };
        Ok(IndexLine {
            offset,
            data_file_no,
            deleted,
            attribute_id,
            key,
        })
    }
}

fn parse_u64(parts: &mut std::str::SplitN<'_, char>, line: &str) -> Result<u64> {
    match parts.next() {
        Some(s) => err_at!(InvalidFile, s.parse::<u64>()),
        None => err_at!(InvalidFile, msg: "malformed index line: {:?}", line),
    }
}

#[cfg(test)]
#[path = "line_test.rs"]
mod line_test;
