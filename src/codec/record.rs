use std::io::{BufRead, Write};

use crate::schema::{AttrType, Class};
use crate::{err_at, Result};

/// Result of parsing one logical record off a data-file stream (§4.1).
pub enum ParseOutcome {
    Record(AnonymousRecord),
    /// The record's leading byte was `_`: it has been soft-deleted.
    /// The stream has already been advanced past it.
    Deleted,
}

/// A record as read straight off disk: ordered `(name, value)` pairs,
/// names not yet bound to a schema.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AnonymousRecord {
    pub pairs: Vec<(String, String)>,
}

impl AnonymousRecord {
    pub fn new(pairs: Vec<(String, String)>) -> AnonymousRecord {
        AnonymousRecord { pairs }
    }

    /// Parse the next record from `reader`. Returns `Ok(None)` only at
    /// true end-of-stream (no bytes left at all); a record with no
    /// attribute lines before `---` or EOF is an [crate::Error::EmptyRecord].
    pub fn parse_next<R: BufRead>(reader: &mut R) -> Result<Option<ParseOutcome>> {
        let mut logical_lines: Vec<String> = Vec::new();
        let mut saw_any_bytes = false;

        loop {
            let mut raw = String::new();
            let n = err_at!(IOError, reader.read_line(&mut raw))?;
            if n == 0 {
                break;
            }
            saw_any_bytes = true;
            let line = strip_eol(&raw);

            if line.starts_with("---") {
                break;
            }

            if let Some(stripped) = line.strip_suffix('\\') {
                let mut acc = stripped.to_string();
                loop {
                    let mut cont = String::new();
                    let n = err_at!(IOError, reader.read_line(&mut cont))?;
                    if n == 0 {
                        break;
                    }
                    let cont = strip_eol(&cont);
                    match cont.strip_suffix('\\') {
                        Some(more) => {
                            acc.push('\n');
                            acc.push_str(more);
                        }
                        None => {
                            acc.push('\n');
                            acc.push_str(&cont);
                            break;
                        }
                    }
                }
                logical_lines.push(acc);
            } else {
                logical_lines.push(line);
            }
        }

        if !saw_any_bytes {
            return Ok(None);
        }
        if logical_lines.is_empty() {
            return err_at!(EmptyRecord, msg: "record has no attribute lines");
        }

        if logical_lines[0].as_bytes().first() == Some(&b'_') {
            return Ok(Some(ParseOutcome::Deleted));
        }

        let mut pairs = Vec::with_capacity(logical_lines.len());
        for line in logical_lines {
            pairs.push(split_attr_line(&line)?);
        }
        Ok(Some(ParseOutcome::Record(AnonymousRecord { pairs })))
    }

    /// Write all attribute lines in original order, terminated by the
    /// record separator. Caller flushes.
    pub fn emit<W: Write>(&self, writer: &mut W) -> Result<()> {
        for (name, value) in &self.pairs {
            if value.contains('\n') {
                let joined = value.replace('\n', "\\\n");
                err_at!(IOError, writeln!(writer, "{}:{}", name, joined))?;
            } else {
                err_at!(IOError, writeln!(writer, "{}:{}", name, value))?;
            }
        }
        err_at!(IOError, writeln!(writer, "---"))?;
        Ok(())
    }

    /// Bind each pair to `class`'s attribute definitions. Unknown names
    /// fail with [crate::Error::UnknownAttribute] when `strict` is true;
    /// when false, unknown names pass through as untyped text fields.
    pub fn translate(&self, class: &Class, area_name: &str, strict: bool) -> Result<TypedRecord> {
        let mut fields = Vec::with_capacity(self.pairs.len());
        for (name, value) in &self.pairs {
            match class.attribute(name) {
                Some(attr) => fields.push(TypedField {
                    attr_name: attr.name.clone(),
                    global_id: attr.global_id,
                    local_id: attr.local_id,
                    attr_type: attr.attr_type,
                    value: value.clone(),
                }),
                None if strict => {
                    return err_at!(UnknownAttribute, msg: "unknown attribute: {}", name)
                }
                None => fields.push(TypedField {
                    attr_name: name.clone(),
                    global_id: 0,
                    local_id: 0,
                    attr_type: AttrType::Text,
                    value: value.clone(),
                }),
            }
        }
        Ok(TypedRecord {
            class_name: class.name.clone(),
            area_name: area_name.to_string(),
            fields,
            locator: None,
        })
    }
}

/// One schema-bound `(attribute, value)` pair within a [TypedRecord].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TypedField {
    pub attr_name: String,
    pub global_id: u32,
    pub local_id: u32,
    pub attr_type: AttrType,
    pub value: String,
}

/// A record bound to its class and authority area, with the locator
/// filled in once it has a home in a data file (§3).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TypedRecord {
    pub class_name: String,
    pub area_name: String,
    pub fields: Vec<TypedField>,
    pub locator: Option<(u64, u64)>,
}

impl TypedRecord {
    pub fn value_of(&self, attr_name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.attr_name.eq_ignore_ascii_case(attr_name))
            .map(|f| f.value.as_str())
    }

    pub fn id(&self) -> Option<&str> {
        self.value_of("ID")
    }

    pub fn updated(&self) -> Option<&str> {
        self.value_of("Updated")
    }

    pub fn with_locator(mut self, data_file_no: u64, offset: u64) -> TypedRecord {
        self.locator = Some((data_file_no, offset));
        self
    }

    pub fn to_anonymous(&self) -> AnonymousRecord {
        AnonymousRecord {
            pairs: self
                .fields
                .iter()
                .map(|f| (f.attr_name.clone(), f.value.clone()))
                .collect(),
        }
    }
}

fn strip_eol(line: &str) -> String {
    line.trim_end_matches('\n').trim_end_matches('\r').to_string()
}

fn split_attr_line(line: &str) -> Result<(String, String)> {
    match line.find(':') {
        Some(idx) => Ok((
            line[..idx].to_string(),
            line[idx + 1..].trim_start().to_string(),
        )),
        None => err_at!(InvalidRecord, msg: "attribute line missing ':': {:?}", line),
    }
}

#[cfg(test)]
#[path = "record_test.rs"]
mod record_test;
