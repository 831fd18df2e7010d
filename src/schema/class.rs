use std::path::PathBuf;

use crate::schema::Attribute;
use crate::Result;

/// Hook for classes whose records need bespoke parsing beyond the
/// generic attribute-line grammar (§4.7, e.g. classes that embed
/// free-form sub-records). Resolved at schema-load time and invoked by
/// the write path before generic validation runs.
pub trait ExternalParser: Send + Sync {
    /// Parse `raw` into canonical `attribute: value` lines, or fail with
    /// a descriptive [crate::Error::InvalidRecord].
    fn parse(&self, raw: &str) -> Result<Vec<(String, String)>>;
}

/// A record class: its attribute definitions in declared order, the
/// on-disk directory holding its data files, and an optional external
/// parser (§3).
pub struct Class {
    pub name: String,
    pub data_dir: PathBuf,
    pub attributes: Vec<Attribute>,
    pub external_parser: Option<Box<dyn ExternalParser>>,
}

impl Clone for Class {
    fn clone(&self) -> Class {
        // external_parser is trait-object state set once at schema load
        // time and never needs duplicating independently of the
        // original Class; clones share nothing fancier than the
        // attribute list.
        Class {
            name: self.name.clone(),
            data_dir: self.data_dir.clone(),
            attributes: self.attributes.clone(),
            external_parser: None,
        }
    }
}

impl std::fmt::Debug for Class {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("Class")
            .field("name", &self.name)
            .field("data_dir", &self.data_dir)
            .field("attributes", &self.attributes.len())
            .field("external_parser", &self.external_parser.is_some())
            .finish()
    }
}

impl Class {
    pub fn new(name: &str, data_dir: PathBuf) -> Class {
        Class {
            name: name.to_string(),
            data_dir,
            attributes: Vec::new(),
            external_parser: None,
        }
    }

    pub fn add_attribute(&mut self, attr: Attribute) -> &mut Self {
        self.attributes.push(attr);
        self
    }

    pub fn set_external_parser(&mut self, parser: Box<dyn ExternalParser>) -> &mut Self {
        self.external_parser = Some(parser);
        self
    }

    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.matches_name(name))
    }

    pub fn primary_key(&self) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.primary_key)
    }
}

#[cfg(test)]
#[path = "class_test.rs"]
mod class_test;
