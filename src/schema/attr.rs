use regex::Regex;

use std::fmt;

/// Attribute value type (§3).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AttrType {
    Text,
    SeeAlso,
    Id,
}

/// Which secondary index(es), if any, a value of this attribute feeds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IndexKind {
    None,
    Exact,
    Cidr,
    Soundex,
    /// All three kinds, each when the value is eligible (§3, §4.5).
    All,
}

impl IndexKind {
    /// Expand `All` into the concrete kinds eligible for a given value;
    /// other kinds expand to themselves. Used by the indexer (§4.5) and
    /// by query planning's `INDEX_ALL` handling.
    pub fn concrete_kinds(self) -> &'static [IndexKind] {
        match self {
            IndexKind::None => &[],
            IndexKind::Exact => &[IndexKind::Exact],
            IndexKind::Cidr => &[IndexKind::Cidr],
            IndexKind::Soundex => &[IndexKind::Soundex],
            IndexKind::All => &[IndexKind::Exact, IndexKind::Cidr, IndexKind::Soundex],
        }
    }
}

/// An attribute definition, as held by a [crate::schema::Class] (§3).
#[derive(Clone)]
pub struct Attribute {
    pub name: String,
    pub aliases: Vec<String>,
    pub local_id: u32,
    pub global_id: u32,
    pub attr_type: AttrType,
    pub index_kind: IndexKind,
    pub primary_key: bool,
    pub required: bool,
    pub repeatable: bool,
    pub multi_line: bool,
    pub hierarchical: bool,
    pub private: bool,
    format: Option<Regex>,
    format_src: Option<String>,
}

impl fmt::Debug for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Attribute")
            .field("name", &self.name)
            .field("local_id", &self.local_id)
            .field("global_id", &self.global_id)
            .field("attr_type", &self.attr_type)
            .field("index_kind", &self.index_kind)
            .finish()
    }
}

impl Attribute {
    pub fn new(name: &str, local_id: u32, attr_type: AttrType, index_kind: IndexKind) -> Attribute {
        Attribute {
            name: name.to_string(),
            aliases: Vec::new(),
            local_id,
            global_id: 0, // assigned by Registry::define_attribute
            attr_type,
            index_kind,
            primary_key: false,
            required: false,
            repeatable: false,
            multi_line: false,
            hierarchical: false,
            private: false,
            format: None,
            format_src: None,
        }
    }

    pub fn set_aliases(mut self, aliases: Vec<String>) -> Attribute {
        self.aliases = aliases;
        self
    }

    pub fn set_primary_key(mut self, v: bool) -> Attribute {
        self.primary_key = v;
        self
    }

    pub fn set_required(mut self, v: bool) -> Attribute {
        self.required = v;
        self
    }

    pub fn set_repeatable(mut self, v: bool) -> Attribute {
        self.repeatable = v;
        self
    }

    pub fn set_multi_line(mut self, v: bool) -> Attribute {
        self.multi_line = v;
        self
    }

    pub fn set_hierarchical(mut self, v: bool) -> Attribute {
        self.hierarchical = v;
        self
    }

    pub fn set_private(mut self, v: bool) -> Attribute {
        self.private = v;
        self
    }

    /// Install a format constraint. `pattern` must be a valid regular
    /// expression; the constructor itself returns a [crate::Result]
    /// because a malformed pattern is a schema-validation error (§7),
    /// not a panic.
    pub fn set_format(mut self, pattern: &str) -> crate::Result<Attribute> {
        let re = crate::err_at!(InvalidFormat, Regex::new(&format!("^(?:{})$", pattern)))?;
        self.format = Some(re);
        self.format_src = Some(pattern.to_string());
        Ok(self)
    }

    pub fn format_src(&self) -> Option<&str> {
        self.format_src.as_deref()
    }

    /// Does `value` satisfy this attribute's format constraint? Always
    /// true when no constraint was configured.
    pub fn matches_format(&self, value: &str) -> bool {
        match &self.format {
            Some(re) => re.is_match(value),
            None => true,
        }
    }

    pub fn matches_name(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
            || self.aliases.iter().any(|a| a.eq_ignore_ascii_case(name))
    }
}

#[cfg(test)]
#[path = "attr_test.rs"]
mod attr_test;
