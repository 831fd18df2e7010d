//! Query tree types (§4.6): a disjunction of conjunctions of leaf terms.

/// How a leaf term is dispatched against an index file.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SearchType {
    Binary,
    FullScan,
    Cidr,
}

/// How a term's value compares against an index or field value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Compare {
    Full,
    Prefix,
    Substring,
    NotFull,
    NotPrefix,
    NotSubstring,
}

impl Compare {
    pub fn is_negated(self) -> bool {
        matches!(self, Compare::NotFull | Compare::NotPrefix | Compare::NotSubstring)
    }

    pub fn is_substring(self) -> bool {
        matches!(self, Compare::Substring | Compare::NotSubstring)
    }

    pub fn is_prefix(self) -> bool {
        matches!(self, Compare::Prefix | Compare::NotPrefix)
    }

    /// Does `haystack` satisfy this compare against `needle`? Both
    /// arguments must already be canonicalized the same way (§4.6's
    /// "applying the compare after upper-casing the value").
    pub fn matches(self, haystack: &str, needle: &str) -> bool {
        match self {
            Compare::Full => haystack == needle,
            Compare::Prefix => haystack.starts_with(needle),
            Compare::Substring => haystack.contains(needle),
            Compare::NotFull => haystack != needle,
            Compare::NotPrefix => !haystack.starts_with(needle),
            Compare::NotSubstring => !haystack.contains(needle),
        }
    }
}

/// One leaf term (§4.6). `global_id` is filled in by the planner once
/// `attr_name` is resolved against the schema; it is `None` for an
/// unresolved or unnamed (`INDEX_ALL`) term.
#[derive(Clone, Debug)]
pub struct Term {
    pub attr_name: Option<String>,
    pub global_id: Option<u32>,
    pub search_type: SearchType,
    pub compare: Compare,
    pub value: String,
}

impl Term {
    pub fn new(attr_name: Option<&str>, search_type: SearchType, compare: Compare, value: &str) -> Term {
        Term {
            attr_name: attr_name.map(|s| s.to_string()),
            global_id: None,
            search_type,
            compare,
            value: value.to_string(),
        }
    }
}

/// A conjunction: `terms[0]` drives the index dispatch, `terms[1..]`
/// are evaluated against the loaded record as an AND-list (§4.6).
#[derive(Clone, Debug)]
pub struct Conjunct {
    pub terms: Vec<Term>,
}

impl Conjunct {
    pub fn new(leaf: Term, and_list: Vec<Term>) -> Conjunct {
        let mut terms = Vec::with_capacity(and_list.len() + 1);
        terms.push(leaf);
        terms.extend(and_list);
        Conjunct { terms }
    }

    pub fn leaf(&self) -> &Term {
        &self.terms[0]
    }

    pub fn and_list(&self) -> &[Term] {
        &self.terms[1..]
    }
}

/// A full query: a disjunction of conjunctions.
#[derive(Clone, Debug, Default)]
pub struct Query {
    pub disjuncts: Vec<Conjunct>,
}

impl Query {
    pub fn new(disjuncts: Vec<Conjunct>) -> Query {
        Query { disjuncts }
    }
}

#[cfg(test)]
#[path = "tree_test.rs"]
mod tree_test;
