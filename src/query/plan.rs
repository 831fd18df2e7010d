//! Attribute resolution and policy enforcement (§4.6 "Planning", and
//! the query-policy rejections listed under error handling).

use crate::query::tree::{Compare, Term};
use crate::schema::{Class, IndexKind};
use crate::{err_at, Result};

/// Caps and feature gates applied to every term before it is executed.
/// The default is permissive (§8 scenario: wildcards succeed unless a
/// caller has disabled them).
#[derive(Clone, Copy, Debug)]
pub struct QueryPolicy {
    pub allow_wildcard: bool,
    pub allow_substring: bool,
    pub allow_negated: bool,
    /// 0 means unlimited (§4.6 "Hit limits").
    pub hit_limit: u64,
}

impl Default for QueryPolicy {
    fn default() -> QueryPolicy {
        QueryPolicy {
            allow_wildcard: true,
            allow_substring: true,
            allow_negated: true,
            hit_limit: 0,
        }
    }
}

impl QueryPolicy {
    /// Start from the permissive default; use the `set_*` methods to
    /// tighten it (teacher idiom from `robt::Config`).
    pub fn new() -> QueryPolicy {
        QueryPolicy::default()
    }

    /// Allow or disallow `PREFIX` (wildcard) compares.
    pub fn set_allow_wildcard(&mut self, allow: bool) -> &mut Self {
        self.allow_wildcard = allow;
        self
    }

    /// Allow or disallow `SUBSTRING` compares.
    pub fn set_allow_substring(&mut self, allow: bool) -> &mut Self {
        self.allow_substring = allow;
        self
    }

    /// Allow or disallow negated compares.
    pub fn set_allow_negated(&mut self, allow: bool) -> &mut Self {
        self.allow_negated = allow;
        self
    }

    /// Cap the number of hits `run_query` returns before truncating
    /// (non-fatally) with `hit_limit_exceeded`. 0 means unlimited.
    pub fn set_hit_limit(&mut self, limit: u64) -> &mut Self {
        self.hit_limit = limit;
        self
    }
}

/// What a resolved leaf dispatches against: the attribute's global id
/// (when named) and the concrete index kinds to search. `None` means
/// the disjunct this term belongs to short-circuits to empty — either
/// the attribute name didn't resolve, or it resolves to an attribute
/// that feeds no index.
pub(crate) struct Resolution {
    pub global_id: Option<u32>,
    pub kinds: Vec<IndexKind>,
}

/// Reject terms the policy disallows (§"Query policy: too complex").
pub(crate) fn check_policy(term: &Term, policy: &QueryPolicy) -> Result<()> {
    if term.compare.is_negated() && !policy.allow_negated {
        return err_at!(QueryTooComplex, msg: "negated compare disallowed by policy");
    }
    if term.compare.is_prefix() && !policy.allow_wildcard {
        return err_at!(QueryTooComplex, msg: "wildcard (prefix) compare disallowed by policy");
    }
    if term.compare.is_substring() && !policy.allow_substring {
        return err_at!(QueryTooComplex, msg: "substring compare disallowed by policy");
    }
    Ok(())
}

/// Resolve a leaf's attribute name against `class` (§4.6 "Planning").
/// A named attribute that doesn't exist on `class`, or one with no
/// index at all, short-circuits its disjunct to empty: `Ok(None)`, not
/// an error. An unnamed leaf is `INDEX_ALL`: every concrete index kind
/// is tried.
pub(crate) fn resolve_leaf(leaf: &Term, class: &Class) -> Resolution {
    match &leaf.attr_name {
        Some(name) => match class.attribute(name) {
            Some(attr) => {
                let kinds = attr.index_kind.concrete_kinds().to_vec();
                Resolution {
                    global_id: Some(attr.global_id),
                    kinds,
                }
            }
            None => Resolution {
                global_id: None,
                kinds: Vec::new(),
            },
        },
        None => Resolution {
            global_id: None,
            kinds: vec![IndexKind::Exact, IndexKind::Cidr, IndexKind::Soundex],
        },
    }
}

/// A named leaf whose attribute didn't resolve, or resolved to no
/// index, carries no kinds to search: its disjunct contributes no
/// hits (§4.6: "An unresolvable attribute short-circuits the disjunct
/// to empty").
pub(crate) fn is_empty_resolution(res: &Resolution) -> bool {
    res.kinds.is_empty()
}

/// `Full`/`Prefix` compares keep the key space contiguous around the
/// query value, so the binary-search protocol applies; `Substring` and
/// any negated compare do not, and require a full scan (§4.6's dispatch
/// table; this crate derives the algorithm from `compare` rather than
/// trusting a possibly-inconsistent caller-supplied `search_type`).
pub(crate) fn needs_full_scan(compare: Compare) -> bool {
    compare.is_substring() || compare.is_negated()
}

#[cfg(test)]
#[path = "plan_test.rs"]
mod plan_test;
