//! Query engine: tree, planner, and index-backed executor (§4.6).

mod exec;
mod plan;
mod tree;

pub use exec::{run_query, QueryOutcome};
pub use plan::QueryPolicy;
pub use tree::{Compare, Conjunct, Query, SearchType, Term};

#[cfg(test)]
#[path = "mod_test.rs"]
mod mod_test;
