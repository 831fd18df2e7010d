//! Schema registry: authority areas, classes, and attribute definitions.
//!
//! Schema entities are created from configuration at startup (the
//! configuration-file reader itself is out of scope, §1) and are
//! immutable afterwards. The one piece of schema state that *is*
//! computed at runtime is the attribute `global_id` assignment, done on
//! first sight by [Registry::define_attribute] (§3: "assigned by the
//! schema registry on first sight").

mod area;
mod attr;
mod class;
mod registry;

pub use area::{AreaKind, AuthorityArea};
pub use attr::{AttrType, Attribute, IndexKind};
pub use class::Class;
pub use registry::Registry;
