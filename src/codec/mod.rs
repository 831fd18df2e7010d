//! Record codec: textual on-disk record form, anonymous/typed
//! translation, and attribute validation (§4.1).

mod record;
mod validate;

pub use record::{AnonymousRecord, ParseOutcome, TypedField, TypedRecord};
pub use validate::{validate, ValidationMode, Violation};

#[cfg(test)]
#[path = "mod_test.rs"]
mod mod_test;
