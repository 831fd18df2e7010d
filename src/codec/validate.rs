use crate::codec::TypedRecord;
use crate::schema::Class;
use crate::{Error, Result};

/// Validation-mode bitset (§4.1): whether to log a violation, and
/// whether to stop at the first one or collect every one.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ValidationMode(u8);

impl ValidationMode {
    pub const QUIET: ValidationMode = ValidationMode(0b000);
    pub const PROTOCOL_ERRORS: ValidationMode = ValidationMode(0b001);
    pub const FIND_ALL: ValidationMode = ValidationMode(0b010);

    pub fn contains(self, flag: ValidationMode) -> bool {
        self.0 & flag.0 == flag.0
    }
}

impl std::ops::BitOr for ValidationMode {
    type Output = ValidationMode;

    fn bitor(self, rhs: ValidationMode) -> ValidationMode {
        ValidationMode(self.0 | rhs.0)
    }
}

/// One failed validation rule (§4.1, §7).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Violation {
    Missing(String),
    DisallowedRepeat(String),
    FormatMismatch(String, String),
}

impl Violation {
    fn into_error(self) -> Error {
        match self {
            Violation::Missing(name) => {
                Error::MissingAttribute("<validate>".to_string(), name)
            }
            Violation::DisallowedRepeat(name) => {
                Error::DisallowedRepeat("<validate>".to_string(), name)
            }
            Violation::FormatMismatch(name, value) => Error::FormatMismatch(
                "<validate>".to_string(),
                format!("{}: {:?}", name, value),
            ),
        }
    }
}

/// Check `record` against `class`'s attribute definitions: every
/// required attribute present, no non-repeatable attribute repeated,
/// and every present value matches its format constraint.
///
/// Under [ValidationMode::FIND_ALL] every violation is collected and
/// returned as `Ok(violations)` (empty if none). Otherwise the first
/// violation found is returned as `Err`, and `Ok(vec![])` means the
/// record passed.
pub fn validate(record: &TypedRecord, class: &Class, mode: ValidationMode) -> Result<Vec<Violation>> {
    let mut violations = Vec::new();
    let find_all = mode.contains(ValidationMode::FIND_ALL);

    for attr in &class.attributes {
        let count = record
            .fields
            .iter()
            .filter(|f| f.attr_name.eq_ignore_ascii_case(&attr.name))
            .count();

        if attr.required && count == 0 {
            let v = Violation::Missing(attr.name.clone());
            if !find_all {
                return err_at_violation(v, mode);
            }
            violations.push(v);
        }
        if !attr.repeatable && count > 1 {
            let v = Violation::DisallowedRepeat(attr.name.clone());
            if !find_all {
                return err_at_violation(v, mode);
            }
            violations.push(v);
        }
    }

    for field in &record.fields {
        if let Some(attr) = class.attribute(&field.attr_name) {
            if !attr.matches_format(&field.value) {
                let v = Violation::FormatMismatch(attr.name.clone(), field.value.clone());
                if !find_all {
                    return err_at_violation(v, mode);
                }
                violations.push(v);
            }
        }
    }

    Ok(violations)
}

fn err_at_violation(v: Violation, mode: ValidationMode) -> Result<Vec<Violation>> {
    if !mode.contains(ValidationMode::QUIET) {
        log::warn!("validation failed: {:?}", v);
    }
    Err(v.into_error())
}

#[cfg(test)]
#[path = "validate_test.rs"]
mod validate_test;
