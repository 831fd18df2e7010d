//! Crate-wide error type and the `err_at!` macro used at every fallible
//! boundary (file I/O, parsing, schema lookups, authorization).
//!
//! `err_at!` stamps the call-site (`file!():line!()`) onto the error so
//! that a bug report carries enough context to find the failing
//! expression, without every call site hand-writing a `.map_err(...)`.

use std::{fmt, io, result};

/// Crate-wide result alias.
pub type Result<T> = result::Result<T, Error>;

/// One variant per error category named in the specification's error
/// handling design. Each variant carries `(prefix, message)` where
/// `prefix` is the `file!():line!()` of the `err_at!` call site.
#[derive(Debug)]
pub enum Error {
    // schema
    UnknownAuthArea(String, String),
    UnknownClass(String, String),
    UnknownAttribute(String, String),
    InvalidFormat(String, String),
    // parse
    InvalidRecord(String, String),
    EmptyRecord(String, String),
    UnexpectedEof(String, String),
    TooManyRecords(String, String),
    // validation
    MissingAttribute(String, String),
    DisallowedRepeat(String, String),
    FormatMismatch(String, String),
    DuplicateKey(String, String),
    // authorization
    Unauthenticated(String, String),
    SchemeUnsupported(String, String),
    CredentialMismatch(String, String),
    // concurrency
    OutdatedObject(String, String),
    LockBusy(String, String),
    // storage
    IOError(String, String),
    SortFail(String, String),
    IndexMissing(String, String),
    // query policy
    QueryTooComplex(String, String),
    // limits
    HitLimitExceeded(String, String),
    // catch-all for invariant violations that should never happen
    Fatal(String, String),
    InvalidFile(String, String),
    FailConvert(String, String),
}

impl Error {
    /// Short machine-readable kind code, as surfaced on the wire protocol
    /// (`§6`/`§7`); the line-oriented protocol layer maps these onto its
    /// own response codes, this crate only needs a stable name.
    pub fn kind(&self) -> &'static str {
        use Error::*;
        match self {
            UnknownAuthArea(..) => "UNKNOWN_AUTH_AREA",
            UnknownClass(..) => "UNKNOWN_CLASS",
            UnknownAttribute(..) => "UNKNOWN_ATTRIBUTE",
            InvalidFormat(..) => "INVALID_FORMAT",
            InvalidRecord(..) => "INVALID_RECORD",
            EmptyRecord(..) => "EMPTY_RECORD",
            UnexpectedEof(..) => "UNEXPECTED_EOF",
            TooManyRecords(..) => "TOO_MANY_RECORDS",
            MissingAttribute(..) => "MISSING_ATTRIBUTE",
            DisallowedRepeat(..) => "DISALLOWED_REPEAT",
            FormatMismatch(..) => "FORMAT_MISMATCH",
            DuplicateKey(..) => "NON_UNIQUE_KEY",
            Unauthenticated(..) => "UNAUTH_REGIST",
            SchemeUnsupported(..) => "UNAUTH_REGIST",
            CredentialMismatch(..) => "UNAUTH_REGIST",
            OutdatedObject(..) => "OUTDATED_OBJ",
            LockBusy(..) => "LOCK_BUSY",
            IOError(..) => "UNKNOWN_ERROR",
            SortFail(..) => "UNKNOWN_ERROR",
            IndexMissing(..) => "UNKNOWN_ERROR",
            QueryTooComplex(..) => "QUERY_TOO_COMPLEX",
            HitLimitExceeded(..) => "HIT_LIMIT_EXCEEDED",
            Fatal(..) => "UNKNOWN_ERROR",
            InvalidFile(..) => "UNKNOWN_ERROR",
            FailConvert(..) => "UNKNOWN_ERROR",
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use Error::*;
        match self {
            UnknownAuthArea(p, m)
            | UnknownClass(p, m)
            | UnknownAttribute(p, m)
            | InvalidFormat(p, m)
            | InvalidRecord(p, m)
            | EmptyRecord(p, m)
            | UnexpectedEof(p, m)
            | TooManyRecords(p, m)
            | MissingAttribute(p, m)
            | DisallowedRepeat(p, m)
            | FormatMismatch(p, m)
            | DuplicateKey(p, m)
            | Unauthenticated(p, m)
            | SchemeUnsupported(p, m)
            | CredentialMismatch(p, m)
            | OutdatedObject(p, m)
            | LockBusy(p, m)
            | IOError(p, m)
            | SortFail(p, m)
            | IndexMissing(p, m)
            | QueryTooComplex(p, m)
            | HitLimitExceeded(p, m)
            | Fatal(p, m)
            | InvalidFile(p, m)
            | FailConvert(p, m) => write!(f, "{} {}: {}", p, self.kind(), m),
        }
    }
}

impl std::error::Error for Error {}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Error {
        Error::IOError("<conv>".to_string(), err.to_string())
    }
}

/// Construct and (optionally) propagate an [Error], stamping the call
/// site as its prefix.
///
/// Two forms:
/// * `err_at!(Variant, expr)` — `expr` is a `Result<T, E>` (`E: Display`);
///   on `Err`, wraps it into `Error::Variant(prefix, message)`.
/// * `err_at!(Variant, msg: "fmt", args...)` — builds the error directly
///   from a format string and returns it as `Err(..)`.
#[macro_export]
macro_rules! err_at {
    ($v:ident, msg: $($arg:expr),+) => {{
        let prefix = format!("{}:{}", file!(), line!());
        Err($crate::Error::$v(prefix, format!($($arg),+)))
    }};
    ($v:ident, $e:expr) => {{
        match $e {
            Ok(val) => Ok(val),
            Err(err) => {
                let prefix = format!("{}:{}", file!(), line!());
                Err($crate::Error::$v(prefix, err.to_string()))
            }
        }
    }};
}

#[cfg(test)]
#[path = "error_test.rs"]
mod error_test;
