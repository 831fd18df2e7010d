//! Xfer: argument grammar for a bulk zone transfer plus the streaming
//! record dump it drives (§6 "Xfer argument grammar").
//!
//! `<aa-name> { class=<C> { attr=<A> }* }* [<17-digit-serial>]`. The
//! line-oriented session wrapping this (reading the directive, writing
//! `RESP_XFER` lines) stays in the protocol layer; this module owns
//! the grammar and the storage-side scan.

use std::collections::HashMap;
use std::io::{BufReader, Write};

use crate::codec::ParseOutcome;
use crate::files::{FileKind, FileRegistry};
use crate::schema::{AuthorityArea, Registry};
use crate::{err_at, util, Result};

/// One `class=` section of the argument list, with the `attr=` names
/// scoped to it; an empty `attrs` means "every attribute" (§6).
pub struct XferClassFilter {
    pub class_name: String,
    pub attrs: Vec<String>,
}

/// A fully validated xfer request.
pub struct XferArgs {
    pub area_name: String,
    pub classes: Vec<XferClassFilter>,
    /// Only records whose `Updated` sorts at or after this value are
    /// sent; `None` means a full dump.
    pub serial: Option<String>,
}

const WILDCARD_AREA: &str = "0.0.0.0/0";

/// Parse and validate an xfer directive's argument string against
/// `registry`'s configured areas/classes/attributes.
pub fn parse_args(registry: &Registry, arg_str: &str) -> Result<XferArgs> {
    let tokens: Vec<&str> = arg_str.split_whitespace().collect();
    let area_name = match tokens.first() {
        Some(t) => *t,
        None => return err_at!(InvalidFormat, msg: "xfer requires at least an authority area"),
    };
    if area_name == WILDCARD_AREA {
        return err_at!(InvalidFormat, msg: "xfer of the wildcard authority area is not allowed");
    }
    let area = match registry.area(area_name) {
        Some(a) => a,
        None => return err_at!(UnknownAuthArea, msg: "no such authority area: {}", area_name),
    };
    if !area.is_primary() {
        return err_at!(UnknownAuthArea, msg: "{} is not a master authority area", area_name);
    }

    let mut classes: Vec<XferClassFilter> = Vec::new();
    let mut serial: Option<String> = None;

    for token in &tokens[1..] {
        if let Some(name) = token.strip_prefix("class=") {
            if area.class(name).is_none() {
                return err_at!(UnknownClass, msg: "no such class: {}/{}", area_name, name);
            }
            classes.push(XferClassFilter { class_name: name.to_string(), attrs: Vec::new() });
        } else if let Some(name) = token.strip_prefix("attr=") {
            let current = match classes.last_mut() {
                Some(c) => c,
                None => {
                    return err_at!(InvalidFormat, msg: "attr={} given before any class=", name)
                }
            };
            let class = area.class(&current.class_name).expect("just validated above");
            if class.attribute(name).is_none() {
                return err_at!(UnknownAttribute, msg: "no such attribute: {}/{}", current.class_name, name);
            }
            current.attrs.push(name.to_string());
        } else if token.chars().all(|c| c.is_ascii_digit()) {
            if token.len() != 17 {
                return err_at!(InvalidFormat, msg: "serial must be exactly 17 digits, got {:?}", token);
            }
            if serial.is_some() {
                return err_at!(InvalidFormat, msg: "more than one serial number given");
            }
            serial = Some(token.to_string());
        } else {
            return err_at!(InvalidFormat, msg: "unrecognized xfer argument: {:?}", token);
        }
    }

    Ok(XferArgs { area_name: area_name.to_string(), classes, serial })
}

/// Stream every live record matching `args`, one `class:attr:value`
/// line per field followed by a blank line per record, mirroring the
/// `RESP_XFER` wire shape (§6); `out` need only implement `Write`.
///
/// `registries` must hold one loaded [FileRegistry] per class name (in
/// `area`) that is a transfer target.
pub fn stream<W: Write>(
    area: &AuthorityArea,
    registries: &HashMap<String, FileRegistry>,
    args: &XferArgs,
    out: &mut W,
) -> Result<u64> {
    let targets: Vec<(&str, &[String])> = if args.classes.is_empty() {
        area.classes.iter().map(|c| (c.name.as_str(), &[][..])).collect()
    } else {
        args.classes.iter().map(|f| (f.class_name.as_str(), f.attrs.as_slice())).collect()
    };

    let mut sent = 0u64;
    for (class_name, attrs) in targets {
        let class = match area.class(class_name) {
            Some(c) => c,
            None => return err_at!(UnknownClass, msg: "no such class: {}/{}", area.name, class_name),
        };
        let file_registry = match registries.get(class_name) {
            Some(r) => r,
            None => return err_at!(Fatal, msg: "no file registry supplied for class {}", class_name),
        };

        for descriptor in file_registry.descriptors() {
            if descriptor.kind != FileKind::Data {
                continue;
            }
            let path = file_registry.dir().join(&descriptor.filename);
            let file = util::open_file_r(&path)?;
            let mut reader = BufReader::new(file);
            loop {
                let anon = match crate::codec::AnonymousRecord::parse_next(&mut reader)? {
                    None => break,
                    Some(ParseOutcome::Deleted) => continue,
                    Some(ParseOutcome::Record(r)) => r,
                };
                let typed = anon.translate(class, &area.name, false)?;
                if let Some(serial) = &args.serial {
                    match typed.updated() {
                        Some(updated) if updated >= serial.as_str() => {}
                        _ => continue,
                    }
                }
                if display_record(&typed, attrs, out)? {
                    sent += 1;
                }
            }
        }
    }
    Ok(sent)
}

fn display_record<W: Write>(record: &crate::codec::TypedRecord, attrs: &[String], out: &mut W) -> Result<bool> {
    let mut found = false;
    for field in &record.fields {
        if !attrs.is_empty() && !attrs.iter().any(|a| a.eq_ignore_ascii_case(&field.attr_name)) {
            continue;
        }
        err_at!(IOError, writeln!(out, "{}:{}:{}", record.class_name, field.attr_name, field.value))?;
        found = true;
    }
    if found {
        err_at!(IOError, writeln!(out))?;
    }
    Ok(found)
}

#[cfg(test)]
#[path = "xfer_test.rs"]
mod xfer_test;
