//! JVM-style type descriptors.
//!
//! Descriptors live in the `source` namespace. Class references inside them
//! (`L<name>;`) are rewritten through a lookup whenever a descriptor has to be
//! shown in another namespace.

use crate::error::{TypesError, TypesResult};

/// Reserved name of class initialization blocks.
pub const STATIC_INITIALIZER: &str = "<clinit>";

/// Reserved name of instance constructors.
pub const CONSTRUCTOR: &str = "<init>";

pub fn is_constructor(name: &str) -> bool {
    name == CONSTRUCTOR
}

pub fn is_static_initializer(name: &str) -> bool {
    name == STATIC_INITIALIZER
}

fn malformed(descriptor: &str, reason: impl Into<String>) -> TypesError {
    TypesError::MalformedDescriptor {
        descriptor: descriptor.to_string(),
        reason: reason.into(),
    }
}

/// Parse one field type starting at `start`, returning the index just past it.
fn parse_field_type(desc: &str, start: usize) -> TypesResult<usize> {
    let bytes = desc.as_bytes();
    let mut pos = start;
    while bytes.get(pos) == Some(&b'[') {
        pos += 1;
    }

    match bytes.get(pos) {
        Some(b'B' | b'C' | b'D' | b'F' | b'I' | b'J' | b'S' | b'Z') => Ok(pos + 1),
        Some(b'L') => {
            let end = desc[pos..]
                .find(';')
                .map(|offset| pos + offset)
                .ok_or_else(|| malformed(desc, "unterminated class reference"))?;
            let class = &desc[pos + 1..end];
            validate_class_name(class).map_err(|_| malformed(desc, "invalid class reference"))?;
            Ok(end + 1)
        }
        Some(other) => Err(malformed(
            desc,
            format!("unexpected character '{}' at {}", *other as char, pos),
        )),
        None => Err(malformed(desc, "unexpected end")),
    }
}

/// Check that `name` is a usable internal class name (`pkg/Name$Inner`).
pub fn validate_class_name(name: &str) -> TypesResult<()> {
    let reason = if name.is_empty() {
        Some("empty name")
    } else if name.contains(['.', ';', '[', '(', ')', '<', '>']) {
        Some("illegal character")
    } else if name.starts_with('/') || name.ends_with('/') || name.contains("//") {
        Some("empty package segment")
    } else {
        None
    };

    match reason {
        Some(reason) => Err(TypesError::MalformedClassName {
            name: name.to_string(),
            reason: reason.to_string(),
        }),
        None => Ok(()),
    }
}

pub fn validate_field_descriptor(desc: &str) -> TypesResult<()> {
    let end = parse_field_type(desc, 0)?;
    if end != desc.len() {
        return Err(malformed(desc, "trailing characters"));
    }
    Ok(())
}

pub fn validate_method_descriptor(desc: &str) -> TypesResult<()> {
    let bytes = desc.as_bytes();
    if bytes.first() != Some(&b'(') {
        return Err(malformed(desc, "missing parameter list"));
    }

    let mut pos = 1;
    loop {
        match bytes.get(pos) {
            Some(b')') => break,
            Some(_) => pos = parse_field_type(desc, pos)?,
            None => return Err(malformed(desc, "unterminated parameter list")),
        }
    }

    pos += 1;
    let end = if bytes.get(pos) == Some(&b'V') {
        pos + 1
    } else {
        parse_field_type(desc, pos)?
    };
    if end != desc.len() {
        return Err(malformed(desc, "trailing characters"));
    }
    Ok(())
}

/// Rewrite every class reference in `desc` through `lookup`.
///
/// References the lookup does not know are kept verbatim.
pub fn remap_descriptor<'a, F>(desc: &str, lookup: F) -> String
where
    F: Fn(&str) -> Option<&'a str>,
{
    let mut out = String::with_capacity(desc.len());
    let mut rest = desc;
    while let Some(start) = rest.find('L') {
        out.push_str(&rest[..=start]);
        let tail = &rest[start + 1..];
        match tail.find(';') {
            Some(end) => {
                let class = &tail[..end];
                out.push_str(lookup(class).unwrap_or(class));
                out.push(';');
                rest = &tail[end + 1..];
            }
            None => {
                rest = tail;
                break;
            }
        }
    }
    out.push_str(rest);
    out
}

/// Class names referenced by `desc`, in order of appearance.
pub fn class_references(desc: &str) -> Vec<&str> {
    let mut refs = Vec::new();
    let mut rest = desc;
    while let Some(start) = rest.find('L') {
        let tail = &rest[start + 1..];
        match tail.find(';') {
            Some(end) => {
                refs.push(&tail[..end]);
                rest = &tail[end + 1..];
            }
            None => break,
        }
    }
    refs
}
