//! Writes a [`Value`] tree back out as script text.
//!
//! Output uses tab indentation and one pair per line, with sequences of
//! scalars kept inline (`{ 1 2 3 }`). Strings are always quoted and written
//! raw, matching the parser, which keeps escapes as they are. Floats always
//! carry a `.` so they read back as floats.
//!
//! Some values do not survive a round trip: an empty sequence reads back as
//! an empty mapping, non-finite floats read back as strings, and a key built
//! by hand that needs quoting and also holds an unescaped `"` reads back
//! differently. Keys produced by the parser always round trip.

use std::io;

use crate::scan;
use crate::value::{Mapping, Value};

/// Renders the contents of a mapping, one top-level pair per line.
///
/// ```
/// let map = eu5txt::parse("gold=12.5 tags={ FRA BRI }").unwrap();
/// assert_eq!(eu5txt::to_script_string(&map), "gold=12.5\ntags={ \"FRA\" \"BRI\" }\n");
/// ```
pub fn to_script_string(map: &Mapping) -> String {
    let mut out = String::new();
    write_pairs(&mut out, map, 0);
    out
}

pub fn write_mapping<W: io::Write>(writer: &mut W, map: &Mapping) -> io::Result<()> {
    writer.write_all(to_script_string(map).as_bytes())
}

fn write_pairs(out: &mut String, map: &Mapping, depth: usize) {
    for (key, value) in map {
        indent(out, depth);
        write_key(out, key);
        out.push('=');
        write_value(out, value, depth);
        out.push('\n');
    }
}

/// Writes `value` starting on the current line. A multi-line block closes
/// on its own line at `depth`.
fn write_value(out: &mut String, value: &Value, depth: usize) {
    match value {
        Value::Mapping(map) if map.is_empty() => out.push_str("{ }"),
        Value::Mapping(map) => {
            out.push_str("{\n");
            write_pairs(out, map, depth + 1);
            indent(out, depth);
            out.push('}');
        }
        Value::Sequence(items) if items.iter().all(Value::is_scalar) => {
            out.push('{');
            for item in items {
                out.push(' ');
                write_scalar(out, item);
            }
            out.push_str(" }");
        }
        Value::Sequence(items) => {
            out.push_str("{\n");
            for item in items {
                indent(out, depth + 1);
                write_value(out, item, depth + 1);
                out.push('\n');
            }
            indent(out, depth);
            out.push('}');
        }
        scalar => write_scalar(out, scalar),
    }
}

fn write_scalar(out: &mut String, value: &Value) {
    match value {
        Value::String(s) => {
            out.push('"');
            out.push_str(s);
            out.push('"');
        }
        Value::Integer(i) => out.push_str(&i.to_string()),
        Value::Float(f) => {
            let text = f.to_string();
            out.push_str(&text);
            if f.is_finite() && !text.contains('.') {
                out.push_str(".0");
            }
        }
        Value::Boolean(b) => out.push_str(if *b { "yes" } else { "no" }),
        Value::Mapping(_) | Value::Sequence(_) => {
            log::trace!("Block passed as scalar, writing nested");
            write_value(out, value, 0);
        }
    }
}

/// Keys stay bare unless the tokenizer would split them or read them as a
/// quoted string. A `"` inside a bare token is ordinary text.
fn write_key(out: &mut String, key: &str) {
    let bare =
        !key.is_empty() && !key.starts_with('"') && !key.bytes().any(scan::is_delimiter);
    if bare {
        out.push_str(key);
    } else {
        out.push('"');
        out.push_str(key);
        out.push('"');
    }
}

fn indent(out: &mut String, depth: usize) {
    for _ in 0..depth {
        out.push('\t');
    }
}
