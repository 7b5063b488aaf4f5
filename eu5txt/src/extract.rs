//! Field extraction without building a full tree.
//!
//! These helpers work on the raw text of one located record and pull out the
//! handful of fields a report needs. None of them fail: a missing field, a
//! pattern that does not match or a value that does not convert all come
//! back as `None`, an empty string or an empty collection.

use std::io::{self, BufRead};
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;

use crate::parser::{self, scalar_from_token};
use crate::scan;
use crate::value::{Mapping, Value};

/// How many lines [`find_in_header`] looks at by default.
pub const HEADER_LINES: usize = 100;

/// `key=value` where the value is quoted or a bare token.
static FLAT_PAIR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(\w+)=("[^"]*"|[^\s{}"]+)"#).expect("valid regex"));

/// First capture group of `pattern`, converted to `T`.
///
/// ```
/// use eu5txt::extract::extract_value;
/// let gold: Option<f64> = extract_value("gold=12.5", r"gold=([\d.-]+)");
/// assert_eq!(gold, Some(12.5));
/// ```
pub fn extract_value<T: FromStr>(text: &str, pattern: &str) -> Option<T> {
    let re = match Regex::new(pattern) {
        Ok(re) => re,
        Err(e) => {
            log::warn!("Invalid extraction pattern {:?}: {}", pattern, e);
            return None;
        }
    };
    re.captures(text)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Like [`extract_value`], substituting `default` when the field is absent
/// or does not convert.
pub fn extract_scalar<T: FromStr>(text: &str, pattern: &str, default: T) -> T {
    extract_value(text, pattern).unwrap_or(default)
}

/// First capture group of every match of `pattern`, in order.
pub fn extract_all(text: &str, pattern: &str) -> Vec<String> {
    let Ok(re) = Regex::new(pattern) else {
        log::warn!("Invalid extraction pattern {:?}", pattern);
        return Vec::new();
    };
    re.captures_iter(text)
        .filter_map(|c| c.get(1).map(|m| m.as_str().to_string()))
        .collect()
}

/// The value of the first `key=` (not part of a longer key), parsed with
/// the tree parser, so it may be a scalar or a whole block.
pub fn extract_field(text: &str, key: &str) -> Option<Value> {
    let needle = format!("{}=", key);
    let at = scan::find_at_boundary(text, &needle)?;
    parser::parse_value_at(text, at + needle.len()).ok().flatten()
}

/// The text between the braces of the first `key={`.
///
/// Braces inside quoted strings do not count. A block that never closes
/// runs to the end of `text`. Returns `""` when the key is absent, which
/// callers treat the same as an empty block.
pub fn extract_block<'a>(text: &'a str, key: &str) -> &'a str {
    let Some(open) = scan::find_keyed_block(text, key) else {
        return "";
    };
    let start = open + 1;
    match scan::scan_balanced_block(text.as_bytes(), start) {
        Some(close) => &text[start..close],
        None => {
            log::debug!("Block '{}' is not closed, taking rest of text", key);
            &text[start..]
        }
    }
}

/// Single-level `k=v` pairs of the block at `key`.
///
/// Values are typed like the parser types them; quoted values stay strings.
/// Pairs inside nested blocks are picked up too, and a repeated key keeps
/// its last value, so use this only on blocks known to be flat.
pub fn extract_flat_dict(text: &str, key: &str) -> Mapping {
    let block = extract_block(text, key);
    let mut result = Mapping::new();
    for cap in FLAT_PAIR.captures_iter(block) {
        let raw = &cap[2];
        let value = match raw.strip_prefix('"') {
            Some(quoted) => Value::String(quoted.trim_end_matches('"').to_string()),
            None => scalar_from_token(raw),
        };
        result.insert(cap[1].to_string(), value);
    }
    result
}

/// Whitespace separated tokens of the block at `key`.
pub fn extract_list<'a>(text: &'a str, key: &str) -> Vec<&'a str> {
    extract_block(text, key).split_whitespace().collect()
}

/// Numeric tokens of the block at `key`, e.g. `historical_population`.
pub fn extract_number_list(text: &str, key: &str) -> Vec<f64> {
    extract_list(text, key)
        .into_iter()
        .filter(|t| {
            t.bytes().any(|b| b.is_ascii_digit())
                && t.bytes().all(|b| b.is_ascii_digit() || b == b'.' || b == b'-')
        })
        .filter_map(|t| t.parse().ok())
        .collect()
}

/// Every `field=<value>` inside the block at `key`, in order.
pub fn extract_nested_field_values(text: &str, key: &str, field: &str) -> Vec<String> {
    let block = extract_block(text, key);
    if block.is_empty() {
        return Vec::new();
    }
    let pattern = format!(r#"\b{}=("[^"]*"|[^\s{{}}"]+)"#, regex::escape(field));
    extract_all(block, &pattern)
        .into_iter()
        .map(|v| v.trim_matches('"').to_string())
        .collect()
}

/// The `object=` of every entry in the block at `key`, e.g. the
/// privileges in `implemented_privileges={ { object=a } { object=b } }`.
pub fn extract_nested_object_list(text: &str, key: &str) -> Vec<String> {
    extract_nested_field_values(text, key, "object")
}

/// Number of `{ ... }` entries directly inside the block at `key`.
pub fn count_nested_blocks(text: &str, key: &str) -> usize {
    let bytes = extract_block(text, key).as_bytes();
    let mut count = 0;
    let mut depth = 0usize;
    let mut pos = 0;
    while pos < bytes.len() {
        match bytes[pos] {
            b'{' => {
                if depth == 0 {
                    count += 1;
                }
                depth += 1;
            }
            b'}' => depth = depth.saturating_sub(1),
            b'"' => {
                pos = scan::scan_quoted(bytes, pos).next;
                continue;
            }
            _ => {}
        }
        pos += 1;
    }
    count
}

/// First capture of `pattern` within the first `max_lines` lines of a
/// source, e.g. the save date near the top of a multi-megabyte file.
pub fn find_in_header<R: BufRead>(
    mut source: R,
    pattern: &Regex,
    max_lines: usize,
) -> io::Result<Option<String>> {
    let mut line = String::new();
    for _ in 0..max_lines {
        line.clear();
        if source.read_line(&mut line)? == 0 {
            break;
        }
        if let Some(m) = pattern.captures(&line).and_then(|c| c.get(1)) {
            return Ok(Some(m.as_str().to_string()));
        }
    }
    Ok(None)
}

#[cfg(test)]
#[path = "extract_tests.rs"]
mod tests;
