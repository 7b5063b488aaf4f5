//! Line predicates that identify the record a locator is looking for.
//!
//! A marker is any `FnMut(&str) -> bool` over one line of input; these are
//! the common shapes.

use crate::scan;

/// Matches lines containing `needle` anywhere.
///
/// This is the loosest marker and the most prone to matching an unrelated
/// field that happens to contain the same text.
pub fn contains(needle: impl Into<String>) -> impl FnMut(&str) -> bool {
    let needle = needle.into();
    move |line: &str| line.contains(needle.as_str())
}

/// Matches `key="value"` as a whole field: `key` must not be the tail of a
/// longer identifier (`old_country_name="FRA"` does not match).
pub fn quoted_field(key: &str, value: &str) -> impl FnMut(&str) -> bool + use<> {
    let needle = format!("{}=\"{}\"", key, value);
    move |line: &str| scan::find_at_boundary(line, &needle).is_some()
}

/// Matches `key=value` with a bare value that ends at a delimiter, so
/// `flag=FRA` does not match `flag=FRANCE`.
pub fn bare_field(key: &str, value: &str) -> impl FnMut(&str) -> bool + use<> {
    let needle = format!("{}={}", key, value);
    move |line: &str| {
        let bytes = line.as_bytes();
        line.match_indices(needle.as_str()).any(|(at, _)| {
            let before = at.checked_sub(1).map(|i| bytes[i]);
            let after = bytes.get(at + needle.len()).copied();
            before.is_none_or(|b| !b.is_ascii_alphanumeric() && b != b'_')
                && after.is_none_or(scan::is_delimiter)
        })
    }
}

/// Matches when either marker does.
pub fn any_of(
    mut first: impl FnMut(&str) -> bool,
    mut second: impl FnMut(&str) -> bool,
) -> impl FnMut(&str) -> bool {
    move |line: &str| first(line) || second(line)
}
