//! Byte-level scanning primitives shared by the parser, the extraction
//! helpers and the line locator.
//!
//! Every function here takes a byte slice and a cursor and returns a new
//! cursor that is either further along or equal to `bytes.len()`, so callers
//! can never spin in place. Running off the end of the input is reported as
//! `None` / the input length rather than as an error.

/// Bytes that end a bare token.
pub fn is_delimiter(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\r' | b'=' | b'{' | b'}' | b'#')
}

fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// Skips spaces, tabs, newlines and `#` line comments.
pub fn skip_whitespace_and_comments(bytes: &[u8], mut pos: usize) -> usize {
    while pos < bytes.len() {
        match bytes[pos] {
            b' ' | b'\t' | b'\n' | b'\r' => pos += 1,
            b'#' => pos = skip_comment(bytes, pos),
            _ => break,
        }
    }
    pos
}

/// `pos` is on a `#`; returns the position of the terminating newline (or
/// the input length).
fn skip_comment(bytes: &[u8], pos: usize) -> usize {
    bytes[pos..]
        .iter()
        .position(|&b| b == b'\n')
        .map_or(bytes.len(), |off| pos + off)
}

/// A quoted string scanned from the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quoted {
    /// Start of the contents (just past the opening quote).
    pub start: usize,
    /// End of the contents (the closing quote, or the input length).
    pub end: usize,
    /// Position just past the closing quote.
    pub next: usize,
    /// Whether the closing quote was missing.
    pub unterminated: bool,
}

/// Scans a quoted string. `pos` must be on the opening `"`.
///
/// A backslash skips the byte after it; nothing is unescaped.
pub fn scan_quoted(bytes: &[u8], pos: usize) -> Quoted {
    let start = pos + 1;
    let mut i = start;
    while i < bytes.len() {
        match bytes[i] {
            b'"' => {
                return Quoted {
                    start,
                    end: i,
                    next: i + 1,
                    unterminated: false,
                };
            }
            b'\\' => i += 2,
            _ => i += 1,
        }
    }
    Quoted {
        start,
        end: bytes.len(),
        next: bytes.len(),
        unterminated: true,
    }
}

/// Returns the end of the bare token starting at `pos`.
pub fn scan_token(bytes: &[u8], pos: usize) -> usize {
    bytes[pos..]
        .iter()
        .position(|&b| is_delimiter(b))
        .map_or(bytes.len(), |off| pos + off)
}

/// Finds the `}` closing a block whose contents start at `pos` (just past
/// the opening `{`). Braces inside quoted strings and comments are ignored.
///
/// Returns `None` when the input ends first.
pub fn scan_balanced_block(bytes: &[u8], mut pos: usize) -> Option<usize> {
    let mut depth = 0usize;
    while pos < bytes.len() {
        match bytes[pos] {
            b'{' => depth += 1,
            b'}' => {
                if depth == 0 {
                    return Some(pos);
                }
                depth -= 1;
            }
            b'"' => {
                pos = scan_quoted(bytes, pos).next;
                continue;
            }
            b'#' => {
                pos = skip_comment(bytes, pos);
                continue;
            }
            _ => {}
        }
        pos += 1;
    }
    None
}

/// What a `{ ... }` block holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    Mapping,
    Sequence,
}

/// Decides whether the block whose contents start at `pos` is a mapping.
///
/// Only an `=` at the block's own depth counts; `=` inside nested blocks,
/// quoted strings or comments does not.
pub fn classify_block(bytes: &[u8], mut pos: usize) -> BlockKind {
    let mut depth = 0usize;
    while pos < bytes.len() {
        match bytes[pos] {
            b'{' => depth += 1,
            b'}' => {
                if depth == 0 {
                    return BlockKind::Sequence;
                }
                depth -= 1;
            }
            b'=' if depth == 0 => return BlockKind::Mapping,
            b'"' => {
                pos = scan_quoted(bytes, pos).next;
                continue;
            }
            b'#' => {
                pos = skip_comment(bytes, pos);
                continue;
            }
            _ => {}
        }
        pos += 1;
    }
    BlockKind::Sequence
}

/// Finds the first `key={` where `key` is not the tail of a longer
/// identifier, returning the position of the `{`.
pub fn find_keyed_block(text: &str, key: &str) -> Option<usize> {
    let needle = format!("{}={{", key);
    find_at_boundary(text, &needle).map(|at| at + needle.len() - 1)
}

/// Finds `needle` where the byte before it is not an identifier byte.
pub fn find_at_boundary(text: &str, needle: &str) -> Option<usize> {
    if needle.is_empty() {
        return None;
    }
    let bytes = text.as_bytes();
    let mut from = 0;
    while let Some(off) = text[from..].find(needle) {
        let at = from + off;
        if at == 0 || !is_ident_byte(bytes[at - 1]) {
            return Some(at);
        }
        from = at + 1;
        while !text.is_char_boundary(from) {
            from += 1;
        }
    }
    None
}

/// Number of leading tab characters.
pub fn indent_of(line: &str) -> usize {
    line.bytes().take_while(|&b| b == b'\t').count()
}

/// Whether the trimmed line looks like a numbered record header, `123={`.
pub fn is_record_header(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.as_bytes().first().is_some_and(u8::is_ascii_digit) && trimmed.contains("={")
}

/// Counts the braces on one line for the streaming locator.
///
/// Braces inside quoted strings and after `#` are not counted. Strings
/// never span lines, so an unterminated quote only affects its own line.
pub fn count_braces(line: &str) -> LineBraces {
    let bytes = line.as_bytes();
    let mut counts = LineBraces::default();
    let mut in_quote = false;
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        if in_quote {
            match b {
                b'\\' => i += 1,
                b'"' => in_quote = false,
                _ => {}
            }
        } else {
            match b {
                b'"' => in_quote = true,
                b'{' => {
                    counts.net += 1;
                    counts.opens = true;
                }
                b'}' => counts.net -= 1,
                b'#' => break,
                _ => {}
            }
        }
        i += 1;
    }
    counts
}

/// What [`count_braces`] saw on one line.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LineBraces {
    /// `{` minus `}`.
    pub net: i64,
    /// Whether the line has any counted `{`.
    pub opens: bool,
}
