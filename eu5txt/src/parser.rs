//! Recursive-descent parser from script text to a [`Value`] tree.
//!
//! The parser works directly on the bytes of the input. All delimiters are
//! ASCII, so every slice it takes lands on a char boundary.

use indexmap::IndexMap;

use crate::error::ParseError;
use crate::scan::{self, BlockKind};
use crate::value::{Mapping, Value};

/// Deepest block nesting the parser recurses into.
pub const MAX_DEPTH: usize = 512;

/// Parses the whole text as the contents of a mapping.
///
/// ```
/// let map = eu5txt::parse("gold=12.5 flag=yes").unwrap();
/// assert_eq!(map["gold"], eu5txt::Value::Float(12.5));
/// ```
pub fn parse(text: &str) -> Result<Mapping, ParseError> {
    Parser::new(text).parse()
}

/// Parses the first value in `text`, e.g. a lone `{ ... }` block.
///
/// Returns `None` for empty input.
pub fn parse_value(text: &str) -> Result<Option<Value>, ParseError> {
    Parser::new(text).parse_value()
}

/// Parses the value starting at byte `offset` of `text`.
pub fn parse_value_at(text: &str, offset: usize) -> Result<Option<Value>, ParseError> {
    Parser::at(text, offset).parse_value()
}

/// Finds the first `key={` in `text` and parses that block.
pub fn parse_block(text: &str, key: &str) -> Result<Option<Value>, ParseError> {
    match scan::find_keyed_block(text, key) {
        Some(open) => Parser::at(text, open).parse_block().map(Some),
        None => Ok(None),
    }
}

/// Types a bare token: `yes`/`no`, then numbers, then plain string.
///
/// Tokens containing a `.` are only ever floats, so dates such as
/// `1444.11.11` stay strings.
pub fn scalar_from_token(token: &str) -> Value {
    match token {
        "yes" => Value::Boolean(true),
        "no" => Value::Boolean(false),
        _ if token.contains('.') => token
            .parse::<f64>()
            .map(Value::Float)
            .unwrap_or_else(|_| Value::String(token.to_string())),
        _ => token
            .parse::<i64>()
            .map(Value::Integer)
            .unwrap_or_else(|_| Value::String(token.to_string())),
    }
}

/// Single-use cursor over one piece of script text.
pub struct Parser<'a> {
    text: &'a str,
    bytes: &'a [u8],
    pos: usize,
    depth: usize,
    max_depth: usize,
}

impl<'a> Parser<'a> {
    pub fn new(text: &'a str) -> Self {
        Self::at(text, 0)
    }

    /// Starts parsing at byte `pos`, which must be a char boundary.
    pub fn at(text: &'a str, pos: usize) -> Self {
        Parser {
            text,
            bytes: text.as_bytes(),
            pos: pos.min(text.len()),
            depth: 0,
            max_depth: MAX_DEPTH,
        }
    }

    pub fn with_max_depth(mut self, limit: usize) -> Self {
        self.max_depth = limit;
        self
    }

    /// Parses everything from the cursor to the end as mapping contents.
    ///
    /// A `}` with no matching `{` at this level is skipped, so a slice that
    /// starts with the tail of a previous block still parses.
    pub fn parse(mut self) -> Result<Mapping, ParseError> {
        self.parse_dict_contents(true)
    }

    fn skip_whitespace(&mut self) {
        self.pos = scan::skip_whitespace_and_comments(self.bytes, self.pos);
    }

    fn peek(&mut self) -> Option<u8> {
        self.skip_whitespace();
        self.bytes.get(self.pos).copied()
    }

    /// Parses one value. `None` means there is no value here: end of input
    /// or a closing `}`, which is left for the caller.
    pub fn parse_value(&mut self) -> Result<Option<Value>, ParseError> {
        loop {
            match self.peek() {
                None | Some(b'}') => return Ok(None),
                Some(b'"') => return Ok(Some(Value::String(self.parse_string()))),
                Some(b'{') => return self.parse_block().map(Some),
                Some(b'=') => {
                    log::trace!("Skipping stray '=' at byte {}", self.pos);
                    self.pos += 1;
                }
                Some(_) => {
                    let token = self.parse_token();
                    return Ok(Some(scalar_from_token(token)));
                }
            }
        }
    }

    fn parse_string(&mut self) -> String {
        let quoted = scan::scan_quoted(self.bytes, self.pos);
        if quoted.unterminated {
            log::debug!(
                "Unterminated string at byte {}, reading to end of input",
                self.pos
            );
        }
        self.pos = quoted.next;
        self.text[quoted.start..quoted.end].to_string()
    }

    fn parse_token(&mut self) -> &'a str {
        let start = self.pos;
        self.pos = scan::scan_token(self.bytes, start);
        &self.text[start..self.pos]
    }

    /// Parses a `{ ... }` block; the cursor must be on the `{`.
    ///
    /// `{}` is an empty mapping. Otherwise the block is a mapping when an
    /// `=` appears at its own depth, and a sequence when not.
    pub fn parse_block(&mut self) -> Result<Value, ParseError> {
        let open = self.pos;
        if self.depth >= self.max_depth {
            return Err(ParseError::DepthLimitExceeded {
                limit: self.max_depth,
                position: open,
            });
        }
        self.pos += 1;

        match self.peek() {
            None => return Ok(Value::Mapping(Mapping::new())),
            Some(b'}') => {
                self.pos += 1;
                return Ok(Value::Mapping(Mapping::new()));
            }
            Some(_) => {}
        }

        self.depth += 1;
        let value = match scan::classify_block(self.bytes, self.pos) {
            BlockKind::Mapping => self.parse_dict_contents(false).map(Value::Mapping),
            BlockKind::Sequence => self.parse_list_contents().map(Value::Sequence),
        };
        self.depth -= 1;
        value
    }

    fn parse_dict_contents(&mut self, top_level: bool) -> Result<Mapping, ParseError> {
        // Every occurrence of each key, in first-seen key order.
        let mut entries: IndexMap<String, Vec<Value>> = IndexMap::new();

        while let Some(b) = self.peek() {
            let key = match b {
                b'}' => {
                    self.pos += 1;
                    if top_level {
                        log::trace!("Skipping unmatched '}}' at byte {}", self.pos - 1);
                        continue;
                    }
                    break;
                }
                b'{' => {
                    // Anonymous block where a key belongs, e.g. `color=rgb { 1 2 3 }`.
                    let at = self.pos;
                    let dropped = self.parse_block()?;
                    log::trace!("Discarding {} block at byte {}", dropped.kind(), at);
                    continue;
                }
                b'=' => {
                    log::trace!("Skipping '=' without a key at byte {}", self.pos);
                    self.pos += 1;
                    continue;
                }
                b'"' => self.parse_string(),
                _ => self.parse_token().to_string(),
            };

            if self.peek() != Some(b'=') {
                log::trace!("Discarding stray token '{}' before byte {}", key, self.pos);
                continue;
            }
            self.pos += 1;

            let value = match self.parse_value()? {
                Some(value) => value,
                None if self.pos < self.bytes.len() => {
                    log::trace!("Empty value for '{}' before '}}' at byte {}", key, self.pos);
                    Value::String(String::new())
                }
                None => {
                    log::debug!("Dropping '{}=' cut off by end of input", key);
                    break;
                }
            };

            entries.entry(key).or_default().push(value);
        }

        Ok(entries
            .into_iter()
            .map(|(k, mut values)| {
                let value = if values.len() == 1 {
                    values.swap_remove(0)
                } else {
                    Value::Sequence(values)
                };
                (k, value)
            })
            .collect())
    }

    fn parse_list_contents(&mut self) -> Result<Vec<Value>, ParseError> {
        let mut items = Vec::new();
        while let Some(value) = self.parse_value()? {
            items.push(value);
        }
        // Stopped on `}` or at end of input.
        if self.pos < self.bytes.len() {
            self.pos += 1;
        }
        Ok(items)
    }
}
