//! Error types for the script parser and the block locator.

use std::io;
use thiserror::Error;

/// Structurally unrecoverable states found while parsing script text.
///
/// Everything else (unterminated strings, missing closing braces, stray
/// tokens, keys with no value) is recovered by the parser itself.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    /// Blocks nested deeper than the parser is willing to recurse.
    #[error("Nesting deeper than {limit} levels at byte {position}")]
    DepthLimitExceeded {
        /// The configured maximum depth.
        limit: usize,
        /// Byte offset of the `{` that crossed the limit.
        position: usize,
    },
}

/// Errors surfaced by the streaming entry points.
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
