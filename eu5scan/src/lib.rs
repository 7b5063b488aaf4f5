pub mod players;
pub mod report;
pub mod roster;

use eu5txt::Value;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Splits a scope such as `countries/database` into its declarations.
/// An empty string means no scope.
pub fn parse_scope(path: &str) -> Vec<String> {
    path.split('/')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// A field of a located record that holds the id of another record, and
/// the scope that record lives in, e.g.
/// `government.ruler@character_db/database`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    pub field: Vec<String>,
    pub scope: Vec<String>,
}

impl FromStr for Reference {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (field, scope) = s
            .split_once('@')
            .ok_or_else(|| format!("Expected <field.path>@<scope/path>, got '{}'", s))?;
        let field: Vec<String> = field
            .split('.')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(String::from)
            .collect();
        if field.is_empty() {
            return Err(format!("Empty field path in '{}'", s));
        }
        Ok(Reference {
            field,
            scope: parse_scope(scope),
        })
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.field.join("."), self.scope.join("/"))
    }
}

/// How a single lookup went.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LookupStatus {
    /// Located and parsed.
    Ok,
    /// The save ended before the record closed; the record is partial.
    Truncated,
    /// More than one record carried the marker; the first one is reported.
    Ambiguous,
    NotFound,
    /// The save could not be read or the record could not be parsed.
    Failed,
}

impl LookupStatus {
    pub fn is_found(self) -> bool {
        matches!(
            self,
            LookupStatus::Ok | LookupStatus::Truncated | LookupStatus::Ambiguous
        )
    }
}

impl fmt::Display for LookupStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            LookupStatus::Ok => "OK",
            LookupStatus::Truncated => "TRUNCATED",
            LookupStatus::Ambiguous => "AMBIGUOUS",
            LookupStatus::NotFound => "NOT FOUND",
            LookupStatus::Failed => "FAILED",
        };
        f.write_str(label)
    }
}

/// Result of looking up one player's country.
#[derive(Debug, Clone, Serialize)]
pub struct LookupOutcome {
    pub tag: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub status: LookupStatus,
    pub record_id: Option<String>,
    /// First and last line of the record, 1-based.
    pub lines: Option<(usize, usize)>,
    pub marker_matches: Option<usize>,
    pub record: Option<Value>,
    /// The record found by following the configured reference.
    pub referenced: Option<Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,
}

impl LookupOutcome {
    pub fn new(tag: impl Into<String>, name: Option<String>) -> Self {
        Self {
            tag: tag.into(),
            name,
            status: LookupStatus::NotFound,
            record_id: None,
            lines: None,
            marker_matches: None,
            record: None,
            referenced: None,
            notes: Vec::new(),
        }
    }

    pub fn failed(tag: impl Into<String>, name: Option<String>, reason: impl Into<String>) -> Self {
        let mut outcome = Self::new(tag, name);
        outcome.status = LookupStatus::Failed;
        outcome.notes.push(reason.into());
        outcome
    }
}

/// All lookups of one roster run, in player order.
#[derive(Debug, Clone, Serialize)]
pub struct RosterSummary {
    pub save: String,
    pub date: Option<String>,
    pub total: usize,
    pub found: usize,
    pub not_found: usize,
    pub failed: usize,
    pub outcomes: Vec<LookupOutcome>,
}

impl RosterSummary {
    pub fn new(save: impl Into<String>, date: Option<String>, outcomes: Vec<LookupOutcome>) -> Self {
        let found = outcomes.iter().filter(|o| o.status.is_found()).count();
        let not_found = outcomes
            .iter()
            .filter(|o| o.status == LookupStatus::NotFound)
            .count();
        let failed = outcomes
            .iter()
            .filter(|o| o.status == LookupStatus::Failed)
            .count();

        Self {
            save: save.into(),
            date,
            total: outcomes.len(),
            found,
            not_found,
            failed,
            outcomes,
        }
    }
}
