//! Per-player country lookups against one save.
//!
//! Each lookup opens its own handle on the save and makes its own pass, so
//! lookups run in parallel on the rayon pool and one failure never affects
//! another.

use anyhow::{Context, Result};
use eu5txt::extract::{self, HEADER_LINES};
use eu5txt::locate::DEFAULT_LOOKBACK;
use eu5txt::source::DecodedReader;
use eu5txt::{LocatedBlock, Locator, Mapping, SourceOptions, Value, marker, open_source};
use rayon::prelude::*;
use regex::Regex;
use std::fs::File;
use std::path::Path;
use std::sync::LazyLock;

use crate::players::Player;
use crate::{LookupOutcome, LookupStatus, Reference, RosterSummary};

static SAVE_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"date=(\d+\.\d+\.\d+)").expect("valid regex"));

#[derive(Debug, Clone)]
pub struct RosterOptions {
    /// Where country records live.
    pub scope: Vec<String>,
    pub lookback: usize,
    pub source: SourceOptions,
    /// Keep scanning after the first match to report ambiguous tags.
    pub detect_ambiguity: bool,
    pub follow: Option<Reference>,
}

impl Default for RosterOptions {
    fn default() -> Self {
        Self {
            scope: vec!["countries".to_string(), "database".to_string()],
            lookback: DEFAULT_LOOKBACK,
            source: SourceOptions::default(),
            detect_ambiguity: true,
            follow: None,
        }
    }
}

/// Opens the save for one pass.
pub fn open_save(save: &Path, source: &SourceOptions) -> Result<DecodedReader<File>> {
    open_source(save, source).with_context(|| format!("Failed to open save {}", save.display()))
}

/// The in-game date from the first lines of the save.
pub fn save_date(save: &Path, source: &SourceOptions) -> Result<Option<String>> {
    let reader = open_save(save, source)?;
    let date = extract::find_in_header(reader, &SAVE_DATE, HEADER_LINES)
        .with_context(|| format!("Failed to read header of {}", save.display()))?;
    Ok(date)
}

/// Matches the line identifying a country: `country_name="TAG"` or `flag=TAG`.
pub fn country_marker(tag: &str) -> impl FnMut(&str) -> bool {
    marker::any_of(
        marker::quoted_field("country_name", tag),
        marker::bare_field("flag", tag),
    )
}

/// Looks up every player. Fails only when the save cannot be read at all.
pub fn run_roster(save: &Path, players: &[Player], options: &RosterOptions) -> Result<RosterSummary> {
    let date = save_date(save, &options.source)?;
    match &date {
        Some(date) => log::info!("Save date: {}", date),
        None => log::warn!("No date in the first {} lines of the save", HEADER_LINES),
    }

    let outcomes: Vec<LookupOutcome> = players
        .par_iter()
        .map(|player| lookup_player(save, player, options))
        .collect();

    Ok(RosterSummary::new(save.display().to_string(), date, outcomes))
}

pub fn lookup_player(save: &Path, player: &Player, options: &RosterOptions) -> LookupOutcome {
    let mut outcome = LookupOutcome::new(&player.tag, player.name.clone());

    let located = match locate_country(save, &player.tag, options) {
        Ok(Some(located)) => located,
        Ok(None) => {
            log::info!("{}: not found", player.tag);
            return outcome;
        }
        Err(e) => {
            log::warn!("{}: lookup failed: {:#}", player.tag, e);
            return LookupOutcome::failed(&player.tag, player.name.clone(), format!("{:#}", e));
        }
    };

    outcome.record_id = located.record_id().map(String::from);
    outcome.lines = Some((located.lines.start + 1, located.lines.end));
    outcome.marker_matches = located.marker_matches;

    let record = match located.parse_body() {
        Ok(record) => record.unwrap_or_else(|| Value::Mapping(Mapping::new())),
        Err(e) => {
            log::warn!("{}: record at line {} does not parse: {}", player.tag, located.lines.start + 1, e);
            outcome.status = LookupStatus::Failed;
            outcome.notes.push(format!("Parse error: {}", e));
            return outcome;
        }
    };

    outcome.status = if located.truncated {
        LookupStatus::Truncated
    } else if located.is_ambiguous() {
        LookupStatus::Ambiguous
    } else {
        LookupStatus::Ok
    };
    if outcome.status == LookupStatus::Ambiguous {
        outcome.notes.push(format!(
            "{} records carry the marker, showing the first",
            located.marker_matches.unwrap_or_default()
        ));
    }

    if let Some(reference) = &options.follow {
        follow_reference(save, &record, reference, options, &mut outcome);
    }
    outcome.record = Some(record);
    log::info!("{}: {}", player.tag, outcome.status);
    outcome
}

fn locate_country(save: &Path, tag: &str, options: &RosterOptions) -> Result<Option<LocatedBlock>> {
    let reader = open_save(save, &options.source)?;
    let located = Locator::new()
        .within(options.scope.iter().cloned())
        .lookback(options.lookback)
        .count_matches(options.detect_ambiguity)
        .find_record_by_marker(reader, country_marker(tag))
        .with_context(|| format!("Failed while scanning for {}", tag))?;
    Ok(located)
}

/// Locates a record by id with a fresh pass over the save.
pub fn find_by_id(
    save: &Path,
    id: &str,
    scope: &[String],
    options: &RosterOptions,
) -> Result<Option<LocatedBlock>> {
    let reader = open_save(save, &options.source)?;
    let located = Locator::new()
        .within(scope.iter().cloned())
        .find_record_by_id(reader, id)
        .with_context(|| format!("Failed while scanning for record {}", id))?;
    Ok(located)
}

fn follow_reference(
    save: &Path,
    record: &Value,
    reference: &Reference,
    options: &RosterOptions,
    outcome: &mut LookupOutcome,
) {
    let Some(id) = record
        .get_path(reference.field.as_slice())
        .and_then(reference_id)
    else {
        outcome
            .notes
            .push(format!("No record id at {}", reference.field.join(".")));
        return;
    };

    match find_by_id(save, &id, &reference.scope, options) {
        Ok(Some(located)) => match located.parse_body() {
            Ok(body) => outcome.referenced = body,
            Err(e) => outcome
                .notes
                .push(format!("Referenced record {} does not parse: {}", id, e)),
        },
        Ok(None) => outcome
            .notes
            .push(format!("Referenced record {} not found in {}", id, reference.scope.join("/"))),
        Err(e) => outcome.notes.push(format!("{:#}", e)),
    }
}

/// Record ids are bare integers, sometimes quoted.
fn reference_id(value: &Value) -> Option<String> {
    match value {
        Value::Integer(i) => Some(i.to_string()),
        Value::String(s) if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) => {
            Some(s.clone())
        }
        _ => None,
    }
}
