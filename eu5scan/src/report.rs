use crate::{LookupStatus, RosterSummary};
use eu5txt::{LocatedBlock, Mapping, Value, to_script_string};
use serde::Serialize;
use std::io::Write;

/// Generate a human-readable listing of a roster run
pub fn print_roster(summary: &RosterSummary, writer: &mut impl Write) -> std::io::Result<()> {
    writeln!(writer, "\n=== Roster: {} ===", summary.save)?;
    writeln!(writer, "Date: {}", summary.date.as_deref().unwrap_or("unknown"))?;
    writeln!(writer)?;

    writeln!(
        writer,
        "Total: {} | Found: {} | Not found: {} | Failed: {}",
        summary.total, summary.found, summary.not_found, summary.failed
    )?;
    writeln!(writer)?;

    for outcome in &summary.outcomes {
        write!(writer, "[{}] {}", outcome.status, outcome.tag)?;
        if let Some(name) = &outcome.name {
            write!(writer, " ({})", name)?;
        }
        if let Some(id) = &outcome.record_id {
            write!(writer, ": record {}", id)?;
        }
        if let Some((first, last)) = outcome.lines {
            write!(writer, ", lines {}-{}", first, last)?;
        }
        writeln!(writer)?;

        if outcome.status.is_found() {
            if let Some(Value::Mapping(map)) = &outcome.referenced {
                let fields: Vec<String> = map
                    .iter()
                    .filter(|(_, v)| v.is_scalar())
                    .take(4)
                    .map(|(k, v)| format!("{}={}", k, scalar_text(v)))
                    .collect();
                writeln!(writer, "       -> {}", fields.join(" "))?;
            }
        }
        for note in &outcome.notes {
            writeln!(writer, "       {}", note)?;
        }
    }

    if summary.outcomes.iter().any(|o| o.status == LookupStatus::Truncated) {
        writeln!(writer)?;
        writeln!(writer, "Truncated records are partial; the save may be cut off.")?;
    }

    Ok(())
}

/// Generate a JSON report
pub fn json_report(summary: &RosterSummary) -> serde_json::Result<String> {
    serde_json::to_string_pretty(summary)
}

/// Writes a located block, either as it appears in the save or re-rendered
/// from its parse tree.
pub fn print_block(block: &LocatedBlock, parsed: bool, writer: &mut impl Write) -> anyhow::Result<()> {
    if parsed {
        let map = block.parse()?;
        write!(writer, "{}", to_script_string(&map))?;
    } else {
        write!(writer, "{}", block.text)?;
    }
    Ok(())
}

#[derive(Serialize)]
struct BlockReport<'a> {
    record_id: Option<&'a str>,
    first_line: usize,
    last_line: usize,
    truncated: bool,
    marker_matches: Option<usize>,
    record: Value,
}

/// JSON for a single located block with its parsed body.
pub fn block_json(block: &LocatedBlock) -> anyhow::Result<String> {
    let record = block
        .parse_body()?
        .unwrap_or_else(|| Value::Mapping(Mapping::new()));
    let report = BlockReport {
        record_id: block.record_id(),
        first_line: block.lines.start + 1,
        last_line: block.lines.end,
        truncated: block.truncated,
        marker_matches: block.marker_matches,
        record,
    };
    Ok(serde_json::to_string_pretty(&report)?)
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Integer(i) => i.to_string(),
        Value::Float(f) => f.to_string(),
        Value::Boolean(b) => String::from(if *b { "yes" } else { "no" }),
        Value::Mapping(_) | Value::Sequence(_) => value.kind().to_string(),
    }
}
