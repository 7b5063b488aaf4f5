//! Player list file.
//!
//! One country tag per line. Blank lines and `#` comments are ignored, and
//! a line may give a display name as `TAG=Name`:
//!
//! ```text
//! # session 4
//! FRA=Alice
//! CAS
//! ```

use anyhow::{Context, Result};
use serde::Serialize;
use std::collections::HashSet;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Player {
    pub tag: String,
    pub name: Option<String>,
}

impl Player {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            name: None,
        }
    }
}

pub fn load_players(path: &Path) -> Result<Vec<Player>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read players file {}", path.display()))?;
    let players = parse_players(&text);
    log::debug!("Loaded {} players from {}", players.len(), path.display());
    Ok(players)
}

pub fn parse_players(text: &str) -> Vec<Player> {
    let mut seen = HashSet::new();
    let mut players = Vec::new();

    for line in text.lines() {
        let line = line.split('#').next().unwrap_or_default().trim();
        if line.is_empty() {
            continue;
        }

        let (tag, name) = match line.split_once('=') {
            Some((tag, name)) => {
                let name = name.trim().trim_matches('"').trim();
                (tag.trim(), (!name.is_empty()).then(|| name.to_string()))
            }
            None => (line, None),
        };
        if tag.is_empty() {
            log::warn!("Skipping player line without a tag: '{}'", line);
            continue;
        }
        if !seen.insert(tag.to_string()) {
            log::warn!("Duplicate player tag {}, keeping the first", tag);
            continue;
        }

        players.push(Player {
            tag: tag.to_string(),
            name,
        });
    }

    players
}
