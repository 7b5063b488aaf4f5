use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::io::Write;
use std::path::{Path, PathBuf};

use eu5scan::roster::{self, RosterOptions};
use eu5scan::{parse_scope, players, report, Reference};
use eu5txt::locate::DEFAULT_LOOKBACK;
use eu5txt::source::encoding_by_label;
use eu5txt::{marker, LocatedBlock, Locator, SourceOptions};

#[derive(Parser)]
#[command(name = "eu5scan")]
#[command(version)]
#[command(about = "Locate, parse and list records from melted EU5 save files")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the melted (plain text) save file
    #[arg(short, long, global = true, env = "EU5_SAVE")]
    save: Option<PathBuf>,

    /// Lines kept above a marker when looking for the start of its record
    #[arg(long, global = true, env = "EU5SCAN_LOOKBACK", default_value_t = DEFAULT_LOOKBACK)]
    lookback: usize,

    /// Text encoding of the save (e.g. utf-8, windows-1252)
    #[arg(long, global = true, env = "EU5SCAN_ENCODING", default_value = "utf-8")]
    encoding: String,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Args)]
struct BlockOutput {
    /// Print the parsed record re-rendered instead of the raw text
    #[arg(long)]
    parsed: bool,

    /// Print the parsed record as JSON
    #[arg(long, conflicts_with = "parsed")]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Print a section by its declaration, e.g. `metadata`
    Section {
        /// Key the section is declared with
        name: String,

        #[command(flatten)]
        output: BlockOutput,
    },

    /// Print the record containing the first line with the marker text
    Record {
        /// Text identifying the record, e.g. 'country_name="FRA"'
        #[arg(short, long)]
        marker: String,

        /// Only search inside this scope (e.g. countries/database)
        #[arg(long, default_value = "")]
        within: String,

        /// Count every matching line and warn when there is more than one
        #[arg(long)]
        count: bool,

        #[command(flatten)]
        output: BlockOutput,
    },

    /// Print the record declared as `<id>={`
    Id {
        id: u64,

        /// Scope the record lives in
        #[arg(long, default_value = "character_db/database")]
        within: String,

        #[command(flatten)]
        output: BlockOutput,
    },

    /// Print the in-game date of the save
    Date,

    /// Look up every player country and list the results
    Roster {
        /// Player list: one tag per line, optionally TAG=Name
        #[arg(short, long, env = "EU5_PLAYERS")]
        players: PathBuf,

        /// Scope country records live in
        #[arg(long, default_value = "countries/database")]
        within: String,

        /// Also locate the record referenced by a field, e.g.
        /// government.ruler@character_db/database
        #[arg(long)]
        follow: Option<Reference>,

        /// Stop at the first match instead of checking for duplicates
        #[arg(long)]
        first_match: bool,

        /// Output report as JSON
        #[arg(long)]
        json: bool,

        /// Write report to file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    let encoding = encoding_by_label(&cli.encoding)
        .with_context(|| format!("Unknown encoding '{}'", cli.encoding))?;
    let source = SourceOptions::with_encoding(encoding);
    let save = cli
        .save
        .context("No save file given (use --save or set EU5_SAVE)")?;

    match cli.command {
        Commands::Section { name, output } => {
            let reader = roster::open_save(&save, &source)?;
            let prefix = format!("{}=", name);
            let found = Locator::new()
                .lookback(cli.lookback)
                .find_section_by_declaration(reader, &prefix)?;
            emit_block(found, &format!("section '{}'", name), &output)?;
        }

        Commands::Record {
            marker: text,
            within,
            count,
            output,
        } => {
            let reader = roster::open_save(&save, &source)?;
            let found = Locator::new()
                .within(parse_scope(&within))
                .lookback(cli.lookback)
                .count_matches(count)
                .find_record_by_marker(reader, marker::contains(text.as_str()))?;
            emit_block(found, &format!("record with '{}'", text), &output)?;
        }

        Commands::Id { id, within, output } => {
            let options = RosterOptions {
                source,
                ..RosterOptions::default()
            };
            let found = roster::find_by_id(&save, &id.to_string(), &parse_scope(&within), &options)?;
            emit_block(found, &format!("record {}", id), &output)?;
        }

        Commands::Date => match roster::save_date(&save, &source)? {
            Some(date) => println!("{}", date),
            None => {
                log::error!("No date found in {}", save.display());
                std::process::exit(1);
            }
        },

        Commands::Roster {
            players: players_path,
            within,
            follow,
            first_match,
            json,
            output,
        } => {
            let players = players::load_players(&players_path)?;
            if players.is_empty() {
                log::warn!("No players listed in {}", players_path.display());
            }
            let options = RosterOptions {
                scope: parse_scope(&within),
                lookback: cli.lookback,
                source,
                detect_ambiguity: !first_match,
                follow,
            };

            log::info!("Loading save file: {}", save.display());
            let summary = roster::run_roster(&save, &players, &options)?;

            if json {
                let json_output = report::json_report(&summary)?;
                if let Some(path) = output {
                    std::fs::write(&path, &json_output)?;
                    log::info!("Report written to: {}", path.display());
                } else {
                    println!("{}", json_output);
                }
            } else {
                let mut writer = open_output(output.as_deref())?;
                report::print_roster(&summary, &mut writer)?;
            }
        }
    }

    Ok(())
}

fn emit_block(found: Option<LocatedBlock>, what: &str, output: &BlockOutput) -> Result<()> {
    let Some(block) = found else {
        log::error!("No {} found", what);
        std::process::exit(1);
    };
    if block.truncated {
        log::warn!("The save ends inside the {}; output is partial", what);
    }
    if output.json {
        println!("{}", report::block_json(&block)?);
    } else {
        let mut stdout = std::io::stdout().lock();
        report::print_block(&block, output.parsed, &mut stdout)?;
        stdout.flush()?;
    }
    Ok(())
}

fn open_output(path: Option<&Path>) -> Result<Box<dyn Write>> {
    Ok(match path {
        Some(path) => Box::new(
            std::fs::File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?,
        ),
        None => Box::new(std::io::stdout()),
    })
}
