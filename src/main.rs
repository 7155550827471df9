//! Replay Enrich - Entry Point
//!
//! Reads a decoded replay document, enriches every player's commands and
//! writes the result as JSON or as a plain-text build order.

use clap::{Parser, ValueEnum};
use std::fmt::Write as _;
use std::path::PathBuf;

use replay_enrich::core::error::Result;
use replay_enrich::core::format_timestamp;
use replay_enrich::core::EnrichConfig;
use replay_enrich::enrich::{EnrichmentPipeline, ReplayData};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Json,
    Text,
}

/// Attach unit and building names to a decoded replay
#[derive(Parser, Debug)]
#[command(name = "replay-enrich")]
#[command(about = "Enrich decoded replay commands with unit and building names")]
struct Args {
    /// Decoded replay JSON
    input: PathBuf,

    /// Reference data directory (sbps.json, ebps.json, locales/)
    #[arg(long, default_value = "data")]
    data_dir: PathBuf,

    /// TOML config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Filter preset to include (repeatable): build, combat, economic, all, ...
    /// or a custom preset defined in the config file
    #[arg(long = "preset")]
    presets: Vec<String>,

    /// Command kind to include (repeatable)
    #[arg(long = "kind")]
    kinds: Vec<String>,

    /// Command category to include (repeatable)
    #[arg(long = "category")]
    categories: Vec<String>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    format: OutputFormat,

    /// Write output here instead of stdout
    #[arg(long, short = 'o')]
    output: Option<PathBuf>,

    /// Disable production-based building inference
    #[arg(long)]
    no_tracking: bool,
}

fn main() -> Result<()> {
    // Logs go to stderr so JSON on stdout stays clean
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("replay_enrich=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => EnrichConfig::load(path)?,
        None => EnrichConfig::new(),
    };
    config.filter.presets.extend(args.presets.iter().cloned());
    config.filter.kinds.extend(args.kinds.iter().cloned());
    config.filter.categories.extend(args.categories.iter().cloned());
    if args.no_tracking {
        config.entity_tracking = false;
    }

    let pipeline = EnrichmentPipeline::load(&args.data_dir, config)?;
    let mut replay = ReplayData::load(&args.input)?;
    let report = pipeline.enrich_replay(&mut replay);
    tracing::info!(
        "Enriched {} players: {} units, {} buildings resolved, {} inferred, {} fallback names, {} misses",
        replay.players.len(),
        report.units_resolved,
        report.buildings_resolved,
        report.buildings_inferred,
        report.fallback_names,
        report.misses
    );

    let rendered = match args.format {
        OutputFormat::Json => serde_json::to_string_pretty(&replay)?,
        OutputFormat::Text => render_build_orders(&replay),
    };

    match &args.output {
        Some(path) => std::fs::write(path, rendered)?,
        None => println!("{}", rendered),
    }
    Ok(())
}

fn render_build_orders(replay: &ReplayData) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} ({})", replay.map_name, replay.duration());
    for player in &replay.players {
        let _ = writeln!(
            out,
            "\n{} - {}",
            player.player_name,
            player.faction_or_unknown()
        );
        for cmd in &player.build_commands {
            let _ = writeln!(
                out,
                "[{}] {} {}",
                format_timestamp(cmd.timestamp),
                cmd.kind,
                cmd.display_name().unwrap_or("-")
            );
        }
    }
    out
}
