//! compacter: command-line tool for compression planning and library search.
//!
//! Computes encoder targets for a source video, ranks search suggestions
//! over a list of display names, and summarizes a queue manifest.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use compacter_core::{
    compute_compression_target, estimate_output_size, CompressionPreset, CompressionTarget,
    QueueItem, QueueStats, SourceMediaInfo,
};
use compacter_search::{build_tag_index, extract_tags, SuggestionEngine};

#[derive(Parser)]
#[command(name = "compacter")]
#[command(author, version, about = "Video compression planning for compacter")]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute the encoder target for a source video
    Plan {
        /// Source file size in bytes
        #[arg(long)]
        size: u64,

        /// Source duration in milliseconds
        #[arg(long)]
        duration_ms: u64,

        /// Frame width (default 1920 when unknown)
        #[arg(long, default_value_t = 0)]
        width: u32,

        /// Frame height (default 1080 when unknown)
        #[arg(long, default_value_t = 0)]
        height: u32,

        /// Source bitrate in bits per second, if known
        #[arg(long, default_value_t = 0)]
        bitrate: u32,

        /// Target output size as a percentage of the source (10-100)
        #[arg(long)]
        percent: Option<u8>,

        /// Preset used when no percentage is given
        #[arg(long, default_value = "BALANCED")]
        preset: String,

        /// Encode with HEVC instead of AVC
        #[arg(long)]
        hevc: bool,
    },

    /// Rank search suggestions over a list of display names
    Suggest {
        /// File with one display name per line
        #[arg(short, long)]
        names: PathBuf,

        /// Query text
        query: String,

        /// Maximum number of suggestions
        #[arg(short, long, default_value_t = compacter_core::defaults::SUGGESTION_MAX_RESULTS)]
        max: usize,

        /// Number of names to index
        #[arg(long, default_value_t = compacter_core::defaults::TAG_INDEX_CAP)]
        cap: usize,
    },

    /// Show the search tags extracted from a display name
    Tags {
        /// Display name
        name: String,
    },

    /// Summarize a queue manifest (JSON list of queue items)
    Estimate {
        /// Path to the manifest
        #[arg(short, long)]
        manifest: PathBuf,
    },
}

#[derive(Debug, Serialize)]
struct PlanReport {
    preset: &'static str,
    target: CompressionTarget,
    video_mime_type: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    estimated_size_bytes: Option<u64>,
}

#[derive(Debug, Serialize)]
struct EstimateReport {
    items: usize,
    #[serde(flatten)]
    stats: QueueStats,
    total: String,
    estimated: String,
}

fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// Logging goes to stderr so stdout stays machine-readable.
///
/// Environment variables:
///   LOG_FORMAT - "json" or "text" (default: "text")
///   RUST_LOG   - standard env filter (default: "compacter=info")
fn init_tracing() {
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "compacter=info".into());

    let registry = tracing_subscriber::registry().with(env_filter);
    if log_format == "json" {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Plan {
            size,
            duration_ms,
            width,
            height,
            bitrate,
            percent,
            preset,
            hevc,
        } => {
            let source = SourceMediaInfo::new(size, duration_ms)
                .with_dimensions(width, height)
                .with_bitrate(bitrate);
            let report = cmd_plan(&source, percent, &preset, hevc);
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::Suggest {
            names,
            query,
            max,
            cap,
        } => {
            for suggestion in cmd_suggest(&names, &query, max, cap)? {
                println!("{}", suggestion);
            }
        }
        Commands::Tags { name } => {
            for tag in extract_tags(&name) {
                println!("{}", tag);
            }
        }
        Commands::Estimate { manifest } => {
            let report = cmd_estimate(&manifest)?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(())
}

fn cmd_plan(
    source: &SourceMediaInfo,
    percent: Option<u8>,
    preset_name: &str,
    hevc: bool,
) -> PlanReport {
    let preset = CompressionPreset::from_name(preset_name);
    let target = compute_compression_target(percent, source, &preset.as_fallback()).with_hevc(hevc);

    PlanReport {
        preset: preset.name(),
        target,
        video_mime_type: target.video_mime_type(),
        estimated_size_bytes: percent.map(|p| estimate_output_size(source.original_size_bytes, p)),
    }
}

fn cmd_suggest(names_path: &Path, query: &str, max: usize, cap: usize) -> Result<Vec<String>> {
    let contents = std::fs::read_to_string(names_path)
        .with_context(|| format!("Failed to read names from {}", names_path.display()))?;
    let names = contents.lines().map(str::trim).filter(|l| !l.is_empty());

    let index = build_tag_index(names, cap);
    debug!(tag_count = index.len(), "Index ready");

    Ok(SuggestionEngine::default().suggest(query, &index, max))
}

fn cmd_estimate(manifest_path: &Path) -> Result<EstimateReport> {
    let contents = std::fs::read_to_string(manifest_path)
        .with_context(|| format!("Failed to read manifest {}", manifest_path.display()))?;
    let items: Vec<QueueItem> =
        serde_json::from_str(&contents).context("Manifest is not a list of queue items")?;

    let stats = QueueStats::from_items(&items);
    Ok(EstimateReport {
        items: items.len(),
        stats,
        total: stats.total_formatted(),
        estimated: stats.estimated_formatted(),
    })
}
