//! scantde - nightly transient triage
//!
//! Runs one selection variant over one night of candidates and reports
//! processing logs from the per-night caches.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use scantde_common::config::{DataDirResolver, TomlConfig};
use scantde_common::time::nights_between;
use scantde_triage::services::{JsonAttributionSink, JsonModelStore, WindowSelector};
use scantde_triage::{
    CachePaths, Candidate, CandidateTable, JsonLinesRejectionSink, ProcessingLog, RunOutcome,
    SelectionVariant, StaticFeatureSource, TriageParameters, TriagePipeline,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Command-line arguments for scantde
#[derive(Parser, Debug)]
#[command(name = "scantde")]
#[command(about = "Staged triage of nightly transient candidates")]
#[command(version)]
struct Cli {
    /// Data directory (results and caches)
    #[arg(long, global = true, env = "SCANTDE_DATA_DIR")]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Triage one night of candidates
    Run {
        /// Night to process (YYYYMMDD)
        #[arg(long)]
        night: String,

        /// Selection variant identifier
        #[arg(long, default_value = "tdescore")]
        selection: SelectionVariant,

        /// JSON array of raw detections
        #[arg(long)]
        candidates: PathBuf,

        /// JSON object of crossmatch and lightcurve features keyed by name
        #[arg(long)]
        features: PathBuf,

        /// File listing known positives, one name per line
        #[arg(long)]
        known_positives: Option<PathBuf>,

        /// Directory of classifier artifacts
        #[arg(long, env = "SCANTDE_MODELS_DIR")]
        models: Option<PathBuf>,
    },

    /// Print the processing log of one night
    Log {
        #[arg(long)]
        night: String,

        #[arg(long, default_value = "tdescore")]
        selection: SelectionVariant,
    },

    /// Print the merged processing log of several nights
    MergeLogs {
        #[arg(long, default_value = "tdescore")]
        selection: SelectionVariant,

        /// Explicit nights (YYYYMMDD)
        #[arg(long, num_args = 1.., required_unless_present = "from")]
        nights: Vec<String>,

        /// First night of an inclusive range
        #[arg(long, requires = "to", conflicts_with = "nights")]
        from: Option<String>,

        /// Last night of an inclusive range
        #[arg(long, requires = "from")]
        to: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = TomlConfig::load_or_default();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .init();

    let data_dir = DataDirResolver::new(&config).resolve(cli.data_dir.as_deref());
    let cache = CachePaths::new(&data_dir);
    info!(data_dir = %data_dir.display(), "Using data directory");

    match cli.command {
        Command::Run {
            night,
            selection,
            candidates,
            features,
            known_positives,
            models,
        } => {
            let models_dir = models
                .or_else(|| config.models_dir.clone())
                .unwrap_or_else(|| data_dir.join("models"));
            let params = TriageParameters::from_toml_table(config.parameters.as_ref())?;
            let selector = match &config.thermal_windows {
                Some(thresholds) => WindowSelector::new(thresholds.clone())?,
                None => WindowSelector::default(),
            };

            let table = load_candidates(&candidates, known_positives.as_deref())?;
            let features = StaticFeatureSource::from_json_file(&features)
                .with_context(|| format!("Failed to load features from {}", features.display()))?;

            let pipeline = TriagePipeline::new(
                selection,
                Box::new(JsonModelStore::new(&models_dir)),
                Box::new(features),
            )
            .with_parameters(params)
            .with_windows(selector)
            .with_rejection_sink(Box::new(JsonLinesRejectionSink::new(
                cache.rejections_path(&night, selection),
            )))
            .with_attribution_sink(Box::new(JsonAttributionSink::new(
                cache.attribution_dir(&night, selection),
            )))
            .with_cache(cache.clone());

            let summary = pipeline
                .run(&night, table)
                .with_context(|| format!("Triage of {} ({}) failed", night, selection))?;

            print_log(&summary.log);
            match &summary.outcome {
                RunOutcome::Completed => println!(
                    "\n{} candidates passed, {} young: {}",
                    summary.candidates.len(),
                    summary.young.len(),
                    summary.young.join(", ")
                ),
                RunOutcome::TerminatedEarly { stage } => {
                    println!("\nNo candidates left before '{}'", stage)
                }
            }
            for candidate in summary.candidates.iter() {
                println!(
                    "{:<16} {:>7.4} {:<14} junk={} dwarf={}",
                    candidate.name,
                    candidate.winning_score().unwrap_or(f64::NAN),
                    candidate.winning_classifier().unwrap_or("-"),
                    candidate.flags.is_junk,
                    candidate.flags.is_dwarf
                );
            }
        }
        Command::Log { night, selection } => {
            let log = cache.load_log(&night, selection)?;
            print_log(&log);
        }
        Command::MergeLogs {
            selection,
            nights,
            from,
            to,
        } => {
            let nights = match (from, to) {
                (Some(from), Some(to)) => nights_between(&from, &to)?,
                _ => nights,
            };
            let log = cache.merged_log(&nights, selection)?;
            print_log(&log);
        }
    }

    Ok(())
}

/// Read raw detections and mark known positives
fn load_candidates(path: &Path, known_positives: Option<&Path>) -> Result<CandidateTable> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read candidates from {}", path.display()))?;
    let mut rows: Vec<Candidate> = serde_json::from_str(&content)
        .with_context(|| format!("Invalid candidate JSON in {}", path.display()))?;

    if let Some(kp_path) = known_positives {
        let names: HashSet<String> = std::fs::read_to_string(kp_path)
            .with_context(|| format!("Failed to read known positives from {}", kp_path.display()))?
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty() && !l.starts_with('#'))
            .map(str::to_string)
            .collect();
        for row in rows.iter_mut() {
            row.is_known_positive |= names.contains(&row.name);
        }
    }

    info!(path = %path.display(), sources = rows.len(), "Loaded candidates");
    Ok(CandidateTable::from_ingested(rows))
}

fn print_log(log: &ProcessingLog) {
    println!("{:<45} {:>8}  known positives", "stage", "sources");
    for record in log.records() {
        println!(
            "{:<45} {:>8}  {}",
            record.stage(),
            record.n_sources(),
            record.known_positives().join(", ")
        );
    }
}
