//! Benchmark CLI
//!
//! Loads a corpus directory, runs the selected strategies over it and prints
//! the aggregated summary as text or JSON.

use super::config::CliConfigBuilder;
use crate::{
    config::{DEFAULT_ITERATIONS, DEFAULT_QUALITY_THRESHOLD},
    corpus::{CorpusLoader, DirectoryCorpusLoader},
    orchestrator::{BenchmarkOrchestrator, RunOutcome, RunReport},
    services::{BenchmarkRunState, BenchmarkSummary},
    strategy::StrategyRegistry,
    tracing_config::{init_cli_tracing, TracingFormat},
    types::BenchmarkResult,
};
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::path::PathBuf;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Background removal benchmark harness
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(name = "imgly-bgbench")]
#[allow(clippy::struct_excessive_bools)]
pub struct Cli {
    /// Directory with img{NN} test images and optional mask{NN} ground truth
    #[arg(value_name = "CORPUS_DIR", required_unless_present = "list_strategies")]
    pub corpus: Option<PathBuf>,

    /// Strategy as kind[:parameter], repeatable (e.g. border-color:32)
    #[arg(short, long = "strategy", value_name = "STRATEGY", default_value = "border-color")]
    pub strategies: Vec<String>,

    /// Timed repetitions per strategy and image
    #[arg(short, long, default_value_t = DEFAULT_ITERATIONS)]
    pub iterations: usize,

    /// Mask intensity above which a pixel counts as foreground (0.0-1.0)
    #[arg(long, default_value_t = DEFAULT_QUALITY_THRESHOLD)]
    pub threshold: f32,

    /// Per-call timeout in seconds (0 disables the timeout)
    #[arg(long, default_value_t = 120)]
    pub timeout_secs: u64,

    /// Filter used to fit predicted masks to ground-truth size
    #[arg(long, value_enum, default_value_t = CliMaskFilter::Bilinear)]
    pub mask_filter: CliMaskFilter,

    /// Do not call cleanup on strategies whose initialization failed
    #[arg(long)]
    pub no_cleanup_on_failed_init: bool,

    /// Report format written to stdout
    #[arg(short, long, value_enum, default_value_t = ReportFormat::Text)]
    pub format: ReportFormat,

    /// Log output format (logs go to stderr)
    #[arg(long, value_enum, default_value_t = LogFormat::Console)]
    pub log_format: LogFormat,

    /// Enable verbose logging (-v: DEBUG, -vv: TRACE)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Hide the progress bar
    #[arg(long)]
    pub no_progress: bool,

    /// List available strategy kinds and exit
    #[arg(long)]
    pub list_strategies: bool,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
pub enum ReportFormat {
    Text,
    Json,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
pub enum CliMaskFilter {
    Nearest,
    Bilinear,
    Lanczos3,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
pub enum LogFormat {
    Console,
    Compact,
    #[cfg(feature = "tracing-json")]
    Json,
}

impl From<LogFormat> for TracingFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Console => Self::Console,
            LogFormat::Compact => Self::Compact,
            #[cfg(feature = "tracing-json")]
            LogFormat::Json => Self::Json,
        }
    }
}

/// Machine-readable form of a finished run
#[derive(Debug, Serialize)]
struct JsonReport<'a> {
    outcome: &'static str,
    status: &'a str,
    completed_runs: usize,
    total_runs: usize,
    elapsed_seconds: f64,
    failed_strategies: &'a [String],
    summary: BenchmarkSummary,
    results: &'a [BenchmarkResult],
}

impl<'a> From<&'a RunReport> for JsonReport<'a> {
    fn from(report: &'a RunReport) -> Self {
        Self {
            outcome: outcome_label(report.outcome),
            status: &report.status,
            completed_runs: report.completed_runs,
            total_runs: report.total_runs,
            elapsed_seconds: report.elapsed.as_secs_f64(),
            failed_strategies: &report.failed_strategies,
            summary: report.summary(),
            results: &report.results,
        }
    }
}

fn outcome_label(outcome: RunOutcome) -> &'static str {
    match outcome {
        RunOutcome::Completed => "completed",
        RunOutcome::Cancelled => "cancelled",
        RunOutcome::EmptyCorpus => "empty_corpus",
    }
}

pub async fn main() -> Result<()> {
    let cli = Cli::parse();

    let session_id = init_cli_tracing(cli.verbose, cli.log_format.into())
        .context("Failed to initialize tracing")?;
    debug!(session_id = %session_id, "Tracing initialized");

    let registry = StrategyRegistry::with_builtin();
    if cli.list_strategies {
        for kind in registry.kinds() {
            println!("{}", kind);
        }
        return Ok(());
    }

    let corpus_dir = cli
        .corpus
        .as_ref()
        .context("A corpus directory is required")?;
    let config = CliConfigBuilder::from_cli(&cli).context("Invalid CLI arguments")?;
    let mut strategies = CliConfigBuilder::strategies(&cli, &registry)
        .context("Failed to create strategies")?;

    let corpus = DirectoryCorpusLoader::new(corpus_dir)
        .load()
        .with_context(|| format!("Failed to load corpus from {}", corpus_dir.display()))?;
    info!(
        images = corpus.len(),
        with_ground_truth = corpus.iter().filter(|t| t.has_ground_truth()).count(),
        corpus = %corpus_dir.display(),
        "Corpus loaded"
    );

    let mut orchestrator =
        BenchmarkOrchestrator::new(config).context("Invalid benchmark configuration")?;

    let cancel = CancellationToken::new();
    let interrupt = spawn_interrupt_handler(cancel.clone());
    let progress = (!cli.no_progress).then(|| spawn_progress_bar(orchestrator.subscribe()));

    let report = orchestrator
        .run_with_cancellation(&mut strategies, &corpus, &cancel)
        .await;

    interrupt.abort();
    // Dropping the orchestrator closes the state channel and ends the bar task
    drop(orchestrator);
    if let Some(progress) = progress {
        if let Err(e) = progress.await {
            debug!(error = %e, "Progress task ended abnormally");
        }
    }

    if report.outcome == RunOutcome::EmptyCorpus {
        anyhow::bail!(
            "{} in {}",
            report.status.trim_start_matches("Error: "),
            corpus_dir.display()
        );
    }
    if report.outcome == RunOutcome::Cancelled {
        warn!("{}", report.status);
    }

    match cli.format {
        ReportFormat::Text => {
            println!("{}", report.summary());
            println!("{}", report.status);
        },
        ReportFormat::Json => {
            let json = serde_json::to_string_pretty(&JsonReport::from(&report))
                .context("Failed to serialize report")?;
            println!("{}", json);
        },
    }

    info!(
        "Processed {} of {} runs in {:.2}s",
        report.completed_runs,
        report.total_runs,
        report.elapsed.as_secs_f64()
    );

    Ok(())
}

/// Cancel the run on Ctrl-C; the current repetition is allowed to finish
fn spawn_interrupt_handler(cancel: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, stopping after the current repetition");
            cancel.cancel();
        }
    })
}

/// Drive a progress bar from run state snapshots until the channel closes
fn spawn_progress_bar(mut state: watch::Receiver<BenchmarkRunState>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let pb = ProgressBar::new(0);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        {
            pb.set_style(style.progress_chars("#>-"));
        }

        while state.changed().await.is_ok() {
            let snapshot = state.borrow_and_update().clone();
            pb.set_length(snapshot.total_runs as u64);
            pb.set_position(snapshot.completed_runs as u64);
            pb.set_message(snapshot.current_status);
        }

        pb.finish_and_clear();
    })
}
