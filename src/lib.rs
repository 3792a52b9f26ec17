#![allow(clippy::too_many_lines)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::unused_async)]

//! # IMG.LY Background Removal Benchmark Harness
//!
//! Runs interchangeable background removal strategies over a corpus of test
//! images and compares them on inference latency, memory growth and, where a
//! ground-truth mask exists, segmentation quality (IoU, pixel accuracy, F1).
//!
//! ## Features
//!
//! - **Pluggable Strategies**: any backend implementing [`BackgroundRemovalStrategy`]
//! - **Median Timing**: each (strategy, image) pair is repeated and the median-by-latency run is kept
//! - **Quality Scoring**: binary confusion-matrix metrics against ground-truth masks
//! - **Observable Runs**: progress and status snapshots over a `tokio::sync::watch` channel
//! - **Fault Isolation**: failing strategies or images are recorded and skipped, never fatal
//! - **CLI Integration**: optional command-line harness (enable with `cli` feature)
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use imgly_bgbench::{
//!     BackgroundRemovalStrategy, BenchmarkConfig, BenchmarkOrchestrator, BorderColorStrategy,
//!     CorpusLoader, DirectoryCorpusLoader,
//! };
//!
//! # async fn example() -> imgly_bgbench::Result<()> {
//! let corpus = DirectoryCorpusLoader::new("test_images").load()?;
//! let mut strategies: Vec<Box<dyn BackgroundRemovalStrategy>> =
//!     vec![Box::new(BorderColorStrategy::new())];
//!
//! let mut orchestrator = BenchmarkOrchestrator::new(BenchmarkConfig::default())?;
//! let report = orchestrator.run(&mut strategies, &corpus).await;
//! println!("{}", report.summary());
//! # Ok(())
//! # }
//! ```
//!
//! ## Observing a Run
//!
//! ```rust,no_run
//! use imgly_bgbench::{BenchmarkConfig, BenchmarkOrchestrator};
//!
//! # fn example() -> imgly_bgbench::Result<()> {
//! let orchestrator = BenchmarkOrchestrator::new(BenchmarkConfig::default())?;
//! let mut state = orchestrator.subscribe();
//! tokio::spawn(async move {
//!     while state.changed().await.is_ok() {
//!         let snapshot = state.borrow_and_update().clone();
//!         println!("{:.0}% {}", snapshot.progress * 100.0, snapshot.current_status);
//!     }
//! });
//! # Ok(())
//! # }
//! ```
//!
//! ### Feature Flags
//!
//! - `cli` (default): command-line harness, progress bar and tracing subscriber setup
//! - `tracing-json`: JSON structured log output for the CLI
//!
//! ### Library-Only Usage
//!
//! ```toml
//! [dependencies]
//! imgly-bgbench = { version = "0.1", default-features = false }
//! ```

#[cfg(feature = "cli")]
pub mod cli;
pub mod comparison;
pub mod config;
pub mod corpus;
pub mod error;
pub mod orchestrator;
pub mod services;
pub mod strategies;
pub mod strategy;
#[cfg(feature = "cli")]
pub mod tracing_config;
pub mod types;
pub mod utils;

// Public API exports
pub use comparison::{extract_normalized_pixels, ConfusionMatrix, PixelMaskComparator};
pub use config::{BenchmarkConfig, BenchmarkConfigBuilder, MaskResizeFilter};
pub use corpus::{CorpusLoader, DirectoryCorpusLoader, InMemoryCorpus, TestImage};
pub use error::{BenchmarkError, Result};
pub use orchestrator::{select_median, BenchmarkOrchestrator, RunOutcome, RunReport};
pub use services::{
    BenchmarkRunState, BenchmarkSummary, QualitySummary, RunPhase, RunStatePublisher,
    StrategySummary, SummaryReporter,
};
pub use strategies::BorderColorStrategy;
pub use strategy::{BackgroundRemovalStrategy, StrategyRegistry};
pub use types::{
    BenchmarkResult, InferenceMetrics, MaskStatistics, ModelSizeInfo, QualityMetrics,
    RemovalOutcome, SegmentationMask,
};
pub use utils::MemoryProbe;

#[cfg(feature = "cli")]
pub use tracing_config::{init_cli_tracing, TracingConfig, TracingFormat};

/// Load a corpus and benchmark `strategies` over it in one call
///
/// Convenience wrapper for callers that do not need to observe progress.
///
/// # Arguments
///
/// * `strategies` - Strategies to benchmark, in run order
/// * `loader` - Source of the test corpus
/// * `config` - Run configuration
///
/// # Errors
/// - `InvalidConfig` when `config` does not validate
/// - Loader failures, such as a missing corpus directory
///
/// # Examples
///
/// ```rust,no_run
/// use imgly_bgbench::{run_benchmarks, BenchmarkConfig, BorderColorStrategy, DirectoryCorpusLoader};
///
/// # async fn example() -> imgly_bgbench::Result<()> {
/// let report = run_benchmarks(
///     vec![Box::new(BorderColorStrategy::new())],
///     &DirectoryCorpusLoader::new("test_images"),
///     BenchmarkConfig::default(),
/// )
/// .await?;
/// assert!(report.results.len() <= report.total_runs);
/// # Ok(())
/// # }
/// ```
pub async fn run_benchmarks(
    mut strategies: Vec<Box<dyn BackgroundRemovalStrategy>>,
    loader: &dyn CorpusLoader,
    config: BenchmarkConfig,
) -> Result<RunReport> {
    let mut orchestrator = BenchmarkOrchestrator::new(config)?;
    let corpus = loader.load()?;
    Ok(orchestrator.run(&mut strategies, &corpus).await)
}
