//! Benchmark orchestration
//!
//! Drives every strategy through `initialize`, `iterations` timed
//! `remove_background` calls per corpus image, and `cleanup`, keeping one
//! median-by-latency result per (strategy, image) pair. Per-call failures are
//! recorded in the run state and never abort the run.

use crate::{
    comparison::PixelMaskComparator,
    config::BenchmarkConfig,
    corpus::TestImage,
    error::{BenchmarkError, Result},
    services::{BenchmarkRunState, BenchmarkSummary, RunPhase, RunStatePublisher, SummaryReporter},
    strategy::BackgroundRemovalStrategy,
    types::{BenchmarkResult, QualityMetrics, SegmentationMask},
};
use instant::Instant;
use std::collections::HashSet;
use std::future::Future;
use std::time::Duration;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, info_span, warn, Instrument};

/// How a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// Every strategy went through its image loop
    Completed,
    /// The cancellation token fired; results gathered so far are kept
    Cancelled,
    /// Nothing to benchmark
    EmptyCorpus,
}

/// Everything a finished run produced
#[derive(Debug, Clone)]
pub struct RunReport {
    pub outcome: RunOutcome,
    /// At most one result per (strategy, image) pair, in run order
    pub results: Vec<BenchmarkResult>,
    pub completed_runs: usize,
    pub total_runs: usize,
    /// Strategies skipped because `initialize` failed
    pub failed_strategies: Vec<String>,
    /// Final status message, also published in the run state
    pub status: String,
    pub elapsed: Duration,
}

impl RunReport {
    #[must_use]
    pub fn summary(&self) -> BenchmarkSummary {
        SummaryReporter::new().summarize(&self.results)
    }
}

/// Runs strategies over a corpus and publishes progress while doing so
pub struct BenchmarkOrchestrator {
    config: BenchmarkConfig,
    comparator: PixelMaskComparator,
    reporter: SummaryReporter,
    state: RunStatePublisher,
}

impl BenchmarkOrchestrator {
    /// Create an orchestrator for a validated configuration
    ///
    /// # Errors
    /// - `InvalidConfig` when the configuration does not validate
    pub fn new(config: BenchmarkConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            comparator: PixelMaskComparator::new(config.quality_threshold),
            config,
            reporter: SummaryReporter::new(),
            state: RunStatePublisher::new(),
        })
    }

    #[must_use]
    pub fn config(&self) -> &BenchmarkConfig {
        &self.config
    }

    /// Observe run state snapshots as they are published
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<BenchmarkRunState> {
        self.state.subscribe()
    }

    /// Current run state
    #[must_use]
    pub fn state(&self) -> BenchmarkRunState {
        self.state.snapshot()
    }

    /// Benchmark `strategies` over `corpus` until done
    pub async fn run(
        &mut self,
        strategies: &mut [Box<dyn BackgroundRemovalStrategy>],
        corpus: &[TestImage],
    ) -> RunReport {
        self.run_with_cancellation(strategies, corpus, &CancellationToken::new())
            .await
    }

    /// Benchmark `strategies` over `corpus`, stopping early once `cancel` fires.
    ///
    /// The token is checked before each strategy, image and repetition. A
    /// cancelled run still cleans up the strategy it was working on.
    pub async fn run_with_cancellation(
        &mut self,
        strategies: &mut [Box<dyn BackgroundRemovalStrategy>],
        corpus: &[TestImage],
        cancel: &CancellationToken,
    ) -> RunReport {
        let started = Instant::now();
        self.state.start();

        if corpus.is_empty() {
            let status = format!("Error: {}", BenchmarkError::EmptyCorpus);
            warn!("{}", status);
            self.state.finish(status.clone());
            return RunReport {
                outcome: RunOutcome::EmptyCorpus,
                results: Vec::new(),
                completed_runs: 0,
                total_runs: 0,
                failed_strategies: Vec::new(),
                status,
                elapsed: started.elapsed(),
            };
        }

        Self::warn_on_duplicate_names(strategies);

        let iterations = self.config.iterations;
        let total_runs = strategies.len() * corpus.len() * iterations;
        self.state.set_total_runs(total_runs);
        info!(
            strategies = strategies.len(),
            images = corpus.len(),
            iterations,
            total_runs,
            "Starting benchmark run"
        );

        let mut completed_runs = 0;
        let mut results = Vec::new();
        let mut failed_strategies = Vec::new();
        let mut cancelled = false;

        for strategy in strategies.iter_mut() {
            if cancel.is_cancelled() {
                cancelled = true;
                break;
            }

            let name = strategy.name().to_string();
            let span = info_span!("strategy", strategy = %name);
            self.state.set_phase(
                RunPhase::Initializing {
                    strategy: name.clone(),
                },
                format!("Initializing {}...", name),
            );
            info!(strategy = %name, "Initializing strategy");

            if let Err(e) = self
                .call_with_timeout("initialize", strategy.initialize())
                .instrument(span.clone())
                .await
            {
                let message = format!("Error initializing {}: {}", name, e);
                warn!(strategy = %name, error = %e, "Strategy skipped");
                self.state.record_error(message);
                failed_strategies.push(name);
                if self.config.cleanup_after_failed_init {
                    self.cleanup(strategy.as_mut()).instrument(span).await;
                }
                continue;
            }

            if let Some(size) = strategy.model_size_info() {
                info!(
                    strategy = %name,
                    model_file_bytes = size.model_file_bytes,
                    compiled_model_bytes = ?size.compiled_model_bytes,
                    "Model size"
                );
            }

            for test_image in corpus {
                if cancel.is_cancelled() {
                    cancelled = true;
                    break;
                }

                let (median, image_cancelled) = self
                    .benchmark_image(strategy.as_mut(), test_image, cancel, &mut completed_runs)
                    .instrument(span.clone())
                    .await;
                if let Some(result) = median {
                    self.state.push_result(result.clone());
                    results.push(result);
                }
                if image_cancelled {
                    cancelled = true;
                    break;
                }
            }

            self.cleanup(strategy.as_mut()).instrument(span).await;
            if cancelled {
                break;
            }
        }

        let mut status = if cancelled {
            format!("Benchmark cancelled after {} runs.", completed_runs)
        } else {
            format!("Benchmark complete! Processed {} runs.", completed_runs)
        };
        if !failed_strategies.is_empty() {
            status.push_str(&format!(
                " Failed to initialize: {}.",
                failed_strategies.join(", ")
            ));
        }
        self.state.finish(status.clone());

        let elapsed = started.elapsed();
        info!(
            completed_runs,
            total_runs,
            results = results.len(),
            elapsed_secs = elapsed.as_secs_f64(),
            "{}",
            status
        );
        if self.config.log_summary {
            self.reporter.log(&results);
        }

        RunReport {
            outcome: if cancelled {
                RunOutcome::Cancelled
            } else {
                RunOutcome::Completed
            },
            results,
            completed_runs,
            total_runs,
            failed_strategies,
            status,
            elapsed,
        }
    }

    /// Time every repetition of one strategy on one image and keep the median.
    /// Returns the median (if any repetition succeeded) and whether the run
    /// was cancelled part-way.
    async fn benchmark_image(
        &self,
        strategy: &mut dyn BackgroundRemovalStrategy,
        test_image: &TestImage,
        cancel: &CancellationToken,
        completed_runs: &mut usize,
    ) -> (Option<BenchmarkResult>, bool) {
        let name = strategy.name().to_string();
        let iterations = self.config.iterations;
        let ground_truth = test_image
            .ground_truth
            .as_ref()
            .map(SegmentationMask::from_dynamic);

        let mut runs = Vec::with_capacity(iterations);
        let mut cancelled = false;

        for iteration in 1..=iterations {
            if cancel.is_cancelled() {
                cancelled = true;
                break;
            }

            self.state.set_phase(
                RunPhase::Iterating {
                    strategy: name.clone(),
                    image: test_image.name.clone(),
                    iteration,
                },
                format!(
                    "Testing {} on {} (iteration {}/{})...",
                    name, test_image.name, iteration, iterations
                ),
            );

            match self
                .call_with_timeout(
                    "remove_background",
                    strategy.remove_background(&test_image.image),
                )
                .await
            {
                Ok(outcome) => {
                    let quality = ground_truth
                        .as_ref()
                        .and_then(|gt| self.score(gt, &outcome.mask, &name, &test_image.name));
                    debug!(
                        strategy = %name,
                        image = %test_image.name,
                        iteration,
                        latency_ms = outcome.metrics.latency_ms(),
                        iou = ?quality.map(|q| q.iou),
                        "Repetition finished"
                    );
                    runs.push(
                        BenchmarkResult::new(
                            name.as_str(),
                            test_image.name.as_str(),
                            test_image.dimensions(),
                            outcome.metrics,
                        )
                        .with_quality(quality),
                    );
                },
                Err(e) => {
                    let message = format!(
                        "Error processing {} with {}: {}",
                        test_image.name, name, e
                    );
                    warn!(strategy = %name, image = %test_image.name, iteration, error = %e, "Repetition failed");
                    self.state.record_error(message);
                },
            }

            *completed_runs += 1;
            self.state.record_progress(*completed_runs);
        }

        (select_median(runs, iterations), cancelled)
    }

    /// Quality of `predicted` against `ground_truth`, fitting sizes first.
    /// Failures degrade to `None`.
    fn score(
        &self,
        ground_truth: &SegmentationMask,
        predicted: &SegmentationMask,
        strategy: &str,
        image: &str,
    ) -> Option<QualityMetrics> {
        let fitted;
        let predicted = if predicted.dimensions == ground_truth.dimensions {
            predicted
        } else {
            fitted = match predicted.resize(
                ground_truth.width(),
                ground_truth.height(),
                self.config.mask_resize_filter.filter_type(),
            ) {
                Ok(mask) => mask,
                Err(e) => {
                    warn!(strategy, image, error = %e, "Predicted mask could not be resized");
                    return None;
                },
            };
            &fitted
        };

        match self.comparator.compare_masks(ground_truth, predicted) {
            Ok(metrics) => Some(metrics),
            Err(e) => {
                warn!(strategy, image, error = %e, "Quality metrics unavailable");
                None
            },
        }
    }

    async fn call_with_timeout<T, F>(&self, operation: &str, call: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        match self.config.call_timeout {
            Some(limit) => tokio::time::timeout(limit, call)
                .await
                .unwrap_or_else(|_| Err(BenchmarkError::timed_out(operation, limit))),
            None => call.await,
        }
    }

    async fn cleanup(&self, strategy: &mut dyn BackgroundRemovalStrategy) {
        let name = strategy.name().to_string();
        match self.config.call_timeout {
            Some(limit) => {
                if tokio::time::timeout(limit, strategy.cleanup()).await.is_err() {
                    warn!(strategy = %name, "Cleanup timed out after {:.1}s", limit.as_secs_f64());
                }
            },
            None => strategy.cleanup().await,
        }
        debug!(strategy = %name, "Strategy cleaned up");
    }

    fn warn_on_duplicate_names(strategies: &[Box<dyn BackgroundRemovalStrategy>]) {
        let mut seen = HashSet::new();
        for strategy in strategies {
            if !seen.insert(strategy.name()) {
                warn!(
                    strategy = %strategy.name(),
                    "Duplicate strategy name, results will be grouped together"
                );
            }
        }
    }
}

/// Pick the repetition at sorted rank `iterations / 2` by ascending latency.
///
/// Ties keep their original order. When failures left fewer repetitions than
/// that rank, the middle of the successful ones is used instead, so a pair is
/// only dropped when every repetition failed. A strict rank lookup would
/// drop the pair as soon as fewer than `iterations / 2 + 1` repetitions
/// succeeded.
#[must_use]
pub fn select_median(mut runs: Vec<BenchmarkResult>, iterations: usize) -> Option<BenchmarkResult> {
    if runs.is_empty() {
        return None;
    }
    runs.sort_by(|a, b| {
        a.metrics
            .latency_seconds
            .total_cmp(&b.metrics.latency_seconds)
    });
    let rank = iterations / 2;
    let index = if rank < runs.len() { rank } else { runs.len() / 2 };
    Some(runs.swap_remove(index))
}
