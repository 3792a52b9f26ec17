//! Aggregated benchmark summaries

use crate::types::BenchmarkResult;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

const RULE_WIDTH: usize = 80;

/// Mean quality scores over the results that carried ground-truth metrics
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QualitySummary {
    pub sample_count: usize,
    pub mean_iou: f64,
    pub mean_pixel_accuracy: f64,
    pub mean_f1_score: f64,
}

/// Aggregate statistics for one strategy
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StrategySummary {
    pub strategy_name: String,
    pub result_count: usize,
    pub mean_latency_ms: f64,
    pub mean_memory_bytes: f64,
    /// Model load time of the first cold-start result, if one was kept
    pub cold_start_load_ms: Option<f64>,
    /// Absent when no result of this strategy had quality metrics
    pub quality: Option<QualitySummary>,
}

impl StrategySummary {
    #[must_use]
    pub fn mean_memory_mb(&self) -> f64 {
        self.mean_memory_bytes / (1024.0 * 1024.0)
    }
}

/// Per-strategy summaries in strategy name order
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct BenchmarkSummary {
    pub strategies: Vec<StrategySummary>,
}

impl BenchmarkSummary {
    #[must_use]
    pub fn strategy(&self, name: &str) -> Option<&StrategySummary> {
        self.strategies.iter().find(|s| s.strategy_name == name)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }
}

impl fmt::Display for BenchmarkSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", "=".repeat(RULE_WIDTH))?;
        writeln!(f, "BENCHMARK SUMMARY")?;
        writeln!(f, "{}", "=".repeat(RULE_WIDTH))?;

        if self.strategies.is_empty() {
            writeln!(f, "\nNo results.")?;
        }

        for summary in &self.strategies {
            writeln!(f, "\n📱 {}", summary.strategy_name)?;
            writeln!(f, "{}", "-".repeat(RULE_WIDTH))?;
            writeln!(f, "  Images: {}", summary.result_count)?;
            writeln!(f, "  Avg Inference Time: {:.2} ms", summary.mean_latency_ms)?;
            writeln!(f, "  Avg Memory Usage: {:.2} MB", summary.mean_memory_mb())?;
            if let Some(load_ms) = summary.cold_start_load_ms {
                writeln!(f, "  Cold Start Time: {:.2} ms", load_ms)?;
            }
            if let Some(quality) = &summary.quality {
                writeln!(f, "  Avg IoU: {:.4}", quality.mean_iou)?;
                writeln!(f, "  Avg Pixel Accuracy: {:.4}", quality.mean_pixel_accuracy)?;
                writeln!(f, "  Avg F1 Score: {:.4}", quality.mean_f1_score)?;
            }
        }

        write!(f, "\n{}", "=".repeat(RULE_WIDTH))
    }
}

/// Groups results by strategy and computes mean statistics
#[derive(Debug, Clone, Copy, Default)]
pub struct SummaryReporter;

impl SummaryReporter {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    #[must_use]
    pub fn summarize(&self, results: &[BenchmarkResult]) -> BenchmarkSummary {
        let mut grouped: BTreeMap<&str, Vec<&BenchmarkResult>> = BTreeMap::new();
        for result in results {
            grouped
                .entry(result.strategy_name.as_str())
                .or_default()
                .push(result);
        }

        let strategies = grouped
            .into_iter()
            .map(|(name, group)| Self::summarize_strategy(name, &group))
            .collect();
        BenchmarkSummary { strategies }
    }

    /// Emit the textual summary through `tracing`, one event per line
    pub fn log(&self, results: &[BenchmarkResult]) {
        let summary = self.summarize(results);
        for line in summary.to_string().lines() {
            tracing::info!("{}", line);
        }
    }

    fn summarize_strategy(name: &str, group: &[&BenchmarkResult]) -> StrategySummary {
        let mean_latency_ms = mean(group.iter().map(|r| r.metrics.latency_ms()));
        let mean_memory_bytes = mean(group.iter().map(|r| r.metrics.peak_memory_bytes as f64));
        let cold_start_load_ms = group
            .iter()
            .find(|r| r.metrics.is_cold_start)
            .and_then(|r| r.metrics.model_load_seconds)
            .map(|seconds| seconds * 1000.0);

        let scored: Vec<_> = group.iter().filter_map(|r| r.quality_metrics).collect();
        let quality = (!scored.is_empty()).then(|| QualitySummary {
            sample_count: scored.len(),
            mean_iou: mean(scored.iter().map(|q| q.iou)),
            mean_pixel_accuracy: mean(scored.iter().map(|q| q.pixel_accuracy)),
            mean_f1_score: mean(scored.iter().map(|q| q.f1_score)),
        });

        StrategySummary {
            strategy_name: name.to_string(),
            result_count: group.len(),
            mean_latency_ms,
            mean_memory_bytes,
            cold_start_load_ms,
            quality,
        }
    }
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0_usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}
