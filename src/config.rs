//! Configuration types for benchmark runs

use crate::error::{BenchmarkError, Result};
use image::imageops::FilterType;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default number of timed repetitions per (strategy, image) pair
pub const DEFAULT_ITERATIONS: usize = 3;

/// Default foreground threshold on normalized mask intensity
pub const DEFAULT_QUALITY_THRESHOLD: f32 = 0.5;

/// Default per-call timeout for strategy operations
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(120);

/// Resampling filter used when a predicted mask must be fitted to ground truth
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MaskResizeFilter {
    Nearest,
    /// Bilinear interpolation
    #[default]
    Bilinear,
    Lanczos3,
}

impl MaskResizeFilter {
    #[must_use]
    pub fn filter_type(self) -> FilterType {
        match self {
            Self::Nearest => FilterType::Nearest,
            Self::Bilinear => FilterType::Triangle,
            Self::Lanczos3 => FilterType::Lanczos3,
        }
    }
}

impl std::fmt::Display for MaskResizeFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Nearest => write!(f, "nearest"),
            Self::Bilinear => write!(f, "bilinear"),
            Self::Lanczos3 => write!(f, "lanczos3"),
        }
    }
}

/// Configuration for a benchmark run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkConfig {
    /// Timed repetitions per (strategy, image) pair; the median-by-latency survives
    pub iterations: usize,

    /// Normalized intensity above which a mask pixel counts as foreground
    pub quality_threshold: f32,

    /// Upper bound for each `initialize`, `remove_background` and `cleanup` call
    pub call_timeout: Option<Duration>,

    /// Call `cleanup` on strategies whose `initialize` failed
    pub cleanup_after_failed_init: bool,

    /// Filter used to fit predicted masks to ground-truth dimensions
    pub mask_resize_filter: MaskResizeFilter,

    /// Log the aggregated summary once a run finishes
    pub log_summary: bool,
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        Self {
            iterations: DEFAULT_ITERATIONS,
            quality_threshold: DEFAULT_QUALITY_THRESHOLD,
            call_timeout: Some(DEFAULT_CALL_TIMEOUT),
            cleanup_after_failed_init: true,
            mask_resize_filter: MaskResizeFilter::default(),
            log_summary: true,
        }
    }
}

impl BenchmarkConfig {
    /// Create a new configuration builder
    ///
    /// # Examples
    ///
    /// ```rust
    /// use imgly_bgbench::BenchmarkConfig;
    /// use std::time::Duration;
    ///
    /// let config = BenchmarkConfig::builder()
    ///     .iterations(5)
    ///     .call_timeout(Some(Duration::from_secs(30)))
    ///     .build()
    ///     .unwrap();
    /// assert_eq!(config.iterations, 5);
    /// ```
    #[must_use]
    pub fn builder() -> BenchmarkConfigBuilder {
        BenchmarkConfigBuilder::new()
    }

    /// Validate the configuration
    ///
    /// # Errors
    /// - `iterations` is zero
    /// - `quality_threshold` is outside `[0, 1)`
    /// - `call_timeout` is zero
    pub fn validate(&self) -> Result<()> {
        if self.iterations == 0 {
            return Err(BenchmarkError::config_value_error(
                "iterations",
                self.iterations,
                ">= 1",
            ));
        }

        if !(0.0..1.0).contains(&self.quality_threshold) {
            return Err(BenchmarkError::config_value_error(
                "quality threshold",
                self.quality_threshold,
                "0.0-1.0 (exclusive)",
            ));
        }

        if let Some(timeout) = self.call_timeout {
            if timeout.is_zero() {
                return Err(BenchmarkError::invalid_config(
                    "Call timeout must be greater than zero; use None to disable it",
                ));
            }
        }

        Ok(())
    }
}

/// Builder for [`BenchmarkConfig`]
#[derive(Debug, Default)]
pub struct BenchmarkConfigBuilder {
    config: BenchmarkConfig,
}

impl BenchmarkConfigBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn iterations(mut self, iterations: usize) -> Self {
        self.config.iterations = iterations;
        self
    }

    #[must_use]
    pub fn quality_threshold(mut self, threshold: f32) -> Self {
        self.config.quality_threshold = threshold;
        self
    }

    #[must_use]
    pub fn call_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.config.call_timeout = timeout;
        self
    }

    #[must_use]
    pub fn cleanup_after_failed_init(mut self, enabled: bool) -> Self {
        self.config.cleanup_after_failed_init = enabled;
        self
    }

    #[must_use]
    pub fn mask_resize_filter(mut self, filter: MaskResizeFilter) -> Self {
        self.config.mask_resize_filter = filter;
        self
    }

    #[must_use]
    pub fn log_summary(mut self, enabled: bool) -> Self {
        self.config.log_summary = enabled;
        self
    }

    /// Build the configuration, validating it first
    ///
    /// # Errors
    /// Any error reported by [`BenchmarkConfig::validate`]
    pub fn build(self) -> Result<BenchmarkConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
