//! Error types for benchmark operations

use thiserror::Error;

/// Result type alias for benchmark operations
pub type Result<T> = std::result::Result<T, BenchmarkError>;

/// Errors raised by strategies, the mask comparator and the orchestrator
#[derive(Error, Debug)]
pub enum BenchmarkError {
    /// A strategy could not load its model or backend
    #[error("Model load failed: {0}")]
    ModelLoadFailed(String),

    /// `remove_background` was called before a successful `initialize`
    #[error("Model not loaded. Call initialize() first.")]
    ModelNotLoaded,

    /// The input image could not be decoded or prepared
    #[error("Invalid input image: {0}")]
    InvalidImage(String),

    /// Backend-internal failure during background removal
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),

    /// Ground truth and predicted mask differ in size
    #[error(
        "Mask dimensions don't match: ground truth {}x{} vs predicted {}x{}",
        expected.0, expected.1, actual.0, actual.1
    )]
    DimensionMismatch {
        expected: (u32, u32),
        actual: (u32, u32),
    },

    /// The corpus supplied to a run contained no images
    #[error("No test images found")]
    EmptyCorpus,

    /// Invalid configuration or parameters
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Input/output errors (corpus directory missing, permission denied, etc.)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Image decoding errors
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}

impl BenchmarkError {
    /// Create a new model load error
    pub fn model_load_failed<S: Into<String>>(msg: S) -> Self {
        Self::ModelLoadFailed(msg.into())
    }

    /// Create a new invalid image error
    pub fn invalid_image<S: Into<String>>(msg: S) -> Self {
        Self::InvalidImage(msg.into())
    }

    /// Create a new processing error
    pub fn processing<S: Into<String>>(msg: S) -> Self {
        Self::ProcessingFailed(msg.into())
    }

    /// Create a new invalid configuration error
    pub fn invalid_config<S: Into<String>>(msg: S) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Create a processing error for a strategy call that exceeded its time budget
    pub fn timed_out(operation: &str, timeout: std::time::Duration) -> Self {
        Self::ProcessingFailed(format!(
            "{} timed out after {:.1}s",
            operation,
            timeout.as_secs_f64()
        ))
    }

    /// Create configuration error with valid ranges
    pub fn config_value_error<T: std::fmt::Display>(
        parameter: &str,
        value: T,
        valid_range: &str,
    ) -> Self {
        Self::InvalidConfig(format!(
            "Invalid {}: {} (valid range: {})",
            parameter, value, valid_range
        ))
    }

    /// Create image loading error with path context
    pub fn image_load_error<P: AsRef<std::path::Path>>(path: P, error: &image::ImageError) -> Self {
        Self::InvalidImage(format!(
            "Failed to load image '{}': {}",
            path.as_ref().display(),
            error
        ))
    }
}
