//! Border color keying strategy
//!
//! Estimates the background color as the mean of the image border and marks
//! every pixel whose RGB distance from it exceeds a tolerance as foreground.
//! Works well on studio shots with a plain backdrop and gives the harness a
//! backend that needs no model files.

use crate::{
    error::{BenchmarkError, Result},
    strategy::BackgroundRemovalStrategy,
    types::{InferenceMetrics, RemovalOutcome, SegmentationMask},
    utils::MemoryProbe,
};
use async_trait::async_trait;
use image::{DynamicImage, Rgba, RgbaImage};
use instant::Instant;
use tracing::debug;

/// Default RGB distance separating foreground from background
pub const DEFAULT_TOLERANCE: f32 = 48.0;

/// Largest possible distance between two RGB colors
const MAX_RGB_DISTANCE: f32 = 441.672_96;

pub struct BorderColorStrategy {
    name: String,
    tolerance: f32,
    loaded: bool,
    cold_start_pending: bool,
    model_load_seconds: Option<f64>,
    probe: Option<MemoryProbe>,
}

impl BorderColorStrategy {
    /// Create a strategy with the default tolerance
    #[must_use]
    pub fn new() -> Self {
        Self::build(DEFAULT_TOLERANCE, "Border Color".to_string())
    }

    /// Create a strategy with a custom tolerance, named after it
    ///
    /// # Errors
    /// - `InvalidConfig` when the tolerance is not in `(0, 441.67]`
    pub fn with_tolerance(tolerance: f32) -> Result<Self> {
        if !(tolerance > 0.0 && tolerance <= MAX_RGB_DISTANCE) {
            return Err(BenchmarkError::config_value_error(
                "border color tolerance",
                tolerance,
                "0-441.67",
            ));
        }
        Ok(Self::build(tolerance, format!("Border Color (tol {})", tolerance)))
    }

    /// Parse an optional tolerance parameter from a strategy specifier
    ///
    /// # Errors
    /// - `InvalidConfig` when the parameter is not a valid tolerance
    pub fn from_parameter(parameter: Option<&str>) -> Result<Self> {
        match parameter {
            None => Ok(Self::new()),
            Some(raw) => {
                let tolerance = raw.trim().parse::<f32>().map_err(|e| {
                    BenchmarkError::invalid_config(format!(
                        "Invalid border color tolerance '{}': {}",
                        raw, e
                    ))
                })?;
                Self::with_tolerance(tolerance)
            },
        }
    }

    fn build(tolerance: f32, name: String) -> Self {
        Self {
            name,
            tolerance,
            loaded: false,
            cold_start_pending: false,
            model_load_seconds: None,
            probe: None,
        }
    }

    #[must_use]
    pub fn tolerance(&self) -> f32 {
        self.tolerance
    }

    /// Mean color of the outermost pixel ring
    fn estimate_background(image: &RgbaImage) -> [f32; 3] {
        let (width, height) = image.dimensions();
        let mut sum = [0.0_f64; 3];
        let mut count = 0_u64;

        for (x, y, pixel) in image.enumerate_pixels() {
            if x == 0 || y == 0 || x + 1 == width || y + 1 == height {
                for (acc, &channel) in sum.iter_mut().zip(pixel.0.iter()) {
                    *acc += f64::from(channel);
                }
                count += 1;
            }
        }

        let count = count.max(1) as f64;
        [
            (sum[0] / count) as f32,
            (sum[1] / count) as f32,
            (sum[2] / count) as f32,
        ]
    }

    fn segment(&self, image: &RgbaImage) -> SegmentationMask {
        let background = Self::estimate_background(image);
        let data = image
            .pixels()
            .map(|&Rgba([r, g, b, _])| {
                let dr = f32::from(r) - background[0];
                let dg = f32::from(g) - background[1];
                let db = f32::from(b) - background[2];
                let distance = (dr * dr + dg * dg + db * db).sqrt();
                if distance > self.tolerance {
                    255
                } else {
                    0
                }
            })
            .collect();
        SegmentationMask::new(data, image.dimensions())
    }
}

impl Default for BorderColorStrategy {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BackgroundRemovalStrategy for BorderColorStrategy {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_model_loaded(&self) -> bool {
        self.loaded
    }

    async fn initialize(&mut self) -> Result<()> {
        if self.loaded {
            return Ok(());
        }
        let start = Instant::now();
        self.probe = Some(MemoryProbe::new());
        self.loaded = true;
        self.cold_start_pending = true;
        self.model_load_seconds = Some(start.elapsed().as_secs_f64());
        Ok(())
    }

    async fn remove_background(&mut self, image: &DynamicImage) -> Result<RemovalOutcome> {
        if !self.loaded {
            return Err(BenchmarkError::ModelNotLoaded);
        }
        if image.width() == 0 || image.height() == 0 {
            return Err(BenchmarkError::invalid_image(format!(
                "Image has no pixels ({}x{})",
                image.width(),
                image.height()
            )));
        }

        let baseline = self.probe.as_mut().map_or(0, MemoryProbe::resident_bytes);
        let start = Instant::now();

        let mut rgba = image.to_rgba8();
        let mask = self.segment(&rgba);
        mask.apply_to_image(&mut rgba)?;

        let latency = start.elapsed().as_secs_f64();
        let memory_delta = self
            .probe
            .as_mut()
            .map_or(0, |probe| probe.delta_since(baseline));

        let mut metrics = InferenceMetrics::new(latency, memory_delta);
        if self.cold_start_pending {
            self.cold_start_pending = false;
            metrics = metrics.with_cold_start(self.model_load_seconds);
        }
        debug!(
            strategy = %self.name,
            latency_ms = metrics.latency_ms(),
            foreground_ratio = mask.statistics().foreground_ratio,
            "Border color segmentation finished"
        );

        Ok(RemovalOutcome::new(
            DynamicImage::ImageRgba8(rgba),
            mask,
            metrics,
        ))
    }

    async fn cleanup(&mut self) {
        self.loaded = false;
        self.cold_start_pending = false;
        self.model_load_seconds = None;
        self.probe = None;
    }
}
