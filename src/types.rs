//! Core value types shared by strategies, the comparator and the orchestrator

use crate::error::{BenchmarkError, Result};
use chrono::{DateTime, Utc};
use image::{imageops::FilterType, DynamicImage, GrayImage, ImageBuffer, Luma, RgbaImage};
use serde::{Deserialize, Serialize};

/// Metrics collected by a strategy during a single inference
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InferenceMetrics {
    /// Wall-clock inference latency in seconds
    pub latency_seconds: f64,
    /// Memory growth observed during the call, in bytes
    pub peak_memory_bytes: u64,
    /// Model load time, only reported on a cold start
    pub model_load_seconds: Option<f64>,
    /// First invocation after the model was loaded
    pub is_cold_start: bool,
}

impl InferenceMetrics {
    /// Warm-path metrics with no model load time attached
    #[must_use]
    pub fn new(latency_seconds: f64, peak_memory_bytes: u64) -> Self {
        Self {
            latency_seconds: latency_seconds.max(0.0),
            peak_memory_bytes,
            model_load_seconds: None,
            is_cold_start: false,
        }
    }

    /// Mark these metrics as a cold start that paid `model_load_seconds`
    #[must_use]
    pub fn with_cold_start(mut self, model_load_seconds: Option<f64>) -> Self {
        self.is_cold_start = true;
        self.model_load_seconds = model_load_seconds;
        self
    }

    #[must_use]
    pub fn latency_ms(&self) -> f64 {
        self.latency_seconds * 1000.0
    }

    #[must_use]
    pub fn memory_mb(&self) -> f64 {
        self.peak_memory_bytes as f64 / (1024.0 * 1024.0)
    }
}

/// Result of one `remove_background` invocation
#[derive(Debug, Clone)]
pub struct RemovalOutcome {
    /// Input image with the mask written into its alpha channel
    pub processed_image: DynamicImage,
    /// Predicted foreground mask; may differ in size from the input
    pub mask: SegmentationMask,
    /// Timing and memory figures for this invocation
    pub metrics: InferenceMetrics,
}

impl RemovalOutcome {
    #[must_use]
    pub fn new(processed_image: DynamicImage, mask: SegmentationMask, metrics: InferenceMetrics) -> Self {
        Self {
            processed_image,
            mask,
            metrics,
        }
    }
}

/// Grayscale segmentation mask, foreground high and background low
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentationMask {
    /// Mask data as grayscale values (0-255), row-major
    pub data: Vec<u8>,

    /// Mask dimensions (width, height)
    pub dimensions: (u32, u32),
}

impl SegmentationMask {
    /// Create a new segmentation mask
    #[must_use]
    pub fn new(data: Vec<u8>, dimensions: (u32, u32)) -> Self {
        Self { data, dimensions }
    }

    /// Create mask from a grayscale image
    #[must_use]
    pub fn from_image(image: &GrayImage) -> Self {
        Self::new(image.as_raw().clone(), image.dimensions())
    }

    /// Create a mask from any decoded image using its red channel
    #[must_use]
    pub fn from_dynamic(image: &DynamicImage) -> Self {
        let rgba = image.to_rgba8();
        let data = rgba.pixels().map(|p| p[0]).collect();
        Self::new(data, rgba.dimensions())
    }

    /// Convert mask to a grayscale image
    pub fn to_image(&self) -> Result<GrayImage> {
        let (width, height) = self.dimensions;
        ImageBuffer::<Luma<u8>, Vec<u8>>::from_raw(width, height, self.data.clone()).ok_or_else(
            || {
                BenchmarkError::processing(format!(
                    "Mask buffer of {} bytes does not fit {}x{}",
                    self.data.len(),
                    width,
                    height
                ))
            },
        )
    }

    #[must_use]
    pub fn width(&self) -> u32 {
        self.dimensions.0
    }

    #[must_use]
    pub fn height(&self) -> u32 {
        self.dimensions.1
    }

    /// Resize the mask to new dimensions
    pub fn resize(&self, new_width: u32, new_height: u32, filter: FilterType) -> Result<Self> {
        if self.dimensions == (new_width, new_height) {
            return Ok(self.clone());
        }
        let current = self.to_image()?;
        let resized = image::imageops::resize(&current, new_width, new_height, filter);
        Ok(Self::from_image(&resized))
    }

    /// Write the mask into the alpha channel of an RGBA image.
    ///
    /// The mask is stretched to the image size first when the two differ.
    pub fn apply_to_image(&self, image: &mut RgbaImage) -> Result<()> {
        let (img_width, img_height) = image.dimensions();
        let fitted;
        let mask = if self.dimensions == (img_width, img_height) {
            self
        } else {
            fitted = self.resize(img_width, img_height, FilterType::Triangle)?;
            &fitted
        };

        for (pixel, &alpha) in image.pixels_mut().zip(mask.data.iter()) {
            pixel[3] = alpha;
        }
        Ok(())
    }

    /// Get mask statistics
    #[must_use]
    pub fn statistics(&self) -> MaskStatistics {
        let total_pixels = self.data.len();
        let foreground_pixels = self.data.iter().filter(|&&x| x > 127).count();
        let background_pixels = total_pixels - foreground_pixels;
        let ratio = |count: usize| {
            if total_pixels == 0 {
                0.0
            } else {
                count as f32 / total_pixels as f32
            }
        };

        MaskStatistics {
            total_pixels,
            foreground_pixels,
            background_pixels,
            foreground_ratio: ratio(foreground_pixels),
            background_ratio: ratio(background_pixels),
        }
    }
}

/// Statistics about a segmentation mask
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaskStatistics {
    pub total_pixels: usize,
    pub foreground_pixels: usize,
    pub background_pixels: usize,
    pub foreground_ratio: f32,
    pub background_ratio: f32,
}

/// Quality scores of a predicted mask against ground truth, each in `[0, 1]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QualityMetrics {
    /// Intersection over Union
    pub iou: f64,
    pub pixel_accuracy: f64,
    pub f1_score: f64,
}

/// Size of the model a strategy ships with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelSizeInfo {
    pub model_file_bytes: u64,
    /// Size after on-device compilation, if the backend compiles models
    pub compiled_model_bytes: Option<u64>,
}

/// One benchmark record per (strategy, image) pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkResult {
    pub strategy_name: String,
    pub image_name: String,
    /// Input image size (width, height)
    pub image_size: (u32, u32),
    pub metrics: InferenceMetrics,
    pub timestamp: DateTime<Utc>,
    /// Present only when the image had usable ground truth
    pub quality_metrics: Option<QualityMetrics>,
}

impl BenchmarkResult {
    #[must_use]
    pub fn new(
        strategy_name: impl Into<String>,
        image_name: impl Into<String>,
        image_size: (u32, u32),
        metrics: InferenceMetrics,
    ) -> Self {
        Self {
            strategy_name: strategy_name.into(),
            image_name: image_name.into(),
            image_size,
            metrics,
            timestamp: Utc::now(),
            quality_metrics: None,
        }
    }

    #[must_use]
    pub fn with_quality(mut self, quality_metrics: Option<QualityMetrics>) -> Self {
        self.quality_metrics = quality_metrics;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn test_mask_image_conversion() {
        let mask = SegmentationMask::new(vec![0, 64, 128, 255], (2, 2));
        let image = mask.to_image().unwrap();
        assert_eq!(image.dimensions(), (2, 2));
        assert_eq!(SegmentationMask::from_image(&image), mask);
    }

    #[test]
    fn test_mask_with_wrong_buffer_size_is_rejected() {
        let mask = SegmentationMask::new(vec![0; 3], (2, 2));
        assert!(matches!(
            mask.to_image(),
            Err(BenchmarkError::ProcessingFailed(_))
        ));
    }

    #[test]
    fn test_from_dynamic_uses_red_channel() {
        let mut rgba = RgbaImage::new(2, 1);
        rgba.put_pixel(0, 0, Rgba([200, 0, 0, 255]));
        rgba.put_pixel(1, 0, Rgba([10, 250, 250, 255]));
        let mask = SegmentationMask::from_dynamic(&DynamicImage::ImageRgba8(rgba));
        assert_eq!(mask.data, vec![200, 10]);
    }

    #[test]
    fn test_resize_mask() {
        let mask = SegmentationMask::new(vec![255; 16], (4, 4));
        let resized = mask.resize(8, 2, FilterType::Nearest).unwrap();
        assert_eq!(resized.dimensions, (8, 2));
        assert!(resized.data.iter().all(|&v| v == 255));
    }

    #[test]
    fn test_apply_mask_sets_alpha() {
        let mut image = RgbaImage::from_pixel(2, 1, Rgba([10, 20, 30, 255]));
        let mask = SegmentationMask::new(vec![0, 255], (2, 1));
        mask.apply_to_image(&mut image).unwrap();
        assert_eq!(image.get_pixel(0, 0)[3], 0);
        assert_eq!(image.get_pixel(1, 0)[3], 255);
        assert_eq!(image.get_pixel(1, 0)[0], 10);
    }

    #[test]
    fn test_apply_mask_of_different_size() {
        let mut image = RgbaImage::from_pixel(4, 4, Rgba([1, 2, 3, 9]));
        let mask = SegmentationMask::new(vec![255; 4], (2, 2));
        mask.apply_to_image(&mut image).unwrap();
        assert!(image.pixels().all(|p| p[3] == 255));
    }

    #[test]
    fn test_mask_statistics() {
        let stats = SegmentationMask::new(vec![0, 0, 200, 255], (2, 2)).statistics();
        assert_eq!(stats.foreground_pixels, 2);
        assert_eq!(stats.background_pixels, 2);
        assert!((stats.foreground_ratio - 0.5).abs() < f32::EPSILON);

        let empty = SegmentationMask::new(Vec::new(), (0, 0)).statistics();
        assert_eq!(empty.total_pixels, 0);
        assert!(empty.foreground_ratio.abs() < f32::EPSILON);
    }

    #[test]
    fn test_inference_metrics_units() {
        let metrics = InferenceMetrics::new(0.25, 3 * 1024 * 1024).with_cold_start(Some(1.5));
        assert!((metrics.latency_ms() - 250.0).abs() < 1e-9);
        assert!((metrics.memory_mb() - 3.0).abs() < 1e-9);
        assert!(metrics.is_cold_start);
        assert_eq!(metrics.model_load_seconds, Some(1.5));
    }
}
