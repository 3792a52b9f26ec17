//! Mask comparison and segmentation quality metrics
//!
//! Both masks are reduced to normalized intensities in `[0, 1]` taken from the
//! red channel, binarized at a threshold and folded into a 2x2 confusion matrix
//! from which IoU, pixel accuracy and F1 are derived.

use crate::{
    config::DEFAULT_QUALITY_THRESHOLD,
    error::{BenchmarkError, Result},
    types::{QualityMetrics, SegmentationMask},
};
use image::{DynamicImage, GenericImageView};

/// Pixel counts of a binary segmentation against ground truth
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConfusionMatrix {
    pub true_positive: u64,
    pub true_negative: u64,
    pub false_positive: u64,
    pub false_negative: u64,
}

impl ConfusionMatrix {
    /// Accumulate one pixel decision
    pub fn record(&mut self, ground_truth_foreground: bool, predicted_foreground: bool) {
        match (ground_truth_foreground, predicted_foreground) {
            (true, true) => self.true_positive += 1,
            (false, false) => self.true_negative += 1,
            (false, true) => self.false_positive += 1,
            (true, false) => self.false_negative += 1,
        }
    }

    #[must_use]
    pub fn total(&self) -> u64 {
        self.true_positive + self.true_negative + self.false_positive + self.false_negative
    }

    /// Share of pixels classified correctly; 0.0 for an empty matrix
    #[must_use]
    pub fn pixel_accuracy(&self) -> f64 {
        ratio(self.true_positive + self.true_negative, self.total())
    }

    /// TP / (TP + FP + FN); 0.0 when neither mask has foreground
    #[must_use]
    pub fn iou(&self) -> f64 {
        ratio(
            self.true_positive,
            self.true_positive + self.false_positive + self.false_negative,
        )
    }

    /// 2TP / (2TP + FP + FN); 0.0 when neither mask has foreground
    #[must_use]
    pub fn f1_score(&self) -> f64 {
        ratio(
            2 * self.true_positive,
            2 * self.true_positive + self.false_positive + self.false_negative,
        )
    }

    #[must_use]
    pub fn quality_metrics(&self) -> QualityMetrics {
        QualityMetrics {
            iou: self.iou(),
            pixel_accuracy: self.pixel_accuracy(),
            f1_score: self.f1_score(),
        }
    }
}

fn ratio(numerator: u64, denominator: u64) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

/// Compares predicted masks against ground-truth masks
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelMaskComparator {
    threshold: f32,
}

impl Default for PixelMaskComparator {
    fn default() -> Self {
        Self::new(DEFAULT_QUALITY_THRESHOLD)
    }
}

impl PixelMaskComparator {
    /// Create a comparator; pixels strictly above `threshold` are foreground
    #[must_use]
    pub fn new(threshold: f32) -> Self {
        Self { threshold }
    }

    #[must_use]
    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Compare two decoded mask images of equal size.
    ///
    /// # Errors
    /// `DimensionMismatch` when the images differ in size. Callers are expected
    /// to fit the predicted mask to the ground truth beforehand.
    pub fn compare(
        &self,
        ground_truth: &DynamicImage,
        predicted: &DynamicImage,
    ) -> Result<QualityMetrics> {
        Self::ensure_same_size(ground_truth.dimensions(), predicted.dimensions())?;
        let gt_pixels = extract_normalized_pixels(ground_truth);
        let pred_pixels = extract_normalized_pixels(predicted);
        Ok(self.confusion_matrix(&gt_pixels, &pred_pixels).quality_metrics())
    }

    /// Compare two segmentation masks of equal size.
    ///
    /// # Errors
    /// `DimensionMismatch` when the masks differ in size, `ProcessingFailed`
    /// when a mask buffer does not match its declared dimensions.
    pub fn compare_masks(
        &self,
        ground_truth: &SegmentationMask,
        predicted: &SegmentationMask,
    ) -> Result<QualityMetrics> {
        Self::ensure_same_size(ground_truth.dimensions, predicted.dimensions)?;
        for mask in [ground_truth, predicted] {
            let expected_len = mask.width() as usize * mask.height() as usize;
            if mask.data.len() != expected_len {
                return Err(BenchmarkError::processing(format!(
                    "Mask buffer holds {} pixels, expected {}",
                    mask.data.len(),
                    expected_len
                )));
            }
        }

        let gt_pixels: Vec<f32> = ground_truth.data.iter().map(|&v| normalize(v)).collect();
        let pred_pixels: Vec<f32> = predicted.data.iter().map(|&v| normalize(v)).collect();
        Ok(self.confusion_matrix(&gt_pixels, &pred_pixels).quality_metrics())
    }

    /// Binarize both pixel arrays and count agreements
    #[must_use]
    pub fn confusion_matrix(&self, ground_truth: &[f32], predicted: &[f32]) -> ConfusionMatrix {
        ground_truth
            .iter()
            .zip(predicted)
            .fold(ConfusionMatrix::default(), |mut matrix, (&gt, &pred)| {
                matrix.record(gt > self.threshold, pred > self.threshold);
                matrix
            })
    }

    fn ensure_same_size(expected: (u32, u32), actual: (u32, u32)) -> Result<()> {
        if expected == actual {
            Ok(())
        } else {
            Err(BenchmarkError::DimensionMismatch { expected, actual })
        }
    }
}

fn normalize(value: u8) -> f32 {
    f32::from(value) / 255.0
}

/// Per-pixel intensities in `[0, 1]` read from the red channel
#[must_use]
pub fn extract_normalized_pixels(image: &DynamicImage) -> Vec<f32> {
    image.to_rgba8().pixels().map(|p| normalize(p[0])).collect()
}
