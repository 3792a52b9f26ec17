//! Shared fixtures for integration tests
//!
//! Synthetic corpora are generated on the fly: a plain backdrop with a
//! solid square subject, plus the matching ground-truth mask.

#![allow(dead_code)]

use async_trait::async_trait;
use image::{DynamicImage, GrayImage, Luma, Rgb, RgbImage};
use imgly_bgbench::{
    BackgroundRemovalStrategy, BenchmarkError, InferenceMetrics, RemovalOutcome, Result,
    SegmentationMask, TestImage,
};
use std::path::Path;
use std::sync::{Arc, Mutex};

pub const BACKDROP: Rgb<u8> = Rgb([245, 245, 245]);
pub const SUBJECT: Rgb<u8> = Rgb([200, 30, 40]);

/// `size`x`size` backdrop with a centered subject square of half the size
pub fn studio_shot(size: u32) -> (RgbImage, GrayImage) {
    let (start, end) = (size / 4, size / 4 + size / 2);
    let inside = |x: u32, y: u32| (start..end).contains(&x) && (start..end).contains(&y);

    let image = RgbImage::from_fn(size, size, |x, y| if inside(x, y) { SUBJECT } else { BACKDROP });
    let mask = GrayImage::from_fn(size, size, |x, y| {
        if inside(x, y) {
            Luma([255])
        } else {
            Luma([0])
        }
    });
    (image, mask)
}

pub fn studio_test_image(name: &str, size: u32) -> TestImage {
    let (image, mask) = studio_shot(size);
    TestImage::new(
        name,
        DynamicImage::ImageRgb8(image),
        Some(DynamicImage::ImageLuma8(mask)),
    )
}

/// Write `img{NN}.png` files, with `mask{NN}.png` for the first `with_masks` of them
pub fn write_corpus(dir: &Path, count: usize, with_masks: usize) {
    for index in 1..=count {
        let (image, mask) = studio_shot(16);
        image
            .save(dir.join(format!("img{:02}.png", index)))
            .unwrap();
        if index <= with_masks {
            mask.save(dir.join(format!("mask{:02}.png", index))).unwrap();
        }
    }
}

/// Strategy with a fixed latency that records its lifecycle calls
#[derive(Debug, Clone)]
pub struct RecordingStrategy {
    name: String,
    latency_seconds: f64,
    fail_init: bool,
    loaded: bool,
    pub calls: Arc<Mutex<Vec<String>>>,
}

impl RecordingStrategy {
    pub fn new(name: &str, latency_ms: f64) -> Self {
        Self {
            name: name.to_string(),
            latency_seconds: latency_ms / 1000.0,
            fail_init: false,
            loaded: false,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn failing_init(mut self) -> Self {
        self.fail_init = true;
        self
    }
}

#[async_trait]
impl BackgroundRemovalStrategy for RecordingStrategy {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_model_loaded(&self) -> bool {
        self.loaded
    }

    async fn initialize(&mut self) -> Result<()> {
        self.calls.lock().unwrap().push("initialize".to_string());
        if self.fail_init {
            return Err(BenchmarkError::model_load_failed("model file missing"));
        }
        self.loaded = true;
        Ok(())
    }

    async fn remove_background(&mut self, image: &DynamicImage) -> Result<RemovalOutcome> {
        self.calls.lock().unwrap().push("remove_background".to_string());
        if !self.loaded {
            return Err(BenchmarkError::ModelNotLoaded);
        }
        Ok(RemovalOutcome::new(
            image.clone(),
            SegmentationMask::new(vec![0; (image.width() * image.height()) as usize], (image.width(), image.height())),
            InferenceMetrics::new(self.latency_seconds, 4096),
        ))
    }

    async fn cleanup(&mut self) {
        self.calls.lock().unwrap().push("cleanup".to_string());
        self.loaded = false;
    }
}
