//! Error handling and edge case testing
//!
//! Covers configuration boundaries, comparator degenerate inputs, strategy
//! misuse and corpus problems that a benchmark run must survive.

mod common;

use common::{studio_test_image, RecordingStrategy};
use image::{DynamicImage, GrayImage, Luma, RgbImage};
use imgly_bgbench::{
    BackgroundRemovalStrategy, BenchmarkConfig, BenchmarkError, BenchmarkOrchestrator,
    BorderColorStrategy, CorpusLoader, DirectoryCorpusLoader, PixelMaskComparator, Result,
    RunOutcome, SegmentationMask, StrategyRegistry,
};
use std::time::Duration;
use tempfile::TempDir;

#[test]
fn test_config_validation_edge_cases() -> Result<()> {
    // Boundary values that are still valid
    let config = BenchmarkConfig::builder()
        .iterations(1)
        .quality_threshold(0.0)
        .call_timeout(None)
        .build()?;
    assert!(config.validate().is_ok());

    let config = BenchmarkConfig::builder().quality_threshold(0.999).build()?;
    assert!(config.validate().is_ok());

    let error = BenchmarkConfig::builder().iterations(0).build().unwrap_err();
    assert!(matches!(error, BenchmarkError::InvalidConfig(_)));
    assert!(error.to_string().contains("iterations"));

    let error = BenchmarkConfig::builder()
        .quality_threshold(1.0)
        .build()
        .unwrap_err();
    assert!(error.to_string().contains("quality threshold"));
    assert!(error.to_string().contains('1'));

    assert!(BenchmarkConfig::builder()
        .quality_threshold(-0.1)
        .build()
        .is_err());
    assert!(BenchmarkConfig::builder()
        .call_timeout(Some(Duration::ZERO))
        .build()
        .is_err());

    Ok(())
}

#[test]
fn test_config_round_trips_through_json() {
    let config = BenchmarkConfig::builder()
        .iterations(7)
        .build()
        .unwrap();
    let json = serde_json::to_string(&config).unwrap();
    let restored: BenchmarkConfig = serde_json::from_str(&json).unwrap();
    assert_eq!(restored, config);
}

#[test]
fn test_comparator_dimension_mismatch() {
    let ground_truth = DynamicImage::ImageLuma8(GrayImage::new(4, 4));
    let predicted = DynamicImage::ImageLuma8(GrayImage::new(5, 4));

    let result = PixelMaskComparator::default().compare(&ground_truth, &predicted);

    match result {
        Err(BenchmarkError::DimensionMismatch { expected, actual }) => {
            assert_eq!(expected, (4, 4));
            assert_eq!(actual, (5, 4));
        },
        other => panic!("Expected dimension mismatch, got {:?}", other),
    }
}

#[test]
fn test_comparator_degenerate_masks() {
    let comparator = PixelMaskComparator::default();
    let empty = DynamicImage::ImageLuma8(GrayImage::new(6, 6));
    let full = DynamicImage::ImageLuma8(GrayImage::from_pixel(6, 6, Luma([255])));

    // both all-background: nothing to overlap, yet every pixel agrees
    let metrics = comparator.compare(&empty, &empty).unwrap();
    assert_eq!(metrics.pixel_accuracy, 1.0);
    assert_eq!(metrics.iou, 0.0);
    assert_eq!(metrics.f1_score, 0.0);

    let metrics = comparator.compare(&full, &empty).unwrap();
    assert_eq!(metrics.pixel_accuracy, 0.0);
    assert_eq!(metrics.iou, 0.0);

    // a pixel exactly at the threshold is background
    let halfway = DynamicImage::ImageLuma8(GrayImage::from_pixel(6, 6, Luma([128])));
    let strict = PixelMaskComparator::new(128.0 / 255.0);
    assert_eq!(strict.compare(&full, &halfway).unwrap().iou, 0.0);
}

#[test]
fn test_corrupt_mask_buffer_rejected() {
    let comparator = PixelMaskComparator::default();
    let valid = SegmentationMask::new(vec![255; 4], (2, 2));
    let corrupt = SegmentationMask::new(vec![255; 3], (2, 2));

    let result = comparator.compare_masks(&valid, &corrupt);
    assert!(matches!(result, Err(BenchmarkError::ProcessingFailed(_))));
}

#[tokio::test]
async fn test_strategy_misuse() {
    let mut strategy = BorderColorStrategy::new();
    let image = DynamicImage::ImageRgb8(RgbImage::new(4, 4));

    let result = strategy.remove_background(&image).await;
    assert!(matches!(result, Err(BenchmarkError::ModelNotLoaded)));

    strategy.initialize().await.unwrap();
    strategy.initialize().await.unwrap();
    assert!(strategy.is_model_loaded());

    let empty = DynamicImage::ImageRgb8(RgbImage::new(0, 0));
    let result = strategy.remove_background(&empty).await;
    assert!(matches!(result, Err(BenchmarkError::InvalidImage(_))));

    strategy.cleanup().await;
    strategy.cleanup().await;
    assert!(!strategy.is_model_loaded());
}

#[test]
fn test_registry_rejects_bad_specifiers() {
    let registry = StrategyRegistry::with_builtin();

    let error = registry.create("modnet").err().unwrap();
    assert!(error.to_string().contains("border-color"));

    assert!(registry.create("border-color:abc").is_err());
    assert!(registry.create("border-color:0").is_err());
    assert!(registry.create("border-color:500").is_err());
}

#[tokio::test]
async fn test_empty_directory_corpus() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("readme.txt"), "not an image").unwrap();
    let corpus = DirectoryCorpusLoader::new(dir.path()).load().unwrap();
    assert!(corpus.is_empty());

    let strategy = RecordingStrategy::new("Recording", 1.0);
    let calls = strategy.calls.clone();
    let mut strategies: Vec<Box<dyn BackgroundRemovalStrategy>> = vec![Box::new(strategy)];
    let mut orchestrator = BenchmarkOrchestrator::new(BenchmarkConfig::default()).unwrap();

    let report = orchestrator.run(&mut strategies, &corpus).await;

    assert_eq!(report.outcome, RunOutcome::EmptyCorpus);
    assert_eq!(report.status, "Error: No test images found");
    assert!(calls.lock().unwrap().is_empty());
    assert!(!orchestrator.state().is_running);
}

#[tokio::test]
async fn test_no_strategies() {
    let mut orchestrator = BenchmarkOrchestrator::new(BenchmarkConfig::default()).unwrap();
    let report = orchestrator
        .run(&mut [], &[studio_test_image("a", 8)])
        .await;

    assert_eq!(report.outcome, RunOutcome::Completed);
    assert_eq!(report.total_runs, 0);
    assert!(report.results.is_empty());
    assert_eq!(orchestrator.state().progress, 0.0);
}

#[tokio::test]
async fn test_every_strategy_failing_initialize() {
    let mut strategies: Vec<Box<dyn BackgroundRemovalStrategy>> = vec![
        Box::new(RecordingStrategy::new("A", 1.0).failing_init()),
        Box::new(RecordingStrategy::new("B", 1.0).failing_init()),
    ];
    let mut orchestrator = BenchmarkOrchestrator::new(BenchmarkConfig::default()).unwrap();

    let report = orchestrator
        .run(&mut strategies, &[studio_test_image("a", 8)])
        .await;

    assert!(report.results.is_empty());
    assert_eq!(report.completed_runs, 0);
    assert!(report.status.ends_with("Failed to initialize: A, B."));
    assert_eq!(orchestrator.state().errors.len(), 2);
    assert_eq!(orchestrator.state().progress, 0.0);
}
