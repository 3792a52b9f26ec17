//! Scripted strategies for exercising the orchestrator without a backend
//!
//! A [`ScriptedStrategy`] replays configured latencies, fails on chosen calls
//! and records every lifecycle call so tests can assert on ordering.

use crate::{
    error::{BenchmarkError, Result},
    strategy::BackgroundRemovalStrategy,
    types::{InferenceMetrics, ModelSizeInfo, RemovalOutcome, SegmentationMask},
};
use async_trait::async_trait;
use image::DynamicImage;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct ScriptedStrategy {
    name: String,
    loaded: bool,
    /// Latencies in seconds, replayed cyclically per `remove_background` call
    latencies: Vec<f64>,
    memory_bytes: u64,
    fail_init: bool,
    fail_all_calls: bool,
    failing_calls: HashSet<usize>,
    call_delay: Option<Duration>,
    init_delay: Option<Duration>,
    fixed_mask: Option<SegmentationMask>,
    model_size: Option<ModelSizeInfo>,
    calls: usize,
    call_history: Arc<Mutex<Vec<String>>>,
}

impl ScriptedStrategy {
    /// Strategy that always succeeds in 10ms and echoes the input as its mask
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            loaded: false,
            latencies: vec![0.010],
            memory_bytes: 1024 * 1024,
            fail_init: false,
            fail_all_calls: false,
            failing_calls: HashSet::new(),
            call_delay: None,
            init_delay: None,
            fixed_mask: None,
            model_size: None,
            calls: 0,
            call_history: Arc::new(Mutex::new(Vec::new())),
        }
    }

    #[must_use]
    pub fn with_latencies_ms(mut self, latencies_ms: &[f64]) -> Self {
        self.latencies = latencies_ms.iter().map(|ms| ms / 1000.0).collect();
        self
    }

    #[must_use]
    pub fn with_memory_bytes(mut self, bytes: u64) -> Self {
        self.memory_bytes = bytes;
        self
    }

    #[must_use]
    pub fn failing_init(mut self) -> Self {
        self.fail_init = true;
        self
    }

    #[must_use]
    pub fn always_failing(mut self) -> Self {
        self.fail_all_calls = true;
        self
    }

    /// Fail the given zero-based `remove_background` calls
    #[must_use]
    pub fn failing_calls(mut self, calls: &[usize]) -> Self {
        self.failing_calls.extend(calls.iter().copied());
        self
    }

    #[must_use]
    pub fn with_call_delay(mut self, delay: Duration) -> Self {
        self.call_delay = Some(delay);
        self
    }

    #[must_use]
    pub fn with_init_delay(mut self, delay: Duration) -> Self {
        self.init_delay = Some(delay);
        self
    }

    /// Return `mask` regardless of the input instead of echoing the input
    #[must_use]
    pub fn with_fixed_mask(mut self, mask: SegmentationMask) -> Self {
        self.fixed_mask = Some(mask);
        self
    }

    /// Report `size` from `model_size_info`
    #[must_use]
    pub fn with_model_size(mut self, size: ModelSizeInfo) -> Self {
        self.model_size = Some(size);
        self
    }

    /// Shared handle on the recorded calls; stays valid after the strategy is boxed
    #[must_use]
    pub fn history(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.call_history)
    }

    fn record_call(&self, method: &str) {
        if let Ok(mut history) = self.call_history.lock() {
            history.push(method.to_string());
        }
    }
}

#[async_trait]
impl BackgroundRemovalStrategy for ScriptedStrategy {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_model_loaded(&self) -> bool {
        self.loaded
    }

    async fn initialize(&mut self) -> Result<()> {
        self.record_call("initialize");
        if let Some(delay) = self.init_delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_init {
            return Err(BenchmarkError::model_load_failed(format!(
                "{} weights missing",
                self.name
            )));
        }
        self.loaded = true;
        Ok(())
    }

    async fn remove_background(&mut self, image: &DynamicImage) -> Result<RemovalOutcome> {
        self.record_call("remove_background");
        let call = self.calls;
        self.calls += 1;

        if !self.loaded {
            return Err(BenchmarkError::ModelNotLoaded);
        }
        if let Some(delay) = self.call_delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_all_calls || self.failing_calls.contains(&call) {
            return Err(BenchmarkError::processing(format!(
                "scripted failure on call {}",
                call
            )));
        }

        let latency = if self.latencies.is_empty() {
            0.0
        } else {
            self.latencies[call % self.latencies.len()]
        };
        let mask = self
            .fixed_mask
            .clone()
            .unwrap_or_else(|| SegmentationMask::from_dynamic(image));
        let metrics = InferenceMetrics::new(latency, self.memory_bytes);
        let metrics = if call == 0 {
            metrics.with_cold_start(Some(0.1))
        } else {
            metrics
        };

        Ok(RemovalOutcome::new(image.clone(), mask, metrics))
    }

    async fn cleanup(&mut self) {
        self.record_call("cleanup");
        self.loaded = false;
    }

    fn model_size_info(&self) -> Option<ModelSizeInfo> {
        if self.model_size.is_some() {
            self.record_call("model_size_info");
        }
        self.model_size
    }
}
