//! Run state publishing
//!
//! The orchestrator is the only writer of [`BenchmarkRunState`]. Every update
//! is published as a whole snapshot over a `tokio::sync::watch` channel, so
//! observers (progress bars, UIs) always read a consistent state without
//! locking the orchestrator.

use crate::types::BenchmarkResult;
use serde::Serialize;
use tokio::sync::watch;

/// Where the orchestrator currently is in its per-run state machine
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum RunPhase {
    /// No run in progress
    #[default]
    Idle,
    /// Loading the model of a strategy
    Initializing { strategy: String },
    /// Timing one repetition (1-based `iteration`)
    Iterating {
        strategy: String,
        image: String,
        iteration: usize,
    },
}

impl RunPhase {
    /// Get a human-readable description of the phase
    #[must_use]
    pub fn description(&self) -> String {
        match self {
            Self::Idle => "Idle".to_string(),
            Self::Initializing { strategy } => format!("Initializing {}", strategy),
            Self::Iterating {
                strategy,
                image,
                iteration,
            } => format!("Testing {} on {} (iteration {})", strategy, image, iteration),
        }
    }
}

/// Observable state of the orchestrator
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct BenchmarkRunState {
    pub is_running: bool,
    /// `completed_runs / total_runs`, in `[0, 1]`
    pub progress: f64,
    pub current_status: String,
    pub phase: RunPhase,
    pub completed_runs: usize,
    pub total_runs: usize,
    /// Median results accepted so far, in run order
    pub results: Vec<BenchmarkResult>,
    /// Every recovered failure message of the current run
    pub errors: Vec<String>,
}

/// Write side of the run state channel, owned by the orchestrator
#[derive(Debug)]
pub struct RunStatePublisher {
    sender: watch::Sender<BenchmarkRunState>,
}

impl RunStatePublisher {
    #[must_use]
    pub fn new() -> Self {
        let (sender, _receiver) = watch::channel(BenchmarkRunState::default());
        Self { sender }
    }

    /// New observer; sees the current snapshot immediately
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<BenchmarkRunState> {
        self.sender.subscribe()
    }

    /// Point-in-time copy of the state
    #[must_use]
    pub fn snapshot(&self) -> BenchmarkRunState {
        self.sender.borrow().clone()
    }

    /// Reset to a fresh running state
    pub fn start(&self) {
        self.sender.send_replace(BenchmarkRunState {
            is_running: true,
            ..BenchmarkRunState::default()
        });
    }

    pub fn set_total_runs(&self, total_runs: usize) {
        self.sender.send_modify(|state| state.total_runs = total_runs);
    }

    pub fn set_phase(&self, phase: RunPhase, status: String) {
        self.sender.send_modify(|state| {
            state.phase = phase;
            state.current_status = status;
        });
    }

    /// Surface a recovered failure as the current status
    pub fn record_error(&self, message: String) {
        self.sender.send_modify(|state| {
            state.errors.push(message.clone());
            state.current_status = message;
        });
    }

    /// Publish the completed repetition count and derived progress
    pub fn record_progress(&self, completed_runs: usize) {
        self.sender.send_modify(|state| {
            state.completed_runs = completed_runs;
            state.progress = if state.total_runs == 0 {
                0.0
            } else {
                completed_runs as f64 / state.total_runs as f64
            };
        });
    }

    pub fn push_result(&self, result: BenchmarkResult) {
        self.sender.send_modify(|state| state.results.push(result));
    }

    /// Return to `Idle` with a terminal status
    pub fn finish(&self, status: String) {
        self.sender.send_modify(|state| {
            state.is_running = false;
            state.phase = RunPhase::Idle;
            state.current_status = status;
        });
    }
}

impl Default for RunStatePublisher {
    fn default() -> Self {
        Self::new()
    }
}
