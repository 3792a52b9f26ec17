//! Services that sit beside the orchestrator
//!
//! Run state publishing and result reporting are kept apart from the
//! benchmark loop so that different frontends can observe and present runs
//! their own way.

pub mod progress;
pub mod report;

pub use progress::{BenchmarkRunState, RunPhase, RunStatePublisher};
pub use report::{BenchmarkSummary, QualitySummary, StrategySummary, SummaryReporter};
