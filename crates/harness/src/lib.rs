//! Cross-validation harness running the baseline and accelerated optimizers side by side.
//!
//! The harness is written once against [`ShapeExtractor`](shapes_thrust::ShapeExtractor) and
//! instantiated with the two optimizer variants. A thrust disagreement beyond tolerance is
//! fatal; events neither variant can analyse are skipped.

pub mod compare;
pub mod run;
pub mod sink;
pub mod summary;
pub mod timing;

pub use compare::{ComparisonHarness, EventComparison, EventOutcome};
pub use run::{run_sequential, run_sharded};
pub use sink::{CsvRecords, RecordSink};
pub use summary::RunSummary;

use shapes_config::RunConfig;
use shapes_core::tolerance;
use thiserror::Error;

/// Knobs of one comparison run.
#[derive(Debug, Clone, PartialEq)]
pub struct HarnessSettings {
    /// Largest accepted |T_baseline − T_accelerated|.
    pub tolerance: f64,
    /// Events below this index get a listing and a record.
    pub list_first: usize,
    /// Record every event rather than only the listed ones.
    pub record_every: bool,
    /// Leading events per harness whose timings are discarded.
    pub warmup_events: usize,
    /// Optimizer calls averaged into one timing sample.
    pub repeats: u32,
}

impl Default for HarnessSettings {
    fn default() -> Self {
        Self {
            tolerance: tolerance::CROSS_VALIDATION,
            list_first: 3,
            record_every: false,
            warmup_events: 0,
            repeats: 1,
        }
    }
}

impl From<&RunConfig> for HarnessSettings {
    fn from(config: &RunConfig) -> Self {
        Self {
            tolerance: config.tolerance.cross_validation,
            list_first: config.harness.list_first,
            record_every: config.harness.record_every,
            warmup_events: config.harness.warmup_events,
            repeats: config.harness.repeats,
        }
    }
}

impl HarnessSettings {
    /// Whether the event with this index is written to the record sink.
    pub fn records(&self, index: usize) -> bool {
        self.record_every || index < self.list_first
    }
}

#[derive(Debug, Error)]
pub enum HarnessError {
    #[error(
        "cross-validation mismatch in event {event}: baseline thrust {baseline:.12}, accelerated thrust {accelerated:.12}, |delta| {delta:.3e} exceeds {tolerance:.1e}"
    )]
    CrossValidationMismatch {
        event: usize,
        baseline: f64,
        accelerated: f64,
        delta: f64,
        tolerance: f64,
    },
    #[error("failed to emit event record: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to start worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}
