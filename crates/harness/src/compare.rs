//! Per-event comparison of two shape extractors.

use std::time::Duration;

use shapes_core::momentum::Momentum;
use shapes_export::records::Record;
use shapes_thrust::{ShapeError, ShapeExtractor, ShapeResult};
use tracing::debug;

use crate::summary::RunSummary;
use crate::timing::measure;
use crate::{HarnessError, HarnessSettings};

/// Both results of one cross-validated event.
#[derive(Debug, Clone, PartialEq)]
pub struct EventComparison {
    pub index: usize,
    pub particles: usize,
    pub baseline: ShapeResult,
    pub accelerated: ShapeResult,
    pub baseline_duration: Duration,
    pub accelerated_duration: Duration,
    /// False for warm-up events, whose durations are not accumulated.
    pub timed: bool,
}

impl EventComparison {
    pub fn thrust_delta(&self) -> f64 {
        self.accelerated.thrust - self.baseline.thrust
    }

    pub fn record(&self) -> Record {
        Record {
            event: self.index,
            particles: self.particles,
            thrust_accelerated: self.accelerated.thrust,
            thrust_baseline: self.baseline.thrust,
            duration_accelerated_ns: self.accelerated_duration.as_nanos(),
            duration_baseline_ns: self.baseline_duration.as_nanos(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum EventOutcome {
    Compared(EventComparison),
    /// The event could not be analysed; it contributes nothing to the statistics.
    Skipped { index: usize, reason: ShapeError },
}

/// Drives a baseline and an accelerated extractor over the same events.
#[derive(Debug)]
pub struct ComparisonHarness<B, A> {
    baseline: B,
    accelerated: A,
    settings: HarnessSettings,
    summary: RunSummary,
}

impl<B: ShapeExtractor, A: ShapeExtractor> ComparisonHarness<B, A> {
    pub fn new(baseline: B, accelerated: A, settings: HarnessSettings) -> Self {
        Self {
            baseline,
            accelerated,
            settings,
            summary: RunSummary::default(),
        }
    }

    pub fn settings(&self) -> &HarnessSettings {
        &self.settings
    }

    pub fn summary(&self) -> &RunSummary {
        &self.summary
    }

    pub fn into_summary(self) -> RunSummary {
        self.summary
    }

    /// Analyse one event with both extractors and cross-validate the thrust values.
    pub fn compare(
        &mut self,
        index: usize,
        event: &[Momentum],
    ) -> Result<EventOutcome, HarnessError> {
        let timed = self.summary.events_seen >= self.settings.warmup_events;
        self.summary.events_seen += 1;

        let repeats = self.settings.repeats;
        let baseline = &mut self.baseline;
        let (baseline_outcome, baseline_duration) = measure(repeats, || baseline.analyze(event));
        let accelerated = &mut self.accelerated;
        let (accelerated_outcome, accelerated_duration) =
            measure(repeats, || accelerated.analyze(event));

        let (baseline, accelerated) = match (baseline_outcome, accelerated_outcome) {
            (Ok(baseline), Ok(accelerated)) => (baseline, accelerated),
            (Err(reason), _) | (_, Err(reason)) => {
                debug!(event = index, %reason, "skipping event");
                self.summary.skipped += 1;
                return Ok(EventOutcome::Skipped { index, reason });
            }
        };

        let delta = (baseline.thrust - accelerated.thrust).abs();
        if !(delta <= self.settings.tolerance) {
            return Err(HarnessError::CrossValidationMismatch {
                event: index,
                baseline: baseline.thrust,
                accelerated: accelerated.thrust,
                delta,
                tolerance: self.settings.tolerance,
            });
        }

        let comparison = EventComparison {
            index,
            particles: self.accelerated.particle_count(),
            baseline,
            accelerated,
            baseline_duration,
            accelerated_duration,
            timed,
        };
        let non_converged = comparison.baseline.diagnostics.non_converged
            + comparison.accelerated.diagnostics.non_converged;
        if non_converged > 0 {
            debug!(event = index, "refinement hit the iteration bound");
        }
        let clamped =
            comparison.baseline.diagnostics.clamped + comparison.accelerated.diagnostics.clamped;
        if clamped > 0 {
            debug!(event = index, clamped, "shape values clamped to restore ordering");
        }
        if index < self.settings.list_first {
            self.summary.listings.push(format!(
                "event {index}\n{}\n{}",
                comparison.baseline.listing(self.baseline.name()),
                comparison.accelerated.listing(self.accelerated.name()),
            ));
        }
        self.summary.record(&comparison);
        Ok(EventOutcome::Compared(comparison))
    }
}
