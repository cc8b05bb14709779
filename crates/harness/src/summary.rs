//! Accumulated statistics of a comparison run.

use std::fmt;
use std::time::Duration;

use shapes_export::histogram::{Histogram, HistogramSink};
use shapes_export::summary::RunReport;

use crate::compare::EventComparison;

const DELTA_BINS: usize = 100;

/// Running totals and difference histograms. Summaries of disjoint event ranges merge into
/// the summary of their union.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub events_seen: usize,
    pub analyzed: usize,
    pub skipped: usize,
    /// Compared events past the warm-up window.
    pub timed: usize,
    pub baseline_time: Duration,
    pub accelerated_time: Duration,
    pub max_thrust_delta: f64,
    /// Compared events in which either variant had a refinement stop at the iteration bound.
    pub events_with_unconverged: usize,
    pub non_converged: usize,
    pub fallbacks: usize,
    /// Shape values either variant capped to keep thrust ≥ major ≥ minor.
    pub clamped: usize,
    pub listings: Vec<String>,
    pub delta_thrust: Histogram,
    pub delta_oblateness: Histogram,
    pub delta_axis_z: Histogram,
    pub time_saved_us: Histogram,
}

impl Default for RunSummary {
    fn default() -> Self {
        Self {
            events_seen: 0,
            analyzed: 0,
            skipped: 0,
            timed: 0,
            baseline_time: Duration::ZERO,
            accelerated_time: Duration::ZERO,
            max_thrust_delta: 0.0,
            events_with_unconverged: 0,
            non_converged: 0,
            fallbacks: 0,
            clamped: 0,
            listings: Vec::new(),
            delta_thrust: Histogram::new("delta thrust", DELTA_BINS, -1.0, 1.0),
            delta_oblateness: Histogram::new("delta oblateness", DELTA_BINS, -1.0, 1.0),
            delta_axis_z: Histogram::new("delta thrust axis pz", DELTA_BINS, -2.0, 2.0),
            time_saved_us: Histogram::new("time saved [us]", DELTA_BINS, 0.0, 2000.0),
        }
    }
}

impl RunSummary {
    /// Fold one compared event into the totals.
    pub fn record(&mut self, comparison: &EventComparison) {
        let (baseline, accelerated) = (&comparison.baseline, &comparison.accelerated);
        self.analyzed += 1;

        let delta = comparison.thrust_delta();
        self.max_thrust_delta = self.max_thrust_delta.max(delta.abs());
        self.delta_thrust.fill(delta);
        self.delta_oblateness.fill(accelerated.oblateness - baseline.oblateness);
        self.delta_axis_z.fill(accelerated.axes[0][2] - baseline.axes[0][2]);

        let non_converged =
            baseline.diagnostics.non_converged + accelerated.diagnostics.non_converged;
        self.non_converged += non_converged;
        if non_converged > 0 {
            self.events_with_unconverged += 1;
        }
        if accelerated.diagnostics.fell_back {
            self.fallbacks += 1;
        }
        self.clamped += baseline.diagnostics.clamped + accelerated.diagnostics.clamped;

        if comparison.timed {
            self.timed += 1;
            self.baseline_time += comparison.baseline_duration;
            self.accelerated_time += comparison.accelerated_duration;
            let saved = comparison.baseline_duration.as_secs_f64()
                - comparison.accelerated_duration.as_secs_f64();
            self.time_saved_us.fill(saved * 1e6);
        }
    }

    /// Combine with the summary of a later, disjoint range of events.
    pub fn merge(&mut self, other: RunSummary) {
        self.events_seen += other.events_seen;
        self.analyzed += other.analyzed;
        self.skipped += other.skipped;
        self.timed += other.timed;
        self.baseline_time += other.baseline_time;
        self.accelerated_time += other.accelerated_time;
        self.max_thrust_delta = self.max_thrust_delta.max(other.max_thrust_delta);
        self.events_with_unconverged += other.events_with_unconverged;
        self.non_converged += other.non_converged;
        self.fallbacks += other.fallbacks;
        self.clamped += other.clamped;
        self.listings.extend(other.listings);
        self.delta_thrust.merge(&other.delta_thrust);
        self.delta_oblateness.merge(&other.delta_oblateness);
        self.delta_axis_z.merge(&other.delta_axis_z);
        self.time_saved_us.merge(&other.time_saved_us);
    }

    pub fn mean_baseline(&self) -> Duration {
        mean(self.baseline_time, self.timed)
    }

    pub fn mean_accelerated(&self) -> Duration {
        mean(self.accelerated_time, self.timed)
    }

    /// Ratio of mean baseline to mean accelerated time; zero when nothing was timed.
    pub fn speedup(&self) -> f64 {
        let accelerated = self.mean_accelerated().as_secs_f64();
        if accelerated > 0.0 {
            self.mean_baseline().as_secs_f64() / accelerated
        } else {
            0.0
        }
    }

    /// Fraction of compared events that had a refinement stop at the iteration bound.
    pub fn unconverged_fraction(&self) -> f64 {
        if self.analyzed == 0 {
            0.0
        } else {
            self.events_with_unconverged as f64 / self.analyzed as f64
        }
    }

    pub fn histograms(&self) -> [&Histogram; 4] {
        [
            &self.delta_thrust,
            &self.delta_oblateness,
            &self.delta_axis_z,
            &self.time_saved_us,
        ]
    }

    pub fn to_report(&self, events_generated: usize) -> RunReport<'_> {
        RunReport {
            events_generated,
            events_analyzed: self.analyzed,
            events_skipped: self.skipped,
            mean_duration_baseline_ns: self.mean_baseline().as_nanos() as f64,
            mean_duration_accelerated_ns: self.mean_accelerated().as_nanos() as f64,
            speedup: self.speedup(),
            max_thrust_delta: self.max_thrust_delta,
            non_converged_refinements: self.non_converged,
            accelerated_fallbacks: self.fallbacks,
            histograms: self.histograms().to_vec(),
        }
    }
}

fn mean(total: Duration, count: usize) -> Duration {
    match u32::try_from(count) {
        Ok(0) => Duration::ZERO,
        Ok(n) => total / n,
        Err(_) => Duration::from_secs_f64(total.as_secs_f64() / count as f64),
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "analysed {} of {} events ({} skipped, {} timed)",
            self.analyzed, self.events_seen, self.skipped, self.timed
        )?;
        writeln!(
            f,
            "mean time: baseline {:?}, accelerated {:?}, speedup {:.2}x",
            self.mean_baseline(),
            self.mean_accelerated(),
            self.speedup()
        )?;
        writeln!(f, "max |delta thrust| {:.3e}", self.max_thrust_delta)?;
        write!(
            f,
            "unconverged refinements {} in {} events, accelerated fallbacks {}, clamped values {}",
            self.non_converged, self.events_with_unconverged, self.fallbacks, self.clamped
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shapes_thrust::{SearchDiagnostics, ShapeResult};

    fn result(thrust: f64, non_converged: usize, fell_back: bool) -> ShapeResult {
        ShapeResult {
            thrust,
            major: 0.3,
            minor: 0.1,
            oblateness: 0.2,
            axes: [[0.0, 0.0, 1.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            diagnostics: SearchDiagnostics {
                non_converged,
                fell_back,
                ..SearchDiagnostics::default()
            },
        }
    }

    fn comparison(index: usize, timed: bool, unconverged: usize) -> EventComparison {
        EventComparison {
            index,
            particles: 10,
            baseline: result(0.9, 0, false),
            accelerated: result(0.9, unconverged, unconverged > 0),
            baseline_duration: Duration::from_micros(300),
            accelerated_duration: Duration::from_micros(100),
            timed,
        }
    }

    #[test]
    fn record_accumulates_timing_and_diagnostics() {
        let mut summary = RunSummary::default();
        summary.events_seen = 3;
        summary.record(&comparison(0, false, 0));
        summary.record(&comparison(1, true, 2));
        summary.record(&comparison(2, true, 0));
        assert_eq!(summary.analyzed, 3);
        assert_eq!(summary.timed, 2);
        assert_eq!(summary.mean_baseline(), Duration::from_micros(300));
        assert_eq!(summary.mean_accelerated(), Duration::from_micros(100));
        assert!((summary.speedup() - 3.0).abs() < 1e-9);
        assert_eq!(summary.non_converged, 2);
        assert_eq!(summary.events_with_unconverged, 1);
        assert_eq!(summary.fallbacks, 1);
        assert_eq!(summary.delta_thrust.entries, 3);
        assert_eq!(summary.time_saved_us.entries, 2);
        assert!((summary.time_saved_us.mean() - 200.0).abs() < 1e-6);
    }

    #[test]
    fn clamped_values_are_totalled_and_merged() {
        let mut clamped = comparison(0, true, 0);
        clamped.baseline.diagnostics.clamped = 1;
        clamped.accelerated.diagnostics.clamped = 2;
        let mut first = RunSummary::default();
        first.record(&clamped);
        let mut second = RunSummary::default();
        second.record(&comparison(1, true, 0));
        first.merge(second);
        assert_eq!(first.clamped, 3);
        assert!(first.to_string().contains("clamped values 3"));
    }

    #[test]
    fn empty_summary_has_no_speedup() {
        let summary = RunSummary::default();
        assert_eq!(summary.speedup(), 0.0);
        assert_eq!(summary.mean_baseline(), Duration::ZERO);
        assert_eq!(summary.unconverged_fraction(), 0.0);
    }

    #[test]
    fn merge_equals_recording_into_one() {
        let events: Vec<_> = (0..6).map(|i| comparison(i, i % 2 == 0, i % 3)).collect();
        let mut whole = RunSummary::default();
        for event in &events {
            whole.record(event);
        }
        let mut left = RunSummary::default();
        let mut right = RunSummary::default();
        for event in &events[..2] {
            left.record(event);
        }
        for event in &events[2..] {
            right.record(event);
        }
        left.merge(right);
        assert_eq!(left.analyzed, whole.analyzed);
        assert_eq!(left.timed, whole.timed);
        assert_eq!(left.baseline_time, whole.baseline_time);
        assert_eq!(left.non_converged, whole.non_converged);
        assert_eq!(left.delta_thrust.bins, whole.delta_thrust.bins);
        assert_eq!(left.time_saved_us.bins, whole.time_saved_us.bins);
    }

    #[test]
    fn report_carries_all_histograms() {
        let mut summary = RunSummary::default();
        summary.record(&comparison(0, true, 0));
        let report = summary.to_report(5);
        assert_eq!(report.events_generated, 5);
        assert_eq!(report.events_analyzed, 1);
        assert_eq!(report.histograms.len(), 4);
        assert_eq!(report.histograms[0].title, "delta thrust");
        assert!(summary.to_string().contains("speedup 3.00x"));
    }
}
