//! Sequential and sharded drivers over a stream of events.

use rayon::ThreadPoolBuilder;
use rayon::prelude::*;
use shapes_core::momentum::Momentum;
use shapes_export::records::Record;
use shapes_thrust::ShapeExtractor;
use tracing::{debug, info, warn};

use crate::compare::{ComparisonHarness, EventOutcome};
use crate::sink::RecordSink;
use crate::summary::RunSummary;
use crate::{HarnessError, HarnessSettings};

/// Share of events with unconverged refinements above which the run is flagged.
const UNCONVERGED_WARN_FRACTION: f64 = 0.01;

/// Smallest shard handed to a worker.
const MIN_SHARD: usize = 64;

/// Compare every event in order, feeding recorded events to `sink`.
///
/// Stops at the first cross-validation mismatch or sink failure.
pub fn run_sequential<B, A, I, E>(
    harness: &mut ComparisonHarness<B, A>,
    events: I,
    sink: &mut dyn RecordSink,
) -> Result<(), HarnessError>
where
    B: ShapeExtractor,
    A: ShapeExtractor,
    I: IntoIterator<Item = (usize, E)>,
    E: AsRef<[Momentum]>,
{
    for (index, event) in events {
        if let EventOutcome::Compared(comparison) = harness.compare(index, event.as_ref())? {
            if harness.settings().records(index) {
                sink.accept(comparison.record())?;
            }
        }
    }
    report(harness.summary());
    Ok(())
}

/// Compare `events` on `workers` threads, each shard with its own pair of extractors.
///
/// Shards are contiguous and merged in event order, so the summary and the records match a
/// sequential run except for timings. On failure the error of the lowest-indexed failing
/// event is returned and nothing is written to `sink`.
pub fn run_sharded<B, A, E, F>(
    events: &[(usize, E)],
    workers: usize,
    make: F,
    settings: &HarnessSettings,
    sink: &mut dyn RecordSink,
) -> Result<RunSummary, HarnessError>
where
    B: ShapeExtractor,
    A: ShapeExtractor,
    E: AsRef<[Momentum]> + Sync,
    F: Fn() -> (B, A) + Sync,
{
    let workers = workers.max(1);
    let pool = ThreadPoolBuilder::new().num_threads(workers).build()?;
    let shard = events.len().div_ceil(workers).max(MIN_SHARD);
    debug!(workers, shard, events = events.len(), "starting sharded run");

    let shards: Vec<_> = pool.install(|| {
        events
            .par_chunks(shard)
            .map(|chunk| -> Result<(RunSummary, Vec<Record>), HarnessError> {
                let (baseline, accelerated) = make();
                let mut harness = ComparisonHarness::new(baseline, accelerated, settings.clone());
                let mut records = Vec::new();
                for (index, event) in chunk {
                    if let EventOutcome::Compared(comparison) =
                        harness.compare(*index, event.as_ref())?
                    {
                        if settings.records(*index) {
                            records.push(comparison.record());
                        }
                    }
                }
                Ok((harness.into_summary(), records))
            })
            .collect::<Vec<_>>()
    });

    let mut summary = RunSummary::default();
    let mut merged = Vec::new();
    for outcome in shards {
        let (part, records) = outcome?;
        summary.merge(part);
        merged.extend(records);
    }
    for record in merged {
        sink.accept(record)?;
    }
    report(&summary);
    Ok(summary)
}

fn report(summary: &RunSummary) {
    info!(
        analyzed = summary.analyzed,
        skipped = summary.skipped,
        speedup = summary.speedup(),
        max_thrust_delta = summary.max_thrust_delta,
        "comparison finished"
    );
    if summary.unconverged_fraction() > UNCONVERGED_WARN_FRACTION {
        warn!(
            events = summary.events_with_unconverged,
            refinements = summary.non_converged,
            "refinement iteration bound reached in more than 1% of events"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shapes_thrust::{AcceleratedThrust, BaselineThrust};

    fn corpus(count: usize) -> Vec<(usize, Vec<Momentum>)> {
        (0..count)
            .map(|i| {
                let a = 1.0 + (i % 7) as f64;
                let b = 0.5 + (i % 3) as f64;
                let event = vec![
                    Momentum::from_vector([a, 0.2, b]),
                    Momentum::from_vector([-a, -0.2, -b]),
                    Momentum::from_vector([0.1, b, -0.3]),
                    Momentum::from_vector([-0.1, -b, 0.3]),
                ];
                (i, event)
            })
            .collect()
    }

    fn pair() -> (BaselineThrust, AcceleratedThrust) {
        (BaselineThrust::default(), AcceleratedThrust::default())
    }

    #[test]
    fn sequential_run_records_listed_events() {
        let events = corpus(10);
        let (baseline, accelerated) = pair();
        let mut harness = ComparisonHarness::new(baseline, accelerated, HarnessSettings::default());
        let mut records: Vec<Record> = Vec::new();
        run_sequential(
            &mut harness,
            events.iter().map(|(i, e)| (*i, e.as_slice())),
            &mut records,
        )
        .unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(
            records.iter().map(|r| r.event).collect::<Vec<_>>(),
            vec![0, 1, 2]
        );
        assert_eq!(harness.summary().analyzed, 10);
    }

    #[test]
    fn sharded_run_matches_sequential() {
        let events = corpus(300);
        let settings = HarnessSettings {
            record_every: true,
            ..HarnessSettings::default()
        };

        let (baseline, accelerated) = pair();
        let mut harness = ComparisonHarness::new(baseline, accelerated, settings.clone());
        let mut sequential: Vec<Record> = Vec::new();
        run_sequential(&mut harness, events.iter().cloned(), &mut sequential).unwrap();
        let expected = harness.into_summary();

        let mut sharded: Vec<Record> = Vec::new();
        let summary = run_sharded(&events, 4, pair, &settings, &mut sharded).unwrap();

        assert_eq!(summary.analyzed, expected.analyzed);
        assert_eq!(summary.listings, expected.listings);
        assert_eq!(summary.delta_thrust.bins, expected.delta_thrust.bins);
        assert_eq!(sharded.len(), sequential.len());
        for (a, b) in sharded.iter().zip(&sequential) {
            assert_eq!(a.event, b.event);
            assert_eq!(a.thrust_baseline, b.thrust_baseline);
            assert_eq!(a.thrust_accelerated, b.thrust_accelerated);
        }
    }

    #[test]
    fn sharded_run_skips_degenerate_events() {
        let mut events = corpus(5);
        events.push((5, vec![Momentum::from_vector([0.0, 0.0, 0.0]); 3]));
        let mut records: Vec<Record> = Vec::new();
        let summary =
            run_sharded(&events, 2, pair, &HarnessSettings::default(), &mut records).unwrap();
        assert_eq!(summary.analyzed, 5);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.events_seen, 6);
    }
}
