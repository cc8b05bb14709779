//! Export helpers: per-event CSV records, histogram sinks, and JSON run summaries.

pub mod records {
    use std::fs::{self, File};
    use std::io::{self, BufWriter, Write};
    use std::path::Path;

    const HEADER: &str = "event,particles,thrust_accelerated,thrust_baseline,duration_accelerated_ns,duration_baseline_ns";

    /// Buffered writer for `path`; `-` selects stdout. Parent directories are created.
    pub fn writer_for_path(path: &Path) -> io::Result<Box<dyn Write + Send>> {
        if path == Path::new("-") {
            return Ok(Box::new(BufWriter::new(io::stdout())));
        }
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let file = File::create(path)?;
        Ok(Box::new(BufWriter::new(file)))
    }

    /// Column header of the per-event record stream.
    pub fn write_header(writer: &mut dyn Write) -> io::Result<()> {
        writeln!(writer, "{}", HEADER)
    }

    /// CSV row emitted for one cross-validated event.
    #[derive(Debug, Clone, PartialEq)]
    pub struct Record {
        pub event: usize,
        pub particles: usize,
        pub thrust_accelerated: f64,
        pub thrust_baseline: f64,
        pub duration_accelerated_ns: u128,
        pub duration_baseline_ns: u128,
    }

    impl Record {
        /// One CSV line in header column order; thrust values carry 12 decimals.
        pub fn write_to(&self, writer: &mut dyn Write) -> io::Result<()> {
            writeln!(
                writer,
                "{},{},{:.12},{:.12},{},{}",
                self.event,
                self.particles,
                self.thrust_accelerated,
                self.thrust_baseline,
                self.duration_accelerated_ns,
                self.duration_baseline_ns,
            )
        }
    }
}

pub mod histogram {
    use std::fmt;

    use serde::Serialize;

    /// Anything that accepts scalar samples.
    pub trait HistogramSink {
        fn fill(&mut self, value: f64);
    }

    /// Fixed-bin histogram with under/overflow and running moments.
    #[derive(Debug, Clone, PartialEq, Serialize)]
    pub struct Histogram {
        pub title: String,
        pub low: f64,
        pub high: f64,
        pub bins: Vec<u64>,
        pub underflow: u64,
        pub overflow: u64,
        pub entries: u64,
        sum: f64,
        sum_sq: f64,
    }

    impl Histogram {
        /// A histogram of `bins` equal-width bins over `[low, high)`.
        pub fn new(title: impl Into<String>, bins: usize, low: f64, high: f64) -> Self {
            Self {
                title: title.into(),
                low,
                high,
                bins: vec![0; bins.max(1)],
                underflow: 0,
                overflow: 0,
                entries: 0,
                sum: 0.0,
                sum_sq: 0.0,
            }
        }

        pub fn bin_width(&self) -> f64 {
            (self.high - self.low) / self.bins.len() as f64
        }

        pub fn mean(&self) -> f64 {
            if self.entries == 0 {
                0.0
            } else {
                self.sum / self.entries as f64
            }
        }

        pub fn rms(&self) -> f64 {
            if self.entries == 0 {
                return 0.0;
            }
            let mean = self.mean();
            (self.sum_sq / self.entries as f64 - mean * mean).max(0.0).sqrt()
        }

        /// Add another histogram with identical binning into this one.
        ///
        /// Returns `false` and leaves `self` untouched when the binnings differ.
        pub fn merge(&mut self, other: &Histogram) -> bool {
            if self.bins.len() != other.bins.len() || self.low != other.low || self.high != other.high {
                return false;
            }
            for (mine, theirs) in self.bins.iter_mut().zip(&other.bins) {
                *mine += theirs;
            }
            self.underflow += other.underflow;
            self.overflow += other.overflow;
            self.entries += other.entries;
            self.sum += other.sum;
            self.sum_sq += other.sum_sq;
            true
        }
    }

    impl HistogramSink for Histogram {
        fn fill(&mut self, value: f64) {
            self.entries += 1;
            self.sum += value;
            self.sum_sq += value * value;
            if value < self.low {
                self.underflow += 1;
                return;
            }
            let span = self.high - self.low;
            let index = ((value - self.low) / span * self.bins.len() as f64).floor();
            if !(index < self.bins.len() as f64) {
                self.overflow += 1;
                return;
            }
            self.bins[index as usize] += 1;
        }
    }

    impl fmt::Display for Histogram {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            const BAR: usize = 50;
            writeln!(
                f,
                " {}  entries {}  mean {:.4e}  rms {:.4e}",
                self.title,
                self.entries,
                self.mean(),
                self.rms()
            )?;
            let peak = self.bins.iter().copied().max().unwrap_or(0).max(1);
            let width = self.bin_width();
            for (i, &count) in self.bins.iter().enumerate() {
                if count == 0 {
                    continue;
                }
                let bar = (count as f64 / peak as f64 * BAR as f64).ceil() as usize;
                writeln!(
                    f,
                    "  {:>11.4e} {:>9}  {}",
                    self.low + width * i as f64,
                    count,
                    "*".repeat(bar)
                )?;
            }
            writeln!(f, "  underflow {}  overflow {}", self.underflow, self.overflow)
        }
    }
}

pub mod summary {
    use serde::Serialize;
    use serde_json::to_writer_pretty;
    use std::fs::{self, File};
    use std::io;
    use std::path::Path;

    use crate::histogram::Histogram;

    /// JSON sidecar describing a finished comparison run.
    #[derive(Debug, Clone, Serialize)]
    pub struct RunReport<'a> {
        pub events_generated: usize,
        pub events_analyzed: usize,
        pub events_skipped: usize,
        pub mean_duration_baseline_ns: f64,
        pub mean_duration_accelerated_ns: f64,
        pub speedup: f64,
        pub max_thrust_delta: f64,
        pub non_converged_refinements: usize,
        pub accelerated_fallbacks: usize,
        pub histograms: Vec<&'a Histogram>,
    }

    /// Write the run report as pretty-printed JSON, creating parent directories.
    pub fn write_report(path: &Path, report: &RunReport<'_>) -> io::Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        to_writer_pretty(File::create(path)?, report)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::histogram::{Histogram, HistogramSink};
    use super::records::{Record, write_header};
    use super::summary::{RunReport, write_report};

    #[test]
    fn record_matches_header_columns() {
        let mut buffer = Vec::new();
        write_header(&mut buffer).unwrap();
        Record {
            event: 4,
            particles: 17,
            thrust_accelerated: 0.75,
            thrust_baseline: 0.75,
            duration_accelerated_ns: 1200,
            duration_baseline_ns: 56000,
        }
        .write_to(&mut buffer)
        .unwrap();
        let text = String::from_utf8(buffer).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].split(',').count(), lines[1].split(',').count());
        assert_eq!(lines[1], "4,17,0.750000000000,0.750000000000,1200,56000");
    }

    #[test]
    fn histogram_bins_and_overflows() {
        let mut h = Histogram::new("delta thrust", 100, -1.0, 1.0);
        for v in [-1.5, -1.0, 0.0, 0.0, 0.999, 1.0, 3.0] {
            h.fill(v);
        }
        assert_eq!(h.entries, 7);
        assert_eq!(h.underflow, 1);
        assert_eq!(h.overflow, 2);
        assert_eq!(h.bins[0], 1);
        assert_eq!(h.bins[50], 2);
        assert_eq!(h.bins[99], 1);
    }

    #[test]
    fn histogram_moments() {
        let mut h = Histogram::new("x", 10, 0.0, 10.0);
        for v in [2.0, 4.0, 6.0] {
            h.fill(v);
        }
        assert!((h.mean() - 4.0).abs() < 1e-12);
        assert!((h.rms() - (8.0_f64 / 3.0).sqrt()).abs() < 1e-12);
    }

    #[test]
    fn merge_requires_matching_binning() {
        let mut a = Histogram::new("a", 4, 0.0, 4.0);
        let mut b = Histogram::new("b", 4, 0.0, 4.0);
        a.fill(0.5);
        b.fill(3.5);
        b.fill(9.0);
        assert!(a.merge(&b));
        assert_eq!(a.bins, vec![1, 0, 0, 1]);
        assert_eq!(a.overflow, 1);
        assert_eq!(a.entries, 3);
        assert!(!a.merge(&Histogram::new("c", 8, 0.0, 4.0)));
        assert_eq!(a.entries, 3);
    }

    #[test]
    fn display_lists_only_filled_bins() {
        let mut h = Histogram::new("delta oblateness", 4, 0.0, 4.0);
        h.fill(1.5);
        let text = h.to_string();
        assert!(text.starts_with(" delta oblateness  entries 1"));
        assert_eq!(text.lines().filter(|l| l.contains('*')).count(), 1);
    }

    #[test]
    fn report_is_written_as_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/summary.json");
        let mut h = Histogram::new("delta thrust", 2, -1.0, 1.0);
        h.fill(0.0);
        let report = RunReport {
            events_generated: 10,
            events_analyzed: 9,
            events_skipped: 1,
            mean_duration_baseline_ns: 100.0,
            mean_duration_accelerated_ns: 10.0,
            speedup: 10.0,
            max_thrust_delta: 0.0,
            non_converged_refinements: 0,
            accelerated_fallbacks: 0,
            histograms: vec![&h],
        };
        write_report(&path, &report).unwrap();
        let value: serde_json::Value =
            serde_json::from_reader(std::fs::File::open(&path).unwrap()).unwrap();
        assert_eq!(value["events_analyzed"], 9);
        assert_eq!(value["histograms"][0]["title"], "delta thrust");
        assert_eq!(value["histograms"][0]["bins"][1], 1);
    }
}
