//! Destinations for per-event records.

use std::io::{self, Write};

use shapes_export::records::{Record, write_header};

/// Receives the records of listed (or all) events in event order.
pub trait RecordSink {
    fn accept(&mut self, record: Record) -> io::Result<()>;
}

impl RecordSink for Vec<Record> {
    fn accept(&mut self, record: Record) -> io::Result<()> {
        self.push(record);
        Ok(())
    }
}

/// CSV stream with the standard header.
pub struct CsvRecords<W: Write> {
    writer: W,
    written: usize,
}

impl<W: Write> CsvRecords<W> {
    pub fn new(mut writer: W) -> io::Result<Self> {
        write_header(&mut writer)?;
        Ok(Self { writer, written: 0 })
    }

    pub fn written(&self) -> usize {
        self.written
    }

    /// Flush and hand back the underlying writer.
    pub fn finish(mut self) -> io::Result<W> {
        self.writer.flush()?;
        Ok(self.writer)
    }
}

impl<W: Write> RecordSink for CsvRecords<W> {
    fn accept(&mut self, record: Record) -> io::Result<()> {
        record.write_to(&mut self.writer)?;
        self.written += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csv_records_start_with_header() {
        let mut sink = CsvRecords::new(Vec::new()).unwrap();
        sink.accept(Record {
            event: 0,
            particles: 2,
            thrust_accelerated: 1.0,
            thrust_baseline: 1.0,
            duration_accelerated_ns: 5,
            duration_baseline_ns: 9,
        })
        .unwrap();
        assert_eq!(sink.written(), 1);
        let text = String::from_utf8(sink.finish().unwrap()).unwrap();
        let mut lines = text.lines();
        assert!(lines.next().unwrap().starts_with("event,particles,"));
        assert_eq!(lines.next(), Some("0,2,1.000000000000,1.000000000000,5,9"));
        assert_eq!(lines.next(), None);
    }
}
