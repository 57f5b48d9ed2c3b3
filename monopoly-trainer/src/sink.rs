//! Turn sinks used by the trainer: the CSV turn log and a fan-out adapter.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use monopoly_game::{TURN_RECORD_COLUMNS, TurnRecord, TurnSink};

/// Streams every turn record as one CSV row.
///
/// Write failures are held until [`CsvTurnLog::finish`] so the learner's
/// sink interface stays infallible.
pub struct CsvTurnLog<W: Write> {
    writer: csv::Writer<W>,
    rows: u64,
    error: Option<csv::Error>,
}

impl CsvTurnLog<BufWriter<File>> {
    pub fn create(path: &Path) -> Result<Self> {
        let file =
            File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
        Self::from_writer(BufWriter::new(file))
    }
}

impl<W: Write> CsvTurnLog<W> {
    pub fn from_writer(inner: W) -> Result<Self> {
        let mut writer = csv::Writer::from_writer(inner);
        writer
            .write_record(TURN_RECORD_COLUMNS)
            .context("failed to write CSV header")?;
        Ok(Self {
            writer,
            rows: 0,
            error: None,
        })
    }

    /// Flush the log, surfacing the first write failure if any occurred.
    pub fn finish(mut self) -> Result<u64> {
        if let Some(err) = self.error.take() {
            return Err(err).context("failed to write turn record");
        }
        self.writer.flush().context("failed to flush turn log")?;
        Ok(self.rows)
    }

    #[cfg(test)]
    fn into_inner(self) -> Result<W> {
        self.writer
            .into_inner()
            .map_err(|err| anyhow::anyhow!("failed to recover CSV writer: {err}"))
    }
}

impl<W: Write> TurnSink for CsvTurnLog<W> {
    fn record(&mut self, record: &TurnRecord) {
        if self.error.is_some() {
            return;
        }
        match self.writer.write_record(record.to_row()) {
            Ok(()) => self.rows += 1,
            Err(err) => self.error = Some(err),
        }
    }
}

/// Forwards each record to several sinks in order.
#[derive(Default)]
pub struct FanOut<'a> {
    sinks: Vec<&'a mut dyn TurnSink>,
}

impl<'a> FanOut<'a> {
    pub fn new() -> Self {
        Self { sinks: Vec::new() }
    }

    #[must_use]
    pub fn with(mut self, sink: &'a mut dyn TurnSink) -> Self {
        self.sinks.push(sink);
        self
    }
}

impl TurnSink for FanOut<'_> {
    fn record(&mut self, record: &TurnRecord) {
        for sink in &mut self.sinks {
            sink.record(record);
        }
    }
}
