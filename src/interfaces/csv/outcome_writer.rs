use crate::error::Result;
use serde::Serialize;
use std::io::Write;

/// Result of one scenario step, as printed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepOutcome {
    pub step: String,
    pub op: String,
    pub outcome: String,
    pub transaction_id: Option<String>,
    pub stan: Option<u32>,
    pub batch: Option<u32>,
    /// JSON for REST requests, hex for framed messages.
    pub envelope: Option<String>,
}

/// Writes step outcomes as CSV with a header row.
pub struct OutcomeWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> OutcomeWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(sink),
        }
    }

    pub fn write(&mut self, outcome: &StepOutcome) -> Result<()> {
        self.writer.serialize(outcome)?;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}
