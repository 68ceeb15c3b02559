//! Optional record sink: best-effort delivery of finished records to an
//! external store.
//!
//! The pipeline treats sink trouble as non-fatal. The combined artifacts
//! are already on disk by the time records are submitted, so a sink error
//! is logged by the caller and the run still succeeds.
//!
//! [`JsonlSink`] is the built-in implementation: one flat JSON document per
//! line, the shape an indexing service bulk-loads directly.
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::record::Record;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("sink I/O: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialize record: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Destination for finished records. Errors are reported to the operator,
/// never escalated into a run failure.
pub trait RecordSink {
    fn submit(&mut self, record: &Record) -> Result<(), SinkError>;

    /// Deliver many records, stopping at the first error.
    fn submit_batch(&mut self, records: &[Record]) -> Result<(), SinkError> {
        for record in records {
            self.submit(record)?;
        }
        Ok(())
    }

    /// Flush any buffered state.
    fn finish(&mut self) -> Result<(), SinkError>;
}

/// Newline-delimited JSON spool file.
#[derive(Debug)]
pub struct JsonlSink {
    path: PathBuf,
    out: BufWriter<File>,
    submitted: usize,
}

impl JsonlSink {
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self, SinkError> {
        let path = path.as_ref().to_path_buf();
        let out = BufWriter::new(File::create(&path)?);
        Ok(Self {
            path,
            out,
            submitted: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn submitted(&self) -> usize {
        self.submitted
    }
}

impl RecordSink for JsonlSink {
    fn submit(&mut self, record: &Record) -> Result<(), SinkError> {
        let line = serde_json::to_string(record)?;
        writeln!(self.out, "{line}")?;
        self.submitted += 1;
        Ok(())
    }

    fn finish(&mut self) -> Result<(), SinkError> {
        self.out.flush()?;
        Ok(())
    }
}
