/// Detection traces
///
/// A trace is a JSON Lines file with one record per tick:
///
/// ```text
/// {"t_ms": 0, "left": null, "right": {"x": 480.0, "y": 420.0, "area": 650.0}}
/// ```
///
/// Replaying a trace drives the scorekeeper without a camera or locator.
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;
use std::time::Duration;

use crate::detection::Detection;
use crate::error::TraceError;
use crate::game::{Observations, SideMap};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TraceRecord {
    /// Milliseconds since the start of the trace
    pub t_ms: u64,
    #[serde(default)]
    pub left: Option<Detection>,
    #[serde(default)]
    pub right: Option<Detection>,
}

impl TraceRecord {
    pub fn offset(&self) -> Duration {
        Duration::from_millis(self.t_ms)
    }

    pub fn observations(&self) -> Observations {
        SideMap::new(self.left, self.right)
    }
}

/// Parse trace lines, skipping blanks. Times must not go backwards.
pub fn parse_trace(reader: impl BufRead) -> Result<Vec<TraceRecord>, TraceError> {
    let mut records: Vec<TraceRecord> = Vec::new();

    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let line_no = index + 1;
        if line.trim().is_empty() {
            continue;
        }

        let record: TraceRecord =
            serde_json::from_str(&line).map_err(|source| TraceError::Malformed {
                line: line_no,
                source,
            })?;

        if let Some(previous) = records.last() {
            if record.t_ms < previous.t_ms {
                return Err(TraceError::NonMonotonic {
                    line: line_no,
                    t_ms: record.t_ms,
                    previous_ms: previous.t_ms,
                });
            }
        }

        records.push(record);
    }

    Ok(records)
}

pub fn read_trace(path: &Path) -> Result<Vec<TraceRecord>, TraceError> {
    let file = File::open(path)?;
    let records = parse_trace(BufReader::new(file))?;
    tracing::info!("Loaded {} trace records from {}", records.len(), path.display());
    Ok(records)
}

/// Append-only trace writer
pub struct TraceWriter<W: Write> {
    out: W,
}

impl TraceWriter<File> {
    pub fn create(path: &Path) -> Result<Self, TraceError> {
        Ok(Self::new(File::create(path)?))
    }
}

impl<W: Write> TraceWriter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn write(&mut self, record: &TraceRecord) -> Result<(), TraceError> {
        let line = serde_json::to_string(record).map_err(std::io::Error::from)?;
        writeln!(self.out, "{}", line)?;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<(), TraceError> {
        self.out.flush()?;
        Ok(())
    }
}
