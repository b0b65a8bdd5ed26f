use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::sync::Mutex;

use tracing::warn;

use crate::trace::trace::TraceEvent;

/// Append-only JSONL audit trail of every state and action in a run.
///
/// Write failures are logged and swallowed; the trail never stops a run.
pub struct TraceLogger {
    file: Mutex<BufWriter<File>>,
    path: String,
}

impl TraceLogger {
    pub fn create(path: &str) -> std::io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(BufWriter::new(file)),
            path: path.to_string(),
        })
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn log(&self, event: &TraceEvent) {
        let json = match serde_json::to_string(event) {
            Ok(j) => j,
            Err(e) => {
                warn!(error = %e, "failed to serialize trace event");
                return;
            }
        };

        let mut file = match self.file.lock() {
            Ok(f) => f,
            Err(e) => {
                warn!(error = %e, "trace logger lock poisoned");
                return;
            }
        };

        if let Err(e) = writeln!(file, "{}", json) {
            warn!(path = %self.path, error = %e, "failed to write trace event");
        }
    }

    pub fn flush(&self) {
        if let Ok(mut file) = self.file.lock() {
            if let Err(e) = file.flush() {
                warn!(path = %self.path, error = %e, "failed to flush trace file");
            }
        }
    }
}

impl Drop for TraceLogger {
    fn drop(&mut self) {
        self.flush();
    }
}
