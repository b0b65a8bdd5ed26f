use crate::browser::driver::ViewId;

#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    /// The targeted node no longer exists, or its view navigated since it was scanned
    #[error("Stale element reference '{key}'")]
    StaleElement { key: String },

    /// A click/fill/back operation did not settle within its bounded wait
    #[error("{operation} timed out after {timeout_ms}ms")]
    Timeout { operation: String, timeout_ms: u64 },

    /// The browser (or the view the explorer depends on) is gone
    #[error("Session lost: {0}")]
    SessionLost(String),

    /// A view id the driver does not know about
    #[error("Unknown view '{0}'")]
    UnknownView(ViewId),

    /// Node.js helper failed to spawn
    #[error("Failed to spawn {script} (is Node.js installed?): {source}")]
    SubprocessSpawn {
        script: String,
        #[source]
        source: std::io::Error,
    },

    /// Reading from / writing to the helper process failed
    #[error("Session I/O error: {0}")]
    SessionIO(String),

    /// The helper answered `ok: false`
    #[error("Browser command '{command}' failed: {error}")]
    SessionProtocol { command: String, error: String },

    #[error("JSON parse error ({context}): {source}")]
    JsonParse {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("JSON serialize error ({context}): {source}")]
    JsonSerialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },
}

impl DriverError {
    /// True when the channel to the browser is unusable and the run cannot continue.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            DriverError::SessionLost(_)
                | DriverError::SubprocessSpawn { .. }
                | DriverError::SessionIO(_)
                | DriverError::JsonParse { .. }
                | DriverError::JsonSerialize { .. }
        )
    }

    pub fn is_stale(&self) -> bool {
        matches!(self, DriverError::StaleElement { .. })
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, DriverError::Timeout { .. })
    }
}
