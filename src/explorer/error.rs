use crate::browser::error::DriverError;
use crate::report::report_model::Report;

#[derive(Debug, thiserror::Error)]
pub enum ExploreError {
    /// The view or the whole browser became unusable
    #[error("session lost: {0}")]
    SessionLost(#[source] DriverError),

    /// Stopped through a `CancelFlag` between two traversal steps
    #[error("run cancelled")]
    Cancelled,
}

/// A run that ended early, with whatever had been discovered up to that point.
#[derive(Debug, thiserror::Error)]
#[error("exploration aborted: {error}")]
pub struct RunAborted {
    #[source]
    pub error: ExploreError,
    pub partial: Report,
}
