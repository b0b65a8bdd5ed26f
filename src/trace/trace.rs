use serde::Serialize;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::browser::driver::ViewId;
use crate::explorer::executor::ActionOutcome;
use crate::explorer::path::Path;
use crate::state::fingerprint::StateFingerprint;

/// What a trace line is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TraceKind {
    StateEntered,
    StateRevisited,
    Action,
    Backtrack,
    Guarded,
}

/// One line of the audit trail.
#[derive(Debug, Serialize)]
pub struct TraceEvent {
    pub timestamp_ms: u128,
    pub kind: TraceKind,
    pub depth: usize,
    pub view: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,

    pub path: Vec<String>,
}

impl TraceEvent {
    pub fn now(kind: TraceKind, view: &ViewId, depth: usize) -> Self {
        Self {
            timestamp_ms: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_millis())
                .unwrap_or_default(),
            kind,
            depth,
            view: view.to_string(),
            fingerprint: None,
            label: None,
            outcome: None,
            note: None,
            path: vec![],
        }
    }

    pub fn with_fingerprint(mut self, fp: &StateFingerprint) -> Self {
        self.fingerprint = Some(fp.to_string());
        self
    }

    pub fn with_label(mut self, label: impl ToString) -> Self {
        self.label = Some(label.to_string());
        self
    }

    pub fn with_outcome(mut self, outcome: &ActionOutcome) -> Self {
        self.outcome = Some(outcome.to_string());
        self
    }

    pub fn with_note(mut self, note: impl ToString) -> Self {
        self.note = Some(note.to_string());
        self
    }

    pub fn with_path(mut self, path: &Path) -> Self {
        self.path = path.labels();
        self
    }
}
