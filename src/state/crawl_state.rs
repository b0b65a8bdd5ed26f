use std::collections::HashSet;

use crate::report::report_model::{PathRecorder, Report, RunStats};
use crate::state::fingerprint::StateFingerprint;
use crate::state::stamp::StampStore;

/// Everything one traversal run mutates. One instance per run, passed
/// explicitly through the engine, never shared between runs.
#[derive(Debug, Default)]
pub struct CrawlState {
    visited: HashSet<StateFingerprint>,
    visit_order: Vec<StateFingerprint>,
    pub stamps: StampStore,
    pub recorder: PathRecorder,
    pub stats: RunStats,
}

impl CrawlState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `fp`; false if it was already visited.
    pub fn mark_visited(&mut self, fp: &StateFingerprint) -> bool {
        if !self.visited.insert(fp.clone()) {
            return false;
        }
        self.visit_order.push(fp.clone());
        self.stats.visited_states = self.visit_order.len();
        true
    }

    pub fn is_visited(&self, fp: &StateFingerprint) -> bool {
        self.visited.contains(fp)
    }

    /// Fingerprints in first-visit order.
    pub fn visited(&self) -> &[StateFingerprint] {
        &self.visit_order
    }

    /// Close out the run: stamp the duration and hand the inputs over.
    pub fn into_report(self, duration_ms: u128) -> Report {
        let mut stats = self.stats;
        stats.duration_ms = Some(duration_ms);
        self.recorder.finalize(stats)
    }
}
