use serde::{Deserialize, Serialize};

use crate::explorer::path::{Path, PathStep};
use crate::screen::screen_model::ElementDescriptor;

// ============================================================================
// Discovered inputs
// ============================================================================

/// A typable element and the click-path that reaches it from the start view.
///
/// `path` is a snapshot taken at recording time; later pushes and pops on
/// the live traversal path never touch it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscoveredInput {
    pub input: ElementDescriptor,
    pub path: Vec<PathStep>,
    /// Depth of the state the input was found in
    pub depth: usize,
    /// Location of the view the input was found in
    pub location: String,
    /// Whether the probe value was accepted (only set when probing is on)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub probe_accepted: Option<bool>,
}

impl DiscoveredInput {
    pub fn path_labels(&self) -> Vec<String> {
        self.path.iter().map(|s| s.label.clone()).collect()
    }
}

/// Accumulates `DiscoveredInput` entries in discovery order.
#[derive(Debug, Clone, Default)]
pub struct PathRecorder {
    entries: Vec<DiscoveredInput>,
}

impl PathRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `input` as reachable through the current `path`. Returns the
    /// entry's index.
    pub fn record(
        &mut self,
        input: ElementDescriptor,
        path: &Path,
        depth: usize,
        location: &str,
    ) -> usize {
        self.entries.push(DiscoveredInput {
            input,
            path: path.snapshot(),
            depth,
            location: location.to_string(),
            probe_accepted: None,
        });
        self.entries.len() - 1
    }

    pub fn set_probe_result(&mut self, index: usize, accepted: bool) {
        if let Some(entry) = self.entries.get_mut(index) {
            entry.probe_accepted = Some(accepted);
        }
    }

    pub fn entries(&self) -> &[DiscoveredInput] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn finalize(self, stats: RunStats) -> Report {
        Report {
            inputs: self.entries,
            stats,
        }
    }
}

// ============================================================================
// Run statistics
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStats {
    pub visited_states: usize,
    pub clicks: usize,
    pub fills: usize,
    pub max_depth_reached: usize,
    pub stale_elements: usize,
    pub action_timeouts: usize,
    pub action_failures: usize,
    pub back_failures: usize,
    pub views_closed: usize,
    pub guarded_states: usize,
    pub skipped_clickables: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u128>,
}

// ============================================================================
// Final report
// ============================================================================

/// Everything a run found, independent of any live view.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub inputs: Vec<DiscoveredInput>,
    pub stats: RunStats,
}

impl Report {
    pub fn total_inputs(&self) -> usize {
        self.inputs.len()
    }

    pub fn find(&self, label: &str) -> Option<&DiscoveredInput> {
        self.inputs.iter().find(|i| i.input.label == label)
    }

    /// Flat, tree-free records for line-delimited output.
    pub fn records(&self) -> Vec<InputRecord> {
        self.inputs.iter().map(InputRecord::from).collect()
    }
}

/// One line of the line-delimited report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputRecord {
    pub input_descriptor: String,
    pub path: Vec<String>,
    pub depth: usize,
    pub label: String,
    #[serde(default)]
    pub path_locators: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
}

impl From<&DiscoveredInput> for InputRecord {
    fn from(entry: &DiscoveredInput) -> Self {
        Self {
            input_descriptor: entry.input.locator.clone(),
            path: entry.path_labels(),
            depth: entry.depth,
            label: entry.input.label.clone(),
            path_locators: entry.path.iter().map(|s| s.locator.clone()).collect(),
            input_type: entry.input.input_type.clone(),
            placeholder: entry.input.placeholder.clone(),
        }
    }
}
