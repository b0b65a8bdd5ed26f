use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Run options for one exploration.
///
/// Every field has a serde default, so a YAML `explore:` section may name
/// only what it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExplorerConfig {
    /// Hard recursion limit; states deeper than this are scanned but not clicked
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    /// Pause after every click/fill before observing the result
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,

    #[serde(default = "default_navigation_timeout_ms")]
    pub navigation_timeout_ms: u64,

    #[serde(default = "default_new_view_timeout_ms")]
    pub new_view_timeout_ms: u64,

    /// Slice length while polling for navigation/new-view signals
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Past this depth, states with no new typable element are not clicked
    #[serde(default)]
    pub secondary_depth_no_input_cutoff: Option<usize>,

    /// Placeholder typed into typable fields. Never a real secret.
    #[serde(default = "default_probe_value")]
    pub probe_value: String,

    /// Fill each discovered typable with `probe_value`
    #[serde(default)]
    pub probe_inputs: bool,

    /// Characters of visible text hashed into the state fingerprint
    #[serde(default = "default_fingerprint_sample_chars")]
    pub fingerprint_sample_chars: usize,

    /// How many subordinate views deep the explorer follows popups
    #[serde(default = "default_max_view_nesting")]
    pub max_view_nesting: usize,

    /// Clickables whose label contains one of these (case-insensitive) are never clicked
    #[serde(default)]
    pub skip_labels: Vec<String>,

    /// Clickables whose label contains one of these are clicked first
    #[serde(default)]
    pub priority_labels: Vec<String>,
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
            settle_delay_ms: default_settle_delay_ms(),
            navigation_timeout_ms: default_navigation_timeout_ms(),
            new_view_timeout_ms: default_new_view_timeout_ms(),
            poll_interval_ms: default_poll_interval_ms(),
            secondary_depth_no_input_cutoff: None,
            probe_value: default_probe_value(),
            probe_inputs: false,
            fingerprint_sample_chars: default_fingerprint_sample_chars(),
            max_view_nesting: default_max_view_nesting(),
            skip_labels: Vec::new(),
            priority_labels: Vec::new(),
        }
    }
}

impl ExplorerConfig {
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_millis(self.navigation_timeout_ms)
    }

    pub fn new_view_timeout(&self) -> Duration {
        Duration::from_millis(self.new_view_timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    pub fn should_skip(&self, label: &str) -> bool {
        contains_any(label, &self.skip_labels)
    }

    pub fn is_priority(&self, label: &str) -> bool {
        contains_any(label, &self.priority_labels)
    }
}

fn contains_any(label: &str, needles: &[String]) -> bool {
    let lower = label.to_lowercase();
    needles
        .iter()
        .filter(|n| !n.is_empty())
        .any(|n| lower.contains(&n.to_lowercase()))
}

// Serde default helpers
fn default_max_depth() -> usize { 10 }
fn default_settle_delay_ms() -> u64 { 350 }
fn default_navigation_timeout_ms() -> u64 { 2_000 }
fn default_new_view_timeout_ms() -> u64 { 1_500 }
fn default_poll_interval_ms() -> u64 { 100 }
fn default_probe_value() -> String { "__probe__".to_string() }
fn default_fingerprint_sample_chars() -> usize { 200 }
fn default_max_view_nesting() -> usize { 1 }
