use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::browser::error::DriverError;

/// Opaque id of a live top-level view (tab, window or popup).
///
/// The explorer never owns the view it starts from; it only closes views
/// that appeared as the result of one of its own actions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ViewId(pub String);

impl ViewId {
    pub fn new(id: impl Into<String>) -> Self {
        ViewId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ViewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Reference to one node of a view, valid for a single navigation epoch.
///
/// Drivers must answer `StaleElement` once the view's epoch has moved on or
/// the key no longer resolves.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ElementRef {
    pub view: ViewId,
    pub epoch: u64,
    pub key: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    pub fn has_area(&self) -> bool {
        self.width > 0.0 && self.height > 0.0
    }
}

/// Computed style properties relevant to visibility.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeStyle {
    #[serde(default = "default_display")]
    pub display: String,
    #[serde(default = "default_visibility")]
    pub visibility: String,
    #[serde(default = "default_opacity")]
    pub opacity: f64,
}

impl Default for NodeStyle {
    fn default() -> Self {
        Self {
            display: default_display(),
            visibility: default_visibility(),
            opacity: default_opacity(),
        }
    }
}

fn default_display() -> String { "block".to_string() }
fn default_visibility() -> String { "visible".to_string() }
fn default_opacity() -> f64 { 1.0 }

/// Raw interactive-candidate node as reported by a driver.
///
/// Drivers report every node matching the clickable or typable selector
/// families; visibility and classification happen in `screen::classifier`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DomNode {
    /// Stable per-element identifier, unique within the session
    pub key: String,
    /// Navigation epoch of the owning view when the node was scanned
    #[serde(default)]
    pub epoch: u64,
    pub tag: String,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(rename = "type", default)]
    pub input_type: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(rename = "ariaLabel", default)]
    pub aria_label: Option<String>,
    #[serde(default)]
    pub placeholder: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(rename = "contentEditable", default)]
    pub content_editable: bool,
    #[serde(default)]
    pub disabled: bool,
    /// `onclick` attribute or a "clickable"-style class was present
    #[serde(rename = "clickHint", default)]
    pub click_hint: bool,
    #[serde(default)]
    pub href: Option<String>,
    /// Unique CSS selector, reconstructable after the session ends
    #[serde(default)]
    pub locator: String,
    #[serde(default)]
    pub rect: Rect,
    #[serde(default)]
    pub style: NodeStyle,
}

/// The live UI the explorer drives.
///
/// Covers both the session-level operations (views) and the per-view
/// operations. Every wait is bounded by the timeout passed in.
pub trait UiDriver {
    fn list_views(&mut self) -> Result<Vec<ViewId>, DriverError>;

    fn close_view(&mut self, view: &ViewId) -> Result<(), DriverError>;

    fn bring_to_front(&mut self, view: &ViewId) -> Result<(), DriverError>;

    fn query_elements(&mut self, view: &ViewId) -> Result<Vec<DomNode>, DriverError>;

    fn click(&mut self, element: &ElementRef) -> Result<(), DriverError>;

    /// Returns false when the view refused the value (read-only, masked, ...).
    fn fill(&mut self, element: &ElementRef, text: &str) -> Result<bool, DriverError>;

    /// True if the view navigated since the last call, waiting up to `timeout`.
    fn wait_for_navigation(&mut self, view: &ViewId, timeout: Duration) -> Result<bool, DriverError>;

    fn current_location(&mut self, view: &ViewId) -> Result<String, DriverError>;

    fn go_back(&mut self, view: &ViewId, timeout: Duration) -> Result<bool, DriverError>;

    fn text_content_digest(&mut self, view: &ViewId) -> Result<String, DriverError>;

    fn settle(&mut self, delay: Duration) -> Result<(), DriverError> {
        std::thread::sleep(delay);
        Ok(())
    }

    /// Drivers whose side effects are observable as soon as the call returns
    /// let the signal wait probe once instead of polling to the deadline.
    fn observes_synchronously(&self) -> bool {
        false
    }
}
