#![allow(dead_code)]

use std::path::PathBuf;
use std::time::Duration;

use surface_explorer::browser::driver::{DomNode, ElementRef, Rect, UiDriver, ViewId};
use surface_explorer::browser::error::DriverError;
use surface_explorer::browser::synthetic::SyntheticApp;
use surface_explorer::explorer::config::ExplorerConfig;
use surface_explorer::explorer::explorer::CancelFlag;

pub fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

pub fn load_app(name: &str) -> SyntheticApp {
    SyntheticApp::from_file(fixture_path(name)).unwrap()
}

/// Config with every wait at zero; synthetic apps react synchronously anyway.
pub fn fast_config() -> ExplorerConfig {
    ExplorerConfig {
        settle_delay_ms: 0,
        navigation_timeout_ms: 0,
        new_view_timeout_ms: 0,
        poll_interval_ms: 1,
        ..ExplorerConfig::default()
    }
}

pub fn node(key: &str, tag: &str) -> DomNode {
    DomNode {
        key: key.into(),
        tag: tag.into(),
        locator: format!("#{}", key),
        rect: Rect::new(0.0, 0.0, 100.0, 30.0),
        ..DomNode::default()
    }
}

pub fn node_at(key: &str, tag: &str, x: f64, y: f64) -> DomNode {
    DomNode {
        rect: Rect::new(x, y, 100.0, 30.0),
        ..node(key, tag)
    }
}

// ============================================================================
// ScriptedDriver: a SyntheticApp with injectable misbehaviour
// ============================================================================

/// Wraps a `SyntheticApp` to refuse back-navigation or to cancel a run after
/// a number of clicks.
pub struct ScriptedDriver {
    pub inner: SyntheticApp,
    pub refuse_back: bool,
    pub cancel_after: Option<(usize, CancelFlag)>,
    clicks: usize,
}

impl ScriptedDriver {
    pub fn new(inner: SyntheticApp) -> Self {
        Self {
            inner,
            refuse_back: false,
            cancel_after: None,
            clicks: 0,
        }
    }
}

impl UiDriver for ScriptedDriver {
    fn list_views(&mut self) -> Result<Vec<ViewId>, DriverError> {
        self.inner.list_views()
    }

    fn close_view(&mut self, view: &ViewId) -> Result<(), DriverError> {
        self.inner.close_view(view)
    }

    fn bring_to_front(&mut self, view: &ViewId) -> Result<(), DriverError> {
        self.inner.bring_to_front(view)
    }

    fn query_elements(&mut self, view: &ViewId) -> Result<Vec<DomNode>, DriverError> {
        self.inner.query_elements(view)
    }

    fn click(&mut self, element: &ElementRef) -> Result<(), DriverError> {
        self.clicks += 1;
        if let Some((after, flag)) = &self.cancel_after {
            if self.clicks >= *after {
                flag.cancel();
            }
        }
        self.inner.click(element)
    }

    fn fill(&mut self, element: &ElementRef, text: &str) -> Result<bool, DriverError> {
        self.inner.fill(element, text)
    }

    fn wait_for_navigation(&mut self, view: &ViewId, timeout: Duration) -> Result<bool, DriverError> {
        self.inner.wait_for_navigation(view, timeout)
    }

    fn current_location(&mut self, view: &ViewId) -> Result<String, DriverError> {
        self.inner.current_location(view)
    }

    fn go_back(&mut self, view: &ViewId, timeout: Duration) -> Result<bool, DriverError> {
        if self.refuse_back {
            return Ok(false);
        }
        self.inner.go_back(view, timeout)
    }

    fn text_content_digest(&mut self, view: &ViewId) -> Result<String, DriverError> {
        self.inner.text_content_digest(view)
    }

    fn settle(&mut self, delay: Duration) -> Result<(), DriverError> {
        self.inner.settle(delay)
    }

    fn observes_synchronously(&self) -> bool {
        self.inner.observes_synchronously()
    }
}
