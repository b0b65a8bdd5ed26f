use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::browser::driver::{DomNode, ElementRef, NodeStyle, Rect, UiDriver, ViewId};
use crate::browser::error::DriverError;

// ============================================================================
// Fixture model (YAML)
// ============================================================================

/// A UI graph described in YAML: named screens, each with candidate nodes
/// and what clicking them does.
///
/// ```yaml
/// start: home
/// screens:
///   home:
///     url: ext://wallet/home
///     text: Balance 0 ETH
///     elements:
///       - key: next
///         tag: button
///         text: Next
///         on_click: { navigate: send }
///       - key: amount
///         tag: input
///         placeholder: Amount
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppSpec {
    pub start: String,
    pub screens: BTreeMap<String, ScreenSpec>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScreenSpec {
    /// Defaults to `synthetic://<screen name>`
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub elements: Vec<NodeSpec>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NodeSpec {
    pub key: String,
    pub tag: String,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(rename = "type", default)]
    pub input_type: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub aria_label: Option<String>,
    #[serde(default)]
    pub placeholder: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub content_editable: bool,
    #[serde(default)]
    pub disabled: bool,
    #[serde(default)]
    pub click_hint: bool,
    #[serde(default)]
    pub href: Option<String>,
    #[serde(default)]
    pub locator: Option<String>,
    /// Defaults to a 100x30 box stacked by position in `elements`
    #[serde(default)]
    pub rect: Option<Rect>,
    #[serde(default)]
    pub style: Option<NodeStyle>,
    /// Rendered with `display: none` until a `reveal` effect names it
    #[serde(default)]
    pub hidden: bool,
    /// Refuses filled values
    #[serde(default)]
    pub readonly: bool,
    #[serde(default)]
    pub on_click: ClickEffect,
}

/// What a click does. Effects apply in field order; an empty effect is a no-op.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClickEffect {
    /// The session dies (every later call fails with `SessionLost`)
    #[serde(default)]
    pub crash: bool,
    /// Opens a new top-level view showing this screen
    #[serde(default)]
    pub open_view: Option<String>,
    /// In-view navigation to this screen (new history entry)
    #[serde(default)]
    pub navigate: Option<String>,
    /// Swaps the rendered screen without a navigation event
    #[serde(default)]
    pub replace: Option<String>,
    /// Makes hidden nodes of the current screen visible
    #[serde(default)]
    pub reveal: Vec<String>,
    /// Re-creates every node, invalidating previously scanned refs
    #[serde(default)]
    pub rerender: bool,
    /// Click is accepted but only resolves after this long
    #[serde(default)]
    pub hang_ms: Option<u64>,
}

#[derive(Debug, thiserror::Error)]
pub enum FixtureError {
    #[error("Failed to read fixture '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse fixture: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Fixture references unknown screen '{0}'")]
    UnknownScreen(String),
}

// ============================================================================
// Runtime
// ============================================================================

#[derive(Debug, Clone)]
struct ViewState {
    id: ViewId,
    history: Vec<String>,
    /// Rendered screen; differs from the history top after a `replace`
    screen: String,
    epoch: u64,
    generation: u64,
    revealed: HashSet<String>,
    navigated: bool,
}

impl ViewState {
    fn new(id: ViewId, screen: &str) -> Self {
        Self {
            id,
            history: vec![screen.to_string()],
            screen: screen.to_string(),
            epoch: 0,
            generation: 0,
            revealed: HashSet::new(),
            navigated: false,
        }
    }

    fn enter(&mut self, screen: &str) {
        self.screen = screen.to_string();
        self.epoch += 1;
        self.revealed.clear();
    }
}

/// In-memory `UiDriver` over an `AppSpec`.
///
/// Deterministic and synchronous: effects are visible as soon as `click`
/// returns, `settle` does not sleep. Records every action for inspection.
#[derive(Debug, Clone)]
pub struct SyntheticApp {
    spec: AppSpec,
    views: Vec<ViewState>,
    front: ViewId,
    next_view: usize,
    crashed: bool,
    clicks: Vec<String>,
    fills: Vec<(String, String)>,
    closed: Vec<ViewId>,
}

impl SyntheticApp {
    pub fn new(spec: AppSpec) -> Result<Self, FixtureError> {
        validate(&spec)?;
        let initial = ViewId::new("view-1");
        let start = spec.start.clone();
        Ok(Self {
            spec,
            views: vec![ViewState::new(initial.clone(), &start)],
            front: initial,
            next_view: 2,
            crashed: false,
            clicks: Vec::new(),
            fills: Vec::new(),
            closed: Vec::new(),
        })
    }

    pub fn from_yaml(yaml: &str) -> Result<Self, FixtureError> {
        let spec: AppSpec = serde_yaml::from_str(yaml)?;
        Self::new(spec)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, FixtureError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| FixtureError::Read {
            path: path.display().to_string(),
            source: e,
        })?;
        Self::from_yaml(&content)
    }

    pub fn initial_view(&self) -> ViewId {
        ViewId::new("view-1")
    }

    pub fn front_view(&self) -> &ViewId {
        &self.front
    }

    pub fn open_views(&self) -> Vec<ViewId> {
        self.views.iter().map(|v| v.id.clone()).collect()
    }

    /// Keys of clicked nodes, in click order.
    pub fn click_log(&self) -> &[String] {
        &self.clicks
    }

    pub fn click_count(&self, key: &str) -> usize {
        self.clicks.iter().filter(|k| k.as_str() == key).count()
    }

    /// `(key, value)` of every accepted fill.
    pub fn fill_log(&self) -> &[(String, String)] {
        &self.fills
    }

    pub fn closed_views(&self) -> &[ViewId] {
        &self.closed
    }

    /// Screen currently rendered in `view`.
    pub fn current_screen(&self, view: &ViewId) -> Option<&str> {
        self.views
            .iter()
            .find(|v| &v.id == view)
            .map(|v| v.screen.as_str())
    }

    fn alive(&self) -> Result<(), DriverError> {
        if self.crashed {
            Err(DriverError::SessionLost("synthetic session crashed".into()))
        } else {
            Ok(())
        }
    }

    fn view(&self, view: &ViewId) -> Result<&ViewState, DriverError> {
        self.alive()?;
        self.views
            .iter()
            .find(|v| &v.id == view)
            .ok_or_else(|| DriverError::UnknownView(view.clone()))
    }

    fn view_mut(&mut self, view: &ViewId) -> Result<&mut ViewState, DriverError> {
        self.alive()?;
        self.views
            .iter_mut()
            .find(|v| &v.id == view)
            .ok_or_else(|| DriverError::UnknownView(view.clone()))
    }

    fn screen(&self, name: &str) -> Result<&ScreenSpec, DriverError> {
        self.spec
            .screens
            .get(name)
            .ok_or_else(|| DriverError::SessionProtocol {
                command: "screen".into(),
                error: format!("unknown screen '{}'", name),
            })
    }

    /// Resolve a ref against the live view, failing with `StaleElement` the
    /// way a browser would once the node is gone.
    fn resolve(&self, element: &ElementRef) -> Result<NodeSpec, DriverError> {
        let state = self.view(&element.view)?;
        let stale = || DriverError::StaleElement {
            key: element.key.clone(),
        };
        if state.epoch != element.epoch {
            return Err(stale());
        }
        let screen = self.screen(&state.screen)?;
        let node = screen
            .elements
            .iter()
            .find(|n| rendered_key(&n.key, state.generation) == element.key)
            .ok_or_else(stale)?;
        if node.hidden && !state.revealed.contains(&node.key) {
            return Err(DriverError::SessionProtocol {
                command: "click".into(),
                error: format!("node '{}' is not visible", node.key),
            });
        }
        Ok(node.clone())
    }

    fn apply(&mut self, view: &ViewId, effect: &ClickEffect) -> Result<(), DriverError> {
        if effect.crash {
            self.crashed = true;
            return Err(DriverError::SessionLost("synthetic session crashed".into()));
        }

        if let Some(hang) = effect.hang_ms {
            return Err(DriverError::Timeout {
                operation: "click".into(),
                timeout_ms: hang,
            });
        }

        if let Some(screen) = &effect.open_view {
            let id = ViewId::new(format!("view-{}", self.next_view));
            self.next_view += 1;
            self.views.push(ViewState::new(id.clone(), screen));
            self.front = id;
        }

        let state = self.view_mut(view)?;
        if let Some(screen) = &effect.navigate {
            state.history.push(screen.clone());
            state.enter(screen);
            state.navigated = true;
        }
        if let Some(screen) = &effect.replace {
            state.screen = screen.clone();
            state.revealed.clear();
            if let Some(top) = state.history.last_mut() {
                *top = screen.clone();
            }
        }
        for key in &effect.reveal {
            state.revealed.insert(key.clone());
        }
        if effect.rerender {
            state.generation += 1;
        }
        Ok(())
    }
}

fn rendered_key(key: &str, generation: u64) -> String {
    if generation == 0 {
        key.to_string()
    } else {
        format!("{}#{}", key, generation)
    }
}

fn validate(spec: &AppSpec) -> Result<(), FixtureError> {
    let known = |name: &str| -> Result<(), FixtureError> {
        if spec.screens.contains_key(name) {
            Ok(())
        } else {
            Err(FixtureError::UnknownScreen(name.to_string()))
        }
    };

    known(&spec.start)?;
    for screen in spec.screens.values() {
        for node in &screen.elements {
            let effect = &node.on_click;
            for target in [&effect.open_view, &effect.navigate, &effect.replace]
                .into_iter()
                .flatten()
            {
                known(target)?;
            }
        }
    }
    Ok(())
}

fn to_dom_node(node: &NodeSpec, index: usize, state: &ViewState) -> DomNode {
    let key = rendered_key(&node.key, state.generation);
    let mut style = node.style.clone().unwrap_or_default();
    if node.hidden && !state.revealed.contains(&node.key) {
        style.display = "none".to_string();
    }

    DomNode {
        locator: node
            .locator
            .clone()
            .unwrap_or_else(|| format!("[data-key=\"{}\"]", node.key)),
        key,
        epoch: state.epoch,
        tag: node.tag.clone(),
        role: node.role.clone(),
        input_type: node.input_type.clone(),
        text: node.text.clone(),
        aria_label: node.aria_label.clone(),
        placeholder: node.placeholder.clone(),
        name: node.name.clone(),
        id: node.id.clone(),
        value: node.value.clone(),
        content_editable: node.content_editable,
        disabled: node.disabled,
        click_hint: node.click_hint,
        href: node.href.clone(),
        rect: node
            .rect
            .unwrap_or_else(|| Rect::new(0.0, index as f64 * 40.0, 100.0, 30.0)),
        style,
    }
}

impl UiDriver for SyntheticApp {
    fn list_views(&mut self) -> Result<Vec<ViewId>, DriverError> {
        self.alive()?;
        Ok(self.open_views())
    }

    fn close_view(&mut self, view: &ViewId) -> Result<(), DriverError> {
        self.view(view)?;
        self.views.retain(|v| &v.id != view);
        self.closed.push(view.clone());
        if &self.front == view {
            if let Some(first) = self.views.first() {
                self.front = first.id.clone();
            }
        }
        Ok(())
    }

    fn bring_to_front(&mut self, view: &ViewId) -> Result<(), DriverError> {
        self.view(view)?;
        self.front = view.clone();
        Ok(())
    }

    fn query_elements(&mut self, view: &ViewId) -> Result<Vec<DomNode>, DriverError> {
        let state = self.view(view)?;
        let screen = self.screen(&state.screen)?;
        Ok(screen
            .elements
            .iter()
            .enumerate()
            .map(|(i, node)| to_dom_node(node, i, state))
            .collect())
    }

    fn click(&mut self, element: &ElementRef) -> Result<(), DriverError> {
        let node = self.resolve(element)?;
        self.view_mut(&element.view)?.navigated = false;
        self.clicks.push(node.key.clone());
        self.apply(&element.view, &node.on_click)
    }

    fn fill(&mut self, element: &ElementRef, text: &str) -> Result<bool, DriverError> {
        let node = self.resolve(element)?;
        if node.readonly || node.disabled {
            return Ok(false);
        }
        self.fills.push((node.key.clone(), text.to_string()));
        Ok(true)
    }

    fn wait_for_navigation(&mut self, view: &ViewId, _timeout: Duration) -> Result<bool, DriverError> {
        let state = self.view_mut(view)?;
        Ok(std::mem::take(&mut state.navigated))
    }

    fn current_location(&mut self, view: &ViewId) -> Result<String, DriverError> {
        let state = self.view(view)?;
        let screen = self.screen(&state.screen)?;
        Ok(screen
            .url
            .clone()
            .unwrap_or_else(|| format!("synthetic://{}", state.screen)))
    }

    fn go_back(&mut self, view: &ViewId, _timeout: Duration) -> Result<bool, DriverError> {
        let state = self.view_mut(view)?;
        if state.history.len() < 2 {
            return Ok(false);
        }
        state.history.pop();
        let previous = state.history.last().cloned().unwrap_or_default();
        state.enter(&previous);
        Ok(true)
    }

    fn text_content_digest(&mut self, view: &ViewId) -> Result<String, DriverError> {
        let state = self.view(view)?;
        let screen = self.screen(&state.screen)?;
        let mut parts = vec![screen.text.clone()];
        for node in &screen.elements {
            if node.hidden && !state.revealed.contains(&node.key) {
                continue;
            }
            if let Some(text) = &node.text {
                parts.push(text.clone());
            }
        }
        Ok(parts.join("\n"))
    }

    fn settle(&mut self, _delay: Duration) -> Result<(), DriverError> {
        self.alive()
    }

    fn observes_synchronously(&self) -> bool {
        true
    }
}
