use std::io::{BufRead, BufReader, Write};
use std::process::{Child, Command, Stdio};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::browser::driver::{DomNode, ElementRef, UiDriver, ViewId};
use crate::browser::error::DriverError;

pub const DEFAULT_NODE_BINARY: &str = "node";
pub const DEFAULT_HELPER_SCRIPT: &str = "node/browser_server.js";

/// Upper bound on the visible-text sample requested for fingerprinting.
const TEXT_SAMPLE_CHARS: usize = 4096;

/// Request sent to browser_server.js over stdin (one JSON line).
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum BrowserRequest {
    Navigate {
        cmd: &'static str,
        view: String,
        url: String,
    },
    ViewOnly {
        cmd: &'static str,
        view: String,
    },
    Element {
        cmd: &'static str,
        view: String,
        key: String,
        epoch: u64,
        #[serde(skip_serializing_if = "Option::is_none")]
        value: Option<String>,
    },
    Timed {
        cmd: &'static str,
        view: String,
        timeout_ms: u64,
    },
    TextSample {
        cmd: &'static str,
        view: String,
        max_chars: usize,
    },
    Wait {
        cmd: &'static str,
        duration_ms: u64,
    },
    Bare {
        cmd: &'static str,
    },
}

impl BrowserRequest {
    pub fn navigate(view: &ViewId, url: &str) -> Self {
        BrowserRequest::Navigate {
            cmd: "navigate",
            view: view.0.clone(),
            url: url.to_string(),
        }
    }

    pub fn list_views() -> Self {
        BrowserRequest::Bare { cmd: "list_views" }
    }

    pub fn close_view(view: &ViewId) -> Self {
        BrowserRequest::ViewOnly {
            cmd: "close_view",
            view: view.0.clone(),
        }
    }

    pub fn bring_to_front(view: &ViewId) -> Self {
        BrowserRequest::ViewOnly {
            cmd: "bring_to_front",
            view: view.0.clone(),
        }
    }

    pub fn query_elements(view: &ViewId) -> Self {
        BrowserRequest::ViewOnly {
            cmd: "query_elements",
            view: view.0.clone(),
        }
    }

    pub fn current_url(view: &ViewId) -> Self {
        BrowserRequest::ViewOnly {
            cmd: "current_url",
            view: view.0.clone(),
        }
    }

    pub fn click(element: &ElementRef) -> Self {
        BrowserRequest::Element {
            cmd: "click",
            view: element.view.0.clone(),
            key: element.key.clone(),
            epoch: element.epoch,
            value: None,
        }
    }

    pub fn fill(element: &ElementRef, value: &str) -> Self {
        BrowserRequest::Element {
            cmd: "fill",
            view: element.view.0.clone(),
            key: element.key.clone(),
            epoch: element.epoch,
            value: Some(value.to_string()),
        }
    }

    pub fn wait_for_navigation(view: &ViewId, timeout: Duration) -> Self {
        BrowserRequest::Timed {
            cmd: "wait_for_navigation",
            view: view.0.clone(),
            timeout_ms: timeout.as_millis() as u64,
        }
    }

    pub fn go_back(view: &ViewId, timeout: Duration) -> Self {
        BrowserRequest::Timed {
            cmd: "go_back",
            view: view.0.clone(),
            timeout_ms: timeout.as_millis() as u64,
        }
    }

    pub fn text_sample(view: &ViewId, max_chars: usize) -> Self {
        BrowserRequest::TextSample {
            cmd: "text_sample",
            view: view.0.clone(),
            max_chars,
        }
    }

    pub fn wait(duration_ms: u64) -> Self {
        BrowserRequest::Wait {
            cmd: "wait",
            duration_ms,
        }
    }

    pub fn quit() -> Self {
        BrowserRequest::Bare { cmd: "quit" }
    }
}

/// Response received from browser_server.js over stdout (one JSON line).
#[derive(Debug, Deserialize)]
pub struct BrowserResponse {
    pub ok: bool,
    #[serde(default)]
    pub error: Option<String>,
    /// Machine-readable failure class: "stale", "timeout", "no_view", "closed"
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub ready: Option<bool>,
    #[serde(default)]
    pub view: Option<String>,
    #[serde(default)]
    pub views: Option<Vec<String>>,
    #[serde(default)]
    pub navigated: Option<bool>,
    #[serde(default)]
    pub accepted: Option<bool>,
    #[serde(default)]
    pub text: Option<String>,
}

/// A persistent browser session backed by browser_server.js.
///
/// Launches a long-lived Node.js process that keeps a Chromium browser (with
/// the target extension loaded and unlocked) open. Commands are sent as NDJSON
/// over stdin, responses read from stdout.
pub struct BrowserSession {
    child: Child,
    stdin: std::process::ChildStdin,
    reader: BufReader<std::process::ChildStdout>,
    initial_view: ViewId,
    script: String,
}

impl BrowserSession {
    /// Launch the helper with the default node binary and script path.
    pub fn launch() -> Result<Self, DriverError> {
        Self::launch_with(DEFAULT_NODE_BINARY, DEFAULT_HELPER_SCRIPT)
    }

    pub fn launch_with(node: &str, script: &str) -> Result<Self, DriverError> {
        let mut child = Command::new(node)
            .arg(script)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| DriverError::SubprocessSpawn {
                script: script.to_string(),
                source: e,
            })?;

        let stdin = child.stdin.take().ok_or_else(|| {
            DriverError::SessionIO(format!("Failed to capture stdin of {}", script))
        })?;

        let stdout = child.stdout.take().ok_or_else(|| {
            DriverError::SessionIO(format!("Failed to capture stdout of {}", script))
        })?;

        let mut reader = BufReader::new(stdout);

        // Wait for the ready signal, which names the initial view
        let mut line = String::new();
        reader
            .read_line(&mut line)
            .map_err(|e| DriverError::SessionIO(format!("Failed to read ready signal: {}", e)))?;

        let response: BrowserResponse =
            serde_json::from_str(line.trim()).map_err(|e| DriverError::JsonParse {
                context: format!("{} ready signal", script),
                source: e,
            })?;

        if !response.ok || response.ready != Some(true) {
            return Err(DriverError::SessionProtocol {
                command: "launch".into(),
                error: format!("Did not receive ready signal from {}", script),
            });
        }

        let initial_view = response.view.map(ViewId).ok_or_else(|| DriverError::SessionProtocol {
            command: "launch".into(),
            error: "Ready signal did not name the initial view".into(),
        })?;

        debug!(view = %initial_view, "browser helper ready");

        Ok(BrowserSession {
            child,
            stdin,
            reader,
            initial_view,
            script: script.to_string(),
        })
    }

    /// The view the helper opened the target UI in.
    pub fn initial_view(&self) -> &ViewId {
        &self.initial_view
    }

    /// Send a request and read the response.
    fn send(&mut self, request: &BrowserRequest) -> Result<BrowserResponse, DriverError> {
        let json = serde_json::to_string(request).map_err(|e| DriverError::JsonSerialize {
            context: "BrowserRequest".into(),
            source: e,
        })?;

        writeln!(self.stdin, "{}", json).map_err(|e| {
            DriverError::SessionIO(format!("Failed to write to {} stdin: {}", self.script, e))
        })?;

        self.stdin.flush().map_err(|e| {
            DriverError::SessionIO(format!("Failed to flush {} stdin: {}", self.script, e))
        })?;

        let mut line = String::new();
        self.reader.read_line(&mut line).map_err(|e| {
            DriverError::SessionIO(format!("Failed to read from {} stdout: {}", self.script, e))
        })?;

        if line.trim().is_empty() {
            return Err(DriverError::SessionLost(format!(
                "Empty response from {} (process may have died)",
                self.script
            )));
        }

        serde_json::from_str(line.trim()).map_err(|e| DriverError::JsonParse {
            context: format!("{} response", self.script),
            source: e,
        })
    }

    /// Send a request and map `ok: false` onto the driver error taxonomy.
    fn send_ok(
        &mut self,
        request: &BrowserRequest,
        command_name: &str,
    ) -> Result<BrowserResponse, DriverError> {
        let response = self.send(request)?;
        if response.ok {
            return Ok(response);
        }

        let error = response.error.unwrap_or_else(|| "Unknown error".into());
        Err(match response.code.as_deref() {
            Some("stale") => DriverError::StaleElement { key: request_key(request) },
            Some("timeout") => DriverError::Timeout {
                operation: command_name.into(),
                timeout_ms: request_timeout(request),
            },
            Some("no_view") => DriverError::UnknownView(ViewId(request_view(request))),
            Some("closed") => DriverError::SessionLost(error),
            _ => DriverError::SessionProtocol {
                command: command_name.into(),
                error,
            },
        })
    }

    /// Navigate a view to a URL (used to reach the start screen).
    pub fn navigate(&mut self, view: &ViewId, url: &str) -> Result<(), DriverError> {
        self.send_ok(&BrowserRequest::navigate(view, url), "navigate")?;
        Ok(())
    }

    /// Quit the browser session.
    pub fn quit(&mut self) -> Result<(), DriverError> {
        // Best-effort quit, the process may already be gone
        let _ = self.send(&BrowserRequest::quit());
        let _ = self.child.wait();
        Ok(())
    }
}

fn request_key(request: &BrowserRequest) -> String {
    match request {
        BrowserRequest::Element { key, .. } => key.clone(),
        _ => String::new(),
    }
}

fn request_view(request: &BrowserRequest) -> String {
    match request {
        BrowserRequest::Navigate { view, .. }
        | BrowserRequest::ViewOnly { view, .. }
        | BrowserRequest::Element { view, .. }
        | BrowserRequest::Timed { view, .. }
        | BrowserRequest::TextSample { view, .. } => view.clone(),
        _ => String::new(),
    }
}

fn request_timeout(request: &BrowserRequest) -> u64 {
    match request {
        BrowserRequest::Timed { timeout_ms, .. } => *timeout_ms,
        BrowserRequest::Wait { duration_ms, .. } => *duration_ms,
        _ => 0,
    }
}

impl UiDriver for BrowserSession {
    fn list_views(&mut self) -> Result<Vec<ViewId>, DriverError> {
        let response = self.send_ok(&BrowserRequest::list_views(), "list_views")?;
        Ok(response
            .views
            .unwrap_or_default()
            .into_iter()
            .map(ViewId)
            .collect())
    }

    fn close_view(&mut self, view: &ViewId) -> Result<(), DriverError> {
        if *view == self.initial_view {
            warn!(view = %view, "refusing to close the initial view");
            return Ok(());
        }
        self.send_ok(&BrowserRequest::close_view(view), "close_view")?;
        Ok(())
    }

    fn bring_to_front(&mut self, view: &ViewId) -> Result<(), DriverError> {
        self.send_ok(&BrowserRequest::bring_to_front(view), "bring_to_front")?;
        Ok(())
    }

    fn query_elements(&mut self, view: &ViewId) -> Result<Vec<DomNode>, DriverError> {
        let response = self.send_ok(&BrowserRequest::query_elements(view), "query_elements")?;
        let data = response.data.ok_or_else(|| DriverError::SessionProtocol {
            command: "query_elements".into(),
            error: "No data in query_elements response".into(),
        })?;
        serde_json::from_value(data).map_err(|e| DriverError::JsonParse {
            context: "query_elements data".into(),
            source: e,
        })
    }

    fn click(&mut self, element: &ElementRef) -> Result<(), DriverError> {
        self.send_ok(&BrowserRequest::click(element), "click")?;
        Ok(())
    }

    fn fill(&mut self, element: &ElementRef, text: &str) -> Result<bool, DriverError> {
        let response = self.send_ok(&BrowserRequest::fill(element, text), "fill")?;
        Ok(response.accepted.unwrap_or(true))
    }

    fn wait_for_navigation(&mut self, view: &ViewId, timeout: Duration) -> Result<bool, DriverError> {
        let request = BrowserRequest::wait_for_navigation(view, timeout);
        match self.send_ok(&request, "wait_for_navigation") {
            Ok(response) => Ok(response.navigated.unwrap_or(false)),
            Err(DriverError::Timeout { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    fn current_location(&mut self, view: &ViewId) -> Result<String, DriverError> {
        let response = self.send_ok(&BrowserRequest::current_url(view), "current_url")?;
        response.url.ok_or_else(|| DriverError::SessionProtocol {
            command: "current_url".into(),
            error: "No URL in current_url response".into(),
        })
    }

    fn go_back(&mut self, view: &ViewId, timeout: Duration) -> Result<bool, DriverError> {
        match self.send_ok(&BrowserRequest::go_back(view, timeout), "go_back") {
            Ok(response) => Ok(response.navigated.unwrap_or(true)),
            Err(DriverError::Timeout { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    fn text_content_digest(&mut self, view: &ViewId) -> Result<String, DriverError> {
        let request = BrowserRequest::text_sample(view, TEXT_SAMPLE_CHARS);
        let response = self.send_ok(&request, "text_sample")?;
        Ok(response.text.unwrap_or_default())
    }

    fn settle(&mut self, delay: Duration) -> Result<(), DriverError> {
        self.send_ok(&BrowserRequest::wait(delay.as_millis() as u64), "wait")?;
        Ok(())
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        // Best-effort cleanup
        let _ = self.quit();
    }
}
