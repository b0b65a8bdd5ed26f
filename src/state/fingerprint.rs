use std::fmt;

use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};

use crate::browser::driver::{UiDriver, ViewId};
use crate::browser::error::DriverError;
use crate::screen::classifier::classify;
use crate::screen::screen_model::Scan;

/// Visible classified elements folded into the structural digest.
pub const MAX_STRUCTURE_ELEMENTS: usize = 64;

/// Signature of a rendered view: location, a bounded digest of its visible
/// text, and a bounded digest of its visible actionable elements.
///
/// Same URL with materially different text or controls gives a different
/// fingerprint; whitespace-only re-renders and re-keyed nodes give the same
/// one. Collisions only ever make the explorer skip a state, never loop.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StateFingerprint {
    pub location: String,
    pub text_len: usize,
    pub digest: String,
    #[serde(default)]
    pub element_count: usize,
    /// Empty until `with_structure` runs
    #[serde(default)]
    pub structure: String,
}

impl fmt::Display for StateFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let short = self.digest.get(..12).unwrap_or(&self.digest);
        write!(f, "{}|{}|{}", self.location, self.text_len, short)?;
        if !self.structure.is_empty() {
            let structure = self.structure.get(..8).unwrap_or(&self.structure);
            write!(f, "|{}:{}", self.element_count, structure)?;
        }
        Ok(())
    }
}

pub fn fingerprint(
    driver: &mut dyn UiDriver,
    view: &ViewId,
    sample_chars: usize,
) -> Result<StateFingerprint, DriverError> {
    let location = driver.current_location(view)?;
    let text = driver.text_content_digest(view)?;
    let scan = classify(view, &driver.query_elements(view)?);
    Ok(fingerprint_of(&location, &text, sample_chars).with_structure(&scan))
}

/// Pure part of `fingerprint`, for callers that already hold the text.
pub fn fingerprint_of(location: &str, text: &str, sample_chars: usize) -> StateFingerprint {
    let normalized = normalize_text(text);
    let sample: String = normalized.chars().take(sample_chars).collect();

    StateFingerprint {
        location: location.to_string(),
        text_len: normalized.chars().count(),
        digest: text_digest(&sample),
        element_count: 0,
        structure: String::new(),
    }
}

impl StateFingerprint {
    /// Fold the visible clickables and typables of `scan` into the fingerprint.
    ///
    /// Elements are described by kind, tag, input type and label, never by
    /// key, so a re-render that only re-keys nodes keeps the fingerprint.
    pub fn with_structure(mut self, scan: &Scan) -> Self {
        self.element_count = scan.len();
        self.structure = text_digest(&structure_signature(scan));
        self
    }
}

/// Sorted, bounded, one line per element.
pub fn structure_signature(scan: &Scan) -> String {
    let mut lines: Vec<String> = scan
        .clickables
        .iter()
        .chain(scan.typables.iter())
        .map(|e| {
            let d = &e.descriptor;
            format!(
                "{:?}:{}:{}:{}",
                d.kind,
                d.tag,
                d.input_type.as_deref().unwrap_or(""),
                d.label
            )
        })
        .collect();
    lines.sort();
    lines.truncate(MAX_STRUCTURE_ELEMENTS);
    lines.join("\n")
}

/// Collapse runs of whitespace so layout-only re-renders compare equal.
pub fn normalize_text(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn text_digest(text: &str) -> String {
    let mut hasher = Sha1::new();
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}
