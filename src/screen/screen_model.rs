use serde::{Deserialize, Serialize};

use crate::browser::driver::{ElementRef, Rect};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementKind {
    Clickable,
    Typable,
    Ignored,
}

/// Durable description of a node: survives the session it was found in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementDescriptor {
    pub label: String,
    pub locator: String,
    pub kind: ElementKind,
    pub tag: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

/// A visible, classified node together with its live reference.
#[derive(Debug, Clone, PartialEq)]
pub struct ScannedElement {
    pub element: ElementRef,
    pub descriptor: ElementDescriptor,
    pub rect: Rect,
}

impl ScannedElement {
    pub fn key(&self) -> &str {
        &self.element.key
    }

    pub fn kind(&self) -> ElementKind {
        self.descriptor.kind
    }
}

/// Result of scanning a view, in visual order (top-to-bottom, left-to-right).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Scan {
    pub clickables: Vec<ScannedElement>,
    pub typables: Vec<ScannedElement>,
}

impl Scan {
    pub fn is_empty(&self) -> bool {
        self.clickables.is_empty() && self.typables.is_empty()
    }

    pub fn len(&self) -> usize {
        self.clickables.len() + self.typables.len()
    }

    /// Keys of every element, clickables first; used to detect DOM mutation.
    pub fn keys(&self) -> Vec<&str> {
        self.clickables
            .iter()
            .chain(self.typables.iter())
            .map(|e| e.key())
            .collect()
    }
}
