use serde::{Deserialize, Serialize};

use crate::screen::screen_model::{ElementDescriptor, ElementKind};

/// One replayable action: what was acted on and how.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathStep {
    pub label: String,
    pub locator: String,
    pub kind: ElementKind,
    /// Depth of the state the action was taken from
    pub depth: usize,
}

impl PathStep {
    pub fn from_descriptor(descriptor: &ElementDescriptor, depth: usize) -> Self {
        Self {
            label: descriptor.label.clone(),
            locator: descriptor.locator.clone(),
            kind: descriptor.kind,
            depth,
        }
    }
}

/// The live action stack of a traversal.
///
/// Pushed before each action and popped after its subtree returns. Anything
/// that outlives the current frame takes a `snapshot`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Path {
    steps: Vec<PathStep>,
}

impl Path {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, step: PathStep) {
        self.steps.push(step);
    }

    pub fn pop(&mut self) -> Option<PathStep> {
        self.steps.pop()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn steps(&self) -> &[PathStep] {
        &self.steps
    }

    pub fn labels(&self) -> Vec<String> {
        self.steps.iter().map(|s| s.label.clone()).collect()
    }

    /// Deep copy, independent of later pushes and pops.
    pub fn snapshot(&self) -> Vec<PathStep> {
        self.steps.clone()
    }
}
