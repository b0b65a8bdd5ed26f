use std::collections::HashSet;

use crate::browser::driver::{DomNode, ElementRef, ViewId};
use crate::screen::screen_model::{ElementDescriptor, ElementKind, Scan, ScannedElement};
use crate::state::stamp::StampStore;

const MAX_LABEL_CHARS: usize = 60;
const UNLABELLED: &str = "<unlabelled>";

/// Every visible, actionable node of a view, classified and in visual order.
pub fn classify(view: &ViewId, nodes: &[DomNode]) -> Scan {
    let mut seen = HashSet::new();
    let mut elements: Vec<ScannedElement> = nodes
        .iter()
        .filter(|n| is_visible(n))
        .filter(|n| seen.insert(n.key.clone()))
        .filter_map(|n| {
            let kind = classify_node(n);
            (kind != ElementKind::Ignored).then(|| ScannedElement {
                element: ElementRef {
                    view: view.clone(),
                    epoch: n.epoch,
                    key: n.key.clone(),
                },
                descriptor: describe(n, kind),
                rect: n.rect,
            })
        })
        .collect();

    elements.sort_by(|a, b| {
        a.rect
            .y
            .total_cmp(&b.rect.y)
            .then(a.rect.x.total_cmp(&b.rect.x))
    });

    let (typables, clickables): (Vec<_>, Vec<_>) = elements
        .into_iter()
        .partition(|e| e.kind() == ElementKind::Typable);

    Scan {
        clickables,
        typables,
    }
}

/// Like `classify`, but drops every element that already carries a stamp.
pub fn discover(view: &ViewId, nodes: &[DomNode], stamps: &StampStore) -> Scan {
    let mut scan = classify(view, nodes);
    scan.clickables.retain(|e| !stamps.is_stamped(e.key()));
    scan.typables.retain(|e| !stamps.is_stamped(e.key()));
    scan
}

/// Laid out with non-zero area and not hidden via display/visibility/opacity.
pub fn is_visible(node: &DomNode) -> bool {
    node.rect.has_area()
        && node.style.display != "none"
        && node.style.visibility != "hidden"
        && node.style.visibility != "collapse"
        && node.style.opacity > 0.0
}

/// Typable wins over clickable: filling a probe is less destructive than a click.
pub fn classify_node(node: &DomNode) -> ElementKind {
    if node.disabled {
        return ElementKind::Ignored;
    }
    if is_typable(node) {
        ElementKind::Typable
    } else if is_clickable(node) {
        ElementKind::Clickable
    } else {
        ElementKind::Ignored
    }
}

fn is_typable(node: &DomNode) -> bool {
    if node.content_editable {
        return true;
    }

    if matches!(node.role.as_deref(), Some("textbox") | Some("searchbox")) {
        return true;
    }

    match node.tag.as_str() {
        "textarea" => true,
        "input" => matches!(
            node.input_type.as_deref(),
            None | Some("")
                | Some("text")
                | Some("email")
                | Some("password")
                | Some("search")
                | Some("number")
                | Some("tel")
                | Some("url")
        ),
        _ => false,
    }
}

fn is_clickable(node: &DomNode) -> bool {
    if node.click_hint {
        return true;
    }

    if matches!(
        node.role.as_deref(),
        Some("button")
            | Some("link")
            | Some("menuitem")
            | Some("tab")
            | Some("option")
            | Some("checkbox")
            | Some("radio")
            | Some("switch")
    ) {
        return true;
    }

    match node.tag.as_str() {
        "button" | "summary" => true,
        "a" => node.href.is_some(),
        "input" => matches!(
            node.input_type.as_deref(),
            Some("submit")
                | Some("button")
                | Some("reset")
                | Some("image")
                | Some("checkbox")
                | Some("radio")
        ),
        _ => false,
    }
}

/// Human label: aria-label, placeholder, text, value, id, name, then tag.
pub fn label_for(node: &DomNode) -> String {
    let label = [
        node.aria_label.as_deref(),
        node.placeholder.as_deref(),
        node.text.as_deref(),
        node.value.as_deref(),
        node.id.as_deref(),
        node.name.as_deref(),
        Some(node.tag.as_str()),
    ]
    .into_iter()
    .flatten()
    .map(|s| s.split_whitespace().collect::<Vec<_>>().join(" "))
    .find(|s| !s.is_empty());

    match label {
        Some(l) => l.chars().take(MAX_LABEL_CHARS).collect(),
        None => UNLABELLED.to_string(),
    }
}

pub fn describe(node: &DomNode, kind: ElementKind) -> ElementDescriptor {
    ElementDescriptor {
        label: label_for(node),
        locator: if node.locator.is_empty() {
            node.key.clone()
        } else {
            node.locator.clone()
        },
        kind,
        tag: node.tag.clone(),
        input_type: node.input_type.clone(),
        placeholder: node.placeholder.clone(),
        name: node.name.clone(),
        id: node.id.clone(),
    }
}
