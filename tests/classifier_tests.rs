use surface_explorer::browser::driver::{DomNode, NodeStyle, Rect, ViewId};
use surface_explorer::screen::classifier::{classify, classify_node, discover, is_visible, label_for};
use surface_explorer::screen::screen_model::ElementKind;
use surface_explorer::state::stamp::StampStore;

use crate::common::{node, node_at};

mod common;

fn view() -> ViewId {
    ViewId::new("view-1")
}

fn button(key: &str, text: &str) -> DomNode {
    DomNode {
        text: Some(text.into()),
        ..node(key, "button")
    }
}

fn text_input(key: &str, placeholder: &str) -> DomNode {
    DomNode {
        input_type: Some("text".into()),
        placeholder: Some(placeholder.into()),
        ..node(key, "input")
    }
}

// ============================================================================
// Visibility
// ============================================================================

#[test]
fn zero_area_nodes_are_invisible() {
    let mut n = button("b", "Go");
    assert!(is_visible(&n));

    n.rect = Rect::new(10.0, 10.0, 0.0, 20.0);
    assert!(!is_visible(&n));
}

#[test]
fn hidden_styles_are_invisible() {
    let hidden = |style: NodeStyle| DomNode {
        style,
        ..button("b", "Go")
    };

    assert!(!is_visible(&hidden(NodeStyle {
        display: "none".into(),
        ..NodeStyle::default()
    })));
    assert!(!is_visible(&hidden(NodeStyle {
        visibility: "hidden".into(),
        ..NodeStyle::default()
    })));
    assert!(!is_visible(&hidden(NodeStyle {
        visibility: "collapse".into(),
        ..NodeStyle::default()
    })));
    assert!(!is_visible(&hidden(NodeStyle {
        opacity: 0.0,
        ..NodeStyle::default()
    })));
    assert!(is_visible(&hidden(NodeStyle::default())));
}

// ============================================================================
// Classification
// ============================================================================

#[test]
fn typable_predicates() {
    assert_eq!(classify_node(&text_input("i", "Amount")), ElementKind::Typable);
    assert_eq!(classify_node(&node("t", "textarea")), ElementKind::Typable);
    assert_eq!(classify_node(&node("untyped", "input")), ElementKind::Typable);

    let editable = DomNode {
        content_editable: true,
        ..node("ce", "div")
    };
    assert_eq!(classify_node(&editable), ElementKind::Typable);

    let searchbox = DomNode {
        role: Some("searchbox".into()),
        ..node("sb", "div")
    };
    assert_eq!(classify_node(&searchbox), ElementKind::Typable);
}

#[test]
fn clickable_predicates() {
    assert_eq!(classify_node(&button("b", "Go")), ElementKind::Clickable);

    let link = DomNode {
        href: Some("/send".into()),
        ..node("a", "a")
    };
    assert_eq!(classify_node(&link), ElementKind::Clickable);

    let anchor_without_href = node("a2", "a");
    assert_eq!(classify_node(&anchor_without_href), ElementKind::Ignored);

    let role_button = DomNode {
        role: Some("button".into()),
        ..node("rb", "div")
    };
    assert_eq!(classify_node(&role_button), ElementKind::Clickable);

    let hinted = DomNode {
        click_hint: true,
        ..node("h", "div")
    };
    assert_eq!(classify_node(&hinted), ElementKind::Clickable);

    let checkbox = DomNode {
        input_type: Some("checkbox".into()),
        ..node("cb", "input")
    };
    assert_eq!(classify_node(&checkbox), ElementKind::Clickable);
}

#[test]
fn plain_containers_and_disabled_nodes_are_ignored() {
    assert_eq!(classify_node(&node("d", "div")), ElementKind::Ignored);

    let disabled = DomNode {
        disabled: true,
        ..button("b", "Go")
    };
    assert_eq!(classify_node(&disabled), ElementKind::Ignored);
}

#[test]
fn typable_wins_over_clickable() {
    let both = DomNode {
        content_editable: true,
        click_hint: true,
        role: Some("button".into()),
        ..node("both", "div")
    };
    assert_eq!(classify_node(&both), ElementKind::Typable);
}

// ============================================================================
// Scan ordering and partition
// ============================================================================

#[test]
fn scan_is_ordered_top_to_bottom_then_left_to_right() {
    let nodes = vec![
        DomNode {
            text: Some("Bottom".into()),
            ..node_at("bottom", "button", 0.0, 200.0)
        },
        DomNode {
            text: Some("Right".into()),
            ..node_at("right", "button", 300.0, 50.0)
        },
        DomNode {
            text: Some("Left".into()),
            ..node_at("left", "button", 10.0, 50.0)
        },
        DomNode {
            placeholder: Some("Top".into()),
            ..node_at("top", "input", 0.0, 0.0)
        },
    ];

    let scan = classify(&view(), &nodes);
    assert_eq!(scan.keys(), vec!["left", "right", "bottom", "top"]);
    assert_eq!(scan.clickables.len(), 3);
    assert_eq!(scan.typables.len(), 1);
    assert_eq!(scan.typables[0].descriptor.label, "Top");
}

#[test]
fn scan_skips_invisible_and_duplicate_nodes() {
    let hidden = DomNode {
        style: NodeStyle {
            display: "none".into(),
            ..NodeStyle::default()
        },
        ..button("hidden", "Hidden")
    };
    let nodes = vec![button("a", "A"), button("a", "A again"), hidden];

    let scan = classify(&view(), &nodes);
    assert_eq!(scan.keys(), vec!["a"]);
    assert_eq!(scan.clickables[0].descriptor.label, "A");
}

#[test]
fn scanned_refs_carry_view_and_epoch() {
    let nodes = vec![DomNode {
        epoch: 7,
        ..button("b", "Go")
    }];
    let scan = classify(&view(), &nodes);

    let element = &scan.clickables[0].element;
    assert_eq!(element.view, view());
    assert_eq!(element.epoch, 7);
    assert_eq!(element.key, "b");
}

#[test]
fn discover_excludes_stamped_elements() {
    let nodes = vec![button("nav", "Home"), text_input("amount", "Amount")];
    let mut stamps = StampStore::new();
    stamps.stamp("nav", 0);

    let scan = discover(&view(), &nodes, &stamps);
    assert!(scan.clickables.is_empty());
    assert_eq!(scan.typables.len(), 1);
    assert_eq!(scan.len(), 1);
}

// ============================================================================
// Labels and descriptors
// ============================================================================

#[test]
fn label_prefers_aria_label_then_placeholder_then_text() {
    let mut n = DomNode {
        aria_label: Some("Aria".into()),
        placeholder: Some("Placeholder".into()),
        text: Some("Text".into()),
        ..node("n", "input")
    };
    assert_eq!(label_for(&n), "Aria");

    n.aria_label = None;
    assert_eq!(label_for(&n), "Placeholder");

    n.placeholder = Some("   ".into());
    assert_eq!(label_for(&n), "Text");

    n.text = None;
    n.name = Some("recipient".into());
    assert_eq!(label_for(&n), "recipient");

    n.name = None;
    assert_eq!(label_for(&n), "input");
}

#[test]
fn label_collapses_whitespace_and_truncates() {
    let n = DomNode {
        text: Some(format!("  Send\n   {}", "x".repeat(100))),
        ..node("n", "button")
    };
    let label = label_for(&n);
    assert!(label.starts_with("Send x"));
    assert_eq!(label.chars().count(), 60);
}

#[test]
fn label_falls_back_to_unlabelled() {
    let n = node("n", "  ");
    assert_eq!(label_for(&n), "<unlabelled>");
}

#[test]
fn descriptor_keeps_locator_and_input_attributes() {
    let nodes = vec![DomNode {
        name: Some("to".into()),
        id: Some("recipient".into()),
        ..text_input("addr", "Address")
    }];
    let scan = classify(&view(), &nodes);
    let descriptor = &scan.typables[0].descriptor;

    assert_eq!(descriptor.locator, "#addr");
    assert_eq!(descriptor.kind, ElementKind::Typable);
    assert_eq!(descriptor.tag, "input");
    assert_eq!(descriptor.input_type.as_deref(), Some("text"));
    assert_eq!(descriptor.placeholder.as_deref(), Some("Address"));
    assert_eq!(descriptor.name.as_deref(), Some("to"));
    assert_eq!(descriptor.id.as_deref(), Some("recipient"));
}
