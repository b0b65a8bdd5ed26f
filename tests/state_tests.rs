use surface_explorer::browser::driver::{ElementRef, UiDriver, ViewId};
use surface_explorer::browser::synthetic::SyntheticApp;
use surface_explorer::explorer::path::{Path, PathStep};
use surface_explorer::report::report_model::{PathRecorder, RunStats};
use surface_explorer::screen::classifier::classify;
use surface_explorer::screen::screen_model::{ElementDescriptor, ElementKind};
use surface_explorer::state::crawl_state::CrawlState;
use surface_explorer::state::fingerprint::{
    MAX_STRUCTURE_ELEMENTS, fingerprint, fingerprint_of, normalize_text, structure_signature,
};
use surface_explorer::state::stamp::StampStore;

use crate::common::load_app;

mod common;

// ============================================================================
// Helper builders
// ============================================================================

fn descriptor(label: &str, kind: ElementKind) -> ElementDescriptor {
    ElementDescriptor {
        label: label.into(),
        locator: format!("[aria-label=\"{}\"]", label),
        kind,
        tag: "input".into(),
        input_type: None,
        placeholder: None,
        name: None,
        id: None,
    }
}

fn step(label: &str, depth: usize) -> PathStep {
    PathStep::from_descriptor(&descriptor(label, ElementKind::Clickable), depth)
}

// ============================================================================
// Stamping
// ============================================================================

#[test]
fn stamp_is_idempotent_and_keeps_first_depth() {
    let mut stamps = StampStore::new();
    assert!(!stamps.is_stamped("nav"));

    assert_eq!(stamps.stamp("nav", 2), 2);
    assert_eq!(stamps.stamp("nav", 5), 2);
    assert!(stamps.is_stamped("nav"));
    assert_eq!(stamps.depth_of("nav"), Some(2));
    assert_eq!(stamps.len(), 1);
}

#[test]
fn stamps_do_not_leak_between_runs() {
    let mut first = CrawlState::new();
    first.stamps.stamp("nav", 0);

    let second = CrawlState::new();
    assert!(second.stamps.is_empty());
    assert!(!second.stamps.is_stamped("nav"));
}

// ============================================================================
// Fingerprints
// ============================================================================

#[test]
fn fingerprint_is_stable_without_mutation() {
    let mut app = load_app("send_cycle.yaml");
    let view = app.initial_view();

    let first = fingerprint(&mut app, &view, 200).unwrap();
    let second = fingerprint(&mut app, &view, 200).unwrap();
    assert_eq!(first, second);
    assert_eq!(first.location, "ext://wallet/send/amount");
}

#[test]
fn fingerprint_ignores_whitespace_only_changes() {
    let a = fingerprint_of("ext://w/home", "Balance   0 ETH\n\nSend", 200);
    let b = fingerprint_of("ext://w/home", " Balance 0 ETH Send ", 200);
    assert_eq!(a, b);
}

#[test]
fn same_location_different_content_is_a_different_state() {
    let a = fingerprint_of("ext://w/home", "Balance 0 ETH", 200);
    let b = fingerprint_of("ext://w/home", "Balance 5 ETH", 200);
    assert_ne!(a, b);
}

#[test]
fn different_location_same_content_is_a_different_state() {
    let a = fingerprint_of("ext://w/home", "Hello", 200);
    let b = fingerprint_of("ext://w/settings", "Hello", 200);
    assert_ne!(a, b);
}

#[test]
fn text_beyond_the_sample_only_counts_through_length() {
    let prefix = "a".repeat(10);
    let a = fingerprint_of("loc", &format!("{}xyz", prefix), 10);
    let b = fingerprint_of("loc", &format!("{}zyx", prefix), 10);
    let c = fingerprint_of("loc", &format!("{}zyxw", prefix), 10);

    assert_eq!(a, b);
    assert_ne!(a, c);
    assert_eq!(c.text_len, 14);
}

#[test]
fn fingerprint_display_is_compact() {
    let fp = fingerprint_of("ext://w/home", "Hello", 200);
    let shown = fp.to_string();
    assert!(shown.starts_with("ext://w/home|5|"));
    assert_eq!(shown.len(), "ext://w/home|5|".len() + 12);
}

#[test]
fn normalize_text_collapses_runs() {
    assert_eq!(normalize_text("  a \n\t b  "), "a b");
}

#[test]
fn navigation_changes_the_fingerprint() {
    let mut app = load_app("send_cycle.yaml");
    let view = app.initial_view();
    let before = fingerprint(&mut app, &view, 200).unwrap();

    let next = app
        .query_elements(&view)
        .unwrap()
        .into_iter()
        .find(|n| n.key == "next")
        .unwrap();
    app.click(&ElementRef {
        view: view.clone(),
        epoch: next.epoch,
        key: next.key,
    })
    .unwrap();

    let after = fingerprint(&mut app, &view, 200).unwrap();
    assert_ne!(before, after);
}

/// `Advanced` reveals an input that has no visible text of its own.
const TEXTLESS_REVEAL: &str = r#"
start: send
screens:
  send:
    url: ext://wallet/send
    text: Send
    elements:
      - { key: advanced, tag: button, text: Advanced, on_click: { reveal: [gas] } }
      - { key: shuffle, tag: button, text: Shuffle, on_click: { rerender: true } }
      - { key: gas, tag: input, type: number, aria_label: Gas limit, hidden: true }
"#;

fn click_key(app: &mut SyntheticApp, view: &ViewId, key: &str) {
    let node = app
        .query_elements(view)
        .unwrap()
        .into_iter()
        .find(|n| n.key == key)
        .unwrap();
    app.click(&ElementRef {
        view: view.clone(),
        epoch: node.epoch,
        key: node.key,
    })
    .unwrap();
}

#[test]
fn revealing_a_textless_input_changes_the_fingerprint() {
    let mut app = SyntheticApp::from_yaml(TEXTLESS_REVEAL).unwrap();
    let view = app.initial_view();
    let before = fingerprint(&mut app, &view, 200).unwrap();

    click_key(&mut app, &view, "advanced");
    let after = fingerprint(&mut app, &view, 200).unwrap();

    assert_eq!(before.location, after.location);
    assert_eq!(before.digest, after.digest);
    assert_eq!(after.element_count, before.element_count + 1);
    assert_ne!(before, after);
}

#[test]
fn rekeyed_rerender_keeps_the_fingerprint() {
    let mut app = SyntheticApp::from_yaml(TEXTLESS_REVEAL).unwrap();
    let view = app.initial_view();
    let before = fingerprint(&mut app, &view, 200).unwrap();

    click_key(&mut app, &view, "shuffle");
    let after = fingerprint(&mut app, &view, 200).unwrap();

    assert_eq!(before, after);
}

#[test]
fn structure_signature_is_sorted_and_bounded() {
    let mut app = load_app("navbar.yaml");
    let view = app.initial_view();
    let scan = classify(&view, &app.query_elements(&view).unwrap());

    let signature = structure_signature(&scan);
    let lines: Vec<&str> = signature.lines().collect();
    let mut sorted = lines.clone();
    sorted.sort();
    assert_eq!(lines, sorted);
    assert_eq!(lines.len(), scan.len().min(MAX_STRUCTURE_ELEMENTS));
    assert!(lines.iter().any(|l| l.starts_with("Clickable:")));
}

#[test]
fn fingerprint_display_shows_structure_once_computed() {
    let mut app = load_app("send_cycle.yaml");
    let view = app.initial_view();
    let fp = fingerprint(&mut app, &view, 200).unwrap();
    assert!(fp.to_string().contains(&format!("|{}:", fp.element_count)));
    assert!(!fingerprint_of("loc", "text", 200).to_string().contains(':'));
}

// ============================================================================
// Visited set
// ============================================================================

#[test]
fn visited_set_grows_monotonically() {
    let mut state = CrawlState::new();
    let a = fingerprint_of("a", "A", 200);
    let b = fingerprint_of("b", "B", 200);

    assert!(state.mark_visited(&a));
    assert!(!state.mark_visited(&a));
    assert!(state.mark_visited(&b));

    assert!(state.is_visited(&a));
    assert_eq!(state.visited(), &[a, b]);
    assert_eq!(state.stats.visited_states, 2);
}

// ============================================================================
// Path and recorder
// ============================================================================

#[test]
fn recorded_path_is_independent_of_live_path() {
    let mut path = Path::new();
    let mut recorder = PathRecorder::new();

    path.push(step("Next", 0));
    let index = recorder.record(descriptor("Address", ElementKind::Typable), &path, 1, "loc");

    path.push(step("Confirm", 1));
    path.pop();
    path.pop();
    path.push(step("Other", 0));

    let entry = &recorder.entries()[index];
    assert_eq!(entry.path_labels(), vec!["Next"]);
    assert_eq!(entry.path[0].depth, 0);
    assert_eq!(path.labels(), vec!["Other"]);
}

#[test]
fn recorder_keeps_discovery_order_and_probe_results() {
    let path = Path::new();
    let mut recorder = PathRecorder::new();
    recorder.record(descriptor("Amount", ElementKind::Typable), &path, 0, "a");
    let second = recorder.record(descriptor("Memo", ElementKind::Typable), &path, 0, "a");
    recorder.set_probe_result(second, false);
    recorder.set_probe_result(99, true);

    let report = recorder.finalize(RunStats::default());
    assert_eq!(report.total_inputs(), 2);
    assert_eq!(report.inputs[0].input.label, "Amount");
    assert_eq!(report.inputs[0].probe_accepted, None);
    assert_eq!(report.inputs[1].probe_accepted, Some(false));
}

#[test]
fn crawl_state_report_carries_duration() {
    let state = CrawlState::new();
    let report = state.into_report(1234);
    assert_eq!(report.stats.duration_ms, Some(1234));
    assert!(report.inputs.is_empty());
}
