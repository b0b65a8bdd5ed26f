use std::fmt;

use serde::Serialize;
use tracing::debug;

use crate::browser::driver::{UiDriver, ViewId};
use crate::browser::error::DriverError;
use crate::explorer::config::ExplorerConfig;
use crate::explorer::signal::{Signal, SignalWait, wait_for_signal};
use crate::screen::classifier::classify;
use crate::screen::screen_model::{ElementKind, ScannedElement};
use crate::state::fingerprint::normalize_text;

/// Observed side effect of one action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ActionOutcome {
    NoEffect,
    Mutated,
    Navigated,
    NewView(ViewId),
}

impl fmt::Display for ActionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionOutcome::NoEffect => f.write_str("no-effect"),
            ActionOutcome::Mutated => f.write_str("mutated"),
            ActionOutcome::Navigated => f.write_str("navigated"),
            ActionOutcome::NewView(view) => write!(f, "new-view({})", view),
        }
    }
}

/// Perform the action a scanned element calls for and classify its effect.
///
/// Failures (stale reference, timeout, session loss) are returned as-is;
/// deciding which of them are survivable is the caller's job.
pub fn act(
    driver: &mut dyn UiDriver,
    config: &ExplorerConfig,
    target: &ScannedElement,
) -> Result<ActionOutcome, DriverError> {
    match target.kind() {
        ElementKind::Clickable => click_and_observe(driver, config, target),
        ElementKind::Typable => fill_probe(driver, config, target),
        ElementKind::Ignored => Ok(ActionOutcome::NoEffect),
    }
}

fn click_and_observe(
    driver: &mut dyn UiDriver,
    config: &ExplorerConfig,
    target: &ScannedElement,
) -> Result<ActionOutcome, DriverError> {
    let view = &target.element.view;
    let views_before = driver.list_views()?;
    let before = classify(view, &driver.query_elements(view)?);
    let text_before = normalize_text(&driver.text_content_digest(view)?);

    driver.click(&target.element)?;

    let bounds = SignalWait {
        navigation_timeout: config.navigation_timeout(),
        new_view_timeout: config.new_view_timeout(),
        poll_interval: config.poll_interval(),
    };
    let signal = wait_for_signal(driver, view, &views_before, bounds)?;
    driver.settle(config.settle_delay())?;

    let outcome = match signal {
        Signal::NewView(new_view) => ActionOutcome::NewView(new_view),
        Signal::Navigated => ActionOutcome::Navigated,
        Signal::Timeout => {
            let after = classify(view, &driver.query_elements(view)?);
            let text_after = normalize_text(&driver.text_content_digest(view)?);
            if after.keys() != before.keys() || text_after != text_before {
                ActionOutcome::Mutated
            } else {
                ActionOutcome::NoEffect
            }
        }
    };

    debug!(label = %target.descriptor.label, %outcome, "click observed");
    Ok(outcome)
}

fn fill_probe(
    driver: &mut dyn UiDriver,
    config: &ExplorerConfig,
    target: &ScannedElement,
) -> Result<ActionOutcome, DriverError> {
    let accepted = driver.fill(&target.element, &config.probe_value)?;
    driver.settle(config.settle_delay())?;

    debug!(label = %target.descriptor.label, accepted, "probe filled");
    Ok(if accepted {
        ActionOutcome::Mutated
    } else {
        ActionOutcome::NoEffect
    })
}
