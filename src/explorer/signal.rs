use std::time::{Duration, Instant};

use crate::browser::driver::{UiDriver, ViewId};
use crate::browser::error::DriverError;

/// What was observed after an action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Signal {
    NewView(ViewId),
    Navigated,
    Timeout,
}

/// Bounds for `wait_for_signal`.
#[derive(Debug, Clone, Copy)]
pub struct SignalWait {
    pub navigation_timeout: Duration,
    pub new_view_timeout: Duration,
    pub poll_interval: Duration,
}

/// Wait for the first of: a top-level view not in `known_views`, a
/// navigation of `view`, or both deadlines passing.
///
/// A new view wins over a navigation seen in the same slice. Every wait is
/// bounded; both sources are probed at least once even with zero timeouts.
pub fn wait_for_signal(
    driver: &mut dyn UiDriver,
    view: &ViewId,
    known_views: &[ViewId],
    bounds: SignalWait,
) -> Result<Signal, DriverError> {
    let start = Instant::now();
    let nav_deadline = start + bounds.navigation_timeout;
    let view_deadline = start + bounds.new_view_timeout;
    let deadline = nav_deadline.max(view_deadline);
    let synchronous = driver.observes_synchronously();
    let mut first = true;

    loop {
        if let Some(new_view) = find_new_view(driver, known_views)? {
            return Ok(Signal::NewView(new_view));
        }

        let now = Instant::now();
        if first || now < nav_deadline {
            let slice = if synchronous {
                Duration::ZERO
            } else {
                bounds
                    .poll_interval
                    .min(nav_deadline.saturating_duration_since(now))
            };
            if driver.wait_for_navigation(view, slice)? {
                // A popup that opened alongside the navigation still takes precedence
                return Ok(match find_new_view(driver, known_views)? {
                    Some(new_view) => Signal::NewView(new_view),
                    None => Signal::Navigated,
                });
            }
        } else {
            // Navigation window closed; only new views are still awaited
            let remaining = view_deadline.saturating_duration_since(now);
            std::thread::sleep(bounds.poll_interval.min(remaining));
        }
        first = false;

        if synchronous || Instant::now() >= deadline {
            break;
        }
    }

    Ok(match find_new_view(driver, known_views)? {
        Some(new_view) => Signal::NewView(new_view),
        None => Signal::Timeout,
    })
}

fn find_new_view(
    driver: &mut dyn UiDriver,
    known_views: &[ViewId],
) -> Result<Option<ViewId>, DriverError> {
    Ok(driver
        .list_views()?
        .into_iter()
        .find(|v| !known_views.contains(v)))
}
