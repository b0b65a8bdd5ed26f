use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use tracing::{debug, error, info, warn};

use crate::browser::driver::{UiDriver, ViewId};
use crate::browser::error::DriverError;
use crate::explorer::config::ExplorerConfig;
use crate::explorer::error::{ExploreError, RunAborted};
use crate::explorer::executor::{ActionOutcome, act};
use crate::explorer::path::{Path, PathStep};
use crate::report::report_model::Report;
use crate::screen::classifier::discover;
use crate::screen::screen_model::ScannedElement;
use crate::state::crawl_state::CrawlState;
use crate::state::fingerprint::{StateFingerprint, fingerprint};
use crate::trace::logger::TraceLogger;
use crate::trace::trace::{TraceEvent, TraceKind};

// ============================================================================
// Cancellation
// ============================================================================

/// Shared stop switch, checked on every traversal entry.
///
/// An action already in flight finishes its bounded wait first.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

// ============================================================================
// Depth-first traversal engine
// ============================================================================

/// Where a traversal call is: which view, how deep, how many popups down.
#[derive(Debug, Clone)]
struct Frame {
    view: ViewId,
    depth: usize,
    nesting: usize,
}

impl Frame {
    fn child(&self) -> Frame {
        Frame {
            view: self.view.clone(),
            depth: self.depth + 1,
            nesting: self.nesting,
        }
    }

    fn subordinate(&self, view: ViewId) -> Frame {
        Frame {
            view,
            depth: self.depth + 1,
            nesting: self.nesting + 1,
        }
    }
}

/// Depth-first explorer over a live UI.
///
/// Each run owns a fresh `CrawlState`; the driver and config are borrowed.
pub struct Explorer<'a> {
    driver: &'a mut dyn UiDriver,
    config: &'a ExplorerConfig,
    trace: Option<&'a TraceLogger>,
    cancel: CancelFlag,
    root: Option<ViewId>,
}

impl<'a> Explorer<'a> {
    pub fn new(driver: &'a mut dyn UiDriver, config: &'a ExplorerConfig) -> Self {
        Self {
            driver,
            config,
            trace: None,
            cancel: CancelFlag::new(),
            root: None,
        }
    }

    pub fn with_trace(mut self, trace: &'a TraceLogger) -> Self {
        self.trace = Some(trace);
        self
    }

    pub fn with_cancel(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    /// Explore everything reachable from `start`.
    ///
    /// On session loss or cancellation the inputs found so far come back in
    /// `RunAborted::partial`.
    pub fn run(&mut self, start: &ViewId) -> Result<Report, RunAborted> {
        let started = Instant::now();
        let mut state = CrawlState::new();
        let mut path = Path::new();
        self.root = Some(start.clone());

        info!(view = %start, max_depth = self.config.max_depth, "exploration started");

        let frame = Frame {
            view: start.clone(),
            depth: 0,
            nesting: 0,
        };
        let result = self.visit(&mut state, &mut path, &frame);

        if let Some(trace) = self.trace {
            trace.flush();
        }

        let report = state.into_report(started.elapsed().as_millis());
        match result {
            Ok(()) => {
                info!(
                    inputs = report.total_inputs(),
                    states = report.stats.visited_states,
                    clicks = report.stats.clicks,
                    "exploration finished"
                );
                Ok(report)
            }
            Err(error) => {
                error!(%error, inputs = report.total_inputs(), "exploration aborted");
                Err(RunAborted {
                    error,
                    partial: report,
                })
            }
        }
    }

    fn visit(
        &mut self,
        state: &mut CrawlState,
        path: &mut Path,
        frame: &Frame,
    ) -> Result<(), ExploreError> {
        if self.cancel.is_cancelled() {
            return Err(ExploreError::Cancelled);
        }

        let view = &frame.view;
        let depth = frame.depth;

        // ---- Entry: have we been here? ----
        let fp = match fingerprint(&mut *self.driver, view, self.config.fingerprint_sample_chars) {
            Ok(fp) => fp,
            Err(e) => return self.abandon_branch(state, e, "fingerprint"),
        };

        if !state.mark_visited(&fp) {
            debug!(depth, state = %fp, "state already explored");
            self.emit(
                TraceEvent::now(TraceKind::StateRevisited, view, depth)
                    .with_fingerprint(&fp)
                    .with_path(path),
            );
            return Ok(());
        }

        state.stats.max_depth_reached = state.stats.max_depth_reached.max(depth);
        info!(depth, location = %fp.location, "new state");
        self.emit(
            TraceEvent::now(TraceKind::StateEntered, view, depth)
                .with_fingerprint(&fp)
                .with_path(path),
        );

        // ---- Discover: new elements only, stamped at this depth ----
        let nodes = match self.driver.query_elements(view) {
            Ok(nodes) => nodes,
            Err(e) => return self.abandon_branch(state, e, "query_elements"),
        };
        let scan = discover(view, &nodes, &state.stamps);
        for element in scan.clickables.iter().chain(scan.typables.iter()) {
            state.stamps.stamp(element.key(), depth);
        }

        debug!(
            depth,
            clickables = scan.clickables.len(),
            typables = scan.typables.len(),
            "elements discovered"
        );

        // ---- Record: typables are kept even when the guard fires ----
        for typable in &scan.typables {
            let index = state
                .recorder
                .record(typable.descriptor.clone(), path, depth, &fp.location);
            info!(depth, label = %typable.descriptor.label, path = ?path.labels(), "input discovered");

            if self.config.probe_inputs {
                self.probe(state, index, typable)?;
            }
        }

        // ---- Guard ----
        let past_max = depth > self.config.max_depth;
        let past_cutoff = self
            .config
            .secondary_depth_no_input_cutoff
            .is_some_and(|cutoff| depth > cutoff && scan.typables.is_empty());
        if past_max || past_cutoff {
            state.stats.guarded_states += 1;
            debug!(depth, past_max, past_cutoff, "depth guard, not clicking");
            self.emit(
                TraceEvent::now(TraceKind::Guarded, view, depth)
                    .with_fingerprint(&fp)
                    .with_path(path),
            );
            return Ok(());
        }

        // ---- Act & recurse ----
        let mut queue = self.click_order(scan.clickables);
        for i in 0..queue.len() {
            let target = queue[i].clone();
            if self.config.should_skip(&target.descriptor.label) {
                state.stats.skipped_clickables += 1;
                debug!(label = %target.descriptor.label, "skipped by label rule");
                continue;
            }

            path.push(PathStep::from_descriptor(&target.descriptor, depth));
            let result = self.click_and_descend(state, path, frame, &target);
            path.pop();
            result?;

            self.rebind_siblings(view, &fp, &mut queue[i + 1..])?;
        }

        Ok(())
    }

    /// After a subtree that navigated away and came back, the remaining
    /// siblings still carry the old navigation epoch. If the view shows this
    /// state again, point them at the re-rendered nodes with the same key.
    fn rebind_siblings(
        &mut self,
        view: &ViewId,
        fp: &StateFingerprint,
        remaining: &mut [ScannedElement],
    ) -> Result<(), ExploreError> {
        if remaining.is_empty() {
            return Ok(());
        }

        let current = match fingerprint(&mut *self.driver, view, self.config.fingerprint_sample_chars) {
            Ok(current) => current,
            Err(e) => {
                self.check_fatal(&e)?;
                return Ok(());
            }
        };
        if &current != fp {
            return Ok(());
        }

        let nodes = match self.driver.query_elements(view) {
            Ok(nodes) => nodes,
            Err(e) => {
                self.check_fatal(&e)?;
                return Ok(());
            }
        };
        for sibling in remaining.iter_mut() {
            if let Some(node) = nodes.iter().find(|n| n.key == sibling.element.key) {
                sibling.element.epoch = node.epoch;
            }
        }
        Ok(())
    }

    fn click_and_descend(
        &mut self,
        state: &mut CrawlState,
        path: &mut Path,
        frame: &Frame,
        target: &ScannedElement,
    ) -> Result<(), ExploreError> {
        let view = &frame.view;
        let views_before = match self.driver.list_views() {
            Ok(views) => views,
            Err(e) => {
                self.check_fatal(&e)?;
                vec![view.clone()]
            }
        };

        state.stats.clicks += 1;
        let outcome = match act(&mut *self.driver, self.config, target) {
            Ok(outcome) => outcome,
            Err(e) => {
                self.check_fatal(&e)?;
                self.count_recovered(state, &e);
                warn!(label = %target.descriptor.label, error = %e, "action failed, treating as no effect");
                ActionOutcome::NoEffect
            }
        };

        debug!(depth = frame.depth, label = %target.descriptor.label, %outcome, "clicked");
        self.emit(
            TraceEvent::now(TraceKind::Action, view, frame.depth)
                .with_label(&target.descriptor.label)
                .with_outcome(&outcome)
                .with_path(path),
        );

        match outcome {
            ActionOutcome::NewView(new_view) => {
                let explored = if frame.nesting < self.config.max_view_nesting {
                    self.visit(state, path, &frame.subordinate(new_view.clone()))
                } else {
                    debug!(view = %new_view, "view nesting limit reached, closing without exploring");
                    Ok(())
                };
                let restored = self.close_new_views(state, &views_before, view, frame.depth);
                explored?;
                restored?;
            }
            ActionOutcome::Navigated => {
                self.visit(state, path, &frame.child())?;
                self.navigate_back(state, frame)?;
            }
            ActionOutcome::Mutated | ActionOutcome::NoEffect => {
                // A delayed render may still have revealed something; the
                // fingerprint check on entry stops redundant work.
                self.visit(state, path, &frame.child())?;
            }
        }

        Ok(())
    }

    /// Close every view that was not open before the click, then put the
    /// originating view back in front.
    fn close_new_views(
        &mut self,
        state: &mut CrawlState,
        views_before: &[ViewId],
        origin: &ViewId,
        depth: usize,
    ) -> Result<(), ExploreError> {
        let current = match self.driver.list_views() {
            Ok(views) => views,
            Err(e) => {
                self.check_fatal(&e)?;
                Vec::new()
            }
        };

        for stray in current.iter().filter(|v| !views_before.contains(v)) {
            match self.driver.close_view(stray) {
                Ok(()) => {
                    state.stats.views_closed += 1;
                    debug!(view = %stray, "closed subordinate view");
                }
                Err(e) => {
                    self.check_fatal(&e)?;
                    warn!(view = %stray, error = %e, "failed to close subordinate view");
                }
            }
        }

        if let Err(e) = self.driver.bring_to_front(origin) {
            self.check_fatal(&e)?;
            warn!(view = %origin, error = %e, "failed to refocus originating view");
        }

        self.emit(TraceEvent::now(TraceKind::Backtrack, origin, depth).with_note("closed new views"));
        Ok(())
    }

    fn navigate_back(&mut self, state: &mut CrawlState, frame: &Frame) -> Result<(), ExploreError> {
        let went_back = match self.driver.go_back(&frame.view, self.config.navigation_timeout()) {
            Ok(went_back) => went_back,
            Err(e) => {
                self.check_fatal(&e)?;
                false
            }
        };

        if !went_back {
            state.stats.back_failures += 1;
            warn!(depth = frame.depth, view = %frame.view, "back navigation failed, continuing from current state");
        }
        self.emit(
            TraceEvent::now(TraceKind::Backtrack, &frame.view, frame.depth)
                .with_note(if went_back { "back" } else { "back failed" }),
        );
        Ok(())
    }

    fn probe(
        &mut self,
        state: &mut CrawlState,
        index: usize,
        typable: &ScannedElement,
    ) -> Result<(), ExploreError> {
        state.stats.fills += 1;
        match act(&mut *self.driver, self.config, typable) {
            Ok(outcome) => {
                state
                    .recorder
                    .set_probe_result(index, outcome == ActionOutcome::Mutated);
            }
            Err(e) => {
                self.check_fatal(&e)?;
                self.count_recovered(state, &e);
                warn!(label = %typable.descriptor.label, error = %e, "probe fill failed");
            }
        }
        Ok(())
    }

    /// Priority-labelled clickables first, otherwise visual order.
    fn click_order(&self, clickables: Vec<ScannedElement>) -> Vec<ScannedElement> {
        let (mut first, rest): (Vec<_>, Vec<_>) = clickables
            .into_iter()
            .partition(|c| self.config.is_priority(&c.descriptor.label));
        first.extend(rest);
        first
    }

    /// End the current branch on a recoverable scan failure; propagate fatal ones.
    fn abandon_branch(
        &self,
        state: &mut CrawlState,
        error: DriverError,
        operation: &str,
    ) -> Result<(), ExploreError> {
        self.check_fatal(&error)?;
        state.stats.action_failures += 1;
        warn!(operation, error = %error, "state could not be inspected, abandoning branch");
        Ok(())
    }

    fn check_fatal(&self, error: &DriverError) -> Result<(), ExploreError> {
        let root_gone = matches!(error, DriverError::UnknownView(v) if Some(v) == self.root.as_ref());
        if error.is_fatal() || root_gone {
            return Err(ExploreError::SessionLost(clone_for_report(error)));
        }
        Ok(())
    }

    fn count_recovered(&self, state: &mut CrawlState, error: &DriverError) {
        if error.is_stale() {
            state.stats.stale_elements += 1;
        } else if error.is_timeout() {
            state.stats.action_timeouts += 1;
        } else {
            state.stats.action_failures += 1;
        }
    }

    fn emit(&self, event: TraceEvent) {
        if let Some(trace) = self.trace {
            trace.log(&event);
        }
    }
}

/// `DriverError` carries non-clonable sources; keep the message.
fn clone_for_report(error: &DriverError) -> DriverError {
    match error {
        DriverError::SessionLost(msg) => DriverError::SessionLost(msg.clone()),
        other => DriverError::SessionLost(other.to_string()),
    }
}

/// Explore from `start` with a fresh state and no trace.
pub fn explore(
    driver: &mut dyn UiDriver,
    config: &ExplorerConfig,
    start: &ViewId,
) -> Result<Report, RunAborted> {
    Explorer::new(driver, config).run(start)
}
