//! Per-screen controller
//!
//! Bundles the dialog guard, the notification sequencer and the row selection
//! behind one timer registry. This is the boundary the view layer talks to:
//! every operation logs bad input and wrong-state calls and returns normally,
//! so a stray click never takes down the rest of the screen.

use crate::config::ConsoleConfig;
use crate::console::{
    dialogs::{DialogKind, UnsavedChangesGuard},
    events::{ConsoleEvent, EventSink},
    notifications::{NotificationSequencer, NotificationView},
    selection::SelectionManager,
    timers::TimerRegistry,
    types::{ConsoleError, ConsoleResult, Entity, EntityId, ScreenTimer},
};
use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Serializable view of a controller at one instant
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ControllerSnapshot {
    pub at_ms: u64,
    pub active_modal: Option<String>,
    pub payload_id: Option<EntityId>,
    pub dirty: bool,
    pub confirmation: Option<String>,
    pub notification: NotificationView,
    pub busy: bool,
    pub selected: Vec<EntityId>,
    pub overlay_active: bool,
}

/// Control layer of one dashboard screen
#[derive(Debug)]
pub struct ScreenController<K, E> {
    timers: TimerRegistry<ScreenTimer>,
    dialogs: UnsavedChangesGuard<K, E>,
    notices: NotificationSequencer,
    selection: SelectionManager,
    lock_dialogs_while_busy: bool,
    overlay_active: bool,
    events: EventSink,
}

impl<K: DialogKind, E: Entity + 'static> ScreenController<K, E> {
    pub fn new(config: &ConsoleConfig) -> Self {
        Self {
            timers: TimerRegistry::new(),
            dialogs: UnsavedChangesGuard::new(config.transition_delay()),
            notices: NotificationSequencer::new(
                config.notice_timings(),
                config.fallback_message.clone(),
            ),
            selection: SelectionManager::new(),
            lock_dialogs_while_busy: config.lock_dialogs_while_busy,
            overlay_active: false,
            events: EventSink::default(),
        }
    }

    /// Publish state changes on `sender`
    pub fn set_event_sender(&mut self, sender: mpsc::UnboundedSender<ConsoleEvent>) {
        let events = EventSink::new(sender);
        self.dialogs.set_event_sink(events.clone());
        self.notices.set_event_sink(events.clone());
        self.events = events;
    }

    // Dialogs

    /// Open the dialog named `kind`
    pub fn open_modal(&mut self, kind: &str, payload: Option<Arc<E>>) {
        match K::parse(kind) {
            Ok(kind) => self.open_dialog(kind, payload),
            Err(error) => report("open_modal", &error),
        }
    }

    /// Open `kind`, asking first if the current dialog has unsaved edits
    pub fn open_dialog(&mut self, kind: K, payload: Option<Arc<E>>) {
        let result = if self.lock_dialogs_while_busy && self.notices.is_busy() {
            Err(ConsoleError::Busy(kind.name().to_string()))
        } else {
            self.dialogs
                .request_open(kind, payload, &mut self.timers)
                .map(|_| ())
        };
        self.finish("open_modal", result);
    }

    /// Close the open dialog, asking first if it has unsaved edits
    pub fn close_all_modals(&mut self) {
        let result = self.dialogs.request_close(&mut self.timers).map(|_| ());
        self.finish("close_all_modals", result);
    }

    /// Discard the open dialog's edits and run the parked transition
    pub fn confirm_discard(&mut self) {
        let result = self.dialogs.confirm(&mut self.timers);
        self.finish("confirm_discard", result);
    }

    /// Keep editing; only the confirmation goes away
    pub fn cancel_discard(&mut self) {
        let result = self.dialogs.cancel();
        self.finish("cancel_discard", result);
    }

    pub fn active_modal_kind(&self) -> Option<&'static str> {
        self.active_dialog().map(|kind| kind.name())
    }

    pub fn active_dialog(&self) -> Option<K> {
        self.dialogs.coordinator().active_kind()
    }

    /// Payload of the open dialog, or of the one still fading out
    pub fn active_modal_payload(&self) -> Option<Arc<E>> {
        self.dialogs.coordinator().active_payload().cloned()
    }

    /// Name of the discard confirmation while it is showing
    pub fn confirmation_kind(&self) -> Option<&'static str> {
        self.dialogs.confirmation_kind()
    }

    pub fn is_dirty(&self) -> bool {
        self.dialogs.coordinator().is_dirty()
    }

    pub fn set_dirty(&mut self, dirty: bool) {
        let result = self.dialogs.mark_dirty(dirty);
        self.finish("set_dirty", result);
    }

    // Notifications

    /// Dismiss any dialog and run a success notification for `text`
    pub fn show_success_message(&mut self, text: &str) {
        self.notices.show(text, &mut self.dialogs, &mut self.timers);
        self.sync_overlay();
    }

    pub fn notification_state(&self) -> NotificationView {
        self.notices.view()
    }

    /// True while a success notification is in flight
    pub fn is_busy(&self) -> bool {
        self.notices.is_busy()
    }

    // Selection

    pub fn toggle_row(&mut self, id: impl Into<EntityId>) {
        let before = self.selection.len();
        let result = self.selection.toggle(id.into()).map(|_| ());
        self.finish_selection("toggle_row", before, result);
    }

    pub fn toggle_row_at<D: Entity>(&mut self, index: usize, dataset: &[D]) {
        let before = self.selection.len();
        let result = self.selection.toggle_at(index, dataset).map(|_| ());
        self.finish_selection("toggle_row_at", before, result);
    }

    pub fn select_all<D: Entity>(&mut self, dataset: &[D]) {
        let before = self.selection.len();
        self.selection.select_all(dataset);
        self.finish_selection("select_all", before, Ok(()));
    }

    pub fn clear_selection(&mut self) {
        let before = self.selection.len();
        self.selection.clear();
        self.finish_selection("clear_selection", before, Ok(()));
    }

    pub fn remove_from_selection(&mut self, id: impl Into<EntityId>) {
        let before = self.selection.len();
        self.selection.remove(&id.into());
        self.finish_selection("remove_from_selection", before, Ok(()));
    }

    /// Prune selections against the dataset the view is about to render
    pub fn reconcile<D: Entity>(&mut self, dataset: &[D]) {
        let before = self.selection.len();
        self.selection.reconcile(dataset);
        self.finish_selection("reconcile", before, Ok(()));
    }

    /// Whether every row of `dataset` is selected. Reconciles first.
    pub fn is_all_selected<D: Entity>(&mut self, dataset: &[D]) -> bool {
        self.reconcile(dataset);
        self.selection.all_selected(dataset)
    }

    pub fn is_row_selected(&self, id: impl Into<EntityId>) -> bool {
        self.selection.is_selected(&id.into())
    }

    pub fn selected_ids(&self) -> &BTreeSet<EntityId> {
        self.selection.selected_ids()
    }

    pub fn selected_count(&self) -> usize {
        self.selection.len()
    }

    pub fn has_selection(&self) -> bool {
        !self.selection.is_empty()
    }

    /// Selected rows of `dataset`, in dataset order
    pub fn selected_entities<'a, D: Entity>(&self, dataset: &'a [D]) -> Vec<&'a D> {
        self.selection.selected_entities(dataset)
    }

    // Overlay and time

    /// Whether a dialog, the discard confirmation or a success message is up.
    /// The view uses this to lock page scrolling.
    pub fn is_any_overlay_active(&self) -> bool {
        self.dialogs.coordinator().is_open()
            || self.dialogs.is_confirming()
            || self.notices.is_visible()
    }

    /// Current virtual time
    pub fn now(&self) -> Duration {
        self.timers.now()
    }

    /// When the next scheduled timer is due
    pub fn next_deadline(&self) -> Option<Duration> {
        self.timers.next_deadline()
    }

    /// Move the clock forward by `by`, firing everything that comes due
    pub fn advance(&mut self, by: Duration) {
        let until = self.timers.now() + by;
        self.advance_to(until);
    }

    /// Move the clock to `until`, firing everything due by then in order
    pub fn advance_to(&mut self, until: Duration) {
        while let Some(fired) = self.timers.pop_due(until) {
            if !self.dialogs.on_timer(fired.action) {
                self.notices.on_timer(fired.action, &mut self.timers);
            }
            self.sync_overlay();
        }
        self.timers.settle_at(until);
    }

    /// Fire timers until none are left
    pub fn settle(&mut self) {
        while let Some(deadline) = self.timers.next_deadline() {
            self.advance_to(deadline);
        }
    }

    /// Cancel every timer and reset dialogs and notifications.
    /// Called when the user navigates away from the screen.
    pub fn teardown(&mut self) {
        debug!("Tearing down screen controller");
        self.dialogs.teardown(&mut self.timers);
        self.notices.teardown(&mut self.timers);
        self.timers.clear();
        self.sync_overlay();
    }

    pub fn snapshot(&self) -> ControllerSnapshot {
        ControllerSnapshot {
            at_ms: self.timers.now().as_millis() as u64,
            active_modal: self.active_modal_kind().map(str::to_string),
            payload_id: self
                .active_modal_payload()
                .and_then(|entity| entity.usable_id()),
            dirty: self.is_dirty(),
            confirmation: self.confirmation_kind().map(str::to_string),
            notification: self.notification_state(),
            busy: self.is_busy(),
            selected: self.selection.selected_ids().iter().cloned().collect(),
            overlay_active: self.is_any_overlay_active(),
        }
    }

    fn finish(&mut self, operation: &str, result: ConsoleResult<()>) {
        if let Err(error) = result {
            report(operation, &error);
        }
        self.sync_overlay();
    }

    fn finish_selection(&mut self, operation: &str, before: usize, result: ConsoleResult<()>) {
        if let Err(error) = result {
            report(operation, &error);
        }
        let count = self.selection.len();
        if count != before {
            self.events.send(ConsoleEvent::SelectionChanged { count });
        }
    }

    fn sync_overlay(&mut self) {
        let active = self.is_any_overlay_active();
        if active != self.overlay_active {
            self.overlay_active = active;
            self.events.send(ConsoleEvent::OverlayChanged { active });
        }
    }
}

impl<K: DialogKind, E: Entity + 'static> Default for ScreenController<K, E> {
    fn default() -> Self {
        Self::new(&ConsoleConfig::default())
    }
}

fn report(operation: &str, error: &ConsoleError) {
    if error.is_precondition() {
        debug!("{}: {}", operation, error);
    } else {
        warn!("{}: {}", operation, error);
    }
}
