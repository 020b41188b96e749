//! Unsaved-changes guard
//!
//! Sits in front of the coordinator. While the open dialog is dirty, open and
//! close requests are parked behind the built-in discard confirmation and only
//! run if the user confirms.

use super::{
    coordinator::{DialogTransition, ModalCoordinator},
    types::{DialogKind, CONFIRM_DISCARD},
};
use crate::console::{
    events::{ConsoleEvent, EventSink},
    timers::TimerRegistry,
    types::{ConsoleError, ConsoleResult, Entity, ScreenTimer},
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

type Deferred<K, E> = Box<
    dyn FnOnce(&mut ModalCoordinator<K, E>, &mut TimerRegistry<ScreenTimer>) -> ConsoleResult<()>,
>;

/// A transition parked behind the discard confirmation
pub struct PendingTransition<K, E> {
    description: String,
    action: Deferred<K, E>,
}

impl<K, E> PendingTransition<K, E> {
    pub fn description(&self) -> &str {
        &self.description
    }
}

impl<K, E> std::fmt::Debug for PendingTransition<K, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingTransition")
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

/// What the guard did with a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardOutcome {
    /// Passed straight to the coordinator
    Forwarded,
    /// Parked until the user confirms discarding their edits
    AwaitingConfirmation,
}

/// Wraps a [`ModalCoordinator`] with discard protection
#[derive(Debug)]
pub struct UnsavedChangesGuard<K, E> {
    coordinator: ModalCoordinator<K, E>,

    /// At most one parked transition; its presence means the confirmation is showing
    pending: Option<PendingTransition<K, E>>,

    /// How many parked transitions were replaced before being resolved
    overwritten: u64,

    events: EventSink,
}

impl<K: DialogKind, E: Entity + 'static> UnsavedChangesGuard<K, E> {
    pub fn new(transition_delay: Duration) -> Self {
        Self {
            coordinator: ModalCoordinator::new(transition_delay),
            pending: None,
            overwritten: 0,
            events: EventSink::default(),
        }
    }

    pub fn set_event_sink(&mut self, events: EventSink) {
        self.coordinator.set_event_sink(events.clone());
        self.events = events;
    }

    /// Open `kind`, asking first if the current dialog has unsaved edits
    pub fn request_open(
        &mut self,
        kind: K,
        payload: Option<Arc<E>>,
        timers: &mut TimerRegistry<ScreenTimer>,
    ) -> ConsoleResult<GuardOutcome> {
        ModalCoordinator::<K, E>::validate_payload(payload.as_deref())?;

        if !self.coordinator.is_dirty() {
            self.drop_stale_confirmation();
            self.coordinator.open(kind, payload, timers)?;
            return Ok(GuardOutcome::Forwarded);
        }

        self.park(
            format!("open {}", kind.name()),
            Box::new(
                move |coordinator: &mut ModalCoordinator<K, E>,
                      timers: &mut TimerRegistry<ScreenTimer>| {
                    coordinator.open(kind, payload, timers).map(|_: DialogTransition| ())
                },
            ),
        );
        Ok(GuardOutcome::AwaitingConfirmation)
    }

    /// Close the open dialog, asking first if it has unsaved edits
    pub fn request_close(
        &mut self,
        timers: &mut TimerRegistry<ScreenTimer>,
    ) -> ConsoleResult<GuardOutcome> {
        if !self.coordinator.is_dirty() {
            self.drop_stale_confirmation();
            self.coordinator.close(timers)?;
            return Ok(GuardOutcome::Forwarded);
        }

        self.park(
            "close".to_string(),
            Box::new(
                |coordinator: &mut ModalCoordinator<K, E>,
                 timers: &mut TimerRegistry<ScreenTimer>| {
                    coordinator.close(timers)
                },
            ),
        );
        Ok(GuardOutcome::AwaitingConfirmation)
    }

    /// The user chose to discard their edits: run the parked transition once
    pub fn confirm(&mut self, timers: &mut TimerRegistry<ScreenTimer>) -> ConsoleResult<()> {
        let pending = self.pending.take().ok_or(ConsoleError::NothingPending("confirm"))?;
        debug!("Discarding edits to {}", pending.description);

        self.coordinator.clear_dirty();
        let result = (pending.action)(&mut self.coordinator, timers);
        self.coordinator.clear_dirty();

        self.events.send(ConsoleEvent::DiscardConfirmed);
        result
    }

    /// The user kept editing: drop the parked transition, leave the dialog as it was
    pub fn cancel(&mut self) -> ConsoleResult<()> {
        let pending = self.pending.take().ok_or(ConsoleError::NothingPending("cancel"))?;
        debug!("Kept edits; dropped pending {}", pending.description);

        self.events.send(ConsoleEvent::DiscardCancelled);
        Ok(())
    }

    /// Set by the dialog's form content
    pub fn mark_dirty(&mut self, dirty: bool) -> ConsoleResult<()> {
        self.coordinator.set_dirty(dirty)
    }

    /// Close everything without asking: any parked transition is dropped unrun
    pub fn dismiss_all(&mut self, timers: &mut TimerRegistry<ScreenTimer>) {
        if let Some(pending) = self.pending.take() {
            debug!("Dismissed confirmation for {}", pending.description);
        }
        match self.coordinator.close(timers) {
            Ok(()) | Err(ConsoleError::NoOpenDialog) => {}
            Err(error) => warn!("Failed to close dialog: {}", error),
        }
    }

    /// Whether the discard confirmation is showing
    pub fn is_confirming(&self) -> bool {
        self.pending.is_some()
    }

    /// The parked transition, if any
    pub fn pending(&self) -> Option<&PendingTransition<K, E>> {
        self.pending.as_ref()
    }

    /// Name of the visible confirmation dialog
    pub fn confirmation_kind(&self) -> Option<&'static str> {
        self.pending.as_ref().map(|_| CONFIRM_DISCARD)
    }

    pub fn overwritten_count(&self) -> u64 {
        self.overwritten
    }

    pub fn coordinator(&self) -> &ModalCoordinator<K, E> {
        &self.coordinator
    }

    pub fn on_timer(&mut self, timer: ScreenTimer) -> bool {
        self.coordinator.on_timer(timer)
    }

    pub fn teardown(&mut self, timers: &mut TimerRegistry<ScreenTimer>) {
        self.pending = None;
        self.coordinator.teardown(timers);
    }

    /// Store `action` as the parked transition. Last request wins; the
    /// confirmation is already up if something was parked before.
    fn park(&mut self, description: String, action: Deferred<K, E>) {
        match self.pending.replace(PendingTransition {
            description: description.clone(),
            action,
        }) {
            Some(previous) => {
                self.overwritten += 1;
                warn!(
                    "Pending {} abandoned in favor of {}",
                    previous.description, description
                );
            }
            None => {
                debug!("Unsaved changes; asking before {}", description);
                self.events.send(ConsoleEvent::DiscardRequested);
            }
        }
    }

    fn drop_stale_confirmation(&mut self) {
        if let Some(pending) = self.pending.take() {
            debug!("Dialog is clean again; dropped pending {}", pending.description);
            self.events.send(ConsoleEvent::DiscardCancelled);
        }
    }
}
