//! Single-active-dialog coordinator
//!
//! The coordinator is responsible for:
//! - Keeping at most one dialog on screen
//! - Swapping dialogs through a closed frame so the outgoing dialog's exit
//!   animation finishes before the incoming one mounts
//! - Holding a closed dialog's payload until its fade-out is over
//! - Cancelling its previous timer before scheduling another

use super::types::{DialogKind, DialogState};
use crate::console::{
    events::{ConsoleEvent, EventSink},
    timers::{TimerHandle, TimerRegistry},
    types::{ConsoleError, ConsoleResult, Entity, ScreenTimer},
};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Default delay between a dialog closing and the next one opening
pub const DEFAULT_TRANSITION_DELAY: Duration = Duration::from_millis(300);

/// What an open request did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogTransition {
    /// The dialog is on screen now
    Opened,
    /// Another dialog is closing first; this one follows after the transition delay
    Queued,
}

#[derive(Debug)]
struct QueuedOpen<K, E> {
    kind: K,
    payload: Option<Arc<E>>,
}

/// Serializes which dialog is visible
#[derive(Debug)]
pub struct ModalCoordinator<K, E> {
    state: DialogState<K, E>,

    /// Payload of the dialog currently fading out
    closing_payload: Option<Arc<E>>,

    /// Dialog waiting for the previous one to finish closing
    queued: Option<QueuedOpen<K, E>>,

    /// The one timer this coordinator may have in flight
    timer: Option<TimerHandle>,

    /// Bumped whenever `timer` is replaced; stale firings compare against it
    generation: u64,

    transition_delay: Duration,

    events: EventSink,
}

impl<K: DialogKind, E: Entity> ModalCoordinator<K, E> {
    pub fn new(transition_delay: Duration) -> Self {
        Self {
            state: DialogState::Closed,
            closing_payload: None,
            queued: None,
            timer: None,
            generation: 0,
            transition_delay,
            events: EventSink::default(),
        }
    }

    pub fn set_event_sink(&mut self, events: EventSink) {
        self.events = events;
    }

    /// Open `kind` with an optional payload.
    ///
    /// From `Closed` the dialog opens immediately. From `Open` the current
    /// dialog closes now and `kind` opens after the transition delay. A
    /// request made while that swap is in flight takes the queued slot and
    /// waits for the same reveal, so the outgoing dialog always finishes
    /// its exit.
    pub fn open(
        &mut self,
        kind: K,
        payload: Option<Arc<E>>,
        timers: &mut TimerRegistry<ScreenTimer>,
    ) -> ConsoleResult<DialogTransition> {
        Self::validate_payload(payload.as_deref())?;

        if !self.state.is_open() {
            if let Some(queued) = self.queued.as_mut() {
                debug!("Queued dialog {} superseded by {}", queued.kind.name(), kind.name());
                *queued = QueuedOpen { kind, payload };
                return Ok(DialogTransition::Queued);
            }
        }

        self.cancel_timer(timers);

        match std::mem::take(&mut self.state) {
            DialogState::Open {
                kind: previous,
                payload: previous_payload,
                ..
            } => {
                debug!("Swapping dialog {} for {}", previous.name(), kind.name());
                self.closing_payload = previous_payload;
                self.events.send(ConsoleEvent::DialogClosed {
                    kind: previous.name().to_string(),
                });

                self.queued = Some(QueuedOpen { kind, payload });
                self.timer = Some(timers.schedule(
                    self.transition_delay,
                    ScreenTimer::RevealDialog {
                        generation: self.generation,
                    },
                ));
                Ok(DialogTransition::Queued)
            }
            DialogState::Closed => {
                self.show(kind, payload);
                Ok(DialogTransition::Opened)
            }
        }
    }

    /// A payload, when present, must carry a usable id
    pub fn validate_payload(payload: Option<&E>) -> ConsoleResult<()> {
        match payload {
            Some(entity) if entity.usable_id().is_none() => {
                Err(ConsoleError::MalformedPayload(format!("{:?}", entity)))
            }
            _ => Ok(()),
        }
    }

    /// Close the visible dialog.
    ///
    /// Also drops a dialog still waiting behind a swap, so it can't appear
    /// after the user asked for everything to close.
    pub fn close(&mut self, timers: &mut TimerRegistry<ScreenTimer>) -> ConsoleResult<()> {
        match std::mem::take(&mut self.state) {
            DialogState::Open { kind, payload, .. } => {
                debug!("Closing dialog {}", kind.name());
                self.closing_payload = payload;
                self.events.send(ConsoleEvent::DialogClosed {
                    kind: kind.name().to_string(),
                });
                self.schedule_release(timers);
                Ok(())
            }
            DialogState::Closed => match self.queued.take() {
                Some(dropped) => {
                    debug!("Dropped queued dialog {}", dropped.kind.name());
                    self.schedule_release(timers);
                    Ok(())
                }
                None => Err(ConsoleError::NoOpenDialog),
            },
        }
    }

    /// Apply a fired timer. Returns false for timers that were superseded.
    pub fn on_timer(&mut self, timer: ScreenTimer) -> bool {
        match timer {
            ScreenTimer::RevealDialog { generation } if generation == self.generation => {
                self.timer = None;
                match self.queued.take() {
                    Some(QueuedOpen { kind, payload }) => {
                        self.show(kind, payload);
                        true
                    }
                    None => false,
                }
            }
            ScreenTimer::ReleasePayload { generation } if generation == self.generation => {
                self.timer = None;
                self.closing_payload = None;
                true
            }
            ScreenTimer::RevealDialog { generation }
            | ScreenTimer::ReleasePayload { generation } => {
                debug!(
                    "Ignoring stale dialog timer (generation {}, current {})",
                    generation, self.generation
                );
                false
            }
            _ => false,
        }
    }

    /// Mark the open dialog's form as having unsaved edits, or not
    pub fn set_dirty(&mut self, value: bool) -> ConsoleResult<()> {
        match &mut self.state {
            DialogState::Open { dirty, .. } => {
                *dirty = value;
                Ok(())
            }
            DialogState::Closed => Err(ConsoleError::NoOpenDialog),
        }
    }

    pub fn clear_dirty(&mut self) {
        if let DialogState::Open { dirty, .. } = &mut self.state {
            *dirty = false;
        }
    }

    pub fn is_dirty(&self) -> bool {
        self.state.is_dirty()
    }

    pub fn is_open(&self) -> bool {
        self.state.is_open()
    }

    pub fn active_kind(&self) -> Option<K> {
        self.state.kind()
    }

    /// Payload of the open dialog, or of the one still fading out
    pub fn active_payload(&self) -> Option<&Arc<E>> {
        self.state.payload().or(self.closing_payload.as_ref())
    }

    /// Whether a dialog is waiting behind a closing one
    pub fn is_transitioning(&self) -> bool {
        self.queued.is_some()
    }

    pub fn state(&self) -> &DialogState<K, E> {
        &self.state
    }

    /// Drop everything, including timers. Used when the screen goes away.
    pub fn teardown(&mut self, timers: &mut TimerRegistry<ScreenTimer>) {
        self.cancel_timer(timers);
        self.state = DialogState::Closed;
        self.queued = None;
        self.closing_payload = None;
    }

    fn show(&mut self, kind: K, payload: Option<Arc<E>>) {
        debug!("Opening dialog {}", kind.name());
        self.closing_payload = None;
        self.events.send(ConsoleEvent::DialogOpened {
            kind: kind.name().to_string(),
            payload_id: payload.as_ref().and_then(|entity| entity.usable_id()),
        });
        self.state = DialogState::Open {
            kind,
            payload,
            dirty: false,
        };
    }

    fn schedule_release(&mut self, timers: &mut TimerRegistry<ScreenTimer>) {
        self.cancel_timer(timers);
        self.timer = Some(timers.schedule(
            self.transition_delay,
            ScreenTimer::ReleasePayload {
                generation: self.generation,
            },
        ));
    }

    fn cancel_timer(&mut self, timers: &mut TimerRegistry<ScreenTimer>) {
        if let Some(handle) = self.timer.take() {
            timers.cancel(handle);
        }
        self.generation += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::console::dialogs::types::test_kinds::TestDialog;
    use crate::console::types::Record;

    type Coordinator = ModalCoordinator<TestDialog, Record>;

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    fn advance(
        coordinator: &mut Coordinator,
        timers: &mut TimerRegistry<ScreenTimer>,
        by: Duration,
    ) {
        let until = timers.now() + by;
        while let Some(fired) = timers.pop_due(until) {
            coordinator.on_timer(fired.action);
        }
        timers.settle_at(until);
    }

    fn row(id: &str) -> Option<Arc<Record>> {
        Some(Arc::new(Record::new(id)))
    }

    #[test]
    fn test_open_from_closed_is_immediate() {
        let mut timers = TimerRegistry::new();
        let mut coordinator = Coordinator::new(DEFAULT_TRANSITION_DELAY);

        let transition = coordinator.open(TestDialog::Edit, row("7"), &mut timers).unwrap();
        assert_eq!(transition, DialogTransition::Opened);
        assert_eq!(coordinator.active_kind(), Some(TestDialog::Edit));
        assert_eq!(coordinator.active_payload().unwrap().id, Some("7".into()));
        assert!(!coordinator.is_dirty());
    }

    #[test]
    fn test_swap_goes_through_closed_frame() {
        let mut timers = TimerRegistry::new();
        let mut coordinator = Coordinator::new(DEFAULT_TRANSITION_DELAY);

        coordinator.open(TestDialog::Edit, row("1"), &mut timers).unwrap();
        let transition = coordinator.open(TestDialog::Delete, row("2"), &mut timers).unwrap();

        assert_eq!(transition, DialogTransition::Queued);
        assert_eq!(coordinator.active_kind(), None);
        assert!(coordinator.is_transitioning());
        // The outgoing dialog still sees its payload while fading out.
        assert_eq!(coordinator.active_payload().unwrap().id, Some("1".into()));

        advance(&mut coordinator, &mut timers, ms(299));
        assert_eq!(coordinator.active_kind(), None);

        advance(&mut coordinator, &mut timers, ms(1));
        assert_eq!(coordinator.active_kind(), Some(TestDialog::Delete));
        assert_eq!(coordinator.active_payload().unwrap().id, Some("2".into()));
    }

    #[test]
    fn test_rapid_opens_collapse_to_latest() {
        let mut timers = TimerRegistry::new();
        let mut coordinator = Coordinator::new(DEFAULT_TRANSITION_DELAY);

        coordinator.open(TestDialog::Add, None, &mut timers).unwrap();
        coordinator.open(TestDialog::Edit, None, &mut timers).unwrap();
        let transition = coordinator.open(TestDialog::Delete, None, &mut timers).unwrap();
        assert_eq!(transition, DialogTransition::Queued);
        assert_eq!(coordinator.active_kind(), None);
        assert_eq!(timers.len(), 1);

        advance(&mut coordinator, &mut timers, ms(299));
        assert_eq!(coordinator.active_kind(), None);

        advance(&mut coordinator, &mut timers, ms(1));
        assert_eq!(coordinator.active_kind(), Some(TestDialog::Delete));
        assert!(!coordinator.is_transitioning());
    }

    #[test]
    fn test_open_during_swap_waits_for_exit() {
        let mut timers = TimerRegistry::new();
        let mut coordinator = Coordinator::new(DEFAULT_TRANSITION_DELAY);

        coordinator.open(TestDialog::Add, row("1"), &mut timers).unwrap();
        advance(&mut coordinator, &mut timers, ms(1000));

        coordinator.open(TestDialog::Edit, row("2"), &mut timers).unwrap();
        advance(&mut coordinator, &mut timers, ms(10));
        coordinator.open(TestDialog::Delete, row("3"), &mut timers).unwrap();

        // Add is still fading out with its own payload.
        assert_eq!(coordinator.active_kind(), None);
        assert_eq!(coordinator.active_payload().unwrap().id, Some("1".into()));
        assert_eq!(timers.next_deadline(), Some(ms(1300)));

        advance(&mut coordinator, &mut timers, ms(289));
        assert_eq!(coordinator.active_kind(), None);

        advance(&mut coordinator, &mut timers, ms(1));
        assert_eq!(coordinator.active_kind(), Some(TestDialog::Delete));
        assert_eq!(coordinator.active_payload().unwrap().id, Some("3".into()));
    }

    #[test]
    fn test_two_opens_before_delay_end_with_second() {
        let mut timers = TimerRegistry::new();
        let mut coordinator = Coordinator::new(DEFAULT_TRANSITION_DELAY);
        coordinator.open(TestDialog::Add, None, &mut timers).unwrap();

        coordinator.open(TestDialog::Edit, None, &mut timers).unwrap();
        advance(&mut coordinator, &mut timers, ms(100));
        coordinator.close(&mut timers).unwrap();
        coordinator.open(TestDialog::Delete, None, &mut timers).unwrap();

        for _ in 0..10 {
            advance(&mut coordinator, &mut timers, ms(100));
            assert_eq!(coordinator.active_kind(), Some(TestDialog::Delete));
        }
    }

    #[test]
    fn test_close_releases_payload_after_delay() {
        let mut timers = TimerRegistry::new();
        let mut coordinator = Coordinator::new(DEFAULT_TRANSITION_DELAY);

        coordinator.open(TestDialog::Delete, row("9"), &mut timers).unwrap();
        coordinator.set_dirty(true).unwrap();
        coordinator.close(&mut timers).unwrap();

        assert!(!coordinator.is_open());
        assert!(!coordinator.is_dirty());
        assert!(coordinator.active_payload().is_some());

        advance(&mut coordinator, &mut timers, ms(300));
        assert!(coordinator.active_payload().is_none());
    }

    #[test]
    fn test_close_cancels_queued_reveal() {
        let mut timers = TimerRegistry::new();
        let mut coordinator = Coordinator::new(DEFAULT_TRANSITION_DELAY);

        coordinator.open(TestDialog::Add, None, &mut timers).unwrap();
        coordinator.open(TestDialog::Edit, None, &mut timers).unwrap();
        coordinator.close(&mut timers).unwrap();

        advance(&mut coordinator, &mut timers, ms(1000));
        assert_eq!(coordinator.active_kind(), None);
    }

    #[test]
    fn test_close_when_closed_is_precondition_error() {
        let mut timers = TimerRegistry::new();
        let mut coordinator = Coordinator::new(DEFAULT_TRANSITION_DELAY);

        assert_eq!(coordinator.close(&mut timers), Err(ConsoleError::NoOpenDialog));
        assert!(timers.is_empty());
    }

    #[test]
    fn test_reopen_cancels_pending_release() {
        let mut timers = TimerRegistry::new();
        let mut coordinator = Coordinator::new(DEFAULT_TRANSITION_DELAY);

        coordinator.open(TestDialog::Edit, row("1"), &mut timers).unwrap();
        coordinator.close(&mut timers).unwrap();
        coordinator.open(TestDialog::Edit, row("2"), &mut timers).unwrap();

        advance(&mut coordinator, &mut timers, ms(1000));
        assert_eq!(coordinator.active_payload().unwrap().id, Some("2".into()));
        assert!(timers.is_empty());
    }

    #[test]
    fn test_rejects_payload_without_id() {
        let mut timers = TimerRegistry::new();
        let mut coordinator = Coordinator::new(DEFAULT_TRANSITION_DELAY);

        let anonymous = Some(Arc::new(Record::anonymous()));
        let result = coordinator.open(TestDialog::Edit, anonymous, &mut timers);
        assert!(matches!(result, Err(ConsoleError::MalformedPayload(_))));
        assert!(!coordinator.is_open());
    }

    #[test]
    fn test_stale_timer_is_ignored() {
        let mut timers = TimerRegistry::new();
        let mut coordinator = Coordinator::new(DEFAULT_TRANSITION_DELAY);
        coordinator.open(TestDialog::Add, None, &mut timers).unwrap();

        assert!(!coordinator.on_timer(ScreenTimer::RevealDialog { generation: 0 }));
        assert_eq!(coordinator.active_kind(), Some(TestDialog::Add));
    }

    #[test]
    fn test_set_dirty_requires_open_dialog() {
        let mut coordinator = Coordinator::new(DEFAULT_TRANSITION_DELAY);
        assert_eq!(coordinator.set_dirty(true), Err(ConsoleError::NoOpenDialog));
        assert!(!coordinator.is_dirty());
    }

    #[test]
    fn test_events_are_published() {
        let (sender, mut receiver) = tokio::sync::mpsc::unbounded_channel();
        let mut timers = TimerRegistry::new();
        let mut coordinator = Coordinator::new(DEFAULT_TRANSITION_DELAY);
        coordinator.set_event_sink(EventSink::new(sender));

        coordinator.open(TestDialog::Delete, row("001"), &mut timers).unwrap();
        coordinator.close(&mut timers).unwrap();

        assert_eq!(
            receiver.try_recv().unwrap(),
            ConsoleEvent::DialogOpened {
                kind: "delete".into(),
                payload_id: Some("001".into()),
            }
        );
        assert_eq!(
            receiver.try_recv().unwrap(),
            ConsoleEvent::DialogClosed { kind: "delete".into() }
        );
    }
}
