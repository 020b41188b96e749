use serde::Serialize;
use tokio::sync::mpsc;

use super::types::EntityId;

/// State changes published by a screen controller
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ConsoleEvent {
    /// A dialog became visible
    DialogOpened { kind: String, payload_id: Option<EntityId> },

    /// The visible dialog went away
    DialogClosed { kind: String },

    /// A dirty dialog's transition is waiting on the discard confirmation
    DiscardRequested,

    /// The user discarded their edits and the deferred transition ran
    DiscardConfirmed,

    /// The user kept editing; the deferred transition was dropped
    DiscardCancelled,

    /// A success message became visible
    NotificationShown { text: String },

    /// The success message started fading out
    NotificationHidden,

    /// The notification cycle finished
    NotificationCleared,

    /// The selected row count changed
    SelectionChanged { count: usize },

    /// Some overlay became active, or the last one went away
    OverlayChanged { active: bool },
}

/// Optional channel the controllers publish events on
#[derive(Debug, Clone, Default)]
pub struct EventSink {
    sender: Option<mpsc::UnboundedSender<ConsoleEvent>>,
}

impl EventSink {
    pub fn new(sender: mpsc::UnboundedSender<ConsoleEvent>) -> Self {
        Self {
            sender: Some(sender),
        }
    }

    /// Send an event if a receiver is attached. A dropped receiver is ignored.
    pub fn send(&self, event: ConsoleEvent) {
        if let Some(sender) = &self.sender {
            let _ = sender.send(event);
        }
    }
}
