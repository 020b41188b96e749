//! Success notification sequencing.
//!
//! A notification runs show -> hold -> hide -> clear on three consecutive
//! timers. A new message supersedes the one in flight: every timer of the old
//! cycle is canceled and the generation moves on, so nothing from the old
//! cycle can hide the new message early.

use crate::console::{
    dialogs::{DialogKind, UnsavedChangesGuard},
    events::{ConsoleEvent, EventSink},
    timers::{TimerHandle, TimerRegistry},
    types::{ConsoleError, Entity, ScreenTimer},
};
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, warn};

/// Message used when a caller passes an empty one
pub const DEFAULT_FALLBACK_MESSAGE: &str = "Operation completed successfully";

/// Delays of one notification cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoticeTimings {
    /// Between the request and the message appearing
    pub entrance: Duration,
    /// How long the message stays up
    pub display: Duration,
    /// Exit animation before the message is cleared
    pub exit: Duration,
}

impl NoticeTimings {
    /// Time from `show` until the sequencer is idle again
    pub fn total(&self) -> Duration {
        self.entrance + self.display + self.exit
    }
}

impl Default for NoticeTimings {
    fn default() -> Self {
        Self {
            entrance: Duration::from_millis(300),
            display: Duration::from_millis(3000),
            exit: Duration::from_millis(300),
        }
    }
}

/// Phase of the notification cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationState {
    Idle,
    Pending,
    Visible(String),
    FadingOut,
}

/// What the view renders
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotificationView {
    pub visible: bool,
    pub text: String,
}

/// Drives the success toast
#[derive(Debug)]
pub struct NotificationSequencer {
    state: NotificationState,

    /// Message of the current cycle; kept through the fade-out
    message: String,

    /// Every timer of the current cycle still in flight
    timers: Vec<TimerHandle>,

    generation: u64,

    timings: NoticeTimings,

    fallback: String,

    events: EventSink,
}

impl NotificationSequencer {
    pub fn new(timings: NoticeTimings, fallback: impl Into<String>) -> Self {
        Self {
            state: NotificationState::Idle,
            message: String::new(),
            timers: Vec::new(),
            generation: 0,
            timings,
            fallback: fallback.into(),
            events: EventSink::default(),
        }
    }

    pub fn set_event_sink(&mut self, events: EventSink) {
        self.events = events;
    }

    /// Start a notification cycle for `message`, dismissing any open dialog
    pub fn show<K: DialogKind, E: Entity + 'static>(
        &mut self,
        message: &str,
        dialogs: &mut UnsavedChangesGuard<K, E>,
        timers: &mut TimerRegistry<ScreenTimer>,
    ) {
        let message = if message.trim().is_empty() {
            warn!("{}; using fallback", ConsoleError::EmptyMessage);
            self.fallback.clone()
        } else {
            message.to_string()
        };

        if self.is_busy() {
            debug!("Superseding in-flight notification");
        }
        self.cancel_all(timers);

        dialogs.dismiss_all(timers);

        self.message = message;
        self.state = NotificationState::Pending;
        self.schedule(
            self.timings.entrance,
            ScreenTimer::ShowNotice {
                generation: self.generation,
            },
            timers,
        );
    }

    /// Apply a fired timer. Returns false for timers from a superseded cycle.
    pub fn on_timer(
        &mut self,
        timer: ScreenTimer,
        timers: &mut TimerRegistry<ScreenTimer>,
    ) -> bool {
        match timer {
            ScreenTimer::ShowNotice { generation } if generation == self.generation => {
                self.state = NotificationState::Visible(self.message.clone());
                self.events.send(ConsoleEvent::NotificationShown {
                    text: self.message.clone(),
                });
                self.schedule(self.timings.display, ScreenTimer::HideNotice { generation }, timers);
                true
            }
            ScreenTimer::HideNotice { generation } if generation == self.generation => {
                self.state = NotificationState::FadingOut;
                self.events.send(ConsoleEvent::NotificationHidden);
                self.schedule(self.timings.exit, ScreenTimer::ClearNotice { generation }, timers);
                true
            }
            ScreenTimer::ClearNotice { generation } if generation == self.generation => {
                self.state = NotificationState::Idle;
                self.message.clear();
                self.timers.clear();
                self.events.send(ConsoleEvent::NotificationCleared);
                true
            }
            ScreenTimer::ShowNotice { generation }
            | ScreenTimer::HideNotice { generation }
            | ScreenTimer::ClearNotice { generation } => {
                debug!(
                    "Ignoring stale notification timer (generation {}, current {})",
                    generation, self.generation
                );
                false
            }
            _ => false,
        }
    }

    pub fn state(&self) -> &NotificationState {
        &self.state
    }

    /// True from `show` until the cycle clears
    pub fn is_busy(&self) -> bool {
        self.state != NotificationState::Idle
    }

    pub fn is_visible(&self) -> bool {
        matches!(self.state, NotificationState::Visible(_))
    }

    pub fn view(&self) -> NotificationView {
        NotificationView {
            visible: self.is_visible(),
            text: match self.state {
                NotificationState::Visible(_) | NotificationState::FadingOut => {
                    self.message.clone()
                }
                NotificationState::Idle | NotificationState::Pending => String::new(),
            },
        }
    }

    pub fn timings(&self) -> NoticeTimings {
        self.timings
    }

    pub fn teardown(&mut self, timers: &mut TimerRegistry<ScreenTimer>) {
        self.cancel_all(timers);
        self.state = NotificationState::Idle;
        self.message.clear();
    }

    fn schedule(
        &mut self,
        delay: Duration,
        timer: ScreenTimer,
        timers: &mut TimerRegistry<ScreenTimer>,
    ) {
        // Fired handles are harmless to keep; cancel_all treats them as no-ops.
        self.timers.push(timers.schedule(delay, timer));
    }

    fn cancel_all(&mut self, timers: &mut TimerRegistry<ScreenTimer>) {
        timers.cancel_all(&mut self.timers);
        self.generation += 1;
    }
}
