//! Control layer of the dashboard screens.
//!
//! Each screen gets a [`ScreenController`] combining:
//! - a [`ModalCoordinator`] keeping at most one dialog visible
//! - an [`UnsavedChangesGuard`] parking transitions away from dirty dialogs
//! - a [`NotificationSequencer`] running the success toast
//! - a [`SelectionManager`] keeping table selections consistent with the data
//!
//! All delays go through one [`TimerRegistry`] on a virtual clock;
//! [`ControllerDriver`] ties that clock to tokio time.

pub mod controller;
pub mod dialogs;
pub mod driver;
pub mod events;
pub mod notifications;
pub mod screens;
pub mod selection;
pub mod timers;
pub mod types;

pub use controller::{ControllerSnapshot, ScreenController};
pub use dialogs::{
    DialogKind, DialogState, DialogTransition, GuardOutcome, ModalCoordinator, PendingTransition,
    UnsavedChangesGuard, CONFIRM_DISCARD, DEFAULT_TRANSITION_DELAY,
};
pub use driver::ControllerDriver;
pub use events::{ConsoleEvent, EventSink};
pub use notifications::{
    NoticeTimings, NotificationSequencer, NotificationState, NotificationView,
    DEFAULT_FALLBACK_MESSAGE,
};
pub use screens::{
    AnnouncementDialog, ReportingDialog, Screen, SectionDialog, SettingsDialog, UserDialog,
};
pub use selection::SelectionManager;
pub use timers::{Fired, TimerHandle, TimerRegistry};
pub use types::{ConsoleError, ConsoleResult, Entity, EntityId, Record, ScreenTimer};
