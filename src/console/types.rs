//! Core types shared by the screen controllers
//!
//! Entity identifiers, the `Entity` trait tables hand to the controllers,
//! and the error type every controller operation reports through.

use serde::{Deserialize, Serialize};
use std::fmt::{self, Debug};

/// Identifier of a table row.
///
/// Rows come keyed by either numbers or strings ("001"), so both are
/// accepted. Numbers sort before strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntityId {
    Number(i64),
    Text(String),
}

impl EntityId {
    /// Whether the id can key a selection. Blank strings cannot.
    pub fn is_usable(&self) -> bool {
        match self {
            Self::Number(_) => true,
            Self::Text(text) => !text.trim().is_empty(),
        }
    }
}

impl From<i64> for EntityId {
    fn from(id: i64) -> Self {
        Self::Number(id)
    }
}

impl From<i32> for EntityId {
    fn from(id: i32) -> Self {
        Self::Number(id.into())
    }
}

impl From<u32> for EntityId {
    fn from(id: u32) -> Self {
        Self::Number(id.into())
    }
}

impl From<&str> for EntityId {
    fn from(id: &str) -> Self {
        Self::Text(id.to_string())
    }
}

impl From<String> for EntityId {
    fn from(id: String) -> Self {
        Self::Text(id)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(id) => write!(f, "{}", id),
            Self::Text(id) => write!(f, "{}", id),
        }
    }
}

/// A row the controllers can select or attach to a dialog.
pub trait Entity: Debug {
    /// The row's identifier, if it has one.
    fn entity_id(&self) -> Option<EntityId>;

    /// The identifier, filtered down to ids usable as selection keys.
    fn usable_id(&self) -> Option<EntityId> {
        self.entity_id().filter(EntityId::is_usable)
    }
}

/// A loosely typed row: an optional `id` plus whatever columns the table carries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    #[serde(default)]
    pub id: Option<EntityId>,

    #[serde(flatten)]
    pub fields: serde_json::Map<String, serde_json::Value>,
}

impl Record {
    pub fn new(id: impl Into<EntityId>) -> Self {
        Self {
            id: Some(id.into()),
            fields: serde_json::Map::new(),
        }
    }

    /// A row without an identifier.
    pub fn anonymous() -> Self {
        Self {
            id: None,
            fields: serde_json::Map::new(),
        }
    }

    pub fn with_field(
        mut self,
        key: impl Into<String>,
        value: impl Into<serde_json::Value>,
    ) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }
}

impl Entity for Record {
    fn entity_id(&self) -> Option<EntityId> {
        self.id.clone()
    }
}

/// Delayed actions a screen controller schedules on its timer registry.
///
/// Each carries the generation of the component state it was scheduled
/// for; a mismatch on firing means it was superseded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScreenTimer {
    /// Show the dialog queued behind a closing one
    RevealDialog { generation: u64 },
    /// Forget the payload of a dialog that finished fading out
    ReleasePayload { generation: u64 },
    /// Entrance delay elapsed; make the notification visible
    ShowNotice { generation: u64 },
    /// Display duration elapsed; start fading out
    HideNotice { generation: u64 },
    /// Exit animation finished; clear the message
    ClearNotice { generation: u64 },
}

/// Result type for controller operations
pub type ConsoleResult<T> = std::result::Result<T, ConsoleError>;

/// Invalid-input and precondition errors raised inside the controllers.
///
/// None of these are fatal. The screen controller logs them and carries on.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConsoleError {
    #[error("Unknown dialog kind '{0}'")]
    UnknownKind(String),

    #[error("Dialog kind '{0}' is reserved for the unsaved-changes guard")]
    ReservedKind(String),

    #[error("Dialog payload has no usable id: {0}")]
    MalformedPayload(String),

    #[error("Row id is missing or blank")]
    UnusableId,

    #[error("Row index {index} is out of bounds for {len} rows")]
    IndexOutOfBounds { index: usize, len: usize },

    #[error("Notification message is empty")]
    EmptyMessage,

    #[error("Cannot open '{0}' while a notification is in flight")]
    Busy(String),

    #[error("No dialog is open")]
    NoOpenDialog,

    #[error("No pending transition to {0}")]
    NothingPending(&'static str),
}

impl ConsoleError {
    /// Whether the error is a call made in the wrong state rather than bad input
    pub fn is_precondition(&self) -> bool {
        matches!(self, Self::NoOpenDialog | Self::NothingPending(_))
    }
}
