//! Dialog kinds and dialog state
//!
//! Each screen declares its dialogs as a closed enum implementing
//! [`DialogKind`]. Names coming from the view layer are resolved against
//! that enum at the coordinator boundary; anything else is rejected.

use crate::console::types::{ConsoleError, ConsoleResult};
use std::fmt::Debug;
use std::sync::Arc;

/// Name of the built-in discard confirmation owned by the unsaved-changes guard
pub const CONFIRM_DISCARD: &str = "confirmDiscard";

/// A screen's closed set of dialogs
pub trait DialogKind: Copy + Eq + Debug + Send + Sync + 'static {
    /// Every kind the screen declares
    const ALL: &'static [Self];

    /// Name the view layer uses for this kind
    fn name(&self) -> &'static str;

    /// Resolve a view-layer name to a kind
    fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|kind| kind.name() == name)
    }

    /// Resolve `name`, rejecting unknown and reserved names
    fn parse(name: &str) -> ConsoleResult<Self> {
        if name == CONFIRM_DISCARD {
            return Err(ConsoleError::ReservedKind(name.to_string()));
        }
        Self::from_name(name).ok_or_else(|| ConsoleError::UnknownKind(name.to_string()))
    }
}

/// Which dialog, if any, is on screen.
///
/// The payload is shared with the caller, never copied.
#[derive(Debug)]
pub enum DialogState<K, E> {
    Closed,
    Open {
        kind: K,
        payload: Option<Arc<E>>,
        dirty: bool,
    },
}

impl<K: DialogKind, E> DialogState<K, E> {
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Open { .. })
    }

    pub fn kind(&self) -> Option<K> {
        match self {
            Self::Open { kind, .. } => Some(*kind),
            Self::Closed => None,
        }
    }

    pub fn payload(&self) -> Option<&Arc<E>> {
        match self {
            Self::Open { payload, .. } => payload.as_ref(),
            Self::Closed => None,
        }
    }

    /// Dirtiness only exists while open
    pub fn is_dirty(&self) -> bool {
        matches!(self, Self::Open { dirty: true, .. })
    }
}

impl<K, E> Default for DialogState<K, E> {
    fn default() -> Self {
        Self::Closed
    }
}

#[cfg(test)]
pub(crate) mod test_kinds {
    use super::DialogKind;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum TestDialog {
        Add,
        Edit,
        Delete,
    }

    impl DialogKind for TestDialog {
        const ALL: &'static [Self] = &[Self::Add, Self::Edit, Self::Delete];

        fn name(&self) -> &'static str {
            match self {
                Self::Add => "add",
                Self::Edit => "edit",
                Self::Delete => "delete",
            }
        }
    }
}
