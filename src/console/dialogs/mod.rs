//! Dialog control: which dialog is visible, and protection of unsaved edits.

pub mod coordinator;
pub mod guard;
pub mod types;

pub use coordinator::*;
pub use guard::*;
pub use types::*;
