//! Dialog, unsaved-changes, notification and selection controllers for
//! admin dashboard screens.

pub mod cli;
pub mod config;
pub mod console;

pub use config::ConsoleConfig;
pub use console::*;
