mod kinds;
mod replay;
mod root;

pub use kinds::KindsCommand;
pub use replay::{ReplayCommand, ReplayFrame, Scenario, Step};
pub use root::{Cli, Commands};
