use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::debug;

use super::{kinds::KindsCommand, replay::ReplayCommand};
use crate::config::ConsoleConfig;

/// dashctl - drive the dashboard screen controllers from the terminal
#[derive(Parser)]
#[command(
    name = "dashctl",
    version,
    about = "Drive the dashboard screen controllers from the terminal",
    long_about = r#"dashctl replays scripted dialog, notification and selection sessions against
the dashboard screen controllers and prints the controller state after each step.

Examples:
  dashctl replay session.yaml             # Replay on the virtual clock
  dashctl replay session.yaml --realtime  # Let timers run in real time
  dashctl kinds users                     # List the users screen dialogs"#
)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short = 'd', long = "debug", global = true)]
    pub debug: bool,

    /// Configuration file, instead of the default search path
    #[arg(short = 'c', long = "config", global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Replay a scenario script
    Replay(ReplayCommand),

    /// List the dialog kinds a screen accepts
    Kinds(KindsCommand),
}

impl Cli {
    pub async fn execute(self) -> Result<()> {
        if self.debug {
            debug!("Debug logging enabled");
        }

        let config = ConsoleConfig::init(self.config.as_deref()).await?;
        debug!("Configuration initialized: {:?}", config);

        match self.command {
            Commands::Replay(replay_cmd) => replay_cmd.execute(&config).await,
            Commands::Kinds(kinds_cmd) => kinds_cmd.execute(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::console::Screen;

    #[test]
    fn test_parse_replay_with_global_flags() {
        let args = ["dashctl", "replay", "session.yaml", "--realtime", "-d"];
        let cli = Cli::try_parse_from(args).unwrap();
        assert!(cli.debug);
        match cli.command {
            Commands::Replay(cmd) => {
                assert_eq!(cmd.script, PathBuf::from("session.yaml"));
                assert!(cmd.realtime);
                assert!(cmd.screen.is_none());
            }
            _ => panic!("expected replay"),
        }
    }

    #[test]
    fn test_parse_kinds() {
        let cli = Cli::try_parse_from(["dashctl", "kinds", "announcements"]).unwrap();
        match cli.command {
            Commands::Kinds(cmd) => assert_eq!(cmd.screen, Screen::Announcements),
            _ => panic!("expected kinds"),
        }
    }

    #[test]
    fn test_parse_every_screen() {
        for (name, screen) in [
            ("users", Screen::Users),
            ("sections", Screen::Sections),
            ("announcements", Screen::Announcements),
            ("reporting", Screen::Reporting),
            ("settings", Screen::Settings),
        ] {
            let cli = Cli::try_parse_from(["dashctl", "kinds", name]).unwrap();
            match cli.command {
                Commands::Kinds(cmd) => assert_eq!(cmd.screen, screen),
                _ => panic!("expected kinds"),
            }
        }
    }

    #[test]
    fn test_unknown_screen_rejected() {
        assert!(Cli::try_parse_from(["dashctl", "kinds", "billing"]).is_err());
    }
}
