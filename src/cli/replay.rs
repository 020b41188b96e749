//! Replay a scripted screen session and print the controller state after each step

use anyhow::{Context, Result};
use clap::Args;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::ConsoleConfig;
use crate::console::{
    AnnouncementDialog, ConsoleError, ControllerDriver, ControllerSnapshot, DialogKind, EntityId,
    Record, ReportingDialog, Screen, ScreenController, SectionDialog, SettingsDialog, UserDialog,
};

/// Run a scenario script against a screen controller
#[derive(Debug, Args)]
pub struct ReplayCommand {
    /// Scenario file (YAML, or JSON with a .json extension)
    pub script: PathBuf,

    /// Override the screen named in the script
    #[arg(short, long, value_enum)]
    pub screen: Option<Screen>,

    /// Drive timers with real (tokio) time instead of jumping the clock
    #[arg(long)]
    pub realtime: bool,

    /// Pretty-print each snapshot
    #[arg(short, long)]
    pub pretty: bool,
}

/// A scripted session on one screen
#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    pub screen: Screen,

    /// Rows rendered before the first step
    #[serde(default)]
    pub dataset: Vec<Record>,

    pub steps: Vec<Step>,
}

/// One user or system action
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Step {
    Open {
        kind: String,
        #[serde(default)]
        payload: Option<Record>,
    },
    Close,
    Dirty {
        value: bool,
    },
    Confirm,
    Cancel,
    Notify {
        #[serde(default)]
        text: String,
    },
    Toggle {
        #[serde(default)]
        id: Option<EntityId>,
    },
    ToggleAt {
        index: usize,
    },
    SelectAll,
    ClearSelection,
    /// Replace the rendered rows (filter, refetch, deletion)
    Dataset {
        rows: Vec<Record>,
    },
    /// Let time pass, e.g. "300ms"
    Wait {
        duration: String,
    },
    /// Let every pending timer fire
    Settle,
}

impl Step {
    fn name(&self) -> &'static str {
        match self {
            Self::Open { .. } => "open",
            Self::Close => "close",
            Self::Dirty { .. } => "dirty",
            Self::Confirm => "confirm",
            Self::Cancel => "cancel",
            Self::Notify { .. } => "notify",
            Self::Toggle { .. } => "toggle",
            Self::ToggleAt { .. } => "toggle_at",
            Self::SelectAll => "select_all",
            Self::ClearSelection => "clear_selection",
            Self::Dataset { .. } => "dataset",
            Self::Wait { .. } => "wait",
            Self::Settle => "settle",
        }
    }
}

/// Controller state after one step
#[derive(Debug, Clone, Serialize)]
pub struct ReplayFrame {
    pub step: usize,
    pub op: &'static str,
    pub all_selected: bool,
    #[serde(flatten)]
    pub state: ControllerSnapshot,
}

impl ReplayCommand {
    pub async fn execute(&self, config: &ConsoleConfig) -> Result<()> {
        let mut scenario = Scenario::load(&self.script).await?;
        if let Some(screen) = self.screen {
            scenario.screen = screen;
        }
        info!(
            "Replaying {} steps on the {:?} screen",
            scenario.steps.len(),
            scenario.screen
        );

        let frames = scenario.replay(config, self.realtime).await?;
        for frame in frames {
            let line = if self.pretty {
                serde_json::to_string_pretty(&frame)?
            } else {
                serde_json::to_string(&frame)?
            };
            println!("{}", line);
        }

        Ok(())
    }
}

impl Scenario {
    pub async fn load(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read scenario {}", path.display()))?;

        let is_json = path.extension().is_some_and(|extension| extension == "json");
        if is_json {
            serde_json::from_str(&content)
                .with_context(|| format!("Invalid scenario {}", path.display()))
        } else {
            Self::from_yaml(&content)
                .with_context(|| format!("Invalid scenario {}", path.display()))
        }
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Run every step and collect a frame after each
    pub async fn replay(
        &self,
        config: &ConsoleConfig,
        realtime: bool,
    ) -> Result<Vec<ReplayFrame>> {
        match self.screen {
            Screen::Users => self.replay_on::<UserDialog>(config, realtime).await,
            Screen::Sections => self.replay_on::<SectionDialog>(config, realtime).await,
            Screen::Announcements => {
                self.replay_on::<AnnouncementDialog>(config, realtime).await
            }
            Screen::Reporting => self.replay_on::<ReportingDialog>(config, realtime).await,
            Screen::Settings => self.replay_on::<SettingsDialog>(config, realtime).await,
        }
    }

    async fn replay_on<K: DialogKind>(
        &self,
        config: &ConsoleConfig,
        realtime: bool,
    ) -> Result<Vec<ReplayFrame>> {
        let mut controller: ScreenController<K, Record> = ScreenController::new(config);
        let driver = ControllerDriver::new(&controller);
        let mut dataset = self.dataset.clone();
        let mut frames = Vec::with_capacity(self.steps.len());

        for (index, step) in self.steps.iter().enumerate() {
            debug!("Step {}: {:?}", index, step);

            match step {
                Step::Open { kind, payload } => {
                    controller.open_modal(kind, payload.clone().map(Arc::new));
                }
                Step::Close => controller.close_all_modals(),
                Step::Dirty { value } => controller.set_dirty(*value),
                Step::Confirm => controller.confirm_discard(),
                Step::Cancel => controller.cancel_discard(),
                Step::Notify { text } => controller.show_success_message(text),
                Step::Toggle { id: Some(id) } => controller.toggle_row(id.clone()),
                Step::Toggle { id: None } => warn!("toggle_row: {}", ConsoleError::UnusableId),
                Step::ToggleAt { index } => controller.toggle_row_at(*index, &dataset),
                Step::SelectAll => controller.select_all(&dataset),
                Step::ClearSelection => controller.clear_selection(),
                Step::Dataset { rows } => dataset = rows.clone(),
                Step::Wait { duration } => {
                    let duration = humantime::parse_duration(duration).with_context(|| {
                        format!("Step {}: invalid duration '{}'", index, duration)
                    })?;
                    if realtime {
                        driver.run_for(&mut controller, duration).await;
                    } else {
                        controller.advance(duration);
                    }
                }
                Step::Settle => {
                    if realtime {
                        driver.run_until_idle(&mut controller).await;
                    } else {
                        controller.settle();
                    }
                }
            }

            // The view renders after every action, handing over its rows.
            let all_selected = controller.is_all_selected(&dataset);
            frames.push(ReplayFrame {
                step: index,
                op: step.name(),
                all_selected,
                state: controller.snapshot(),
            });
        }

        Ok(frames)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DELETE_USER: &str = r#"
screen: users
dataset:
  - { id: "001", name: Mike Johnson }
  - { id: "002", name: Sarah Williams }
steps:
  - { op: open, kind: deleteUser, payload: { id: "001" } }
  - { op: notify, text: "001 has been deleted successfully!" }
  - { op: wait, duration: 300ms }
  - { op: dataset, rows: [{ id: "002", name: Sarah Williams }] }
  - { op: settle }
"#;

    #[tokio::test]
    async fn test_replay_delete_flow() {
        let scenario = Scenario::from_yaml(DELETE_USER).unwrap();
        let frames = scenario.replay(&ConsoleConfig::default(), false).await.unwrap();

        assert_eq!(frames.len(), 5);
        assert_eq!(frames[0].state.active_modal.as_deref(), Some("deleteUser"));
        assert_eq!(frames[0].state.payload_id, Some(EntityId::from("001")));

        assert_eq!(frames[1].state.active_modal, None);
        assert!(frames[1].state.busy);

        assert!(frames[2].state.notification.visible);
        assert_eq!(frames[2].state.at_ms, 300);

        let last = frames.last().unwrap();
        assert!(!last.state.notification.visible);
        assert!(!last.state.busy);
        assert_eq!(last.state.at_ms, 3600);
    }

    #[tokio::test]
    async fn test_replay_selection_with_shrinking_dataset() {
        let scenario = Scenario::from_yaml(
            r#"
screen: sections
dataset: [{ id: 1 }, { id: 2 }, { id: 3 }]
steps:
  - { op: toggle, id: 1 }
  - { op: toggle, id: 2 }
  - { op: select_all }
  - { op: dataset, rows: [{ id: 1 }] }
  - { op: toggle, id: null }
"#,
        )
        .unwrap();
        let frames = scenario.replay(&ConsoleConfig::default(), false).await.unwrap();

        let ids = |frame: &ReplayFrame| frame.state.selected.clone();
        assert_eq!(
            ids(&frames[2]),
            vec![EntityId::from(1), EntityId::from(2), EntityId::from(3)]
        );
        assert_eq!(ids(&frames[3]), vec![EntityId::from(1)]);
        assert!(frames[3].all_selected);
        assert_eq!(ids(&frames[4]), vec![EntityId::from(1)]);
    }

    #[tokio::test]
    async fn test_replay_discard_confirmation() {
        let scenario = Scenario::from_yaml(
            r#"
screen: announcements
steps:
  - { op: open, kind: createPost }
  - { op: dirty, value: true }
  - { op: close }
  - { op: cancel }
  - { op: close }
  - { op: confirm }
"#,
        )
        .unwrap();
        let frames = scenario.replay(&ConsoleConfig::default(), false).await.unwrap();

        assert_eq!(frames[2].state.confirmation.as_deref(), Some("confirmDiscard"));
        assert_eq!(frames[3].state.active_modal.as_deref(), Some("createPost"));
        assert!(frames[3].state.dirty);
        assert_eq!(frames[5].state.active_modal, None);
        assert_eq!(frames[5].state.confirmation, None);
    }

    #[tokio::test]
    async fn test_invalid_wait_is_an_error() {
        let scenario = Scenario::from_yaml(
            r#"
screen: users
steps:
  - { op: wait, duration: later }
"#,
        )
        .unwrap();
        assert!(scenario.replay(&ConsoleConfig::default(), false).await.is_err());
    }

    #[tokio::test]
    async fn test_load_json_scenario() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scenario.json");
        std::fs::write(
            &path,
            r#"{"screen": "sections", "steps": [{"op": "open", "kind": "aiPreview"}]}"#,
        )
        .unwrap();

        let scenario = Scenario::load(&path).await.unwrap();
        assert_eq!(scenario.screen, Screen::Sections);

        let frames = scenario.replay(&ConsoleConfig::default(), false).await.unwrap();
        assert_eq!(frames[0].state.active_modal.as_deref(), Some("aiPreview"));
    }

    #[tokio::test]
    async fn test_replay_settings_save() {
        let scenario = Scenario::from_yaml(
            r#"
screen: settings
steps:
  - { op: notify, text: Password changed successfully }
  - { op: open, kind: changePassword }
  - { op: wait, duration: 300ms }
  - { op: settle }
"#,
        )
        .unwrap();
        let frames = scenario.replay(&ConsoleConfig::default(), false).await.unwrap();

        assert!(frames[0].state.busy);
        assert_eq!(frames[1].state.active_modal, None);
        assert_eq!(frames[2].state.notification.text, "Password changed successfully");
        assert!(frames[2].state.overlay_active);
        assert!(!frames[3].state.busy);
    }

    #[tokio::test]
    async fn test_replay_reporting_export() {
        let scenario = Scenario::from_yaml(
            r#"
screen: reporting
steps:
  - { op: open, kind: exportPdf }
  - { op: close }
  - { op: notify, text: Report exported }
"#,
        )
        .unwrap();
        let frames = scenario.replay(&ConsoleConfig::default(), false).await.unwrap();

        assert_eq!(frames[0].state.active_modal.as_deref(), Some("exportPdf"));
        assert_eq!(frames[1].state.active_modal, None);
        assert!(frames[2].state.busy);
    }
}
