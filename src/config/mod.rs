use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

use crate::console::{NoticeTimings, DEFAULT_FALLBACK_MESSAGE};

/// Controller configuration
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsoleConfig {
    /// Delay between one dialog closing and the next opening, and before a
    /// closed dialog's payload is released
    pub transition_delay_ms: u64,

    /// Delay before a success message appears
    pub notice_entrance_delay_ms: u64,

    /// How long a success message stays visible
    pub notice_display_ms: u64,

    /// Exit animation before the message is cleared
    pub notice_exit_delay_ms: u64,

    /// Shown when a caller asks for an empty success message
    pub fallback_message: String,

    /// Refuse to open dialogs while a success message is in flight
    pub lock_dialogs_while_busy: bool,
}

/// Configuration file contents; anything missing keeps its current value
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PartialConsoleConfig {
    pub transition_delay_ms: Option<u64>,
    pub notice_entrance_delay_ms: Option<u64>,
    pub notice_display_ms: Option<u64>,
    pub notice_exit_delay_ms: Option<u64>,
    pub fallback_message: Option<String>,
    pub lock_dialogs_while_busy: Option<bool>,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            transition_delay_ms: 300,
            notice_entrance_delay_ms: 300,
            notice_display_ms: 3000,
            notice_exit_delay_ms: 300,
            fallback_message: DEFAULT_FALLBACK_MESSAGE.to_string(),
            lock_dialogs_while_busy: true,
        }
    }
}

impl ConsoleConfig {
    /// Initialize configuration from defaults, a config file and the environment
    pub async fn init(explicit_path: Option<&Path>) -> Result<Self> {
        debug!("Initializing configuration");
        let search_paths = Self::search_paths();
        Self::resolve(explicit_path, &search_paths, |key| std::env::var(key).ok()).await
    }

    /// Defaults, then the explicit file or the first of `search_paths` that
    /// exists, then variables from `lookup`
    pub async fn resolve(
        explicit_path: Option<&Path>,
        search_paths: &[PathBuf],
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let mut config = Self::default();

        let file_config = match explicit_path {
            Some(path) => Some(Self::read_file(path).await?),
            None => Self::load_from_file(search_paths).await?,
        };
        if let Some(file_config) = file_config {
            config.merge_with(file_config);
        }

        config.apply_env(lookup)?;
        config.validate()?;

        Ok(config)
    }

    /// Apply `DASHCTL_*` variables resolved through `lookup`
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        let durations = [
            ("DASHCTL_TRANSITION_DELAY", &mut self.transition_delay_ms),
            ("DASHCTL_NOTICE_ENTRANCE", &mut self.notice_entrance_delay_ms),
            ("DASHCTL_NOTICE_DISPLAY", &mut self.notice_display_ms),
            ("DASHCTL_NOTICE_EXIT", &mut self.notice_exit_delay_ms),
        ];

        for (key, slot) in durations {
            if let Some(value) = lookup(key) {
                let duration = humantime::parse_duration(value.trim())
                    .with_context(|| format!("{} is not a duration: {}", key, value))?;
                *slot = u64::try_from(duration.as_millis())
                    .with_context(|| format!("{} is too long: {}", key, value))?;
            }
        }

        if let Some(message) = lookup("DASHCTL_FALLBACK_MESSAGE") {
            self.fallback_message = message;
        }

        if let Some(lock) = lookup("DASHCTL_LOCK_WHILE_BUSY") {
            self.lock_dialogs_while_busy = match lock.trim().to_lowercase().as_str() {
                "1" | "true" | "yes" => true,
                "0" | "false" | "no" => false,
                _ => bail!("DASHCTL_LOCK_WHILE_BUSY is not a boolean: {}", lock),
            };
        }

        Ok(())
    }

    /// Config file locations, highest priority first
    pub fn search_paths() -> Vec<PathBuf> {
        // Priority:
        // 1. ./.dashctl.json
        // 2. ./dashctl.json
        // 3. $CONFIG_DIR/dashctl/dashctl.json
        let mut config_paths = vec![
            PathBuf::from("./.dashctl.json"),
            PathBuf::from("./dashctl.json"),
        ];

        if let Some(config_dir) = dirs::config_dir() {
            config_paths.push(config_dir.join("dashctl").join("dashctl.json"));
        }

        config_paths
    }

    /// Load the first configuration file in `paths` that exists
    pub async fn load_from_file(paths: &[PathBuf]) -> Result<Option<PartialConsoleConfig>> {
        for path in paths {
            if path.exists() {
                return Self::read_file(path).await.map(Some);
            }
        }

        Ok(None)
    }

    async fn read_file(path: &Path) -> Result<PartialConsoleConfig> {
        debug!("Loading configuration from: {}", path.display());
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Invalid configuration in {}", path.display()))
    }

    /// Merge file values into this configuration
    pub fn merge_with(&mut self, other: PartialConsoleConfig) {
        if let Some(value) = other.transition_delay_ms {
            self.transition_delay_ms = value;
        }
        if let Some(value) = other.notice_entrance_delay_ms {
            self.notice_entrance_delay_ms = value;
        }
        if let Some(value) = other.notice_display_ms {
            self.notice_display_ms = value;
        }
        if let Some(value) = other.notice_exit_delay_ms {
            self.notice_exit_delay_ms = value;
        }
        if let Some(value) = other.fallback_message {
            self.fallback_message = value;
        }
        if let Some(value) = other.lock_dialogs_while_busy {
            self.lock_dialogs_while_busy = value;
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.notice_display_ms == 0 {
            return Err(anyhow::anyhow!("notice_display_ms must be greater than 0"));
        }

        if self.fallback_message.trim().is_empty() {
            return Err(anyhow::anyhow!("fallback_message must not be blank"));
        }

        Ok(())
    }

    pub fn transition_delay(&self) -> Duration {
        Duration::from_millis(self.transition_delay_ms)
    }

    pub fn notice_timings(&self) -> NoticeTimings {
        NoticeTimings {
            entrance: Duration::from_millis(self.notice_entrance_delay_ms),
            display: Duration::from_millis(self.notice_display_ms),
            exit: Duration::from_millis(self.notice_exit_delay_ms),
        }
    }
}
