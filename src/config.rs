//! Application configuration.
//!
//! The configuration is loaded from `$XDG_CONFIG_HOME/aerobar/config.json`.
//! Every section is optional, so a minimal `{}` file is valid and all
//! values fall back to their compiled-in defaults.
//!
//! # Example
//!
//! ```json
//! {
//!   "refresh": {
//!     "debounce_ms": 200,
//!     "window_change_debounce_ms": 100,
//!     "backup_interval_secs": 60
//!   },
//!   "aerospace": {
//!     "candidate_paths": ["/opt/homebrew/bin/aerospace"],
//!     "timeout_ms": 2000
//!   },
//!   "labels": { "focused": "●", "unfocused": "○" }
//! }
//! ```

use crate::command::{RefreshTrigger, TriggerReason};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Lower bound for [`RefreshConfig::backup_interval`].
const MIN_BACKUP_INTERVAL_SECS: u64 = 1;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Debounce and backup-timer settings.
    #[serde(default)]
    pub refresh: RefreshConfig,

    /// Where to find the `aerospace` binary and how to run it.
    #[serde(default)]
    pub aerospace: AerospaceConfig,

    /// Glyphs and fixed strings shown in the status label.
    #[serde(default)]
    pub labels: LabelConfig,

    /// Override for the command socket path.
    #[serde(default)]
    pub socket_path: Option<PathBuf>,
}

/// Timing of the refresh coordinator.
///
/// All durations are in **milliseconds** unless the field name says
/// otherwise.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RefreshConfig {
    /// Delay between a trigger and the fetch it schedules.  AeroSpace
    /// updates its own state slightly after the OS events that hint at a
    /// workspace change.
    pub debounce_ms: u64,
    /// Shorter delay used for [`TriggerReason::WindowChange`].
    pub window_change_debounce_ms: u64,
    /// Interval of the safety-net refresh (seconds).
    pub backup_interval_secs: u64,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 200,
            window_change_debounce_ms: 100,
            backup_interval_secs: 60,
        }
    }
}

impl RefreshConfig {
    /// Debounce delay for a trigger of the given reason.
    pub fn delay_for(&self, reason: TriggerReason) -> Duration {
        match reason {
            TriggerReason::WindowChange => Duration::from_millis(self.window_change_debounce_ms),
            _ => Duration::from_millis(self.debounce_ms),
        }
    }

    /// Build a [`RefreshTrigger`] carrying the configured delay.
    pub fn trigger(&self, reason: TriggerReason) -> RefreshTrigger {
        RefreshTrigger::new(reason, self.delay_for(reason))
    }

    /// Interval of the backup timer, never shorter than one second.
    pub fn backup_interval(&self) -> Duration {
        Duration::from_secs(self.backup_interval_secs.max(MIN_BACKUP_INTERVAL_SECS))
    }
}

/// How the `aerospace` CLI is located and invoked.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AerospaceConfig {
    /// Checked in order; the first existing executable wins.  `$PATH` is
    /// never searched.
    pub candidate_paths: Vec<PathBuf>,
    /// The only environment variable passed to the child (`PATH`).
    pub search_path: String,
    /// Hard per-query timeout (ms).
    pub timeout_ms: u64,
}

impl Default for AerospaceConfig {
    fn default() -> Self {
        Self {
            candidate_paths: vec![
                PathBuf::from("/opt/homebrew/bin/aerospace"),
                PathBuf::from("/usr/local/bin/aerospace"),
                PathBuf::from("/usr/bin/aerospace"),
            ],
            search_path: "/usr/local/bin:/opt/homebrew/bin:/usr/bin:/bin".into(),
            timeout_ms: 2000,
        }
    }
}

impl AerospaceConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Strings shown by the presentation sink.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelConfig {
    /// Glyph for the focused workspace.
    pub focused: String,
    /// Glyph for every other workspace.
    pub unfocused: String,
    /// Shown once at startup, before the first fetch completes.
    pub loading: String,
    /// Shown when no `aerospace` binary was found.
    pub not_found: String,
    /// Shown for any other failure.
    pub error: String,
}

impl Default for LabelConfig {
    fn default() -> Self {
        Self {
            focused: "●".into(),
            unfocused: "○".into(),
            loading: "Loading...".into(),
            not_found: "No AeroSpace".into(),
            error: "Error".into(),
        }
    }
}

impl Config {
    /// Load configuration from a JSON file at `path`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError(format!("failed to read {}: {}", path.display(), e)))?;
        let config: Self = serde_json::from_str(&contents)
            .map_err(|e| ConfigError(format!("failed to parse {}: {}", path.display(), e)))?;
        Ok(config)
    }
}

/// Error from loading or parsing a configuration file.
#[derive(Debug, thiserror::Error)]
#[error("config error: {0}")]
pub struct ConfigError(String);
