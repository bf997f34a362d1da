//! Configuration and persisted settings.
//!
//! `AppConfig` is the static TOML configuration of the tool. `Settings` is the
//! small record the UI side reads and writes at runtime (last sync time, chosen
//! sync folder, AI provider and so on); this crate only updates the sync
//! fields.

use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::{AppError, Result};

/// Configuration for the folder-mirror scheduler.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Whether automatic sync runs at all.
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Quiet period after a bookmark change before mirroring, in milliseconds.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Interval between periodic syncs in seconds.
    #[serde(default = "default_interval")]
    pub interval_secs: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            debounce_ms: default_debounce_ms(),
            interval_secs: default_interval(),
        }
    }
}

impl SyncConfig {
    #[must_use]
    pub const fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// Periodic sync interval, never shorter than one second.
    #[must_use]
    pub const fn interval(&self) -> Duration {
        if self.interval_secs < MIN_INTERVAL_SECS {
            Duration::from_secs(MIN_INTERVAL_SECS)
        } else {
            Duration::from_secs(self.interval_secs)
        }
    }

    /// Reject values the scheduler cannot run with.
    ///
    /// # Errors
    /// Returns `AppError::Config` for a zero interval.
    pub fn validate(&self) -> Result<()> {
        if self.interval_secs < MIN_INTERVAL_SECS {
            return Err(AppError::Config {
                message: format!(
                    "sync.interval_secs must be at least {MIN_INTERVAL_SECS}, got {}",
                    self.interval_secs
                ),
            });
        }
        Ok(())
    }
}

/// Shortest allowed periodic sync interval, in seconds.
pub const MIN_INTERVAL_SECS: u64 = 1;

const fn default_enabled() -> bool {
    true
}

const fn default_debounce_ms() -> u64 {
    3000
}

const fn default_interval() -> u64 {
    300 // 5 minutes
}

/// Path configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PathConfig {
    /// Base data directory.
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
}

/// Complete application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub sync: SyncConfig,

    #[serde(default)]
    pub paths: PathConfig,
}

impl AppConfig {
    /// Get the data directory, using default if not configured.
    #[must_use]
    pub fn data_dir(&self) -> PathBuf {
        self.paths
            .data_dir
            .clone()
            .unwrap_or_else(Self::default_data_dir)
    }

    /// Get the default data directory path.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".syncgrid")
    }

    /// Database holding the bookmark tree and the settings record.
    #[must_use]
    pub fn store_db_path(&self) -> PathBuf {
        self.data_dir().join("syncgrid.db")
    }

    /// Default destination for manual exports.
    #[must_use]
    pub fn exports_dir(&self) -> PathBuf {
        self.data_dir().join("exports")
    }
}

/// Color theme preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
    #[default]
    System,
}

/// Provider used for AI title suggestions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AiProvider {
    #[default]
    None,
    Openai,
    Gemini,
}

/// AI provider settings. The HTTP side lives elsewhere; these are carried
/// through untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AiSettings {
    pub provider: AiProvider,
    pub openai_model: String,
    pub gemini_model: String,
}

impl Default for AiSettings {
    fn default() -> Self {
        Self {
            provider: AiProvider::None,
            openai_model: "gpt-4.1-nano".into(),
            gemini_model: "gemini-2.0-flash".into(),
        }
    }
}

/// Runtime settings record. Unknown or missing fields fall back to defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub theme: Theme,
    pub locale: String,
    pub active_tab_id: String,
    pub last_path: Vec<String>,
    /// Last successful folder-mirror write.
    pub last_synced_at: Option<DateTime<Utc>>,
    /// Directory the user granted for folder-mirror sync.
    pub sync_directory: Option<PathBuf>,
    pub ai: AiSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            theme: Theme::System,
            locale: "ja".into(),
            active_tab_id: String::new(),
            last_path: Vec::new(),
            last_synced_at: None,
            sync_directory: None,
            ai: AiSettings::default(),
        }
    }
}

impl Settings {
    /// Record a successful sync.
    #[must_use]
    pub fn synced_at(mut self, at: DateTime<Utc>) -> Self {
        self.last_synced_at = Some(at);
        self
    }

    #[must_use]
    pub const fn is_sync_configured(&self) -> bool {
        self.sync_directory.is_some()
    }
}
