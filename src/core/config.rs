//! Tool settings.
//!
//! Handles loading settings from TOML files. Settings describe how the tool
//! runs (which `cargo`, how long to wait, how loudly to log); what gets
//! published comes from the per-request configuration map instead.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Name of the per-project settings file.
pub const LOCAL_SETTINGS_FILE: &str = ".crates-publisher.toml";

/// Directory name under the platform config directory.
const APP_DIR: &str = "crates-publisher";

/// Tool settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// External command settings
    pub executor: ExecutorSettings,

    /// Logging settings
    pub logging: LoggingSettings,
}

/// How the publish tool is invoked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutorSettings {
    /// Program to run (`cargo` on `PATH` by default)
    pub program: String,

    /// Abort the publish after this many seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

impl Default for ExecutorSettings {
    fn default() -> Self {
        Self { program: "cargo".to_string(), timeout_secs: None }
    }
}

impl ExecutorSettings {
    /// Timeout as a duration. Zero means no timeout.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.filter(|secs| *secs > 0).map(Duration::from_secs)
    }
}

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Default filter directive when `RUST_LOG` is unset
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self { level: "warn".to_string() }
    }
}

impl Settings {
    /// Load settings from the default locations.
    ///
    /// Looks for settings in:
    /// 1. `.crates-publisher.toml` in current directory
    /// 2. `~/.config/crates-publisher/config.toml`
    /// 3. Falls back to defaults
    pub fn load() -> anyhow::Result<Self> {
        let local = PathBuf::from(LOCAL_SETTINGS_FILE);
        if local.exists() {
            return Self::load_from_file(&local);
        }

        if let Some(global) = Self::global_path() {
            if global.exists() {
                return Self::load_from_file(&global);
            }
        }

        Ok(Self::default())
    }

    /// Load settings from a specific file.
    pub fn load_from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read {}: {}", path.display(), e))?;
        let settings: Self = toml::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Invalid settings in {}: {}", path.display(), e))?;
        Ok(settings)
    }

    /// Path of the settings file that [`Settings::load`] would read, if any.
    pub fn resolved_path() -> Option<PathBuf> {
        let local = PathBuf::from(LOCAL_SETTINGS_FILE);
        if local.exists() {
            return Some(local);
        }
        Self::global_path().filter(|p| p.exists())
    }

    /// Get the global settings file path.
    pub fn global_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(APP_DIR).join("config.toml"))
    }

    /// Serialize to a TOML string.
    pub fn to_toml(&self) -> anyhow::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}
