//! Studio settings (`~/.promptsmith/settings.toml`)

use crate::error::SettingsError;
use promptsmith_config::Format;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

/// Get the default promptsmith directory (~/.promptsmith/)
///
/// Falls back to a relative `.promptsmith` when no home directory is known.
pub fn settings_dir() -> PathBuf {
    dirs::home_dir().unwrap_or_default().join(".promptsmith")
}

/// Get the default settings file path
pub fn settings_file() -> PathBuf {
    settings_dir().join("settings.toml")
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudioSettings {
    /// Where drafts and saved configs are stored (defaults to the settings dir)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,

    /// Quiet period before an edit is written to the draft
    #[serde(default = "default_autosave_debounce_ms")]
    pub autosave_debounce_ms: u64,

    /// Format used when an export target names none
    #[serde(default = "default_export_format")]
    pub default_export_format: Format,
}

fn default_autosave_debounce_ms() -> u64 {
    1000
}

fn default_export_format() -> Format {
    Format::Json
}

impl Default for StudioSettings {
    fn default() -> Self {
        Self {
            data_dir: None,
            autosave_debounce_ms: default_autosave_debounce_ms(),
            default_export_format: default_export_format(),
        }
    }
}

impl StudioSettings {
    /// Load settings from the default location, or return defaults
    pub fn load_or_default() -> Self {
        let path = settings_file();
        if !path.exists() {
            return Self::default();
        }
        match Self::load_from_file(&path) {
            Ok(settings) => settings,
            Err(e) => {
                warn!("Failed to load settings, using defaults: {}", e);
                Self::default()
            }
        }
    }

    pub fn load_from_file(path: &Path) -> Result<Self, SettingsError> {
        let content = std::fs::read_to_string(path).map_err(|e| SettingsError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        Ok(toml::from_str(&content)?)
    }

    pub fn save_to_file(&self, path: &Path) -> Result<(), SettingsError> {
        let content = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| SettingsError::Write {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }
        std::fs::write(path, content).map_err(|e| SettingsError::Write {
            path: path.to_path_buf(),
            source: e,
        })
    }

    pub fn data_dir(&self) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(settings_dir)
    }

    pub fn autosave_debounce(&self) -> Duration {
        Duration::from_millis(self.autosave_debounce_ms)
    }
}
