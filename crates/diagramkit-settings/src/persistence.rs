//! Settings Persistence
//!
//! Resolves the platform config location and loads or saves the editor
//! configuration there.

use crate::config::EditorConfig;
use crate::error::{SettingsError, SettingsResult};
use std::path::{Path, PathBuf};

const APP_DIR: &str = "diagramkit";
const CONFIG_FILE: &str = "config.toml";

/// Default config file location: `<config_dir>/diagramkit/config.toml`
pub fn default_config_path() -> SettingsResult<PathBuf> {
    dirs::config_dir()
        .map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
        .ok_or_else(|| {
            SettingsError::ConfigDirectory("no platform config directory".to_string())
        })
}

/// Settings persistence layer
#[derive(Debug, Clone)]
pub struct SettingsPersistence {
    config: EditorConfig,
    path: PathBuf,
}

impl SettingsPersistence {
    /// Bind to an explicit config path, starting from defaults
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            config: EditorConfig::default(),
            path: path.into(),
        }
    }

    /// Bind to the platform default path
    pub fn at_default_location() -> SettingsResult<Self> {
        Ok(Self::new(default_config_path()?))
    }

    /// Load the config, falling back to defaults when the file is missing
    pub fn load_or_default(path: &Path) -> SettingsResult<Self> {
        let config = if path.exists() {
            EditorConfig::load_from_file(path)?
        } else {
            tracing::info!(
                "No config at {}, using defaults",
                path.display()
            );
            EditorConfig::default()
        };
        Ok(Self {
            config,
            path: path.to_path_buf(),
        })
    }

    /// Save settings, creating the parent directory if needed
    pub fn save(&self) -> SettingsResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                SettingsError::ConfigDirectory(format!("{}: {}", parent.display(), e))
            })?;
        }
        self.config
            .save_to_file(&self.path)
            .map_err(|e| SettingsError::SaveError(e.to_string()))
    }

    /// Get reference to config
    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    /// Get mutable reference to config
    pub fn config_mut(&mut self) -> &mut EditorConfig {
        &mut self.config
    }

    /// Path this persistence layer reads and writes
    pub fn path(&self) -> &Path {
        &self.path
    }
}
