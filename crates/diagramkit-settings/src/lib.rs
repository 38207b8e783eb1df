//! DiagramKit Settings Crate
//!
//! Handles editor configuration, validation, and settings persistence.

pub mod config;
pub mod error;
pub mod persistence;

pub use config::{
    EditorConfig, GridSettings, HistorySettings, InteractionSettings, SelectionSettings,
    ViewportSettings,
};
pub use error::{ConfigError, ConfigResult, SettingsError, SettingsResult};
pub use persistence::{default_config_path, SettingsPersistence};
