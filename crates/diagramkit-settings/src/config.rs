//! Editor configuration for DiagramKit
//!
//! Provides configuration file handling and validation. Supports JSON and
//! TOML file formats stored in platform-specific directories.
//!
//! Configuration is organized into logical sections:
//! - Viewport limits (scale range, zoom step, initial origin)
//! - Selection policy (count limit, handle size, pick tolerance)
//! - Undo history depth
//! - Interaction timing (drag threshold, autoscroll, hover, double click)
//! - Grid snapping

use crate::error::{ConfigError, ConfigResult, SettingsResult};
use diagramkit_core::constants;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Viewport settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportSettings {
    /// Smallest scale, before the world-unit factor
    pub min_scale: f64,
    /// Largest scale, before the world-unit factor
    pub max_scale: f64,
    /// Document units per view pixel at scale 1.0
    pub world_unit_factor: f64,
    /// Multiplier for one zoom step
    pub zoom_step: f64,
    /// Initial document-space x at the viewport's left edge
    pub origin_x: f64,
    /// Initial document-space y at the viewport's top edge
    pub origin_y: f64,
}

impl Default for ViewportSettings {
    fn default() -> Self {
        Self {
            min_scale: constants::MIN_SCALE,
            max_scale: constants::MAX_SCALE,
            world_unit_factor: 1.0,
            zoom_step: constants::ZOOM_STEP,
            origin_x: 0.0,
            origin_y: 0.0,
        }
    }
}

/// Selection settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionSettings {
    /// Maximum number of selected objects
    pub max_count: usize,
    /// Handle side length in view pixels
    pub handle_size_px: f64,
    /// Hit-test slop in view pixels
    pub pick_tolerance_px: f64,
}

impl Default for SelectionSettings {
    fn default() -> Self {
        Self {
            max_count: constants::MAX_SELECTION_COUNT,
            handle_size_px: constants::HANDLE_SIZE_PX,
            pick_tolerance_px: constants::PICK_TOLERANCE_PX,
        }
    }
}

/// Undo history settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistorySettings {
    /// Compound units kept on the undo stack (0 = unlimited)
    pub max_depth: usize,
}

impl Default for HistorySettings {
    fn default() -> Self {
        Self {
            max_depth: constants::MAX_UNDO_DEPTH,
        }
    }
}

/// Pointer interaction settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InteractionSettings {
    /// Travel before a press becomes a drag, in view pixels
    pub drag_threshold_px: f64,
    /// Edge band that triggers autoscroll, in view pixels
    pub autoscroll_margin_px: f64,
    /// Delay between autoscroll steps
    pub autoscroll_delay_ms: u64,
    /// Dwell time before a hover event
    pub hover_delay_ms: u64,
    /// Maximum gap between the clicks of a double click
    pub double_click_ms: u64,
}

impl Default for InteractionSettings {
    fn default() -> Self {
        Self {
            drag_threshold_px: constants::DRAG_THRESHOLD_PX,
            autoscroll_margin_px: constants::AUTOSCROLL_MARGIN_PX,
            autoscroll_delay_ms: constants::AUTOSCROLL_DELAY_MS,
            hover_delay_ms: constants::HOVER_DELAY_MS,
            double_click_ms: 500,
        }
    }
}

/// Background grid settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridSettings {
    /// Cell width in document units
    pub cell_width: f64,
    /// Cell height in document units
    pub cell_height: f64,
    /// Snap pointer positions to the grid
    pub snap_enabled: bool,
    /// Paint the grid
    pub visible: bool,
}

impl Default for GridSettings {
    fn default() -> Self {
        Self {
            cell_width: constants::GRID_CELL,
            cell_height: constants::GRID_CELL,
            snap_enabled: false,
            visible: true,
        }
    }
}

/// Complete editor configuration
///
/// Aggregates all settings sections and provides file I/O operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct EditorConfig {
    /// Viewport settings
    pub viewport: ViewportSettings,
    /// Selection settings
    pub selection: SelectionSettings,
    /// Undo history settings
    pub history: HistorySettings,
    /// Interaction settings
    pub interaction: InteractionSettings,
    /// Grid settings
    pub grid: GridSettings,
}

impl EditorConfig {
    /// Create new config with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Load config from file (JSON or TOML)
    pub fn load_from_file(path: &Path) -> SettingsResult<Self> {
        let content = std::fs::read_to_string(path)?;

        let config: Self = match extension(path) {
            Some("json") => serde_json::from_str(&content)?,
            Some("toml") => toml::from_str(&content)?,
            other => {
                return Err(ConfigError::UnsupportedFormat(other.unwrap_or("").to_string()).into())
            }
        };

        config.validate()?;
        tracing::debug!("Loaded editor config from {}", path.display());
        Ok(config)
    }

    /// Save config to file (JSON or TOML)
    pub fn save_to_file(&self, path: &Path) -> SettingsResult<()> {
        self.validate()?;

        let content = match extension(path) {
            Some("json") => serde_json::to_string_pretty(self)?,
            Some("toml") => toml::to_string_pretty(self)?,
            other => {
                return Err(ConfigError::UnsupportedFormat(other.unwrap_or("").to_string()).into())
            }
        };

        std::fs::write(path, content)?;
        tracing::debug!("Saved editor config to {}", path.display());
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> ConfigResult<()> {
        let v = &self.viewport;
        if !(v.min_scale > 0.0) || !v.min_scale.is_finite() {
            return Err(ConfigError::out_of_range("viewport.min_scale", v.min_scale));
        }
        if !v.max_scale.is_finite() || v.max_scale < v.min_scale {
            return Err(ConfigError::Inconsistent(format!(
                "viewport.max_scale {} is below min_scale {}",
                v.max_scale, v.min_scale
            )));
        }
        if !(v.world_unit_factor > 0.0) || !v.world_unit_factor.is_finite() {
            return Err(ConfigError::out_of_range(
                "viewport.world_unit_factor",
                v.world_unit_factor,
            ));
        }
        if !(v.zoom_step > 1.0) || !v.zoom_step.is_finite() {
            return Err(ConfigError::out_of_range("viewport.zoom_step", v.zoom_step));
        }
        if !v.origin_x.is_finite() || !v.origin_y.is_finite() {
            return Err(ConfigError::out_of_range(
                "viewport.origin",
                format!("({}, {})", v.origin_x, v.origin_y),
            ));
        }

        let s = &self.selection;
        if s.max_count == 0 {
            return Err(ConfigError::out_of_range("selection.max_count", 0));
        }
        if !(s.handle_size_px > 0.0) {
            return Err(ConfigError::out_of_range(
                "selection.handle_size_px",
                s.handle_size_px,
            ));
        }
        if !(s.pick_tolerance_px >= 0.0) {
            return Err(ConfigError::out_of_range(
                "selection.pick_tolerance_px",
                s.pick_tolerance_px,
            ));
        }

        let i = &self.interaction;
        if !(i.drag_threshold_px >= 0.0) {
            return Err(ConfigError::out_of_range(
                "interaction.drag_threshold_px",
                i.drag_threshold_px,
            ));
        }
        if !(i.autoscroll_margin_px >= 0.0) {
            return Err(ConfigError::out_of_range(
                "interaction.autoscroll_margin_px",
                i.autoscroll_margin_px,
            ));
        }
        if i.autoscroll_delay_ms == 0 {
            return Err(ConfigError::out_of_range("interaction.autoscroll_delay_ms", 0));
        }

        let g = &self.grid;
        if !(g.cell_width > 0.0) || !(g.cell_height > 0.0) {
            return Err(ConfigError::out_of_range(
                "grid.cell",
                format!("{} x {}", g.cell_width, g.cell_height),
            ));
        }

        Ok(())
    }

    /// Effective scale range after applying the world-unit factor
    pub fn scale_range(&self) -> (f64, f64) {
        let factor = self.viewport.world_unit_factor;
        (
            self.viewport.min_scale * factor,
            self.viewport.max_scale * factor,
        )
    }
}

fn extension(path: &Path) -> Option<&str> {
    path.extension().and_then(|ext| ext.to_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = EditorConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.selection.max_count, 999_999);
        assert_eq!(config.history.max_depth, 100);
        assert_eq!(config.scale_range(), (0.01, 10.0));
    }

    #[test]
    fn test_validation_rejects_bad_scale() {
        let mut config = EditorConfig::default();
        config.viewport.min_scale = 0.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValueOutOfRange { .. })
        ));

        let mut config = EditorConfig::default();
        config.viewport.max_scale = 0.001;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Inconsistent(_))
        ));
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: EditorConfig = toml::from_str(
            r#"
            [selection]
            max_count = 3

            [grid]
            snap_enabled = true
            "#,
        )
        .expect("parse toml");

        assert_eq!(config.selection.max_count, 3);
        assert_eq!(config.selection.handle_size_px, 6.0);
        assert!(config.grid.snap_enabled);
        assert_eq!(config.viewport, ViewportSettings::default());
    }

    #[test]
    fn test_scale_range_uses_world_factor() {
        let mut config = EditorConfig::default();
        config.viewport.world_unit_factor = 2.0;
        assert_eq!(config.scale_range(), (0.02, 20.0));
    }
}
