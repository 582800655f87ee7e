//! Dashboard configuration file.
//!
//! A JSON document: `autoDetect`, `layout` (preset or explicit dimensions),
//! `plugins` (name + grid position + options) and `theme` (preset name or an
//! inline role map). Configs are immutable once the dashboard starts.

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::warn;

use lookout_core::theme::Theme;

use crate::error::HostError;

/// Grid placement of one widget, serialized as `[row, col, rowSpan, colSpan]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "[u16; 4]", into = "[u16; 4]")]
pub struct Position {
    /// Grid row of the top-left cell.
    pub row: u16,
    /// Grid column of the top-left cell.
    pub col: u16,
    /// Rows covered.
    pub row_span: u16,
    /// Columns covered.
    pub col_span: u16,
}

impl From<[u16; 4]> for Position {
    fn from([row, col, row_span, col_span]: [u16; 4]) -> Self {
        Self { row, col, row_span, col_span }
    }
}

impl From<Position> for [u16; 4] {
    fn from(position: Position) -> Self {
        [position.row, position.col, position.row_span, position.col_span]
    }
}

/// One configured widget instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PluginConfig {
    /// Plugin name to resolve.
    pub name: String,
    /// Grid placement.
    pub position: Position,
    /// Raw options, validated against the plugin's schema at build time.
    #[serde(default)]
    pub options: Map<String, Value>,
}

/// Grid dimensions, from a preset or explicit values.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Named preset: `grid2x2`, `grid3x3` or `wide`.
    pub preset: Option<String>,
    /// Explicit row count; overrides the preset together with `cols`.
    pub rows: Option<u16>,
    /// Explicit column count.
    pub cols: Option<u16>,
}

impl LayoutConfig {
    /// Resolved (rows, cols). Unknown presets warn and fall back to 2x2.
    #[must_use]
    pub fn dimensions(&self) -> (u16, u16) {
        if let (Some(rows), Some(cols)) = (self.rows, self.cols) {
            return (rows.max(1), cols.max(1));
        }
        match self.preset.as_deref() {
            None | Some("grid2x2") => (2, 2),
            Some("grid3x3") => (3, 3),
            Some("wide") => (2, 3),
            Some(other) => {
                warn!(preset = other, "unknown layout preset, using grid2x2");
                (2, 2)
            }
        }
    }
}

/// Theme selection: a preset name or an inline role -> color map.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ThemeSetting {
    /// Built-in preset name.
    Named(String),
    /// Inline role map, e.g. `{"primary": "green"}`.
    Inline(Map<String, Value>),
}

/// The persisted dashboard configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DashboardConfig {
    /// Fill an empty plugin list with a sensible default set.
    pub auto_detect: bool,
    /// Grid layout.
    pub layout: LayoutConfig,
    /// Configured widgets.
    pub plugins: Vec<PluginConfig>,
    /// Theme selection.
    pub theme: Option<ThemeSetting>,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            auto_detect: true,
            layout: LayoutConfig::default(),
            plugins: Vec::new(),
            theme: None,
        }
    }
}

impl DashboardConfig {
    /// Load and parse a config file.
    ///
    /// # Errors
    ///
    /// [`HostError::ConfigRead`] / [`HostError::ConfigParse`].
    pub fn load(path: &Path) -> Result<Self, HostError> {
        let raw = std::fs::read_to_string(path).map_err(|source| HostError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| HostError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Fill an empty plugin list with the default widget set when
    /// `autoDetect` is on.
    pub fn apply_auto_detect(&mut self) {
        if self.auto_detect && self.plugins.is_empty() {
            self.plugins = default_plugins();
        }
    }
}

fn default_plugins() -> Vec<PluginConfig> {
    vec![
        PluginConfig {
            name: "clock".to_string(),
            position: Position::from([0, 0, 1, 1]),
            options: Map::new(),
        },
        PluginConfig {
            name: "system".to_string(),
            position: Position::from([0, 1, 1, 1]),
            options: Map::new(),
        },
        PluginConfig {
            name: "docker".to_string(),
            position: Position::from([1, 0, 1, 2]),
            options: {
                let mut options = Map::new();
                options.insert("all".to_string(), json!(true));
                options
            },
        },
    ]
}

/// Resolve the configured theme.
#[must_use]
pub fn theme_from_setting(setting: Option<&ThemeSetting>) -> Theme {
    match setting {
        None => Theme::default(),
        Some(ThemeSetting::Named(name)) => Theme::preset_or_default(name),
        Some(ThemeSetting::Inline(roles)) => Theme::from_roles("custom", roles),
    }
}
