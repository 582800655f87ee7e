//! Error types for the dashboard host.

use std::path::PathBuf;

use lookout_core::error::WidgetError;
use thiserror::Error;

/// Errors that abort dashboard startup.
///
/// Everything here is a configuration-time failure, reported before the
/// render loop starts. Runtime widget failures never surface as `HostError`;
/// they are captured in the owning slot.
#[derive(Debug, Error)]
pub enum HostError {
    /// Config file could not be read.
    #[error("failed to read config {}: {source}", .path.display())]
    ConfigRead {
        /// Offending file.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Config file was not valid JSON.
    #[error("failed to parse config {}: {source}", .path.display())]
    ConfigParse {
        /// Offending file.
        path: PathBuf,
        /// Underlying parse error.
        #[source]
        source: serde_json::Error,
    },

    /// A plugin's grid position does not fit the layout.
    #[error("plugin '{plugin}': {detail}")]
    InvalidPosition {
        /// Configured plugin name.
        plugin: String,
        /// What is wrong with the position.
        detail: String,
    },

    /// Resolution or construction failure escalated from the framework.
    #[error(transparent)]
    Widget(#[from] WidgetError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_widget_error_passes_through() {
        let err = HostError::from(WidgetError::not_found("ghost", "/plugins/ghost/plugin.json"));
        let text = err.to_string();
        assert!(text.contains("ghost"));
        assert!(text.contains("/plugins/ghost/plugin.json"));
    }

    #[test]
    fn test_invalid_position_display() {
        let err = HostError::InvalidPosition {
            plugin: "clock".to_string(),
            detail: "column 5 exceeds grid width 2".to_string(),
        };
        assert_eq!(err.to_string(), "plugin 'clock': column 5 exceeds grid width 2");
    }
}
