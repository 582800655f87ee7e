//! Error taxonomy for the widget framework.

use std::path::PathBuf;
use thiserror::Error;

use crate::options::Violation;

/// Result alias used throughout the framework.
pub type Result<T> = std::result::Result<T, WidgetError>;

/// Errors originating from widgets and plugin resolution.
///
/// Every variant except [`WidgetError::PluginNotFound`] is caught at the
/// widget boundary and rendered in place; a misbehaving widget never takes
/// down the dashboard. Resolution failures are fatal during dashboard
/// construction only, before the render loop starts.
#[derive(Debug, Clone, Error)]
pub enum WidgetError {
    /// Supplied options did not satisfy the plugin's declared schema.
    #[error("invalid options: {}", summarize(.violations))]
    Validation {
        /// One entry per violated constraint.
        violations: Vec<Violation>,
    },

    /// No implementation could be located for a configured plugin name.
    #[error("plugin '{name}' not found (expected at {})", .path.display())]
    PluginNotFound {
        /// The configured plugin name.
        name: String,
        /// The fully resolved path where the plugin was expected.
        path: PathBuf,
    },

    /// The plugin's own initialization failed.
    #[error("initialization failed: {0}")]
    Init(String),

    /// A network or process call failed while fetching data.
    #[error("fetch failed: {message}")]
    Fetch {
        /// Human-readable failure description.
        message: String,
        /// Upstream HTTP status, when there was one.
        status: Option<u16>,
    },

    /// Rendering failed after data was available.
    #[error("render failed: {0}")]
    Render(String),
}

impl WidgetError {
    /// Build a validation error from a non-empty violation list.
    #[must_use]
    pub fn validation(violations: Vec<Violation>) -> Self {
        Self::Validation { violations }
    }

    /// Build a resolution error carrying the attempted path.
    #[must_use]
    pub fn not_found(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self::PluginNotFound {
            name: name.into(),
            path: path.into(),
        }
    }

    /// Build an initialization error.
    #[must_use]
    pub fn init(message: impl Into<String>) -> Self {
        Self::Init(message.into())
    }

    /// Build a fetch error with no upstream status.
    #[must_use]
    pub fn fetch(message: impl Into<String>) -> Self {
        Self::Fetch {
            message: message.into(),
            status: None,
        }
    }

    /// Build a fetch error from an upstream HTTP status code.
    #[must_use]
    pub fn fetch_status(status: u16) -> Self {
        Self::Fetch {
            message: describe_http_status(status),
            status: Some(status),
        }
    }

    /// Build a render error.
    #[must_use]
    pub fn render(message: impl Into<String>) -> Self {
        Self::Render(message.into())
    }

    /// Transient errors are retried on the next scheduled tick.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Fetch { .. })
    }
}

/// User-facing phrasing for upstream HTTP failures.
///
/// 401/403/404/429 get distinct phrasings; anything else is generic.
#[must_use]
pub fn describe_http_status(status: u16) -> String {
    match status {
        401 => "unauthorized (401): credentials are missing or invalid".to_string(),
        403 => "forbidden (403): the token lacks permission".to_string(),
        404 => "not found (404): the configured resource does not exist".to_string(),
        429 => "rate limited (429): upstream is throttling requests".to_string(),
        other => format!("upstream returned HTTP {other}"),
    }
}

fn summarize(violations: &[Violation]) -> String {
    match violations.first() {
        Some(first) if violations.len() == 1 => first.to_string(),
        Some(first) => format!("{first} (+{} more)", violations.len() - 1),
        None => "unknown violation".to_string(),
    }
}
