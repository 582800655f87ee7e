//! Widget lifecycle and data-refresh framework for the Lookout dashboard.
//!
//! The host renders a grid of widgets; each widget is a plugin resolved by
//! name, validated against its declared options schema, and (for data
//! widgets) refreshed by a polling driver that skips overlapping ticks.
//!
//! # Validating options
//!
//! ```
//! use lookout_core::options::{validate, OptionsSchema, PropertySchema};
//! use serde_json::{json, Map};
//!
//! let schema = OptionsSchema::new()
//!     .property("city", PropertySchema::string())
//!     .property("interval", PropertySchema::integer().default_value(json!(60)))
//!     .require("city");
//!
//! let mut options = Map::new();
//! options.insert("city".to_string(), json!("Berlin"));
//!
//! let report = validate(&options, &schema);
//! assert!(report.valid);
//! assert_eq!(report.normalized.get("interval"), Some(&json!(60)));
//! ```
//!
//! # Resolving plugins
//!
//! Resolution is one deterministic existence check against the plugins root;
//! a missing plugin fails with an error naming both the plugin and the fully
//! resolved expected path.

#![forbid(unsafe_code)]

pub mod error;
pub mod format;
pub mod options;
pub mod plugin;
pub mod poll;
pub mod theme;
pub mod widget;

pub use error::{describe_http_status, Result, WidgetError};
pub use options::{validate, OptionsSchema, PropertyKind, PropertySchema, ValidationReport, Violation};
pub use plugin::{PluginManifest, PluginResolver, WidgetFactory, WidgetRegistry, PLUGIN_MANIFEST};
pub use poll::{DataSource, FetchOutcome, PollCommand, PollHandle, Poller};
pub use theme::Theme;
pub use widget::{BuiltWidget, Phase, StaticWidget, Widget, WidgetContext, WidgetId};
