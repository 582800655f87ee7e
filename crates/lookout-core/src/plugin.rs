//! Plugin resolution and registration.
//!
//! A plugin is identified by name. Its metadata (including the options
//! schema) lives in a `plugin.json` manifest, resolved from a fixed plugins
//! root on disk; built-in plugins carry an embedded manifest instead. The
//! implementation itself always comes from the [`WidgetRegistry`] lookup
//! table.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, WidgetError};
use crate::options::OptionsSchema;
use crate::widget::{BuiltWidget, DrawFn, StaticWidget, WidgetContext};

/// Fixed entry-file name of an on-disk plugin.
pub const PLUGIN_MANIFEST: &str = "plugin.json";

/// Plugin package metadata, declared by the plugin itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PluginManifest {
    /// Plugin name; must match the directory name under the plugins root.
    pub name: String,
    /// Plugin version.
    pub version: String,
    /// Short description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Author.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    /// License identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license: Option<String>,
    /// Category, e.g. "system" or "network".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Declared options schema; used only for validation.
    #[serde(default, rename = "optionsSchema")]
    pub options_schema: OptionsSchema,
}

/// Locates plugin manifests on disk.
///
/// Resolution is a single deterministic existence check: the expected
/// location is the plugins root joined with the plugin name and
/// [`PLUGIN_MANIFEST`]. No fuzzy search, no version resolution.
#[derive(Debug, Clone)]
pub struct PluginResolver {
    root: PathBuf,
}

impl PluginResolver {
    /// Create a resolver rooted at `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The plugins root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a plugin name to its manifest path.
    ///
    /// # Errors
    ///
    /// [`WidgetError::PluginNotFound`] carrying both the name and the fully
    /// resolved expected path when nothing exists there.
    pub fn resolve(&self, name: &str) -> Result<PathBuf> {
        let path = self.root.join(name).join(PLUGIN_MANIFEST);
        if path.is_file() {
            Ok(path)
        } else {
            Err(WidgetError::not_found(name, path))
        }
    }

    /// Resolve and parse a plugin manifest.
    ///
    /// # Errors
    ///
    /// [`WidgetError::PluginNotFound`] if the manifest is absent, or
    /// [`WidgetError::Init`] if it cannot be read or parsed.
    pub fn load_manifest(&self, name: &str) -> Result<PluginManifest> {
        let path = self.resolve(name)?;
        let raw = std::fs::read_to_string(&path).map_err(|e| {
            WidgetError::init(format!("plugin '{name}': failed to read manifest: {e}"))
        })?;
        serde_json::from_str(&raw).map_err(|e| {
            WidgetError::init(format!("plugin '{name}': invalid manifest: {e}"))
        })
    }
}

/// Builds widget instances for one plugin.
///
/// The full-lifecycle plugin shape: the factory owns the embedded manifest
/// and constructs the widget (plus its data source, for polled widgets) from
/// a validated context.
pub trait WidgetFactory: Send + Sync {
    /// The plugin's embedded metadata.
    fn manifest(&self) -> PluginManifest;

    /// Construct an instance from validated options.
    ///
    /// # Errors
    ///
    /// Any [`WidgetError`]; the host puts the slot into the error phase.
    fn build(&self, ctx: &WidgetContext) -> Result<BuiltWidget>;
}

enum RegisteredPlugin {
    Factory(Box<dyn WidgetFactory>),
    Simple {
        manifest: PluginManifest,
        draw: DrawFn,
    },
}

/// Lookup table from plugin name to implementation.
///
/// Two plugin shapes coexist: full [`WidgetFactory`] implementations, and
/// simple draw functions adapted via [`StaticWidget`].
#[derive(Default)]
pub struct WidgetRegistry {
    entries: BTreeMap<String, RegisteredPlugin>,
}

impl WidgetRegistry {
    /// An empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a full-lifecycle plugin. Later registrations win.
    pub fn register(&mut self, factory: Box<dyn WidgetFactory>) {
        let name = factory.manifest().name;
        self.entries.insert(name, RegisteredPlugin::Factory(factory));
    }

    /// Register a simple draw-function plugin.
    pub fn register_simple(&mut self, manifest: PluginManifest, draw: DrawFn) {
        self.entries
            .insert(manifest.name.clone(), RegisteredPlugin::Simple { manifest, draw });
    }

    /// Whether an implementation is registered under `name`.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Registered plugin names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.entries.keys().map(String::as_str).collect()
    }

    /// The embedded manifest for `name`, if registered.
    #[must_use]
    pub fn manifest(&self, name: &str) -> Option<PluginManifest> {
        match self.entries.get(name) {
            Some(RegisteredPlugin::Factory(factory)) => Some(factory.manifest()),
            Some(RegisteredPlugin::Simple { manifest, .. }) => Some(manifest.clone()),
            None => None,
        }
    }

    /// Build an instance of `name` from a validated context.
    ///
    /// Returns `None` when no implementation is registered.
    #[must_use]
    pub fn build(&self, name: &str, ctx: &WidgetContext) -> Option<Result<BuiltWidget>> {
        match self.entries.get(name) {
            Some(RegisteredPlugin::Factory(factory)) => Some(factory.build(ctx)),
            Some(RegisteredPlugin::Simple { draw, .. }) => Some(Ok(BuiltWidget::simple(
                Box::new(StaticWidget::new(ctx.clone(), *draw)),
            ))),
            None => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::widget::WidgetId;
    use ratatui::layout::Rect;
    use ratatui::Frame;
    use serde_json::Map;

    fn manifest(name: &str) -> PluginManifest {
        PluginManifest {
            name: name.to_string(),
            version: "0.1.0".to_string(),
            description: None,
            author: None,
            license: None,
            category: None,
            options_schema: OptionsSchema::new(),
        }
    }

    fn draw_nothing(_: &WidgetContext, _: &mut Frame<'_>, _: Rect, _: &crate::theme::Theme) {}

    #[test]
    fn test_resolve_joins_root_name_entry() {
        let dir = tempfile::tempdir().expect("tempdir");
        let weather_dir = dir.path().join("weather");
        std::fs::create_dir_all(&weather_dir).expect("mkdir");
        std::fs::write(weather_dir.join(PLUGIN_MANIFEST), "{}").expect("write");

        let resolver = PluginResolver::new(dir.path());
        let resolved = resolver.resolve("weather").expect("resolve");
        assert_eq!(resolved, dir.path().join("weather").join(PLUGIN_MANIFEST));
    }

    #[test]
    fn test_resolve_missing_reports_name_and_path() {
        let dir = tempfile::tempdir().expect("tempdir");
        let resolver = PluginResolver::new(dir.path());

        let err = resolver.resolve("nonexistent").expect_err("should fail");
        let text = err.to_string();
        assert!(text.contains("nonexistent"));
        let expected = dir.path().join("nonexistent").join(PLUGIN_MANIFEST);
        assert!(text.contains(&expected.display().to_string()));
    }

    #[test]
    fn test_load_manifest_parses_schema() {
        let dir = tempfile::tempdir().expect("tempdir");
        let plugin_dir = dir.path().join("weather");
        std::fs::create_dir_all(&plugin_dir).expect("mkdir");
        std::fs::write(
            plugin_dir.join(PLUGIN_MANIFEST),
            r#"{
                "name": "weather",
                "version": "1.2.0",
                "category": "network",
                "optionsSchema": {
                    "properties": {
                        "latitude": { "type": "number", "minimum": -90, "maximum": 90 }
                    },
                    "required": ["latitude"]
                }
            }"#,
        )
        .expect("write");

        let resolver = PluginResolver::new(dir.path());
        let loaded = resolver.load_manifest("weather").expect("load");
        assert_eq!(loaded.version, "1.2.0");
        assert!(loaded.options_schema.properties.contains_key("latitude"));
        assert_eq!(loaded.options_schema.required, vec!["latitude"]);
    }

    #[test]
    fn test_load_manifest_rejects_garbage() {
        let dir = tempfile::tempdir().expect("tempdir");
        let plugin_dir = dir.path().join("broken");
        std::fs::create_dir_all(&plugin_dir).expect("mkdir");
        std::fs::write(plugin_dir.join(PLUGIN_MANIFEST), "not json").expect("write");

        let resolver = PluginResolver::new(dir.path());
        let err = resolver.load_manifest("broken").expect_err("should fail");
        assert!(matches!(err, WidgetError::Init(_)));
    }

    #[test]
    fn test_registry_simple_shape() {
        let mut registry = WidgetRegistry::new();
        registry.register_simple(manifest("banner"), draw_nothing);

        assert!(registry.contains("banner"));
        assert_eq!(registry.names(), vec!["banner"]);

        let ctx = WidgetContext::new(WidgetId(0), "banner", Map::new());
        let built = registry.build("banner", &ctx).expect("registered").expect("built");
        assert!(built.source.is_none());
        assert!(built.poll_interval.is_none());
    }

    #[test]
    fn test_registry_unknown_name() {
        let registry = WidgetRegistry::new();
        let ctx = WidgetContext::new(WidgetId(0), "ghost", Map::new());
        assert!(registry.build("ghost", &ctx).is_none());
        assert!(registry.manifest("ghost").is_none());
    }
}
