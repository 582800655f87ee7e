//! Built-in widgets for the Lookout dashboard.
//!
//! Each widget is a thin consumer of the `lookout-core` framework: a factory
//! with an embedded manifest, an optional data source, and a renderer. The
//! host discovers all of them through [`register_builtins`].

#![forbid(unsafe_code)]

pub mod clock;
pub mod docker;
pub mod github;
pub mod system;
pub mod weather;

use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::text::Line;
use ratatui::widgets::{Paragraph, Wrap};
use ratatui::Frame;
use serde_json::json;

use lookout_core::options::{OptionsSchema, PropertySchema};
use lookout_core::plugin::{PluginManifest, WidgetRegistry};
use lookout_core::theme::Theme;
use lookout_core::widget::WidgetContext;

pub use clock::ClockFactory;
pub use docker::DockerFactory;
pub use github::GithubFactory;
pub use system::SystemFactory;
pub use weather::WeatherFactory;

/// Static text cell; exists mainly as the reference implementation of the
/// simple draw-function plugin shape.
fn draw_text(ctx: &WidgetContext, frame: &mut Frame<'_>, area: Rect, theme: &Theme) {
    let text = ctx.opt_str("text").unwrap_or("");
    let paragraph = Paragraph::new(Line::styled(text.to_string(), Style::default().fg(theme.fg)))
        .wrap(Wrap { trim: true });
    frame.render_widget(paragraph, area);
}

fn text_manifest() -> PluginManifest {
    PluginManifest {
        name: "text".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        description: Some("A fixed block of text".to_string()),
        author: None,
        license: None,
        category: Some("misc".to_string()),
        options_schema: OptionsSchema::new().property(
            "text",
            PropertySchema::string()
                .describe("text to display")
                .default_value(json!("")),
        ),
    }
}

/// Register every built-in widget into `registry`.
pub fn register_builtins(registry: &mut WidgetRegistry) {
    registry.register(Box::new(ClockFactory));
    registry.register(Box::new(SystemFactory));
    registry.register(Box::new(WeatherFactory));
    registry.register(Box::new(GithubFactory));
    registry.register(Box::new(DockerFactory));
    registry.register_simple(text_manifest(), draw_text);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_builtins_registered() {
        let mut registry = WidgetRegistry::new();
        register_builtins(&mut registry);
        for name in ["clock", "system", "weather", "github", "docker", "text"] {
            assert!(registry.contains(name), "missing builtin: {name}");
        }
    }

    #[test]
    fn test_builtin_manifests_name_themselves() {
        let mut registry = WidgetRegistry::new();
        register_builtins(&mut registry);
        for name in registry.names() {
            let manifest = registry.manifest(name).expect("manifest");
            assert_eq!(manifest.name, name);
            assert!(!manifest.version.is_empty());
        }
    }
}
