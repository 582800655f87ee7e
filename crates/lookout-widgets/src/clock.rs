//! Clock widget: local time and date, refreshed on the host tick.

use async_trait::async_trait;
use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Local};
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::Line;
use ratatui::widgets::Paragraph;
use ratatui::Frame;
use serde_json::json;

use lookout_core::error::{Result, WidgetError};
use lookout_core::options::{OptionsSchema, PropertySchema};
use lookout_core::plugin::{PluginManifest, WidgetFactory};
use lookout_core::theme::Theme;
use lookout_core::widget::{BuiltWidget, Widget, WidgetContext};

const DEFAULT_FORMAT: &str = "%H:%M:%S";

/// Reject strftime strings chrono would fail to format.
fn format_is_valid(format: &str) -> bool {
    !StrftimeItems::new(format).any(|item| matches!(item, Item::Error))
}

struct ClockWidget {
    format: String,
    show_date: bool,
    now: DateTime<Local>,
}

#[async_trait]
impl Widget for ClockWidget {
    async fn initialize(&mut self, _ctx: &WidgetContext) -> Result<()> {
        if !format_is_valid(&self.format) {
            return Err(WidgetError::init(format!(
                "'{}' is not a valid time format",
                self.format
            )));
        }
        self.now = Local::now();
        Ok(())
    }

    fn render(&self, frame: &mut Frame<'_>, area: Rect, theme: &Theme) {
        let mut lines = vec![Line::styled(
            self.now.format(&self.format).to_string(),
            Style::default().fg(theme.primary).add_modifier(Modifier::BOLD),
        )];
        if self.show_date {
            lines.push(Line::styled(
                self.now.format("%A, %e %B %Y").to_string(),
                Style::default().fg(theme.secondary),
            ));
        }
        let paragraph = Paragraph::new(lines).centered();
        frame.render_widget(paragraph, area);
    }

    fn update(&mut self) {
        self.now = Local::now();
    }
}

/// Factory for the built-in clock plugin.
pub struct ClockFactory;

impl WidgetFactory for ClockFactory {
    fn manifest(&self) -> PluginManifest {
        PluginManifest {
            name: "clock".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            description: Some("Local time and date".to_string()),
            author: None,
            license: None,
            category: Some("time".to_string()),
            options_schema: OptionsSchema::new()
                .property(
                    "format",
                    PropertySchema::string()
                        .describe("strftime format for the time line")
                        .default_value(json!(DEFAULT_FORMAT)),
                )
                .property(
                    "show_date",
                    PropertySchema::boolean()
                        .describe("show a date line under the time")
                        .default_value(json!(true)),
                ),
        }
    }

    fn build(&self, ctx: &WidgetContext) -> Result<BuiltWidget> {
        Ok(BuiltWidget::simple(Box::new(ClockWidget {
            format: ctx.opt_str("format").unwrap_or(DEFAULT_FORMAT).to_string(),
            show_date: ctx.opt_bool("show_date").unwrap_or(true),
            now: Local::now(),
        })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lookout_core::widget::WidgetId;
    use serde_json::{Map, Value};

    fn ctx(options: Value) -> WidgetContext {
        let map = match options {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        WidgetContext::new(WidgetId(0), "clock", map)
    }

    #[test]
    fn test_format_validation() {
        assert!(format_is_valid("%H:%M:%S"));
        assert!(format_is_valid("%A %e %B"));
        assert!(!format_is_valid("%Q-bogus"));
    }

    #[tokio::test]
    async fn test_initialize_rejects_bad_format() {
        let built = ClockFactory
            .build(&ctx(serde_json::json!({ "format": "%Q" })))
            .expect("build");
        let mut widget = built.widget;
        let err = widget
            .initialize(&ctx(serde_json::json!({})))
            .await
            .expect_err("bad format must fail initialize");
        assert!(matches!(err, WidgetError::Init(_)));
    }

    #[tokio::test]
    async fn test_initialize_with_defaults() {
        let built = ClockFactory.build(&ctx(serde_json::json!({}))).expect("build");
        let mut widget = built.widget;
        widget.initialize(&ctx(serde_json::json!({}))).await.expect("init");
    }
}
