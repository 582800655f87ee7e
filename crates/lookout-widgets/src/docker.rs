//! Docker container monitor.
//!
//! Shells out to `docker ps --format '{{json .}}'` and parses one JSON
//! document per line, the same way the CLI emits them.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;
use serde_json::{json, Value};
use tokio::process::Command;
use tracing::warn;

use lookout_core::error::{Result, WidgetError};
use lookout_core::options::{OptionsSchema, PropertySchema};
use lookout_core::plugin::{PluginManifest, WidgetFactory};
use lookout_core::poll::DataSource;
use lookout_core::theme::Theme;
use lookout_core::widget::{BuiltWidget, Widget, WidgetContext};

const DEFAULT_REFRESH_SECS: u64 = 10;
const DEFAULT_LIMIT: u64 = 10;
const NAME_WIDTH: usize = 18;
const IMAGE_WIDTH: usize = 24;

/// Parse `docker ps` line-delimited JSON output, skipping garbage lines.
pub(crate) fn parse_ps_output(stdout: &str) -> Vec<Value> {
    stdout
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| serde_json::from_str(line).ok())
        .collect()
}

struct DockerSource {
    all: bool,
}

#[async_trait]
impl DataSource for DockerSource {
    async fn fetch(&mut self) -> Result<Value> {
        let mut command = Command::new("docker");
        command.arg("ps").arg("--format").arg("{{json .}}");
        if self.all {
            command.arg("--all");
        }
        command.stdin(Stdio::null());

        let output = command
            .output()
            .await
            .map_err(|e| WidgetError::fetch(format!("failed to run docker: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let excerpt: String = stderr.trim().chars().take(120).collect();
            return Err(WidgetError::fetch(format!(
                "docker ps exited with {}: {excerpt}",
                output.status
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(Value::Array(parse_ps_output(&stdout)))
    }
}

#[derive(Debug, Clone, PartialEq)]
struct ContainerRow {
    name: String,
    image: String,
    status: String,
    state: String,
}

fn parse_row(data: &Value) -> Option<ContainerRow> {
    Some(ContainerRow {
        name: data.get("Names").and_then(Value::as_str)?.to_string(),
        image: data.get("Image").and_then(Value::as_str).unwrap_or("?").to_string(),
        status: data.get("Status").and_then(Value::as_str).unwrap_or("").to_string(),
        state: data.get("State").and_then(Value::as_str).unwrap_or("unknown").to_string(),
    })
}

fn state_color(state: &str) -> Color {
    match state {
        "running" => Color::Green,
        "exited" | "dead" => Color::Red,
        "paused" => Color::Yellow,
        "restarting" | "created" => Color::Cyan,
        _ => Color::DarkGray,
    }
}

struct DockerWidget {
    containers: Vec<ContainerRow>,
    limit: usize,
}

#[async_trait]
impl Widget for DockerWidget {
    fn render(&self, frame: &mut Frame<'_>, area: Rect, theme: &Theme) {
        if self.containers.is_empty() {
            let empty = Paragraph::new(Line::styled(
                "no containers",
                Style::default().fg(theme.border),
            ));
            frame.render_widget(empty, area);
            return;
        }

        let lines: Vec<Line> = self
            .containers
            .iter()
            .take(self.limit)
            .map(|container| {
                let name: String = container.name.chars().take(NAME_WIDTH).collect();
                let image: String = container.image.chars().take(IMAGE_WIDTH).collect();
                Line::from(vec![
                    Span::styled("● ", Style::default().fg(state_color(&container.state))),
                    Span::styled(
                        format!("{:<width$} ", name, width = NAME_WIDTH),
                        Style::default().fg(theme.primary).add_modifier(Modifier::BOLD),
                    ),
                    Span::styled(
                        format!("{:<width$} ", image, width = IMAGE_WIDTH),
                        Style::default().fg(theme.fg),
                    ),
                    Span::styled(container.status.clone(), Style::default().fg(theme.secondary)),
                ])
            })
            .collect();

        frame.render_widget(Paragraph::new(lines), area);
    }

    fn apply_data(&mut self, data: Value) {
        match data.as_array() {
            Some(rows) => self.containers = rows.iter().filter_map(parse_row).collect(),
            None => warn!("docker widget expected an array payload"),
        }
    }
}

/// Factory for the built-in Docker monitor plugin.
pub struct DockerFactory;

impl WidgetFactory for DockerFactory {
    fn manifest(&self) -> PluginManifest {
        PluginManifest {
            name: "docker".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            description: Some("Containers reported by the local docker daemon".to_string()),
            author: None,
            license: None,
            category: Some("system".to_string()),
            options_schema: OptionsSchema::new()
                .property(
                    "all",
                    PropertySchema::boolean()
                        .describe("include stopped containers")
                        .default_value(json!(false)),
                )
                .property(
                    "limit",
                    PropertySchema::integer()
                        .describe("maximum rows shown")
                        .default_value(json!(DEFAULT_LIMIT))
                        .minimum(1.0)
                        .maximum(50.0),
                )
                .property(
                    "refresh_secs",
                    PropertySchema::integer()
                        .describe("seconds between refreshes")
                        .default_value(json!(DEFAULT_REFRESH_SECS))
                        .minimum(2.0)
                        .maximum(300.0),
                ),
        }
    }

    fn build(&self, ctx: &WidgetContext) -> Result<BuiltWidget> {
        let refresh = ctx.opt_u64("refresh_secs").unwrap_or(DEFAULT_REFRESH_SECS);
        Ok(BuiltWidget::polled(
            Box::new(DockerWidget {
                containers: Vec::new(),
                limit: ctx.opt_u64("limit").unwrap_or(DEFAULT_LIMIT) as usize,
            }),
            Box::new(DockerSource {
                all: ctx.opt_bool("all").unwrap_or(false),
            }),
            Duration::from_secs(refresh),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ps_output() {
        let stdout = concat!(
            r#"{"Names":"web","Image":"nginx:1.27","Status":"Up 2 hours","State":"running"}"#,
            "\n",
            r#"{"Names":"db","Image":"postgres:16","Status":"Exited (0) 3 days ago","State":"exited"}"#,
            "\n",
        );
        let rows = parse_ps_output(stdout);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["Names"], "web");
    }

    #[test]
    fn test_parse_ps_output_tolerates_garbage() {
        let stdout = concat!(
            "WARNING: something on stderr leaked here\n",
            r#"{"Names":"web","Image":"nginx","State":"running"}"#,
            "\n",
            "\n",
            "trailing noise",
        );
        let rows = parse_ps_output(stdout);
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn test_parse_row() {
        let row = parse_row(&json!({
            "Names": "web", "Image": "nginx:1.27", "Status": "Up 2 hours", "State": "running"
        }))
        .expect("row");
        assert_eq!(row.name, "web");
        assert_eq!(row.state, "running");
    }

    #[test]
    fn test_parse_row_requires_name() {
        assert!(parse_row(&json!({ "Image": "nginx" })).is_none());
    }

    #[test]
    fn test_state_colors() {
        assert_eq!(state_color("running"), Color::Green);
        assert_eq!(state_color("exited"), Color::Red);
        assert_eq!(state_color("paused"), Color::Yellow);
        assert_eq!(state_color("weird"), Color::DarkGray);
    }

    #[test]
    fn test_apply_data_respects_parse() {
        let mut widget = DockerWidget { containers: Vec::new(), limit: 10 };
        widget.apply_data(json!([
            { "Names": "a", "Image": "x", "State": "running" },
            { "not": "a container" },
            { "Names": "b", "Image": "y", "State": "exited" }
        ]));
        assert_eq!(widget.containers.len(), 2);
    }
}
