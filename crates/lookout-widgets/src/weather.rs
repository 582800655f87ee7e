//! Weather widget backed by an Open-Meteo-compatible endpoint.

use std::time::Duration;

use async_trait::async_trait;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;
use serde_json::{json, Value};
use tracing::debug;

use lookout_core::error::{Result, WidgetError};
use lookout_core::options::{OptionsSchema, PropertySchema};
use lookout_core::plugin::{PluginManifest, WidgetFactory};
use lookout_core::poll::DataSource;
use lookout_core::theme::Theme;
use lookout_core::widget::{BuiltWidget, Widget, WidgetContext};

const DEFAULT_ENDPOINT: &str = "https://api.open-meteo.com/v1/forecast";
const DEFAULT_REFRESH_SECS: u64 = 600;
const USER_AGENT: &str = concat!("lookout/", env!("CARGO_PKG_VERSION"));

// The framework imposes no fetch timeout; this is the HTTP client's own.
const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Request URL for the configured coordinates.
pub(crate) fn build_url(endpoint: &str, latitude: f64, longitude: f64, fahrenheit: bool) -> String {
    let mut url = format!("{endpoint}?latitude={latitude}&longitude={longitude}&current_weather=true");
    if fahrenheit {
        url.push_str("&temperature_unit=fahrenheit");
    }
    url
}

/// Glyph and label for a WMO weather code.
pub(crate) fn wmo_condition(code: u64) -> (&'static str, &'static str) {
    match code {
        0 => ("☀", "Clear sky"),
        1 | 2 => ("⛅", "Partly cloudy"),
        3 => ("☁", "Overcast"),
        45 | 48 => ("🌫", "Fog"),
        51..=57 => ("🌦", "Drizzle"),
        61..=67 => ("🌧", "Rain"),
        71..=77 => ("🌨", "Snow"),
        80..=82 => ("🌧", "Showers"),
        85 | 86 => ("🌨", "Snow showers"),
        95..=99 => ("⛈", "Thunderstorm"),
        _ => ("·", "Unknown"),
    }
}

struct WeatherSource {
    client: reqwest::Client,
    url: String,
}

#[async_trait]
impl DataSource for WeatherSource {
    async fn fetch(&mut self) -> Result<Value> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| WidgetError::fetch(format!("weather request failed: {e}")))?;
        let status = response.status();
        if !status.is_success() {
            return Err(WidgetError::fetch_status(status.as_u16()));
        }
        response
            .json::<Value>()
            .await
            .map_err(|e| WidgetError::fetch(format!("weather response was not JSON: {e}")))
    }
}

#[derive(Debug, Clone, PartialEq)]
struct WeatherSnapshot {
    temperature: f64,
    windspeed: f64,
    code: u64,
}

fn parse_snapshot(data: &Value) -> Option<WeatherSnapshot> {
    let current = data.get("current_weather")?;
    Some(WeatherSnapshot {
        temperature: current.get("temperature").and_then(Value::as_f64)?,
        windspeed: current.get("windspeed").and_then(Value::as_f64).unwrap_or(0.0),
        code: current.get("weathercode").and_then(Value::as_u64).unwrap_or(u64::MAX),
    })
}

struct WeatherWidget {
    snapshot: Option<WeatherSnapshot>,
    label: String,
    unit_suffix: &'static str,
}

#[async_trait]
impl Widget for WeatherWidget {
    fn render(&self, frame: &mut Frame<'_>, area: Rect, theme: &Theme) {
        let mut lines = vec![Line::styled(
            self.label.clone(),
            Style::default().fg(theme.secondary),
        )];
        match &self.snapshot {
            Some(snapshot) => {
                let (glyph, condition) = wmo_condition(snapshot.code);
                lines.push(Line::from(vec![
                    Span::styled(
                        format!("{glyph} {:.1}{}", snapshot.temperature, self.unit_suffix),
                        Style::default().fg(theme.primary).add_modifier(Modifier::BOLD),
                    ),
                    Span::styled(format!("  {condition}"), Style::default().fg(theme.fg)),
                ]));
                lines.push(Line::styled(
                    format!("wind {:.0} km/h", snapshot.windspeed),
                    Style::default().fg(theme.fg),
                ));
            }
            None => lines.push(Line::styled(
                "waiting for data…",
                Style::default().fg(theme.border),
            )),
        }
        frame.render_widget(Paragraph::new(lines), area);
    }

    fn apply_data(&mut self, data: Value) {
        match parse_snapshot(&data) {
            Some(snapshot) => self.snapshot = Some(snapshot),
            None => debug!("weather payload had no current_weather block"),
        }
    }
}

/// Factory for the built-in weather plugin.
pub struct WeatherFactory;

impl WidgetFactory for WeatherFactory {
    fn manifest(&self) -> PluginManifest {
        PluginManifest {
            name: "weather".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            description: Some("Current weather for a fixed location".to_string()),
            author: None,
            license: None,
            category: Some("network".to_string()),
            options_schema: OptionsSchema::new()
                .property(
                    "latitude",
                    PropertySchema::number()
                        .describe("location latitude")
                        .minimum(-90.0)
                        .maximum(90.0),
                )
                .property(
                    "longitude",
                    PropertySchema::number()
                        .describe("location longitude")
                        .minimum(-180.0)
                        .maximum(180.0),
                )
                .property(
                    "units",
                    PropertySchema::string()
                        .describe("temperature units")
                        .default_value(json!("celsius"))
                        .one_of(vec![json!("celsius"), json!("fahrenheit")]),
                )
                .property(
                    "label",
                    PropertySchema::string()
                        .describe("display name for the location")
                        .default_value(json!("Weather")),
                )
                .property(
                    "endpoint",
                    PropertySchema::string()
                        .describe("forecast API base URL")
                        .default_value(json!(DEFAULT_ENDPOINT)),
                )
                .property(
                    "refresh_secs",
                    PropertySchema::integer()
                        .describe("seconds between refreshes")
                        .default_value(json!(DEFAULT_REFRESH_SECS))
                        .minimum(30.0)
                        .maximum(3600.0),
                )
                .require("latitude")
                .require("longitude"),
        }
    }

    fn build(&self, ctx: &WidgetContext) -> Result<BuiltWidget> {
        let latitude = ctx
            .opt_f64("latitude")
            .ok_or_else(|| WidgetError::init("latitude option is required"))?;
        let longitude = ctx
            .opt_f64("longitude")
            .ok_or_else(|| WidgetError::init("longitude option is required"))?;
        let fahrenheit = ctx.opt_str("units") == Some("fahrenheit");
        let endpoint = ctx.opt_str("endpoint").unwrap_or(DEFAULT_ENDPOINT);
        let refresh = ctx.opt_u64("refresh_secs").unwrap_or(DEFAULT_REFRESH_SECS);

        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(|e| WidgetError::init(format!("failed to build HTTP client: {e}")))?;

        Ok(BuiltWidget::polled(
            Box::new(WeatherWidget {
                snapshot: None,
                label: ctx.opt_str("label").unwrap_or("Weather").to_string(),
                unit_suffix: if fahrenheit { "°F" } else { "°C" },
            }),
            Box::new(WeatherSource {
                client,
                url: build_url(endpoint, latitude, longitude, fahrenheit),
            }),
            Duration::from_secs(refresh),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn test_build_url() {
        let url = build_url(DEFAULT_ENDPOINT, 52.52, 13.4, false);
        assert_eq!(
            url,
            "https://api.open-meteo.com/v1/forecast?latitude=52.52&longitude=13.4&current_weather=true"
        );
        let url = build_url("http://localhost:9999/v1", -33.9, 151.2, true);
        assert!(url.ends_with("&temperature_unit=fahrenheit"));
        assert!(url.starts_with("http://localhost:9999/v1?latitude=-33.9"));
    }

    #[test_case(0, "Clear sky")]
    #[test_case(2, "Partly cloudy")]
    #[test_case(48, "Fog")]
    #[test_case(63, "Rain")]
    #[test_case(75, "Snow")]
    #[test_case(96, "Thunderstorm")]
    #[test_case(12345, "Unknown")]
    fn test_wmo_condition(code: u64, label: &str) {
        assert_eq!(wmo_condition(code).1, label);
    }

    #[test]
    fn test_parse_snapshot() {
        let data = json!({
            "current_weather": { "temperature": 12.3, "windspeed": 8.0, "weathercode": 2 }
        });
        let snapshot = parse_snapshot(&data).expect("snapshot");
        assert!((snapshot.temperature - 12.3).abs() < f64::EPSILON);
        assert_eq!(snapshot.code, 2);
    }

    #[test]
    fn test_parse_snapshot_requires_temperature() {
        assert!(parse_snapshot(&json!({ "current_weather": {} })).is_none());
        assert!(parse_snapshot(&json!({})).is_none());
    }
}
