//! GitHub repository status widget.

use std::time::Duration;

use async_trait::async_trait;
use chrono::DateTime;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Paragraph, Wrap};
use ratatui::Frame;
use serde_json::{json, Value};
use tracing::debug;

use lookout_core::error::{Result, WidgetError};
use lookout_core::options::{OptionsSchema, PropertySchema};
use lookout_core::plugin::{PluginManifest, WidgetFactory};
use lookout_core::poll::DataSource;
use lookout_core::theme::Theme;
use lookout_core::widget::{BuiltWidget, Widget, WidgetContext};

const DEFAULT_ENDPOINT: &str = "https://api.github.com";
const DEFAULT_REFRESH_SECS: u64 = 300;
const USER_AGENT: &str = concat!("lookout/", env!("CARGO_PKG_VERSION"));
const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

struct GithubSource {
    client: reqwest::Client,
    url: String,
    token: Option<String>,
}

#[async_trait]
impl DataSource for GithubSource {
    async fn fetch(&mut self) -> Result<Value> {
        let mut request = self
            .client
            .get(&self.url)
            .header("Accept", "application/vnd.github+json");
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        let response = request
            .send()
            .await
            .map_err(|e| WidgetError::fetch(format!("github request failed: {e}")))?;
        let status = response.status();
        if !status.is_success() {
            // 401/403/404/429 each get distinct user-facing phrasing.
            return Err(WidgetError::fetch_status(status.as_u16()));
        }
        response
            .json::<Value>()
            .await
            .map_err(|e| WidgetError::fetch(format!("github response was not JSON: {e}")))
    }
}

#[derive(Debug, Clone, PartialEq)]
struct RepoSnapshot {
    full_name: String,
    description: Option<String>,
    stars: u64,
    forks: u64,
    open_issues: u64,
    pushed_at: Option<String>,
}

fn parse_snapshot(data: &Value) -> Option<RepoSnapshot> {
    Some(RepoSnapshot {
        full_name: data.get("full_name").and_then(Value::as_str)?.to_string(),
        description: data.get("description").and_then(Value::as_str).map(String::from),
        stars: data.get("stargazers_count").and_then(Value::as_u64).unwrap_or(0),
        forks: data.get("forks_count").and_then(Value::as_u64).unwrap_or(0),
        open_issues: data.get("open_issues_count").and_then(Value::as_u64).unwrap_or(0),
        pushed_at: data
            .get("pushed_at")
            .and_then(Value::as_str)
            .and_then(|ts| DateTime::parse_from_rfc3339(ts).ok())
            .map(|dt| dt.format("%Y-%m-%d").to_string()),
    })
}

struct GithubWidget {
    snapshot: Option<RepoSnapshot>,
}

#[async_trait]
impl Widget for GithubWidget {
    fn render(&self, frame: &mut Frame<'_>, area: Rect, theme: &Theme) {
        let Some(snapshot) = &self.snapshot else {
            let waiting = Paragraph::new(Line::styled(
                "waiting for data…",
                Style::default().fg(theme.border),
            ));
            frame.render_widget(waiting, area);
            return;
        };

        let mut lines = vec![
            Line::styled(
                snapshot.full_name.clone(),
                Style::default().fg(theme.primary).add_modifier(Modifier::BOLD),
            ),
            Line::styled(
                format!(
                    "★ {}  ⑂ {}  ◉ {} issues",
                    snapshot.stars, snapshot.forks, snapshot.open_issues
                ),
                Style::default().fg(theme.secondary),
            ),
        ];
        if let Some(description) = &snapshot.description {
            lines.push(Line::styled(description.clone(), Style::default().fg(theme.fg)));
        }
        if let Some(pushed) = &snapshot.pushed_at {
            lines.push(Line::styled(
                format!("last push {pushed}"),
                Style::default().fg(theme.border),
            ));
        }

        frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }), area);
    }

    fn apply_data(&mut self, data: Value) {
        match parse_snapshot(&data) {
            Some(snapshot) => self.snapshot = Some(snapshot),
            None => debug!("github payload was missing full_name"),
        }
    }
}

/// Factory for the built-in GitHub repo plugin.
pub struct GithubFactory;

impl WidgetFactory for GithubFactory {
    fn manifest(&self) -> PluginManifest {
        PluginManifest {
            name: "github".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            description: Some("Stars, forks and issues for one repository".to_string()),
            author: None,
            license: None,
            category: Some("network".to_string()),
            options_schema: OptionsSchema::new()
                .property(
                    "repo",
                    PropertySchema::string()
                        .describe("repository as owner/name")
                        .pattern("^[^/]+/[^/]+$"),
                )
                .property(
                    "token",
                    PropertySchema::string().describe("API token for private repos and higher rate limits"),
                )
                .property(
                    "endpoint",
                    PropertySchema::string()
                        .describe("GitHub API base URL")
                        .default_value(json!(DEFAULT_ENDPOINT)),
                )
                .property(
                    "refresh_secs",
                    PropertySchema::integer()
                        .describe("seconds between refreshes")
                        .default_value(json!(DEFAULT_REFRESH_SECS))
                        .minimum(60.0)
                        .maximum(3600.0),
                )
                .require("repo"),
        }
    }

    fn build(&self, ctx: &WidgetContext) -> Result<BuiltWidget> {
        let repo = ctx
            .opt_str("repo")
            .ok_or_else(|| WidgetError::init("repo option is required"))?;
        let endpoint = ctx.opt_str("endpoint").unwrap_or(DEFAULT_ENDPOINT);
        let refresh = ctx.opt_u64("refresh_secs").unwrap_or(DEFAULT_REFRESH_SECS);

        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(|e| WidgetError::init(format!("failed to build HTTP client: {e}")))?;

        Ok(BuiltWidget::polled(
            Box::new(GithubWidget { snapshot: None }),
            Box::new(GithubSource {
                client,
                url: format!("{endpoint}/repos/{repo}"),
                token: ctx.opt_str("token").map(String::from),
            }),
            Duration::from_secs(refresh),
        ))
    }
}
