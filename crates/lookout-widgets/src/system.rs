//! System info widget: CPU, memory, uptime, load average.
//!
//! CPU usage is computed from two-sample idle/total tick deltas averaged
//! across cores (read from `/proc/stat`); on platforms without it the
//! sysinfo-reported usage is used instead.

use async_trait::async_trait;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;
use serde_json::{json, Value};
use sysinfo::System;
use tracing::warn;

use lookout_core::error::Result;
use lookout_core::format::{
    cpu_usage_percent, format_bytes, format_uptime, memory_usage_percent, progress_bar, History,
};
use lookout_core::options::{OptionsSchema, PropertySchema};
use lookout_core::plugin::{PluginManifest, WidgetFactory};
use lookout_core::poll::DataSource;
use lookout_core::theme::Theme;
use lookout_core::widget::{BuiltWidget, Widget, WidgetContext};

const DEFAULT_REFRESH_SECS: u64 = 5;
const DEFAULT_HISTORY: u64 = 60;
const BAR_WIDTH: usize = 14;

/// Idle/total tick counters for one core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct CpuTicks {
    pub(crate) idle: u64,
    pub(crate) total: u64,
}

/// Parse per-core tick counters out of `/proc/stat` content.
pub(crate) fn parse_proc_stat(content: &str) -> Vec<CpuTicks> {
    content
        .lines()
        .filter_map(|line| {
            let mut fields = line.split_whitespace();
            let label = fields.next()?;
            // Per-core lines only: "cpu0", "cpu1", ... The aggregate "cpu"
            // line is skipped so deltas can be averaged across cores.
            if !label.starts_with("cpu") || label == "cpu" {
                return None;
            }
            let ticks: Vec<u64> = fields.filter_map(|f| f.parse().ok()).collect();
            if ticks.len() < 5 {
                return None;
            }
            // user nice system idle iowait [irq softirq steal ...]
            Some(CpuTicks {
                idle: ticks[3] + ticks[4],
                total: ticks.iter().sum(),
            })
        })
        .collect()
}

fn read_proc_stat() -> std::io::Result<Vec<CpuTicks>> {
    Ok(parse_proc_stat(&std::fs::read_to_string("/proc/stat")?))
}

/// Usage percentage from two tick samples, averaged across cores.
pub(crate) fn average_usage(prev: &[CpuTicks], cur: &[CpuTicks]) -> f64 {
    let cores = prev.len().min(cur.len());
    if cores == 0 {
        return 0.0;
    }
    let mut idle_sum = 0.0;
    let mut total_sum = 0.0;
    for i in 0..cores {
        idle_sum += cur[i].idle.saturating_sub(prev[i].idle) as f64;
        total_sum += cur[i].total.saturating_sub(prev[i].total) as f64;
    }
    cpu_usage_percent(idle_sum / cores as f64, total_sum / cores as f64)
}

struct SystemSource {
    sys: System,
    prev_ticks: Option<Vec<CpuTicks>>,
}

impl SystemSource {
    fn new() -> Self {
        Self {
            sys: System::new(),
            prev_ticks: None,
        }
    }

    fn sample_cpu(&mut self) -> f64 {
        match read_proc_stat() {
            Ok(current) => {
                let usage = match self.prev_ticks.as_deref() {
                    Some(previous) => average_usage(previous, &current),
                    None => 0.0,
                };
                self.prev_ticks = Some(current);
                usage
            }
            Err(_) => {
                self.sys.refresh_cpu_usage();
                f64::from(self.sys.global_cpu_usage())
            }
        }
    }
}

#[async_trait]
impl DataSource for SystemSource {
    async fn fetch(&mut self) -> Result<Value> {
        self.sys.refresh_memory();
        let cpu_percent = self.sample_cpu();
        let load = System::load_average();
        Ok(json!({
            "cpu_percent": cpu_percent,
            "memory_total": self.sys.total_memory(),
            "memory_free": self.sys.free_memory(),
            "uptime_secs": System::uptime(),
            "load_one": load.one,
            "load_five": load.five,
            "load_fifteen": load.fifteen,
            "hostname": System::host_name(),
        }))
    }
}

#[derive(Debug, Clone, PartialEq)]
struct SystemSnapshot {
    cpu_percent: f64,
    memory_total: u64,
    memory_free: u64,
    uptime_secs: u64,
    load: (f64, f64, f64),
    hostname: Option<String>,
}

fn parse_snapshot(data: &Value) -> Option<SystemSnapshot> {
    Some(SystemSnapshot {
        cpu_percent: data.get("cpu_percent").and_then(Value::as_f64)?,
        memory_total: data.get("memory_total").and_then(Value::as_u64).unwrap_or(0),
        memory_free: data.get("memory_free").and_then(Value::as_u64).unwrap_or(0),
        uptime_secs: data.get("uptime_secs").and_then(Value::as_u64).unwrap_or(0),
        load: (
            data.get("load_one").and_then(Value::as_f64).unwrap_or(0.0),
            data.get("load_five").and_then(Value::as_f64).unwrap_or(0.0),
            data.get("load_fifteen").and_then(Value::as_f64).unwrap_or(0.0),
        ),
        hostname: data.get("hostname").and_then(Value::as_str).map(String::from),
    })
}

struct SystemWidget {
    snapshot: Option<SystemSnapshot>,
    cpu_history: History,
    show_load: bool,
}

#[async_trait]
impl Widget for SystemWidget {
    fn render(&self, frame: &mut Frame<'_>, area: Rect, theme: &Theme) {
        let Some(snapshot) = &self.snapshot else {
            let waiting = Paragraph::new(Line::styled(
                "waiting for data…",
                Style::default().fg(theme.border),
            ));
            frame.render_widget(waiting, area);
            return;
        };

        let label = Style::default().fg(theme.primary).add_modifier(Modifier::BOLD);
        let value = Style::default().fg(theme.fg);
        let mem_percent = memory_usage_percent(snapshot.memory_total, snapshot.memory_free);
        let mem_used = snapshot.memory_total.saturating_sub(snapshot.memory_free);

        let mut lines = Vec::with_capacity(5);
        if let Some(host) = &snapshot.hostname {
            lines.push(Line::styled(host.clone(), Style::default().fg(theme.secondary)));
        }
        lines.push(Line::from(vec![
            Span::styled("CPU  ", label),
            Span::styled(progress_bar(snapshot.cpu_percent, BAR_WIDTH), value),
            Span::styled(
                format!(" {:5.1}% {}", snapshot.cpu_percent, self.cpu_history.trend().arrow()),
                value,
            ),
        ]));
        lines.push(Line::from(vec![
            Span::styled("MEM  ", label),
            Span::styled(progress_bar(mem_percent, BAR_WIDTH), value),
            Span::styled(
                format!(" {:5.1}%  {}/{}", mem_percent, format_bytes(mem_used), format_bytes(snapshot.memory_total)),
                value,
            ),
        ]));
        lines.push(Line::from(vec![
            Span::styled("Up   ", label),
            Span::styled(format_uptime(snapshot.uptime_secs), value),
        ]));
        if self.show_load {
            lines.push(Line::from(vec![
                Span::styled("Load ", label),
                Span::styled(
                    format!("{:.2} {:.2} {:.2}", snapshot.load.0, snapshot.load.1, snapshot.load.2),
                    value,
                ),
            ]));
        }

        frame.render_widget(Paragraph::new(lines), area);
    }

    fn apply_data(&mut self, data: Value) {
        match parse_snapshot(&data) {
            Some(snapshot) => {
                self.cpu_history.push(snapshot.cpu_percent);
                self.snapshot = Some(snapshot);
            }
            None => warn!("system widget received an unparseable payload"),
        }
    }
}

/// Factory for the built-in system info plugin.
pub struct SystemFactory;

impl WidgetFactory for SystemFactory {
    fn manifest(&self) -> PluginManifest {
        PluginManifest {
            name: "system".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            description: Some("CPU, memory, uptime and load for this host".to_string()),
            author: None,
            license: None,
            category: Some("system".to_string()),
            options_schema: OptionsSchema::new()
                .property(
                    "show_load",
                    PropertySchema::boolean()
                        .describe("show the load average line")
                        .default_value(json!(true)),
                )
                .property(
                    "history",
                    PropertySchema::integer()
                        .describe("CPU samples kept for the trend arrow")
                        .default_value(json!(DEFAULT_HISTORY))
                        .minimum(1.0)
                        .maximum(120.0),
                )
                .property(
                    "refresh_secs",
                    PropertySchema::integer()
                        .describe("seconds between samples")
                        .default_value(json!(DEFAULT_REFRESH_SECS))
                        .minimum(1.0)
                        .maximum(300.0),
                ),
        }
    }

    fn build(&self, ctx: &WidgetContext) -> Result<BuiltWidget> {
        let history = ctx.opt_u64("history").unwrap_or(DEFAULT_HISTORY) as usize;
        let refresh = ctx.opt_u64("refresh_secs").unwrap_or(DEFAULT_REFRESH_SECS);
        Ok(BuiltWidget::polled(
            Box::new(SystemWidget {
                snapshot: None,
                cpu_history: History::new(history),
                show_load: ctx.opt_bool("show_load").unwrap_or(true),
            }),
            Box::new(SystemSource::new()),
            std::time::Duration::from_secs(refresh),
        ))
    }
}
