//! Host lifecycle tests, driven without a terminal: build the dashboard,
//! initialize widgets, feed fetch outcomes, destroy.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use ratatui::layout::Rect;
use ratatui::Frame;
use serde_json::{json, Map, Value};
use tokio::sync::mpsc;

use lookout_core::error::{Result as WidgetResult, WidgetError};
use lookout_core::options::OptionsSchema;
use lookout_core::plugin::{PluginManifest, PluginResolver, WidgetFactory, WidgetRegistry};
use lookout_core::poll::{DataSource, FetchOutcome};
use lookout_core::theme::Theme;
use lookout_core::widget::{BuiltWidget, Phase, Widget, WidgetContext, WidgetId};
use lookout_tui::app::Dashboard;
use lookout_tui::config::{DashboardConfig, PluginConfig, Position};

struct ProbeWidget {
    destroys: Arc<AtomicUsize>,
    applied: Arc<AtomicUsize>,
}

#[async_trait]
impl Widget for ProbeWidget {
    fn render(&self, _frame: &mut Frame<'_>, _area: Rect, _theme: &Theme) {}

    fn apply_data(&mut self, _data: Value) {
        self.applied.fetch_add(1, Ordering::SeqCst);
    }

    fn destroy(&mut self) {
        self.destroys.fetch_add(1, Ordering::SeqCst);
    }
}

struct CountingSource {
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl DataSource for CountingSource {
    async fn fetch(&mut self) -> WidgetResult<Value> {
        let seq = self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(json!({ "seq": seq }))
    }
}

#[derive(Default)]
struct Probes {
    destroys: Arc<AtomicUsize>,
    applied: Arc<AtomicUsize>,
    calls: Arc<AtomicUsize>,
}

struct ProbeFactory {
    probes: Probes,
}

impl ProbeFactory {
    fn new() -> (Self, Probes) {
        let probes = Probes::default();
        let shared = Probes {
            destroys: Arc::clone(&probes.destroys),
            applied: Arc::clone(&probes.applied),
            calls: Arc::clone(&probes.calls),
        };
        (Self { probes }, shared)
    }
}

impl WidgetFactory for ProbeFactory {
    fn manifest(&self) -> PluginManifest {
        PluginManifest {
            name: "probe".to_string(),
            version: "0.0.1".to_string(),
            description: None,
            author: None,
            license: None,
            category: None,
            options_schema: OptionsSchema::new(),
        }
    }

    fn build(&self, _ctx: &WidgetContext) -> WidgetResult<BuiltWidget> {
        Ok(BuiltWidget::polled(
            Box::new(ProbeWidget {
                destroys: Arc::clone(&self.probes.destroys),
                applied: Arc::clone(&self.probes.applied),
            }),
            Box::new(CountingSource {
                calls: Arc::clone(&self.probes.calls),
            }),
            Duration::from_millis(10),
        ))
    }
}

fn plugin(name: &str, position: [u16; 4]) -> PluginConfig {
    PluginConfig {
        name: name.to_string(),
        position: Position::from(position),
        options: Map::new(),
    }
}

fn config_with(plugins: Vec<PluginConfig>) -> DashboardConfig {
    DashboardConfig {
        auto_detect: false,
        plugins,
        ..DashboardConfig::default()
    }
}

fn builtin_registry() -> WidgetRegistry {
    let mut registry = WidgetRegistry::new();
    lookout_widgets::register_builtins(&mut registry);
    registry
}

fn probe_registry() -> (WidgetRegistry, Probes) {
    let (factory, probes) = ProbeFactory::new();
    let mut registry = WidgetRegistry::new();
    registry.register(Box::new(factory));
    (registry, probes)
}

#[test]
fn unknown_plugin_is_fatal_with_name_and_path() {
    let dir = tempfile::tempdir().expect("tempdir");
    let resolver = PluginResolver::new(dir.path());
    let registry = builtin_registry();
    let (tx, _rx) = mpsc::unbounded_channel();

    let err = Dashboard::build(
        &config_with(vec![plugin("ghost", [0, 0, 1, 1])]),
        &registry,
        &resolver,
        Theme::default(),
        tx,
        None,
    )
    .expect_err("unknown plugin must abort startup");

    let text = err.to_string();
    assert!(text.contains("ghost"));
    let expected = dir.path().join("ghost").join("plugin.json");
    assert!(text.contains(&expected.display().to_string()));
}

#[test]
fn out_of_bounds_position_is_fatal() {
    let dir = tempfile::tempdir().expect("tempdir");
    let resolver = PluginResolver::new(dir.path());
    let registry = builtin_registry();
    let (tx, _rx) = mpsc::unbounded_channel();

    // Default layout is 2x2; column 2 does not exist.
    let err = Dashboard::build(
        &config_with(vec![plugin("clock", [0, 2, 1, 1])]),
        &registry,
        &resolver,
        Theme::default(),
        tx,
        None,
    )
    .expect_err("bad position must abort startup");
    assert!(err.to_string().contains("clock"));
}

#[tokio::test]
async fn validation_failure_parks_slot_without_killing_others() {
    let dir = tempfile::tempdir().expect("tempdir");
    let resolver = PluginResolver::new(dir.path());
    let registry = builtin_registry();
    let (tx, _rx) = mpsc::unbounded_channel();

    // weather requires latitude/longitude; this config omits both.
    let mut dashboard = Dashboard::build(
        &config_with(vec![plugin("weather", [0, 0, 1, 1]), plugin("clock", [0, 1, 1, 1])]),
        &registry,
        &resolver,
        Theme::default(),
        tx,
        None,
    )
    .expect("dashboard still builds");

    assert_eq!(dashboard.slots[0].phase, Phase::Error);
    assert!(dashboard.slots[0].has_error);
    assert!(dashboard.slots[0]
        .error_message
        .as_deref()
        .is_some_and(|m| m.contains("latitude")));
    assert_eq!(dashboard.slots[1].phase, Phase::Created);

    dashboard.initialize_all(false).await;
    assert_eq!(dashboard.slots[0].phase, Phase::Error, "error slot must not recover");
    assert_eq!(dashboard.slots[1].phase, Phase::Ready);
}

#[tokio::test]
async fn fetch_error_retains_previous_data() {
    let dir = tempfile::tempdir().expect("tempdir");
    let resolver = PluginResolver::new(dir.path());
    let (registry, _probes) = probe_registry();
    let (tx, _rx) = mpsc::unbounded_channel();

    let mut dashboard = Dashboard::build(
        &config_with(vec![plugin("probe", [0, 0, 1, 1])]),
        &registry,
        &resolver,
        Theme::default(),
        tx,
        None,
    )
    .expect("build");
    dashboard.initialize_all(false).await;

    dashboard.apply_fetch(FetchOutcome {
        id: WidgetId(0),
        generation: 0,
        result: Ok(json!({ "seq": 1 })),
    });
    assert_eq!(dashboard.slots[0].data, Some(json!({ "seq": 1 })));
    assert!(!dashboard.slots[0].has_error);

    dashboard.apply_fetch(FetchOutcome {
        id: WidgetId(0),
        generation: 0,
        result: Err(WidgetError::fetch("upstream went away")),
    });

    // Previous data untouched, error flagged, slot still live for retries.
    assert_eq!(dashboard.slots[0].data, Some(json!({ "seq": 1 })));
    assert!(dashboard.slots[0].has_error);
    assert!(dashboard.slots[0]
        .error_message
        .as_deref()
        .is_some_and(|m| m.contains("upstream went away")));
    assert_eq!(dashboard.slots[0].phase, Phase::Ready);
    assert_eq!(dashboard.error_count(), 1);

    // A later success clears the error state.
    dashboard.apply_fetch(FetchOutcome {
        id: WidgetId(0),
        generation: 0,
        result: Ok(json!({ "seq": 2 })),
    });
    assert!(!dashboard.slots[0].has_error);
    assert_eq!(dashboard.error_count(), 0);
}

#[tokio::test]
async fn stale_result_is_discarded_after_destroy() {
    let dir = tempfile::tempdir().expect("tempdir");
    let resolver = PluginResolver::new(dir.path());
    let (registry, probes) = probe_registry();
    let (tx, _rx) = mpsc::unbounded_channel();

    let mut dashboard = Dashboard::build(
        &config_with(vec![plugin("probe", [0, 0, 1, 1])]),
        &registry,
        &resolver,
        Theme::default(),
        tx,
        None,
    )
    .expect("build");
    dashboard.initialize_all(false).await;
    dashboard.destroy_slot(0);

    // An in-flight fetch from before the destroy resolves now.
    dashboard.apply_fetch(FetchOutcome {
        id: WidgetId(0),
        generation: 0,
        result: Ok(json!({ "seq": 99 })),
    });

    assert_eq!(dashboard.slots[0].data, None);
    assert_eq!(probes.applied.load(Ordering::SeqCst), 0);
    assert_eq!(dashboard.slots[0].phase, Phase::Destroyed);
}

#[tokio::test]
async fn destroy_twice_releases_once() {
    let dir = tempfile::tempdir().expect("tempdir");
    let resolver = PluginResolver::new(dir.path());
    let (registry, probes) = probe_registry();
    let (tx, _rx) = mpsc::unbounded_channel();

    let mut dashboard = Dashboard::build(
        &config_with(vec![plugin("probe", [0, 0, 1, 1])]),
        &registry,
        &resolver,
        Theme::default(),
        tx,
        None,
    )
    .expect("build");
    dashboard.initialize_all(true).await;

    dashboard.destroy_slot(0);
    dashboard.destroy_slot(0);
    assert_eq!(probes.destroys.load(Ordering::SeqCst), 1);
    assert_eq!(dashboard.slots[0].phase, Phase::Destroyed);

    // Shutdown after manual destroy is also a no-op for this slot.
    dashboard.shutdown();
    assert_eq!(probes.destroys.load(Ordering::SeqCst), 1);
    assert!(!dashboard.running);
}

#[tokio::test]
async fn polling_end_to_end() {
    let dir = tempfile::tempdir().expect("tempdir");
    let resolver = PluginResolver::new(dir.path());
    let (registry, probes) = probe_registry();
    let (tx, mut rx) = mpsc::unbounded_channel();

    let mut dashboard = Dashboard::build(
        &config_with(vec![plugin("probe", [0, 0, 1, 1])]),
        &registry,
        &resolver,
        Theme::default(),
        tx,
        None,
    )
    .expect("build");
    dashboard.initialize_all(true).await;
    assert!(dashboard.slots[0].is_data_widget());

    let outcome = rx.recv().await.expect("first scheduled fetch");
    dashboard.apply_fetch(outcome);
    assert_eq!(dashboard.slots[0].data, Some(json!({ "seq": 0 })));
    assert!(dashboard.slots[0].last_fetch.is_some());
    assert_eq!(probes.applied.load(Ordering::SeqCst), 1);

    dashboard.shutdown();
}

#[tokio::test]
async fn render_pass_flips_ready_slots() {
    let dir = tempfile::tempdir().expect("tempdir");
    let resolver = PluginResolver::new(dir.path());
    let registry = builtin_registry();
    let (tx, _rx) = mpsc::unbounded_channel();

    let mut dashboard = Dashboard::build(
        &config_with(vec![plugin("clock", [0, 0, 1, 1])]),
        &registry,
        &resolver,
        Theme::default(),
        tx,
        None,
    )
    .expect("build");
    dashboard.initialize_all(false).await;

    dashboard.begin_render_pass();
    assert_eq!(dashboard.slots[0].phase, Phase::Rendering);
    dashboard.end_render_pass();
    assert_eq!(dashboard.slots[0].phase, Phase::Ready);
}

#[tokio::test]
async fn theme_cycle_round_trips() {
    let dir = tempfile::tempdir().expect("tempdir");
    let resolver = PluginResolver::new(dir.path());
    let registry = builtin_registry();
    let (tx, _rx) = mpsc::unbounded_channel();

    let mut dashboard = Dashboard::build(
        &config_with(vec![plugin("clock", [0, 0, 1, 1])]),
        &registry,
        &resolver,
        Theme::default(),
        tx,
        None,
    )
    .expect("build");

    let start = dashboard.theme.name.clone();
    let mut seen = vec![start.clone()];
    for _ in 0..3 {
        dashboard.cycle_theme();
        seen.push(dashboard.theme.name.clone());
    }
    dashboard.cycle_theme();
    assert_eq!(dashboard.theme.name, start);
    seen.dedup();
    assert_eq!(seen.len(), 4, "cycle must visit every preset: {seen:?}");
}

#[tokio::test]
async fn pause_toggle_keeps_last_data() {
    let dir = tempfile::tempdir().expect("tempdir");
    let resolver = PluginResolver::new(dir.path());
    let (registry, _probes) = probe_registry();
    let (tx, mut rx) = mpsc::unbounded_channel();

    let mut dashboard = Dashboard::build(
        &config_with(vec![plugin("probe", [0, 0, 1, 1])]),
        &registry,
        &resolver,
        Theme::default(),
        tx,
        None,
    )
    .expect("build");
    dashboard.initialize_all(true).await;

    let outcome = rx.recv().await.expect("first fetch");
    dashboard.apply_fetch(outcome);
    let data = dashboard.slots[0].data.clone();
    assert!(data.is_some());

    dashboard.toggle_paused();
    assert!(dashboard.paused);
    assert_eq!(dashboard.slots[0].data, data, "pause must not drop data");

    dashboard.toggle_paused();
    assert!(!dashboard.paused);
    dashboard.shutdown();
}
