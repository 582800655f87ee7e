//! The widget capability contract.
//!
//! A widget is any value implementing [`Widget`]; there is no base-class
//! hierarchy. Data-driven widgets are built by composition: the factory pairs
//! a render-only widget with a [`DataSource`](crate::poll::DataSource) and
//! the host owns the polling driver that connects them.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use ratatui::layout::Rect;
use ratatui::Frame;
use serde_json::{Map, Value};

use crate::error::Result;
use crate::poll::DataSource;
use crate::theme::Theme;

/// Identifier of one widget instance, stable for the dashboard's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WidgetId(pub u64);

impl fmt::Display for WidgetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "widget-{}", self.0)
    }
}

/// Everything a widget needs from its host, injected at construction.
///
/// `options` are the validated effective options: schema defaults merged with
/// config-supplied values, config wins.
#[derive(Debug, Clone)]
pub struct WidgetContext {
    /// Instance identifier.
    pub id: WidgetId,
    /// Plugin name the instance was created from.
    pub name: String,
    /// Validated effective options.
    pub options: Map<String, Value>,
}

impl WidgetContext {
    /// Create a context.
    #[must_use]
    pub fn new(id: WidgetId, name: impl Into<String>, options: Map<String, Value>) -> Self {
        Self {
            id,
            name: name.into(),
            options,
        }
    }

    /// String option by name.
    #[must_use]
    pub fn opt_str(&self, key: &str) -> Option<&str> {
        self.options.get(key).and_then(Value::as_str)
    }

    /// Boolean option by name.
    #[must_use]
    pub fn opt_bool(&self, key: &str) -> Option<bool> {
        self.options.get(key).and_then(Value::as_bool)
    }

    /// Unsigned integer option by name.
    #[must_use]
    pub fn opt_u64(&self, key: &str) -> Option<u64> {
        self.options.get(key).and_then(Value::as_u64)
    }

    /// Float option by name.
    #[must_use]
    pub fn opt_f64(&self, key: &str) -> Option<f64> {
        self.options.get(key).and_then(Value::as_f64)
    }
}

/// Lifecycle phase of a widget instance.
///
/// Phases only advance forward, except the `Error` escape which is reachable
/// from any non-terminal phase; from `Error` only `Destroyed` is reachable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Constructed, not yet initialized.
    Created,
    /// `initialize` in progress.
    Initializing,
    /// Initialized and renderable.
    Ready,
    /// Currently inside the host's draw pass.
    Rendering,
    /// Failed; shows an error cell until destroyed.
    Error,
    /// Terminal. Resources released.
    Destroyed,
}

impl Phase {
    /// Whether moving from `self` to `to` is a legal transition.
    #[must_use]
    pub fn can_transition(self, to: Self) -> bool {
        match (self, to) {
            (Self::Destroyed, _) => false,
            (_, Self::Destroyed) => true,
            (Self::Error, _) => false,
            (_, Self::Error) => true,
            (Self::Created, Self::Initializing)
            | (Self::Initializing, Self::Ready)
            | (Self::Ready, Self::Rendering)
            | (Self::Rendering, Self::Ready) => true,
            _ => false,
        }
    }

    /// True for the terminal phase.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Destroyed)
    }

    /// True when the widget participates in the normal render pass.
    #[must_use]
    pub fn is_live(self) -> bool {
        matches!(self, Self::Ready | Self::Rendering)
    }
}

/// The widget lifecycle contract.
///
/// `render` is synchronous and must not block: a render either completes
/// fully against currently-available data or the host skips the slot.
#[async_trait]
pub trait Widget: Send {
    /// One-time setup. The host validates options before calling this.
    async fn initialize(&mut self, ctx: &WidgetContext) -> Result<()> {
        let _ = ctx;
        Ok(())
    }

    /// Draw the widget into `area`. Idempotent for unchanged state.
    fn render(&self, frame: &mut Frame<'_>, area: Rect, theme: &Theme);

    /// Host-tick hook for widgets that change without data fetches.
    fn update(&mut self) {}

    /// Accept a fetched data payload. No-op for non-data widgets.
    fn apply_data(&mut self, data: Value) {
        let _ = data;
    }

    /// Release owned resources. Idempotent; the host also guards re-entry.
    fn destroy(&mut self) {}
}

/// A constructed widget instance plus its optional polling capability.
pub struct BuiltWidget {
    /// The renderable instance.
    pub widget: Box<dyn Widget>,
    /// Data capability for polled widgets.
    pub source: Option<Box<dyn DataSource>>,
    /// Refresh interval for polled widgets.
    pub poll_interval: Option<Duration>,
}

impl BuiltWidget {
    /// A widget with no data capability.
    #[must_use]
    pub fn simple(widget: Box<dyn Widget>) -> Self {
        Self {
            widget,
            source: None,
            poll_interval: None,
        }
    }

    /// A widget paired with a polled data source.
    #[must_use]
    pub fn polled(widget: Box<dyn Widget>, source: Box<dyn DataSource>, interval: Duration) -> Self {
        Self {
            widget,
            source: Some(source),
            poll_interval: Some(interval),
        }
    }
}

/// Draw function for the simple, non-lifecycle plugin shape.
pub type DrawFn = fn(&WidgetContext, &mut Frame<'_>, Rect, &Theme);

/// Adapter giving a bare draw function the full widget contract.
pub struct StaticWidget {
    ctx: WidgetContext,
    draw: DrawFn,
}

impl StaticWidget {
    /// Wrap a draw function.
    #[must_use]
    pub fn new(ctx: WidgetContext, draw: DrawFn) -> Self {
        Self { ctx, draw }
    }
}

#[async_trait]
impl Widget for StaticWidget {
    fn render(&self, frame: &mut Frame<'_>, area: Rect, theme: &Theme) {
        (self.draw)(&self.ctx, frame, area, theme);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_transitions() {
        assert!(Phase::Created.can_transition(Phase::Initializing));
        assert!(Phase::Initializing.can_transition(Phase::Ready));
        assert!(Phase::Ready.can_transition(Phase::Rendering));
        assert!(Phase::Rendering.can_transition(Phase::Ready));
    }

    #[test]
    fn test_no_backward_transitions() {
        assert!(!Phase::Ready.can_transition(Phase::Created));
        assert!(!Phase::Ready.can_transition(Phase::Initializing));
        assert!(!Phase::Rendering.can_transition(Phase::Initializing));
    }

    #[test]
    fn test_error_reachable_from_non_terminal() {
        for phase in [Phase::Created, Phase::Initializing, Phase::Ready, Phase::Rendering] {
            assert!(phase.can_transition(Phase::Error), "{phase:?}");
        }
        assert!(!Phase::Destroyed.can_transition(Phase::Error));
    }

    #[test]
    fn test_error_only_exits_to_destroyed() {
        assert!(Phase::Error.can_transition(Phase::Destroyed));
        for phase in [Phase::Created, Phase::Initializing, Phase::Ready, Phase::Rendering] {
            assert!(!Phase::Error.can_transition(phase), "{phase:?}");
        }
    }

    #[test]
    fn test_destroyed_is_terminal() {
        assert!(Phase::Destroyed.is_terminal());
        for phase in [Phase::Created, Phase::Initializing, Phase::Ready, Phase::Rendering, Phase::Error] {
            assert!(!Phase::Destroyed.can_transition(phase), "{phase:?}");
            assert!(phase.can_transition(Phase::Destroyed), "{phase:?}");
        }
        assert!(!Phase::Destroyed.can_transition(Phase::Destroyed));
    }

    #[test]
    fn test_context_option_accessors() {
        let options = match serde_json::json!({
            "format": "%H:%M",
            "show_date": true,
            "limit": 10,
            "latitude": 52.5
        }) {
            Value::Object(map) => map,
            _ => unreachable!(),
        };
        let ctx = WidgetContext::new(WidgetId(0), "clock", options);
        assert_eq!(ctx.opt_str("format"), Some("%H:%M"));
        assert_eq!(ctx.opt_bool("show_date"), Some(true));
        assert_eq!(ctx.opt_u64("limit"), Some(10));
        assert_eq!(ctx.opt_f64("latitude"), Some(52.5));
        assert_eq!(ctx.opt_str("missing"), None);
    }
}
