//! Dashboard state and widget slot management.
//!
//! The `Dashboard` owns one `Slot` per configured plugin and drives the
//! lifecycle: resolve -> validate -> construct -> initialize -> render, with
//! polling for data widgets. Errors from a single widget are captured in its
//! slot; they never abort the process or affect other slots.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use lookout_core::error::WidgetError;
use lookout_core::options::validate;
use lookout_core::plugin::{PluginResolver, WidgetRegistry, PLUGIN_MANIFEST};
use lookout_core::poll::{DataSource, FetchOutcome, PollHandle, Poller};
use lookout_core::theme::{Theme, PRESETS};
use lookout_core::widget::{Phase, Widget, WidgetContext, WidgetId};

use crate::config::{DashboardConfig, Position};
use crate::error::HostError;

/// One grid cell: a plugin config united with its live runtime state.
pub struct Slot {
    /// Plugin name.
    pub name: String,
    /// Grid placement.
    pub position: Position,
    /// Lifecycle phase; advances forward only, `Error` escape aside.
    pub phase: Phase,
    /// Validated effective options and instance id.
    pub context: WidgetContext,
    /// The widget instance; `None` when construction itself failed.
    pub widget: Option<Box<dyn Widget>>,
    /// Refresh interval; `Some` marks a data widget.
    pub poll_interval: Option<Duration>,
    /// Last successfully fetched payload.
    pub data: Option<Value>,
    /// When the last successful fetch landed.
    pub last_fetch: Option<DateTime<Utc>>,
    /// A fetch or lifecycle error is pending display.
    pub has_error: bool,
    /// User-facing error text.
    pub error_message: Option<String>,
    /// Bumped on destroy so in-flight fetch results are discarded.
    pub generation: u64,
    pending_source: Option<Box<dyn DataSource>>,
    poll: Option<PollHandle>,
}

impl Slot {
    /// Whether this slot refreshes from a data source.
    #[must_use]
    pub fn is_data_widget(&self) -> bool {
        self.poll_interval.is_some()
    }

    /// Centralized failure capture: store the error, flag it, and let the
    /// next draw show the error cell instead of propagating upward.
    fn fail(&mut self, err: &WidgetError) {
        error!(widget = %self.name, error = %err, "widget error");
        self.has_error = true;
        self.error_message = Some(err.to_string());
        if self.phase.can_transition(Phase::Error) {
            self.phase = Phase::Error;
        }
    }

    fn spawn_poller(&mut self, tx: &mpsc::UnboundedSender<FetchOutcome>) {
        if let (Some(source), Some(interval)) = (self.pending_source.take(), self.poll_interval) {
            self.poll = Some(Poller::spawn(
                self.context.id,
                self.generation,
                source,
                interval,
                tx.clone(),
            ));
        }
    }
}

/// Identity of a data slot, handed to the demo data generator.
#[derive(Debug, Clone)]
pub struct DemoSlot {
    /// Instance id.
    pub id: WidgetId,
    /// Current slot generation.
    pub generation: u64,
    /// Plugin name, selects the synthetic payload shape.
    pub plugin: String,
}

/// The dashboard host.
pub struct Dashboard {
    /// Main loop keeps going while true.
    pub running: bool,
    /// Polling is suspended dashboard-wide.
    pub paused: bool,
    /// Index of the focused slot.
    pub focused: usize,
    /// Grid rows.
    pub rows: u16,
    /// Grid columns.
    pub cols: u16,
    /// Active theme, swapped as a whole on theme switch.
    pub theme: Theme,
    /// All widget slots, in config order.
    pub slots: Vec<Slot>,
    outcome_tx: mpsc::UnboundedSender<FetchOutcome>,
}

impl std::fmt::Debug for Dashboard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dashboard")
            .field("running", &self.running)
            .field("paused", &self.paused)
            .field("focused", &self.focused)
            .field("rows", &self.rows)
            .field("cols", &self.cols)
            .field("theme", &self.theme)
            .field("slots", &self.slots.len())
            .finish_non_exhaustive()
    }
}

impl Dashboard {
    /// Resolve, validate and construct every configured plugin.
    ///
    /// A plugin that cannot be resolved at all is fatal: the dashboard
    /// cannot show a slot with nothing to render. Validation and
    /// construction failures are not; those slots start in the error phase
    /// and the rest of the dashboard is unaffected.
    ///
    /// # Errors
    ///
    /// [`HostError`] for unresolvable plugins, unreadable manifests and
    /// out-of-bounds positions.
    pub fn build(
        config: &DashboardConfig,
        registry: &WidgetRegistry,
        resolver: &PluginResolver,
        theme: Theme,
        outcome_tx: mpsc::UnboundedSender<FetchOutcome>,
        poll_override: Option<Duration>,
    ) -> Result<Self, HostError> {
        let (rows, cols) = config.layout.dimensions();
        let mut slots = Vec::with_capacity(config.plugins.len());

        for (index, plugin) in config.plugins.iter().enumerate() {
            // An on-disk manifest overrides the embedded one; built-ins work
            // with no plugins directory at all.
            let manifest = match resolver.load_manifest(&plugin.name) {
                Ok(manifest) => manifest,
                Err(err @ WidgetError::PluginNotFound { .. }) => match registry.manifest(&plugin.name) {
                    Some(manifest) => manifest,
                    None => return Err(err.into()),
                },
                Err(err) => return Err(err.into()),
            };

            check_position(&plugin.name, plugin.position, rows, cols)?;

            let report = validate(&plugin.options, &manifest.options_schema);
            let context =
                WidgetContext::new(WidgetId(index as u64), &plugin.name, report.normalized.clone());
            let mut slot = Slot {
                name: plugin.name.clone(),
                position: plugin.position,
                phase: Phase::Created,
                context,
                widget: None,
                poll_interval: None,
                data: None,
                last_fetch: None,
                has_error: false,
                error_message: None,
                generation: 0,
                pending_source: None,
                poll: None,
            };

            if report.valid {
                match registry.build(&plugin.name, &slot.context) {
                    Some(Ok(built)) => {
                        slot.widget = Some(built.widget);
                        slot.pending_source = built.source;
                        slot.poll_interval = built.poll_interval.map(|d| poll_override.unwrap_or(d));
                    }
                    Some(Err(err)) => slot.fail(&err),
                    // Manifest exists on disk but nothing implements it.
                    None => {
                        return Err(WidgetError::not_found(
                            &plugin.name,
                            resolver.root().join(&plugin.name).join(PLUGIN_MANIFEST),
                        )
                        .into());
                    }
                }
            } else {
                slot.fail(&WidgetError::validation(report.errors));
            }

            slots.push(slot);
        }

        info!(widgets = slots.len(), rows, cols, "dashboard built");
        Ok(Self {
            running: true,
            paused: false,
            focused: 0,
            rows,
            cols,
            theme,
            slots,
            outcome_tx,
        })
    }

    /// Drive every constructed widget through `initialize` and start its
    /// poller. Initialization failures park the slot in the error phase.
    pub async fn initialize_all(&mut self, spawn_pollers: bool) {
        let tx = self.outcome_tx.clone();
        for slot in &mut self.slots {
            if slot.phase != Phase::Created {
                continue;
            }
            slot.phase = Phase::Initializing;
            let result = match slot.widget.as_mut() {
                Some(widget) => widget.initialize(&slot.context).await,
                None => Err(WidgetError::init("widget was never constructed")),
            };
            match result {
                Ok(()) => {
                    slot.phase = Phase::Ready;
                    debug!(widget = %slot.name, "widget ready");
                    if spawn_pollers {
                        slot.spawn_poller(&tx);
                    }
                }
                Err(err) => slot.fail(&err),
            }
        }
    }

    /// Apply a fetch result to its slot, unless the slot died meanwhile.
    ///
    /// On success the payload is stored and the error state cleared. On
    /// failure the previous data is kept, the error is flagged for display,
    /// and the poller retries on its next scheduled tick.
    pub fn apply_fetch(&mut self, outcome: FetchOutcome) {
        let Some(slot) = self.slots.get_mut(outcome.id.0 as usize) else {
            return;
        };
        if outcome.generation != slot.generation || slot.phase == Phase::Destroyed {
            debug!(widget = %slot.name, "discarding fetch result for destroyed widget");
            return;
        }
        match outcome.result {
            Ok(data) => {
                if let Some(widget) = slot.widget.as_mut() {
                    widget.apply_data(data.clone());
                }
                slot.data = Some(data);
                slot.last_fetch = Some(Utc::now());
                slot.has_error = false;
                slot.error_message = None;
            }
            Err(err) => {
                warn!(widget = %slot.name, error = %err, "fetch failed, retrying on next tick");
                slot.has_error = true;
                slot.error_message = Some(err.to_string());
            }
        }
    }

    /// Host tick: lets non-data widgets (clock) refresh their state.
    pub fn tick(&mut self) {
        for slot in &mut self.slots {
            if slot.phase.is_live() {
                if let Some(widget) = slot.widget.as_mut() {
                    widget.update();
                }
            }
        }
    }

    /// Suspend or resume polling for every data widget. Last data is kept.
    pub fn toggle_paused(&mut self) {
        self.paused = !self.paused;
        for slot in &self.slots {
            if let Some(poll) = &slot.poll {
                if self.paused {
                    poll.pause();
                } else {
                    poll.resume();
                }
            }
        }
        info!(paused = self.paused, "polling toggled");
    }

    /// Force an immediate out-of-schedule refresh of every data widget.
    pub fn refresh_all(&self) {
        for slot in &self.slots {
            if let Some(poll) = &slot.poll {
                poll.refresh();
            }
        }
    }

    /// Swap the theme; the next draw re-renders every widget with it.
    pub fn set_theme(&mut self, theme: Theme) {
        info!(theme = %theme.name, "theme switched");
        self.theme = theme;
    }

    /// Rotate through the built-in theme presets.
    pub fn cycle_theme(&mut self) {
        let current = PRESETS.iter().position(|p| *p == self.theme.name).unwrap_or(0);
        let next = PRESETS[(current + 1) % PRESETS.len()];
        self.set_theme(Theme::preset_or_default(next));
    }

    /// Move focus to the next slot.
    pub fn focus_next(&mut self) {
        if !self.slots.is_empty() {
            self.focused = (self.focused + 1) % self.slots.len();
        }
    }

    /// Move focus to the previous slot.
    pub fn focus_prev(&mut self) {
        if !self.slots.is_empty() {
            self.focused = (self.focused + self.slots.len() - 1) % self.slots.len();
        }
    }

    /// Mark ready slots as rendering for the duration of a draw pass.
    pub fn begin_render_pass(&mut self) {
        for slot in &mut self.slots {
            if slot.phase == Phase::Ready {
                slot.phase = Phase::Rendering;
            }
        }
    }

    /// Return rendering slots to ready after the draw pass.
    pub fn end_render_pass(&mut self) {
        for slot in &mut self.slots {
            if slot.phase == Phase::Rendering {
                slot.phase = Phase::Ready;
            }
        }
    }

    /// Destroy one slot: cancel its poller, release the widget, bump the
    /// generation so in-flight results are discarded. Idempotent.
    pub fn destroy_slot(&mut self, index: usize) {
        let Some(slot) = self.slots.get_mut(index) else {
            return;
        };
        if slot.phase == Phase::Destroyed {
            return;
        }
        if let Some(poll) = slot.poll.take() {
            poll.stop();
        }
        slot.pending_source = None;
        if let Some(widget) = slot.widget.as_mut() {
            widget.destroy();
        }
        slot.generation = slot.generation.wrapping_add(1);
        slot.phase = Phase::Destroyed;
        debug!(widget = %slot.name, "widget destroyed");
    }

    /// Destroy every live widget. Order is irrelevant; each destroy is
    /// independent and idempotent.
    pub fn shutdown(&mut self) {
        for index in 0..self.slots.len() {
            self.destroy_slot(index);
        }
        self.running = false;
    }

    /// Slots currently showing an error.
    #[must_use]
    pub fn error_count(&self) -> usize {
        self.slots
            .iter()
            .filter(|slot| slot.has_error || slot.phase == Phase::Error)
            .count()
    }

    /// Timestamp of the most recent successful fetch across all slots.
    #[must_use]
    pub fn last_update(&self) -> Option<DateTime<Utc>> {
        self.slots.iter().filter_map(|slot| slot.last_fetch).max()
    }

    /// Identities of all data slots, for the demo data generator.
    #[must_use]
    pub fn demo_slots(&self) -> Vec<DemoSlot> {
        self.slots
            .iter()
            .filter(|slot| slot.is_data_widget())
            .map(|slot| DemoSlot {
                id: slot.context.id,
                generation: slot.generation,
                plugin: slot.name.clone(),
            })
            .collect()
    }
}

fn check_position(name: &str, position: Position, rows: u16, cols: u16) -> Result<(), HostError> {
    let detail = if position.row_span == 0 || position.col_span == 0 {
        Some("span must be at least 1".to_string())
    } else if position.row + position.row_span > rows {
        Some(format!(
            "rows {}..{} exceed grid height {rows}",
            position.row,
            position.row + position.row_span,
        ))
    } else if position.col + position.col_span > cols {
        Some(format!(
            "columns {}..{} exceed grid width {cols}",
            position.col,
            position.col + position.col_span,
        ))
    } else {
        None
    };
    match detail {
        Some(detail) => Err(HostError::InvalidPosition {
            plugin: name.to_string(),
            detail,
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_position_bounds() {
        assert!(check_position("x", Position::from([0, 0, 2, 2]), 2, 2).is_ok());
        assert!(check_position("x", Position::from([1, 1, 2, 1]), 2, 2).is_err());
        assert!(check_position("x", Position::from([0, 2, 1, 1]), 2, 2).is_err());
        assert!(check_position("x", Position::from([0, 0, 0, 1]), 2, 2).is_err());
    }
}
