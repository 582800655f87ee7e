//! Polling driver for data widgets.
//!
//! A [`Poller`] owns the recurring timer for one widget instance and
//! delegates the actual work to an injected [`DataSource`]. Fetch results are
//! reported to the host over a channel; the host applies them to the widget
//! after a liveness check, so results arriving for a destroyed instance are
//! discarded.
//!
//! Backpressure: a tick that elapses while a previous fetch is still pending
//! is skipped, never queued. At most one fetch per instance is in flight at
//! any time.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::debug;

use crate::error::Result;
use crate::widget::WidgetId;

/// The data capability of a polled widget.
///
/// `fetch` is the only externally-facing network/OS boundary in the
/// framework. The driver imposes no timeout of its own; sources inherit
/// whatever their underlying client provides.
#[async_trait]
pub trait DataSource: Send {
    /// Fetch one data payload.
    async fn fetch(&mut self) -> Result<Value>;
}

/// Commands accepted by a running poller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollCommand {
    /// Stop ticking; keeps the task alive.
    Pause,
    /// Resume ticking after a pause.
    Resume,
    /// Fetch immediately, outside the schedule.
    Refresh,
    /// Terminate the task. Permanent.
    Stop,
}

/// One fetch result, tagged for the host's liveness check.
#[derive(Debug)]
pub struct FetchOutcome {
    /// Instance the fetch belongs to.
    pub id: WidgetId,
    /// Slot generation at spawn time; stale generations are discarded.
    pub generation: u64,
    /// The payload or the fetch error.
    pub result: Result<Value>,
}

/// Handle to a spawned poller.
pub struct PollHandle {
    cmd_tx: mpsc::UnboundedSender<PollCommand>,
    task: JoinHandle<()>,
}

impl PollHandle {
    /// Stop ticking without losing the widget's last data.
    pub fn pause(&self) {
        let _ = self.cmd_tx.send(PollCommand::Pause);
    }

    /// Restart ticking after [`PollHandle::pause`].
    pub fn resume(&self) {
        let _ = self.cmd_tx.send(PollCommand::Resume);
    }

    /// Trigger an immediate out-of-schedule fetch.
    pub fn refresh(&self) {
        let _ = self.cmd_tx.send(PollCommand::Refresh);
    }

    /// Cancel the timer permanently. Called by destroy.
    ///
    /// Aborts the task, so a pending tick dies immediately; a result already
    /// queued on the outcome channel is dropped by the host's liveness check.
    pub fn stop(&self) {
        let _ = self.cmd_tx.send(PollCommand::Stop);
        self.task.abort();
    }
}

/// Spawns polling tasks.
pub struct Poller;

impl Poller {
    /// Start polling `source` every `period`, reporting to `outcomes`.
    ///
    /// The first fetch happens immediately. The returned handle must be
    /// stopped when the owning widget is destroyed.
    #[must_use]
    pub fn spawn(
        id: WidgetId,
        generation: u64,
        mut source: Box<dyn DataSource>,
        period: Duration,
        outcomes: mpsc::UnboundedSender<FetchOutcome>,
    ) -> PollHandle {
        let (cmd_tx, mut cmd_rx) = mpsc::unbounded_channel();

        let task = tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            let mut paused = false;

            loop {
                let mut fetch_now = false;
                tokio::select! {
                    cmd = cmd_rx.recv() => match cmd {
                        Some(PollCommand::Pause) => paused = true,
                        Some(PollCommand::Resume) => {
                            if paused {
                                paused = false;
                                ticker.reset();
                                fetch_now = true;
                            }
                        }
                        Some(PollCommand::Refresh) => fetch_now = true,
                        Some(PollCommand::Stop) | None => break,
                    },
                    _ = ticker.tick(), if !paused => fetch_now = true,
                }

                // The fetch is awaited inline: ticks elapsing meanwhile are
                // skipped by the interval, so overlap cannot occur.
                if fetch_now {
                    let result = source.fetch().await;
                    if let Err(ref err) = result {
                        debug!(widget = %id, error = %err, "fetch failed");
                    }
                    if outcomes.send(FetchOutcome { id, generation, result }).is_err() {
                        break;
                    }
                }
            }
            debug!(widget = %id, "poller stopped");
        });

        PollHandle { cmd_tx, task }
    }
}
