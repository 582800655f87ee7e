//! Terminal event handling.

use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};
use tokio::sync::mpsc;

use crate::app::Dashboard;

/// Application events.
#[derive(Debug)]
pub enum AppEvent {
    /// Terminal key press.
    Key(KeyEvent),
    /// Terminal resize.
    Resize(u16, u16),
    /// Tick for periodic updates.
    Tick,
}

/// Event handler that polls for terminal events.
pub struct EventHandler {
    rx: mpsc::UnboundedReceiver<AppEvent>,
    _tx: mpsc::UnboundedSender<AppEvent>,
}

impl EventHandler {
    /// Spawn the terminal poll loop; ticks fire at `tick_rate` when idle.
    #[must_use]
    pub fn new(tick_rate: Duration) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let event_tx = tx.clone();

        tokio::spawn(async move {
            loop {
                if event::poll(tick_rate).unwrap_or(false) {
                    match event::read() {
                        Ok(Event::Key(key)) => {
                            if event_tx.send(AppEvent::Key(key)).is_err() {
                                break;
                            }
                        }
                        Ok(Event::Resize(w, h)) => {
                            if event_tx.send(AppEvent::Resize(w, h)).is_err() {
                                break;
                            }
                        }
                        _ => {}
                    }
                } else if event_tx.send(AppEvent::Tick).is_err() {
                    break;
                }
            }
        });

        Self { rx, _tx: tx }
    }

    /// Next event, when one arrives.
    pub async fn next(&mut self) -> Option<AppEvent> {
        self.rx.recv().await
    }
}

/// Handle keyboard input.
pub fn handle_key(dashboard: &mut Dashboard, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') | KeyCode::Char('Q') => {
            dashboard.running = false;
        }
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            dashboard.running = false;
        }
        KeyCode::Char(' ') => {
            dashboard.toggle_paused();
        }
        KeyCode::Char('t') => {
            dashboard.cycle_theme();
        }
        KeyCode::Char('r') => {
            dashboard.refresh_all();
        }
        KeyCode::Tab | KeyCode::Right | KeyCode::Char('l') => {
            dashboard.focus_next();
        }
        KeyCode::BackTab | KeyCode::Left | KeyCode::Char('h') => {
            dashboard.focus_prev();
        }
        _ => {}
    }
}
