//! lookout - a terminal dashboard of pluggable widgets.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tokio::sync::mpsc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use lookout_core::plugin::{PluginResolver, WidgetRegistry};
use lookout_core::poll::FetchOutcome;
use lookout_core::theme::Theme;
use lookout_tui::app::Dashboard;
use lookout_tui::config::{self, DashboardConfig};
use lookout_tui::events::{handle_key, AppEvent, EventHandler};
use lookout_tui::{demo, ui};

#[derive(Parser)]
#[command(name = "lookout")]
#[command(about = "Lookout - a terminal dashboard of pluggable widgets")]
#[command(version)]
struct Cli {
    /// Path to the dashboard config file (JSON)
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// Directory holding external plugin manifests
    #[arg(long, default_value = "plugins")]
    plugins_root: PathBuf,

    /// Theme preset override
    #[arg(long)]
    theme: Option<String>,

    /// Override every data widget's refresh interval, in seconds
    #[arg(long)]
    poll_interval: Option<u64>,

    /// Run with synthetic data instead of live sources
    #[arg(long)]
    demo: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so they never corrupt the alternate screen.
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(EnvFilter::from_default_env().add_directive("lookout_tui=info".parse()?))
        .init();

    let mut config = match &cli.config {
        Some(path) => DashboardConfig::load(path)?,
        None => DashboardConfig::default(),
    };
    config.apply_auto_detect();

    let mut registry = WidgetRegistry::new();
    lookout_widgets::register_builtins(&mut registry);
    let resolver = PluginResolver::new(&cli.plugins_root);

    let theme = match &cli.theme {
        Some(name) => Theme::preset_or_default(name),
        None => config::theme_from_setting(config.theme.as_ref()),
    };

    // Unresolvable plugins are fatal here, before the terminal is touched:
    // the dashboard cannot render a slot with nothing behind it.
    let (outcome_tx, outcome_rx) = mpsc::unbounded_channel();
    let mut dashboard = Dashboard::build(
        &config,
        &registry,
        &resolver,
        theme,
        outcome_tx.clone(),
        cli.poll_interval.map(Duration::from_secs),
    )?;
    dashboard.initialize_all(!cli.demo).await;
    if cli.demo {
        demo::spawn(dashboard.demo_slots(), outcome_tx.clone());
    }
    drop(outcome_tx);

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let event_handler = EventHandler::new(Duration::from_millis(100));
    let result = run_app(&mut terminal, dashboard, event_handler, outcome_rx).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;

    if let Err(err) = result {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }

    Ok(())
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    mut dashboard: Dashboard,
    mut event_handler: EventHandler,
    mut outcomes: mpsc::UnboundedReceiver<FetchOutcome>,
) -> anyhow::Result<()> {
    while dashboard.running {
        // One full redraw per event batch, never one per widget.
        dashboard.begin_render_pass();
        terminal.draw(|frame| ui::draw(frame, &dashboard))?;
        dashboard.end_render_pass();

        tokio::select! {
            maybe_event = event_handler.next() => {
                let Some(event) = maybe_event else { break };
                match event {
                    AppEvent::Key(key) => handle_key(&mut dashboard, key),
                    AppEvent::Resize(_, _) => {
                        // Redrawn on the next pass with fresh dimensions.
                    }
                    AppEvent::Tick => dashboard.tick(),
                }
            }
            Some(outcome) = outcomes.recv() => {
                dashboard.apply_fetch(outcome);
            }
        }
    }

    dashboard.shutdown();
    Ok(())
}
