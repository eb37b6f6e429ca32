mod app;
mod event;
mod theme;

use std::io::stdout;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use crossterm::event::{DisableMouseCapture, EnableMouseCapture};
use crossterm::execute;
use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen};

use event_timeline::backend::{Fixture, MemoryBackend};
use event_timeline::bus::ChangeBus;
use event_timeline::config::Config;
use event_timeline::model::{DepartmentId, EventId, Scale, Scope, ViewMode};

/// Event Timeline: terminal timeline and board for an event's department tasks.
#[derive(Parser, Debug)]
#[command(name = "event-timeline", version, about)]
struct Cli {
    /// YAML config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// JSON task fixture served by the in-memory backend
    #[arg(long, default_value = "./fixtures/event.json")]
    data: PathBuf,

    /// Event id (defaults to the fixture's event)
    #[arg(long)]
    event: Option<String>,

    /// Department whose tasks are shown
    #[arg(long)]
    department: String,

    /// Initial scale: day or week (overrides the config file)
    #[arg(long)]
    scale: Option<String>,

    /// Disable watching the fixture (static mode)
    #[arg(long)]
    no_watch: bool,

    /// Initial view: list or board
    #[arg(long, default_value = "list")]
    view: String,
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(scale) = &cli.scale {
        config.scale = Scale::from_str_loose(scale);
    }

    // Validate the fixture before touching the terminal
    let fixture = match Fixture::load(&cli.data) {
        Ok(fixture) => fixture,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    // Set up logging to file (we own the terminal)
    let log_dir = config.resolve_log_dir();
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = tracing_appender::rolling::daily(&log_dir, "event-timeline.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive("event_timeline=info".parse()?),
        )
        .init();

    let event_id = cli
        .event
        .map(EventId::from)
        .unwrap_or_else(|| fixture.event_id.clone());
    let scope = Scope::new(event_id, DepartmentId::from(cli.department));
    tracing::info!(%scope, data = %cli.data.display(), "starting");

    let bus = ChangeBus::new();
    let backend = Arc::new(MemoryBackend::new(fixture).with_bus(bus.clone()));

    // Install panic hook to restore terminal
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = execute!(stdout(), LeaveAlternateScreen, DisableMouseCapture);
        ratatui::restore();
        original_hook(panic_info);
    }));

    // Set up terminal with mouse capture enabled
    execute!(stdout(), EnterAlternateScreen, EnableMouseCapture)?;
    let mut terminal = ratatui::init();

    // Run the app
    let mut app = app::App::new(
        backend,
        bus,
        scope,
        config,
        Some(cli.data),
        cli.no_watch,
        ViewMode::from_str_loose(&cli.view),
    );
    let result = app.run(&mut terminal).await;

    // Restore terminal, disable mouse capture before restoring
    execute!(stdout(), LeaveAlternateScreen, DisableMouseCapture)?;
    ratatui::restore();

    result
}
