use std::path::PathBuf;
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use clap::Parser;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use event_timeline::backend::{Fixture, MemoryBackend};
use event_timeline::config::Config;
use event_timeline::model::{DepartmentId, EventId, Scale, Scope, TaskStatus};
use event_timeline::session::{today, LoadOutcome, TimelineSession};
use event_timeline::timeline::{initial_scroll, today_pos, TimelineRows};

/// Timeline Report: prints the projected timeline geometry as JSON.
#[derive(Parser, Debug)]
#[command(name = "timeline-report", version, about)]
struct Cli {
    /// YAML config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// JSON task fixture
    #[arg(long, default_value = "./fixtures/event.json")]
    data: PathBuf,

    /// Event id (defaults to the fixture's event)
    #[arg(long)]
    event: Option<String>,

    /// Department whose tasks are projected
    #[arg(long)]
    department: String,

    /// day or week
    #[arg(long)]
    scale: Option<String>,

    /// Keep only these statuses (repeatable)
    #[arg(long = "status")]
    statuses: Vec<String>,

    /// Title substring
    #[arg(long, default_value = "")]
    query: String,

    /// Keep only overdue tasks
    #[arg(long)]
    overdue: bool,

    /// Evaluate as of this date instead of today (YYYY-MM-DD)
    #[arg(long)]
    today: Option<NaiveDate>,
}

#[derive(Serialize)]
struct Report {
    scope: String,
    scale: Scale,
    chart_start: NaiveDate,
    chart_end: NaiveDate,
    grid_width: f32,
    today_pos: f32,
    initial_scroll: f32,
    board: Vec<ColumnCount>,
    #[serde(flatten)]
    layout: TimelineRows,
}

#[derive(Serialize)]
struct ColumnCount {
    status: TaskStatus,
    count: usize,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Log to stderr (stdout carries the JSON)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("event_timeline=info".parse()?))
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(scale) = &cli.scale {
        config.scale = Scale::from_str_loose(scale);
    }

    let fixture = Fixture::load(&cli.data)?;
    let event_id = cli
        .event
        .map(EventId::from)
        .unwrap_or_else(|| fixture.event_id.clone());
    let scope = Scope::new(event_id, DepartmentId::from(cli.department));

    let backend = Arc::new(MemoryBackend::new(fixture));
    let mut session = TimelineSession::new(backend, scope.clone());
    session.state.scale = config.scale;
    session.state.filters.query = cli.query;
    session.state.filters.overdue_only = cli.overdue;
    for status in &cli.statuses {
        session.state.filters.toggle_status(TaskStatus::from_str_loose(status));
    }

    match session.load().await {
        LoadOutcome::Applied(count) => tracing::info!(%scope, count, "tasks loaded"),
        outcome => {
            let reason = session
                .state
                .notice()
                .map(|n| n.message.clone())
                .unwrap_or_else(|| format!("{outcome:?}"));
            anyhow::bail!("could not load tasks for {scope}: {reason}");
        }
    }

    let now = match cli.today {
        Some(date) => date
            .and_hms_opt(12, 0, 0)
            .map(|dt| dt.and_utc())
            .ok_or_else(|| anyhow::anyhow!("invalid --today {date}"))?,
        None => Utc::now(),
    };
    let grid = session.state.grid(now, &config.grid());
    let layout = session.state.rows(&grid, now);
    let board = session
        .state
        .board(now)
        .into_iter()
        .map(|column| ColumnCount {
            status: column.status,
            count: column.tasks.len(),
        })
        .collect();

    let report = Report {
        scope: scope.to_string(),
        scale: grid.scale,
        chart_start: grid.chart_start,
        chart_end: grid.chart_end,
        grid_width: grid.grid_width(),
        today_pos: today_pos(&grid, today(now)),
        initial_scroll: initial_scroll(&grid, today(now), config.timeline_pane_width),
        board,
        layout,
    };

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
