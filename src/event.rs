//! Event hub: multiplexes terminal input, the fixture watcher, change
//! notifications, finished loads, picker searches and the tick into a
//! single async channel.

use std::path::{Path, PathBuf};

use crossterm::event::{Event as CrosstermEvent, EventStream, KeyEvent, KeyEventKind, MouseEvent};
use futures::StreamExt;
use notify::Watcher;
use tokio::sync::mpsc;

use event_timeline::backend::BackendResult;
use event_timeline::bus::{ScopedSubscription, TasksChanged};
use event_timeline::graph::SearchRequest;
use event_timeline::model::Task;
use event_timeline::session::LoadKey;

#[derive(Debug)]
pub enum Event {
    /// Terminal key press
    Key(KeyEvent),
    /// Mouse event
    Mouse(MouseEvent),
    /// Terminal resized
    Resize(u16, u16),
    /// The fixture file was written
    FixtureChanged(PathBuf),
    /// Change notification for the page's scope
    TasksChanged(TasksChanged),
    /// A spawned `list_tasks` finished
    TasksLoaded(LoadKey, BackendResult<Vec<Task>>),
    /// A debounced link-picker search finished
    CandidatesFound(SearchRequest, BackendResult<Vec<Task>>),
    /// Periodic tick (1 second)
    Tick,
}

pub struct EventHandler {
    tx: mpsc::UnboundedSender<Event>,
    rx: mpsc::UnboundedReceiver<Event>,
}

impl EventHandler {
    pub fn new(data_path: Option<PathBuf>, changes: ScopedSubscription) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();

        // Spawn crossterm event reader
        let tx_key = tx.clone();
        tokio::spawn(async move {
            let mut reader = EventStream::new();
            while let Some(Ok(evt)) = reader.next().await {
                let event = match evt {
                    CrosstermEvent::Key(key) if key.kind == KeyEventKind::Press => Event::Key(key),
                    CrosstermEvent::Mouse(mouse) => Event::Mouse(mouse),
                    CrosstermEvent::Resize(w, h) => Event::Resize(w, h),
                    _ => continue,
                };
                if tx_key.send(event).is_err() {
                    break;
                }
            }
        });

        // Spawn tick timer
        let tx_tick = tx.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(std::time::Duration::from_secs(1));
            loop {
                interval.tick().await;
                if tx_tick.send(Event::Tick).is_err() {
                    break;
                }
            }
        });

        // Forward bus notifications
        let tx_bus = tx.clone();
        let mut changes = changes;
        tokio::spawn(async move {
            while let Some(change) = changes.recv().await {
                if tx_bus.send(Event::TasksChanged(change)).is_err() {
                    break;
                }
            }
            tracing::debug!("change bus closed");
        });

        // Spawn fixture watcher (if enabled)
        if let Some(path) = data_path {
            let tx_watch = tx.clone();
            tokio::spawn(async move {
                if let Err(e) = run_fixture_watcher(path, tx_watch).await {
                    tracing::error!(error = %e, "fixture watcher failed");
                }
            });
        }

        EventHandler { tx, rx }
    }

    /// Sender for results produced by spawned work.
    pub fn sender(&self) -> mpsc::UnboundedSender<Event> {
        self.tx.clone()
    }

    pub async fn next(&mut self) -> Option<Event> {
        self.rx.recv().await
    }
}

async fn run_fixture_watcher(path: PathBuf, tx: mpsc::UnboundedSender<Event>) -> color_eyre::Result<()> {
    let (wtx, mut wrx) = mpsc::channel::<PathBuf>(100);

    // Editors replace files on save, so watch the parent directory and
    // match on the file name.
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    let target = path.clone();

    let mut debouncer = notify_debouncer_mini::new_debouncer(
        std::time::Duration::from_millis(300),
        move |result: notify_debouncer_mini::DebounceEventResult| {
            if let Ok(events) = result {
                if events.iter().any(|e| is_fixture_file(&e.path, &target)) {
                    let _ = wtx.blocking_send(target.clone());
                }
            }
        },
    )?;

    debouncer
        .watcher()
        .watch(&dir, notify::RecursiveMode::NonRecursive)?;
    tracing::info!(path = %path.display(), "watching fixture");

    // Keep debouncer alive; forward events
    while let Some(changed) = wrx.recv().await {
        if tx.send(Event::FixtureChanged(changed)).is_err() {
            break;
        }
    }

    Ok(())
}

fn is_fixture_file(changed: &Path, target: &Path) -> bool {
    changed.file_name().is_some() && changed.file_name() == target.file_name()
}
