//! Application state, event handling, and rendering.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use chrono::{Datelike, NaiveDate, Utc, Weekday};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use ratatui::layout::{Alignment, Constraint, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Clear, Paragraph};
use ratatui::Frame;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use event_timeline::backend::{Disposition, Fixture, MemoryBackend};
use event_timeline::bus::ChangeBus;
use event_timeline::config::Config;
use event_timeline::debounce::Debouncer;
use event_timeline::graph::{fetch_candidates, Exclusions, LinkError, LinkPicker, SearchRequest};
use event_timeline::model::{DepartmentId, DependencyLinks, Scale, Scope, TaskId, ViewMode};
use event_timeline::projection::BoardColumn;
use event_timeline::session::{fetch_tasks, today, LoadOutcome, Notice, Shift, TimelineSession};
use event_timeline::timeline::{
    initial_scroll, today_pos, Bar, DateGrid, PaneId, ScrollCoordinator, TimelineRows, ROW_HEIGHT,
};

use crate::event::{Event, EventHandler};
use crate::theme::Theme;

/// Pixels represented by one terminal column on the timeline.
const CELL_PX: f32 = 7.0;
/// Month line + day numbers.
const HEADER_ROWS: u16 = 2;
const NOTICE_TTL_SECS: u64 = 10;
const BOARD_CARD_ROWS: u16 = 3;

/// Return value from event handling. Anything that has to talk to the
/// backend is handed back to the run loop.
#[derive(Debug, PartialEq)]
pub enum Action {
    Continue,
    Quit,
    Reload,
    MoveCard(TaskId, Shift),
    LoadDependencies(TaskId),
    ReloadFixture(PathBuf),
    OpenLinkPicker(TaskId),
    SearchCandidates(SearchRequest),
    SaveLinks(TaskId, BTreeSet<TaskId>),
    CreateAndLink(TaskId, String, DepartmentId),
}

/// Input mode for modal states.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputMode {
    Normal,
    Search,
    Link,
    Help,
}

/// Blocker editor for one task: the picker plus what the overlay needs.
struct LinkEditor {
    task_id: TaskId,
    title: String,
    picker: LinkPicker,
    departments: Vec<DepartmentId>,
    highlight: usize,
    searching: bool,
}

pub struct App {
    // Core data
    session: TimelineSession<MemoryBackend>,
    backend: Arc<MemoryBackend>,
    bus: ChangeBus,
    config: Config,
    data_path: Option<PathBuf>,
    no_watch: bool,

    // Layout over the visible tasks
    grid: DateGrid,
    rows: TimelineRows,
    scroll: ScrollCoordinator,
    centered: bool,
    viewport: (u16, u16, u16),

    // UI state
    mode: InputMode,
    theme: Theme,
    list_index: usize,
    board_column: usize,
    board_row: usize,
    show_dependencies: bool,
    dependencies: Option<(TaskId, DependencyLinks)>,
    link: Option<LinkEditor>,
    debouncer: Debouncer,

    // Status
    loading: bool,
    notice_since: Option<Instant>,
    clock: String,

    // Layout areas for mouse hit-testing
    header_area: Rect,
    label_area: Rect,
    bars_area: Rect,
}

impl App {
    pub fn new(
        backend: Arc<MemoryBackend>,
        bus: ChangeBus,
        scope: Scope,
        config: Config,
        data_path: Option<PathBuf>,
        no_watch: bool,
        view: ViewMode,
    ) -> Self {
        let mut session = TimelineSession::new(Arc::clone(&backend), scope);
        session.state.scale = config.scale;
        session.state.filters.view = view;

        let debouncer = Debouncer::new(config.search_debounce());
        let now = Utc::now();
        let grid = DateGrid::build(&[], config.scale, today(now), &config.grid());
        let scroll = ScrollCoordinator::for_grid(
            config.label_pane_width,
            config.timeline_pane_width,
            f32::from(HEADER_ROWS) * ROW_HEIGHT,
            ROW_HEIGHT,
            grid.grid_width(),
            0.0,
        );

        Self {
            session,
            backend,
            bus,
            config,
            data_path,
            no_watch,
            grid,
            rows: TimelineRows::default(),
            scroll,
            centered: false,
            viewport: (0, 0, 0),
            mode: InputMode::Normal,
            theme: Theme::light(),
            list_index: 0,
            board_column: 0,
            board_row: 0,
            show_dependencies: false,
            dependencies: None,
            link: None,
            debouncer,
            loading: false,
            notice_since: None,
            clock: chrono::Local::now().format("%H:%M:%S").to_string(),
            header_area: Rect::default(),
            label_area: Rect::default(),
            bars_area: Rect::default(),
        }
    }

    /// Main event loop.
    pub async fn run(&mut self, terminal: &mut ratatui::DefaultTerminal) -> color_eyre::Result<()> {
        let watch_path = if self.no_watch {
            None
        } else {
            self.data_path.clone()
        };
        let changes = self.bus.subscribe(self.session.scope().clone());
        let mut events = EventHandler::new(watch_path, changes);
        let tx = events.sender();

        self.session.load_members().await;
        self.request_load(&tx);

        loop {
            // RENDER
            terminal.draw(|frame| self.render(frame))?;

            // WAIT FOR EVENT
            let Some(event) = events.next().await else {
                break;
            };

            // UPDATE
            match self.handle_event(event) {
                Action::Quit => break,
                Action::Continue => {}
                Action::Reload => self.request_load(&tx),
                Action::MoveCard(task_id, shift) => self.move_card(&task_id, shift).await,
                Action::LoadDependencies(task_id) => self.load_dependencies(&task_id).await,
                Action::ReloadFixture(path) => self.reload_fixture(&path).await,
                Action::OpenLinkPicker(task_id) => self.open_link_picker(&task_id, &tx).await,
                Action::SearchCandidates(request) => self.request_candidates(request, &tx),
                Action::SaveLinks(task_id, desired) => self.save_links(&task_id, &desired).await,
                Action::CreateAndLink(task_id, title, department) => {
                    self.create_and_link(&task_id, &title, &department, &tx).await;
                }
            }
        }

        Ok(())
    }

    // ─────────────────────────────────────────────────────────
    // Backend round-trips
    // ─────────────────────────────────────────────────────────

    /// Spawn a load for the current parameters. The result comes back as
    /// `Event::TasksLoaded` and is dropped if the parameters moved on.
    fn request_load(&mut self, tx: &mpsc::UnboundedSender<Event>) {
        let key = self.session.state.request_key();
        let backend = Arc::clone(&self.backend);
        let tx = tx.clone();
        self.loading = true;
        debug!(scope = %key.scope, "requesting task list");
        tokio::spawn(async move {
            let (key, result) = fetch_tasks(backend, key).await;
            let _ = tx.send(Event::TasksLoaded(key, result));
        });
    }

    async fn move_card(&mut self, task_id: &TaskId, shift: Shift) {
        match self.session.move_card(task_id, shift).await {
            Ok(Some(status)) => {
                info!(task_id = %task_id, status = status.as_str(), "card moved");
                self.relayout();
                self.focus_card(task_id);
            }
            Ok(None) => {}
            Err(e) => {
                debug!(task_id = %task_id, error = %e, "card move failed");
                self.notice_since = Some(Instant::now());
                self.relayout();
            }
        }
    }

    async fn load_dependencies(&mut self, task_id: &TaskId) {
        match self.session.dependencies.list(task_id).await {
            Ok(links) => self.dependencies = Some((task_id.clone(), links)),
            Err(e) => {
                self.dependencies = None;
                self.session
                    .state
                    .set_notice(Notice::from_error("Loading dependencies failed", &e));
                self.notice_since = Some(Instant::now());
            }
        }
    }

    async fn open_link_picker(&mut self, task_id: &TaskId, tx: &mpsc::UnboundedSender<Event>) {
        let links = match self.session.dependencies.list(task_id).await {
            Ok(links) => links,
            Err(e) => {
                self.session
                    .state
                    .set_notice(Notice::from_error("Loading dependencies failed", &e));
                self.notice_since = Some(Instant::now());
                return;
            }
        };

        let own = self.session.scope().department_id.clone();
        let mut departments = vec![own.clone()];
        for department in &self.config.link_departments {
            if !departments.contains(department) {
                departments.push(department.clone());
            }
        }
        let title = self
            .session
            .state
            .task(task_id)
            .map_or_else(|| task_id.to_string(), |t| t.title.clone());
        let blockers = links.blockers.iter().map(|l| l.task.clone()).collect();
        let picker = LinkPicker::new(Exclusions::for_task(task_id, &links), own).with_selected(blockers);
        let request = picker.current_request();

        self.dependencies = Some((task_id.clone(), links));
        self.link = Some(LinkEditor {
            task_id: task_id.clone(),
            title,
            picker,
            departments,
            highlight: 0,
            searching: false,
        });
        self.mode = InputMode::Link;
        self.request_candidates(request, tx);
    }

    /// Spawn a search that fires once typing settles. Superseded requests
    /// never reach the backend; late answers are dropped by the picker.
    fn request_candidates(&mut self, request: SearchRequest, tx: &mpsc::UnboundedSender<Event>) {
        let Some(editor) = self.link.as_mut() else {
            return;
        };
        editor.searching = true;
        let backend = Arc::clone(&self.backend);
        let scope = self.session.scope().clone();
        let debouncer = self.debouncer.clone();
        let tx = tx.clone();
        tokio::spawn(async move {
            if let Some((request, result)) = fetch_candidates(backend, scope, debouncer, request).await {
                let _ = tx.send(Event::CandidatesFound(request, result));
            }
        });
    }

    async fn save_links(&mut self, task_id: &TaskId, desired: &BTreeSet<TaskId>) {
        match self.session.dependencies.reconcile(task_id, desired).await {
            Ok(report) => {
                if !report.is_complete() {
                    let attempted = report.added.len() + report.removed.len() + report.failed.len();
                    self.session.state.set_notice(Notice {
                        message: format!(
                            "{} of {attempted} dependency changes failed",
                            report.failed.len()
                        ),
                        disposition: Disposition::Dismissible,
                    });
                    self.notice_since = Some(Instant::now());
                }
                self.dependencies = self
                    .session
                    .dependencies
                    .cached(task_id)
                    .map(|links| (task_id.clone(), links.clone()));
            }
            Err(e) => {
                self.session
                    .state
                    .set_notice(Notice::from_error("Saving dependencies failed", &e));
                self.notice_since = Some(Instant::now());
            }
        }
    }

    async fn create_and_link(
        &mut self,
        task_id: &TaskId,
        title: &str,
        department: &DepartmentId,
        tx: &mpsc::UnboundedSender<Event>,
    ) {
        let result = self
            .session
            .resolver
            .create_and_link(&mut self.session.dependencies, task_id, title, department)
            .await;
        match result {
            Ok(created) => {
                info!(task_id = %created.id, blocked = %task_id, "created and linked blocker");
                // Keep it selected so saving the editor does not unlink it.
                let request = self
                    .link
                    .as_mut()
                    .filter(|editor| &editor.task_id == task_id)
                    .map(|editor| {
                        editor.picker.add_selected(created);
                        editor.picker.set_query("")
                    });
                if let Some(request) = request {
                    self.request_candidates(request, tx);
                }
            }
            Err(LinkError::Create(e)) => {
                self.session
                    .state
                    .set_notice(Notice::from_error("Creating task failed", &e));
                self.notice_since = Some(Instant::now());
            }
            Err(LinkError::Link { orphan, source }) => {
                self.session.state.set_notice(Notice {
                    message: format!("Created \"{}\" but linking it failed: {source}", orphan.title),
                    disposition: source.disposition(),
                });
                self.notice_since = Some(Instant::now());
            }
        }
    }

    fn close_link_picker(&mut self) {
        self.debouncer.cancel();
        self.link = None;
        self.mode = InputMode::Normal;
    }

    /// The fixture changed on disk: swap the backend data and announce it
    /// the same way a server push would.
    async fn reload_fixture(&mut self, path: &Path) {
        match Fixture::load(path) {
            Ok(fixture) => {
                self.backend.replace(fixture).await;
                self.bus.publish(self.session.scope().clone());
            }
            Err(e) => {
                warn!(error = %e, "fixture reload failed");
                self.session.state.set_notice(Notice {
                    message: e.to_string(),
                    disposition: Disposition::Dismissible,
                });
                self.notice_since = Some(Instant::now());
            }
        }
    }

    // ─────────────────────────────────────────────────────────
    // Event handling
    // ─────────────────────────────────────────────────────────

    pub fn handle_event(&mut self, event: Event) -> Action {
        match event {
            Event::Key(key) => self.handle_key_event(key),
            Event::Mouse(mouse) => self.handle_mouse_event(mouse),
            Event::Tick => {
                self.clock = chrono::Local::now().format("%H:%M:%S").to_string();
                self.age_notice();
                Action::Continue
            }
            Event::FixtureChanged(path) => Action::ReloadFixture(path),
            Event::TasksChanged(change) => {
                if &change.scope != self.session.scope() {
                    return Action::Continue;
                }
                self.session.state.invalidate();
                self.session.dependencies.clear();
                Action::Reload
            }
            Event::TasksLoaded(key, result) => {
                self.loading = false;
                match self.session.state.apply_loaded(key, result) {
                    LoadOutcome::Applied(count) => {
                        debug!(count, "task list applied");
                        self.relayout();
                        if self.show_dependencies {
                            return self.dependencies_action();
                        }
                    }
                    LoadOutcome::Stale => {}
                    LoadOutcome::Failed => self.notice_since = Some(Instant::now()),
                }
                Action::Continue
            }
            Event::CandidatesFound(request, result) => {
                let Some(editor) = self.link.as_mut() else {
                    return Action::Continue;
                };
                match result {
                    Ok(tasks) => {
                        if editor.picker.accept(&request, tasks) {
                            editor.searching = false;
                            editor.highlight = editor
                                .highlight
                                .min(editor.picker.results().len().saturating_sub(1));
                        }
                    }
                    Err(e) if request == editor.picker.current_request() => {
                        editor.searching = false;
                        warn!(query = %request.query, error = %e, "candidate search failed");
                        self.session
                            .state
                            .set_notice(Notice::from_error("Searching tasks failed", &e));
                        self.notice_since = Some(Instant::now());
                    }
                    Err(_) => {}
                }
                Action::Continue
            }
            Event::Resize(_, _) => Action::Continue,
        }
    }

    fn handle_key_event(&mut self, key: KeyEvent) -> Action {
        // Global keys
        match key.code {
            KeyCode::Char('q') if self.mode == InputMode::Normal => return Action::Quit,
            KeyCode::Char('?') if !matches!(self.mode, InputMode::Search | InputMode::Link) => {
                self.mode = if self.mode == InputMode::Help {
                    InputMode::Normal
                } else {
                    InputMode::Help
                };
                return Action::Continue;
            }
            KeyCode::Esc => {
                match self.mode {
                    InputMode::Search => {
                        self.mode = InputMode::Normal;
                        self.session.state.filters.query.clear();
                        self.relayout();
                    }
                    InputMode::Link => self.close_link_picker(),
                    InputMode::Help => self.mode = InputMode::Normal,
                    InputMode::Normal => self.session.state.dismiss_notice(),
                }
                return Action::Continue;
            }
            _ => {}
        }

        // Help mode: any key dismisses
        if self.mode == InputMode::Help {
            self.mode = InputMode::Normal;
            return Action::Continue;
        }

        // Search mode: capture all input
        if self.mode == InputMode::Search {
            match key.code {
                KeyCode::Char(c) => {
                    self.session.state.filters.query.push(c);
                    self.relayout();
                }
                KeyCode::Backspace => {
                    self.session.state.filters.query.pop();
                    self.relayout();
                }
                KeyCode::Enter => self.mode = InputMode::Normal,
                _ => {}
            }
            return Action::Continue;
        }

        if self.mode == InputMode::Link {
            return self.handle_link_key(key);
        }

        // Normal mode keys
        match key.code {
            KeyCode::Char('/') => self.mode = InputMode::Search,
            KeyCode::Char('a') => {
                return match self.selected_task_id() {
                    Some(task_id) => Action::OpenLinkPicker(task_id),
                    None => Action::Continue,
                };
            }
            KeyCode::Char('r') => return Action::Reload,
            KeyCode::Char('T') => {
                self.theme = self.theme.next();
                debug!(theme = self.theme.name, "theme changed");
            }
            KeyCode::Char('v') => {
                self.session.state.filters.view = self.session.state.filters.view.next();
            }
            KeyCode::Char('f') => {
                self.session.state.filters.cycle_status();
                self.relayout();
            }
            KeyCode::Char('o') => {
                self.session.state.filters.overdue_only = !self.session.state.filters.overdue_only;
                self.relayout();
            }
            KeyCode::Char('c') => {
                self.session.state.filters.clear();
                self.relayout();
            }
            KeyCode::Char('z') => self.toggle_scale(),
            KeyCode::Char('t') => self.center_on_today(),
            KeyCode::Char('d') => {
                self.show_dependencies = !self.show_dependencies;
                if self.show_dependencies {
                    return self.dependencies_action();
                }
            }
            _ => {
                return match self.session.state.filters.view {
                    ViewMode::List => self.handle_list_key(key),
                    ViewMode::Board => self.handle_board_key(key),
                };
            }
        }

        Action::Continue
    }

    fn handle_list_key(&mut self, key: KeyEvent) -> Action {
        let day = self.grid.day_width();
        match key.code {
            KeyCode::Down | KeyCode::Char('j') => return self.select_row(self.list_index.saturating_add(1)),
            KeyCode::Up | KeyCode::Char('k') => return self.select_row(self.list_index.saturating_sub(1)),
            KeyCode::Home => return self.select_row(0),
            KeyCode::End => return self.select_row(self.rows.rows.len().saturating_sub(1)),
            KeyCode::Left | KeyCode::Char('h') => self.scroll_pane(PaneId::RightBody, -day, 0.0),
            KeyCode::Right | KeyCode::Char('l') => self.scroll_pane(PaneId::RightBody, day, 0.0),
            KeyCode::Char('H') => self.scroll_pane(PaneId::RightBody, -7.0 * day, 0.0),
            KeyCode::Char('L') => self.scroll_pane(PaneId::RightBody, 7.0 * day, 0.0),
            _ => {}
        }
        Action::Continue
    }

    fn handle_link_key(&mut self, key: KeyEvent) -> Action {
        let Some(editor) = self.link.as_mut() else {
            self.mode = InputMode::Normal;
            return Action::Continue;
        };
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

        match key.code {
            KeyCode::Char('s') if ctrl => {
                let task_id = editor.task_id.clone();
                let desired = editor.picker.selected_ids().cloned().collect();
                self.close_link_picker();
                return Action::SaveLinks(task_id, desired);
            }
            KeyCode::Char('d') if ctrl => {
                if let Some(last) = editor.picker.selected().last().map(|t| t.id.clone()) {
                    editor.picker.deselect(&last);
                }
            }
            KeyCode::Char(c) => {
                let query = format!("{}{c}", editor.picker.query());
                editor.highlight = 0;
                return Action::SearchCandidates(editor.picker.set_query(query));
            }
            KeyCode::Backspace => {
                let mut query = editor.picker.query().to_string();
                if query.pop().is_some() {
                    editor.highlight = 0;
                    return Action::SearchCandidates(editor.picker.set_query(query));
                }
            }
            KeyCode::Tab if editor.departments.len() > 1 => {
                let current = editor
                    .departments
                    .iter()
                    .position(|d| d == editor.picker.department())
                    .unwrap_or(0);
                let next = editor.departments[(current + 1) % editor.departments.len()].clone();
                editor.highlight = 0;
                return Action::SearchCandidates(editor.picker.set_department(next));
            }
            KeyCode::Down => {
                let last = editor.picker.results().len().saturating_sub(1);
                editor.highlight = (editor.highlight + 1).min(last);
            }
            KeyCode::Up => editor.highlight = editor.highlight.saturating_sub(1),
            KeyCode::Enter => {
                let highlighted = editor.picker.results().get(editor.highlight).map(|t| t.id.clone());
                let title = editor.picker.query().trim().to_string();
                if let Some(candidate) = highlighted {
                    editor.picker.select(&candidate);
                    let last = editor.picker.results().len().saturating_sub(1);
                    editor.highlight = editor.highlight.min(last);
                } else if !title.is_empty() && !editor.searching {
                    return Action::CreateAndLink(
                        editor.task_id.clone(),
                        title,
                        editor.picker.department().clone(),
                    );
                }
            }
            _ => {}
        }
        Action::Continue
    }

    fn handle_board_key(&mut self, key: KeyEvent) -> Action {
        let columns = self.session.state.board(Utc::now());
        match key.code {
            KeyCode::Left | KeyCode::Char('h') => {
                self.board_column = self.board_column.saturating_sub(1);
            }
            KeyCode::Right | KeyCode::Char('l') => {
                self.board_column = (self.board_column + 1).min(columns.len().saturating_sub(1));
            }
            KeyCode::Down | KeyCode::Char('j') => self.board_row = self.board_row.saturating_add(1),
            KeyCode::Up | KeyCode::Char('k') => self.board_row = self.board_row.saturating_sub(1),
            KeyCode::Char('<') | KeyCode::Char('>') => {
                let shift = if key.code == KeyCode::Char('<') {
                    Shift::Left
                } else {
                    Shift::Right
                };
                return match self.board_selection(&columns) {
                    Some(task_id) => Action::MoveCard(task_id, shift),
                    None => Action::Continue,
                };
            }
            _ => return Action::Continue,
        }
        self.clamp_board(&columns);
        if self.show_dependencies {
            return self.dependencies_action();
        }
        Action::Continue
    }

    fn handle_mouse_event(&mut self, mouse: MouseEvent) -> Action {
        let at = (mouse.column, mouse.row).into();
        let over_labels = self.label_area.contains(at);
        let over_bars = self.bars_area.contains(at);
        let over_header = self.header_area.contains(at);
        let step = 3.0 * ROW_HEIGHT;
        let day = self.grid.day_width();

        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) if over_labels || over_bars => {
                let area = if over_labels { self.label_area } else { self.bars_area };
                let offset_y = self.scroll.pane(PaneId::LeftBody).offset_y;
                let y = offset_y + f32::from(mouse.row - area.y) * ROW_HEIGHT;
                if let Some(index) = self.rows.row_at(y) {
                    return self.select_row(index);
                }
            }
            MouseEventKind::ScrollDown if over_labels => self.scroll_pane(PaneId::LeftBody, 0.0, step),
            MouseEventKind::ScrollUp if over_labels => self.scroll_pane(PaneId::LeftBody, 0.0, -step),
            MouseEventKind::ScrollDown if over_bars => self.scroll_pane(PaneId::RightBody, 0.0, step),
            MouseEventKind::ScrollUp if over_bars => self.scroll_pane(PaneId::RightBody, 0.0, -step),
            MouseEventKind::ScrollDown if over_header => self.scroll_pane(PaneId::Header, day, 0.0),
            MouseEventKind::ScrollUp if over_header => self.scroll_pane(PaneId::Header, -day, 0.0),
            MouseEventKind::ScrollRight if over_bars || over_header => {
                self.scroll_pane(PaneId::RightBody, day, 0.0)
            }
            MouseEventKind::ScrollLeft if over_bars || over_header => {
                self.scroll_pane(PaneId::RightBody, -day, 0.0)
            }
            _ => {}
        }
        Action::Continue
    }

    // ─────────────────────────────────────────────────────────
    // Layout / selection helpers
    // ─────────────────────────────────────────────────────────

    /// Recompute grid, rows and scroll extents from the visible tasks.
    fn relayout(&mut self) {
        let now = Utc::now();
        self.grid = self.session.state.grid(now, &self.config.grid());
        self.rows = self.session.state.rows(&self.grid, now);
        self.scroll
            .resize_content(self.grid.grid_width(), self.rows.content_height());
        self.list_index = self.list_index.min(self.rows.rows.len().saturating_sub(1));
        let columns = self.session.state.board(now);
        self.clamp_board(&columns);

        if !self.centered && !self.rows.rows.is_empty() {
            let width = self.scroll.pane(PaneId::RightBody).viewport_width;
            let x = initial_scroll(&self.grid, today(now), width);
            let y = self.scroll.pane(PaneId::RightBody).offset_y;
            if let Err(e) = self.scroll.scroll_to(PaneId::RightBody, x, y) {
                warn!(error = %e, "initial scroll failed");
            }
            self.centered = true;
        }
    }

    fn toggle_scale(&mut self) {
        self.session.state.scale = self.session.state.scale.next();
        info!(scale = self.session.state.scale.label(), "scale changed");
        self.relayout();
        self.center_on_today();
    }

    fn center_on_today(&mut self) {
        let pos = today_pos(&self.grid, today(Utc::now()));
        self.scroll.center_on(pos);
    }

    fn scroll_pane(&mut self, pane: PaneId, dx: f32, dy: f32) {
        if let Err(e) = self.scroll.scroll_by(pane, dx, dy) {
            warn!(?pane, error = %e, "scroll sync failed");
        }
    }

    fn select_row(&mut self, index: usize) -> Action {
        if self.rows.rows.is_empty() {
            return Action::Continue;
        }
        self.list_index = index.min(self.rows.rows.len() - 1);

        // Keep the selection inside the body viewport
        let pane = *self.scroll.pane(PaneId::LeftBody);
        let top = self.list_index as f32 * ROW_HEIGHT;
        let target = if top < pane.offset_y {
            Some(top)
        } else if top + ROW_HEIGHT > pane.offset_y + pane.viewport_height {
            Some(top + ROW_HEIGHT - pane.viewport_height)
        } else {
            None
        };
        if let Some(y) = target {
            if let Err(e) = self.scroll.scroll_to(PaneId::LeftBody, 0.0, y) {
                warn!(error = %e, "scroll sync failed");
            }
        }

        if self.show_dependencies {
            return self.dependencies_action();
        }
        Action::Continue
    }

    fn clamp_board(&mut self, columns: &[BoardColumn]) {
        self.board_column = self.board_column.min(columns.len().saturating_sub(1));
        let len = columns.get(self.board_column).map_or(0, |c| c.tasks.len());
        self.board_row = self.board_row.min(len.saturating_sub(1));
    }

    /// Follow a card to its new column after a move.
    fn focus_card(&mut self, task_id: &TaskId) {
        let columns = self.session.state.board(Utc::now());
        for (c, column) in columns.iter().enumerate() {
            if let Some(r) = column.tasks.iter().position(|t| &t.id == task_id) {
                self.board_column = c;
                self.board_row = r;
                return;
            }
        }
    }

    fn board_selection(&self, columns: &[BoardColumn]) -> Option<TaskId> {
        columns
            .get(self.board_column)?
            .tasks
            .get(self.board_row)
            .map(|t| t.id.clone())
    }

    fn selected_task_id(&self) -> Option<TaskId> {
        match self.session.state.filters.view {
            ViewMode::List => self.rows.rows.get(self.list_index).map(|r| r.task_id.clone()),
            ViewMode::Board => self.board_selection(&self.session.state.board(Utc::now())),
        }
    }

    fn dependencies_action(&self) -> Action {
        match self.selected_task_id() {
            Some(task_id) => Action::LoadDependencies(task_id),
            None => Action::Continue,
        }
    }

    fn age_notice(&mut self) {
        let Some(notice) = self.session.state.notice() else {
            self.notice_since = None;
            return;
        };
        if notice.disposition == Disposition::NotAllowed {
            return;
        }
        let since = *self.notice_since.get_or_insert_with(Instant::now);
        if since.elapsed().as_secs() >= NOTICE_TTL_SECS {
            self.session.state.dismiss_notice();
            self.notice_since = None;
        }
    }

    /// Feed terminal-derived pane sizes to the scroll coordinator.
    fn sync_viewports(&mut self, label: Rect, bars: Rect) {
        let viewport = (label.width, bars.width, bars.height);
        if viewport == self.viewport {
            return;
        }
        self.viewport = viewport;
        self.scroll.resize_viewports(
            f32::from(label.width) * CELL_PX,
            f32::from(bars.width) * CELL_PX,
            f32::from(HEADER_ROWS) * ROW_HEIGHT,
            f32::from(bars.height) * ROW_HEIGHT,
        );
    }

    // ─────────────────────────────────────────────────────────
    // Rendering
    // ─────────────────────────────────────────────────────────

    pub fn render(&mut self, frame: &mut Frame) {
        let area = frame.area();

        // Graceful degradation for tiny terminals
        if area.width < 60 || area.height < 12 {
            let msg = Paragraph::new("Terminal too small. Resize to at least 80x24.")
                .alignment(Alignment::Center)
                .style(Style::default().fg(self.theme.error));
            frame.render_widget(msg, area);
            return;
        }

        let has_notice = self.session.state.notice().is_some();
        let [title_area, notice_area, main_area, status_area] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Length(u16::from(has_notice)),
            Constraint::Fill(1),
            Constraint::Length(1),
        ])
        .areas(area);

        self.render_title_bar(frame, title_area);
        if has_notice {
            self.render_notice_bar(frame, notice_area);
        }
        self.render_status_bar(frame, status_area);

        let (content_area, deps_area) = if self.show_dependencies {
            let [content, deps] =
                Layout::vertical([Constraint::Fill(1), Constraint::Length(10)]).areas(main_area);
            (content, Some(deps))
        } else {
            (main_area, None)
        };

        match self.session.state.filters.view {
            ViewMode::List => self.render_timeline(frame, content_area),
            ViewMode::Board => self.render_board(frame, content_area),
        }
        if let Some(deps_area) = deps_area {
            self.render_dependency_panel(frame, deps_area);
        }

        // Overlays
        if self.mode == InputMode::Search {
            self.render_search_overlay(frame, area);
        }
        if self.mode == InputMode::Link {
            self.render_link_overlay(frame, area);
        }
        if self.mode == InputMode::Help {
            self.render_help_overlay(frame, area);
        }
    }

    fn render_title_bar(&self, frame: &mut Frame, area: Rect) {
        let watcher_indicator = if self.no_watch || self.data_path.is_none() {
            Span::styled("○ STATIC", Style::default().fg(self.theme.text_secondary))
        } else {
            Span::styled("● WATCHING", Style::default().fg(self.theme.accent))
        };
        let loading = if self.loading { "  loading…" } else { "" };
        let heading = format!(" ◆ Event Timeline  {}{loading}", self.session.scope());

        let used = heading.chars().count() + self.clock.len() + 14;
        let padding = (area.width as usize).saturating_sub(used);

        let title = Line::from(vec![
            Span::styled(heading, Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(" ".repeat(padding)),
            Span::raw(&self.clock),
            Span::raw("  "),
            watcher_indicator,
            Span::raw(" "),
        ]);

        frame.render_widget(
            Paragraph::new(title).style(Style::default().bg(self.theme.bar_bg).fg(self.theme.text_on_bar)),
            area,
        );
    }

    fn render_notice_bar(&self, frame: &mut Frame, area: Rect) {
        let Some(notice) = self.session.state.notice() else {
            return;
        };
        let colour = match notice.disposition {
            Disposition::NotAllowed => self.theme.error,
            Disposition::Dismissible | Disposition::Gone => self.theme.warning,
        };
        let line = Line::from(Span::styled(
            format!(" ⚠ {}  (Esc to dismiss)", notice.message),
            Style::default().fg(self.theme.bar_bg),
        ));
        frame.render_widget(Paragraph::new(line).style(Style::default().bg(colour)), area);
    }

    fn render_status_bar(&self, frame: &mut Frame, area: Rect) {
        let filters = &self.session.state.filters;
        let bold = Style::default().add_modifier(Modifier::BOLD);

        let mut spans = vec![
            Span::styled(format!(" {}", filters.view.label()), bold),
            Span::raw(format!(" · {}", self.session.state.scale.label())),
            Span::raw(format!(" · Status: {}", filters.status_label())),
        ];
        if filters.overdue_only {
            spans.push(Span::raw(" · Overdue"));
        }
        if !filters.query.is_empty() {
            spans.push(Span::raw(format!(" · \"{}\"", filters.query)));
        }
        if !self.rows.unscheduled.is_empty() {
            spans.push(Span::raw(format!(" · {} unscheduled", self.rows.unscheduled.len())));
        }
        if let Some(age) = self.session.state.cache_age() {
            spans.push(Span::raw(format!(" · synced {}s ago", age.as_secs())));
        }
        spans.extend([
            Span::raw("  │ "),
            Span::styled("z", bold),
            Span::raw(" Scale  "),
            Span::styled("v", bold),
            Span::raw(" View  "),
            Span::styled("f", bold),
            Span::raw(" Filter  "),
            Span::styled("d", bold),
            Span::raw(" Deps  "),
            Span::styled("a", bold),
            Span::raw(" Link  "),
            Span::styled("?", bold),
            Span::raw(" Help  "),
            Span::styled("q", bold),
            Span::raw(" Quit"),
        ]);

        frame.render_widget(
            Paragraph::new(Line::from(spans))
                .style(Style::default().bg(self.theme.bar_bg).fg(self.theme.text_on_bar)),
            area,
        );
    }

    fn render_timeline(&mut self, frame: &mut Frame, area: Rect) {
        let block = Block::bordered()
            .border_style(Style::default().fg(self.theme.border))
            .title(format!(" Timeline · {} ", self.session.state.scale.label()));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let label_cols = ((self.config.label_pane_width / CELL_PX) as u16).min(inner.width / 3);
        let [left, right] =
            Layout::horizontal([Constraint::Length(label_cols), Constraint::Fill(1)]).areas(inner);
        let [corner, labels] =
            Layout::vertical([Constraint::Length(HEADER_ROWS), Constraint::Fill(1)]).areas(left);
        let [header, bars] =
            Layout::vertical([Constraint::Length(HEADER_ROWS), Constraint::Fill(1)]).areas(right);

        self.header_area = header;
        self.label_area = labels;
        self.bars_area = bars;
        self.sync_viewports(labels, bars);

        frame.render_widget(
            Paragraph::new(vec![
                Line::styled(" Task", Style::default().add_modifier(Modifier::BOLD)),
                Line::styled(
                    format!(" {} scheduled", self.rows.rows.len()),
                    Style::default().fg(self.theme.text_secondary),
                ),
            ]),
            corner,
        );
        self.render_header(frame, header);
        self.render_labels(frame, labels);
        self.render_bars(frame, bars);
    }

    fn render_header(&self, frame: &mut Frame, area: Rect) {
        let theme = self.theme;
        let offset = self.scroll.pane(PaneId::Header).offset_x;
        let width = area.width as usize;
        let today = today(Utc::now());

        let mut months = vec![' '; width];
        let mut days = vec![' '; width];
        let mut styles = vec![Style::default().fg(theme.text_secondary); width];
        let mut previous: Option<NaiveDate> = None;

        for col in 0..width {
            let left = offset + col as f32 * CELL_PX;
            if left >= self.grid.grid_width() {
                break;
            }
            let date = self.grid.day_at(left);
            if date == today {
                styles[col] = Style::default().fg(theme.today).add_modifier(Modifier::BOLD);
            } else if matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
                styles[col] = styles[col].bg(theme.weekend);
            }
            if previous == Some(date) {
                continue;
            }
            if previous.is_none() || date.day() == 1 {
                write_label(&mut months, col, &date.format("%b %Y").to_string());
            }
            let labelled = match self.grid.scale {
                Scale::Day => true,
                Scale::Week => date.weekday() == Weekday::Mon,
            };
            if labelled {
                write_label(&mut days, col, &date.day().to_string());
            }
            previous = Some(date);
        }

        let month_style = Style::default().fg(theme.text_primary).add_modifier(Modifier::BOLD);
        let lines = vec![
            Line::styled(months.into_iter().collect::<String>(), month_style),
            cells_to_line(&days, &styles),
        ];
        frame.render_widget(Paragraph::new(lines), area);
    }

    fn render_labels(&self, frame: &mut Frame, area: Rect) {
        let theme = self.theme;
        let first = (self.scroll.pane(PaneId::LeftBody).offset_y / ROW_HEIGHT) as usize;
        let text_width = (area.width as usize).saturating_sub(4);

        let lines: Vec<Line> = self
            .rows
            .rows
            .iter()
            .enumerate()
            .skip(first)
            .take(area.height as usize)
            .map(|(i, row)| {
                let selected = i == self.list_index && self.mode != InputMode::Search;
                let title_style = if selected {
                    Style::default().add_modifier(Modifier::REVERSED | Modifier::BOLD)
                } else {
                    Style::default().fg(theme.text_primary)
                };
                Line::from(vec![
                    Span::styled(" ● ", Style::default().fg(theme.status(row.status))),
                    Span::styled(truncate(&row.title, text_width), title_style),
                    Span::styled(
                        if row.overdue { "!" } else { " " },
                        Style::default().fg(theme.overdue).add_modifier(Modifier::BOLD),
                    ),
                ])
            })
            .collect();

        if lines.is_empty() {
            let msg = if self.loading { "Loading…" } else { "No scheduled tasks" };
            frame.render_widget(
                Paragraph::new(msg).style(Style::default().fg(theme.text_secondary)),
                area,
            );
            return;
        }
        frame.render_widget(Paragraph::new(lines), area);
    }

    fn render_bars(&self, frame: &mut Frame, area: Rect) {
        let theme = self.theme;
        let pane = self.scroll.pane(PaneId::RightBody);
        let first = (pane.offset_y / ROW_HEIGHT) as usize;
        let today_x = today_pos(&self.grid, today(Utc::now()));
        let grid_width = self.grid.grid_width();
        let width = area.width as usize;

        let mut lines = Vec::with_capacity(area.height as usize);
        for (i, row) in self.rows.rows.iter().enumerate().skip(first).take(area.height as usize) {
            let base = if i == self.list_index {
                Style::default().bg(theme.weekend)
            } else {
                Style::default()
            };
            let colour = if row.overdue {
                theme.overdue
            } else {
                theme.status(row.status)
            };

            let mut chars = Vec::with_capacity(width);
            let mut styles = Vec::with_capacity(width);
            for col in 0..width {
                let left = pane.offset_x + col as f32 * CELL_PX;
                if left >= grid_width {
                    chars.push(' ');
                    styles.push(Style::default());
                    continue;
                }
                match bar_glyph(&row.bar, row.progress_pct, left + CELL_PX / 2.0) {
                    Some(glyph) => {
                        chars.push(glyph);
                        styles.push(base.fg(colour));
                    }
                    None if today_x >= left && today_x < left + CELL_PX => {
                        chars.push('│');
                        styles.push(base.fg(theme.today));
                    }
                    None => {
                        chars.push(' ');
                        styles.push(base);
                    }
                }
            }
            lines.push(cells_to_line(&chars, &styles));
        }
        frame.render_widget(Paragraph::new(lines), area);
    }

    fn render_board(&mut self, frame: &mut Frame, area: Rect) {
        let theme = self.theme;
        let columns = self.session.state.board(Utc::now());
        self.header_area = Rect::default();
        self.label_area = Rect::default();
        self.bars_area = Rect::default();

        let areas = Layout::horizontal([Constraint::Ratio(1, 5); 5]).split(area);
        for (i, (column, column_area)) in columns.iter().zip(areas.iter()).enumerate() {
            let focused = i == self.board_column;
            let block = Block::bordered()
                .border_style(Style::default().fg(if focused { theme.accent } else { theme.border }))
                .title(Span::styled(
                    format!(" {} ({}) ", column.status.label(), column.tasks.len()),
                    Style::default()
                        .fg(theme.status(column.status))
                        .add_modifier(Modifier::BOLD),
                ));
            let inner = block.inner(*column_area);
            frame.render_widget(block, *column_area);

            let text_width = inner.width as usize;
            let mut lines: Vec<Line> = Vec::new();
            for (j, task) in column.tasks.iter().enumerate() {
                let selected = focused && j == self.board_row;
                let title_style = if selected {
                    Style::default().add_modifier(Modifier::REVERSED | Modifier::BOLD)
                } else {
                    Style::default().fg(theme.text_primary).add_modifier(Modifier::BOLD)
                };
                lines.push(Line::styled(truncate(&task.title, text_width), title_style));
                lines.push(Line::styled(
                    truncate(
                        &format!(
                            "{} · {}% · {}",
                            task.priority,
                            task.progress_pct,
                            self.session.state.members.assignee_label(task)
                        ),
                        text_width,
                    ),
                    Style::default().fg(theme.text_secondary),
                ));
                lines.push(Line::raw(""));
            }

            let scroll = if focused {
                let top = (self.board_row as u16).saturating_mul(BOARD_CARD_ROWS);
                top.saturating_sub(inner.height.saturating_sub(BOARD_CARD_ROWS))
            } else {
                0
            };
            frame.render_widget(Paragraph::new(lines).scroll((scroll, 0)), inner);
        }
    }

    fn render_dependency_panel(&self, frame: &mut Frame, area: Rect) {
        let theme = self.theme;
        let block = Block::bordered()
            .border_style(Style::default().fg(theme.border))
            .title(" Dependencies ");
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let selected = self.selected_task_id();
        let links = match (&selected, &self.dependencies) {
            (Some(id), Some((loaded, links))) if id == loaded => links,
            (Some(_), _) => {
                frame.render_widget(
                    Paragraph::new("Loading…").style(Style::default().fg(theme.text_secondary)),
                    inner,
                );
                return;
            }
            (None, _) => {
                frame.render_widget(
                    Paragraph::new("Select a task to see its dependencies")
                        .style(Style::default().fg(theme.text_secondary)),
                    inner,
                );
                return;
            }
        };

        if links.is_empty() {
            frame.render_widget(
                Paragraph::new("No dependencies").style(Style::default().fg(theme.text_secondary)),
                inner,
            );
            return;
        }

        let own_department = &self.session.scope().department_id;
        let mut lines: Vec<Line> = Vec::new();
        for (department, group) in links.by_department() {
            let heading = if &department == own_department {
                format!("{department} (this department)")
            } else {
                department.to_string()
            };
            lines.push(Line::styled(
                heading,
                Style::default().fg(theme.accent).add_modifier(Modifier::BOLD),
            ));
            for link in group.blockers {
                lines.push(Line::from(vec![
                    Span::styled("  ⟵ blocked by ", Style::default().fg(theme.warning)),
                    Span::raw(link.task.title.clone()),
                    Span::styled(
                        format!("  {} · {}", link.task.status.label(), link.relation.label()),
                        Style::default().fg(theme.text_secondary),
                    ),
                ]));
            }
            for link in group.dependents {
                lines.push(Line::from(vec![
                    Span::styled("  ⟶ blocks ", Style::default().fg(theme.accent)),
                    Span::raw(link.task.title.clone()),
                    Span::styled(
                        format!("  {}", link.task.status.label()),
                        Style::default().fg(theme.text_secondary),
                    ),
                ]));
            }
        }
        frame.render_widget(Paragraph::new(lines), inner);
    }

    fn render_search_overlay(&self, frame: &mut Frame, area: Rect) {
        let search_area = Rect {
            x: area.x + 1,
            y: area.y + 2,
            width: area.width.saturating_sub(2),
            height: 1,
        };

        frame.render_widget(Clear, search_area);

        let search_line = Line::from(vec![
            Span::styled(
                " / ",
                Style::default().fg(self.theme.accent).add_modifier(Modifier::BOLD),
            ),
            Span::raw(&self.session.state.filters.query),
            Span::styled("█", Style::default().fg(self.theme.accent)),
        ]);

        frame.render_widget(
            Paragraph::new(search_line)
                .style(Style::default().bg(self.theme.surface).fg(self.theme.text_primary)),
            search_area,
        );
    }

    fn render_link_overlay(&self, frame: &mut Frame, area: Rect) {
        let Some(editor) = &self.link else {
            return;
        };
        let theme = self.theme;
        let popup_area = centered_rect(70, 20, area);
        frame.render_widget(Clear, popup_area);

        let secondary = Style::default().fg(theme.text_secondary);
        let mut lines = vec![
            Line::from(vec![
                Span::styled(
                    format!(" {} ", editor.picker.department()),
                    Style::default().fg(theme.accent).add_modifier(Modifier::BOLD),
                ),
                Span::raw(editor.picker.query()),
                Span::styled("█", Style::default().fg(theme.accent)),
            ]),
            Line::raw(""),
        ];

        let results = editor.picker.results();
        let query = editor.picker.query().trim();
        if results.is_empty() {
            let hint = if editor.searching {
                "Searching…".to_string()
            } else if query.is_empty() {
                "No candidates".to_string()
            } else {
                format!("Enter: create \"{query}\" in {}", editor.picker.department())
            };
            lines.push(Line::styled(hint, secondary));
        }
        for (i, task) in results.iter().enumerate() {
            let style = if i == editor.highlight {
                Style::default().add_modifier(Modifier::REVERSED | Modifier::BOLD)
            } else {
                Style::default().fg(theme.text_primary)
            };
            lines.push(Line::from(vec![
                Span::styled(format!("  {}", task.title), style),
                Span::styled(format!("  {}", task.status.label()), secondary),
            ]));
        }

        lines.push(Line::raw(""));
        lines.push(Line::styled(
            format!("Blocked by ({})", editor.picker.selected().len()),
            Style::default().add_modifier(Modifier::BOLD),
        ));
        for task in editor.picker.selected() {
            lines.push(Line::from(vec![
                Span::styled("  ⟵ ", Style::default().fg(theme.warning)),
                Span::raw(task.title.clone()),
                Span::styled(format!("  {}", task.department_id), secondary),
            ]));
        }

        let picker = Paragraph::new(lines).block(
            Block::bordered()
                .title(format!(" Link blockers · {} ", truncate(&editor.title, 40)))
                .title_bottom(Line::styled(
                    " Enter select · Tab department · Ctrl+D drop last · Ctrl+S save · Esc cancel ",
                    secondary,
                ))
                .border_style(Style::default().fg(theme.accent))
                .style(Style::default().bg(theme.surface)),
        );
        frame.render_widget(picker, popup_area);
    }

    fn render_help_overlay(&self, frame: &mut Frame, area: Rect) {
        let popup_area = centered_rect(60, 25, area);
        frame.render_widget(Clear, popup_area);

        let help_text = vec![
            Line::styled("Keyboard Shortcuts", Style::default().add_modifier(Modifier::BOLD)),
            Line::raw(""),
            Line::raw("  ↑/k ↓/j   Select task / card"),
            Line::raw("  ←/h →/l   Scroll one day (board: change column)"),
            Line::raw("  H/L       Scroll one week"),
            Line::raw("  t         Center on today"),
            Line::raw("  z         Toggle Day / Week scale"),
            Line::raw("  v         Toggle Timeline / Board"),
            Line::raw("  < / >     Move card to previous / next status"),
            Line::raw("  f         Cycle status filter"),
            Line::raw("  o         Overdue only"),
            Line::raw("  c         Clear filters"),
            Line::raw("  /         Search titles"),
            Line::raw("  d         Toggle dependency panel"),
            Line::raw("  a         Edit blockers of the selected task"),
            Line::raw("  r         Reload"),
            Line::raw("  T         Cycle theme"),
            Line::raw("  Esc       Dismiss message / close"),
            Line::raw("  ?         Toggle this help"),
            Line::raw("  q         Quit"),
            Line::raw(""),
            Line::styled(
                "Press any key to close",
                Style::default().fg(self.theme.text_secondary),
            ),
        ];

        let help = Paragraph::new(help_text).block(
            Block::bordered()
                .title(" Help ")
                .border_style(Style::default().fg(self.theme.accent))
                .style(Style::default().bg(self.theme.surface)),
        );

        frame.render_widget(help, popup_area);
    }
}

// ─────────────────────────────────────────────────────────
// Standalone helper functions
// ─────────────────────────────────────────────────────────

/// Glyph for a timeline cell whose centre sits at `px`: solid for the
/// completed share of the bar, shaded for the rest.
fn bar_glyph(bar: &Bar, progress_pct: u8, px: f32) -> Option<char> {
    if px < bar.left || px >= bar.right() {
        return None;
    }
    let done_edge = bar.left + bar.width * f32::from(progress_pct.min(100)) / 100.0;
    Some(if px < done_edge { '█' } else { '░' })
}

fn write_label(buf: &mut [char], col: usize, label: &str) {
    for (i, ch) in label.chars().enumerate() {
        match buf.get_mut(col + i) {
            Some(slot) => *slot = ch,
            None => break,
        }
    }
}

/// Collapse per-cell styles into runs.
fn cells_to_line(chars: &[char], styles: &[Style]) -> Line<'static> {
    let mut spans = Vec::new();
    let mut run = String::new();
    let mut current: Option<Style> = None;
    for (ch, style) in chars.iter().zip(styles) {
        if current.is_some_and(|s| s != *style) {
            spans.push(Span::styled(std::mem::take(&mut run), current.unwrap_or_default()));
        }
        current = Some(*style);
        run.push(*ch);
    }
    if let Some(style) = current {
        spans.push(Span::styled(run, style));
    }
    Line::from(spans)
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut out: String = text.chars().take(width.saturating_sub(1)).collect();
    out.push('…');
    out
}

fn centered_rect(percent_x: u16, height: u16, r: Rect) -> Rect {
    let popup_layout = Layout::vertical([
        Constraint::Fill(1),
        Constraint::Length(height),
        Constraint::Fill(1),
    ])
    .split(r);

    Layout::horizontal([
        Constraint::Percentage((100 - percent_x) / 2),
        Constraint::Percentage(percent_x),
        Constraint::Percentage((100 - percent_x) / 2),
    ])
    .split(popup_layout[1])[1]
}
