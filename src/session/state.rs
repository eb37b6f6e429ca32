//! Page state: the explicit container for scope, filters, scale and the
//! loaded task list. Created per page visit and passed around; nothing
//! here is global.

use chrono::{DateTime, NaiveDate, Utc};
use tracing::debug;

use super::cache::{LoadKey, ResponseCache};
use crate::backend::{BackendError, Disposition, TaskQuery};
use crate::model::{AssigneeDirectory, FilterState, Scale, Scope, Task, TaskId};
use crate::projection::{self, BoardColumn};
use crate::timeline::{DateGrid, GridConfig, TimelineRows};

/// A message for the user, classified by how it should be shown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub message: String,
    pub disposition: Disposition,
}

impl Notice {
    pub fn from_error(context: &str, error: &BackendError) -> Self {
        let message = match error.disposition() {
            Disposition::NotAllowed => format!("{context}: not allowed"),
            _ => format!("{context}: {error}"),
        };
        Self {
            message,
            disposition: error.disposition(),
        }
    }
}

/// What happened to a finished load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    Applied(usize),
    /// The page moved on to other parameters; cached but not shown.
    Stale,
    Failed,
}

#[derive(Debug)]
pub struct PageState {
    scope: Scope,
    pub filters: FilterState,
    pub scale: Scale,
    tasks: Vec<Task>,
    cache: ResponseCache,
    pub members: AssigneeDirectory,
    notice: Option<Notice>,
}

impl PageState {
    pub fn new(scope: Scope) -> Self {
        Self {
            scope,
            filters: FilterState::default(),
            scale: Scale::Day,
            tasks: Vec::new(),
            cache: ResponseCache::new(),
            members: AssigneeDirectory::default(),
            notice: None,
        }
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    /// Move to another event/department. The visible list switches to the
    /// cached response for the new key if there is one.
    pub fn set_scope(&mut self, scope: Scope) {
        if scope == self.scope {
            return;
        }
        self.scope = scope;
        self.show_cached();
    }

    /// The key a load issued right now would carry.
    pub fn request_key(&self) -> LoadKey {
        LoadKey {
            scope: self.scope.clone(),
            query: TaskQuery {
                assignee_id: self.filters.assignee.clone(),
                zone_id: self.filters.zone.zone_id().cloned(),
                zonal_row_id: self.filters.zone.zonal_row_id().cloned(),
            },
        }
    }

    /// Show whatever is cached for the current key. Returns false (and
    /// clears the list) when nothing is cached.
    pub fn show_cached(&mut self) -> bool {
        match self.cache.get(&self.request_key()) {
            Some(tasks) => {
                self.tasks = tasks.to_vec();
                true
            }
            None => {
                self.tasks.clear();
                false
            }
        }
    }

    /// Record a finished load. Always cached under its own key; only shown
    /// if that key is still the current one.
    pub fn apply_loaded(&mut self, key: LoadKey, result: Result<Vec<Task>, BackendError>) -> LoadOutcome {
        let tasks = match result {
            Ok(tasks) => tasks,
            Err(e) => {
                if key == self.request_key() {
                    self.notice = Some(Notice::from_error("Loading tasks failed", &e));
                }
                debug!(scope = %key.scope, error = %e, "task load failed");
                return LoadOutcome::Failed;
            }
        };

        let current = key == self.request_key();
        self.cache.insert(key.clone(), tasks.clone());
        if !current {
            debug!(scope = %key.scope, "discarding stale task list");
            return LoadOutcome::Stale;
        }
        let count = tasks.len();
        self.tasks = tasks;
        LoadOutcome::Applied(count)
    }

    /// Age of the cached list behind the current view, if there is one.
    pub fn cache_age(&self) -> Option<std::time::Duration> {
        self.cache.age(&self.request_key())
    }

    /// Forget cached responses for the current scope (after a change
    /// notification), keeping the visible list until the reload lands.
    pub fn invalidate(&mut self) {
        self.cache.invalidate_scope(&self.scope);
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn task(&self, id: &TaskId) -> Option<&Task> {
        self.tasks.iter().find(|t| &t.id == id)
    }

    pub fn task_mut(&mut self, id: &TaskId) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|t| &t.id == id)
    }

    pub fn replace_task(&mut self, task: Task) {
        match self.task_mut(&task.id) {
            Some(slot) => *slot = task,
            None => self.tasks.push(task),
        }
    }

    pub fn remove_task(&mut self, id: &TaskId) -> Option<Task> {
        let pos = self.tasks.iter().position(|t| &t.id == id)?;
        Some(self.tasks.remove(pos))
    }

    pub fn visible(&self, now: DateTime<Utc>) -> Vec<Task> {
        projection::project(&self.tasks, &self.filters, now)
    }

    pub fn board(&self, now: DateTime<Utc>) -> Vec<BoardColumn> {
        projection::board_columns(&self.visible(now))
    }

    /// Grid over the visible tasks; filters apply before geometry.
    pub fn grid(&self, now: DateTime<Utc>, config: &GridConfig) -> DateGrid {
        DateGrid::build(&self.visible(now), self.scale, today(now), config)
    }

    pub fn rows(&self, grid: &DateGrid, now: DateTime<Utc>) -> TimelineRows {
        TimelineRows::build(&self.visible(now), grid, now)
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn set_notice(&mut self, notice: Notice) {
        self.notice = Some(notice);
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }
}

pub fn today(now: DateTime<Utc>) -> NaiveDate {
    now.date_naive()
}
