//! Timeline session: drives loads and edits for one page visit.

pub mod cache;
pub mod state;

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::backend::{BackendError, BackendResult, Disposition, TaskBackend};
use crate::bus::TasksChanged;
use crate::graph::{DependencyStore, LinkResolver};
use crate::model::{AssigneeDirectory, Scope, StatusChange, Task, TaskId, TaskPatch, TaskStatus};

pub use cache::{LoadKey, ResponseCache};
pub use state::{today, LoadOutcome, Notice, PageState};

/// Board move direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shift {
    Left,
    Right,
}

/// Run one `list_tasks` request. Free-standing so it can be spawned while
/// the page keeps changing; the result goes back through
/// [`PageState::apply_loaded`].
pub async fn fetch_tasks<B>(backend: Arc<B>, key: LoadKey) -> (LoadKey, BackendResult<Vec<Task>>)
where
    B: TaskBackend + ?Sized,
{
    let result = backend.list_tasks(&key.scope, &key.query).await;
    (key, result)
}

pub struct TimelineSession<B: ?Sized> {
    backend: Arc<B>,
    pub state: PageState,
    pub dependencies: DependencyStore<B>,
    pub resolver: LinkResolver<B>,
}

impl<B: TaskBackend + ?Sized> TimelineSession<B> {
    pub fn new(backend: Arc<B>, scope: Scope) -> Self {
        Self {
            dependencies: DependencyStore::new(Arc::clone(&backend), scope.clone()),
            resolver: LinkResolver::new(Arc::clone(&backend), scope.clone()),
            state: PageState::new(scope),
            backend,
        }
    }

    pub fn backend(&self) -> &Arc<B> {
        &self.backend
    }

    pub fn scope(&self) -> &Scope {
        self.state.scope()
    }

    pub fn set_scope(&mut self, scope: Scope) {
        self.dependencies.set_scope(scope.clone());
        self.resolver = LinkResolver::new(Arc::clone(&self.backend), scope.clone());
        self.state.set_scope(scope);
    }

    /// Fetch and apply the task list for the current parameters.
    pub async fn load(&mut self) -> LoadOutcome {
        let key = self.state.request_key();
        let (key, result) = fetch_tasks(Arc::clone(&self.backend), key).await;
        let outcome = self.state.apply_loaded(key, result);
        debug!(scope = %self.state.scope(), ?outcome, "load finished");
        outcome
    }

    /// Assignee names are a lookup table only; failure keeps raw ids.
    pub async fn load_members(&mut self) {
        match self.backend.list_department_members(self.state.scope()).await {
            Ok(members) => self.state.members = AssigneeDirectory::from_members(&members),
            Err(e) => warn!(error = %e, "could not load department members"),
        }
    }

    /// Reload when a change notification matches this page's scope.
    pub async fn on_tasks_changed(&mut self, change: &TasksChanged) -> Option<LoadOutcome> {
        if &change.scope != self.state.scope() {
            return None;
        }
        info!(scope = %change.scope, "tasks changed, reloading");
        self.state.invalidate();
        self.dependencies.clear();
        Some(self.load().await)
    }

    /// Change a task's status optimistically. On failure the previous
    /// status and progress are restored, or the row is dropped if the task
    /// no longer exists.
    pub async fn change_status(&mut self, task_id: &TaskId, change: StatusChange) -> BackendResult<()> {
        let Some(task) = self.state.task_mut(task_id) else {
            return Err(BackendError::not_found("task", task_id));
        };
        let previous = (task.status, task.progress_pct);
        task.status = change.status;
        if let Some(pct) = change.progress_pct {
            task.progress_pct = pct;
        }

        let scope = self.state.scope().clone();
        match self.backend.change_status(&scope, task_id, change).await {
            Ok(result) => {
                if let Some(task) = self.state.task_mut(task_id) {
                    task.status = result.status;
                    task.progress_pct = result.progress_pct;
                }
                Ok(())
            }
            Err(e) => {
                self.recover(task_id, "Changing status failed", &e, |task| {
                    task.status = previous.0;
                    task.progress_pct = previous.1;
                });
                Err(e)
            }
        }
    }

    /// Move a card one column on the board. The only write the board does.
    pub async fn move_card(&mut self, task_id: &TaskId, shift: Shift) -> BackendResult<Option<TaskStatus>> {
        let Some(task) = self.state.task(task_id) else {
            return Err(BackendError::not_found("task", task_id));
        };
        let target = match shift {
            Shift::Left => task.status.prev(),
            Shift::Right => task.status.next(),
        };
        if target == task.status {
            return Ok(None);
        }
        self.change_status(task_id, StatusChange::board_move(target))
            .await
            .map(|()| Some(target))
    }

    pub async fn update_task(&mut self, task_id: &TaskId, patch: TaskPatch) -> BackendResult<Task> {
        let scope = self.state.scope().clone();
        match self.backend.update_task(&scope, task_id, patch).await {
            Ok(task) => {
                self.state.replace_task(task.clone());
                Ok(task)
            }
            Err(e) => {
                self.recover(task_id, "Saving task failed", &e, |_| {});
                Err(e)
            }
        }
    }

    pub async fn delete_task(&mut self, task_id: &TaskId) -> BackendResult<()> {
        let scope = self.state.scope().clone();
        match self.backend.delete_task(&scope, task_id).await {
            Ok(()) => {
                self.state.remove_task(task_id);
                self.dependencies.invalidate(task_id);
                Ok(())
            }
            Err(e) => {
                self.recover(task_id, "Deleting task failed", &e, |_| {});
                Err(e)
            }
        }
    }

    /// Shared failure handling: not-found drops the row, anything else
    /// runs `rollback` on the local copy. Either way a notice is raised.
    fn recover(&mut self, task_id: &TaskId, context: &str, error: &BackendError, rollback: impl FnOnce(&mut Task)) {
        warn!(task_id = %task_id, error = %error, "{context}");
        match error.disposition() {
            Disposition::Gone => {
                self.state.remove_task(task_id);
                self.dependencies.invalidate(task_id);
            }
            Disposition::NotAllowed | Disposition::Dismissible => {
                if let Some(task) = self.state.task_mut(task_id) {
                    rollback(task);
                }
            }
        }
        self.state.set_notice(Notice::from_error(context, error));
    }
}
