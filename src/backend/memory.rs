//! In-memory backend.
//!
//! Serves a [`Fixture`], records every call, and can be told to fail a
//! given operation. Mutations optionally publish on a [`ChangeBus`] the
//! way the real server pushes change notifications.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};

use super::{BackendError, BackendResult, Fixture, Operation, TaskBackend, TaskQuery};
use crate::bus::ChangeBus;
use crate::model::{
    DepartmentId, DependencyEdge, DependencyLink, DependencyLinks, EventId, Member, Scope,
    StatusChange, StatusChangeResult, Task, TaskDraft, TaskId, TaskPatch, UserId,
};

/// Maximum number of search candidates returned.
const SEARCH_LIMIT: usize = 25;

/// One recorded request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendCall {
    pub operation: Operation,
    pub scope: Scope,
    pub task_id: Option<TaskId>,
    pub blocker_id: Option<TaskId>,
}

#[derive(Debug, Default)]
struct MemoryState {
    event_id: EventId,
    tasks: BTreeMap<TaskId, Task>,
    edges: Vec<DependencyEdge>,
    members: HashMap<DepartmentId, Vec<Member>>,
}

impl MemoryState {
    fn from_fixture(fixture: Fixture) -> Self {
        Self {
            event_id: fixture.event_id,
            tasks: fixture
                .tasks
                .into_iter()
                .map(|t| (t.id.clone(), t))
                .collect(),
            edges: fixture.dependencies,
            members: fixture.members,
        }
    }

    fn task(&self, id: &TaskId) -> BackendResult<&Task> {
        self.tasks
            .get(id)
            .ok_or_else(|| BackendError::not_found("task", id))
    }

    fn task_mut(&mut self, id: &TaskId) -> BackendResult<&mut Task> {
        self.tasks
            .get_mut(id)
            .ok_or_else(|| BackendError::not_found("task", id))
    }
}

pub struct MemoryBackend {
    state: RwLock<MemoryState>,
    calls: Mutex<Vec<BackendCall>>,
    faults: Mutex<HashMap<Operation, VecDeque<BackendError>>>,
    bus: Option<ChangeBus>,
    actor: UserId,
    next_id: AtomicU64,
}

impl MemoryBackend {
    pub fn new(fixture: Fixture) -> Self {
        Self {
            state: RwLock::new(MemoryState::from_fixture(fixture)),
            calls: Mutex::new(Vec::new()),
            faults: Mutex::new(HashMap::new()),
            bus: None,
            actor: UserId::new("local"),
            next_id: AtomicU64::new(1),
        }
    }

    /// Publish "tasks changed" on `bus` after every mutation.
    pub fn with_bus(mut self, bus: ChangeBus) -> Self {
        self.bus = Some(bus);
        self
    }

    /// The user recorded as creator of new tasks.
    pub fn with_actor(mut self, actor: UserId) -> Self {
        self.actor = actor;
        self
    }

    /// Swap in new data, e.g. after the fixture file changed on disk.
    /// Recorded calls and queued faults are kept.
    pub async fn replace(&self, fixture: Fixture) {
        let mut state = self.state.write().await;
        *state = MemoryState::from_fixture(fixture);
        info!(tasks = state.tasks.len(), "backend data replaced");
    }

    /// Make the next call of `operation` fail with `error`. Faults queue up.
    pub async fn fail_next(&self, operation: Operation, error: BackendError) {
        self.faults
            .lock()
            .await
            .entry(operation)
            .or_default()
            .push_back(error);
    }

    pub async fn calls(&self) -> Vec<BackendCall> {
        self.calls.lock().await.clone()
    }

    pub async fn calls_of(&self, operation: Operation) -> Vec<BackendCall> {
        self.calls
            .lock()
            .await
            .iter()
            .filter(|c| c.operation == operation)
            .cloned()
            .collect()
    }

    /// Current blocker ids of a task, straight from storage.
    pub async fn blocker_ids(&self, task_id: &TaskId) -> Vec<TaskId> {
        let state = self.state.read().await;
        let mut ids: Vec<TaskId> = state
            .edges
            .iter()
            .filter(|e| &e.blocked_id == task_id)
            .map(|e| e.blocker_id.clone())
            .collect();
        ids.sort();
        ids
    }

    pub async fn edges(&self) -> Vec<DependencyEdge> {
        self.state.read().await.edges.clone()
    }

    pub async fn task(&self, task_id: &TaskId) -> Option<Task> {
        self.state.read().await.tasks.get(task_id).cloned()
    }

    /// Record the call, then either pop a queued fault or check the event.
    async fn begin(
        &self,
        operation: Operation,
        scope: &Scope,
        task_id: Option<&TaskId>,
        blocker_id: Option<&TaskId>,
    ) -> BackendResult<()> {
        self.calls.lock().await.push(BackendCall {
            operation,
            scope: scope.clone(),
            task_id: task_id.cloned(),
            blocker_id: blocker_id.cloned(),
        });

        if let Some(error) = self
            .faults
            .lock()
            .await
            .get_mut(&operation)
            .and_then(VecDeque::pop_front)
        {
            debug!(%operation, %error, "injected failure");
            return Err(error);
        }

        let state = self.state.read().await;
        if state.event_id != scope.event_id {
            return Err(BackendError::not_found("event", &scope.event_id));
        }
        Ok(())
    }

    fn notify(&self, scope: &Scope) {
        if let Some(bus) = &self.bus {
            bus.publish(scope.clone());
        }
    }

    fn mint_id(&self) -> TaskId {
        let n = self.next_id.fetch_add(1, Ordering::Relaxed);
        TaskId::new(format!("task-new-{n}"))
    }
}

#[async_trait]
impl TaskBackend for MemoryBackend {
    async fn list_tasks(&self, scope: &Scope, query: &TaskQuery) -> BackendResult<Vec<Task>> {
        self.begin(Operation::ListTasks, scope, None, None).await?;
        let state = self.state.read().await;
        Ok(state
            .tasks
            .values()
            .filter(|t| t.department_id == scope.department_id)
            .filter(|t| {
                query
                    .assignee_id
                    .as_ref()
                    .map_or(true, |a| t.assignee_id.as_ref() == Some(a))
            })
            .filter(|t| query.zone_id.as_ref().map_or(true, |z| t.zone_id.as_ref() == Some(z)))
            .filter(|t| {
                query
                    .zonal_row_id
                    .as_ref()
                    .map_or(true, |r| t.zonal_department_row_id.as_ref() == Some(r))
            })
            .cloned()
            .collect())
    }

    async fn create_task(&self, scope: &Scope, draft: TaskDraft) -> BackendResult<Task> {
        self.begin(Operation::CreateTask, scope, None, None).await?;
        if draft.title.trim().is_empty() {
            return Err(BackendError::Invalid("title must not be empty".into()));
        }
        let task = Task::from_draft(
            self.mint_id(),
            scope.department_id.clone(),
            self.actor.clone(),
            draft,
            Utc::now(),
        );
        self.state
            .write()
            .await
            .tasks
            .insert(task.id.clone(), task.clone());
        debug!(task_id = %task.id, department = %scope.department_id, "task created");
        self.notify(scope);
        Ok(task)
    }

    async fn update_task(
        &self,
        scope: &Scope,
        task_id: &TaskId,
        patch: TaskPatch,
    ) -> BackendResult<Task> {
        self.begin(Operation::UpdateTask, scope, Some(task_id), None)
            .await?;
        let updated = {
            let mut state = self.state.write().await;
            let task = state.task_mut(task_id)?;
            task.apply_patch(&patch);
            task.updated_at = Utc::now();
            task.clone()
        };
        self.notify(scope);
        Ok(updated)
    }

    async fn change_status(
        &self,
        scope: &Scope,
        task_id: &TaskId,
        change: StatusChange,
    ) -> BackendResult<StatusChangeResult> {
        self.begin(Operation::ChangeStatus, scope, Some(task_id), None)
            .await?;
        let result = {
            let mut state = self.state.write().await;
            let task = state.task_mut(task_id)?;
            task.status = change.status;
            if let Some(pct) = change.progress_pct {
                task.progress_pct = pct.min(100);
            }
            task.updated_at = Utc::now();
            StatusChangeResult {
                status: task.status,
                progress_pct: task.progress_pct,
            }
        };
        self.notify(scope);
        Ok(result)
    }

    async fn delete_task(&self, scope: &Scope, task_id: &TaskId) -> BackendResult<()> {
        self.begin(Operation::DeleteTask, scope, Some(task_id), None)
            .await?;
        {
            let mut state = self.state.write().await;
            if state.tasks.remove(task_id).is_none() {
                return Err(BackendError::not_found("task", task_id));
            }
            state
                .edges
                .retain(|e| &e.blocker_id != task_id && &e.blocked_id != task_id);
        }
        self.notify(scope);
        Ok(())
    }

    async fn list_dependencies(
        &self,
        scope: &Scope,
        task_id: &TaskId,
    ) -> BackendResult<DependencyLinks> {
        self.begin(Operation::ListDependencies, scope, Some(task_id), None)
            .await?;
        let state = self.state.read().await;
        state.task(task_id)?;

        let link = |id: &TaskId, edge: &DependencyEdge| {
            state.tasks.get(id).map(|task| DependencyLink {
                task: task.clone(),
                relation: edge.relation,
            })
        };
        let blockers = state
            .edges
            .iter()
            .filter(|e| &e.blocked_id == task_id)
            .filter_map(|e| link(&e.blocker_id, e))
            .collect();
        let dependents = state
            .edges
            .iter()
            .filter(|e| &e.blocker_id == task_id)
            .filter_map(|e| link(&e.blocked_id, e))
            .collect();

        Ok(DependencyLinks {
            blockers,
            dependents,
        })
    }

    async fn add_dependency(
        &self,
        scope: &Scope,
        task_id: &TaskId,
        blocker_id: &TaskId,
    ) -> BackendResult<()> {
        self.begin(Operation::AddDependency, scope, Some(task_id), Some(blocker_id))
            .await?;
        {
            let mut state = self.state.write().await;
            state.task(task_id)?;
            state.task(blocker_id)?;
            if task_id == blocker_id {
                return Err(BackendError::Invalid("a task cannot block itself".into()));
            }
            let exists = state
                .edges
                .iter()
                .any(|e| &e.blocked_id == task_id && &e.blocker_id == blocker_id);
            if exists {
                return Ok(());
            }
            state
                .edges
                .push(DependencyEdge::new(blocker_id.clone(), task_id.clone()));
        }
        self.notify(scope);
        Ok(())
    }

    async fn remove_dependency(
        &self,
        scope: &Scope,
        task_id: &TaskId,
        blocker_id: &TaskId,
    ) -> BackendResult<()> {
        self.begin(
            Operation::RemoveDependency,
            scope,
            Some(task_id),
            Some(blocker_id),
        )
        .await?;
        let removed = {
            let mut state = self.state.write().await;
            let before = state.edges.len();
            state
                .edges
                .retain(|e| !(&e.blocked_id == task_id && &e.blocker_id == blocker_id));
            before != state.edges.len()
        };
        if removed {
            self.notify(scope);
        }
        Ok(())
    }

    async fn search_tasks(
        &self,
        scope: &Scope,
        title_query: &str,
        target_department: &DepartmentId,
    ) -> BackendResult<Vec<Task>> {
        self.begin(Operation::SearchTasks, scope, None, None).await?;
        let needle = title_query.trim().to_lowercase();
        let state = self.state.read().await;
        Ok(state
            .tasks
            .values()
            .filter(|t| &t.department_id == target_department)
            .filter(|t| needle.is_empty() || t.title.to_lowercase().contains(&needle))
            .take(SEARCH_LIMIT)
            .cloned()
            .collect())
    }

    async fn list_department_members(&self, scope: &Scope) -> BackendResult<Vec<Member>> {
        self.begin(Operation::ListMembers, scope, None, None).await?;
        let state = self.state.read().await;
        Ok(state
            .members
            .get(&scope.department_id)
            .cloned()
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend() -> MemoryBackend {
        let task = |id: &str, dept: &str| Task {
            id: TaskId::new(id),
            department_id: DepartmentId::new(dept),
            title: format!("Task {id}"),
            ..Task::default()
        };
        MemoryBackend::new(Fixture {
            event_id: EventId::new("fest"),
            tasks: vec![task("a", "stage"), task("b", "stage"), task("c", "catering")],
            dependencies: vec![DependencyEdge::new(TaskId::new("a"), TaskId::new("b"))],
            members: HashMap::new(),
        })
    }

    #[tokio::test]
    async fn test_duplicate_add_is_idempotent() {
        let backend = backend();
        let scope = Scope::new("fest", "stage");
        let (b, a) = (TaskId::new("b"), TaskId::new("a"));
        backend.add_dependency(&scope, &b, &a).await.unwrap();
        assert_eq!(backend.edges().await.len(), 1);
    }

    #[tokio::test]
    async fn test_removing_missing_edge_is_ok() {
        let backend = backend();
        let scope = Scope::new("fest", "stage");
        let (b, c) = (TaskId::new("b"), TaskId::new("c"));
        backend.remove_dependency(&scope, &b, &c).await.unwrap();
        assert_eq!(backend.edges().await.len(), 1);
    }

    #[tokio::test]
    async fn test_wrong_event_is_not_found() {
        let backend = backend();
        let err = backend
            .list_tasks(&Scope::new("other", "stage"), &TaskQuery::default())
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::NotFound { entity: "event", .. }));
    }

    #[tokio::test]
    async fn test_injected_fault_fires_once() {
        let backend = backend();
        let scope = Scope::new("fest", "stage");
        backend
            .fail_next(Operation::ListTasks, BackendError::Transport("offline".into()))
            .await;
        assert!(backend.list_tasks(&scope, &TaskQuery::default()).await.is_err());
        let tasks = backend.list_tasks(&scope, &TaskQuery::default()).await.unwrap();
        assert_eq!(tasks.len(), 2);
        assert_eq!(backend.calls_of(Operation::ListTasks).await.len(), 2);
    }

    #[tokio::test]
    async fn test_delete_drops_edges() {
        let backend = backend();
        let scope = Scope::new("fest", "stage");
        backend.delete_task(&scope, &TaskId::new("a")).await.unwrap();
        assert!(backend.edges().await.is_empty());
    }
}
