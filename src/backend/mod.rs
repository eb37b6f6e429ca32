//! The request/response seam to the task backend.
//!
//! The core only ever talks to the backend through [`TaskBackend`]. The
//! in-memory implementation backs the binaries and the test-suite.

pub mod error;
pub mod fixture;
pub mod memory;

use async_trait::async_trait;

use crate::model::{
    DependencyLinks, DepartmentId, Member, Scope, StatusChange, StatusChangeResult, Task, TaskDraft, TaskId,
    TaskPatch, UserId, ZonalRowId, ZoneId,
};

pub use error::{BackendError, Disposition, Operation};
pub use fixture::{Fixture, FixtureError};
pub use memory::{BackendCall, MemoryBackend};

/// Optional narrowing for `list_tasks`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct TaskQuery {
    pub assignee_id: Option<UserId>,
    pub zone_id: Option<ZoneId>,
    pub zonal_row_id: Option<ZonalRowId>,
}

pub type BackendResult<T> = Result<T, BackendError>;

#[async_trait]
pub trait TaskBackend: Send + Sync {
    async fn list_tasks(&self, scope: &Scope, query: &TaskQuery) -> BackendResult<Vec<Task>>;

    async fn create_task(&self, scope: &Scope, draft: TaskDraft) -> BackendResult<Task>;

    async fn update_task(&self, scope: &Scope, task_id: &TaskId, patch: TaskPatch)
        -> BackendResult<Task>;

    async fn change_status(
        &self,
        scope: &Scope,
        task_id: &TaskId,
        change: StatusChange,
    ) -> BackendResult<StatusChangeResult>;

    async fn delete_task(&self, scope: &Scope, task_id: &TaskId) -> BackendResult<()>;

    async fn list_dependencies(&self, scope: &Scope, task_id: &TaskId)
        -> BackendResult<DependencyLinks>;

    /// Create the edge `blocker_id → task_id`.
    async fn add_dependency(
        &self,
        scope: &Scope,
        task_id: &TaskId,
        blocker_id: &TaskId,
    ) -> BackendResult<()>;

    async fn remove_dependency(
        &self,
        scope: &Scope,
        task_id: &TaskId,
        blocker_id: &TaskId,
    ) -> BackendResult<()>;

    /// Tasks of `target_department` whose title matches `title_query`.
    async fn search_tasks(
        &self,
        scope: &Scope,
        title_query: &str,
        target_department: &DepartmentId,
    ) -> BackendResult<Vec<Task>>;

    async fn list_department_members(&self, scope: &Scope) -> BackendResult<Vec<Member>>;
}
