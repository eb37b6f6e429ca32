//! Search-to-link and create-to-link flows for dependencies.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, warn};

use super::store::DependencyStore;
use crate::backend::{BackendError, BackendResult, TaskBackend};
use crate::debounce::Debouncer;
use crate::model::{DepartmentId, DependencyLinks, Scope, Task, TaskDraft, TaskId};

#[derive(thiserror::Error, Debug)]
pub enum LinkError {
    #[error("could not create task: {0}")]
    Create(#[source] BackendError),

    /// The task exists but has no link. It is not rolled back.
    #[error("task was created but could not be linked: {source}")]
    Link { orphan: Task, source: BackendError },
}

// ---------------------------------------------------------------------------
// Exclusions — what a search must never offer
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Exclusions {
    pub editing: Option<TaskId>,
    pub linked: HashSet<TaskId>,
}

impl Exclusions {
    /// The edited task plus everything already linked to it either way.
    pub fn for_task(editing: &TaskId, links: &DependencyLinks) -> Self {
        Self {
            editing: Some(editing.clone()),
            linked: links.linked_ids(),
        }
    }

    pub fn excludes(&self, id: &TaskId) -> bool {
        self.editing.as_ref() == Some(id) || self.linked.contains(id)
    }
}

// ---------------------------------------------------------------------------
// LinkResolver
// ---------------------------------------------------------------------------

pub struct LinkResolver<B: ?Sized> {
    backend: Arc<B>,
    scope: Scope,
}

impl<B: TaskBackend + ?Sized> LinkResolver<B> {
    pub fn new(backend: Arc<B>, scope: Scope) -> Self {
        Self { backend, scope }
    }

    /// Candidates from `target_department` matching `title_query`. Not
    /// debounced here; callers wait for typing to settle.
    pub async fn search(
        &self,
        title_query: &str,
        target_department: &DepartmentId,
        exclusions: &Exclusions,
    ) -> BackendResult<Vec<Task>> {
        let found = self
            .backend
            .search_tasks(&self.scope, title_query, target_department)
            .await?;
        let total = found.len();
        let candidates: Vec<Task> = found
            .into_iter()
            .filter(|t| !exclusions.excludes(&t.id))
            .collect();
        debug!(
            query = title_query,
            department = %target_department,
            total,
            offered = candidates.len(),
            "link search"
        );
        Ok(candidates)
    }

    /// Create a task in `target_department`, then make it a blocker of
    /// `current`. Two calls; a failed link leaves the new task orphaned.
    pub async fn create_and_link(
        &self,
        store: &mut DependencyStore<B>,
        current: &TaskId,
        title: &str,
        target_department: &DepartmentId,
    ) -> Result<Task, LinkError> {
        let create_scope = self.scope.with_department(target_department.clone());
        let created = self
            .backend
            .create_task(&create_scope, TaskDraft::titled(title))
            .await
            .map_err(LinkError::Create)?;

        match store.add(current, &created.id).await {
            Ok(()) => Ok(created),
            Err(source) => {
                warn!(task_id = %created.id, current = %current, error = %source, "created task left unlinked");
                Err(LinkError::Link {
                    orphan: created,
                    source,
                })
            }
        }
    }
}

/// Wait for typing to settle, then run the search for `request`. `None`
/// when a newer keystroke superseded this one. Free-standing so it can be
/// spawned; results go back through [`LinkPicker::accept`].
pub async fn fetch_candidates<B>(
    backend: Arc<B>,
    scope: Scope,
    debouncer: Debouncer,
    request: SearchRequest,
) -> Option<(SearchRequest, BackendResult<Vec<Task>>)>
where
    B: TaskBackend + ?Sized,
{
    if !debouncer.settle().await {
        return None;
    }
    let result = backend
        .search_tasks(&scope, &request.query, &request.department)
        .await;
    Some((request, result))
}

// ---------------------------------------------------------------------------
// LinkPicker — UI state of the search box
// ---------------------------------------------------------------------------

/// The (query, department) pair a search was issued for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub query: String,
    pub department: DepartmentId,
}

#[derive(Debug, Clone)]
pub struct LinkPicker {
    exclusions: Exclusions,
    query: String,
    department: DepartmentId,
    results: Vec<Task>,
    selected: Vec<Task>,
}

impl LinkPicker {
    pub fn new(exclusions: Exclusions, department: DepartmentId) -> Self {
        Self {
            exclusions,
            query: String::new(),
            department,
            results: Vec::new(),
            selected: Vec::new(),
        }
    }

    /// Start with `selected` already picked, e.g. the current blockers.
    pub fn with_selected(mut self, selected: Vec<Task>) -> Self {
        self.selected = selected;
        self
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn department(&self) -> &DepartmentId {
        &self.department
    }

    pub fn results(&self) -> &[Task] {
        &self.results
    }

    pub fn selected(&self) -> &[Task] {
        &self.selected
    }

    pub fn exclusions(&self) -> &Exclusions {
        &self.exclusions
    }

    pub fn current_request(&self) -> SearchRequest {
        SearchRequest {
            query: self.query.clone(),
            department: self.department.clone(),
        }
    }

    /// The user typed. Returns the request to issue once typing settles.
    pub fn set_query(&mut self, query: impl Into<String>) -> SearchRequest {
        self.query = query.into();
        self.current_request()
    }

    /// Switching department drops stale results and re-searches. Already
    /// selected candidates are kept as they are.
    pub fn set_department(&mut self, department: DepartmentId) -> SearchRequest {
        if department != self.department {
            self.department = department;
            self.results.clear();
        }
        self.current_request()
    }

    /// Take results for `request`. Ignored (returns false) if the query or
    /// department changed since it was dispatched.
    pub fn accept(&mut self, request: &SearchRequest, results: Vec<Task>) -> bool {
        if *request != self.current_request() {
            debug!(query = %request.query, "dropping stale search results");
            return false;
        }
        self.results = results
            .into_iter()
            .filter(|t| !self.exclusions.excludes(&t.id))
            .filter(|t| !self.selected.iter().any(|s| s.id == t.id))
            .collect();
        true
    }

    /// Move a result into the selection.
    pub fn select(&mut self, task_id: &TaskId) -> bool {
        let Some(pos) = self.results.iter().position(|t| &t.id == task_id) else {
            return false;
        };
        let task = self.results.remove(pos);
        self.selected.push(task);
        true
    }

    /// Put a task that did not come from the results (one just created)
    /// straight into the selection.
    pub fn add_selected(&mut self, task: Task) {
        self.results.retain(|t| t.id != task.id);
        if !self.selected.iter().any(|t| t.id == task.id) {
            self.selected.push(task);
        }
    }

    pub fn deselect(&mut self, task_id: &TaskId) {
        self.selected.retain(|t| &t.id != task_id);
    }

    pub fn selected_ids(&self) -> impl Iterator<Item = &TaskId> {
        self.selected.iter().map(|t| &t.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(id: &str) -> Task {
        Task {
            id: TaskId::new(id),
            ..Task::default()
        }
    }

    #[test]
    fn test_stale_results_are_ignored() {
        let mut picker = LinkPicker::new(Exclusions::default(), DepartmentId::new("stage"));
        let first = picker.set_query("sound");
        let _second = picker.set_query("sound check");
        assert!(!picker.accept(&first, vec![task("a")]));
        assert!(picker.results().is_empty());
    }

    #[test]
    fn test_department_switch_clears_results_keeps_selection() {
        let mut picker = LinkPicker::new(Exclusions::default(), DepartmentId::new("stage"));
        let req = picker.set_query("rig");
        assert!(picker.accept(&req, vec![task("a"), task("b")]));
        assert!(picker.select(&TaskId::new("a")));

        let req = picker.set_department(DepartmentId::new("lighting"));
        assert!(picker.results().is_empty());
        assert_eq!(picker.selected().len(), 1);
        assert_eq!(req.department, DepartmentId::new("lighting"));
    }

    #[test]
    fn test_accept_applies_exclusions() {
        let exclusions = Exclusions {
            editing: Some(TaskId::new("self")),
            linked: [TaskId::new("linked")].into_iter().collect(),
        };
        let mut picker = LinkPicker::new(exclusions, DepartmentId::new("stage"));
        let req = picker.current_request();
        picker.accept(&req, vec![task("self"), task("linked"), task("fresh")]);
        let ids: Vec<_> = picker.results().iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["fresh"]);
    }
}
