//! Dependency graph store: blocker → blocked edges per task, backed by
//! the server and cached per task.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::backend::{BackendError, BackendResult, TaskBackend};
use crate::model::{would_create_cycle, DependencyEdge, DependencyLinks, Scope, TaskId};

// ---------------------------------------------------------------------------
// Reconciliation plan / report
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeAction {
    Add,
    Remove,
}

/// Symmetric difference between the server's blockers and the desired set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcilePlan {
    pub to_add: Vec<TaskId>,
    pub to_remove: Vec<TaskId>,
}

impl ReconcilePlan {
    pub fn new(current: &BTreeSet<TaskId>, desired: &BTreeSet<TaskId>) -> Self {
        Self {
            to_add: desired.difference(current).cloned().collect(),
            to_remove: current.difference(desired).cloned().collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.to_add.is_empty() && self.to_remove.is_empty()
    }

    pub fn len(&self) -> usize {
        self.to_add.len() + self.to_remove.len()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReconcileReport {
    pub added: Vec<TaskId>,
    pub removed: Vec<TaskId>,
    pub failed: Vec<(TaskId, EdgeAction, BackendError)>,
}

impl ReconcileReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

// ---------------------------------------------------------------------------
// DependencyStore
// ---------------------------------------------------------------------------

pub struct DependencyStore<B: ?Sized> {
    backend: Arc<B>,
    scope: Scope,
    cache: HashMap<TaskId, DependencyLinks>,
}

impl<B: TaskBackend + ?Sized> DependencyStore<B> {
    pub fn new(backend: Arc<B>, scope: Scope) -> Self {
        Self {
            backend,
            scope,
            cache: HashMap::new(),
        }
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    pub fn backend(&self) -> &Arc<B> {
        &self.backend
    }

    /// Switch department or event. Cached links belong to the old scope.
    pub fn set_scope(&mut self, scope: Scope) {
        if scope != self.scope {
            self.cache.clear();
            self.scope = scope;
        }
    }

    /// Fetch the links of `task_id` and cache them. Errors propagate so the
    /// caller can show an error state.
    pub async fn list(&mut self, task_id: &TaskId) -> BackendResult<DependencyLinks> {
        let links = self.backend.list_dependencies(&self.scope, task_id).await?;
        debug!(
            task_id = %task_id,
            blockers = links.blockers.len(),
            dependents = links.dependents.len(),
            "loaded dependencies"
        );
        self.cache.insert(task_id.clone(), links.clone());
        Ok(links)
    }

    pub fn cached(&self, task_id: &TaskId) -> Option<&DependencyLinks> {
        self.cache.get(task_id)
    }

    pub fn invalidate(&mut self, task_id: &TaskId) {
        self.cache.remove(task_id);
    }

    /// Forget every cached task, e.g. after a change notification.
    pub fn clear(&mut self) {
        self.cache.clear();
    }

    /// Every edge visible through the cached links, deduplicated.
    pub fn known_edges(&self) -> Vec<DependencyEdge> {
        let mut edges: Vec<DependencyEdge> = Vec::new();
        for (task_id, links) in &self.cache {
            for link in &links.blockers {
                edges.push(DependencyEdge {
                    blocker_id: link.task.id.clone(),
                    blocked_id: task_id.clone(),
                    relation: link.relation,
                });
            }
            for link in &links.dependents {
                edges.push(DependencyEdge {
                    blocker_id: task_id.clone(),
                    blocked_id: link.task.id.clone(),
                    relation: link.relation,
                });
            }
        }
        edges.sort_by(|a, b| {
            (&a.blocker_id, &a.blocked_id).cmp(&(&b.blocker_id, &b.blocked_id))
        });
        edges.dedup_by(|a, b| a.blocker_id == b.blocker_id && a.blocked_id == b.blocked_id);
        edges
    }

    /// Does `blocker → task` close a loop among the known edges?
    pub fn would_cycle(&self, task_id: &TaskId, blocker_id: &TaskId) -> bool {
        would_create_cycle(&self.known_edges(), blocker_id, task_id)
    }

    /// Create the edge `blocker_id → task_id`. Cycles are only logged; the
    /// backend decides whether to accept the edge.
    pub async fn add(&mut self, task_id: &TaskId, blocker_id: &TaskId) -> BackendResult<()> {
        if self.would_cycle(task_id, blocker_id) {
            warn!(task_id = %task_id, blocker_id = %blocker_id, "dependency closes a cycle");
        }
        let result = self
            .backend
            .add_dependency(&self.scope, task_id, blocker_id)
            .await;
        self.invalidate(task_id);
        self.invalidate(blocker_id);
        result
    }

    pub async fn remove(&mut self, task_id: &TaskId, blocker_id: &TaskId) -> BackendResult<()> {
        let result = self
            .backend
            .remove_dependency(&self.scope, task_id, blocker_id)
            .await;
        self.invalidate(task_id);
        self.invalidate(blocker_id);
        result
    }

    /// Bring the blockers of `task_id` to `desired`, one call per differing
    /// id, in sequence. A failed call is recorded and the rest still run,
    /// so the result may be partial. The cache is refreshed at the end.
    pub async fn reconcile(
        &mut self,
        task_id: &TaskId,
        desired: &BTreeSet<TaskId>,
    ) -> BackendResult<ReconcileReport> {
        // Always the server's set; the cache may predate another client's edit.
        let current: BTreeSet<TaskId> = self
            .list(task_id)
            .await?
            .blocker_ids()
            .into_iter()
            .collect();
        let plan = ReconcilePlan::new(&current, desired);
        let report = self.apply(task_id, &plan).await;

        if !report.is_complete() {
            warn!(
                task_id = %task_id,
                failed = report.failed.len(),
                planned = plan.len(),
                "dependency reconcile partially applied"
            );
        }

        // Best effort; a failed refresh leaves the cache empty for this task.
        if let Err(e) = self.list(task_id).await {
            warn!(task_id = %task_id, error = %e, "refresh after reconcile failed");
        }
        Ok(report)
    }

    pub async fn apply(&mut self, task_id: &TaskId, plan: &ReconcilePlan) -> ReconcileReport {
        let mut report = ReconcileReport::default();

        for blocker in &plan.to_add {
            match self.add(task_id, blocker).await {
                Ok(()) => report.added.push(blocker.clone()),
                Err(e) => {
                    warn!(task_id = %task_id, blocker_id = %blocker, error = %e, "add dependency failed");
                    report.failed.push((blocker.clone(), EdgeAction::Add, e));
                }
            }
        }
        for blocker in &plan.to_remove {
            match self.remove(task_id, blocker).await {
                Ok(()) => report.removed.push(blocker.clone()),
                Err(e) => {
                    warn!(task_id = %task_id, blocker_id = %blocker, error = %e, "remove dependency failed");
                    report.failed.push((blocker.clone(), EdgeAction::Remove, e));
                }
            }
        }

        info!(
            task_id = %task_id,
            added = report.added.len(),
            removed = report.removed.len(),
            failed = report.failed.len(),
            "dependencies reconciled"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(list: &[&str]) -> BTreeSet<TaskId> {
        list.iter().map(|s| TaskId::new(*s)).collect()
    }

    #[test]
    fn test_plan_is_symmetric_difference() {
        let plan = ReconcilePlan::new(&ids(&["a", "b"]), &ids(&["b", "c"]));
        assert_eq!(plan.to_add, vec![TaskId::new("c")]);
        assert_eq!(plan.to_remove, vec![TaskId::new("a")]);
        assert_eq!(plan.len(), 2);
    }

    #[test]
    fn test_plan_empty_when_sets_match() {
        assert!(ReconcilePlan::new(&ids(&["a"]), &ids(&["a"])).is_empty());
    }
}
