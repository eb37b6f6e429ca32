use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};

use serde::{Deserialize, Serialize};

use super::enums::RelationType;
use super::ids::{DepartmentId, TaskId};
use super::task::Task;

// ---------------------------------------------------------------------------
// DependencyEdge — blocker → blocked
// ---------------------------------------------------------------------------

/// The blocker conceptually precedes the blocked task. Advisory only: no
/// temporal constraint is enforced.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DependencyEdge {
    pub blocker_id: TaskId,
    pub blocked_id: TaskId,
    #[serde(default)]
    pub relation: RelationType,
}

impl DependencyEdge {
    pub fn new(blocker_id: TaskId, blocked_id: TaskId) -> Self {
        Self {
            blocker_id,
            blocked_id,
            relation: RelationType::FinishToStart,
        }
    }
}

// ---------------------------------------------------------------------------
// DependencyLinks — what listDependencies returns for one task
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DependencyLink {
    pub task: Task,
    #[serde(default)]
    pub relation: RelationType,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DependencyLinks {
    pub blockers: Vec<DependencyLink>,
    pub dependents: Vec<DependencyLink>,
}

impl DependencyLinks {
    pub fn blocker_ids(&self) -> HashSet<TaskId> {
        self.blockers.iter().map(|l| l.task.id.clone()).collect()
    }

    pub fn dependent_ids(&self) -> HashSet<TaskId> {
        self.dependents.iter().map(|l| l.task.id.clone()).collect()
    }

    /// Every id already linked in either direction.
    pub fn linked_ids(&self) -> HashSet<TaskId> {
        let mut ids = self.blocker_ids();
        ids.extend(self.dependent_ids());
        ids
    }

    pub fn is_empty(&self) -> bool {
        self.blockers.is_empty() && self.dependents.is_empty()
    }

    /// Group both directions by the linked task's owning department, for
    /// showing links that cross department boundaries.
    pub fn by_department(&self) -> BTreeMap<DepartmentId, DepartmentLinks<'_>> {
        let mut grouped: BTreeMap<DepartmentId, DepartmentLinks<'_>> = BTreeMap::new();
        for link in &self.blockers {
            grouped
                .entry(link.task.department_id.clone())
                .or_default()
                .blockers
                .push(link);
        }
        for link in &self.dependents {
            grouped
                .entry(link.task.department_id.clone())
                .or_default()
                .dependents
                .push(link);
        }
        grouped
    }
}

#[derive(Debug, Default)]
pub struct DepartmentLinks<'a> {
    pub blockers: Vec<&'a DependencyLink>,
    pub dependents: Vec<&'a DependencyLink>,
}

// ---------------------------------------------------------------------------
// Cycle check — advisory, never enforced
// ---------------------------------------------------------------------------

/// Would adding `blocker → blocked` close a cycle? True when `blocked`
/// already reaches `blocker` through existing edges.
pub fn would_create_cycle(edges: &[DependencyEdge], blocker: &TaskId, blocked: &TaskId) -> bool {
    if blocker == blocked {
        return true;
    }

    let mut outgoing: HashMap<&TaskId, Vec<&TaskId>> = HashMap::new();
    for edge in edges {
        outgoing
            .entry(&edge.blocker_id)
            .or_default()
            .push(&edge.blocked_id);
    }

    let mut visited: HashSet<&TaskId> = HashSet::new();
    let mut queue: VecDeque<&TaskId> = VecDeque::new();
    queue.push_back(blocked);

    while let Some(current) = queue.pop_front() {
        if current == blocker {
            return true;
        }
        if !visited.insert(current) {
            continue;
        }
        if let Some(next) = outgoing.get(current) {
            queue.extend(next.iter().copied().filter(|id| !visited.contains(id)));
        }
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edge(blocker: &str, blocked: &str) -> DependencyEdge {
        DependencyEdge::new(TaskId::new(blocker), TaskId::new(blocked))
    }

    #[test]
    fn test_cycle_detected_through_chain() {
        let edges = vec![edge("a", "b"), edge("b", "c")];
        assert!(would_create_cycle(&edges, &TaskId::new("c"), &TaskId::new("a")));
        assert!(!would_create_cycle(&edges, &TaskId::new("a"), &TaskId::new("c")));
    }

    #[test]
    fn test_self_link_is_a_cycle() {
        assert!(would_create_cycle(&[], &TaskId::new("a"), &TaskId::new("a")));
    }

    #[test]
    fn test_by_department_groups_both_directions() {
        let task = |id: &str, dept: &str| Task {
            id: TaskId::new(id),
            department_id: DepartmentId::new(dept),
            ..Task::default()
        };
        let links = DependencyLinks {
            blockers: vec![
                DependencyLink { task: task("a", "stage"), relation: RelationType::FinishToStart },
                DependencyLink { task: task("b", "catering"), relation: RelationType::StartToStart },
            ],
            dependents: vec![DependencyLink {
                task: task("c", "stage"),
                relation: RelationType::FinishToStart,
            }],
        };
        let grouped = links.by_department();
        assert_eq!(grouped.len(), 2);
        let stage = &grouped[&DepartmentId::new("stage")];
        assert_eq!(stage.blockers.len(), 1);
        assert_eq!(stage.dependents.len(), 1);
        assert_eq!(links.linked_ids().len(), 3);
    }
}
