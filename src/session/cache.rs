//! Task-list responses cached by the parameters that produced them.
//!
//! Results are looked up by [`LoadKey`], never by arrival order, so a slow
//! response for an old department can't show up under a newer one.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::backend::TaskQuery;
use crate::model::{Scope, Task};

/// Everything a `list_tasks` request depends on.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LoadKey {
    pub scope: Scope,
    pub query: TaskQuery,
}

/// Distinct keys kept before the least recently stored one is evicted.
pub const MAX_ENTRIES: usize = 32;

#[derive(Debug, Clone)]
struct CachedTasks {
    tasks: Vec<Task>,
    fetched_at: Instant,
    stored: u64,
}

#[derive(Debug, Default)]
pub struct ResponseCache {
    entries: HashMap<LoadKey, CachedTasks>,
    next_stored: u64,
}

impl ResponseCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: LoadKey, tasks: Vec<Task>) {
        if !self.entries.contains_key(&key) && self.entries.len() >= MAX_ENTRIES {
            let oldest = self
                .entries
                .iter()
                .min_by_key(|(_, cached)| cached.stored)
                .map(|(key, _)| key.clone());
            if let Some(oldest) = oldest {
                self.entries.remove(&oldest);
            }
        }
        self.next_stored += 1;
        self.entries.insert(
            key,
            CachedTasks {
                tasks,
                fetched_at: Instant::now(),
                stored: self.next_stored,
            },
        );
    }

    pub fn get(&self, key: &LoadKey) -> Option<&[Task]> {
        self.entries.get(key).map(|c| c.tasks.as_slice())
    }

    /// How long ago the entry for `key` arrived.
    pub fn age(&self, key: &LoadKey) -> Option<Duration> {
        self.entries.get(key).map(|c| c.fetched_at.elapsed())
    }

    /// Drop every entry for `scope`, whatever the narrowing query was.
    pub fn invalidate_scope(&mut self, scope: &Scope) -> usize {
        let before = self.entries.len();
        self.entries.retain(|key, _| &key.scope != scope);
        before - self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{TaskId, UserId};

    fn key(dept: &str, assignee: Option<&str>) -> LoadKey {
        LoadKey {
            scope: Scope::new("fest", dept),
            query: TaskQuery {
                assignee_id: assignee.map(UserId::new),
                ..TaskQuery::default()
            },
        }
    }

    #[test]
    fn test_keys_differ_by_assignee() {
        let mut cache = ResponseCache::new();
        cache.insert(key("stage", None), vec![]);
        cache.insert(
            key("stage", Some("u1")),
            vec![Task {
                id: TaskId::new("t"),
                ..Task::default()
            }],
        );
        assert_eq!(cache.get(&key("stage", None)).unwrap().len(), 0);
        assert_eq!(cache.get(&key("stage", Some("u1"))).unwrap().len(), 1);
    }

    #[test]
    fn test_oldest_key_evicted_past_the_cap() {
        let mut cache = ResponseCache::new();
        let first = key("stage", Some("u0"));
        cache.insert(first.clone(), vec![]);
        for i in 1..MAX_ENTRIES {
            cache.insert(key("stage", Some(&format!("u{i}"))), vec![]);
        }
        // Refreshing an existing key never evicts.
        cache.insert(first.clone(), vec![]);
        assert_eq!(cache.len(), MAX_ENTRIES);

        cache.insert(key("catering", None), vec![]);
        assert_eq!(cache.len(), MAX_ENTRIES);
        assert!(cache.get(&first).is_some());
        assert!(cache.get(&key("stage", Some("u1"))).is_none());
        assert!(cache.age(&key("catering", None)).is_some());
    }

    #[test]
    fn test_invalidate_scope_drops_all_queries() {
        let mut cache = ResponseCache::new();
        cache.insert(key("stage", None), vec![]);
        cache.insert(key("stage", Some("u1")), vec![]);
        cache.insert(key("catering", None), vec![]);
        assert_eq!(cache.invalidate_scope(&Scope::new("fest", "stage")), 2);
        assert_eq!(cache.len(), 1);
    }
}
