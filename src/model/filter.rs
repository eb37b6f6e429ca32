use std::collections::BTreeSet;

use chrono::NaiveDate;

use super::enums::{Priority, TaskStatus, ViewMode};
use super::ids::{DepartmentId, UserId, ZonalRowId, ZoneId};

// ---------------------------------------------------------------------------
// Zone filter — central vs zonal tasks
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ZoneFilter {
    #[default]
    Any,
    /// Tasks with no zone assignment.
    Central,
    Zone(ZoneId),
    /// A department row inside a zone.
    ZonalRow(ZonalRowId),
}

impl ZoneFilter {
    pub fn zone_id(&self) -> Option<&ZoneId> {
        match self {
            Self::Zone(id) => Some(id),
            _ => None,
        }
    }

    pub fn zonal_row_id(&self) -> Option<&ZonalRowId> {
        match self {
            Self::ZonalRow(id) => Some(id),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// FilterState — every predicate the projection applies
// ---------------------------------------------------------------------------

/// Empty sets and `None` mean "no restriction".
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FilterState {
    pub departments: BTreeSet<DepartmentId>,
    pub statuses: BTreeSet<TaskStatus>,
    pub priority: Option<Priority>,
    pub assignee: Option<UserId>,
    pub query: String,
    pub due_from: Option<NaiveDate>,
    /// Inclusive through the end of this day.
    pub due_to: Option<NaiveDate>,
    pub zone: ZoneFilter,
    pub overdue_only: bool,
    pub view: ViewMode,
}

impl FilterState {
    pub fn is_unfiltered(&self) -> bool {
        self.departments.is_empty()
            && self.statuses.is_empty()
            && self.priority.is_none()
            && self.assignee.is_none()
            && self.query.trim().is_empty()
            && self.due_from.is_none()
            && self.due_to.is_none()
            && self.zone == ZoneFilter::Any
            && !self.overdue_only
    }

    /// Drop every predicate but keep the view mode.
    pub fn clear(&mut self) {
        *self = Self {
            view: self.view,
            ..Self::default()
        };
    }

    pub fn toggle_status(&mut self, status: TaskStatus) {
        if !self.statuses.remove(&status) {
            self.statuses.insert(status);
        }
    }

    pub fn with_statuses(mut self, statuses: impl IntoIterator<Item = TaskStatus>) -> Self {
        self.statuses = statuses.into_iter().collect();
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn with_due_range(mut self, from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        self.due_from = from;
        self.due_to = to;
        self
    }

    /// Cycle the single-status quick filter: all → todo → … → canceled → all.
    pub fn cycle_status(&mut self) {
        let next = match self.statuses.iter().next() {
            _ if self.statuses.len() > 1 => Some(TaskStatus::Todo),
            None => Some(TaskStatus::Todo),
            Some(&TaskStatus::Canceled) => None,
            Some(&current) => Some(current.next()),
        };
        self.statuses.clear();
        if let Some(status) = next {
            self.statuses.insert(status);
        }
    }

    pub fn status_label(&self) -> String {
        if self.statuses.is_empty() {
            return "All".to_string();
        }
        self.statuses
            .iter()
            .map(|s| s.label())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_quick_filter_cycles_back_to_all() {
        let mut filter = FilterState::default();
        let mut seen = Vec::new();
        for _ in 0..6 {
            filter.cycle_status();
            seen.push(filter.status_label());
        }
        assert_eq!(
            seen,
            vec!["To do", "In progress", "Blocked", "Done", "Canceled", "All"]
        );
    }

    #[test]
    fn test_clear_keeps_view_mode() {
        let mut filter = FilterState {
            view: ViewMode::Board,
            overdue_only: true,
            query: "stage".into(),
            ..FilterState::default()
        };
        filter.clear();
        assert!(filter.is_unfiltered());
        assert_eq!(filter.view, ViewMode::Board);
    }
}
