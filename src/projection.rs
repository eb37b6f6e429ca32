//! Status/filter projection: the visible task set and board grouping.
//!
//! All predicates are conjunctive. An empty set or unset value means the
//! predicate is not applied.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};

use crate::model::{FilterState, Task, TaskStatus, ZoneFilter};

/// Filter `tasks`, keeping their order.
pub fn project(tasks: &[Task], filters: &FilterState, now: DateTime<Utc>) -> Vec<Task> {
    let query = filters.query.trim().to_lowercase();
    tasks
        .iter()
        .filter(|task| matches(task, filters, &query, now))
        .cloned()
        .collect()
}

/// Does one task pass every active predicate? `query` must already be
/// trimmed and lowercased.
pub fn matches(task: &Task, filters: &FilterState, query: &str, now: DateTime<Utc>) -> bool {
    if !filters.departments.is_empty() && !filters.departments.contains(&task.department_id) {
        return false;
    }
    if !filters.statuses.is_empty() && !filters.statuses.contains(&task.status) {
        return false;
    }
    if filters.priority.is_some_and(|p| p != task.priority) {
        return false;
    }
    if let Some(assignee) = &filters.assignee {
        if task.assignee_id.as_ref() != Some(assignee) {
            return false;
        }
    }
    if !zone_matches(task, &filters.zone) {
        return false;
    }
    if filters.overdue_only && !task.is_overdue(now) {
        return false;
    }
    if !due_in_range(task, filters.due_from, filters.due_to) {
        return false;
    }
    if !query.is_empty() {
        let in_title = task.title.to_lowercase().contains(query);
        let in_description = task
            .description
            .as_deref()
            .is_some_and(|d| d.to_lowercase().contains(query));
        if !in_title && !in_description {
            return false;
        }
    }
    true
}

fn zone_matches(task: &Task, zone: &ZoneFilter) -> bool {
    match zone {
        ZoneFilter::Any => true,
        ZoneFilter::Central => task.is_central(),
        ZoneFilter::Zone(id) => task.zone_id.as_ref() == Some(id),
        ZoneFilter::ZonalRow(id) => task.zonal_department_row_id.as_ref() == Some(id),
    }
}

/// Tasks without a due date never match an active range.
fn due_in_range(task: &Task, from: Option<NaiveDate>, to: Option<NaiveDate>) -> bool {
    if from.is_none() && to.is_none() {
        return true;
    }
    let Some(due) = task.due_at else {
        return false;
    };
    if let Some(from) = from {
        if due < start_of_day(from) {
            return false;
        }
    }
    if let Some(to) = to {
        if due > end_of_day(to) {
            return false;
        }
    }
    true
}

fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(chrono::NaiveTime::MIN))
}

/// 23:59:59.999 on `date`.
fn end_of_day(date: NaiveDate) -> DateTime<Utc> {
    let last_milli = date
        .and_hms_milli_opt(23, 59, 59, 999)
        .unwrap_or_else(|| date.and_time(chrono::NaiveTime::MIN));
    Utc.from_utc_datetime(&last_milli)
}

// ---------------------------------------------------------------------------
// Board grouping
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct BoardColumn {
    pub status: TaskStatus,
    pub tasks: Vec<Task>,
}

/// Group visible tasks into the five status columns, always in
/// [`TaskStatus::BOARD_ORDER`], empty columns included.
pub fn board_columns(visible: &[Task]) -> Vec<BoardColumn> {
    TaskStatus::BOARD_ORDER
        .iter()
        .map(|&status| BoardColumn {
            status,
            tasks: visible
                .iter()
                .filter(|t| t.status == status)
                .cloned()
                .collect(),
        })
        .collect()
}
