//! Status/filter projection: predicates, idempotence, board grouping.

use std::path::PathBuf;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use pretty_assertions::assert_eq;

use event_timeline::backend::Fixture;
use event_timeline::model::*;
use event_timeline::projection::{board_columns, project};

fn fixture_tasks() -> Vec<Task> {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures/event.json");
    Fixture::load(&path).expect("fixture should load").tasks
}

fn stage_tasks() -> Vec<Task> {
    fixture_tasks()
        .into_iter()
        .filter(|t| t.department_id.as_str() == "stage")
        .collect()
}

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 6, 12, 0, 0).unwrap()
}

fn ids(tasks: &[Task]) -> Vec<&str> {
    tasks.iter().map(|t| t.id.as_str()).collect()
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

// ═══════════════════════════════════════════════════════════════════════════
// Properties
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_projection_is_idempotent() {
    let tasks = fixture_tasks();
    let filters = [
        FilterState::default(),
        FilterState::default().with_statuses([TaskStatus::Todo, TaskStatus::InProgress]),
        FilterState::default().with_priority(Priority::HIGHEST),
        FilterState::default().with_due_range(Some(date(2024, 6, 5)), Some(date(2024, 6, 9))),
        FilterState {
            overdue_only: true,
            query: "stage".into(),
            ..FilterState::default()
        },
    ];
    for f in &filters {
        let once = project(&tasks, f, now());
        let twice = project(&once, f, now());
        assert_eq!(once, twice);
    }
}

#[test]
fn test_clearing_filters_restores_original_set() {
    let tasks = stage_tasks();
    let mut filters = FilterState::default()
        .with_statuses([TaskStatus::Todo])
        .with_priority(Priority::new(2).unwrap())
        .with_due_range(Some(date(2024, 6, 1)), Some(date(2024, 6, 30)));
    filters.view = ViewMode::Board;

    assert_eq!(ids(&project(&tasks, &filters, now())), vec!["stage-002"]);

    filters.clear();
    assert!(filters.is_unfiltered());
    assert_eq!(filters.view, ViewMode::Board);
    assert_eq!(project(&tasks, &filters, now()), tasks);
}

// ═══════════════════════════════════════════════════════════════════════════
// Predicates
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_overdue_skips_closed_tasks() {
    let filters = FilterState {
        overdue_only: true,
        ..FilterState::default()
    };
    // stage-004 (done) and stage-006 (canceled) are past due but closed.
    let visible = project(&fixture_tasks(), &filters, now());
    assert_eq!(ids(&visible), vec!["cat-001"]);
}

#[test]
fn test_due_range_end_is_inclusive_to_end_of_day() {
    let tasks = stage_tasks();
    let filters = FilterState::default().with_due_range(None, Some(date(2024, 6, 7)));
    // stage-001 is due 2024-06-07T18:00Z, inside the end-of-day bound.
    let visible = project(&tasks, &filters, now());
    assert_eq!(ids(&visible), vec!["stage-001", "stage-004", "stage-006"]);
}

#[test]
fn test_due_range_excludes_undated_tasks() {
    let tasks = stage_tasks();
    let filters = FilterState::default().with_due_range(Some(date(2020, 1, 1)), None);
    let visible = project(&tasks, &filters, now());
    assert!(visible.iter().all(|t| t.due_at.is_some()));
    assert!(!ids(&visible).contains(&"stage-003"));
    assert!(!ids(&visible).contains(&"stage-005"));
}

#[test]
fn test_zone_filters() {
    let tasks = stage_tasks();
    let central = FilterState {
        zone: ZoneFilter::Central,
        ..FilterState::default()
    };
    assert_eq!(
        ids(&project(&tasks, &central, now())),
        vec!["stage-001", "stage-002", "stage-004", "stage-005"]
    );

    let north_row = FilterState {
        zone: ZoneFilter::ZonalRow(ZonalRowId::new("row-north-stage")),
        ..FilterState::default()
    };
    assert_eq!(ids(&project(&tasks, &north_row, now())), vec!["stage-003"]);
}

#[test]
fn test_query_and_assignee_are_conjunctive() {
    let tasks = fixture_tasks();
    let filters = FilterState {
        query: "  STAGE ".into(),
        assignee: Some(UserId::new("u-ana")),
        ..FilterState::default()
    };
    assert_eq!(ids(&project(&tasks, &filters, now())), vec!["stage-001"]);
}

#[test]
fn test_department_set() {
    let tasks = fixture_tasks();
    let filters = FilterState {
        departments: [DepartmentId::new("catering"), DepartmentId::new("security")]
            .into_iter()
            .collect(),
        ..FilterState::default()
    };
    assert_eq!(
        ids(&project(&tasks, &filters, now())),
        vec!["cat-001", "cat-002", "sec-001"]
    );
}

// ═══════════════════════════════════════════════════════════════════════════
// Board
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_board_groups_by_status_in_fixed_order() {
    let columns = board_columns(&stage_tasks());
    let summary: Vec<(TaskStatus, Vec<&str>)> = columns
        .iter()
        .map(|c| (c.status, ids(&c.tasks)))
        .collect();
    assert_eq!(
        summary,
        vec![
            (TaskStatus::Todo, vec!["stage-002", "stage-005"]),
            (TaskStatus::InProgress, vec!["stage-001"]),
            (TaskStatus::Blocked, vec!["stage-003"]),
            (TaskStatus::Done, vec!["stage-004"]),
            (TaskStatus::Canceled, vec!["stage-006"]),
        ]
    );
}

#[test]
fn test_status_quick_filter_cycles_back_to_all() {
    let mut filters = FilterState::default();
    let mut labels = Vec::new();
    for _ in 0..6 {
        filters.cycle_status();
        labels.push(filters.status_label());
    }
    assert_eq!(labels.first().map(String::as_str), Some(TaskStatus::Todo.label()));
    assert_eq!(labels[5], "All");
}
