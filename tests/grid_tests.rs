//! Date-grid geometry: window derivation, positions, bar widths, rows.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use pretty_assertions::assert_eq;

use event_timeline::model::{Scale, Task, TaskId, TaskStatus};
use event_timeline::timeline::*;

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn at(date: NaiveDate, hour: u32) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_hms_opt(hour, 0, 0).unwrap())
}

fn task(id: &str, start: Option<NaiveDate>, due: Option<NaiveDate>) -> Task {
    Task {
        id: TaskId::new(id),
        title: id.to_string(),
        start_at: start.map(|d| at(d, 9)),
        due_at: due.map(|d| at(d, 17)),
        ..Task::default()
    }
}

fn two_day_lead() -> GridConfig {
    GridConfig {
        lead_days: 2,
        ..GridConfig::default()
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Worked scenarios
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_range_bar_with_two_day_lead() {
    let tasks = vec![task("rig", Some(day(2024, 1, 10)), Some(day(2024, 1, 12)))];
    let grid = DateGrid::build(&tasks, Scale::Day, day(2024, 1, 1), &two_day_lead());

    assert_eq!(grid.chart_start, day(2024, 1, 8));
    assert_eq!(grid.pos(day(2024, 1, 10)), 56.0);
    assert_eq!(grid.pos(day(2024, 1, 12)), 112.0);

    let bar = grid.bar_for(&tasks[0]).unwrap();
    assert_eq!(bar.left, 56.0);
    assert_eq!(bar.width, 84.0);
    assert_eq!(bar.kind, BarKind::Range);
}

#[test]
fn test_due_only_bar_ends_at_due_position() {
    let tasks = vec![
        task("anchor", Some(day(2024, 3, 1)), None),
        task("deadline", None, Some(day(2024, 3, 6))),
    ];
    for scale in [Scale::Day, Scale::Week] {
        let grid = DateGrid::build(&tasks, scale, day(2024, 3, 1), &GridConfig::default());
        let bar = grid.bar_for(&tasks[1]).unwrap();
        assert_eq!(bar.kind, BarKind::DueOnly);
        assert_eq!(bar.width, scale.day_width());
        assert_eq!(bar.right(), grid.pos(day(2024, 3, 6)));
    }
}

#[test]
fn test_start_only_bar_is_two_days() {
    let tasks = vec![task("open", Some(day(2024, 3, 4)), None)];
    let grid = DateGrid::build(&tasks, Scale::Week, day(2024, 3, 1), &GridConfig::default());
    let bar = grid.bar_for(&tasks[0]).unwrap();
    assert_eq!(bar.kind, BarKind::OpenEnded);
    assert_eq!(bar.left, grid.pos(day(2024, 3, 4)));
    assert_eq!(bar.width, 28.0);
}

#[test]
fn test_no_dates_means_no_bar() {
    let grid = DateGrid::from_window(day(2024, 1, 1), day(2024, 1, 22), Scale::Day);
    assert_eq!(grid.width_for_range(None, None), None);
}

// ═══════════════════════════════════════════════════════════════════════════
// Properties
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_range_bar_covers_due_day_inclusively() {
    let grid = DateGrid::from_window(day(2024, 1, 1), day(2024, 3, 1), Scale::Day);
    for offset in 0..20 {
        let start = day(2024, 1, 5) + chrono::Duration::days(offset);
        for length in 0..10 {
            let due = start + chrono::Duration::days(length);
            let bar = grid.width_for_range(Some(start), Some(due)).unwrap();
            assert_eq!(bar.left, grid.pos(start));
            assert_eq!(bar.right(), grid.pos(due) + grid.day_width());
        }
    }
}

#[test]
fn test_pos_is_monotonic_and_bounded() {
    let grid = DateGrid::from_window(day(2024, 2, 1), day(2024, 3, 1), Scale::Week);
    let mut previous = f32::MIN;
    let mut date = day(2024, 1, 1);
    while date <= day(2024, 4, 1) {
        let pos = grid.pos(date);
        assert!(pos >= previous, "pos went backwards at {date}");
        assert!((0.0..=grid.grid_width()).contains(&pos));
        previous = pos;
        date = date.succ_opt().unwrap();
    }
}

#[test]
fn test_scale_change_keeps_window() {
    let tasks = vec![task("rig", Some(day(2024, 1, 10)), Some(day(2024, 1, 12)))];
    let day_grid = DateGrid::build(&tasks, Scale::Day, day(2024, 1, 1), &GridConfig::default());
    let week_grid = day_grid.rescaled(Scale::Week);
    assert_eq!(week_grid.chart_start, day_grid.chart_start);
    assert_eq!(week_grid.grid_width() * 2.0, day_grid.grid_width());
    assert_eq!(day_grid.days().count() as i64, day_grid.total_days());
}

// ═══════════════════════════════════════════════════════════════════════════
// Rows and today
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_rows_keep_order_and_flag_overdue() {
    let mut late = task("late", Some(day(2024, 1, 2)), Some(day(2024, 1, 4)));
    late.status = TaskStatus::InProgress;
    let mut finished = task("finished", None, Some(day(2024, 1, 3)));
    finished.status = TaskStatus::Done;
    let floating = task("floating", None, None);

    let tasks = vec![late, floating, finished];
    let grid = DateGrid::build(&tasks, Scale::Day, day(2024, 1, 10), &GridConfig::default());
    let layout = TimelineRows::build(&tasks, &grid, at(day(2024, 1, 10), 12));

    let ids: Vec<&str> = layout.rows.iter().map(|r| r.task_id.as_str()).collect();
    assert_eq!(ids, vec!["late", "finished"]);
    assert!(layout.rows[0].overdue);
    assert!(!layout.rows[1].overdue);
    assert_eq!(layout.unscheduled, vec![TaskId::new("floating")]);
    assert_eq!(layout.content_height(), 2.0 * ROW_HEIGHT);
}

#[test]
fn test_today_can_sit_outside_the_window() {
    let tasks = vec![task("past", Some(day(2024, 1, 2)), Some(day(2024, 1, 4)))];
    let grid = DateGrid::build(&tasks, Scale::Day, day(2024, 6, 1), &GridConfig::default());
    assert_eq!(today_pos(&grid, day(2024, 6, 1)), grid.grid_width());
    assert_eq!(today_pos(&grid, day(2023, 6, 1)), 0.0);
}

#[test]
fn test_initial_scroll_centers_today() {
    let grid = DateGrid::from_window(day(2024, 1, 1), day(2024, 3, 1), Scale::Day);
    let today = day(2024, 2, 1);
    assert_eq!(initial_scroll(&grid, today, 400.0), 31.0 * 28.0 - 200.0);
    // Near the end the offset stops at the last full viewport.
    assert_eq!(
        initial_scroll(&grid, day(2024, 2, 29), 400.0),
        grid.grid_width() - 400.0
    );
    // Near the start it never goes negative.
    assert_eq!(initial_scroll(&grid, day(2024, 1, 2), 400.0), 0.0);
}
