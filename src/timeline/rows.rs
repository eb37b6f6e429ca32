//! Row layout for the timeline: bar geometry per scheduled task plus the
//! list of unscheduled tasks.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use super::grid::{Bar, DateGrid};
use crate::model::{Task, TaskId, TaskStatus};

/// Row height in pixels, shared by the label and bar panes.
pub const ROW_HEIGHT: f32 = 36.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimelineRow {
    pub task_id: TaskId,
    pub title: String,
    pub status: TaskStatus,
    pub progress_pct: u8,
    pub bar: Bar,
    pub overdue: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TimelineRows {
    pub rows: Vec<TimelineRow>,
    pub unscheduled: Vec<TaskId>,
}

impl TimelineRows {
    /// Lay out `tasks` in their given order. Tasks without any date go to
    /// `unscheduled`.
    pub fn build(tasks: &[Task], grid: &DateGrid, now: DateTime<Utc>) -> Self {
        let mut layout = Self::default();
        for task in tasks {
            match grid.bar_for(task) {
                Some(bar) => layout.rows.push(TimelineRow {
                    task_id: task.id.clone(),
                    title: task.title.clone(),
                    status: task.status,
                    progress_pct: task.progress_pct,
                    bar,
                    overdue: task.is_overdue(now),
                }),
                None => layout.unscheduled.push(task.id.clone()),
            }
        }
        layout
    }

    pub fn content_height(&self) -> f32 {
        self.rows.len() as f32 * ROW_HEIGHT
    }

    /// Index of the row at vertical offset `y`.
    pub fn row_at(&self, y: f32) -> Option<usize> {
        if y < 0.0 {
            return None;
        }
        let idx = (y / ROW_HEIGHT) as usize;
        (idx < self.rows.len()).then_some(idx)
    }
}

/// Position of the "today" column. Not bounded by the task window beyond
/// the usual clamping, so it can sit at either edge.
pub fn today_pos(grid: &DateGrid, today: NaiveDate) -> f32 {
    grid.pos(today)
}

/// Horizontal offset a freshly mounted timeline starts at: today centered
/// in a pane of `pane_width` pixels.
pub fn initial_scroll(grid: &DateGrid, today: NaiveDate, pane_width: f32) -> f32 {
    let max = (grid.grid_width() - pane_width).max(0.0);
    grid.centered_offset(today, pane_width).min(max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Scale;
    use chrono::TimeZone;

    #[test]
    fn test_unscheduled_tasks_are_split_out() {
        let start = Utc.with_ymd_and_hms(2024, 4, 2, 0, 0, 0).unwrap();
        let tasks = vec![
            Task {
                id: TaskId::new("dated"),
                start_at: Some(start),
                ..Task::default()
            },
            Task {
                id: TaskId::new("floating"),
                ..Task::default()
            },
        ];
        let grid = DateGrid::from_window(
            NaiveDate::from_ymd_opt(2024, 4, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 4, 30).unwrap(),
            Scale::Day,
        );
        let layout = TimelineRows::build(&tasks, &grid, start);
        assert_eq!(layout.rows.len(), 1);
        assert_eq!(layout.rows[0].bar.left, 28.0);
        assert_eq!(layout.unscheduled, vec![TaskId::new("floating")]);
        assert_eq!(layout.row_at(10.0), Some(0));
        assert_eq!(layout.row_at(ROW_HEIGHT + 1.0), None);
    }
}
