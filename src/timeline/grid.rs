//! Date grid: maps calendar days onto horizontal pixel offsets.
//!
//! The chart window is derived from the task list: the earliest start/due
//! minus a lead buffer up to the latest start/due plus a trail buffer. With
//! no dated tasks the window falls back to `today .. today + fallback_days`.

use chrono::{Duration, NaiveDate};
use serde::Serialize;

use crate::model::{Scale, Task};

/// Buffers around the dated tasks, in days.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridConfig {
    pub lead_days: i64,
    pub trail_days: i64,
    pub fallback_days: i64,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            lead_days: 3,
            trail_days: 7,
            fallback_days: 21,
        }
    }
}

/// How a bar was derived from the task's dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BarKind {
    /// Start and due both set; covers the due day inclusively.
    Range,
    /// Only a start date: two days wide from the start.
    OpenEnded,
    /// Only a due date: one day wide, ending at the due position.
    DueOnly,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Bar {
    pub left: f32,
    pub width: f32,
    pub kind: BarKind,
}

impl Bar {
    pub fn right(&self) -> f32 {
        self.left + self.width
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DateGrid {
    pub chart_start: NaiveDate,
    pub chart_end: NaiveDate,
    pub scale: Scale,
    total_days: i64,
    day_width: f32,
}

impl DateGrid {
    /// Derive the visible window for `tasks` at `scale`.
    pub fn build(tasks: &[Task], scale: Scale, today: NaiveDate, config: &GridConfig) -> Self {
        let dates = tasks
            .iter()
            .flat_map(|t| [t.start_date(), t.due_date()])
            .flatten();

        let bounds = dates.fold(None, |acc: Option<(NaiveDate, NaiveDate)>, d| match acc {
            None => Some((d, d)),
            Some((lo, hi)) => Some((lo.min(d), hi.max(d))),
        });

        let (chart_start, chart_end) = match bounds {
            // A buffer that leaves chrono's range is dropped, not applied.
            Some((lo, hi)) => (
                shift_days(lo, -config.lead_days).unwrap_or(lo),
                shift_days(hi, config.trail_days).unwrap_or(hi),
            ),
            None => (today, shift_days(today, config.fallback_days).unwrap_or(today)),
        };

        Self::from_window(chart_start, chart_end, scale)
    }

    /// A grid over an explicit window.
    pub fn from_window(chart_start: NaiveDate, chart_end: NaiveDate, scale: Scale) -> Self {
        let total_days = (chart_end - chart_start).num_days().max(0);
        Self {
            chart_start,
            chart_end,
            scale,
            total_days,
            day_width: scale.day_width(),
        }
    }

    /// Same window, different scale.
    pub fn rescaled(&self, scale: Scale) -> Self {
        Self::from_window(self.chart_start, self.chart_end, scale)
    }

    pub fn total_days(&self) -> i64 {
        self.total_days
    }

    pub fn day_width(&self) -> f32 {
        self.day_width
    }

    pub fn grid_width(&self) -> f32 {
        self.total_days as f32 * self.day_width
    }

    /// Pixel offset of a day, clamped to `[0, grid_width]`.
    pub fn pos(&self, date: NaiveDate) -> f32 {
        let days = (date - self.chart_start).num_days() as f32;
        (days * self.day_width).clamp(0.0, self.grid_width())
    }

    /// `None` in, `None` out.
    pub fn pos_for_date(&self, date: Option<NaiveDate>) -> Option<f32> {
        date.map(|d| self.pos(d))
    }

    /// Inverse of [`DateGrid::pos`], rounding to the nearest day.
    pub fn date_at(&self, x: f32) -> NaiveDate {
        let days = (x / self.day_width).round() as i64;
        saturating_shift(self.chart_start, days)
    }

    /// The day whose column contains `x`.
    pub fn day_at(&self, x: f32) -> NaiveDate {
        let days = (x / self.day_width).floor() as i64;
        saturating_shift(self.chart_start, days)
    }

    /// Bar geometry for a date range. `None` when neither end is known;
    /// such tasks are listed as unscheduled.
    pub fn width_for_range(&self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Option<Bar> {
        let dw = self.day_width;
        match (start, end) {
            (Some(start), Some(end)) => {
                let left = self.pos(start);
                // A due date before the start still yields a valid bar.
                let width = (self.pos(end) - left + dw).max(dw);
                Some(Bar {
                    left,
                    width,
                    kind: BarKind::Range,
                })
            }
            (Some(start), None) => Some(Bar {
                left: self.pos(start),
                width: 2.0 * dw,
                kind: BarKind::OpenEnded,
            }),
            (None, Some(end)) => Some(Bar {
                left: (self.pos(end) - dw).max(0.0),
                width: dw,
                kind: BarKind::DueOnly,
            }),
            (None, None) => None,
        }
    }

    pub fn bar_for(&self, task: &Task) -> Option<Bar> {
        self.width_for_range(task.start_date(), task.due_date())
    }

    /// Every day in the window, for header rendering.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        (0..self.total_days).map_while(move |i| shift_days(self.chart_start, i))
    }

    /// Scroll offset that centers `date` in a pane of `pane_width` pixels.
    pub fn centered_offset(&self, date: NaiveDate, pane_width: f32) -> f32 {
        (self.pos(date) - pane_width / 2.0).max(0.0)
    }
}

fn shift_days(date: NaiveDate, days: i64) -> Option<NaiveDate> {
    Duration::try_days(days).and_then(|delta| date.checked_add_signed(delta))
}

fn saturating_shift(date: NaiveDate, days: i64) -> NaiveDate {
    shift_days(date, days).unwrap_or(if days < 0 { NaiveDate::MIN } else { NaiveDate::MAX })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn dated(start: Option<NaiveDate>, due: Option<NaiveDate>) -> Task {
        let at = |d: NaiveDate| Utc.from_utc_datetime(&d.and_hms_opt(9, 0, 0).unwrap());
        Task {
            start_at: start.map(at),
            due_at: due.map(at),
            ..Task::default()
        }
    }

    #[test]
    fn test_out_of_range_buffer_falls_back_to_task_bounds() {
        let tasks = vec![dated(Some(day(2024, 1, 10)), Some(day(2024, 1, 12)))];
        let config = GridConfig {
            lead_days: 100_000_000_000_000,
            trail_days: i64::MAX,
            fallback_days: 21,
        };
        let grid = DateGrid::build(&tasks, Scale::Day, day(2030, 1, 1), &config);
        assert_eq!(grid.chart_start, day(2024, 1, 10));
        assert_eq!(grid.chart_end, day(2024, 1, 12));
    }

    #[test]
    fn test_day_at_saturates_far_past_the_grid() {
        let grid = DateGrid::from_window(day(2024, 1, 1), day(2024, 1, 8), Scale::Day);
        assert_eq!(grid.day_at(f32::MAX), NaiveDate::MAX);
        assert_eq!(grid.day_at(-f32::MAX), NaiveDate::MIN);
    }

    #[test]
    fn test_window_uses_buffers() {
        let tasks = vec![
            dated(Some(day(2024, 1, 10)), Some(day(2024, 1, 12))),
            dated(None, Some(day(2024, 1, 20))),
        ];
        let grid = DateGrid::build(&tasks, Scale::Day, day(2030, 1, 1), &GridConfig::default());
        assert_eq!(grid.chart_start, day(2024, 1, 7));
        assert_eq!(grid.chart_end, day(2024, 1, 27));
        assert_eq!(grid.total_days(), 20);
        assert!((grid.grid_width() - 560.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_fallback_window_without_dates() {
        let today = day(2024, 5, 1);
        let grid = DateGrid::build(&[dated(None, None)], Scale::Week, today, &GridConfig::default());
        assert_eq!(grid.chart_start, today);
        assert_eq!(grid.chart_end, day(2024, 5, 22));
        assert!((grid.grid_width() - 21.0 * 14.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_pos_clamps_to_grid() {
        let grid = DateGrid::from_window(day(2024, 1, 1), day(2024, 1, 11), Scale::Day);
        assert_eq!(grid.pos(day(2023, 12, 1)), 0.0);
        assert_eq!(grid.pos(day(2024, 2, 1)), grid.grid_width());
        assert_eq!(grid.pos_for_date(None), None);
    }

    #[test]
    fn test_backwards_range_still_gets_a_bar() {
        let grid = DateGrid::from_window(day(2024, 1, 1), day(2024, 1, 31), Scale::Day);
        let bar = grid
            .width_for_range(Some(day(2024, 1, 10)), Some(day(2024, 1, 5)))
            .unwrap();
        assert_eq!(bar.left, grid.pos(day(2024, 1, 10)));
        assert_eq!(bar.width, 28.0);
    }

    #[test]
    fn test_date_at_inverts_pos() {
        let grid = DateGrid::from_window(day(2024, 1, 1), day(2024, 2, 1), Scale::Week);
        let d = day(2024, 1, 17);
        assert_eq!(grid.date_at(grid.pos(d)), d);
        assert_eq!(grid.day_at(grid.pos(d) + 13.0), d);
        assert_eq!(grid.date_at(grid.pos(d) + 13.0), day(2024, 1, 18));
    }

    #[test]
    fn test_centered_offset_never_negative() {
        let grid = DateGrid::from_window(day(2024, 1, 1), day(2024, 3, 1), Scale::Day);
        assert_eq!(grid.centered_offset(day(2024, 1, 2), 800.0), 0.0);
        assert_eq!(grid.centered_offset(day(2024, 2, 1), 800.0), 31.0 * 28.0 - 400.0);
    }
}
