pub mod grid;
pub mod rows;
pub mod scroll;

pub use grid::{Bar, BarKind, DateGrid, GridConfig};
pub use rows::{initial_scroll, today_pos, TimelineRow, TimelineRows, ROW_HEIGHT};
pub use scroll::{Axis, Pane, PaneId, ScrollCoordinator, ScrollError, SyncState};
