use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Task status
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum TaskStatus {
    #[default]
    Todo,
    InProgress,
    Blocked,
    Done,
    Canceled,
}

impl TaskStatus {
    /// Fixed column order of the board view.
    pub const BOARD_ORDER: [TaskStatus; 5] = [
        Self::Todo,
        Self::InProgress,
        Self::Blocked,
        Self::Done,
        Self::Canceled,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Todo => "To do",
            Self::InProgress => "In progress",
            Self::Blocked => "Blocked",
            Self::Done => "Done",
            Self::Canceled => "Canceled",
        }
    }

    /// Wire representation used by the backend.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Todo => "todo",
            Self::InProgress => "in_progress",
            Self::Blocked => "blocked",
            Self::Done => "done",
            Self::Canceled => "canceled",
        }
    }

    /// Done and canceled tasks can never be overdue.
    pub fn is_closed(self) -> bool {
        matches!(self, Self::Done | Self::Canceled)
    }

    /// Parse a status string leniently. Unknown values fall back to `Todo`.
    pub fn from_str_loose(s: &str) -> Self {
        let lower = s.to_ascii_lowercase();
        match lower.trim() {
            "in_progress" | "in-progress" | "inprogress" | "active" | "doing" => Self::InProgress,
            "blocked" | "on_hold" => Self::Blocked,
            "done" | "complete" | "completed" => Self::Done,
            "canceled" | "cancelled" => Self::Canceled,
            _ => Self::Todo,
        }
    }

    fn board_index(self) -> usize {
        match self {
            Self::Todo => 0,
            Self::InProgress => 1,
            Self::Blocked => 2,
            Self::Done => 3,
            Self::Canceled => 4,
        }
    }

    /// Column to the right on the board, saturating at the last column.
    pub fn next(self) -> Self {
        let idx = (self.board_index() + 1).min(Self::BOARD_ORDER.len() - 1);
        Self::BOARD_ORDER[idx]
    }

    /// Column to the left on the board, saturating at the first column.
    pub fn prev(self) -> Self {
        Self::BOARD_ORDER[self.board_index().saturating_sub(1)]
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for TaskStatus {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for TaskStatus {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(TaskStatus::from_str_loose(&s))
    }
}

// ---------------------------------------------------------------------------
// Priority — 1 (highest) to 5 (lowest)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Priority(u8);

impl Priority {
    pub const HIGHEST: Priority = Priority(1);
    pub const LOWEST: Priority = Priority(5);

    /// Returns `None` outside of 1..=5.
    pub fn new(value: u8) -> Option<Self> {
        (1..=5).contains(&value).then_some(Self(value))
    }

    pub fn clamped(value: i64) -> Self {
        Self(value.clamp(1, 5) as u8)
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl Default for Priority {
    fn default() -> Self {
        Self(3)
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{}", self.0)
    }
}

impl Serialize for Priority {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_u8(self.0)
    }
}

impl<'de> Deserialize<'de> for Priority {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = u8::deserialize(deserializer)?;
        Priority::new(raw).ok_or_else(|| {
            serde::de::Error::custom(format!("priority must be between 1 and 5, got {raw}"))
        })
    }
}

// ---------------------------------------------------------------------------
// Dependency relation type
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationType {
    #[default]
    FinishToStart,
    StartToStart,
    FinishToFinish,
    StartToFinish,
}

impl RelationType {
    pub fn label(self) -> &'static str {
        match self {
            Self::FinishToStart => "FS",
            Self::StartToStart => "SS",
            Self::FinishToFinish => "FF",
            Self::StartToFinish => "SF",
        }
    }
}

// ---------------------------------------------------------------------------
// Timeline scale / view mode (UI state)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scale {
    #[default]
    Day,
    Week,
}

impl Scale {
    /// Pixels per calendar day.
    pub fn day_width(self) -> f32 {
        match self {
            Self::Day => 28.0,
            Self::Week => 14.0,
        }
    }

    pub fn next(self) -> Self {
        match self {
            Self::Day => Self::Week,
            Self::Week => Self::Day,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Day => "Day",
            Self::Week => "Week",
        }
    }

    pub fn from_str_loose(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "week" | "weeks" | "w" => Self::Week,
            _ => Self::Day,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    #[default]
    List,
    Board,
}

impl ViewMode {
    pub fn next(self) -> Self {
        match self {
            Self::List => Self::Board,
            Self::Board => Self::List,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::List => "Timeline",
            Self::Board => "Board",
        }
    }

    pub fn from_str_loose(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "board" | "kanban" => Self::Board,
            _ => Self::List,
        }
    }
}
