use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::enums::{Priority, TaskStatus};
use super::ids::{DepartmentId, TaskId, UserId, VenueId, ZonalRowId, ZoneId};

// ---------------------------------------------------------------------------
// Task — the core data model
// ---------------------------------------------------------------------------

/// A task always belongs to exactly one department. Zone fields are
/// metadata used for filtering; they never change the owning department.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub department_id: DepartmentId,
    #[serde(default)]
    pub zone_id: Option<ZoneId>,
    #[serde(default)]
    pub zonal_department_row_id: Option<ZonalRowId>,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default, deserialize_with = "percent")]
    pub progress_pct: u8,
    #[serde(default)]
    pub start_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub due_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub assignee_id: Option<UserId>,
    #[serde(default)]
    pub venue_id: Option<VenueId>,
    pub created_by: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Central tasks have no zone assignment.
    pub fn is_central(&self) -> bool {
        self.zone_id.is_none()
    }

    pub fn is_zonal(&self) -> bool {
        self.zone_id.is_some()
    }

    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        match self.due_at {
            Some(due) => due < now && !self.status.is_closed(),
            None => false,
        }
    }

    pub fn start_date(&self) -> Option<NaiveDate> {
        self.start_at.map(|dt| dt.date_naive())
    }

    pub fn due_date(&self) -> Option<NaiveDate> {
        self.due_at.map(|dt| dt.date_naive())
    }

    /// Build a task from a draft the way the backend would on create.
    pub fn from_draft(
        id: TaskId,
        department_id: DepartmentId,
        created_by: UserId,
        draft: TaskDraft,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            department_id,
            zone_id: draft.zone_id,
            zonal_department_row_id: draft.zonal_department_row_id,
            title: draft.title,
            description: draft.description,
            priority: draft.priority,
            status: TaskStatus::Todo,
            progress_pct: 0,
            start_at: draft.start_at,
            due_at: draft.due_at,
            assignee_id: draft.assignee_id,
            venue_id: draft.venue_id,
            created_by,
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply a partial update. Fields left `None` in the patch are untouched.
    pub fn apply_patch(&mut self, patch: &TaskPatch) {
        if let Some(title) = &patch.title {
            self.title = title.clone();
        }
        if let Some(description) = &patch.description {
            self.description = description.clone();
        }
        if let Some(priority) = patch.priority {
            self.priority = priority;
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(pct) = patch.progress_pct {
            self.progress_pct = pct.min(100);
        }
        if let Some(start) = patch.start_at {
            self.start_at = start;
        }
        if let Some(due) = patch.due_at {
            self.due_at = due;
        }
        if let Some(assignee) = &patch.assignee_id {
            self.assignee_id = assignee.clone();
        }
        if let Some(venue) = &patch.venue_id {
            self.venue_id = venue.clone();
        }
    }
}

impl Default for Task {
    fn default() -> Self {
        Self {
            id: TaskId::new(""),
            department_id: DepartmentId::new(""),
            zone_id: None,
            zonal_department_row_id: None,
            title: String::new(),
            description: None,
            priority: Priority::default(),
            status: TaskStatus::Todo,
            progress_pct: 0,
            start_at: None,
            due_at: None,
            assignee_id: None,
            venue_id: None,
            created_by: UserId::new(""),
            created_at: DateTime::<Utc>::UNIX_EPOCH,
            updated_at: DateTime::<Utc>::UNIX_EPOCH,
        }
    }
}

// ---------------------------------------------------------------------------
// TaskDraft / TaskPatch / StatusChange — request payloads
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDraft {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub start_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub due_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub assignee_id: Option<UserId>,
    #[serde(default)]
    pub venue_id: Option<VenueId>,
    #[serde(default)]
    pub zone_id: Option<ZoneId>,
    #[serde(default)]
    pub zonal_department_row_id: Option<ZonalRowId>,
}

impl TaskDraft {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }
}

/// Partial update. The outer `Option` means "leave unchanged"; for
/// nullable fields the inner `Option` distinguishes set from clear.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub priority: Option<Priority>,
    pub status: Option<TaskStatus>,
    pub progress_pct: Option<u8>,
    pub start_at: Option<Option<DateTime<Utc>>>,
    pub due_at: Option<Option<DateTime<Utc>>>,
    pub assignee_id: Option<Option<UserId>>,
    pub venue_id: Option<Option<VenueId>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusChange {
    pub status: TaskStatus,
    #[serde(default)]
    pub progress_pct: Option<u8>,
}

impl StatusChange {
    /// A board move. Moving into `done` conventionally completes progress.
    pub fn board_move(status: TaskStatus) -> Self {
        Self {
            status,
            progress_pct: (status == TaskStatus::Done).then_some(100),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusChangeResult {
    pub status: TaskStatus,
    #[serde(deserialize_with = "percent")]
    pub progress_pct: u8,
}

/// Progress is a percentage; anything over 100 is malformed input.
fn percent<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = u8::deserialize(deserializer)?;
    if raw > 100 {
        return Err(serde::de::Error::custom(format!(
            "progress must be between 0 and 100, got {raw}"
        )));
    }
    Ok(raw)
}

// ---------------------------------------------------------------------------
// Members — assignee display-name lookup
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    pub user_id: UserId,
    pub display_name: String,
}

/// Lookup table from user id to display name.
#[derive(Debug, Clone, Default)]
pub struct AssigneeDirectory {
    names: HashMap<UserId, String>,
}

impl AssigneeDirectory {
    pub fn from_members(members: &[Member]) -> Self {
        Self {
            names: members
                .iter()
                .map(|m| (m.user_id.clone(), m.display_name.clone()))
                .collect(),
        }
    }

    /// Display name for a user, falling back to the raw id.
    pub fn display_name<'a>(&'a self, user: &'a UserId) -> &'a str {
        self.names
            .get(user)
            .map(String::as_str)
            .unwrap_or_else(|| user.as_str())
    }

    pub fn assignee_label(&self, task: &Task) -> String {
        match &task.assignee_id {
            Some(user) => self.display_name(user).to_string(),
            None => "Unassigned".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_overdue_ignores_closed_tasks() {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let mut task = Task {
            due_at: Some(Utc.with_ymd_and_hms(2024, 2, 28, 0, 0, 0).unwrap()),
            ..Task::default()
        };
        assert!(task.is_overdue(now));
        task.status = TaskStatus::Done;
        assert!(!task.is_overdue(now));
        task.status = TaskStatus::Canceled;
        assert!(!task.is_overdue(now));
    }

    #[test]
    fn test_progress_over_100_is_rejected() {
        let mut json = serde_json::to_value(Task::default()).unwrap();
        json["progressPct"] = 100.into();
        let ok: Task = serde_json::from_value(json.clone()).unwrap();
        assert_eq!(ok.progress_pct, 100);

        json["progressPct"] = 101.into();
        let err = serde_json::from_value::<Task>(json).unwrap_err();
        assert!(err.to_string().contains("progress must be between 0 and 100"));

        let result = serde_json::from_str::<StatusChangeResult>(r#"{"status": "done", "progressPct": 255}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_patch_clears_nullable_fields() {
        let mut task = Task {
            assignee_id: Some(UserId::new("u1")),
            ..Task::default()
        };
        task.apply_patch(&TaskPatch {
            assignee_id: Some(None),
            progress_pct: Some(250),
            ..TaskPatch::default()
        });
        assert!(task.assignee_id.is_none());
        assert_eq!(task.progress_pct, 100);
    }

    #[test]
    fn test_board_move_to_done_completes_progress() {
        assert_eq!(StatusChange::board_move(TaskStatus::Done).progress_pct, Some(100));
        assert_eq!(StatusChange::board_move(TaskStatus::Blocked).progress_pct, None);
    }

    #[test]
    fn test_directory_falls_back_to_id() {
        let dir = AssigneeDirectory::from_members(&[Member {
            user_id: UserId::new("u1"),
            display_name: "Ada".into(),
        }]);
        assert_eq!(dir.display_name(&UserId::new("u1")), "Ada");
        assert_eq!(dir.display_name(&UserId::new("u2")), "u2");
    }
}
