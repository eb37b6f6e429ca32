use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Newtype identifiers — one per entity so they can't be mixed up
// ---------------------------------------------------------------------------

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(s: impl Into<String>) -> Self {
                Self(s.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }
    };
}

string_id!(
    /// Identifies a task within an event.
    TaskId
);
string_id!(
    /// The department that owns a task.
    DepartmentId
);
string_id!(
    /// The event (festival, conference…) all departments belong to.
    EventId
);
string_id!(ZoneId);
string_id!(
    /// A department row inside a zone.
    ZonalRowId
);
string_id!(UserId);
string_id!(VenueId);

// ---------------------------------------------------------------------------
// Scope — the (event, department) pair every request is made against
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scope {
    pub event_id: EventId,
    pub department_id: DepartmentId,
}

impl Scope {
    pub fn new(event_id: impl Into<EventId>, department_id: impl Into<DepartmentId>) -> Self {
        Self {
            event_id: event_id.into(),
            department_id: department_id.into(),
        }
    }

    /// Same event, another department.
    pub fn with_department(&self, department_id: DepartmentId) -> Self {
        Self {
            event_id: self.event_id.clone(),
            department_id,
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.event_id, self.department_id)
    }
}
