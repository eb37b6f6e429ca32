use std::fmt;

/// Every request the core makes against the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    ListTasks,
    CreateTask,
    UpdateTask,
    ChangeStatus,
    DeleteTask,
    ListDependencies,
    AddDependency,
    RemoveDependency,
    SearchTasks,
    ListMembers,
}

impl Operation {
    pub fn label(self) -> &'static str {
        match self {
            Self::ListTasks => "list tasks",
            Self::CreateTask => "create task",
            Self::UpdateTask => "update task",
            Self::ChangeStatus => "change status",
            Self::DeleteTask => "delete task",
            Self::ListDependencies => "list dependencies",
            Self::AddDependency => "add dependency",
            Self::RemoveDependency => "remove dependency",
            Self::SearchTasks => "search tasks",
            Self::ListMembers => "list members",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    #[error("network error: {0}")]
    Transport(String),

    #[error("not allowed to {operation}")]
    Forbidden { operation: Operation },

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    #[error("invalid request: {0}")]
    Invalid(String),
}

/// How the UI surfaces a failure. Nothing is retried automatically.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Inline message the user can dismiss.
    Dismissible,
    /// Generic "not allowed" alert; the edit is rolled back.
    NotAllowed,
    /// The entity is gone; drop its row or close its drawer.
    Gone,
}

impl BackendError {
    pub fn not_found(entity: &'static str, id: impl fmt::Display) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn disposition(&self) -> Disposition {
        match self {
            Self::Transport(_) | Self::Invalid(_) => Disposition::Dismissible,
            Self::Forbidden { .. } => Disposition::NotAllowed,
            Self::NotFound { .. } => Disposition::Gone,
        }
    }
}
