//! JSON task fixtures: the data file the in-memory backend serves.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::model::{DepartmentId, DependencyEdge, EventId, Member, Task};

#[derive(thiserror::Error, Debug)]
pub enum FixtureError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid fixture {path}: {source}")]
    Malformed {
        path: PathBuf,
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fixture {
    pub event_id: EventId,
    #[serde(default)]
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub dependencies: Vec<DependencyEdge>,
    #[serde(default)]
    pub members: HashMap<DepartmentId, Vec<Member>>,
}

impl Fixture {
    pub fn load(path: &Path) -> Result<Self, FixtureError> {
        let content = std::fs::read_to_string(path).map_err(|e| FixtureError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::parse(&content, path)
    }

    /// `origin` is only used in error messages.
    pub fn parse(content: &str, origin: &Path) -> Result<Self, FixtureError> {
        serde_json::from_str(content).map_err(|e| FixtureError::Malformed {
            path: origin.to_path_buf(),
            source: e,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_fixture() {
        let fixture = Fixture::parse(r#"{"eventId": "fest"}"#, Path::new("inline")).unwrap();
        assert_eq!(fixture.event_id, EventId::new("fest"));
        assert!(fixture.tasks.is_empty());
    }

    #[test]
    fn test_malformed_fixture_names_the_file() {
        let err = Fixture::parse("{", Path::new("broken.json")).unwrap_err();
        assert!(err.to_string().contains("broken.json"));
    }
}
