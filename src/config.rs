//! Configuration: optional YAML file, overridden by CLI flags and env.
//!
//! Every field has a default, so an empty or missing file is fine:
//!
//! ```yaml
//! scale: week
//! lead_days: 3
//! trail_days: 7
//! fallback_days: 21
//! search_debounce_ms: 250
//! label_pane_width: 320
//! timeline_pane_width: 960
//! log_dir: /var/log/event-timeline
//! link_departments: [power, catering]
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::model::{DepartmentId, Scale};
use crate::timeline::GridConfig;

pub const LOG_DIR_ENV: &str = "EVENT_TIMELINE_LOG_DIR";

/// Upper bound for every day buffer: ten years either side.
pub const MAX_BUFFER_DAYS: i64 = 3650;

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid config {path}: {source}")]
    Yaml {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    #[error("Invalid value for {field}: {message}")]
    Invalid {
        field: &'static str,
        message: String,
    },
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub scale: Scale,
    pub lead_days: i64,
    pub trail_days: i64,
    pub fallback_days: i64,
    pub search_debounce_ms: u64,
    /// Width of the frozen label pane, in pixels.
    pub label_pane_width: f32,
    /// Width of the scrollable timeline pane, in pixels.
    pub timeline_pane_width: f32,
    pub log_dir: Option<PathBuf>,
    /// Departments the link picker offers besides the page's own.
    pub link_departments: Vec<DepartmentId>,
}

impl Default for Config {
    fn default() -> Self {
        let grid = GridConfig::default();
        Self {
            scale: Scale::Day,
            lead_days: grid.lead_days,
            trail_days: grid.trail_days,
            fallback_days: grid.fallback_days,
            search_debounce_ms: 250,
            label_pane_width: 320.0,
            timeline_pane_width: 960.0,
            log_dir: None,
            link_departments: Vec::new(),
        }
    }
}

impl Config {
    /// Load from `path`, or defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) => {
                let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
                    path: path.to_path_buf(),
                    source: e,
                })?;
                Self::parse(&content, path)?
            }
            None => Self::default(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn parse(content: &str, origin: &Path) -> Result<Self, ConfigError> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content).map_err(|e| ConfigError::Yaml {
            path: origin.to_path_buf(),
            source: e,
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value, min) in [
            ("lead_days", self.lead_days, 0),
            ("trail_days", self.trail_days, 0),
            ("fallback_days", self.fallback_days, 1),
        ] {
            if !(min..=MAX_BUFFER_DAYS).contains(&value) {
                return Err(ConfigError::Invalid {
                    field,
                    message: format!("must be between {min} and {MAX_BUFFER_DAYS}, got {value}"),
                });
            }
        }
        for (field, value) in [
            ("label_pane_width", self.label_pane_width),
            ("timeline_pane_width", self.timeline_pane_width),
        ] {
            if value <= 0.0 || !value.is_finite() {
                return Err(ConfigError::Invalid {
                    field,
                    message: format!("must be a positive width, got {value}"),
                });
            }
        }
        Ok(())
    }

    pub fn grid(&self) -> GridConfig {
        GridConfig {
            lead_days: self.lead_days,
            trail_days: self.trail_days,
            fallback_days: self.fallback_days,
        }
    }

    pub fn search_debounce(&self) -> Duration {
        Duration::from_millis(self.search_debounce_ms)
    }

    /// Env var first, then the config value, then a temp directory.
    pub fn resolve_log_dir(&self) -> PathBuf {
        std::env::var(LOG_DIR_ENV)
            .map(PathBuf::from)
            .ok()
            .or_else(|| self.log_dir.clone())
            .unwrap_or_else(|| std::env::temp_dir().join("event-timeline"))
    }
}
