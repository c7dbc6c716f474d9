//! YAML settings parsing.
//!
//! Parses runner settings and the task list from a YAML file.

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::error::ConfigError;
use crate::core::clock::{DEFAULT_TIMEZONE, parse_timezone};
use crate::execution::{ExitStatusPolicy, Interpreter};

/// Runner settings (taskmon.yaml).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// IANA zone that defines "today".
    pub timezone: String,
    /// Seconds between cycles.
    pub interval_secs: u64,
    /// Path of the audit log.
    pub audit_log: PathBuf,
    /// Path of the JSON registry.
    pub registry: PathBuf,
    /// Program used to run scripts.
    pub interpreter: Interpreter,
    /// Whether a non-zero exit counts as failure.
    pub exit_status: ExitStatusPolicy,
    /// Tasks registered at startup.
    pub tasks: Vec<TaskSourceConfig>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            timezone: DEFAULT_TIMEZONE.to_string(),
            interval_secs: 1800,
            audit_log: PathBuf::from("task_monitor.log"),
            registry: PathBuf::from("tasks_config.json"),
            interpreter: Interpreter::default(),
            exit_status: ExitStatusPolicy::default(),
            tasks: Vec::new(),
        }
    }
}

impl Settings {
    /// Pause between cycles.
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    /// Parsed time zone.
    pub fn tz(&self) -> Result<Tz, ConfigError> {
        parse_timezone(&self.timezone)
            .map_err(|_| ConfigError::InvalidConfig(format!("unknown timezone: {}", self.timezone)))
    }
}

/// A task entry in the settings file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskSourceConfig {
    /// Task name, the registry key.
    pub name: String,
    /// Script path, optionally with a directory component.
    pub script: PathBuf,
}

/// Loader for YAML settings.
pub struct YamlLoader;

impl YamlLoader {
    /// Load settings from a file.
    pub fn load_settings(path: impl AsRef<Path>) -> Result<Settings, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::FileReadError {
            path: path.to_path_buf(),
            source,
        })?;

        let settings: Settings =
            serde_yaml::from_str(&content).map_err(|source| ConfigError::YamlFileError {
                path: path.to_path_buf(),
                source,
            })?;
        Self::validate_settings(&settings)?;
        Ok(settings)
    }

    /// Parse settings from a YAML string.
    pub fn parse_settings(yaml: &str) -> Result<Settings, ConfigError> {
        let settings: Settings = serde_yaml::from_str(yaml)?;
        Self::validate_settings(&settings)?;
        Ok(settings)
    }

    /// Validate settings.
    fn validate_settings(settings: &Settings) -> Result<(), ConfigError> {
        if settings.interval_secs == 0 {
            return Err(ConfigError::InvalidConfig(
                "interval_secs must be greater than zero".into(),
            ));
        }

        settings.tz()?;

        if settings.interpreter.program.trim().is_empty() {
            return Err(ConfigError::MissingField("interpreter.program".into()));
        }

        let mut names = HashSet::new();
        for (index, task) in settings.tasks.iter().enumerate() {
            if task.name.trim().is_empty() {
                return Err(ConfigError::MissingField(format!("tasks[{}].name", index)));
            }
            if task.script.as_os_str().is_empty() {
                return Err(ConfigError::MissingField(format!(
                    "tasks[{}].script",
                    index
                )));
            }
            if !names.insert(task.name.as_str()) {
                return Err(ConfigError::InvalidConfig(format!(
                    "duplicate task name: {}",
                    task.name
                )));
            }
        }

        Ok(())
    }
}
