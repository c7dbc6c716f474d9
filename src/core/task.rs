//! Task definitions as stored in the registry.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// A registered task: the script it runs and when it last ran.
///
/// `last_run` is an advisory cache for display. Due-date decisions read the
/// audit log instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskDefinition {
    /// Path to the script, optionally with a directory component.
    pub script_path: PathBuf,
    /// Local timestamp of the last successful run, if any.
    #[serde(default)]
    pub last_run: Option<String>,
}

impl TaskDefinition {
    /// Create a definition that has never run.
    pub fn new(script_path: impl Into<PathBuf>) -> Self {
        Self {
            script_path: script_path.into(),
            last_run: None,
        }
    }

    /// Directory containing the script, if the path has one.
    pub fn script_dir(&self) -> Option<&Path> {
        self.script_path
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
    }

    /// Base name of the script.
    pub fn script_name(&self) -> Option<&str> {
        self.script_path.file_name().and_then(|name| name.to_str())
    }
}
