//! Task execution.
//!
//! Running a task means invoking its script in the script's own directory,
//! then recording the run in the registry and the audit log.

mod executor;
mod script;
mod workdir;

pub use executor::{ExecutionOutcome, ExitStatusPolicy, TaskExecutor};
pub use script::{Interpreter, ScriptCommand, ScriptCommandBuilder, ScriptOutput};
pub use workdir::WorkingDirectory;

use std::path::PathBuf;
use thiserror::Error;

use crate::audit::AuditError;
use crate::core::types::TaskName;
use crate::registry::RegistryError;

/// Errors that can occur while orchestrating a task run.
#[derive(Debug, Error)]
pub enum ExecutionError {
    /// No task with this name is registered.
    #[error("task not registered: {0}")]
    UnknownTask(TaskName),

    /// The script path has no file name.
    #[error("invalid script path: {}", .0.display())]
    InvalidScriptPath(PathBuf),

    /// The script directory could not be resolved.
    #[error("cannot use directory '{}': {source}", .path.display())]
    WorkingDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The script's parent path is not a directory.
    #[error("not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    /// The interpreter process could not be started.
    #[error("failed to start '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The script exited unsuccessfully under a policy that checks it.
    #[error("script exited with {}", exit_description(.code))]
    ScriptFailed { code: Option<i32>, stderr: String },

    /// The registry could not record the run.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// The audit log could not record the run.
    #[error(transparent)]
    Audit(#[from] AuditError),
}

fn exit_description(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("code {}", code),
        None => "no exit code (terminated by signal)".to_string(),
    }
}
