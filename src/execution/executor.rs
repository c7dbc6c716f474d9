//! Task executor.
//!
//! Side effects of a run happen in a fixed order: enter the script directory,
//! invoke the script, store `last_run` in the registry, append the success
//! record, leave the directory. On failure the directory is left first and the
//! failure record follows.

use chrono::DateTime;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::script::{Interpreter, ScriptCommand};
use super::workdir::WorkingDirectory;
use super::ExecutionError;
use crate::audit::{AuditLevel, AuditLog, success_message};
use crate::core::clock::format_timestamp;
use crate::core::task::TaskDefinition;
use crate::core::types::TaskName;
use crate::registry::Registry;

/// How the script's exit status affects the recorded outcome.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitStatusPolicy {
    /// Any completed invocation counts as a success.
    #[default]
    Ignore,
    /// Only exit status zero counts as a success.
    RequireSuccess,
}

/// What a successful run observed.
#[derive(Debug, Clone)]
pub struct ExecutionOutcome {
    pub task: TaskName,
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    pub duration: Duration,
    pub finished_at: DateTime<Tz>,
}

/// Runs task scripts and records their completion.
#[derive(Debug, Clone)]
pub struct TaskExecutor {
    audit: AuditLog,
    interpreter: Interpreter,
    exit_policy: ExitStatusPolicy,
}

impl TaskExecutor {
    /// Create an executor that records into `audit`.
    pub fn new(audit: AuditLog) -> Self {
        Self {
            audit,
            interpreter: Interpreter::default(),
            exit_policy: ExitStatusPolicy::default(),
        }
    }

    /// Set the interpreter used to run scripts.
    pub fn with_interpreter(mut self, interpreter: Interpreter) -> Self {
        self.interpreter = interpreter;
        self
    }

    /// Set the exit status policy.
    pub fn with_exit_policy(mut self, policy: ExitStatusPolicy) -> Self {
        self.exit_policy = policy;
        self
    }

    /// The audit log this executor writes to.
    pub fn audit(&self) -> &AuditLog {
        &self.audit
    }

    /// Look up `task` in the registry and execute it.
    ///
    /// Every failure is recorded in the audit log before it is returned.
    pub async fn run(
        &self,
        registry: &mut Registry,
        task: &TaskName,
    ) -> Result<ExecutionOutcome, ExecutionError> {
        let Some(definition) = registry.get(task).cloned() else {
            tracing::error!(task = %task, "Task not registered");
            self.audit.error(format!("任務不存在: {}", task));
            return Err(ExecutionError::UnknownTask(task.clone()));
        };

        match self.execute(registry, task, &definition).await {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                tracing::error!(task = %task, error = %e, "Task failed");
                self.audit.error(format!("執行任務失敗 {}: {}", task, e));
                Err(e)
            }
        }
    }

    /// Execute a definition and record its success.
    ///
    /// Failures are returned without being recorded; see [`TaskExecutor::run`].
    pub async fn execute(
        &self,
        registry: &mut Registry,
        task: &TaskName,
        definition: &TaskDefinition,
    ) -> Result<ExecutionOutcome, ExecutionError> {
        let script = definition
            .script_name()
            .ok_or_else(|| ExecutionError::InvalidScriptPath(definition.script_path.clone()))?;

        let workdir = WorkingDirectory::enter(definition.script_dir(), &self.audit)?;

        tracing::info!(task = %task, script = %definition.script_path.display(), "Running task");
        let output = ScriptCommand::builder(&self.interpreter, script)
            .working_dir(workdir.path())
            .build()
            .run()
            .await?;

        if !output.success() {
            match self.exit_policy {
                ExitStatusPolicy::RequireSuccess => {
                    return Err(ExecutionError::ScriptFailed {
                        code: output.exit_code,
                        stderr: output.stderr,
                    });
                }
                ExitStatusPolicy::Ignore => {
                    tracing::warn!(task = %task, exit_code = ?output.exit_code, "Script exited unsuccessfully, recording as run");
                }
            }
        }

        let finished_at = self.audit.clock().now();
        registry
            .record_run(task, format_timestamp(&finished_at))
            .await?;
        self.audit.append(AuditLevel::Info, success_message(task))?;
        tracing::info!(task = %task, duration = ?output.duration, "Task completed");

        Ok(ExecutionOutcome {
            task: task.clone(),
            exit_code: output.exit_code,
            stdout: output.stdout,
            stderr: output.stderr,
            duration: output.duration,
            finished_at,
        })
    }
}
