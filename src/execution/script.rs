//! External script invocation.
//!
//! [`ScriptCommand`] runs `<interpreter> [interpreter args] <script>` as a
//! child process with an explicit working directory and captures its output.
//!
//! ```rust,no_run
//! use taskmon::{Interpreter, ScriptCommand};
//!
//! # async fn demo() -> Result<(), taskmon::ExecutionError> {
//! let output = ScriptCommand::builder(&Interpreter::new("python"), "backup.py")
//!     .working_dir("/srv/jobs")
//!     .build()
//!     .run()
//!     .await?;
//! println!("exit: {:?}", output.exit_code);
//! # Ok(())
//! # }
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::Command;

use super::ExecutionError;

/// Program used to run task scripts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interpreter {
    /// Executable name or path.
    pub program: String,
    /// Arguments placed before the script name.
    #[serde(default)]
    pub args: Vec<String>,
}

impl Interpreter {
    /// Interpreter without extra arguments.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Add an argument placed before the script name.
    pub fn with_arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new("python")
    }
}

/// Captured result of a finished script.
#[derive(Debug, Clone)]
pub struct ScriptOutput {
    /// Exit code; `None` when the process was killed by a signal.
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    pub duration: Duration,
}

impl ScriptOutput {
    /// Whether the process exited with status zero.
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// A prepared script invocation.
#[derive(Debug, Clone)]
pub struct ScriptCommand {
    program: String,
    args: Vec<String>,
    working_dir: Option<PathBuf>,
}

impl ScriptCommand {
    /// Create a new builder for running `script` with `interpreter`.
    pub fn builder(interpreter: &Interpreter, script: impl Into<String>) -> ScriptCommandBuilder {
        ScriptCommandBuilder::new(interpreter, script)
    }

    /// Get the program being executed.
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Get the command arguments (interpreter args followed by the script).
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Get the working directory.
    pub fn working_dir(&self) -> Option<&PathBuf> {
        self.working_dir.as_ref()
    }

    /// Run the script to completion. There is no timeout.
    pub async fn run(&self) -> Result<ScriptOutput, ExecutionError> {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);

        if let Some(ref dir) = self.working_dir {
            cmd.current_dir(dir);
        }

        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        let start = Instant::now();
        let output = cmd.output().await.map_err(|source| ExecutionError::Spawn {
            program: self.program.clone(),
            source,
        })?;

        Ok(ScriptOutput {
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            duration: start.elapsed(),
        })
    }
}

/// Builder for creating `ScriptCommand` instances.
#[derive(Debug, Clone)]
pub struct ScriptCommandBuilder {
    program: String,
    args: Vec<String>,
    working_dir: Option<PathBuf>,
}

impl ScriptCommandBuilder {
    /// Create a new builder.
    pub fn new(interpreter: &Interpreter, script: impl Into<String>) -> Self {
        let mut args = interpreter.args.clone();
        args.push(script.into());
        Self {
            program: interpreter.program.clone(),
            args,
            working_dir: None,
        }
    }

    /// Set the working directory.
    pub fn working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Build the `ScriptCommand`.
    pub fn build(self) -> ScriptCommand {
        ScriptCommand {
            program: self.program,
            args: self.args,
            working_dir: self.working_dir,
        }
    }
}
