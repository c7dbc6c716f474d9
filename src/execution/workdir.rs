//! Scoped working directory for script execution.
//!
//! The process-wide current directory is never changed. A
//! [`WorkingDirectory`] resolves the directory a script must run in, checks it
//! exists, and records entering and leaving it in the audit log. Leaving is
//! recorded when the guard drops, on every exit path.

use std::path::{Path, PathBuf};

use super::ExecutionError;
use crate::audit::AuditLog;

/// Guard over the directory a script runs in.
#[derive(Debug)]
pub struct WorkingDirectory<'a> {
    original: PathBuf,
    entered: Option<PathBuf>,
    audit: &'a AuditLog,
}

impl<'a> WorkingDirectory<'a> {
    /// Enter `dir`, or stay in the current directory when `dir` is `None`.
    pub fn enter(dir: Option<&Path>, audit: &'a AuditLog) -> Result<Self, ExecutionError> {
        let original = std::env::current_dir().map_err(|source| ExecutionError::WorkingDirectory {
            path: PathBuf::from("."),
            source,
        })?;

        let Some(dir) = dir else {
            return Ok(Self {
                original,
                entered: None,
                audit,
            });
        };

        let target = original.join(dir);
        let metadata =
            std::fs::metadata(&target).map_err(|source| ExecutionError::WorkingDirectory {
                path: dir.to_path_buf(),
                source,
            })?;
        if !metadata.is_dir() {
            return Err(ExecutionError::NotADirectory(dir.to_path_buf()));
        }

        tracing::debug!(dir = %dir.display(), "Entering script directory");
        audit.info(format!("切換到工作目錄: {}", dir.display()));

        Ok(Self {
            original,
            entered: Some(target),
            audit,
        })
    }

    /// Directory the script should run in.
    pub fn path(&self) -> &Path {
        self.entered.as_deref().unwrap_or(&self.original)
    }

    /// Whether a script directory was entered.
    pub fn is_entered(&self) -> bool {
        self.entered.is_some()
    }
}

impl Drop for WorkingDirectory<'_> {
    fn drop(&mut self) {
        if self.entered.is_some() {
            tracing::debug!(dir = %self.original.display(), "Leaving script directory");
            self.audit
                .info(format!("切換回原始目錄: {}", self.original.display()));
        }
    }
}
