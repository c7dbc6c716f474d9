//! Audit record line format.
//!
//! One record per line:
//!
//! ```text
//! 2024-05-01 09:00:00 - 成功執行任務: Backup
//! 2024-05-01 09:00:05 - ERROR - 執行任務失敗 Report: No such file or directory
//! ```

use std::fmt;

use crate::core::types::TaskName;

/// Separator between the timestamp, level and message fields.
pub const FIELD_DELIMITER: &str = " - ";

/// Marker that identifies a successful execution record.
pub const SUCCESS_MARKER: &str = "成功執行任務: ";

const ERROR_TAG: &str = "ERROR";

/// Severity of an audit record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditLevel {
    /// Routine event (registration, directory switch, success).
    Info,
    /// Failure event.
    Error,
}

/// A single audit-log line, split into its fields.
///
/// The timestamp is kept as text: a malformed timestamp must not prevent the
/// rest of the line from being inspected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditRecord {
    pub timestamp: String,
    pub level: AuditLevel,
    pub message: String,
}

impl AuditRecord {
    /// Build a record.
    pub fn new(timestamp: impl Into<String>, level: AuditLevel, message: impl Into<String>) -> Self {
        Self {
            timestamp: timestamp.into(),
            level,
            message: message.into(),
        }
    }

    /// Split a raw log line. Lines without a delimiter carry no timestamp.
    pub fn parse(line: &str) -> Self {
        let line = line.trim_end_matches(['\r', '\n']);
        let Some((timestamp, rest)) = line.split_once(FIELD_DELIMITER) else {
            return Self::new("", AuditLevel::Info, line);
        };

        let (level, message) = match rest.split_once(FIELD_DELIMITER) {
            Some((ERROR_TAG, message)) => (AuditLevel::Error, message),
            _ => (AuditLevel::Info, rest),
        };

        Self::new(timestamp.trim(), level, message)
    }

    /// Whether this record marks a successful run of `task`.
    pub fn is_success_for(&self, task: &TaskName) -> bool {
        self.level == AuditLevel::Info && is_success_message(&self.message, task)
    }
}

impl fmt::Display for AuditRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.level {
            AuditLevel::Info => write!(f, "{}{}{}", self.timestamp, FIELD_DELIMITER, self.message),
            AuditLevel::Error => write!(
                f,
                "{}{}{}{}{}",
                self.timestamp, FIELD_DELIMITER, ERROR_TAG, FIELD_DELIMITER, self.message
            ),
        }
    }
}

/// Message recorded after a task completes.
pub fn success_message(task: &TaskName) -> String {
    format!("{}{}", SUCCESS_MARKER, task)
}

/// Whether `message` is the success message for exactly `task`.
///
/// `成功執行任務: Backup2` is not a success of `Backup`. Surrounding
/// whitespace is ignored on both sides, since log lines lose trailing blanks.
pub fn is_success_message(message: &str, task: &TaskName) -> bool {
    match message.find(SUCCESS_MARKER) {
        Some(idx) => message[idx + SUCCESS_MARKER.len()..].trim() == task.as_str().trim(),
        None => false,
    }
}
