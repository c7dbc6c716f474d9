//! Due-date resolution from the audit log.
//!
//! A task is due when the audit log holds no success record for it dated
//! today (in the configured zone). The registry's `last_run` is never read
//! here.

use chrono::NaiveDate;

use crate::audit::{AuditLog, AuditRecord};
use crate::core::clock::parse_timestamp;
use crate::core::types::TaskName;

/// Answers "when did this task last succeed" and "is it due today".
#[derive(Debug, Clone)]
pub struct DueDateResolver {
    audit: AuditLog,
}

impl DueDateResolver {
    /// Create a resolver over the given audit log.
    pub fn new(audit: AuditLog) -> Self {
        Self { audit }
    }

    /// Local date of the most recent success record for `task`.
    ///
    /// Scans newest to oldest. A matching record whose timestamp does not
    /// parse is reported and skipped. A missing or unreadable log yields
    /// `None`.
    pub fn last_success_date(&self, task: &TaskName) -> Option<NaiveDate> {
        let decoded = match self.audit.read() {
            Ok(Some(decoded)) => decoded,
            Ok(None) => return None,
            Err(e) => {
                tracing::error!(task = %task, error = %e, "Failed to read audit log, treating task as never run");
                self.audit.error(format!("讀取日誌文件時出錯: {}", e));
                return None;
            }
        };

        let tz = self.audit.clock().timezone();
        for line in decoded.text.lines().rev() {
            let record = AuditRecord::parse(line);
            if !record.is_success_for(task) {
                continue;
            }

            match parse_timestamp(&record.timestamp, tz) {
                Ok(at) => return Some(at.date_naive()),
                Err(e) => {
                    tracing::error!(task = %task, error = %e, "Skipping success record with unparsable timestamp");
                    self.audit.error(format!("解析日期時出錯: {}", e));
                }
            }
        }

        None
    }

    /// Whether `task` should run on `today`.
    ///
    /// A last success dated today or later (clock skew) is not due.
    pub fn is_due_on(&self, task: &TaskName, today: NaiveDate) -> bool {
        due_after(self.last_success_date(task), today)
    }

    /// Whether `task` should run today according to the log's clock.
    pub fn is_due(&self, task: &TaskName) -> bool {
        self.is_due_on(task, self.audit.clock().today())
    }
}

/// Whether a task whose last success was `last_success` is due on `today`.
pub fn due_after(last_success: Option<NaiveDate>, today: NaiveDate) -> bool {
    last_success.is_none_or(|last| last < today)
}
