//! Append-only audit log.
//!
//! The audit log is the durable record of what the runner did and the only
//! source consulted when deciding whether a task already ran today. Records are
//! appended one line at a time; the file is opened and closed per write.

mod encoding;
mod record;

pub use encoding::{DecodeError, DecodedText, LOG_ENCODINGS, decode_with_fallback};
pub use record::{
    AuditLevel, AuditRecord, FIELD_DELIMITER, SUCCESS_MARKER, is_success_message, success_message,
};

use encoding_rs::Encoding;
use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::core::clock::LocalClock;

/// Errors that can occur while reading or writing the audit log.
#[derive(Debug, Error)]
pub enum AuditError {
    /// Failed to open, read or append to the log file.
    #[error("audit log '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The log could not be decoded with any supported encoding.
    #[error("audit log '{path}': {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: DecodeError,
    },
}

/// Handle on the audit log file.
#[derive(Debug, Clone)]
pub struct AuditLog {
    path: PathBuf,
    clock: LocalClock,
    encodings: Vec<&'static Encoding>,
}

impl AuditLog {
    /// Create a handle. The file is created on the first append.
    pub fn new(path: impl Into<PathBuf>, clock: LocalClock) -> Self {
        Self {
            path: path.into(),
            clock,
            encodings: LOG_ENCODINGS.to_vec(),
        }
    }

    /// Replace the ordered list of encodings tried when reading.
    pub fn with_encodings(mut self, encodings: &[&'static Encoding]) -> Self {
        self.encodings = encodings.to_vec();
        self
    }

    /// Path of the log file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Clock used to timestamp records.
    pub fn clock(&self) -> &LocalClock {
        &self.clock
    }

    /// Append a record stamped with the current local time.
    pub fn append(
        &self,
        level: AuditLevel,
        message: impl Into<String>,
    ) -> Result<AuditRecord, AuditError> {
        let record = AuditRecord::new(self.clock.timestamp(), level, message);

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|source| self.io_error(source))?;
        writeln!(file, "{}", record).map_err(|source| self.io_error(source))?;

        Ok(record)
    }

    /// Append an informational record, logging instead of failing.
    pub fn info(&self, message: impl Into<String>) {
        self.append_or_warn(AuditLevel::Info, message.into());
    }

    /// Append an error record, logging instead of failing.
    pub fn error(&self, message: impl Into<String>) {
        self.append_or_warn(AuditLevel::Error, message.into());
    }

    fn append_or_warn(&self, level: AuditLevel, message: String) {
        if let Err(e) = self.append(level, &message) {
            tracing::warn!(error = %e, message = %message, "Failed to write audit record");
        }
    }

    /// Read and decode the whole log.
    ///
    /// Returns `Ok(None)` when the file does not exist yet.
    pub fn read(&self) -> Result<Option<DecodedText>, AuditError> {
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(self.io_error(source)),
        };

        decode_with_fallback(&bytes, &self.encodings)
            .map(Some)
            .map_err(|source| AuditError::Decode {
                path: self.path.clone(),
                source,
            })
    }

    /// All records in file order.
    pub fn records(&self) -> Result<Vec<AuditRecord>, AuditError> {
        Ok(self
            .read()?
            .map(|decoded| decoded.text.lines().map(AuditRecord::parse).collect())
            .unwrap_or_default())
    }

    fn io_error(&self, source: std::io::Error) -> AuditError {
        AuditError::Io {
            path: self.path.clone(),
            source,
        }
    }
}
