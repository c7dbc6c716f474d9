//! JSON file registry backend.
//!
//! The document is an object keyed by task name, in registration order:
//!
//! ```json
//! {
//!     "Backup": {
//!         "script_path": "/srv/jobs/backup.py",
//!         "last_run": "2024-05-01 09:00:00"
//!     }
//! }
//! ```

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Map, Value};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use super::{RegistryError, RegistryStore, TaskTable};
use crate::core::task::TaskDefinition;
use crate::core::types::TaskName;

const INDENT: &[u8] = b"    ";

/// Registry persisted as a pretty-printed UTF-8 JSON document.
#[derive(Debug, Clone)]
pub struct JsonFileRegistry {
    path: PathBuf,
}

impl JsonFileRegistry {
    /// Create a backend for the given file. Nothing is read until `load`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn parse(&self, bytes: &[u8]) -> Result<TaskTable, RegistryError> {
        let malformed = |source| RegistryError::Malformed {
            path: self.path.clone(),
            source,
        };

        let document: Map<String, Value> = serde_json::from_slice(bytes).map_err(malformed)?;
        let mut table = TaskTable::new();
        for (name, value) in document {
            let definition: TaskDefinition = serde_json::from_value(value).map_err(malformed)?;
            table.insert(TaskName::new(name), definition);
        }
        Ok(table)
    }

    fn render(table: &TaskTable) -> Result<Vec<u8>, RegistryError> {
        let mut document = Map::new();
        for (name, definition) in table.iter() {
            document.insert(name.to_string(), serde_json::to_value(definition)?);
        }

        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(INDENT);
        let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
        document.serialize(&mut serializer)?;
        Ok(buf)
    }

    fn io_error(&self, source: std::io::Error) -> RegistryError {
        RegistryError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

#[async_trait]
impl RegistryStore for JsonFileRegistry {
    async fn load(&self) -> Result<TaskTable, RegistryError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => self.parse(&bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::info!(path = %self.path.display(), "Registry file not found, creating an empty one");
                let table = TaskTable::new();
                self.save(&table).await?;
                Ok(table)
            }
            Err(e) => Err(self.io_error(e)),
        }
    }

    async fn save(&self, table: &TaskTable) -> Result<(), RegistryError> {
        let bytes = Self::render(table)?;
        tokio::fs::write(&self.path, bytes)
            .await
            .map_err(|e| self.io_error(e))
    }
}
