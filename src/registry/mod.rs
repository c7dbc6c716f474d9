//! Task registry: the persisted table of task definitions.
//!
//! The registry is a cache for display and introspection. It is rewritten in
//! full on every change and is never consulted for due-date decisions.
//!
//! Persistence goes through a [`RegistryStore`] backend (JSON file or
//! in-memory), so the scheduling code never touches the file format directly.

mod json;
mod memory;

pub use json::JsonFileRegistry;
pub use memory::InMemoryRegistry;

use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

use crate::audit::AuditLog;
use crate::core::task::TaskDefinition;
use crate::core::types::TaskName;

/// Errors that can occur during registry operations.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// The requested task is not registered.
    #[error("task not registered: {0}")]
    NotFound(TaskName),

    /// Reading or writing the backing file failed.
    #[error("registry file '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The backing document is not a valid registry.
    #[error("registry file '{path}' is malformed: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Serialization of the registry failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Storage lock was poisoned.
    #[error("registry lock poisoned")]
    LockPoisoned,
}

/// Ordered table of task definitions.
///
/// Iteration order is insertion order. Re-registering a name keeps its slot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskTable {
    entries: Vec<(TaskName, TaskDefinition)>,
}

impl TaskTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a definition.
    pub fn insert(&mut self, name: TaskName, definition: TaskDefinition) {
        match self.get_mut(&name) {
            Some(existing) => *existing = definition,
            None => self.entries.push((name, definition)),
        }
    }

    /// Look up a definition.
    pub fn get(&self, name: &TaskName) -> Option<&TaskDefinition> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, d)| d)
    }

    /// Look up a definition for modification.
    pub fn get_mut(&mut self, name: &TaskName) -> Option<&mut TaskDefinition> {
        self.entries
            .iter_mut()
            .find(|(n, _)| n == name)
            .map(|(_, d)| d)
    }

    /// Task names in order.
    pub fn names(&self) -> Vec<TaskName> {
        self.entries.iter().map(|(n, _)| n.clone()).collect()
    }

    /// Iterate entries in order.
    pub fn iter(&self) -> impl Iterator<Item = (&TaskName, &TaskDefinition)> {
        self.entries.iter().map(|(n, d)| (n, d))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Storage backend for the task table.
#[async_trait]
pub trait RegistryStore: Send + Sync {
    /// Load the table. A backend with nothing stored yet returns an empty
    /// table and persists it.
    async fn load(&self) -> Result<TaskTable, RegistryError>;

    /// Replace the stored table.
    async fn save(&self, table: &TaskTable) -> Result<(), RegistryError>;
}

/// The task registry: an in-memory table kept in sync with its store.
///
/// Every mutation persists immediately.
pub struct Registry {
    store: Arc<dyn RegistryStore>,
    table: TaskTable,
    audit: Option<AuditLog>,
}

impl Registry {
    /// Load the registry from its store.
    pub async fn open(store: Arc<dyn RegistryStore>) -> Result<Self, RegistryError> {
        let table = store.load().await?;
        Ok(Self {
            store,
            table,
            audit: None,
        })
    }

    /// Record registrations in the audit log.
    pub fn with_audit(mut self, audit: AuditLog) -> Self {
        self.audit = Some(audit);
        self
    }

    /// Current table.
    pub fn table(&self) -> &TaskTable {
        &self.table
    }

    /// Look up a definition.
    pub fn get(&self, name: &TaskName) -> Option<&TaskDefinition> {
        self.table.get(name)
    }

    /// Registered task names in order.
    pub fn names(&self) -> Vec<TaskName> {
        self.table.names()
    }

    /// Register a task, replacing its script and clearing `last_run`.
    pub async fn upsert(
        &mut self,
        name: TaskName,
        script_path: impl Into<PathBuf>,
    ) -> Result<(), RegistryError> {
        self.table
            .insert(name.clone(), TaskDefinition::new(script_path));
        self.save().await?;

        tracing::info!(task = %name, "Registered task");
        if let Some(audit) = &self.audit {
            audit.info(format!("添加新任務: {}", name));
        }
        Ok(())
    }

    /// Store the time of a successful run.
    pub async fn record_run(
        &mut self,
        name: &TaskName,
        timestamp: impl Into<String>,
    ) -> Result<(), RegistryError> {
        let definition = self
            .table
            .get_mut(name)
            .ok_or_else(|| RegistryError::NotFound(name.clone()))?;
        definition.last_run = Some(timestamp.into());
        self.save().await
    }

    /// Persist the current table.
    pub async fn save(&self) -> Result<(), RegistryError> {
        self.store.save(&self.table).await
    }
}
