//! In-memory registry backend.
//!
//! Thread-safe storage using RwLock. Data is not persisted across restarts.

use async_trait::async_trait;
use std::sync::RwLock;

use super::{RegistryError, RegistryStore, TaskTable};

/// In-memory registry backend for tests and dry runs.
#[derive(Debug, Default)]
pub struct InMemoryRegistry {
    table: RwLock<TaskTable>,
    saves: RwLock<usize>,
}

impl InMemoryRegistry {
    /// Create an empty backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of times the table was saved.
    pub fn save_count(&self) -> usize {
        self.saves.read().map(|n| *n).unwrap_or(0)
    }
}

#[async_trait]
impl RegistryStore for InMemoryRegistry {
    async fn load(&self) -> Result<TaskTable, RegistryError> {
        let table = self.table.read().map_err(|_| RegistryError::LockPoisoned)?;
        Ok(table.clone())
    }

    async fn save(&self, table: &TaskTable) -> Result<(), RegistryError> {
        *self.table.write().map_err(|_| RegistryError::LockPoisoned)? = table.clone();
        *self.saves.write().map_err(|_| RegistryError::LockPoisoned)? += 1;
        Ok(())
    }
}
