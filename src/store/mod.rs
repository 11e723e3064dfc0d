//! Durable key-value slots and the snapshot layer on top of them.

use std::{collections::HashMap, sync::Mutex};

use crate::error::{PersistenceError, PersistenceResult};

pub mod snapshot;
pub mod sqlite;

pub use snapshot::{LoadSource, SnapshotStore};
pub use sqlite::SqliteStore;

/// A durable read/write pair. Either side may fail; callers decide whether a
/// failure matters.
pub trait KeyValueStore: Send + Sync {
    fn read(&self, key: &str) -> PersistenceResult<Option<String>>;
    fn write(&self, key: &str, value: &str) -> PersistenceResult<()>;
}

/// Process-local store. Contents are lost when it is dropped.
#[derive(Debug, Default)]
pub struct MemoryStore {
    slots: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn read(&self, key: &str) -> PersistenceResult<Option<String>> {
        let guard = self
            .slots
            .lock()
            .map_err(|err| PersistenceError::Unavailable(err.to_string()))?;
        Ok(guard.get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> PersistenceResult<()> {
        let mut guard = self
            .slots
            .lock()
            .map_err(|err| PersistenceError::Unavailable(err.to_string()))?;
        guard.insert(key.to_string(), value.to_string());
        Ok(())
    }
}
