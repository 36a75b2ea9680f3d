//! Volatile store. Contents are lost when the process exits.

use super::{Durability, StorageError, TableStore, Tables};

/// Durability layer that keeps nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct Volatile;

impl Durability for Volatile {
    fn load(&self) -> Result<Tables, StorageError> {
        Ok(Tables::default())
    }

    fn persist(&self, _tables: &Tables) -> Result<(), StorageError> {
        Ok(())
    }
}

pub type MemoryStore = TableStore<Volatile>;

impl MemoryStore {
    pub fn new() -> Self {
        TableStore::with_tables(Tables::default(), Volatile)
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}
