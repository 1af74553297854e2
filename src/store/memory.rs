//! In-memory result store.

use std::collections::BTreeMap;

use parking_lot::Mutex;

use super::{PersistenceError, ResultRecord, ResultStore};

/// A process-local store, mainly for library callers and tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<BTreeMap<String, ResultRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }

    /// Stored keys, in order.
    pub fn keys(&self) -> Vec<String> {
        self.records.lock().keys().cloned().collect()
    }
}

impl ResultStore for MemoryStore {
    fn upsert(&self, key: &str, record: &ResultRecord) -> Result<(), PersistenceError> {
        self.records.lock().insert(key.to_string(), record.clone());
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<ResultRecord>, PersistenceError> {
        Ok(self.records.lock().get(key).cloned())
    }
}
