//! In-memory byte store.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use crate::error::{KeystashError, Result};
use crate::store::traits::ByteStore;

/// Process-local byte store backed by a `HashMap`.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_entries(&self) -> Result<MutexGuard<'_, HashMap<String, Vec<u8>>>> {
        self.entries
            .lock()
            .map_err(|_| KeystashError::Store("Memory store poisoned".to_string()))
    }

    /// Snapshot of the stored keys, sorted.
    pub fn keys(&self) -> Result<Vec<String>> {
        let mut keys: Vec<String> = self.lock_entries()?.keys().cloned().collect();
        keys.sort();
        Ok(keys)
    }

    pub fn len(&self) -> Result<usize> {
        Ok(self.lock_entries()?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.lock_entries()?.is_empty())
    }
}

impl ByteStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.lock_entries()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<()> {
        self.lock_entries()?.insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<()> {
        self.lock_entries()?.remove(key);
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        self.lock_entries()?.clear();
        Ok(())
    }
}
