//! # Record Store Adapter
//!
//! In-memory key-value substrate for tests and the single-process node.
//! A real deployment would back `RecordStore` with the ledger world state.

use crate::errors::StoreError;
use crate::ports::outbound::RecordStore;
use std::collections::HashMap;
use std::sync::RwLock;

/// In-memory record store.
#[derive(Debug, Default)]
pub struct InMemoryRecordStore {
    entries: RwLock<HashMap<String, Vec<u8>>>,
}

impl InMemoryRecordStore {
    /// Create a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys written.
    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl RecordStore for InMemoryRecordStore {
    fn get_state(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let entries = self
            .entries
            .read()
            .map_err(|_| StoreError::Unavailable("record store lock poisoned".to_string()))?;
        Ok(entries.get(key).cloned())
    }

    fn put_state(&self, key: &str, value: Vec<u8>) -> Result<(), StoreError> {
        if key.is_empty() {
            return Err(StoreError::WriteRejected {
                key: String::new(),
                reason: "empty key".to_string(),
            });
        }
        let mut entries = self
            .entries
            .write()
            .map_err(|_| StoreError::Unavailable("record store lock poisoned".to_string()))?;
        entries.insert(key.to_string(), value);
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_missing_is_none() {
        let store = InMemoryRecordStore::new();
        assert_eq!(store.get_state("p1").unwrap(), None);
        assert!(store.is_empty());
    }

    #[test]
    fn test_put_then_get() {
        let store = InMemoryRecordStore::new();
        store.put_state("p1", b"one".to_vec()).unwrap();
        store.put_state("p1", b"two".to_vec()).unwrap();

        assert_eq!(store.get_state("p1").unwrap(), Some(b"two".to_vec()));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_empty_key_rejected() {
        let store = InMemoryRecordStore::new();
        assert!(matches!(
            store.put_state("", Vec::new()),
            Err(StoreError::WriteRejected { .. })
        ));
    }
}
