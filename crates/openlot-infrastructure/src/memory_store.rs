//! In-memory profile store for tests.

use openlot_core::error::Result;
use openlot_core::store::{ProfileStore, StoreKey};
use std::collections::HashMap;
use std::sync::Mutex;

/// A [`ProfileStore`] that keeps everything in a process-local map.
///
/// Used by tests and as a stand-in when no durable profile directory is
/// available. Semantics match the file store: last-writer-wins, full
/// rewrites, missing keys read as absent.
#[derive(Default)]
pub struct MemoryProfileStore {
    entries: Mutex<HashMap<StoreKey, serde_json::Value>>,
}

impl MemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries (test assertions).
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ProfileStore for MemoryProfileStore {
    fn read_value(&self, key: &StoreKey) -> Option<serde_json::Value> {
        self.entries.lock().unwrap().get(key).cloned()
    }

    fn write_value(&self, key: &StoreKey, value: serde_json::Value) -> Result<()> {
        self.entries.lock().unwrap().insert(key.clone(), value);
        Ok(())
    }

    fn remove(&self, key: &StoreKey) -> Result<()> {
        self.entries.lock().unwrap().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use openlot_core::store::{ProfileStoreExt, StoreNamespace};

    #[test]
    fn behaves_like_a_store() {
        let store = MemoryProfileStore::new();
        let key = StoreKey::scoped(StoreNamespace::ChatSessions, "u-1");
        store.write(&key, &vec!["a", "b"]).unwrap();
        assert_eq!(store.read::<Vec<String>>(&key), vec!["a", "b"]);
        store.remove(&key).unwrap();
        assert!(store.is_empty());
    }
}
