//! MemoryStorage - HashMap-backed key-value storage for testing and development.

use std::collections::HashMap;
use std::sync::RwLock;

use super::error::{StorageError, StorageResult};
use super::KeyValueStorage;

/// In-memory key-value storage
///
/// Values live only as long as the instance. Share it behind an `Arc` to
/// simulate several process "restarts" over the same device storage.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    values: RwLock<HashMap<String, String>>,
}

impl MemoryStorage {
    /// Create an empty storage
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a storage pre-populated with one value
    pub fn with_item(key: impl Into<String>, value: impl Into<String>) -> Self {
        let storage = Self::new();
        if let Ok(mut values) = storage.values.write() {
            values.insert(key.into(), value.into());
        }
        storage
    }

    /// Number of stored keys
    pub fn len(&self) -> usize {
        self.values.read().map(|v| v.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn poisoned() -> StorageError {
    StorageError::Unavailable("memory storage lock poisoned".into())
}

impl KeyValueStorage for MemoryStorage {
    fn get_item(&self, key: &str) -> StorageResult<Option<String>> {
        let values = self.values.read().map_err(|_| poisoned())?;
        Ok(values.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> StorageResult<()> {
        let mut values = self.values.write().map_err(|_| poisoned())?;
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> StorageResult<()> {
        let mut values = self.values.write().map_err(|_| poisoned())?;
        values.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get_remove() {
        let storage = MemoryStorage::new();
        assert!(storage.is_empty());

        storage.set_item("a", "1").unwrap();
        assert_eq!(storage.get_item("a").unwrap().as_deref(), Some("1"));
        assert_eq!(storage.len(), 1);

        storage.remove_item("a").unwrap();
        assert!(storage.get_item("a").unwrap().is_none());
    }

    #[test]
    fn test_with_item() {
        let storage = MemoryStorage::with_item("bookguide:shelf", "not json");
        assert_eq!(
            storage.get_item("bookguide:shelf").unwrap().as_deref(),
            Some("not json")
        );
    }
}
