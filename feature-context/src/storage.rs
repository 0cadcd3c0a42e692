use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("storage is unavailable")]
    Unavailable,
    #[error("failed to (de)serialize stored value: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// String key-value persistence used for client-side caching.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: String) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
    fn clear(&self) -> Result<(), StorageError>;
    fn keys(&self) -> Result<Vec<String>, StorageError>;
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let entries = self.entries.read().map_err(|_| StorageError::Unavailable)?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: String) -> Result<(), StorageError> {
        let mut entries = self.entries.write().map_err(|_| StorageError::Unavailable)?;
        entries.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.write().map_err(|_| StorageError::Unavailable)?;
        entries.remove(key);
        Ok(())
    }

    fn clear(&self) -> Result<(), StorageError> {
        let mut entries = self.entries.write().map_err(|_| StorageError::Unavailable)?;
        entries.clear();
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, StorageError> {
        let entries = self.entries.read().map_err(|_| StorageError::Unavailable)?;
        Ok(entries.keys().cloned().collect())
    }
}

/// Application storage: namespaces keys under a prefix and never surfaces
/// store failures to callers, they are logged and read as missing.
pub struct StorageWrapper {
    store: Arc<dyn KeyValueStore>,
    prefix: String,
}

impl StorageWrapper {
    pub fn new(store: Arc<dyn KeyValueStore>, prefix: impl Into<String>) -> Self {
        Self {
            store,
            prefix: prefix.into(),
        }
    }

    fn namespaced(&self, key: &str) -> String {
        format!("{}{}", self.prefix, key)
    }

    pub fn get_item(&self, key: &str) -> Option<String> {
        self.store
            .get(&self.namespaced(key))
            .unwrap_or_else(|e| {
                tracing::warn!(key, "failed to read from storage: {}", e);
                None
            })
    }

    pub fn set_item(&self, key: &str, value: impl Into<String>) {
        if let Err(e) = self.store.set(&self.namespaced(key), value.into()) {
            tracing::warn!(key, "failed to write to storage: {}", e);
        }
    }

    pub fn remove_item(&self, key: &str) {
        if let Err(e) = self.store.remove(&self.namespaced(key)) {
            tracing::warn!(key, "failed to remove from storage: {}", e);
        }
    }

    pub fn get_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = self.get_item(key)?;
        serde_json::from_str(&raw)
            .map_err(|e| tracing::warn!(key, "discarding unreadable stored value: {}", e))
            .ok()
    }

    pub fn set_json<T: Serialize>(&self, key: &str, value: &T) {
        match serde_json::to_string(value).map_err(StorageError::from) {
            Ok(raw) => self.set_item(key, raw),
            Err(e) => tracing::warn!(key, "failed to store value: {}", e),
        }
    }

    /// Keys owned by this wrapper, without the prefix.
    pub fn keys(&self) -> Vec<String> {
        match self.store.keys() {
            Ok(keys) => keys
                .into_iter()
                .filter_map(|key| key.strip_prefix(&self.prefix).map(str::to_string))
                .collect(),
            Err(e) => {
                tracing::warn!("failed to list storage keys: {}", e);
                Vec::new()
            }
        }
    }

    pub fn len(&self) -> usize {
        self.keys().len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys().is_empty()
    }

    /// Removes only this wrapper's keys; other users of the store are untouched.
    pub fn clear(&self) {
        for key in self.keys() {
            self.remove_item(&key);
        }
    }
}
