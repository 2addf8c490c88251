//! In-memory key-value store
//!
//! This module provides [`MemoryStore`], a HashMap-backed implementation of
//! [`KeyValueStore`] with no durability. It backs unit tests and ephemeral
//! sessions that should never touch the filesystem.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::error::{MixtapeError, Result};
use crate::store::KeyValueStore;

/// In-process store holding all entries in a mutex-guarded map.
///
/// Contents vanish when the value is dropped. Cheap to construct, so tests
/// create one per case.
///
/// # Examples
///
/// ```
/// use mixtape::store::{memory::MemoryStore, KeyValueStore};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> mixtape::error::Result<()> {
/// let store = MemoryStore::new();
/// store.set("k", "v".to_string()).await?;
/// assert_eq!(store.get("k").await?, Some("v".to_string()));
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>> {
        self.entries
            .lock()
            .map_err(|_| MixtapeError::StorageUnavailable("memory store lock poisoned".to_string()).into())
    }
}

#[async_trait::async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries()?.get(key).cloned())
    }

    async fn set(&self, key: &str, value: String) -> Result<()> {
        self.entries()?.insert(key.to_string(), value);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.entries()?.remove(key);
        Ok(())
    }

    async fn list_keys(&self) -> Result<Vec<String>> {
        Ok(self.entries()?.keys().cloned().collect())
    }
}
