//! Key-value storage abstraction and implementations
//!
//! This module defines the [`KeyValueStore`] trait that all storage
//! backends must satisfy. Concrete implementations live in submodules:
//!
//! - [`sled::SledStore`] -- embedded `sled` database (durable default).
//! - [`memory::MemoryStore`] -- in-process HashMap store used in tests and
//!   for ephemeral sessions.
//!
//! # Design
//!
//! The [`KeyValueStore`] trait is intentionally minimal: opaque string keys
//! and string values, with `get`/`set`/`delete`/`list_keys` and no
//! transactional guarantees across calls. Each `set` is durable on its own
//! (at-least-once) as far as the backend allows. Everything typed lives one
//! layer up in [`JsonStore`], which serializes values as JSON and converts
//! undecodable stored values into
//! [`CorruptData`](crate::error::MixtapeError::CorruptData) instead of
//! silently coercing them to empty.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{MixtapeError, Result};

/// Abstraction over key-value storage backends.
///
/// Implementations exist for an embedded `sled` database and an in-memory
/// map. Callers use the trait polymorphically through
/// `Arc<dyn KeyValueStore>`, usually via [`JsonStore`].
///
/// A missing key is not an error: `get` returns `None` and `delete` is
/// idempotent.
#[async_trait::async_trait]
pub trait KeyValueStore: Send + Sync + std::fmt::Debug {
    /// Fetch the value stored under `key`.
    ///
    /// # Returns
    ///
    /// `Some(value)` if the key exists, `None` otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`MixtapeError::StorageUnavailable`] if the backend fails.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`, overwriting any previous value.
    ///
    /// # Errors
    ///
    /// Returns [`MixtapeError::StorageUnavailable`] if the write or the
    /// durability flush fails.
    async fn set(&self, key: &str, value: String) -> Result<()>;

    /// Remove the value stored under `key`.
    ///
    /// Deleting a missing key succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`MixtapeError::StorageUnavailable`] if the backend fails.
    async fn delete(&self, key: &str) -> Result<()>;

    /// List every key currently present in the store.
    ///
    /// # Errors
    ///
    /// Returns [`MixtapeError::StorageUnavailable`] if iteration fails.
    async fn list_keys(&self) -> Result<Vec<String>>;
}

/// Typed JSON layer over a [`KeyValueStore`].
///
/// Serializes values to JSON strings on write and deserializes on read. A
/// stored value that fails to deserialize into the requested type surfaces
/// as [`MixtapeError::CorruptData`] carrying the offending key; it is never
/// swallowed or treated as absent.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use mixtape::store::{JsonStore, memory::MemoryStore};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> mixtape::error::Result<()> {
/// let store = JsonStore::new(Arc::new(MemoryStore::new()));
/// store.set_json("greeting", &vec!["hello".to_string()]).await?;
/// let back: Option<Vec<String>> = store.get_json("greeting").await?;
/// assert_eq!(back, Some(vec!["hello".to_string()]));
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct JsonStore {
    inner: Arc<dyn KeyValueStore>,
}

impl JsonStore {
    /// Wrap a backend in the typed JSON layer
    pub fn new(inner: Arc<dyn KeyValueStore>) -> Self {
        Self { inner }
    }

    /// Fetch and deserialize the value stored under `key`.
    ///
    /// # Returns
    ///
    /// `Some(T)` if the key exists and parses, `None` if the key is absent.
    ///
    /// # Errors
    ///
    /// Returns [`MixtapeError::CorruptData`] if a stored value exists but
    /// does not deserialize into `T`, or
    /// [`MixtapeError::StorageUnavailable`] if the backend fails.
    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.inner.get(key).await? {
            Some(text) => {
                let value = serde_json::from_str(&text).map_err(|e| MixtapeError::CorruptData {
                    key: key.to_string(),
                    reason: e.to_string(),
                })?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    /// Serialize `value` as JSON and store it under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`MixtapeError::StorageUnavailable`] if the backend fails.
    pub async fn set_json<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let text = serde_json::to_string(value)?;
        self.inner.set(key, text).await
    }

    /// Remove the value stored under `key` (idempotent).
    pub async fn remove(&self, key: &str) -> Result<()> {
        self.inner.delete(key).await
    }

    /// List every key currently present in the backend.
    pub async fn keys(&self) -> Result<Vec<String>> {
        self.inner.list_keys().await
    }

    /// Access the raw backend, bypassing JSON encoding.
    pub fn raw(&self) -> &Arc<dyn KeyValueStore> {
        &self.inner
    }
}

pub mod memory;
pub mod sled;
