//! Embedded sled-backed key-value store
//!
//! The durable default backend for named collections. Every write is
//! followed by a flush so an acknowledged `set` survives a crash.

use std::path::Path;

use directories::ProjectDirs;
use sled::Db;

use crate::error::{MixtapeError, Result};
use crate::store::KeyValueStore;

/// Environment variable overriding the default store directory.
///
/// Points the binary at a test or alternate store without changing the
/// user's application data dir.
pub const STORE_DIR_ENV: &str = "MIXTAPE_STORE_DIR";

/// Key-value store backed by an embedded `sled` database.
pub struct SledStore {
    db: Db,
}

impl std::fmt::Debug for SledStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SledStore").finish_non_exhaustive()
    }
}

impl SledStore {
    /// Open or create the store at the default location
    ///
    /// Honors [`STORE_DIR_ENV`] when set; otherwise resolves the platform
    /// data directory and creates it if needed.
    ///
    /// # Errors
    ///
    /// Returns `MixtapeError::StorageUnavailable` if the data directory
    /// cannot be determined or created, or the database cannot be opened
    pub fn open_default() -> Result<Self> {
        if let Ok(override_dir) = std::env::var(STORE_DIR_ENV) {
            return Self::open(Path::new(&override_dir).join("collections.db"));
        }

        let proj_dirs = ProjectDirs::from("com", "mixtapehq", "mixtape").ok_or_else(|| {
            MixtapeError::StorageUnavailable("Could not determine data directory".into())
        })?;

        let data_dir = proj_dirs.data_dir();
        std::fs::create_dir_all(data_dir).map_err(|e| {
            MixtapeError::StorageUnavailable(format!("Failed to create data directory: {}", e))
        })?;

        Self::open(data_dir.join("collections.db"))
    }

    /// Open or create a store at the given directory
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the database directory
    ///
    /// # Errors
    ///
    /// Returns `MixtapeError::StorageUnavailable` if the database cannot be
    /// opened
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use mixtape::store::sled::SledStore;
    ///
    /// # fn main() -> mixtape::error::Result<()> {
    /// let store = SledStore::open("/tmp/collections.db")?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let db = sled::open(path).map_err(|e| {
            MixtapeError::StorageUnavailable(format!("Failed to open database: {}", e))
        })?;
        Ok(Self { db })
    }
}

#[async_trait::async_trait]
impl KeyValueStore for SledStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        match self
            .db
            .get(key.as_bytes())
            .map_err(|e| MixtapeError::StorageUnavailable(format!("Get failed: {}", e)))?
        {
            Some(bytes) => {
                let text = String::from_utf8(bytes.to_vec()).map_err(|e| {
                    MixtapeError::CorruptData {
                        key: key.to_string(),
                        reason: format!("stored value is not UTF-8: {}", e),
                    }
                })?;
                Ok(Some(text))
            }
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: String) -> Result<()> {
        self.db
            .insert(key.as_bytes(), value.into_bytes())
            .map_err(|e| MixtapeError::StorageUnavailable(format!("Insert failed: {}", e)))?;

        self.db
            .flush_async()
            .await
            .map_err(|e| MixtapeError::StorageUnavailable(format!("Flush failed: {}", e)))?;

        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.db
            .remove(key.as_bytes())
            .map_err(|e| MixtapeError::StorageUnavailable(format!("Remove failed: {}", e)))?;

        self.db
            .flush_async()
            .await
            .map_err(|e| MixtapeError::StorageUnavailable(format!("Flush failed: {}", e)))?;

        Ok(())
    }

    async fn list_keys(&self) -> Result<Vec<String>> {
        let mut keys = Vec::new();
        for result in self.db.iter() {
            let (key, _) = result
                .map_err(|e| MixtapeError::StorageUnavailable(format!("Iteration failed: {}", e)))?;
            // Keys are only ever written as UTF-8 strings.
            keys.push(String::from_utf8_lossy(&key).into_owned());
        }
        Ok(keys)
    }
}
