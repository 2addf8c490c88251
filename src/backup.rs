//! Full-store backup and restore
//!
//! A backup document bundles every registered collection together with the
//! preferences and settings documents. Restoring replaces the collection
//! registry wholesale with the names carried by the backup.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::collections::CollectionStore;
use crate::error::{MixtapeError, Result};
use crate::history::SessionState;
use crate::settings::{AppSettings, AppSettingsStore, PreferencesStore, UserPreferences};
use crate::store::JsonStore;

/// Version stamped into backup documents
pub const BACKUP_VERSION: &str = "1.0";

/// One collection inside a backup document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupEntry {
    pub name: String,
    pub data: SessionState,
}

/// The complete backup payload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupDocument {
    pub playlists: Vec<BackupEntry>,
    pub preferences: UserPreferences,
    pub settings: AppSettings,
    #[serde(default)]
    pub exported_at: String,
    #[serde(default = "default_version")]
    pub version: String,
}

fn default_version() -> String {
    BACKUP_VERSION.to_string()
}

/// Outcome of a successful restore
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupSummary {
    /// Number of collections written
    pub collections: usize,
}

/// Exports and imports the entire store as one JSON document
#[derive(Debug, Clone)]
pub struct BackupManager {
    collections: CollectionStore,
    preferences: PreferencesStore,
    settings: AppSettingsStore,
}

impl BackupManager {
    pub fn new(store: JsonStore) -> Self {
        Self {
            collections: CollectionStore::new(store.clone()),
            preferences: PreferencesStore::new(store.clone()),
            settings: AppSettingsStore::new(store),
        }
    }

    /// Serialize every registered collection plus preferences and settings
    ///
    /// # Returns
    ///
    /// Pretty-printed JSON suitable for writing to a file.
    ///
    /// # Errors
    ///
    /// Fails if any registered collection is corrupt or the store is
    /// unavailable.
    pub async fn export_all(&self) -> Result<String> {
        let playlists = self
            .collections
            .load_all()
            .await?
            .into_iter()
            .map(|(name, data)| BackupEntry { name, data })
            .collect();

        let document = BackupDocument {
            playlists,
            preferences: self.preferences.load().await?,
            settings: self.settings.load().await?,
            exported_at: Utc::now().to_rfc3339(),
            version: BACKUP_VERSION.to_string(),
        };

        Ok(serde_json::to_string_pretty(&document)?)
    }

    /// Restore a backup produced by [`export_all`](Self::export_all)
    ///
    /// Writes every collection in the document, then replaces the registry
    /// with exactly the names the backup carries. Collections present in the
    /// store but absent from the backup stay on disk unregistered; a
    /// `cleanup` pass removes them.
    ///
    /// # Errors
    ///
    /// Returns `MixtapeError::InvalidImport` when the text is not a backup
    /// document. Nothing is written in that case.
    pub async fn import_all(&self, text: &str) -> Result<BackupSummary> {
        let document: BackupDocument = serde_json::from_str(text)
            .map_err(|e| MixtapeError::InvalidImport(format!("not a backup document: {}", e)))?;

        for entry in &document.playlists {
            self.collections.save(&entry.name, &entry.data).await?;
        }

        let names: Vec<String> = document
            .playlists
            .iter()
            .map(|entry| entry.name.clone())
            .collect();
        self.collections.save_names(&names).await?;

        self.preferences.save(&document.preferences).await?;
        self.settings.save(&document.settings).await?;

        info!(collections = names.len(), "restored backup");
        Ok(BackupSummary {
            collections: document.playlists.len(),
        })
    }
}
