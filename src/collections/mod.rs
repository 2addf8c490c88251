//! Named collection persistence
//!
//! Stores named playlists (each a full [`SessionState`] including its
//! undo/redo history) under a namespaced key per collection, plus a single
//! registry key tracking the set of known names.
//!
//! The registry and the per-collection entries are written independently,
//! so they can disagree transiently: [`CollectionStore::save`] deliberately
//! never touches the registry, and a crash between a save and a
//! registration leaves an orphaned entry. Every name in the registry should
//! eventually have a stored collection and vice versa;
//! [`CollectionStore::cleanup_orphans`] restores that invariant by removing
//! prefixed keys the registry does not list. Registry mutation goes through
//! [`CollectionStore::register_name`] and
//! [`CollectionStore::unregister_name`] only.

pub mod keys;

use chrono::Utc;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{MixtapeError, Result};
use crate::history::{SessionState, Track};
use crate::store::JsonStore;
use keys::{collection_key, name_from_key, validate_name, REGISTRY_KEY};

/// Version stamp written into export documents
pub const EXPORT_VERSION: &str = "1.0";

/// The interchange document produced by export and accepted by import
///
/// Carries the playlist's current tracks only; undo/redo history is
/// intentionally dropped. `exportedAt` and `version` are informational and
/// tolerated when missing on import.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportDocument {
    /// Collection name the document was exported from
    pub name: String,

    /// The playlist's tracks at export time
    pub items: Vec<Track>,

    /// Export timestamp (RFC-3339)
    #[serde(default)]
    pub exported_at: String,

    /// Document format version
    #[serde(default)]
    pub version: String,
}

/// Summary statistics over one collection's current tracks
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionStats {
    /// Number of tracks currently in the playlist
    pub total_tracks: usize,

    /// Sum of the known track durations, in seconds
    pub total_duration_secs: u64,

    /// Earliest-added track, if any
    pub oldest: Option<Track>,

    /// Latest-added track, if any
    pub newest: Option<Track>,
}

/// Persistence manager for named collections
///
/// Generic over the storage backend via [`JsonStore`]. All operations are
/// async and propagate storage failures; none of them retry.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use mixtape::collections::CollectionStore;
/// use mixtape::history::SessionState;
/// use mixtape::store::{memory::MemoryStore, JsonStore};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> mixtape::error::Result<()> {
/// let collections = CollectionStore::new(JsonStore::new(Arc::new(MemoryStore::new())));
///
/// collections.save("road-trip", &SessionState::default()).await?;
/// collections.register_name("road-trip").await?;
/// assert_eq!(collections.list_names().await?, vec!["road-trip".to_string()]);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct CollectionStore {
    store: JsonStore,
}

impl CollectionStore {
    /// Create a manager over the given typed store
    pub fn new(store: JsonStore) -> Self {
        Self { store }
    }

    /// Persist a collection under its name
    ///
    /// Overwrites any previous value (last writer wins). Does NOT register
    /// the name; explicit save paths pair this with [`Self::register_name`].
    ///
    /// # Errors
    ///
    /// Returns `MixtapeError::InvalidName` for unusable names and
    /// `MixtapeError::StorageUnavailable` if the write fails.
    pub async fn save(&self, name: &str, state: &SessionState) -> Result<()> {
        let key = collection_key(name)?;
        debug!(name = %name, tracks = state.present.len(), "Saving collection");
        self.store.set_json(&key, state).await
    }

    /// Load a collection by name
    ///
    /// # Returns
    ///
    /// `Some(state)` if the collection exists, `None` if it was never saved.
    ///
    /// # Errors
    ///
    /// Returns `MixtapeError::CorruptData` if a stored value exists but is
    /// not a structurally valid session state.
    pub async fn load(&self, name: &str) -> Result<Option<SessionState>> {
        let key = collection_key(name)?;
        self.store.get_json(&key).await
    }

    /// Remove a collection's stored data
    ///
    /// Deleting a name that was never saved succeeds. The registry is not
    /// touched; pair with [`Self::unregister_name`].
    pub async fn delete(&self, name: &str) -> Result<()> {
        let key = collection_key(name)?;
        debug!(name = %name, "Deleting collection");
        self.store.remove(&key).await
    }

    /// Whether a collection has stored data
    pub async fn exists(&self, name: &str) -> Result<bool> {
        let key = collection_key(name)?;
        Ok(self.store.raw().get(&key).await?.is_some())
    }

    /// Read the registry of known collection names
    ///
    /// Returns an empty list when the registry was never written.
    ///
    /// # Errors
    ///
    /// Returns `MixtapeError::CorruptData` if the registry entry exists but
    /// is not a JSON array of strings.
    pub async fn list_names(&self) -> Result<Vec<String>> {
        Ok(self
            .store
            .get_json::<Vec<String>>(REGISTRY_KEY)
            .await?
            .unwrap_or_default())
    }

    /// Overwrite the registry with the given names
    ///
    /// Duplicates are dropped, keeping the first occurrence's position.
    pub async fn save_names(&self, names: &[String]) -> Result<()> {
        let mut deduped: Vec<&String> = Vec::with_capacity(names.len());
        for name in names {
            if !deduped.contains(&name) {
                deduped.push(name);
            }
        }
        self.store.set_json(REGISTRY_KEY, &deduped).await
    }

    /// Add a name to the registry if it is not already present
    ///
    /// # Errors
    ///
    /// Returns `MixtapeError::InvalidName` for unusable names.
    pub async fn register_name(&self, name: &str) -> Result<()> {
        validate_name(name)?;
        let mut names = self.list_names().await?;
        if !names.iter().any(|n| n == name) {
            names.push(name.to_string());
            self.save_names(&names).await?;
        }
        Ok(())
    }

    /// Remove a name from the registry if present
    pub async fn unregister_name(&self, name: &str) -> Result<()> {
        let names = self.list_names().await?;
        let retained: Vec<String> = names.iter().filter(|n| n.as_str() != name).cloned().collect();
        if retained.len() != names.len() {
            self.save_names(&retained).await?;
        }
        Ok(())
    }

    /// Copy a collection's data under a new name and register it
    ///
    /// # Returns
    ///
    /// `true` when the source existed and was copied, `false` when the
    /// source was absent (nothing is written in that case).
    pub async fn duplicate(&self, from: &str, to: &str) -> Result<bool> {
        validate_name(to)?;
        match self.load(from).await? {
            Some(state) => {
                self.save(to, &state).await?;
                self.register_name(to).await?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Render a collection as a pretty-printed export document
    ///
    /// The document carries the current tracks only; undo/redo history is
    /// dropped on purpose so exports stay small and private edits stay
    /// local.
    ///
    /// # Returns
    ///
    /// `Some(json)` if the collection exists, `None` otherwise.
    pub async fn export_as_text(&self, name: &str) -> Result<Option<String>> {
        let state = match self.load(name).await? {
            Some(state) => state,
            None => return Ok(None),
        };

        let document = ExportDocument {
            name: name.to_string(),
            items: state.present,
            exported_at: Utc::now().to_rfc3339(),
            version: EXPORT_VERSION.to_string(),
        };

        Ok(Some(serde_json::to_string_pretty(&document)?))
    }

    /// Parse an export document and store it as a fresh collection
    ///
    /// The document is validated in full before anything is written: `name`
    /// must be a non-empty string and `items` must be an array of valid
    /// tracks. The imported collection starts with empty undo/redo history,
    /// and its name is registered if new.
    ///
    /// # Returns
    ///
    /// The imported collection's name.
    ///
    /// # Errors
    ///
    /// Returns `MixtapeError::InvalidImport` with the rejection reason; no
    /// partial state is left behind.
    pub async fn import_from_text(&self, text: &str) -> Result<String> {
        let document: ExportDocument = serde_json::from_str(text)
            .map_err(|e| MixtapeError::InvalidImport(e.to_string()))?;

        if document.name.trim().is_empty() {
            return Err(
                MixtapeError::InvalidImport("name must be a non-empty string".to_string()).into(),
            );
        }

        let state = SessionState {
            present: document.items,
            past: Vec::new(),
            future: Vec::new(),
        };

        self.save(&document.name, &state).await?;
        self.register_name(&document.name).await?;

        debug!(name = %document.name, tracks = state.present.len(), "Imported collection");
        Ok(document.name)
    }

    /// Delete stored collections the registry does not list
    ///
    /// Only keys under the collection prefix are considered; registry
    /// entries without stored data are left alone (a later load correctly
    /// reports them absent).
    ///
    /// # Returns
    ///
    /// The number of entries removed.
    pub async fn cleanup_orphans(&self) -> Result<usize> {
        let names = self.list_names().await?;
        let keys = self.store.keys().await?;

        let mut removed = 0usize;
        for key in keys {
            if let Some(name) = name_from_key(&key) {
                if !names.iter().any(|n| n == name) {
                    debug!(key = %key, "Removing orphaned collection entry");
                    self.store.remove(&key).await?;
                    removed += 1;
                }
            }
        }

        Ok(removed)
    }

    /// Load every registered collection that has stored data
    ///
    /// Fetches concurrently. Registered names without data are skipped;
    /// corrupt data still surfaces as an error.
    pub async fn load_all(&self) -> Result<Vec<(String, SessionState)>> {
        let names = self.list_names().await?;
        let loads = join_all(names.iter().map(|name| self.load(name))).await;

        let mut collections = Vec::with_capacity(names.len());
        for (name, loaded) in names.into_iter().zip(loads) {
            if let Some(state) = loaded? {
                collections.push((name, state));
            }
        }
        Ok(collections)
    }

    /// Summarize a collection's current tracks
    ///
    /// # Returns
    ///
    /// `Some(stats)` if the collection exists, `None` otherwise.
    pub async fn stats(&self, name: &str) -> Result<Option<CollectionStats>> {
        let state = match self.load(name).await? {
            Some(state) => state,
            None => return Ok(None),
        };

        let tracks = &state.present;
        let total_duration_secs = tracks
            .iter()
            .map(|t| u64::from(t.duration_secs.unwrap_or(0)))
            .sum();

        Ok(Some(CollectionStats {
            total_tracks: tracks.len(),
            total_duration_secs,
            oldest: tracks.iter().min_by_key(|t| t.added_at).cloned(),
            newest: tracks.iter().max_by_key(|t| t.added_at).cloned(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::keys::COLLECTION_PREFIX;
    use super::*;
    use crate::history::{reduce, Action};
    use crate::store::memory::MemoryStore;
    use std::sync::Arc;

    fn collections() -> CollectionStore {
        CollectionStore::new(JsonStore::new(Arc::new(MemoryStore::new())))
    }

    fn track(id: &str, title: &str, added_at: i64) -> Track {
        Track {
            id: id.to_string(),
            title: title.to_string(),
            artist: None,
            duration_secs: Some(180),
            added_at,
        }
    }

    fn state_with_history() -> SessionState {
        let mut state = SessionState::default();
        state = reduce(state, Action::Add(track("a", "Alpha", 1)));
        state = reduce(state, Action::Add(track("b", "Beta", 2)));
        state = reduce(state, Action::Undo);
        state
    }

    #[tokio::test]
    async fn test_save_load_round_trip_preserves_history() {
        let store = collections();
        let state = state_with_history();

        store.save("mix", &state).await.expect("save failed");
        let loaded = store.load("mix").await.expect("load failed");
        assert_eq!(loaded, Some(state));
    }

    #[tokio::test]
    async fn test_load_of_never_saved_name_is_none() {
        let store = collections();
        let loaded = store.load("ghost").await.expect("load failed");
        assert_eq!(loaded, None);
    }

    #[tokio::test]
    async fn test_save_does_not_update_registry() {
        let store = collections();
        store
            .save("mix", &SessionState::default())
            .await
            .expect("save failed");

        let names = store.list_names().await.expect("list failed");
        assert!(names.is_empty(), "save alone must not register the name");
    }

    #[tokio::test]
    async fn test_register_and_unregister_names() {
        let store = collections();
        store.register_name("one").await.unwrap();
        store.register_name("two").await.unwrap();
        store.register_name("one").await.unwrap();

        assert_eq!(
            store.list_names().await.unwrap(),
            vec!["one".to_string(), "two".to_string()]
        );

        store.unregister_name("one").await.unwrap();
        assert_eq!(store.list_names().await.unwrap(), vec!["two".to_string()]);

        // Unregistering an absent name is fine.
        store.unregister_name("ghost").await.unwrap();
    }

    #[tokio::test]
    async fn test_save_names_dedupes_preserving_first_occurrence() {
        let store = collections();
        let names = vec![
            "b".to_string(),
            "a".to_string(),
            "b".to_string(),
            "c".to_string(),
            "a".to_string(),
        ];

        store.save_names(&names).await.expect("save_names failed");
        assert_eq!(
            store.list_names().await.unwrap(),
            vec!["b".to_string(), "a".to_string(), "c".to_string()]
        );
    }

    #[tokio::test]
    async fn test_register_rejects_invalid_names() {
        let store = collections();
        assert!(store.register_name("").await.is_err());
        assert!(store.register_name("a/b").await.is_err());
        assert!(store.list_names().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_is_idempotent_and_skips_registry() {
        let store = collections();
        store.save("mix", &SessionState::default()).await.unwrap();
        store.register_name("mix").await.unwrap();

        store.delete("mix").await.expect("delete failed");
        store.delete("mix").await.expect("second delete failed");

        assert_eq!(store.load("mix").await.unwrap(), None);
        // Registry cleanup is the caller's move.
        assert_eq!(store.list_names().await.unwrap(), vec!["mix".to_string()]);
    }

    #[tokio::test]
    async fn test_exists() {
        let store = collections();
        assert!(!store.exists("mix").await.unwrap());

        store.save("mix", &SessionState::default()).await.unwrap();
        assert!(store.exists("mix").await.unwrap());
    }

    #[tokio::test]
    async fn test_duplicate_copies_and_registers() {
        let store = collections();
        let state = state_with_history();
        store.save("original", &state).await.unwrap();
        store.register_name("original").await.unwrap();

        let copied = store
            .duplicate("original", "copy")
            .await
            .expect("duplicate failed");
        assert!(copied);

        assert_eq!(store.load("copy").await.unwrap(), Some(state));
        assert_eq!(
            store.list_names().await.unwrap(),
            vec!["original".to_string(), "copy".to_string()]
        );
    }

    #[tokio::test]
    async fn test_duplicate_of_absent_source_is_false_without_side_effects() {
        let store = collections();
        let copied = store
            .duplicate("ghost", "copy")
            .await
            .expect("duplicate failed");

        assert!(!copied);
        assert_eq!(store.load("copy").await.unwrap(), None);
        assert!(store.list_names().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_rejects_invalid_target_name() {
        let store = collections();
        store.save("original", &SessionState::default()).await.unwrap();

        assert!(store.duplicate("original", "a/b").await.is_err());
    }

    #[tokio::test]
    async fn test_export_of_absent_collection_is_none() {
        let store = collections();
        let text = store.export_as_text("ghost").await.expect("export failed");
        assert_eq!(text, None);
    }

    #[tokio::test]
    async fn test_export_document_shape_drops_history() {
        let store = collections();
        let state = state_with_history();
        assert!(state.can_undo(), "test setup should carry history");
        store.save("mix", &state).await.unwrap();

        let text = store
            .export_as_text("mix")
            .await
            .expect("export failed")
            .expect("collection should exist");

        // Pretty-printed, one field per line.
        assert!(text.contains('\n'));

        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["name"], "mix");
        assert_eq!(value["version"], "1.0");
        assert_eq!(value["items"].as_array().unwrap().len(), state.present.len());
        assert!(value["exportedAt"].as_str().unwrap().contains('T'));
        assert!(value.get("past").is_none());
        assert!(value.get("future").is_none());
    }

    #[tokio::test]
    async fn test_import_creates_fresh_collection_and_registers() {
        let store = collections();
        let text = r#"{
            "name": "imported",
            "items": [
                {"id": "a", "title": "Alpha", "artist": "Band", "addedAt": 1}
            ],
            "exportedAt": "2026-01-01T00:00:00Z",
            "version": "1.0"
        }"#;

        let name = store.import_from_text(text).await.expect("import failed");
        assert_eq!(name, "imported");

        let state = store.load("imported").await.unwrap().unwrap();
        assert_eq!(state.present.len(), 1);
        assert_eq!(state.present[0].artist.as_deref(), Some("Band"));
        assert!(state.past.is_empty());
        assert!(state.future.is_empty());

        assert_eq!(
            store.list_names().await.unwrap(),
            vec!["imported".to_string()]
        );
    }

    #[tokio::test]
    async fn test_import_tolerates_missing_metadata_fields() {
        let store = collections();
        let text = r#"{"name": "bare", "items": []}"#;

        let name = store.import_from_text(text).await.expect("import failed");
        assert_eq!(name, "bare");
    }

    #[tokio::test]
    async fn test_import_missing_items_is_rejected_without_writes() {
        let store = collections();
        let err = store
            .import_from_text(r#"{"name": "x"}"#)
            .await
            .expect_err("import must fail");

        assert!(!err.to_string().is_empty());
        assert_eq!(store.load("x").await.unwrap(), None);
        assert!(store.list_names().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_import_blank_name_is_rejected() {
        let store = collections();
        let err = store
            .import_from_text(r#"{"name": "  ", "items": []}"#)
            .await
            .expect_err("import must fail");
        assert!(err.to_string().contains("Invalid import document"));
    }

    #[tokio::test]
    async fn test_import_unparseable_text_is_rejected() {
        let store = collections();
        let result = store.import_from_text("definitely not json").await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_import_existing_name_overwrites_without_duplicate_registration() {
        let store = collections();
        store.save("mix", &state_with_history()).await.unwrap();
        store.register_name("mix").await.unwrap();

        let text = r#"{"name": "mix", "items": []}"#;
        store.import_from_text(text).await.expect("import failed");

        let state = store.load("mix").await.unwrap().unwrap();
        assert!(state.present.is_empty());
        assert_eq!(store.list_names().await.unwrap(), vec!["mix".to_string()]);
    }

    #[tokio::test]
    async fn test_cleanup_orphans_removes_exactly_unregistered_entries() {
        let store = collections();

        store.save("kept", &SessionState::default()).await.unwrap();
        store.register_name("kept").await.unwrap();
        store.save("orphan-1", &SessionState::default()).await.unwrap();
        store.save("orphan-2", &SessionState::default()).await.unwrap();

        // A registered name without data and a foreign key must survive.
        store.register_name("registered-no-data").await.unwrap();
        store
            .store
            .set_json("settings.preferences", &serde_json::json!({"theme": "dark"}))
            .await
            .unwrap();

        let removed = store.cleanup_orphans().await.expect("cleanup failed");
        assert_eq!(removed, 2);

        assert_eq!(
            store.load("kept").await.unwrap(),
            Some(SessionState::default())
        );
        assert_eq!(store.load("orphan-1").await.unwrap(), None);
        assert_eq!(store.load("orphan-2").await.unwrap(), None);
        assert!(store
            .list_names()
            .await
            .unwrap()
            .contains(&"registered-no-data".to_string()));

        let value: Option<serde_json::Value> = store
            .store
            .get_json("settings.preferences")
            .await
            .unwrap();
        assert!(value.is_some(), "foreign keys must not be touched");
    }

    #[tokio::test]
    async fn test_cleanup_orphans_on_clean_store_removes_nothing() {
        let store = collections();
        store.save("mix", &SessionState::default()).await.unwrap();
        store.register_name("mix").await.unwrap();

        let removed = store.cleanup_orphans().await.unwrap();
        assert_eq!(removed, 0);
    }

    #[tokio::test]
    async fn test_load_all_skips_registered_names_without_data() {
        let store = collections();
        store.save("with-data", &state_with_history()).await.unwrap();
        store.register_name("with-data").await.unwrap();
        store.register_name("no-data").await.unwrap();

        let all = store.load_all().await.expect("load_all failed");
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].0, "with-data");
    }

    #[tokio::test]
    async fn test_corrupt_collection_surfaces_not_coerced() {
        let store = collections();
        let key = format!("{}broken", COLLECTION_PREFIX);
        store
            .store
            .raw()
            .set(&key, r#"{"unexpected": true}"#.to_string())
            .await
            .unwrap();

        let err = store.load("broken").await.expect_err("load must fail");
        assert!(err.to_string().contains("Corrupt data"));
    }

    #[tokio::test]
    async fn test_corrupt_registry_surfaces() {
        let store = collections();
        store
            .store
            .raw()
            .set(REGISTRY_KEY, r#"{"not": "an array"}"#.to_string())
            .await
            .unwrap();

        assert!(store.list_names().await.is_err());
    }

    #[tokio::test]
    async fn test_stats_over_present_tracks() {
        let store = collections();
        let mut state = SessionState::default();
        state = reduce(state, Action::Add(track("a", "Alpha", 100)));
        state = reduce(state, Action::Add(track("b", "Beta", 50)));
        state = reduce(state, Action::Add(track("c", "Gamma", 200)));
        store.save("mix", &state).await.unwrap();

        let stats = store
            .stats("mix")
            .await
            .expect("stats failed")
            .expect("collection should exist");

        assert_eq!(stats.total_tracks, 3);
        assert_eq!(stats.total_duration_secs, 540);
        assert_eq!(stats.oldest.unwrap().id, "b");
        assert_eq!(stats.newest.unwrap().id, "c");
    }

    #[tokio::test]
    async fn test_stats_of_empty_collection() {
        let store = collections();
        store.save("empty", &SessionState::default()).await.unwrap();

        let stats = store.stats("empty").await.unwrap().unwrap();
        assert_eq!(stats.total_tracks, 0);
        assert_eq!(stats.total_duration_secs, 0);
        assert!(stats.oldest.is_none());
        assert!(stats.newest.is_none());
    }

    #[tokio::test]
    async fn test_stats_of_absent_collection_is_none() {
        let store = collections();
        assert_eq!(store.stats("ghost").await.unwrap(), None);
    }
}
