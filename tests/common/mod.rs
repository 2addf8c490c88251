use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

use mixtape::store::sled::SledStore;
use mixtape::store::KeyValueStore;
use mixtape::{CollectionStore, JsonStore, Track};

#[allow(dead_code)]
pub fn create_temp_store() -> (Arc<dyn KeyValueStore>, TempDir) {
    let tmp = TempDir::new().expect("failed to create tempdir");
    let db_path = tmp.path().join("collections.db");
    let store = SledStore::open(db_path).expect("failed to open sled store");
    (Arc::new(store), tmp)
}

#[allow(dead_code)]
pub fn create_temp_collections() -> (CollectionStore, Arc<dyn KeyValueStore>, TempDir) {
    let (store, tmp) = create_temp_store();
    let collections = CollectionStore::new(JsonStore::new(store.clone()));
    (collections, store, tmp)
}

#[allow(dead_code)]
pub fn temp_config_file(contents: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("failed to create tempdir");
    let config_path = temp_dir.path().join("mixtape.yaml");
    fs::write(&config_path, contents).expect("failed to write config file");
    (temp_dir, config_path)
}

#[allow(dead_code)]
pub fn sample_track(id: &str, title: &str) -> Track {
    Track {
        id: id.to_string(),
        title: title.to_string(),
        artist: None,
        duration_secs: Some(180),
        added_at: 1_700_000_000_000,
    }
}
