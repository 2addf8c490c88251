//! Test utilities for Mixtape
//!
//! This module provides common test utilities: temporary directory
//! management, assertion helpers, canned configuration, and instrumented
//! [`KeyValueStore`] wrappers for exercising the session controller's
//! persistence behavior.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;

use crate::error::{MixtapeError, Result};
use crate::history::Track;
use crate::store::memory::MemoryStore;
use crate::store::KeyValueStore;

/// Create a temporary directory for testing
///
/// # Returns
///
/// Returns a TempDir that will be cleaned up when dropped
pub fn temp_dir() -> TempDir {
    TempDir::new().expect("Failed to create temporary directory")
}

/// Create a test file with the given content
///
/// # Arguments
///
/// * `dir` - Directory to create the file in
/// * `name` - Name of the file
/// * `content` - Content to write to the file
///
/// # Returns
///
/// Returns the path to the created file
///
/// # Panics
///
/// Panics if file creation or writing fails
pub fn create_test_file(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, content).expect("Failed to write test file");
    path
}

/// Assert that an error contains the expected message
///
/// # Arguments
///
/// * `result` - Result to check
/// * `expected` - Expected error message substring
///
/// # Panics
///
/// Panics if the result is Ok or if the error doesn't contain the expected message
pub fn assert_error_contains<T>(result: Result<T>, expected: &str) {
    match result {
        Ok(_) => panic!("Expected error containing '{}' but got Ok", expected),
        Err(e) => {
            let error_msg = e.to_string();
            assert!(
                error_msg.contains(expected),
                "Error message '{}' does not contain '{}'",
                error_msg,
                expected
            );
        }
    }
}

/// Build a track with fixed metadata for reducer-level tests
pub fn sample_track(id: &str, title: &str) -> Track {
    Track {
        id: id.to_string(),
        title: title.to_string(),
        artist: None,
        duration_secs: Some(180),
        added_at: 1_700_000_000_000,
    }
}

/// Create a test configuration YAML string
///
/// # Returns
///
/// Returns a YAML string with test configuration
pub fn test_config_yaml() -> String {
    r#"
storage:
  backend: memory

session:
  debounce_ms: 25
"#
    .to_string()
}

/// Store wrapper counting writes
///
/// Wraps a [`MemoryStore`] and counts every `set`, so tests can assert how
/// many persists actually fired. Grab the counter with
/// [`CountingStore::set_counter`] before handing the store off.
#[derive(Debug, Default)]
pub struct CountingStore {
    inner: MemoryStore,
    set_count: Arc<AtomicUsize>,
}

impl CountingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared handle to the number of `set` calls so far
    pub fn set_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.set_count)
    }
}

#[async_trait::async_trait]
impl KeyValueStore for CountingStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: String) -> Result<()> {
        self.set_count.fetch_add(1, Ordering::SeqCst);
        self.inner.set(key, value).await
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.inner.delete(key).await
    }

    async fn list_keys(&self) -> Result<Vec<String>> {
        self.inner.list_keys().await
    }
}

/// Store wrapper with a failure switch
///
/// Writes fail with `StorageUnavailable` while the switch is on; reads are
/// never affected. Used to exercise persist-failure reporting and recovery.
#[derive(Debug, Default)]
pub struct FaultyStore {
    inner: MemoryStore,
    fail_sets: Arc<AtomicBool>,
}

impl FaultyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared handle controlling whether writes fail
    pub fn failure_switch(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.fail_sets)
    }
}

#[async_trait::async_trait]
impl KeyValueStore for FaultyStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: String) -> Result<()> {
        if self.fail_sets.load(Ordering::SeqCst) {
            return Err(
                MixtapeError::StorageUnavailable("injected write failure".to_string()).into(),
            );
        }
        self.inner.set(key, value).await
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.inner.delete(key).await
    }

    async fn list_keys(&self) -> Result<Vec<String>> {
        self.inner.list_keys().await
    }
}

/// Store wrapper delaying reads
///
/// Sleeps before every `get`, making load races reproducible: a selection
/// issued during another selection's slow load must win.
#[derive(Debug)]
pub struct DelayStore {
    inner: Arc<dyn KeyValueStore>,
    get_delay: Duration,
}

impl DelayStore {
    pub fn new(inner: Arc<dyn KeyValueStore>, get_delay: Duration) -> Self {
        Self { inner, get_delay }
    }
}

#[async_trait::async_trait]
impl KeyValueStore for DelayStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        tokio::time::sleep(self.get_delay).await;
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: String) -> Result<()> {
        self.inner.set(key, value).await
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.inner.delete(key).await
    }

    async fn list_keys(&self) -> Result<Vec<String>> {
        self.inner.list_keys().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_temp_dir_creation() {
        let dir = temp_dir();
        assert!(dir.path().exists());
    }

    #[test]
    fn test_create_test_file() {
        let dir = temp_dir();
        let path = create_test_file(&dir, "test.txt", "content");
        assert!(path.exists());
        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "content");
    }

    #[test]
    fn test_assert_error_contains_success() {
        let result: Result<()> =
            Err(MixtapeError::Config("test error message".to_string()).into());
        assert_error_contains(result, "test error");
    }

    #[test]
    #[should_panic(expected = "Expected error containing")]
    fn test_assert_error_contains_ok() {
        let result: Result<()> = Ok(());
        assert_error_contains(result, "error");
    }

    #[test]
    #[should_panic(expected = "does not contain")]
    fn test_assert_error_contains_wrong_message() {
        let result: Result<()> = Err(MixtapeError::Config("different error".to_string()).into());
        assert_error_contains(result, "not present");
    }

    #[test]
    fn test_test_config_yaml_parses() {
        let yaml = test_config_yaml();
        let config: crate::config::Config = serde_yaml::from_str(&yaml).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.session.debounce_ms, 25);
    }

    #[tokio::test]
    async fn test_counting_store_counts_sets_only() {
        let store = CountingStore::new();
        let counter = store.set_counter();

        store.set("a", "1".to_string()).await.unwrap();
        store.get("a").await.unwrap();
        store.delete("a").await.unwrap();

        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_faulty_store_switch() {
        let store = FaultyStore::new();
        let switch = store.failure_switch();

        store.set("a", "1".to_string()).await.expect("set should work");

        switch.store(true, Ordering::SeqCst);
        assert!(store.set("b", "2".to_string()).await.is_err());
        assert_eq!(
            store.get("a").await.unwrap(),
            Some("1".to_string()),
            "reads are unaffected"
        );

        switch.store(false, Ordering::SeqCst);
        store.set("b", "2".to_string()).await.expect("set should recover");
    }
}
