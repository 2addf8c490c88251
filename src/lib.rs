//! Mixtape - Playlist manager library
//!
//! This library provides the core functionality for the mixtape playlist
//! manager: an undo/redo state machine for edits, typed persistence over a
//! pluggable key-value store, and a session controller that debounces
//! writes behind a live editing session.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `history`: Undo/redo state machine for playlist edits
//! - `store`: Key-value storage abstraction with sled and in-memory backends
//! - `collections`: Named playlist persistence, registry, and import/export
//! - `session`: Edit session controller with debounced persistence
//! - `settings`: User preferences and application settings
//! - `backup`: Whole-store backup and restore
//! - `config`: Configuration management and validation
//! - `error`: Error types and result aliases
//! - `cli`: Command-line interface definition
//!
//! # Example
//!
//! ```no_run
//! use mixtape::store::memory::MemoryStore;
//! use mixtape::store::JsonStore;
//! use mixtape::{CollectionStore, Config};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("mixtape.yaml", &Default::default())?;
//!     config.validate()?;
//!
//!     let store = JsonStore::new(Arc::new(MemoryStore::new()));
//!     let collections = CollectionStore::new(store);
//!     println!("{} playlists", collections.list_names().await?.len());
//!     Ok(())
//! }
//! ```

pub mod backup;
pub mod cli;
pub mod collections;
pub mod commands;
pub mod config;
pub mod error;
pub mod history;
pub mod session;
pub mod settings;
pub mod store;

// Re-export commonly used types
pub use collections::CollectionStore;
pub use config::Config;
pub use error::{MixtapeError, Result};
pub use history::{reduce, Action, SessionState, Track};
pub use session::{SessionController, SessionEvent};
pub use store::{JsonStore, KeyValueStore};

#[cfg(test)]
pub mod test_utils;
