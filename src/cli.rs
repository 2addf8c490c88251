//! Command-line interface definition for Mixtape
//!
//! This module defines the CLI structure using clap's derive API,
//! providing commands for listing, editing, and moving playlists
//! in and out of the store.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Mixtape - Playlist manager CLI
///
/// Build and edit playlists with full undo history, persisted to an
/// embedded key-value store.
#[derive(Parser, Debug, Clone)]
#[command(name = "mixtape")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "mixtape.yaml")]
    pub config: Option<String>,

    /// Directory for the on-disk store (overrides config)
    #[arg(short = 'd', long)]
    pub store_dir: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands for Mixtape
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// List all playlists
    List,

    /// Show a playlist's tracks and stats
    Show {
        /// Playlist name
        name: String,
    },

    /// Edit a playlist interactively
    Edit {
        /// Playlist name (created on first save if new)
        name: String,
    },

    /// Export a playlist as JSON
    Export {
        /// Playlist name
        name: String,

        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Import a playlist from an export file
    Import {
        /// Path to the export file
        file: PathBuf,
    },

    /// Copy a playlist under a new name
    Duplicate {
        /// Existing playlist name
        from: String,

        /// Name for the copy
        to: String,
    },

    /// Delete a playlist
    Delete {
        /// Playlist name
        name: String,
    },

    /// Remove stored playlist data that is no longer registered
    Cleanup,

    /// Write a backup of every playlist plus settings
    Backup {
        /// Output file
        output: PathBuf,
    },

    /// Restore a backup file, replacing the playlist registry
    Restore {
        /// Path to the backup file
        file: PathBuf,
    },
}

impl Cli {
    /// Parse command line arguments
    ///
    /// # Returns
    ///
    /// Returns the parsed CLI structure
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

impl Default for Cli {
    fn default() -> Self {
        Self {
            config: Some("mixtape.yaml".to_string()),
            store_dir: None,
            verbose: false,
            command: Commands::List,
        }
    }
}
