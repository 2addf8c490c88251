//! Mixtape - Playlist manager CLI
//!
#![doc = "Mixtape - Playlist manager CLI"]
#![doc = "Main entry point for the mixtape application."]

use anyhow::Result;
use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use mixtape::cli::{Cli, Commands};
use mixtape::collections::CollectionStore;
use mixtape::commands;
use mixtape::config::Config;
use mixtape::store::memory::MemoryStore;
use mixtape::store::sled::SledStore;
use mixtape::store::{JsonStore, KeyValueStore};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse_args();

    // Load and validate configuration
    let config_path = cli.config.as_deref().unwrap_or("mixtape.yaml");
    let config = Config::load(config_path, &cli)?;
    config.validate()?;

    // Initialize tracing with the configured level
    init_tracing(&config);

    // Open the configured backend once; every component shares it
    let store = open_store(&config)?;
    let json = JsonStore::new(store);
    let collections = CollectionStore::new(json.clone());

    match cli.command {
        Commands::List => commands::list::run_list(&collections).await,
        Commands::Show { name } => commands::show::run_show(&collections, &name).await,
        Commands::Edit { name } => {
            commands::edit::run_edit(collections, config.session.quiesce(), &name).await
        }
        Commands::Export { name, output } => {
            commands::transfer::run_export(&collections, &name, output.as_deref()).await
        }
        Commands::Import { file } => commands::transfer::run_import(&collections, &file).await,
        Commands::Duplicate { from, to } => {
            commands::manage::run_duplicate(&collections, &from, &to).await
        }
        Commands::Delete { name } => commands::manage::run_delete(&collections, &name).await,
        Commands::Cleanup => commands::manage::run_cleanup(&collections).await,
        Commands::Backup { output } => commands::backup::run_backup(json, &output).await,
        Commands::Restore { file } => commands::backup::run_restore(json, &file).await,
    }
}

/// Build the key-value store the configuration asks for
fn open_store(config: &Config) -> Result<Arc<dyn KeyValueStore>> {
    match config.storage.backend.as_str() {
        "memory" => {
            tracing::debug!("Using in-memory store");
            Ok(Arc::new(MemoryStore::new()))
        }
        _ => {
            let store = match &config.storage.path {
                Some(dir) => {
                    tracing::debug!("Using store directory {}", dir.display());
                    std::fs::create_dir_all(dir)?;
                    SledStore::open(dir.join("collections.db"))?
                }
                None => SledStore::open_default()?,
            };
            Ok(Arc::new(store))
        }
    }
}

/// Initialize tracing subscriber with environment filter
fn init_tracing(config: &Config) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("mixtape={}", config.logging.level)));

    if config.logging.json_format {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}
