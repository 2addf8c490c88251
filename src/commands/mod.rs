/*!
Command handlers for the CLI

This module provides the handlers invoked by the CLI entrypoint, one
module per area:

- `list`     — List registered playlists
- `show`     — Print a playlist's tracks and totals
- `edit`     — Interactive playlist editor with undo/redo
- `transfer` — Export and import single playlists
- `manage`   — Duplicate, delete, and cleanup
- `backup`   — Whole-store backup and restore

Handlers are intentionally small and use the library components: the
collection store, the session controller, and the backup manager.
*/

use crate::backup::BackupManager;
use crate::collections::CollectionStore;
use crate::error::{MixtapeError, Result};
use crate::history::SessionState;
use crate::store::JsonStore;
use prettytable::{cell, row, Table};

/// Render seconds as a compact human-readable length
fn format_duration(total_secs: u64) -> String {
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;
    if hours > 0 {
        format!("{}h {:02}m", hours, minutes)
    } else {
        format!("{}m {:02}s", minutes, seconds)
    }
}

/// Render a track length as m:ss, or a dash when unknown
fn format_track_length(duration_secs: Option<u32>) -> String {
    match duration_secs {
        Some(secs) => format!("{}:{:02}", secs / 60, secs % 60),
        None => "-".to_string(),
    }
}

/// Render an epoch-milliseconds timestamp as a date
fn format_added_at(millis: i64) -> String {
    chrono::DateTime::from_timestamp_millis(millis)
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".to_string())
}

/// Shorten a track id for display
fn short_id(id: &str) -> &str {
    &id[..id.len().min(8)]
}

/// Print a playlist's tracks as a table
fn print_tracks(state: &SessionState) {
    if state.present.is_empty() {
        println!("(empty)");
        return;
    }

    let mut table = Table::new();
    table.add_row(row!["#", "Id", "Title", "Artist", "Length", "Added"]);
    for (index, track) in state.present.iter().enumerate() {
        table.add_row(row![
            index + 1,
            short_id(&track.id),
            track.title,
            track.artist.as_deref().unwrap_or("-"),
            format_track_length(track.duration_secs),
            format_added_at(track.added_at)
        ]);
    }
    table.printstd();
}

// List command handler
pub mod list {
    use super::*;

    /// Print every registered playlist with its track count and length
    pub async fn run_list(collections: &CollectionStore) -> Result<()> {
        tracing::info!("Listing playlists");

        let names = collections.list_names().await?;
        if names.is_empty() {
            println!("No playlists yet. Create one with `mixtape edit <name>`.");
            return Ok(());
        }

        let mut table = Table::new();
        table.add_row(row!["Playlist", "Tracks", "Length"]);
        for name in &names {
            match collections.stats(name).await {
                Ok(Some(stats)) => {
                    table.add_row(row![
                        name,
                        stats.total_tracks,
                        format_duration(stats.total_duration_secs)
                    ]);
                }
                // Registered but never saved
                Ok(None) => {
                    table.add_row(row![name, "-", "-"]);
                }
                Err(e) => {
                    tracing::warn!(name = %name, error = %e, "Skipping unreadable playlist");
                    table.add_row(row![name, "?", "?"]);
                }
            }
        }

        table.printstd();
        println!("\n{} playlist(s)", names.len());
        Ok(())
    }

}

// Show command handler
pub mod show {
    use super::*;

    /// Print one playlist's tracks plus a totals line
    pub async fn run_show(collections: &CollectionStore, name: &str) -> Result<()> {
        use colored::Colorize;

        tracing::info!("Showing playlist '{}'", name);

        let state = match collections.load(name).await? {
            Some(state) => state,
            None => {
                println!("{}", format!("Playlist '{}' not found", name).yellow());
                return Ok(());
            }
        };

        println!("\n{}\n", name.cyan().bold());
        print_tracks(&state);

        let total_secs: u64 = state
            .present
            .iter()
            .map(|t| u64::from(t.duration_secs.unwrap_or(0)))
            .sum();
        println!(
            "\n{} track(s), {}",
            state.present.len(),
            format_duration(total_secs)
        );
        Ok(())
    }

}

// Interactive edit session
pub mod edit {
    //! Interactive playlist editor.
    //!
    //! Runs a readline loop over a [`SessionController`]: every edit is
    //! applied to the in-memory state immediately and persisted once the
    //! configured quiet period elapses. Quitting flushes any pending write.

    use super::*;
    use crate::history::Action;
    use crate::session::{SessionController, SessionEvent};
    use rustyline::error::ReadlineError;
    use rustyline::DefaultEditor;
    use std::time::Duration;
    use tokio::sync::mpsc;

    /// One parsed line of editor input
    #[derive(Debug, Clone, PartialEq, Eq)]
    enum EditCommand {
        Add {
            title: String,
            artist: Option<String>,
            duration_secs: Option<u32>,
        },
        Remove {
            selector: String,
        },
        Undo,
        Redo,
        Clear,
        Show,
        Save {
            name: Option<String>,
        },
        Help,
        Quit,
        Invalid {
            usage: &'static str,
        },
        Unknown(String),
    }

    /// Start an interactive edit session for the named playlist
    ///
    /// # Arguments
    ///
    /// * `collections` - The persistence manager for playlists
    /// * `quiesce` - Debounce window for automatic persistence
    /// * `name` - Playlist to open (hydrated empty when new)
    pub async fn run_edit(
        collections: CollectionStore,
        quiesce: Duration,
        name: &str,
    ) -> Result<()> {
        use colored::Colorize;

        tracing::info!("Starting edit session for '{}'", name);

        let (controller, mut events) = SessionController::new(collections.clone(), quiesce);
        controller.select_collection(name).await?;

        let mut rl = DefaultEditor::new()?;
        println!(
            "\nEditing {} ({} tracks). Type 'help' for commands.\n",
            name.cyan().bold(),
            controller.state().present.len()
        );

        loop {
            drain_events(&mut events, &collections).await;

            match rl.readline("mixtape> ") {
                Ok(line) => {
                    let trimmed = line.trim();
                    if trimmed.is_empty() {
                        continue;
                    }
                    rl.add_history_entry(trimmed)?;

                    match parse_command(trimmed) {
                        EditCommand::Add {
                            title,
                            artist,
                            duration_secs,
                        } => {
                            let track = controller.new_track(&title, artist, duration_secs);
                            let title = track.title.clone();
                            let state = controller.dispatch(Action::Add(track));
                            println!(
                                "{}",
                                format!("Added '{}' ({} tracks)", title, state.present.len())
                                    .green()
                            );
                        }
                        EditCommand::Remove { selector } => {
                            let state = controller.state();
                            match resolve_track_id(&state, &selector) {
                                Some(id) => {
                                    let state = controller.dispatch(Action::Remove { id });
                                    println!(
                                        "{}",
                                        format!("Removed ({} tracks left)", state.present.len())
                                            .green()
                                    );
                                }
                                None => {
                                    println!(
                                        "{}",
                                        format!("No unique track matches '{}'", selector).red()
                                    );
                                }
                            }
                        }
                        EditCommand::Undo => {
                            if controller.state().can_undo() {
                                let state = controller.dispatch(Action::Undo);
                                println!("Undid last change ({} tracks).", state.present.len());
                            } else {
                                println!("Nothing to undo.");
                            }
                        }
                        EditCommand::Redo => {
                            if controller.state().can_redo() {
                                let state = controller.dispatch(Action::Redo);
                                println!("Redid change ({} tracks).", state.present.len());
                            } else {
                                println!("Nothing to redo.");
                            }
                        }
                        EditCommand::Clear => {
                            let before = controller.state().present.len();
                            controller.dispatch(Action::Clear);
                            println!("Cleared {} track(s).", before);
                        }
                        EditCommand::Show => {
                            print_tracks(&controller.state());
                        }
                        EditCommand::Save { name: Some(target) } => {
                            match controller.save_current_as(&target).await {
                                Ok(()) => {
                                    // Reopen so editing continues on the saved copy.
                                    controller.select_collection(&target).await?;
                                    println!("{}", format!("Saved as '{}'", target).green());
                                }
                                Err(e) => {
                                    println!("{}", format!("Save failed: {}", e).red());
                                }
                            }
                        }
                        EditCommand::Save { name: None } => {
                            controller.flush().await?;
                            if let Some(current) = controller.selected() {
                                if let Err(e) = collections.register_name(&current).await {
                                    tracing::warn!(name = %current, error = %e, "Could not register name");
                                }
                                println!("{}", format!("Saved '{}'", current).green());
                            }
                        }
                        EditCommand::Help => print_help(),
                        EditCommand::Quit => break,
                        EditCommand::Invalid { usage } => {
                            println!("Usage: {}", usage);
                        }
                        EditCommand::Unknown(word) => {
                            println!("Unknown command '{}'. Type 'help'.", word);
                        }
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    println!("CTRL-C");
                    break;
                }
                Err(ReadlineError::Eof) => {
                    println!("CTRL-D");
                    break;
                }
                Err(err) => {
                    tracing::error!("Readline error: {:?}", err);
                    break;
                }
            }
        }

        controller.flush().await?;
        drain_events(&mut events, &collections).await;
        println!("Goodbye!");
        Ok(())
    }

    /// Apply queued persistence events
    ///
    /// Successful autosaves register the playlist name so fresh playlists
    /// become visible to `list` as soon as they first hit storage.
    async fn drain_events(
        events: &mut mpsc::UnboundedReceiver<SessionEvent>,
        collections: &CollectionStore,
    ) {
        use colored::Colorize;

        while let Ok(event) = events.try_recv() {
            match event {
                SessionEvent::Persisted { name } => {
                    if let Err(e) = collections.register_name(&name).await {
                        tracing::warn!(name = %name, error = %e, "Could not register name");
                    }
                    tracing::debug!(name = %name, "Autosaved");
                }
                SessionEvent::PersistFailed { name, reason } => {
                    eprintln!(
                        "{}",
                        format!("Autosave of '{}' failed: {}", name, reason).red()
                    );
                }
            }
        }
    }

    fn print_help() {
        println!("\nCommands:");
        println!("  add <title> [by <artist>] [m:ss]   Add a track");
        println!("  rm <number | id prefix>            Remove a track");
        println!("  undo                               Undo the last change");
        println!("  redo                               Redo an undone change");
        println!("  clear                              Remove every track");
        println!("  show                               Print the playlist");
        println!("  save [name]                        Save now, optionally under a new name");
        println!("  help                               Show this help");
        println!("  quit                               Save and exit\n");
    }

    /// Parse one line of editor input
    fn parse_command(input: &str) -> EditCommand {
        let (word, rest) = match input.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (input, ""),
        };

        match word.to_lowercase().as_str() {
            "add" if !rest.is_empty() => parse_add(rest),
            "add" => EditCommand::Invalid {
                usage: "add <title> [by <artist>] [m:ss]",
            },
            "rm" | "remove" if !rest.is_empty() => EditCommand::Remove {
                selector: rest.to_string(),
            },
            "rm" | "remove" => EditCommand::Invalid {
                usage: "rm <number | id prefix>",
            },
            "undo" => EditCommand::Undo,
            "redo" => EditCommand::Redo,
            "clear" => EditCommand::Clear,
            "show" | "ls" => EditCommand::Show,
            "save" => EditCommand::Save {
                name: (!rest.is_empty()).then(|| rest.to_string()),
            },
            "help" | "?" => EditCommand::Help,
            "quit" | "exit" | "q" => EditCommand::Quit,
            _ => EditCommand::Unknown(word.to_string()),
        }
    }

    /// Parse the arguments of an `add` command
    ///
    /// A trailing `m:ss` token becomes the duration; a ` by ` separator
    /// splits title from artist (the last one wins, so titles may contain
    /// the word).
    fn parse_add(rest: &str) -> EditCommand {
        let (rest, duration_secs) = split_trailing_duration(rest);
        let (title, artist) = match rest.rsplit_once(" by ") {
            Some((title, artist))
                if !title.trim().is_empty() && !artist.trim().is_empty() =>
            {
                (
                    title.trim().to_string(),
                    Some(artist.trim().to_string()),
                )
            }
            _ => (rest.trim().to_string(), None),
        };

        EditCommand::Add {
            title,
            artist,
            duration_secs,
        }
    }

    fn split_trailing_duration(rest: &str) -> (&str, Option<u32>) {
        match rest.rsplit_once(char::is_whitespace) {
            Some((head, tail)) => match parse_duration_token(tail) {
                Some(secs) => (head.trim_end(), Some(secs)),
                None => (rest, None),
            },
            None => (rest, None),
        }
    }

    fn parse_duration_token(token: &str) -> Option<u32> {
        let (minutes, seconds) = token.split_once(':')?;
        let minutes: u32 = minutes.parse().ok()?;
        let seconds: u32 = seconds.parse().ok()?;
        if seconds >= 60 {
            return None;
        }
        Some(minutes * 60 + seconds)
    }

    /// Resolve a user-supplied selector to a track id
    ///
    /// Accepts a 1-based position or a unique id prefix. Returns `None`
    /// when nothing (or more than one track) matches.
    fn resolve_track_id(state: &SessionState, selector: &str) -> Option<String> {
        if let Ok(position) = selector.parse::<usize>() {
            if position >= 1 && position <= state.present.len() {
                return Some(state.present[position - 1].id.clone());
            }
            return None;
        }

        let prefix = selector.to_uppercase();
        let mut matches = state.present.iter().filter(|t| t.id.starts_with(&prefix));
        match (matches.next(), matches.next()) {
            (Some(track), None) => Some(track.id.clone()),
            _ => None,
        }
    }

}

// Export/import command handlers
pub mod transfer {
    use super::*;
    use std::path::Path;

    /// Export a playlist to a file, or stdout when no path is given
    pub async fn run_export(
        collections: &CollectionStore,
        name: &str,
        output: Option<&Path>,
    ) -> Result<()> {
        use colored::Colorize;

        tracing::info!("Exporting playlist '{}'", name);

        let text = match collections.export_as_text(name).await? {
            Some(text) => text,
            None => {
                println!("{}", format!("Playlist '{}' not found", name).yellow());
                return Ok(());
            }
        };

        match output {
            Some(path) => {
                tokio::fs::write(path, &text).await?;
                println!(
                    "{}",
                    format!("Exported '{}' to {}", name, path.display()).green()
                );
            }
            None => println!("{}", text),
        }
        Ok(())
    }

    /// Import a playlist from an export file
    pub async fn run_import(collections: &CollectionStore, file: &Path) -> Result<()> {
        use colored::Colorize;

        tracing::info!("Importing playlist from {}", file.display());

        let text = tokio::fs::read_to_string(file).await.map_err(|e| {
            MixtapeError::InvalidImport(format!("cannot read {}: {}", file.display(), e))
        })?;
        let name = collections.import_from_text(&text).await?;

        println!("{}", format!("Imported playlist '{}'", name).green());
        Ok(())
    }

}

// Duplicate, delete, and cleanup command handlers
pub mod manage {
    use super::*;

    /// Copy a playlist under a new name
    pub async fn run_duplicate(
        collections: &CollectionStore,
        from: &str,
        to: &str,
    ) -> Result<()> {
        use colored::Colorize;

        tracing::info!("Duplicating '{}' as '{}'", from, to);

        if collections.duplicate(from, to).await? {
            println!("{}", format!("Duplicated '{}' as '{}'", from, to).green());
        } else {
            println!("{}", format!("Playlist '{}' not found", from).yellow());
        }
        Ok(())
    }

    /// Delete a playlist's data and registry entry
    pub async fn run_delete(collections: &CollectionStore, name: &str) -> Result<()> {
        tracing::info!("Deleting playlist '{}'", name);

        collections.delete(name).await?;
        collections.unregister_name(name).await?;
        println!("Deleted '{}'", name);
        Ok(())
    }

    /// Remove stored playlists the registry no longer lists
    pub async fn run_cleanup(collections: &CollectionStore) -> Result<()> {
        tracing::info!("Cleaning up orphaned playlists");

        match collections.cleanup_orphans().await? {
            0 => println!("Nothing to clean up."),
            n => println!("Removed {} orphaned playlist(s).", n),
        }
        Ok(())
    }

}

// Whole-store backup and restore command handlers
pub mod backup {
    use super::*;
    use std::path::Path;

    /// Write every playlist plus settings to a backup file
    pub async fn run_backup(store: JsonStore, output: &Path) -> Result<()> {
        use colored::Colorize;

        tracing::info!("Writing backup to {}", output.display());

        let manager = BackupManager::new(store);
        let text = manager.export_all().await?;
        tokio::fs::write(output, &text).await?;

        println!(
            "{}",
            format!("Backup written to {}", output.display()).green()
        );
        Ok(())
    }

    /// Restore a backup file, replacing the playlist registry
    pub async fn run_restore(store: JsonStore, file: &Path) -> Result<()> {
        use colored::Colorize;

        tracing::info!("Restoring backup from {}", file.display());

        let manager = BackupManager::new(store);
        let text = tokio::fs::read_to_string(file).await.map_err(|e| {
            MixtapeError::InvalidImport(format!("cannot read {}: {}", file.display(), e))
        })?;
        let summary = manager.import_all(&text).await?;

        println!(
            "{}",
            format!("Restored {} playlist(s)", summary.collections).green()
        );
        Ok(())
    }

}
