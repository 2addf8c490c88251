//! Playlist edit history
//!
//! Defines the session state record `{present, past, future}` and the pure
//! [`reduce`] function that advances it. Mutating actions snapshot the
//! current tracks onto the undo stack and clear the redo stack; undo and
//! redo shuttle snapshots between the two stacks.
//!
//! The reducer performs no I/O and never fails. Callers supply fully formed
//! [`Track`] values (see [`crate::session::TrackFactory`]) and detect
//! whether an action changed anything by comparing states for equality.

use serde::{Deserialize, Serialize};

/// A single track in a playlist
///
/// Tracks are immutable once created; removal deletes them from the
/// collection but not from history snapshots already captured. Serialized
/// field names are camelCase to match the persisted document format.
///
/// # Examples
///
/// ```
/// use mixtape::history::Track;
///
/// let track = Track {
///     id: "01ARZ3NDEKTSV4RRFFQ69G5FAV".to_string(),
///     title: "Paranoid Android".to_string(),
///     artist: Some("Radiohead".to_string()),
///     duration_secs: Some(383),
///     added_at: 1_700_000_000_000,
/// };
/// assert_eq!(track.title, "Paranoid Android");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    /// Unique track identifier (ULID)
    pub id: String,

    /// Track title
    pub title: String,

    /// Artist name, if known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artist: Option<String>,

    /// Track length in seconds, if known
    #[serde(default, rename = "duration", skip_serializing_if = "Option::is_none")]
    pub duration_secs: Option<u32>,

    /// Creation timestamp in epoch milliseconds, never mutated
    pub added_at: i64,
}

/// One editable collection's tracks plus its undo/redo history
///
/// `past` holds snapshots oldest-first; `future` holds snapshots
/// nearest-undo-first. All three fields are required when deserializing, so
/// a stored value with a different shape is rejected rather than silently
/// coerced into an empty collection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    /// The tracks currently in the playlist, in insertion order
    pub present: Vec<Track>,

    /// Undo stack: previous values of `present`, oldest first
    pub past: Vec<Vec<Track>>,

    /// Redo stack: undone values of `present`, nearest first
    pub future: Vec<Vec<Track>>,
}

impl SessionState {
    /// Whether an undo would change the state
    pub fn can_undo(&self) -> bool {
        !self.past.is_empty()
    }

    /// Whether a redo would change the state
    pub fn can_redo(&self) -> bool {
        !self.future.is_empty()
    }
}

/// An edit intent against a session
///
/// `Add`, `Remove`, and `Clear` record a history entry; `Undo` and `Redo`
/// navigate it; `ReplaceAll` adopts a state verbatim and is used when
/// hydrating a session from storage.
#[derive(Debug, Clone)]
pub enum Action {
    /// Append a track to the playlist
    Add(Track),
    /// Remove the track with the given id
    Remove {
        /// Id of the track to remove
        id: String,
    },
    /// Remove every track
    Clear,
    /// Step back to the previous snapshot
    Undo,
    /// Step forward to the next snapshot
    Redo,
    /// Discard the current state and adopt the given one unchanged
    ReplaceAll(SessionState),
}

/// Advance a session state by one action
///
/// Pure function: no side effects, no clock, no randomness. Actions that
/// cannot apply (`Undo` with an empty undo stack, `Redo` with an empty redo
/// stack) return the state unchanged; callers compare states for equality
/// to detect that nothing happened.
///
/// `Remove` records a history entry even when the id is absent, matching
/// the persisted histories this crate has always produced.
///
/// # Examples
///
/// ```
/// use mixtape::history::{reduce, Action, SessionState, Track};
///
/// let track = Track {
///     id: "a".to_string(),
///     title: "Roygbiv".to_string(),
///     artist: None,
///     duration_secs: None,
///     added_at: 0,
/// };
///
/// let state = reduce(SessionState::default(), Action::Add(track));
/// assert_eq!(state.present.len(), 1);
/// assert!(state.can_undo());
/// ```
pub fn reduce(state: SessionState, action: Action) -> SessionState {
    match action {
        Action::Add(track) => {
            let SessionState {
                mut present,
                mut past,
                ..
            } = state;
            past.push(present.clone());
            present.push(track);
            SessionState {
                present,
                past,
                future: Vec::new(),
            }
        }
        Action::Remove { id } => {
            let SessionState {
                present, mut past, ..
            } = state;
            past.push(present.clone());
            let present = present.into_iter().filter(|t| t.id != id).collect();
            SessionState {
                present,
                past,
                future: Vec::new(),
            }
        }
        Action::Clear => {
            let SessionState {
                present, mut past, ..
            } = state;
            past.push(present);
            SessionState {
                present: Vec::new(),
                past,
                future: Vec::new(),
            }
        }
        Action::Undo => {
            let SessionState {
                present,
                mut past,
                mut future,
            } = state;
            match past.pop() {
                Some(previous) => {
                    future.insert(0, present);
                    SessionState {
                        present: previous,
                        past,
                        future,
                    }
                }
                None => SessionState {
                    present,
                    past,
                    future,
                },
            }
        }
        Action::Redo => {
            let SessionState {
                present,
                mut past,
                mut future,
            } = state;
            if future.is_empty() {
                SessionState {
                    present,
                    past,
                    future,
                }
            } else {
                let next = future.remove(0);
                past.push(present);
                SessionState {
                    present: next,
                    past,
                    future,
                }
            }
        }
        Action::ReplaceAll(new_state) => new_state,
    }
}
