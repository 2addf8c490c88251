//! Edit session orchestration
//!
//! [`SessionController`] connects the pure history reducer to the
//! collection store. Selecting a name hydrates the in-memory state from
//! storage, every effective state change schedules a debounced persist of
//! the selected collection, and the explicit save/delete operations keep
//! the registry consistent.
//!
//! # Liveness
//!
//! Asynchronous work is tied to the session's `epoch`, a counter bumped on
//! every selection change. A load or scheduled write captures the epoch
//! when it starts and rechecks it before applying its result, so selecting
//! collection B while A's load is still in flight can never let A's late
//! result clobber B's state. The in-memory record sits behind a std mutex
//! that is never held across an await; [`SessionController::dispatch`] is
//! synchronous.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::Utc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use ulid::{Generator, Ulid};

use crate::collections::keys::validate_name;
use crate::collections::CollectionStore;
use crate::error::Result;
use crate::history::{reduce, Action, SessionState, Track};

/// Quiescence window used when no override is configured
pub const DEFAULT_QUIESCE: Duration = Duration::from_millis(500);

/// Outcome notifications for background persistence attempts
///
/// Exactly one event is emitted per attempt. Awaited operations report
/// failures through their `Result` instead.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// A debounced or flushed write landed
    Persisted {
        /// Collection that was written
        name: String,
    },
    /// A background write failed; in-memory state is unchanged
    PersistFailed {
        /// Collection the write was for
        name: String,
        /// Human-readable failure reason
        reason: String,
    },
}

/// Generator for track ids and timestamps
///
/// Ids are monotonic ULIDs, so tracks created by one session sort by
/// creation order. `added_at` is clamped to be non-decreasing even if the
/// wall clock steps backwards.
pub struct TrackFactory {
    inner: Mutex<FactoryInner>,
}

struct FactoryInner {
    generator: Generator,
    last_added_at: i64,
}

impl TrackFactory {
    /// Create a factory with a fresh ULID generator
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(FactoryInner {
                generator: Generator::new(),
                last_added_at: 0,
            }),
        }
    }

    /// Build a track with a fresh id and timestamp
    pub fn create(&self, title: &str, artist: Option<String>, duration_secs: Option<u32>) -> Track {
        let mut inner = match self.inner.lock() {
            Ok(guard) => guard,
            // Values only ever move forward; a poisoned lock is still consistent.
            Err(poisoned) => poisoned.into_inner(),
        };

        let added_at = Utc::now().timestamp_millis().max(inner.last_added_at);
        inner.last_added_at = added_at;

        // Random fallback if the monotonic counter overflows within one
        // millisecond; uniqueness is preserved either way.
        let id = inner
            .generator
            .generate()
            .unwrap_or_else(|_| Ulid::new())
            .to_string();

        Track {
            id,
            title: title.to_string(),
            artist,
            duration_secs,
            added_at,
        }
    }
}

impl Default for TrackFactory {
    fn default() -> Self {
        Self::new()
    }
}

struct Inner {
    state: SessionState,
    selected: Option<String>,
    epoch: u64,
    pending: Option<JoinHandle<()>>,
}

/// Orchestrates one edit session against the collection store
///
/// Owns the in-memory [`SessionState`] for the currently selected
/// collection, generates track ids and timestamps, and persists changes
/// after a quiescence window so bursts of edits coalesce into one write.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use std::time::Duration;
/// use mixtape::collections::CollectionStore;
/// use mixtape::history::Action;
/// use mixtape::session::SessionController;
/// use mixtape::store::{memory::MemoryStore, JsonStore};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> mixtape::error::Result<()> {
/// let collections = CollectionStore::new(JsonStore::new(Arc::new(MemoryStore::new())));
/// let (session, _events) = SessionController::new(collections, Duration::from_millis(10));
///
/// session.select_collection("road-trip").await?;
/// let track = session.new_track("Go", None, None);
/// let state = session.dispatch(Action::Add(track));
/// assert_eq!(state.present.len(), 1);
///
/// session.flush().await?;
/// # Ok(())
/// # }
/// ```
pub struct SessionController {
    collections: CollectionStore,
    quiesce: Duration,
    factory: TrackFactory,
    inner: Arc<Mutex<Inner>>,
    events: mpsc::UnboundedSender<SessionEvent>,
}

impl SessionController {
    /// Create a controller and the receiver for its persistence events
    ///
    /// # Arguments
    ///
    /// * `collections` - The persistence manager to load from and save to
    /// * `quiesce` - How long edits must be quiet before a persist fires
    pub fn new(
        collections: CollectionStore,
        quiesce: Duration,
    ) -> (Self, mpsc::UnboundedReceiver<SessionEvent>) {
        let (events, receiver) = mpsc::unbounded_channel();
        let controller = Self {
            collections,
            quiesce,
            factory: TrackFactory::new(),
            inner: Arc::new(Mutex::new(Inner {
                state: SessionState::default(),
                selected: None,
                epoch: 0,
                pending: None,
            })),
            events,
        };
        (controller, receiver)
    }

    fn lock_inner(&self) -> MutexGuard<'_, Inner> {
        match self.inner.lock() {
            Ok(guard) => guard,
            // Every critical section leaves the record whole; recover.
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Select a collection and hydrate the session from storage
    ///
    /// Cancels any pending write for the previous selection, bumps the
    /// session epoch, loads the named collection, and replaces the
    /// in-memory state with the loaded data (or the initial empty state if
    /// the name was never saved). A result arriving after the selection has
    /// changed again is discarded. Hydration itself is never persisted
    /// back.
    ///
    /// # Errors
    ///
    /// Returns `MixtapeError::InvalidName` for unusable names and
    /// `MixtapeError::CorruptData` if stored data exists but does not
    /// parse; on load failure the session is left deselected so a corrupt
    /// collection is never overwritten by accident.
    pub async fn select_collection(&self, name: &str) -> Result<()> {
        validate_name(name)?;

        let epoch = {
            let mut inner = self.lock_inner();
            if let Some(handle) = inner.pending.take() {
                handle.abort();
            }
            inner.epoch += 1;
            inner.selected = Some(name.to_string());
            inner.epoch
        };

        let loaded = match self.collections.load(name).await {
            Ok(loaded) => loaded,
            Err(e) => {
                let mut inner = self.lock_inner();
                if inner.epoch == epoch {
                    inner.selected = None;
                    inner.state = SessionState::default();
                }
                return Err(e);
            }
        };

        let mut inner = self.lock_inner();
        if inner.epoch != epoch {
            debug!(name = %name, "Discarding stale load result");
            return Ok(());
        }

        let state = loaded.unwrap_or_default();
        debug!(name = %name, tracks = state.present.len(), "Hydrated session");
        inner.state = reduce(
            std::mem::take(&mut inner.state),
            Action::ReplaceAll(state),
        );
        Ok(())
    }

    /// Apply an edit intent to the in-memory state
    ///
    /// Reduction happens synchronously. When the action actually changed
    /// the state and a collection is selected, the pending debounced write
    /// (if any) is replaced by a new one carrying the latest state, so a
    /// burst of edits produces a single write once the quiescence window
    /// elapses. Actions that change nothing schedule nothing.
    ///
    /// Must be called from within a Tokio runtime.
    ///
    /// # Returns
    ///
    /// A snapshot of the state after the action.
    pub fn dispatch(&self, action: Action) -> SessionState {
        let mut inner = self.lock_inner();

        let previous = std::mem::take(&mut inner.state);
        let next = reduce(previous.clone(), action);
        let changed = next != previous;
        inner.state = next.clone();

        if changed {
            if let Some(name) = inner.selected.clone() {
                self.schedule_persist(&mut inner, name, next.clone());
            }
        }

        next
    }

    /// Replace the pending write with one for the given snapshot.
    fn schedule_persist(&self, inner: &mut Inner, name: String, state: SessionState) {
        if let Some(handle) = inner.pending.take() {
            handle.abort();
        }

        let epoch = inner.epoch;
        let collections = self.collections.clone();
        let events = self.events.clone();
        let quiesce = self.quiesce;
        let shared = Arc::clone(&self.inner);

        inner.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(quiesce).await;

            // The selection may have moved on while we slept.
            {
                let guard = match shared.lock() {
                    Ok(guard) => guard,
                    Err(poisoned) => poisoned.into_inner(),
                };
                if guard.epoch != epoch || guard.selected.as_deref() != Some(name.as_str()) {
                    return;
                }
            }

            match collections.save(&name, &state).await {
                Ok(()) => {
                    debug!(name = %name, "Debounced persist completed");
                    let _ = events.send(SessionEvent::Persisted { name });
                }
                Err(e) => {
                    warn!(name = %name, error = %e, "Debounced persist failed");
                    let _ = events.send(SessionEvent::PersistFailed {
                        name,
                        reason: e.to_string(),
                    });
                }
            }
        }));
    }

    /// Run any pending debounced write now instead of waiting out the window
    ///
    /// Used on exit paths. A no-op when nothing is pending.
    pub async fn flush(&self) -> Result<()> {
        let job = {
            let mut inner = self.lock_inner();
            match inner.pending.take() {
                Some(handle) => {
                    handle.abort();
                    inner
                        .selected
                        .clone()
                        .map(|name| (name, inner.state.clone()))
                }
                None => None,
            }
        };

        if let Some((name, state)) = job {
            self.collections.save(&name, &state).await?;
            let _ = self.events.send(SessionEvent::Persisted { name });
        }
        Ok(())
    }

    /// Save the in-memory state under a name and start a fresh session
    ///
    /// Writes the state, registers the name, then resets the session to
    /// empty and deselects. On failure the session is left untouched so the
    /// edits survive for a retry.
    pub async fn save_current_as(&self, name: &str) -> Result<()> {
        validate_name(name)?;

        let state = {
            let mut inner = self.lock_inner();
            if let Some(handle) = inner.pending.take() {
                handle.abort();
            }
            inner.state.clone()
        };

        self.collections.save(name, &state).await?;
        self.collections.register_name(name).await?;

        let mut inner = self.lock_inner();
        inner.epoch += 1;
        inner.selected = None;
        inner.state = SessionState::default();
        Ok(())
    }

    /// Delete a collection's data and registry entry
    ///
    /// If the deleted name is the current selection, the session resets to
    /// the initial empty state and deselects.
    pub async fn delete_collection(&self, name: &str) -> Result<()> {
        {
            let mut inner = self.lock_inner();
            if inner.selected.as_deref() == Some(name) {
                if let Some(handle) = inner.pending.take() {
                    handle.abort();
                }
                inner.epoch += 1;
            }
        }

        self.collections.delete(name).await?;
        self.collections.unregister_name(name).await?;

        let mut inner = self.lock_inner();
        if inner.selected.as_deref() == Some(name) {
            inner.selected = None;
            inner.state = SessionState::default();
        }
        Ok(())
    }

    /// Build a track with a fresh id and timestamp
    pub fn new_track(
        &self,
        title: &str,
        artist: Option<String>,
        duration_secs: Option<u32>,
    ) -> Track {
        self.factory.create(title, artist, duration_secs)
    }

    /// Snapshot of the current in-memory state
    pub fn state(&self) -> SessionState {
        self.lock_inner().state.clone()
    }

    /// The currently selected collection name, if any
    pub fn selected(&self) -> Option<String> {
        self.lock_inner().selected.clone()
    }
}

impl Drop for SessionController {
    fn drop(&mut self) {
        if let Ok(mut inner) = self.inner.lock() {
            if let Some(handle) = inner.pending.take() {
                handle.abort();
            }
        }
    }
}
