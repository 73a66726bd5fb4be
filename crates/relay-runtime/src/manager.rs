//! Process-wide session registry.
//!
//! Owns every live [`Session`] and its [`EventQueue`]. Capacity is a
//! semaphore: a session holds one permit from creation until its run
//! reaches a terminal state (RAII via `OwnedSemaphorePermit`), so
//! finished-but-unevicted sessions never starve new work. Registry
//! mutations are serialized behind one `RwLock`; operations on different
//! sessions never contend beyond that map access.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use metrics::gauge;
use parking_lot::RwLock;
use relay_core::metrics::SESSIONS_ACTIVE;
use relay_core::{Session, SessionStatus};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::errors::RuntimeError;
use crate::queue::{EventCursor, EventQueue};

/// One registered session: its mutable state, its event queue, and the
/// concurrency permit its run holds.
pub struct SessionEntry {
    session: RwLock<Session>,
    queue: Arc<EventQueue>,
    /// Released when the run finishes (see [`SessionManager::finish`]).
    permit: parking_lot::Mutex<Option<OwnedSemaphorePermit>>,
}

impl SessionEntry {
    /// Read-only snapshot of the session.
    #[must_use]
    pub fn snapshot(&self) -> Session {
        self.session.read().clone()
    }

    /// Session id.
    #[must_use]
    pub fn id(&self) -> String {
        self.session.read().id.clone()
    }

    /// The session's event queue.
    #[must_use]
    pub fn queue(&self) -> &Arc<EventQueue> {
        &self.queue
    }

    /// Mutate the session under its lock.
    pub fn update<R>(&self, f: impl FnOnce(&mut Session) -> R) -> R {
        f(&mut self.session.write())
    }

    /// Advance the session's status, enforcing the transition table.
    pub fn advance(&self, next: SessionStatus) -> Result<(), RuntimeError> {
        self.session.write().advance(next)?;
        Ok(())
    }

    fn release_permit(&self) {
        let _ = self.permit.lock().take();
    }
}

impl fmt::Debug for SessionEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionEntry")
            .field("session", &*self.session.read())
            .field("events", &self.queue.len())
            .finish_non_exhaustive()
    }
}

/// Registry of live sessions with bounded concurrency and eviction.
pub struct SessionManager {
    entries: RwLock<HashMap<String, Arc<SessionEntry>>>,
    permits: Arc<Semaphore>,
    max_concurrent: usize,
    grace: Duration,
}

impl SessionManager {
    /// Create a manager allowing `max_concurrent` unfinished sessions,
    /// evicting terminal sessions `grace` after completion.
    #[must_use]
    pub fn new(max_concurrent: usize, grace: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            permits: Arc::new(Semaphore::new(max_concurrent)),
            max_concurrent,
            grace,
        }
    }

    /// Register a fresh session in `Created`.
    ///
    /// `id: None` generates a UUID v7. Fails with `CapacityExceeded` when
    /// all permits are taken (registering nothing), and `SessionExists`
    /// for a duplicate id — at most one run per id, never an overwrite.
    #[instrument(skip(self, request_text))]
    pub fn create(
        &self,
        id: Option<String>,
        request_text: &str,
    ) -> Result<Arc<SessionEntry>, RuntimeError> {
        // Acquire the permit before touching the registry so a rejected
        // create leaves no partial state behind.
        let permit = Arc::clone(&self.permits)
            .try_acquire_owned()
            .map_err(|_| RuntimeError::CapacityExceeded {
                max: self.max_concurrent,
            })?;

        let id = id.unwrap_or_else(|| Uuid::now_v7().to_string());
        let entry = Arc::new(SessionEntry {
            session: RwLock::new(Session::new(&id, request_text)),
            queue: Arc::new(EventQueue::new(&id)),
            permit: parking_lot::Mutex::new(Some(permit)),
        });

        let mut entries = self.entries.write();
        if entries.contains_key(&id) {
            // Permit drops here; nothing was registered.
            return Err(RuntimeError::SessionExists(id));
        }
        let _ = entries.insert(id.clone(), Arc::clone(&entry));
        gauge!(SESSIONS_ACTIVE).set(entries.len() as f64);
        info!(session_id = %id, "session created");
        Ok(entry)
    }

    /// Look up a session entry.
    pub fn entry(&self, id: &str) -> Result<Arc<SessionEntry>, RuntimeError> {
        self.entries
            .read()
            .get(id)
            .map(Arc::clone)
            .ok_or_else(|| RuntimeError::SessionNotFound(id.to_string()))
    }

    /// Read-only snapshot of a session.
    pub fn get(&self, id: &str) -> Result<Session, RuntimeError> {
        Ok(self.entry(id)?.snapshot())
    }

    /// Attach to a session's event stream.
    ///
    /// Replays buffered history then follows live events; see
    /// [`EventCursor`]. Attaching starts no new work.
    pub fn attach(&self, id: &str) -> Result<EventCursor, RuntimeError> {
        Ok(self.entry(id)?.queue.subscribe())
    }

    /// Release a finished session's concurrency permit.
    ///
    /// Called by the orchestrator when a run reaches a terminal state.
    /// The entry stays registered (and attachable) until eviction.
    pub fn finish(&self, entry: &SessionEntry) {
        entry.release_permit();
        debug!(session_id = %entry.id(), "session run finished");
    }

    /// Remove a terminal session whose grace period has elapsed.
    ///
    /// Evicting a non-terminal session is not permitted.
    #[instrument(skip(self))]
    pub fn evict(&self, id: &str) -> Result<(), RuntimeError> {
        let entry = self.entry(id)?;
        if !self.eligible_for_eviction(&entry) {
            return Err(RuntimeError::SessionNotTerminal(id.to_string()));
        }
        let mut entries = self.entries.write();
        let _ = entries.remove(id);
        gauge!(SESSIONS_ACTIVE).set(entries.len() as f64);
        info!(session_id = %id, "session evicted");
        Ok(())
    }

    /// Evict every eligible session; returns how many were removed.
    ///
    /// Driven by the server's background sweep task.
    pub fn sweep(&self) -> usize {
        let eligible: Vec<String> = {
            let entries = self.entries.read();
            entries
                .iter()
                .filter(|(_, e)| self.eligible_for_eviction(e))
                .map(|(id, _)| id.clone())
                .collect()
        };
        let mut removed = 0;
        for id in eligible {
            match self.evict(&id) {
                Ok(()) => removed += 1,
                // Lost a race with an explicit evict; fine.
                Err(e) => warn!(session_id = %id, error = %e, "sweep eviction skipped"),
            }
        }
        removed
    }

    /// Number of registered sessions (live and terminal-awaiting-eviction).
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    fn eligible_for_eviction(&self, entry: &SessionEntry) -> bool {
        let session = entry.session.read();
        if !session.status.is_terminal() {
            return false;
        }
        let Some(completed_at) = session.completed_at else {
            return false;
        };
        let grace = chrono::Duration::from_std(self.grace).unwrap_or_else(|_| chrono::Duration::zero());
        chrono::Utc::now() >= completed_at + grace
    }
}
