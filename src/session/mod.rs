//! In-memory session store.
//!
//! Each session owns one [`TripState`] behind an async mutex, so turns of
//! the same session run one at a time while different sessions proceed
//! independently. Idle sessions expire after a TTL and the store holds
//! at most a fixed number of sessions, evicting the least recently used.
//! A session whose handle is still held by a running turn is never
//! expired or evicted; the store grows past capacity until it is released.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

use crate::agent::AgentConfig;
use crate::core::TripState;

/// Shared handle to one session's state.
pub type SessionHandle = Arc<tokio::sync::Mutex<TripState>>;

struct Entry {
    state: SessionHandle,
    last_access: Instant,
}

impl Entry {
    /// Whether a turn still holds a handle to this session.
    fn in_use(&self) -> bool {
        Arc::strong_count(&self.state) > 1
    }
}

/// Maps session ids to trip states.
pub struct SessionStore {
    sessions: Mutex<HashMap<String, Entry>>,
    ttl: Duration,
    capacity: usize,
}

impl SessionStore {
    /// Creates a store with the given idle TTL and capacity.
    #[must_use]
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            ttl,
            capacity: capacity.max(1),
        }
    }

    /// Creates a store using the session settings from `config`.
    #[must_use]
    pub fn from_config(config: &AgentConfig) -> Self {
        Self::new(config.session_ttl, config.max_sessions)
    }

    /// Returns the session for `id`, creating an empty one if needed.
    pub fn acquire(&self, id: &str) -> SessionHandle {
        let now = Instant::now();
        let mut sessions = self.sessions.lock().unwrap_or_else(PoisonError::into_inner);

        let ttl = self.ttl;
        sessions.retain(|_, entry| {
            entry.in_use() || now.duration_since(entry.last_access) <= ttl
        });

        if let Some(entry) = sessions.get_mut(id) {
            entry.last_access = now;
            return Arc::clone(&entry.state);
        }

        if sessions.len() >= self.capacity
            && let Some(oldest) = sessions
                .iter()
                .filter(|(_, entry)| !entry.in_use())
                .min_by_key(|(_, entry)| entry.last_access)
                .map(|(key, _)| key.clone())
        {
            debug!(session = %oldest, "evicting least recently used session");
            sessions.remove(&oldest);
        }

        let state: SessionHandle = Arc::new(tokio::sync::Mutex::new(TripState::new()));
        sessions.insert(
            id.to_string(),
            Entry {
                state: Arc::clone(&state),
                last_access: now,
            },
        );
        state
    }

    /// Removes a session. Returns whether it existed.
    pub fn clear(&self, id: &str) -> bool {
        self.sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(id)
            .is_some()
    }

    /// Number of live sessions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether the store holds no sessions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("sessions", &self.len())
            .field("ttl", &self.ttl)
            .field("capacity", &self.capacity)
            .finish()
    }
}
