// src/infra/session.rs - Per-browser session state (in memory)

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use uuid::Uuid;

use crate::core::types::ConversationTurn;

#[derive(Debug, Clone)]
pub struct Session {
    pub id: String,
    /// Last time the session was seen or changed; drives idle eviction.
    pub updated_at: DateTime<Utc>,
    /// Append-only; oldest first.
    history: Vec<ConversationTurn>,
    api_key: Option<String>,
}

impl Session {
    pub fn new() -> Self {
        Self::with_id(Uuid::new_v4().to_string())
    }

    fn with_id(id: String) -> Self {
        Self {
            id,
            updated_at: Utc::now(),
            history: Vec::new(),
            api_key: None,
        }
    }

    pub fn history(&self) -> &[ConversationTurn] {
        &self.history
    }

    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

/// When sessions are dropped.
#[derive(Debug, Clone, Copy)]
pub struct SessionLimits {
    /// Sessions untouched for longer than this are removed.
    pub idle_timeout: Duration,
    /// Hard cap; the least recently used session makes room for a new one.
    pub max_sessions: usize,
}

impl Default for SessionLimits {
    fn default() -> Self {
        Self {
            idle_timeout: Duration::from_secs(3 * 60 * 60),
            max_sessions: 10_000,
        }
    }
}

/// All live sessions, keyed by the id carried in the session cookie.
#[derive(Clone, Default)]
pub struct SessionStore {
    inner: Arc<Mutex<HashMap<String, Session>>>,
    limits: SessionLimits,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limits(limits: SessionLimits) -> Self {
        Self {
            inner: Arc::default(),
            limits: SessionLimits {
                max_sessions: limits.max_sessions.max(1),
                ..limits
            },
        }
    }

    pub fn limits(&self) -> SessionLimits {
        self.limits
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Session>> {
        // Sessions hold plain data; a panic mid-update leaves nothing half-written.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Return the id of an existing session, or create one. The bool is true
    /// when a new session was created.
    pub fn ensure(&self, id: Option<&str>) -> (String, bool) {
        let mut sessions = self.lock();
        if let Some(id) = id {
            if let Some(session) = sessions.get_mut(id) {
                session.updated_at = Utc::now();
                return (id.to_string(), false);
            }
        }
        self.make_room(&mut sessions);
        let session = Session::new();
        let id = session.id.clone();
        sessions.insert(id.clone(), session);
        tracing::debug!("Created session {id}");
        (id, true)
    }

    /// Drop idle sessions, then the least recently used ones until a new
    /// session fits under the cap.
    fn make_room(&self, sessions: &mut HashMap<String, Session>) {
        let idle = chrono::Duration::from_std(self.limits.idle_timeout)
            .unwrap_or_else(|_| chrono::Duration::days(365));
        let cutoff = Utc::now() - idle;
        let before = sessions.len();
        sessions.retain(|_, s| s.updated_at > cutoff);

        while sessions.len() >= self.limits.max_sessions {
            let oldest = sessions
                .values()
                .min_by_key(|s| s.updated_at)
                .map(|s| s.id.clone());
            match oldest {
                Some(id) => {
                    sessions.remove(&id);
                }
                None => break,
            }
        }

        let evicted = before - sessions.len();
        if evicted > 0 {
            tracing::debug!(evicted, remaining = sessions.len(), "Evicted sessions");
        }
    }

    pub fn append(&self, id: &str, turn: ConversationTurn) {
        let mut sessions = self.lock();
        let session = sessions
            .entry(id.to_string())
            .or_insert_with(|| Session::with_id(id.to_string()));
        session.history.push(turn);
        session.updated_at = Utc::now();
    }

    pub fn history(&self, id: &str) -> Vec<ConversationTurn> {
        self.lock()
            .get(id)
            .map(|s| s.history.clone())
            .unwrap_or_default()
    }

    pub fn clear_history(&self, id: &str) {
        if let Some(session) = self.lock().get_mut(id) {
            session.history.clear();
            session.updated_at = Utc::now();
        }
    }

    pub fn api_key(&self, id: &str) -> Option<String> {
        self.lock().get(id).and_then(|s| s.api_key.clone())
    }

    /// Store a key for this session; blank input removes it.
    pub fn set_api_key(&self, id: &str, key: Option<&str>) {
        let key = key.map(str::trim).filter(|k| !k.is_empty()).map(String::from);
        let mut sessions = self.lock();
        let session = sessions
            .entry(id.to_string())
            .or_insert_with(|| Session::with_id(id.to_string()));
        session.api_key = key;
        session.updated_at = Utc::now();
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}
