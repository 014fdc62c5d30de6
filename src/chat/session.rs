//! In-memory conversation history keyed by session id.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::openai::{Message, Role};

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ConversationMessage {
    pub role: Role,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

impl ConversationMessage {
    pub fn new(role: Role, text: &str) -> Self {
        Self {
            role,
            text: text.to_string(),
            timestamp: Utc::now(),
        }
    }

    pub fn to_message(&self) -> Message {
        Message::new(self.role, &self.text)
    }
}

struct SessionInner {
    history: Vec<ConversationMessage>,
    last_active: Instant,
}

/// A single conversation. History is append-only and every append
/// happens under the session's own lock so sessions never contend
/// with each other.
pub struct Session {
    id: String,
    inner: Mutex<SessionInner>,
}

impl Session {
    fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            inner: Mutex::new(SessionInner {
                history: Vec::new(),
                last_active: Instant::now(),
            }),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Snapshot of the history at the time of the call.
    pub fn history(&self) -> Vec<ConversationMessage> {
        self.inner
            .lock()
            .expect("Unable to lock session")
            .history
            .clone()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().expect("Unable to lock session").history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Append a completed exchange in one update so concurrent turns
    /// on the same session can't interleave their messages.
    pub fn append_exchange(&self, user_message: &str, assistant_response: &str) {
        let mut inner = self.inner.lock().expect("Unable to lock session");
        inner
            .history
            .push(ConversationMessage::new(Role::User, user_message));
        inner
            .history
            .push(ConversationMessage::new(Role::Assistant, assistant_response));
        inner.last_active = Instant::now();
    }

    fn touch(&self) {
        self.inner.lock().expect("Unable to lock session").last_active = Instant::now();
    }

    fn last_active(&self) -> Instant {
        self.inner.lock().expect("Unable to lock session").last_active
    }
}

/// Registry of live sessions. Sessions are created on first use and
/// removed by `evict_idle` once they have been inactive for longer
/// than the configured TTL.
pub struct SessionStore {
    sessions: RwLock<HashMap<String, Arc<Session>>>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Get the session for `id`, creating it if it doesn't exist. There
    /// is never more than one session per id.
    pub fn get_or_create(&self, id: &str) -> Arc<Session> {
        if let Some(session) = self.get(id) {
            return session;
        }

        let mut sessions = self.sessions.write().expect("Unable to write sessions");
        let session = sessions.entry(id.to_string()).or_insert_with(|| {
            tracing::debug!("Creating chat session {}", id);
            Arc::new(Session::new(id))
        });
        Arc::clone(session)
    }

    pub fn get(&self, id: &str) -> Option<Arc<Session>> {
        let sessions = self.sessions.read().expect("Unable to read sessions");
        sessions.get(id).map(|session| {
            session.touch();
            Arc::clone(session)
        })
    }

    pub fn len(&self) -> usize {
        self.sessions.read().expect("Unable to read sessions").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove sessions idle since before `now - ttl`. Returns the
    /// number of sessions removed. A turn that is still streaming keeps
    /// its own handle, so its final append is not lost, but the
    /// exchange will not be visible to later turns.
    pub fn evict_idle(&self, now: Instant) -> usize {
        let mut sessions = self.sessions.write().expect("Unable to write sessions");
        let before = sessions.len();
        sessions.retain(|_, session| now.saturating_duration_since(session.last_active()) <= self.ttl);
        before - sessions.len()
    }
}
