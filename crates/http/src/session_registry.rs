//! Live chat sessions keyed by id.
//!
//! Each session sits behind its own async mutex that is held for a whole
//! turn, so concurrent requests for one session are serialized while other
//! sessions proceed. Sessions untouched for longer than the idle TTL are
//! evicted on the next `create` and by [`crate::start_session_sweeper`].

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use dqbot_core::DEFAULT_SESSION_IDLE_SECS;
use dqbot_service::Session;
use tokio::sync::{Mutex, RwLock};

pub type SharedSession = Arc<Mutex<Session>>;

struct Entry {
    session: SharedSession,
    last_active: Instant,
}

pub struct SessionRegistry {
    system_prompt: String,
    idle_ttl: Duration,
    sessions: RwLock<HashMap<String, Entry>>,
}

impl SessionRegistry {
    #[must_use]
    pub fn new(system_prompt: impl Into<String>) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            idle_ttl: Duration::from_secs(DEFAULT_SESSION_IDLE_SECS),
            sessions: RwLock::new(HashMap::new()),
        }
    }

    #[must_use]
    pub const fn with_idle_ttl(mut self, idle_ttl: Duration) -> Self {
        self.idle_ttl = idle_ttl;
        self
    }

    /// Opens a session with a fresh id, evicting idle ones first.
    pub async fn create(&self) -> (String, SharedSession) {
        let id = uuid::Uuid::new_v4().to_string();
        let session = Arc::new(Mutex::new(Session::new(id.clone(), self.system_prompt.clone())));
        let mut sessions = self.sessions.write().await;
        evict(&mut sessions, self.idle_ttl);
        sessions.insert(id.clone(), Entry { session: Arc::clone(&session), last_active: Instant::now() });
        tracing::debug!(session = %id, "chat session opened");
        (id, session)
    }

    /// Looks a session up and marks it active.
    pub async fn get(&self, id: &str) -> Option<SharedSession> {
        let mut sessions = self.sessions.write().await;
        let entry = sessions.get_mut(id)?;
        entry.last_active = Instant::now();
        Some(Arc::clone(&entry.session))
    }

    /// Discards a session. Returns whether it existed.
    pub async fn remove(&self, id: &str) -> bool {
        let removed = self.sessions.write().await.remove(id).is_some();
        if removed {
            tracing::debug!(session = %id, "chat session closed");
        }
        removed
    }

    /// Drops every session idle for at least the TTL. Returns how many went.
    pub async fn evict_idle(&self) -> usize {
        evict(&mut *self.sessions.write().await, self.idle_ttl)
    }

    pub(crate) async fn count(&self) -> usize {
        self.sessions.read().await.len()
    }
}

fn evict(sessions: &mut HashMap<String, Entry>, idle_ttl: Duration) -> usize {
    let before = sessions.len();
    sessions.retain(|id, entry| {
        let keep = entry.last_active.elapsed() < idle_ttl;
        if !keep {
            tracing::debug!(session = %id, "idle chat session evicted");
        }
        keep
    });
    before - sessions.len()
}
