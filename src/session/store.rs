use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::Session;

pub type SessionId = Uuid;

/// Per-browser sessions. Each id maps to its own [`Session`]; nothing is
/// shared between ids.
pub struct SessionStore {
    sessions: Mutex<HashMap<SessionId, Session>>,
    idle_ttl: Duration,
}

impl SessionStore {
    pub fn new(idle_ttl: Duration) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            idle_ttl,
        }
    }

    /// Starts an empty session, evicting ones idle past the TTL.
    pub async fn create(&self) -> SessionId {
        let mut sessions = self.sessions.lock().await;
        let before = sessions.len();
        let ttl = self.idle_ttl;
        sessions.retain(|_, s| s.last_seen().elapsed() < ttl);
        let evicted = before - sessions.len();
        if evicted > 0 {
            info!(evicted, "dropped idle sessions");
        }

        let id = Uuid::new_v4();
        sessions.insert(id, Session::new());
        debug!(session_id = %id, active = sessions.len(), "session created");
        id
    }

    /// The session for `id` if it is still alive, otherwise a fresh one.
    /// A live session has its idle timer refreshed.
    pub async fn open(&self, id: Option<SessionId>) -> SessionId {
        if let Some(id) = id {
            if let Some(session) = self.sessions.lock().await.get_mut(&id) {
                session.touch();
                return id;
            }
        }
        self.create().await
    }

    /// Runs `f` against the session, refreshing its idle timer.
    pub async fn with_session<R>(
        &self,
        id: SessionId,
        f: impl FnOnce(&mut Session) -> R,
    ) -> Option<R> {
        let mut sessions = self.sessions.lock().await;
        let session = sessions.get_mut(&id)?;
        session.touch();
        Some(f(session))
    }

    /// Like [`with_session`](Self::with_session), but a session evicted
    /// since it was opened is restarted empty under the same id. The flag is
    /// `true` when that happened.
    pub async fn with_session_or_restart<R>(
        &self,
        id: SessionId,
        f: impl FnOnce(&mut Session) -> R,
    ) -> (R, bool) {
        let mut sessions = self.sessions.lock().await;
        let restarted = !sessions.contains_key(&id);
        if restarted {
            warn!(session_id = %id, "session expired mid-request, restarting it");
        }
        let session = sessions.entry(id).or_insert_with(Session::new);
        session.touch();
        (f(session), restarted)
    }

    pub async fn destroy(&self, id: SessionId) -> bool {
        let removed = self.sessions.lock().await.remove(&id).is_some();
        if removed {
            debug!(session_id = %id, "session destroyed");
        }
        removed
    }

    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
