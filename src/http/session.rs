//! Per-browser sessions held in memory and the cookie that names them

use std::sync::Arc;

use axum::http::{header, HeaderMap, HeaderValue};
use indexmap::IndexMap;
use parking_lot::Mutex;
use tracing::debug;
use uuid::Uuid;

use crate::app::Session;

pub const SESSION_COOKIE: &str = "datawash_session";

/// Session key carried in a cookie
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(pub Uuid);

impl SessionId {
    /// The session named by the request's cookie, if it carries a valid one
    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        headers
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(|value| value.split(';'))
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(name, _)| *name == SESSION_COOKIE)
            .and_then(|(_, value)| Uuid::parse_str(value.trim()).ok())
            .map(SessionId)
    }

    pub fn generate() -> Self {
        SessionId(Uuid::new_v4())
    }

    pub fn set_cookie(&self) -> HeaderValue {
        let cookie = format!("{}={}; Path=/; HttpOnly; SameSite=Lax", SESSION_COOKIE, self.0);
        HeaderValue::from_str(&cookie).unwrap_or_else(|_| HeaderValue::from_static(""))
    }
}

/// Shared handle to one session; requests for the same session run one at a time
pub type SessionHandle = Arc<Mutex<Session>>;

/// Sessions keyed by id, least recently used first
pub struct SessionStore {
    sessions: Mutex<IndexMap<SessionId, SessionHandle>>,
    max_sessions: usize,
}

impl SessionStore {
    pub fn new(max_sessions: usize) -> Self {
        Self {
            sessions: Mutex::new(IndexMap::new()),
            max_sessions: max_sessions.max(1),
        }
    }

    /// The session for `id`, created if missing, marked most recently used.
    /// Sessions beyond capacity are evicted oldest first.
    pub fn get(&self, id: SessionId) -> SessionHandle {
        let mut sessions = self.sessions.lock();
        let handle = sessions.shift_remove(&id).unwrap_or_default();
        sessions.insert(id, Arc::clone(&handle));
        while sessions.len() > self.max_sessions {
            if let Some((evicted, _)) = sessions.shift_remove_index(0) {
                debug!(session = %evicted.0, "evicted session");
            }
        }
        handle
    }

    pub fn len(&self) -> usize {
        self.sessions.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
