//! Server-side session state
//!
//! Each browsing session owns at most one verified [`LaunchContext`].
//! Components never touch process-wide globals; the store is injected where
//! launch state is read or written. The deployment model assumes at most one
//! in-flight request per session, so no per-session locking beyond the map's
//! own sharding is needed.

use std::time::{SystemTime, UNIX_EPOCH};

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::lti::launch::LaunchContext;
use crate::lti::login::LoginStash;

fn now_unix() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Everything a session carries between requests
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    /// Verified launch; present once a launch POST has succeeded
    pub launch: Option<LaunchContext>,
    /// OIDC state/nonce recorded at login initiation
    pub login: Option<LoginStash>,
    /// AGS bearer token obtained out of band, if any
    pub lti13_access_token: Option<String>,
    pub created_at: u64,
    pub expires_at: u64,
}

impl SessionRecord {
    fn new(ttl_seconds: u64) -> Self {
        let now = now_unix();
        Self {
            launch: None,
            login: None,
            lti13_access_token: None,
            created_at: now,
            expires_at: now + ttl_seconds,
        }
    }

    pub fn is_expired(&self) -> bool {
        now_unix() >= self.expires_at
    }
}

/// In-memory session store with expiration
pub struct SessionStore {
    sessions: DashMap<String, SessionRecord>,
    ttl_seconds: u64,
}

impl SessionStore {
    pub fn new(ttl_seconds: u64) -> Self {
        Self {
            sessions: DashMap::new(),
            ttl_seconds,
        }
    }

    /// Create a fresh session and return its id
    pub fn create(&self) -> String {
        let id = Uuid::new_v4().to_string();
        self.sessions.insert(id.clone(), SessionRecord::new(self.ttl_seconds));
        debug!("session created: {}", id);
        id
    }

    /// Fetch a live session record; expired sessions are dropped on access
    pub fn get(&self, session_id: &str) -> Option<SessionRecord> {
        let record = self.sessions.get(session_id)?.clone();
        if record.is_expired() {
            self.sessions.remove(session_id);
            debug!("session expired: {}", session_id);
            return None;
        }
        Some(record)
    }

    /// Store a verified launch in the session, replacing any previous launch
    pub fn put_launch(&self, session_id: &str, launch: LaunchContext) {
        let mut entry = self
            .sessions
            .entry(session_id.to_string())
            .or_insert_with(|| SessionRecord::new(self.ttl_seconds));
        entry.launch = Some(launch);
    }

    /// Record the OIDC login stash for later launch validation
    pub fn put_login(&self, session_id: &str, stash: LoginStash) {
        let mut entry = self
            .sessions
            .entry(session_id.to_string())
            .or_insert_with(|| SessionRecord::new(self.ttl_seconds));
        entry.login = Some(stash);
    }

    pub fn remove(&self, session_id: &str) {
        self.sessions.remove(session_id);
    }

    /// Drop all expired sessions; returns how many were removed
    pub fn purge_expired(&self) -> usize {
        let before = self.sessions.len();
        self.sessions.retain(|_, record| !record.is_expired());
        before - self.sessions.len()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
