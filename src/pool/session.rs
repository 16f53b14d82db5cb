//! Session (lease) bookkeeping.
//!
//! # Responsibilities
//! - Store active sessions keyed by id
//! - Remove sessions idempotently (double release is a no-op)
//! - Sweep expired sessions lazily; no background timer

use std::collections::HashMap;
use std::time::Instant;

/// An active session counted against one endpoint's concurrency cap.
#[derive(Debug, Clone)]
pub struct Session {
    /// Pool-wide identifier (`endpoint_id:sequence`).
    pub id: String,

    /// Owning endpoint.
    pub endpoint_id: String,

    /// When the session was minted.
    pub acquired_at: Instant,

    /// When the session lapses (None = held until released).
    pub expires_at: Option<Instant>,

    /// Client that acquired the session, when sticky routing was used.
    pub client_id: Option<String>,
}

impl Session {
    /// Return true if the session is past its expiry at `now`.
    pub fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

/// Storage for active sessions.
#[derive(Debug, Default)]
pub struct SessionTable {
    sessions: HashMap<String, Session>,
}

impl SessionTable {
    pub fn insert(&mut self, session: Session) {
        self.sessions.insert(session.id.clone(), session);
    }

    /// Remove a session by id. Unknown ids return None.
    pub fn remove(&mut self, session_id: &str) -> Option<Session> {
        self.sessions.remove(session_id)
    }

    /// Remove and return every session past its expiry at `now`.
    pub fn sweep_expired(&mut self, now: Instant) -> Vec<Session> {
        let expired: Vec<String> = self
            .sessions
            .values()
            .filter(|session| session.is_expired(now))
            .map(|session| session.id.clone())
            .collect();
        expired
            .into_iter()
            .filter_map(|id| self.sessions.remove(&id))
            .collect()
    }

    /// Remove and return every session owned by `endpoint_id`.
    pub fn remove_for_endpoint(&mut self, endpoint_id: &str) -> Vec<Session> {
        let owned: Vec<String> = self
            .sessions
            .values()
            .filter(|session| session.endpoint_id == endpoint_id)
            .map(|session| session.id.clone())
            .collect();
        owned
            .into_iter()
            .filter_map(|id| self.sessions.remove(&id))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
