//! Sticky client affinity.
//!
//! # Responsibilities
//! - Remember which endpoint last served a client
//! - Expire bindings lazily on access
//! - Purge bindings when their endpoint goes away

use std::collections::HashMap;
use std::time::{Duration, Instant};

/// A client's remembered endpoint.
#[derive(Debug, Clone)]
pub struct StickyBinding {
    pub endpoint_id: String,
    pub expires_at: Option<Instant>,
}

impl StickyBinding {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

/// Client id → endpoint bindings with refreshable TTLs.
#[derive(Debug, Default)]
pub struct StickyTable {
    bindings: HashMap<String, StickyBinding>,
}

impl StickyTable {
    /// Look up a live binding, purging it if expired.
    pub fn lookup(&mut self, client_id: &str, now: Instant) -> Option<String> {
        match self.bindings.get(client_id) {
            Some(binding) if binding.is_expired(now) => {
                self.bindings.remove(client_id);
                None
            }
            Some(binding) => Some(binding.endpoint_id.clone()),
            None => None,
        }
    }

    /// Create, overwrite or refresh the binding for a client.
    pub fn bind(&mut self, client_id: &str, endpoint_id: &str, ttl: Duration, now: Instant) {
        let expires_at = (ttl > Duration::ZERO).then(|| now + ttl);
        self.bindings.insert(
            client_id.to_string(),
            StickyBinding {
                endpoint_id: endpoint_id.to_string(),
                expires_at,
            },
        );
    }

    /// Drop one client's binding.
    pub fn remove(&mut self, client_id: &str) {
        self.bindings.remove(client_id);
    }

    /// Drop every binding that points at `endpoint_id`.
    pub fn purge_endpoint(&mut self, endpoint_id: &str) {
        self.bindings
            .retain(|_, binding| binding.endpoint_id != endpoint_id);
    }

    /// Drop every expired binding.
    pub fn sweep_expired(&mut self, now: Instant) {
        self.bindings.retain(|_, binding| !binding.is_expired(now));
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}
