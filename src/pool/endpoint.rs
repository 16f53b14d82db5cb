//! Registered endpoint entry.
//!
//! # Responsibilities
//! - Pair the normalized config with its mutable health record
//! - Track active sessions (capacity cap and session penalty)
//! - Answer the availability predicate for selection

use std::time::Instant;

use crate::config::EndpointConfig;
use crate::health::HealthState;

/// A registered endpoint with its live bookkeeping.
#[derive(Debug)]
pub struct EndpointEntry {
    /// Normalized configuration.
    pub config: EndpointConfig,

    /// Registration order, used to break score ties deterministically.
    pub order: u64,

    /// Mutable health record.
    pub health: HealthState,

    /// Sessions currently held against this endpoint.
    pub active_sessions: u32,

    /// Monotone counter for session id assignment.
    pub session_seq: u64,
}

impl EndpointEntry {
    pub fn new(config: EndpointConfig, order: u64, default_latency_ms: f64) -> Self {
        Self {
            config,
            order,
            health: HealthState::new(default_latency_ms),
            active_sessions: 0,
            session_seq: 0,
        }
    }

    /// Return true if one more session fits under the capacity cap.
    pub fn has_capacity(&self) -> bool {
        match self.config.max_sessions {
            Some(cap) => self.active_sessions < cap,
            None => true,
        }
    }

    /// Availability predicate for selection at `now`.
    ///
    /// The capacity cap is checked unconditionally; `allow_unhealthy` only
    /// relaxes the health and cooldown checks.
    pub fn is_available(&self, now: Instant, allow_unhealthy: bool) -> bool {
        if !self.has_capacity() {
            return false;
        }
        if allow_unhealthy {
            return true;
        }
        self.health.healthy && !self.health.in_cooldown(now)
    }

    /// Assign the next session sequence number.
    pub fn next_session_seq(&mut self) -> u64 {
        self.session_seq += 1;
        self.session_seq
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(max_sessions: Option<u32>) -> EndpointEntry {
        let config = EndpointConfig {
            max_sessions,
            ..EndpointConfig::new("a", "10.0.0.5:3128")
        };
        EndpointEntry::new(config, 0, 100.0)
    }

    #[test]
    fn test_capacity_boundary() {
        let mut entry = entry(Some(2));
        assert!(entry.has_capacity());

        entry.active_sessions = 1;
        assert!(entry.has_capacity());

        entry.active_sessions = 2;
        assert!(!entry.has_capacity());

        let unbounded = self::entry(None);
        assert!(unbounded.has_capacity());
    }

    #[test]
    fn test_fallback_never_bypasses_capacity() {
        let mut entry = entry(Some(1));
        entry.active_sessions = 1;
        entry.health.healthy = false;

        let now = Instant::now();
        assert!(!entry.is_available(now, false));
        // Relaxing health checks must not relax the cap.
        assert!(!entry.is_available(now, true));
    }

    #[test]
    fn test_unhealthy_selectable_only_with_fallback() {
        let mut entry = entry(None);
        entry.health.healthy = false;

        let now = Instant::now();
        assert!(!entry.is_available(now, false));
        assert!(entry.is_available(now, true));
    }
}
