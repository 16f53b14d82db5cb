//! Pool-facing types and error definitions.

use serde::Serialize;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use thiserror::Error;

use crate::config::ValidationError;

/// Errors that can occur during pool operations.
#[derive(Debug, Error)]
pub enum PoolError {
    /// Endpoint configuration was rejected at registration time.
    #[error("configuration error: {0}")]
    Configuration(#[from] ValidationError),

    /// No endpoint satisfies the availability predicate.
    #[error("no endpoint available")]
    NotAvailable,

    /// Operation referenced an endpoint id that is not registered.
    #[error("unknown endpoint: {0}")]
    UnknownEndpoint(String),
}

/// Result type for pool operations.
pub type PoolResult<T> = Result<T, PoolError>;

/// Time source abstraction so tests can drive expiry deterministically.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// Wall-clock time source used outside tests.
#[derive(Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Options for acquiring a lease.
#[derive(Debug, Clone)]
pub struct AcquireOptions {
    /// Logical client identifier for sticky routing.
    pub client_id: Option<String>,

    /// Retry selection with degraded endpoints when the strict pass is empty.
    pub allow_unhealthy_fallback: bool,

    /// Lease lifetime override (None = pool default, zero = never expires).
    pub ttl: Option<Duration>,
}

impl Default for AcquireOptions {
    fn default() -> Self {
        Self {
            client_id: None,
            allow_unhealthy_fallback: true,
            ttl: None,
        }
    }
}

impl AcquireOptions {
    /// Default options carrying a client identifier for sticky routing.
    pub fn for_client(client_id: impl Into<String>) -> Self {
        Self {
            client_id: Some(client_id.into()),
            ..Self::default()
        }
    }
}

/// A session handed to a caller, counting against the owning endpoint's
/// concurrency cap until released or expired.
///
/// Carries everything the caller's own network layer needs to perform the
/// actual call; the pool itself never touches the address.
#[derive(Debug, Clone)]
pub struct Lease {
    /// Pool-wide session identifier (`endpoint_id:sequence`).
    pub session_id: String,

    /// Owning endpoint.
    pub endpoint_id: String,

    /// Endpoint address to dial.
    pub address: String,

    /// Endpoint metadata as configured.
    pub metadata: HashMap<String, String>,

    /// When the lease was minted.
    pub acquired_at: Instant,

    /// When the lease lapses (None = held until released).
    pub expires_at: Option<Instant>,
}

/// Point-in-time projection of one endpoint's config and health.
#[derive(Debug, Clone, Serialize)]
pub struct EndpointSnapshot {
    pub id: String,
    pub address: String,
    pub weight: f64,
    pub healthy: bool,
    pub in_cooldown: bool,
    pub cooldown_remaining_secs: f64,
    pub success_ewma: f64,
    pub effective_success: f64,
    pub latency_ewma_ms: f64,
    pub observations: u64,
    pub active_sessions: u32,
    pub max_sessions: Option<u32>,
    pub score: f64,
    pub metadata: HashMap<String, String>,
}
