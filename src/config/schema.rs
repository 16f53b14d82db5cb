//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the pool.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Root configuration for an endpoint pool.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct PoolConfig {
    /// Pool-wide tuning knobs.
    pub settings: PoolSettings,

    /// Endpoint definitions.
    pub endpoints: Vec<EndpointConfig>,
}

/// Pool-wide tuning knobs.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PoolSettings {
    /// Decay factor applied to success and latency EWMA updates, in (0, 1].
    pub ewma_decay: f64,

    /// Latency that seeds new endpoints and normalizes the latency penalty (ms).
    pub default_latency_ms: f64,

    /// Default lease lifetime in seconds (0 = leases never expire).
    pub session_ttl_secs: u64,

    /// Sticky binding lifetime in seconds (0 = bindings never expire).
    pub sticky_ttl_secs: u64,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            ewma_decay: 0.3,
            default_latency_ms: 100.0,
            session_ttl_secs: 30,
            sticky_ttl_secs: 300,
        }
    }
}

/// A single upstream endpoint definition.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EndpointConfig {
    /// Unique endpoint identifier.
    pub id: String,

    /// Endpoint address (e.g., "10.0.0.5:3128").
    pub address: String,

    /// Weight for scored selection (default: 1.0).
    #[serde(default = "default_weight")]
    pub weight: f64,

    /// Maximum concurrent sessions (None = unbounded).
    #[serde(default)]
    pub max_sessions: Option<u32>,

    /// Observations before scoring trusts the success EWMA.
    #[serde(default = "default_warmup_samples")]
    pub warmup_samples: u32,

    /// Success EWMA at or below which the endpoint is marked unhealthy.
    #[serde(default = "default_failure_threshold")]
    pub failure_threshold: f64,

    /// Success EWMA at or above which the endpoint recovers.
    #[serde(default = "default_recovery_threshold")]
    pub recovery_threshold: f64,

    /// Penalty window after a failure in seconds (0 = no cooldown).
    #[serde(default = "default_cooldown_secs")]
    pub cooldown_secs: f64,

    /// Opaque metadata handed back to callers on the lease.
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl EndpointConfig {
    /// Create a definition with default tuning for `id` at `address`.
    pub fn new(id: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            address: address.into(),
            weight: default_weight(),
            max_sessions: None,
            warmup_samples: default_warmup_samples(),
            failure_threshold: default_failure_threshold(),
            recovery_threshold: default_recovery_threshold(),
            cooldown_secs: default_cooldown_secs(),
            metadata: HashMap::new(),
        }
    }
}

fn default_weight() -> f64 {
    1.0
}

fn default_warmup_samples() -> u32 {
    5
}

fn default_failure_threshold() -> f64 {
    0.2
}

fn default_recovery_threshold() -> f64 {
    0.5
}

fn default_cooldown_secs() -> f64 {
    10.0
}
