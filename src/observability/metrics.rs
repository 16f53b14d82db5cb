//! Metrics collection.
//!
//! # Responsibilities
//! - Define pool metrics (acquires, results, health, sessions)
//! - Keep call sites one-liners via record_* helpers
//!
//! # Metrics
//! - `pool_acquire_total` (counter): leases minted, by endpoint and path
//! - `pool_acquire_unavailable_total` (counter): acquires that found no endpoint
//! - `pool_results_total` (counter): reported outcomes, by endpoint and outcome
//! - `pool_endpoint_health` (gauge): 1=healthy, 0=unhealthy
//! - `pool_active_sessions` (gauge): current sessions per endpoint
//! - `pool_sessions_expired_total` (counter): leases reclaimed by the sweep

use metrics::{counter, gauge};

/// Record a minted lease and which selection path produced it.
pub fn record_acquire(endpoint: &str, sticky: bool) {
    let path = if sticky { "sticky" } else { "scored" };
    counter!("pool_acquire_total", "endpoint" => endpoint.to_string(), "path" => path)
        .increment(1);
}

/// Record an acquire that found no available endpoint.
pub fn record_acquire_unavailable() {
    counter!("pool_acquire_unavailable_total").increment(1);
}

/// Record a reported outcome.
pub fn record_result(endpoint: &str, success: bool) {
    let outcome = if success { "success" } else { "failure" };
    counter!("pool_results_total", "endpoint" => endpoint.to_string(), "outcome" => outcome)
        .increment(1);
}

/// Record an endpoint's health flag.
pub fn record_endpoint_health(endpoint: &str, healthy: bool) {
    gauge!("pool_endpoint_health", "endpoint" => endpoint.to_string())
        .set(if healthy { 1.0 } else { 0.0 });
}

/// Record an endpoint's active session count.
pub fn record_active_sessions(endpoint: &str, count: u32) {
    gauge!("pool_active_sessions", "endpoint" => endpoint.to_string()).set(f64::from(count));
}

/// Record sessions reclaimed by the lazy expiry sweep.
pub fn record_sessions_expired(count: usize) {
    counter!("pool_sessions_expired_total").increment(count as u64);
}
