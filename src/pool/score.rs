//! Scored endpoint selection.
//!
//! The score is a product of independent non-negative factors, so it stays
//! positive for any valid configuration and larger always means better:
//!
//! ```text
//! score = weight × health_penalty × success × latency_penalty × session_penalty
//! ```

use std::time::Instant;

use crate::config::PoolSettings;
use crate::pool::endpoint::EndpointEntry;

/// Attenuation applied while unhealthy.
const UNHEALTHY_PENALTY: f64 = 0.3;

/// Attenuation applied while healthy but cooling down.
const COOLDOWN_PENALTY: f64 = 0.5;

/// Rank an endpoint for selection at `now`. Pure; never negative.
pub fn score(entry: &EndpointEntry, settings: &PoolSettings, now: Instant) -> f64 {
    let health = &entry.health;

    // Degraded endpoints are attenuated, never zeroed: a fully degraded pool
    // can still serve best-effort traffic through the fallback pass.
    let health_penalty = if !health.healthy {
        UNHEALTHY_PENALTY
    } else if health.in_cooldown(now) {
        COOLDOWN_PENALTY
    } else {
        1.0
    };

    let success = health.effective_success(entry.config.warmup_samples);
    let latency_penalty = 1.0 / (1.0 + health.latency_ewma_ms / settings.default_latency_ms);
    let session_penalty = 1.0 / (1.0 + f64::from(entry.active_sessions));

    entry.config.weight * health_penalty * success * latency_penalty * session_penalty
}
