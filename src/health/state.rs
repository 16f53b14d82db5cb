//! Endpoint health state machine.
//!
//! # States
//! - Healthy: endpoint scores at full strength
//! - Unhealthy: endpoint is attenuated and only selectable via fallback
//!
//! # State Transitions
//! ```text
//! Healthy → Unhealthy: success EWMA <= failure_threshold (on a failure)
//! Unhealthy → Healthy: success EWMA >= recovery_threshold (on a success)
//! ```
//! Values strictly between the two thresholds never change state.

use std::time::{Duration, Instant};

use crate::config::EndpointConfig;

/// Effective success factor at zero warm-up progress.
const WARMUP_FLOOR: f64 = 0.4;

/// Floor applied to the trusted EWMA so a failing endpoint never scores zero.
const MIN_SUCCESS_FACTOR: f64 = 0.05;

/// Mutable health record for a single endpoint.
#[derive(Debug, Clone)]
pub struct HealthState {
    /// Current state machine flag.
    pub healthy: bool,

    /// Exponentially weighted success rate in [0, 1].
    pub success_ewma: f64,

    /// Exponentially weighted latency in milliseconds.
    pub latency_ewma_ms: f64,

    /// Number of outcomes observed.
    pub observations: u64,

    /// Number of latency samples folded into the EWMA.
    pub latency_samples: u64,

    /// When the last failure was reported.
    pub last_failure_at: Option<Instant>,

    /// End of the active cooldown window, if any.
    pub cooldown_until: Option<Instant>,
}

impl HealthState {
    /// Fresh record: optimistic success rate, latency seeded from the pool
    /// default.
    pub fn new(default_latency_ms: f64) -> Self {
        Self {
            healthy: true,
            success_ewma: 1.0,
            latency_ewma_ms: default_latency_ms,
            observations: 0,
            latency_samples: 0,
            last_failure_at: None,
            cooldown_until: None,
        }
    }

    /// Return true if the endpoint is inside a cooldown window at `now`.
    pub fn in_cooldown(&self, now: Instant) -> bool {
        self.cooldown_until.is_some_and(|until| now < until)
    }

    /// Success factor used by scoring: a linear ramp while warming up, the
    /// floored EWMA once enough outcomes have been observed.
    pub fn effective_success(&self, warmup_samples: u32) -> f64 {
        if self.observations < u64::from(warmup_samples) {
            let progress = self.observations as f64 / f64::from(warmup_samples);
            WARMUP_FLOOR + (1.0 - WARMUP_FLOOR) * progress
        } else {
            self.success_ewma.max(MIN_SUCCESS_FACTOR)
        }
    }

    /// Fold one reported outcome into the record and run the state machine.
    ///
    /// Returns true if the healthy flag flipped.
    pub fn observe(
        &mut self,
        success: bool,
        latency_ms: Option<f64>,
        now: Instant,
        decay: f64,
        config: &EndpointConfig,
    ) -> bool {
        let sample = if success { 1.0 } else { 0.0 };
        if self.observations == 0 {
            // Seed directly: folding the first outcome into the optimistic
            // initial value would overweight an endpoint nothing is known about.
            self.success_ewma = sample;
        } else {
            self.success_ewma = decay * sample + (1.0 - decay) * self.success_ewma;
        }
        self.observations += 1;

        if let Some(latency) = latency_ms {
            if self.latency_samples == 0 {
                self.latency_ewma_ms = latency;
            } else {
                self.latency_ewma_ms = decay * latency + (1.0 - decay) * self.latency_ewma_ms;
            }
            self.latency_samples += 1;
        }

        let was_healthy = self.healthy;
        if success {
            if self.success_ewma >= config.recovery_threshold {
                self.healthy = true;
            }
            if let Some(until) = self.cooldown_until {
                if now >= until {
                    self.cooldown_until = None;
                }
            }
        } else {
            self.last_failure_at = Some(now);
            if config.cooldown_secs > 0.0 {
                self.cooldown_until = Some(now + Duration::from_secs_f64(config.cooldown_secs));
            }
            if self.success_ewma <= config.failure_threshold {
                self.healthy = false;
            }
        }

        self.healthy != was_healthy
    }
}
