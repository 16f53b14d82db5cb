//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Normalize endpoint definitions (trim, clamp, threshold ordering)
//! - Validate value ranges (weights > 0, cooldowns >= 0)
//!
//! # Design Decisions
//! - File validation returns all errors, not just the first
//! - Normalization is a pure function: EndpointConfig → Result
//! - Documented fixups only: thresholds clamped to [0, 1], recovery raised
//!   to the failure threshold; anything else is rejected

use std::collections::HashSet;
use thiserror::Error;

use crate::config::schema::{EndpointConfig, PoolConfig, PoolSettings};

/// A semantic problem in pool or endpoint configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// Endpoint identifier is empty after trimming.
    #[error("endpoint identifier is empty")]
    EmptyIdentifier,

    /// Endpoint address is empty after trimming.
    #[error("endpoint {0}: address is empty")]
    EmptyAddress(String),

    /// Weight must be a positive finite number.
    #[error("endpoint {id}: weight {weight} must be positive")]
    NonPositiveWeight { id: String, weight: f64 },

    /// A bounded session cap of zero would make the endpoint unusable.
    #[error("endpoint {0}: max_sessions must be positive when bounded")]
    ZeroSessionCap(String),

    /// Cooldown must be a non-negative finite number of seconds.
    #[error("endpoint {id}: cooldown {secs}s must be non-negative")]
    NegativeCooldown { id: String, secs: f64 },

    /// Two endpoint definitions share an identifier.
    #[error("duplicate endpoint identifier {0}")]
    DuplicateIdentifier(String),

    /// EWMA decay must lie in (0, 1].
    #[error("ewma_decay {0} must be in (0, 1]")]
    InvalidDecay(f64),

    /// Default latency must be a positive finite number of milliseconds.
    #[error("default_latency_ms {0} must be positive")]
    NonPositiveDefaultLatency(f64),
}

/// Check pool-wide settings.
pub fn validate_settings(settings: &PoolSettings) -> Result<(), ValidationError> {
    if !(settings.ewma_decay > 0.0 && settings.ewma_decay <= 1.0) {
        return Err(ValidationError::InvalidDecay(settings.ewma_decay));
    }
    if !(settings.default_latency_ms > 0.0 && settings.default_latency_ms.is_finite()) {
        return Err(ValidationError::NonPositiveDefaultLatency(
            settings.default_latency_ms,
        ));
    }
    Ok(())
}

/// Normalize and validate one endpoint definition.
///
/// Trims the identifier and address, clamps both thresholds into [0, 1] and
/// raises the recovery threshold to the failure threshold when given below
/// it. Everything else out of range is an error, never corrected.
pub fn normalize_endpoint(mut config: EndpointConfig) -> Result<EndpointConfig, ValidationError> {
    config.id = config.id.trim().to_string();
    config.address = config.address.trim().to_string();

    if config.id.is_empty() {
        return Err(ValidationError::EmptyIdentifier);
    }
    if config.address.is_empty() {
        return Err(ValidationError::EmptyAddress(config.id));
    }
    if !(config.weight > 0.0 && config.weight.is_finite()) {
        return Err(ValidationError::NonPositiveWeight {
            id: config.id,
            weight: config.weight,
        });
    }
    if config.max_sessions == Some(0) {
        return Err(ValidationError::ZeroSessionCap(config.id));
    }
    if !(config.cooldown_secs >= 0.0 && config.cooldown_secs.is_finite()) {
        return Err(ValidationError::NegativeCooldown {
            id: config.id,
            secs: config.cooldown_secs,
        });
    }

    config.failure_threshold = clamp01(config.failure_threshold);
    config.recovery_threshold = clamp01(config.recovery_threshold).max(config.failure_threshold);

    Ok(config)
}

/// Validate a full pool configuration, collecting every error.
pub fn validate_config(config: &PoolConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if let Err(err) = validate_settings(&config.settings) {
        errors.push(err);
    }

    let mut seen = HashSet::new();
    for endpoint in &config.endpoints {
        match normalize_endpoint(endpoint.clone()) {
            Ok(normalized) => {
                if !seen.insert(normalized.id.clone()) {
                    errors.push(ValidationError::DuplicateIdentifier(normalized.id));
                }
            }
            Err(err) => errors.push(err),
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn clamp01(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}
