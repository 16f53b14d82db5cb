//! Shared helpers for pool integration tests.

use endpoint_pool::{Clock, EndpointConfig, PoolSettings};
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Deterministic clock advanced manually by tests.
pub struct ManualClock {
    now: Mutex<Instant>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            now: Mutex::new(Instant::now()),
        }
    }

    pub fn advance(&self, delta: Duration) {
        let mut now = self.now.lock().expect("clock mutex poisoned");
        *now += delta;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        *self.now.lock().expect("clock mutex poisoned")
    }
}

/// Pool settings with an explicit EWMA decay.
#[allow(dead_code)]
pub fn settings_with_decay(decay: f64) -> PoolSettings {
    PoolSettings {
        ewma_decay: decay,
        ..PoolSettings::default()
    }
}

/// Endpoint definition with default tuning and an explicit weight.
#[allow(dead_code)]
pub fn endpoint(id: &str, weight: f64) -> EndpointConfig {
    EndpointConfig {
        weight,
        ..EndpointConfig::new(id, format!("{id}.backend.internal:3128"))
    }
}

/// Opt-in log output for debugging test failures (RUST_LOG=debug).
#[allow(dead_code)]
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "endpoint_pool=info".into()),
        )
        .try_init();
}
