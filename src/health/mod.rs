//! Health tracking subsystem.
//!
//! # Data Flow
//! ```text
//! Caller reports an outcome (record_result):
//!     → state.rs folds it into the success/latency EWMAs
//!     → threshold check drives the state machine
//!
//! State machine (state.rs):
//!     Healthy ←→ Unhealthy
//!     With separate failure/recovery thresholds to prevent flapping
//! ```
//!
//! # Design Decisions
//! - Health is passive: derived from observed outcomes, no probing
//! - State transitions require crossing distinct thresholds (dead band)
//! - Health state is per-endpoint, not per-pool

pub mod state;

pub use state::HealthState;
