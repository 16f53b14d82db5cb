//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Pool operations produce:
//!     → tracing events at the call sites (structured fields)
//!     → metrics.rs (counters, gauges)
//!
//! Consumers:
//!     → whatever subscriber/exporter the embedding process installs
//! ```
//!
//! # Design Decisions
//! - Facade only: the pool never installs a subscriber or exporter
//! - Metrics are cheap (atomic increments behind the `metrics` crate)

pub mod metrics;
