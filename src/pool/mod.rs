//! Adaptive endpoint pool subsystem.
//!
//! # Data Flow
//! ```text
//! register_endpoint → config normalized → entry added to the registry
//!
//! acquire:
//!     expire stale sessions and bindings
//!     → sticky.rs (client affinity, relaxed predicate)
//!     → score.rs over available entries (strict pass, then fallback)
//!     → session.rs mints the lease
//!
//! caller performs the network call outside the pool, then:
//! record_result → health state machine → optional release
//! ```
//!
//! # Design Decisions
//! - One pool-wide lock; every operation is a single atomic critical section
//! - Sessions and bindings reference endpoints by id, never by pointer;
//!   removal cascade-deletes by id scan
//! - Expiry is swept lazily at acquire time; no background timer
//! - Score ties break by registration order (stable, deterministic)

pub mod endpoint;
pub mod manager;
pub mod score;
pub mod session;
pub mod sticky;
pub mod types;

pub use manager::EndpointPool;
pub use types::{
    AcquireOptions, Clock, EndpointSnapshot, Lease, PoolError, PoolResult, SystemClock,
};
