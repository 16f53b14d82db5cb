//! Adaptive endpoint pool.
//!
//! Tracks a set of interchangeable backend endpoints, scores their health
//! from observed outcomes, hands out the best endpoint for each request, and
//! bounds concurrent usage per endpoint with time-limited leases.
//!
//! The pool performs no network I/O of its own: callers acquire a lease,
//! perform the call with their own client, and report the outcome back.
//!
//! ```
//! use endpoint_pool::{AcquireOptions, EndpointConfig, EndpointPool, PoolSettings};
//!
//! let pool = EndpointPool::new(PoolSettings::default()).unwrap();
//! pool.register_endpoint(EndpointConfig::new("proxy-1", "10.0.0.5:3128")).unwrap();
//!
//! let lease = pool.acquire(AcquireOptions::default()).unwrap();
//! // ... perform the call against lease.address ...
//! pool.record_result(&lease.endpoint_id, true, Some(42.0), Some(&lease.session_id)).unwrap();
//! ```

pub mod config;
pub mod health;
pub mod observability;
pub mod pool;

pub use config::{EndpointConfig, PoolConfig, PoolSettings};
pub use pool::{
    AcquireOptions, Clock, EndpointPool, EndpointSnapshot, Lease, PoolError, PoolResult,
    SystemClock,
};
