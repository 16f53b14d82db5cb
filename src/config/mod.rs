//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks + normalization)
//!     → PoolConfig (validated)
//!     → EndpointPool::from_config
//! ```
//!
//! # Design Decisions
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks
//! - Normalization fixups are limited to trimming, threshold clamping
//!   and threshold ordering; everything else is an error

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{EndpointConfig, PoolConfig, PoolSettings};
pub use validation::ValidationError;
