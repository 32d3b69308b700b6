//! Error types for the cache
//!
//! Provides unified error handling using thiserror. A cache miss is never an
//! error; lookups report absence through `Option`.

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for cache construction and writes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// Capacity must be a positive number of entries
    #[error("Invalid capacity: {0} (must be greater than zero)")]
    InvalidCapacity(usize),

    /// TTL was negative or too large to represent as an expiry instant
    #[error("Invalid TTL: {0}")]
    InvalidTtl(String),

    /// Cleanup interval was zero or too large to schedule
    #[error("Invalid cleanup interval: {0}")]
    InvalidInterval(String),

    /// A background sweeper was requested outside of a tokio runtime
    #[error("Cleanup interval requires a running tokio runtime")]
    RuntimeUnavailable,
}

// == Result Type Alias ==
/// Convenience Result type for cache operations.
pub type Result<T> = std::result::Result<T, CacheError>;
