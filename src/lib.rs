//! TTL LRU Cache - A bounded in-memory cache
//!
//! Provides least-recently-used eviction with optional per-entry TTL
//! expiration, enforced lazily on access and eagerly by a background sweeper.

pub mod cache;
pub mod clock;
pub mod config;
pub mod error;
pub mod tasks;

pub use cache::{Cache, CacheStore};
pub use clock::{Clock, FnClock, ManualClock, SystemClock};
pub use config::{CacheConfig, CacheOptions};
pub use error::{CacheError, Result};
