//! Cache Module
//!
//! Provides in-memory caching with TTL expiration and LRU eviction.

mod entry;
mod lru;
mod shared;
mod store;


// Re-export public types
pub use entry::{validate_ttl, CacheEntry};
pub use lru::{RecencyList, Slot};
pub use shared::Cache;
pub use store::CacheStore;
