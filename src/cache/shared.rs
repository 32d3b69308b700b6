//! Shared Cache Module
//!
//! Thread-safe cache handle: one mutex around the [`CacheStore`] plus the
//! optional background cleanup task.

use std::borrow::Borrow;
use std::fmt;
use std::hash::Hash;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tracing::info;

use crate::cache::{validate_ttl, CacheStore};
use crate::clock::{Clock, SystemClock};
use crate::config::{CacheConfig, CacheOptions};
use crate::error::Result;
use crate::tasks::{spawn_cleanup_task, CleanupHandle};

// == Cache ==
/// Bounded LRU cache with per-entry TTL, safe to share across threads and
/// tasks.
///
/// Every operation, `get` and `peek` included, takes the same lock, since a
/// hit reorders recency and a stale hit removes the entry. Clones are cheap
/// and share both the entries and the cleanup task.
pub struct Cache<K, V> {
    inner: Arc<Inner<K, V>>,
}

struct Inner<K, V> {
    store: Arc<Mutex<CacheStore<K, V>>>,
    cleanup: Option<CleanupHandle>,
}

impl<K, V> Cache<K, V>
where
    K: Hash + Eq + Clone + Send + 'static,
    V: Clone + Send + 'static,
{
    // == Constructor ==
    /// Creates a cache holding at most `capacity` entries.
    ///
    /// A non-zero cleanup interval spawns the background sweeper on the
    /// current tokio runtime.
    ///
    /// # Errors
    /// - `InvalidCapacity` if `capacity` is zero
    /// - `InvalidTtl` if the default TTL is negative
    /// - `InvalidInterval` if the cleanup interval is too large to schedule
    /// - `RuntimeUnavailable` if a sweeper is requested outside a runtime
    pub fn new(capacity: usize, options: CacheOptions) -> Result<Self> {
        let default_ttl = options
            .default_ttl
            .map(validate_ttl)
            .transpose()?
            .flatten();
        let clock = options
            .clock
            .unwrap_or_else(|| Arc::new(SystemClock) as Arc<dyn Clock>);

        let store = Arc::new(Mutex::new(CacheStore::new(capacity, default_ttl, clock)?));

        let cleanup_interval = options.cleanup_interval.filter(|i| !i.is_zero());
        let cleanup = cleanup_interval
            .map(|interval| spawn_cleanup_task(Arc::downgrade(&store), interval))
            .transpose()?;

        info!(
            capacity,
            default_ttl_ms = default_ttl.map(|ttl| ttl.as_millis() as u64),
            cleanup_interval_ms = cleanup_interval.map(|i| i.as_millis() as u64),
            "cache initialized"
        );

        Ok(Self {
            inner: Arc::new(Inner { store, cleanup }),
        })
    }

    /// Creates a cache from a [`CacheConfig`].
    pub fn from_config(config: &CacheConfig) -> Result<Self> {
        Self::new(config.capacity, config.to_options()?)
    }

    // == Set ==
    /// Stores a value using the default TTL, replacing and promoting any
    /// existing entry for the key.
    pub fn set(&self, key: K, value: V) -> Result<()> {
        self.store().set(key, value)
    }

    /// Stores a value with an explicit TTL. Zero never expires; negative
    /// fails with `InvalidTtl` and leaves the cache unchanged.
    pub fn set_with_ttl(&self, key: K, value: V, ttl: chrono::Duration) -> Result<()> {
        self.store().set_with_ttl(key, value, ttl)
    }

    // == Get ==
    /// Returns a live value and marks it most recently used.
    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.store().get(key).cloned()
    }

    // == Peek ==
    /// Returns a live value without changing eviction order.
    pub fn peek<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.store().peek(key).cloned()
    }

    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.store().contains(key)
    }

    /// Time left before the key expires; None if absent or without expiry.
    pub fn ttl_remaining<Q>(&self, key: &Q) -> Option<Duration>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.store().ttl_remaining(key)
    }

    // == Delete ==
    pub fn delete<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.store().delete(key)
    }

    // == Length ==
    /// Number of live entries. Expired entries are purged on the way.
    pub fn len(&self) -> usize {
        self.store().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of stored entries including expired ones awaiting removal.
    pub fn resident_len(&self) -> usize {
        self.store().resident_len()
    }

    /// Removes every expired entry now and returns how many were dropped.
    pub fn purge_expired(&self) -> usize {
        self.store().purge_expired()
    }

    // == Clear ==
    pub fn clear(&self) {
        self.store().clear();
    }

    pub fn capacity(&self) -> usize {
        self.store().capacity()
    }

    /// True while a cleanup task is configured and has not been stopped.
    pub fn is_sweeping(&self) -> bool {
        self.inner
            .cleanup
            .as_ref()
            .is_some_and(|cleanup| !cleanup.is_stopped())
    }

    // == Close ==
    /// Stops the cleanup task and waits for it to exit.
    ///
    /// Idempotent. The cache stays usable for synchronous operations; only
    /// background sweeping ends.
    pub async fn close(&self) {
        if let Some(cleanup) = &self.inner.cleanup {
            cleanup.shutdown().await;
            info!("cache cleanup task shut down");
        }
    }

    fn store(&self) -> MutexGuard<'_, CacheStore<K, V>> {
        // Store invariants hold between operations, so a poisoned lock is
        // still consistent.
        self.inner
            .store
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl<K, V> Clone for Cache<K, V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<K, V> fmt::Debug for Cache<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cache")
            .field("sweeper", &self.inner.cleanup.is_some())
            .finish_non_exhaustive()
    }
}
