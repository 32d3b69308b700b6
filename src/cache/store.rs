//! Cache Store Module
//!
//! Main cache engine combining HashMap lookup with recency ordering and TTL
//! expiration. `CacheStore` is single-threaded; [`crate::Cache`] wraps it in
//! the lock shared with the background sweeper.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, trace};

use crate::cache::entry::validate_ttl;
use crate::cache::lru::{RecencyList, Slot};
use crate::cache::CacheEntry;
use crate::clock::Clock;
use crate::error::{CacheError, Result};

// == Cache Store ==
/// Bounded key-value storage with LRU eviction and TTL support.
///
/// `index` and `order` always hold the same key set; every method restores
/// that before returning.
pub struct CacheStore<K, V> {
    /// Key lookup into the recency list
    index: HashMap<K, Slot>,
    /// Entries ordered from most to least recently used
    order: RecencyList<K, CacheEntry<V>>,
    /// Maximum number of entries allowed
    capacity: usize,
    /// TTL applied by `set` when no explicit TTL is given
    default_ttl: Option<Duration>,
    clock: Arc<dyn Clock>,
}

impl<K, V> CacheStore<K, V>
where
    K: Hash + Eq + Clone,
{
    // == Constructor ==
    /// Creates a new CacheStore with the given capacity, default TTL and clock.
    ///
    /// # Arguments
    /// * `capacity` - Maximum number of entries, must be greater than zero
    /// * `default_ttl` - TTL used by [`CacheStore::set`]; None or zero never expires
    /// * `clock` - Time source for all expiry decisions
    pub fn new(
        capacity: usize,
        default_ttl: Option<Duration>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        if capacity == 0 {
            return Err(CacheError::InvalidCapacity(capacity));
        }

        Ok(Self {
            index: HashMap::with_capacity(capacity),
            order: RecencyList::with_capacity(capacity),
            capacity,
            default_ttl: default_ttl.filter(|ttl| !ttl.is_zero()),
            clock,
        })
    }

    // == Set ==
    /// Stores a key-value pair using the default TTL.
    ///
    /// If the key already exists, the value is overwritten, the TTL restarts
    /// and the entry becomes most recently used. If inserting a new key pushes
    /// the store over capacity, the least recently used entry is evicted.
    pub fn set(&mut self, key: K, value: V) -> Result<()> {
        self.insert(key, value, self.default_ttl)
    }

    // == Set With TTL ==
    /// Stores a key-value pair with an explicit TTL, overriding the default.
    ///
    /// A zero TTL never expires. A negative TTL is rejected and the store is
    /// left untouched.
    pub fn set_with_ttl(&mut self, key: K, value: V, ttl: chrono::Duration) -> Result<()> {
        let ttl = validate_ttl(ttl)?;
        self.insert(key, value, ttl)
    }

    fn insert(&mut self, key: K, value: V, ttl: Option<Duration>) -> Result<()> {
        // Resolve the expiry first so a failure leaves prior state intact
        let entry = CacheEntry::new(value, self.clock.now(), ttl)?;

        if let Some(&slot) = self.index.get(&key) {
            if let Some(existing) = self.order.get_mut(slot) {
                *existing = entry;
            }
            self.order.move_to_front(slot);
            return Ok(());
        }

        let slot = self.order.push_front(key.clone(), entry);
        self.index.insert(key, slot);
        self.enforce_capacity();

        debug_assert_eq!(self.index.len(), self.order.len());
        Ok(())
    }

    // == Get ==
    /// Retrieves a value by key and marks it most recently used.
    ///
    /// Expired entries are removed and reported as absent.
    pub fn get<Q>(&mut self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let slot = self.live_slot(key)?;
        self.order.move_to_front(slot);
        self.order.get(slot).map(|entry| &entry.value)
    }

    // == Peek ==
    /// Retrieves a value by key without touching recency order.
    pub fn peek<Q>(&mut self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let slot = self.live_slot(key)?;
        self.order.get(slot).map(|entry| &entry.value)
    }

    // == Contains ==
    /// Returns true if the key holds a live entry. Does not touch recency.
    pub fn contains<Q>(&mut self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.live_slot(key).is_some()
    }

    // == TTL Remaining ==
    /// Returns how long a live entry has left, or None if it is absent or
    /// never expires.
    pub fn ttl_remaining<Q>(&mut self, key: &Q) -> Option<Duration>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let slot = self.live_slot(key)?;
        let now = self.clock.now();
        self.order
            .get(slot)
            .and_then(|entry| entry.ttl_remaining(now))
    }

    // == Delete ==
    /// Removes an entry by key, returning whether anything was removed.
    pub fn delete<Q>(&mut self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        match self.index.remove(key) {
            Some(slot) => {
                self.order.remove(slot);
                true
            }
            None => false,
        }
    }

    // == Cleanup Expired ==
    /// Removes all expired entries, walking from least to most recently used.
    ///
    /// The walk never stops early: entries with different TTLs interleave,
    /// so a live entry near the back says nothing about the ones before it.
    ///
    /// Returns the number of entries removed.
    pub fn purge_expired(&mut self) -> usize {
        let now = self.clock.now();
        let mut removed = 0;
        let mut cursor = self.order.back();

        while let Some(slot) = cursor {
            cursor = self.order.prev(slot);
            let expired = self
                .order
                .get(slot)
                .is_some_and(|entry| entry.is_expired(now));
            if expired {
                self.remove_slot(slot);
                removed += 1;
            }
        }

        if removed > 0 {
            trace!(removed, remaining = self.order.len(), "purged expired entries");
        }
        removed
    }

    // == Length ==
    /// Returns the number of live entries, purging expired ones first.
    pub fn len(&mut self) -> usize {
        self.purge_expired();
        self.order.len()
    }

    // == Is Empty ==
    /// Returns true if no live entries remain.
    pub fn is_empty(&mut self) -> bool {
        self.len() == 0
    }

    /// Returns the number of stored entries, including expired entries that
    /// have not been purged yet.
    pub fn resident_len(&self) -> usize {
        self.order.len()
    }

    // == Clear ==
    /// Drops every entry.
    pub fn clear(&mut self) {
        self.index.clear();
        self.order.clear();
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Resident keys from most to least recently used.
    pub fn keys_by_recency(&self) -> impl Iterator<Item = &K> {
        self.order.keys()
    }

    /// Looks up a slot, lazily dropping the entry if it has expired.
    fn live_slot<Q>(&mut self, key: &Q) -> Option<Slot>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let slot = *self.index.get(key)?;
        let now = self.clock.now();
        let expired = self
            .order
            .get(slot)
            .map_or(true, |entry| entry.is_expired(now));

        if expired {
            self.remove_slot(slot);
            return None;
        }
        Some(slot)
    }

    fn remove_slot(&mut self, slot: Slot) -> Option<(K, CacheEntry<V>)> {
        let (key, entry) = self.order.remove(slot)?;
        self.index.remove(&key);
        Some((key, entry))
    }

    /// Evicts from the back until the store fits its capacity.
    fn enforce_capacity(&mut self) {
        while self.order.len() > self.capacity {
            match self.order.pop_back() {
                Some((key, _)) => {
                    self.index.remove(&key);
                    debug!(capacity = self.capacity, "evicted least recently used entry");
                }
                None => break,
            }
        }
    }
}

impl<K, V> fmt::Debug for CacheStore<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheStore")
            .field("capacity", &self.capacity)
            .field("resident", &self.order.len())
            .field("default_ttl", &self.default_ttl)
            .finish()
    }
}
