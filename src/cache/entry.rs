//! Cache Entry Module
//!
//! Defines individual cache entries and the TTL arithmetic that decides when
//! they go stale.

use std::time::{Duration, Instant};

use crate::error::{CacheError, Result};

// == Cache Entry ==
/// A stored value together with its optional expiry instant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry<V> {
    /// The stored value
    pub value: V,
    /// Instant at which the entry becomes stale, None = no expiration
    pub expires_at: Option<Instant>,
}

impl<V> CacheEntry<V> {
    // == Constructor ==
    /// Creates an entry that expires `ttl` after `now`.
    ///
    /// A `ttl` of `None` produces an entry that never expires.
    pub fn new(value: V, now: Instant, ttl: Option<Duration>) -> Result<Self> {
        Ok(Self {
            value,
            expires_at: expiry_instant(now, ttl)?,
        })
    }

    // == Is Expired ==
    /// Checks if the entry has expired as of `now`.
    ///
    /// Boundary condition: an entry is expired once `now >= expires_at`, so
    /// an entry observed at exactly its deadline is already gone.
    pub fn is_expired(&self, now: Instant) -> bool {
        match self.expires_at {
            Some(expires) => now >= expires,
            None => false,
        }
    }

    // == Time To Live ==
    /// Returns the time left before expiry, or None if no expiration is set.
    ///
    /// Returns `Some(Duration::ZERO)` once the entry has expired.
    pub fn ttl_remaining(&self, now: Instant) -> Option<Duration> {
        self.expires_at
            .map(|expires| expires.saturating_duration_since(now))
    }
}

// == TTL Helpers ==
/// Validates a caller-supplied signed TTL.
///
/// Zero means "never expires" and yields `None`. Negative values are rejected.
pub fn validate_ttl(ttl: chrono::Duration) -> Result<Option<Duration>> {
    if ttl < chrono::Duration::zero() {
        return Err(CacheError::InvalidTtl(format!(
            "{}ms is negative",
            ttl.num_milliseconds()
        )));
    }
    if ttl.is_zero() {
        return Ok(None);
    }
    ttl.to_std()
        .map(Some)
        .map_err(|e| CacheError::InvalidTtl(e.to_string()))
}

/// Computes the absolute expiry instant for `ttl` measured from `now`.
pub fn expiry_instant(now: Instant, ttl: Option<Duration>) -> Result<Option<Instant>> {
    match ttl {
        None => Ok(None),
        Some(ttl) if ttl.is_zero() => Ok(None),
        Some(ttl) => now.checked_add(ttl).map(Some).ok_or_else(|| {
            CacheError::InvalidTtl(format!("{:?} overflows the clock", ttl))
        }),
    }
}
