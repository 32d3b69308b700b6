//! Configuration Module
//!
//! Construction options for [`crate::Cache`], plus a plain-data
//! [`CacheConfig`] that can be loaded from environment variables or embedded
//! in a host's serde-based configuration.

use std::env;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::clock::{Clock, FnClock};
use crate::error::{CacheError, Result};

/// Default maximum number of entries
pub const DEFAULT_CAPACITY: usize = 1000;

/// Default sweep interval in milliseconds
pub const DEFAULT_CLEANUP_INTERVAL_MS: u64 = 1000;

// == Cache Options ==
/// Composable options applied when constructing a cache.
///
/// ```ignore
/// let cache: Cache<String, u64> = Cache::new(
///     512,
///     CacheOptions::new()
///         .default_ttl(chrono::Duration::seconds(30))
///         .cleanup_interval(Duration::from_secs(5)),
/// )?;
/// ```
#[derive(Clone, Default)]
pub struct CacheOptions {
    pub(crate) default_ttl: Option<chrono::Duration>,
    pub(crate) cleanup_interval: Option<Duration>,
    pub(crate) clock: Option<Arc<dyn Clock>>,
}

impl CacheOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// TTL used by `set` when no explicit TTL is given. Zero never expires;
    /// negative values fail construction.
    pub fn default_ttl(mut self, ttl: chrono::Duration) -> Self {
        self.default_ttl = Some(ttl);
        self
    }

    /// How often the background sweeper runs. Zero disables it.
    pub fn cleanup_interval(mut self, interval: Duration) -> Self {
        self.cleanup_interval = Some(interval);
        self
    }

    /// Time source used for every expiry decision.
    pub fn clock(mut self, clock: impl Clock) -> Self {
        self.clock = Some(Arc::new(clock));
        self
    }

    /// Same as [`CacheOptions::clock`] for a plain closure.
    pub fn clock_fn<F>(self, now: F) -> Self
    where
        F: Fn() -> Instant + Send + Sync + 'static,
    {
        self.clock(FnClock::new(now))
    }
}

impl fmt::Debug for CacheOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheOptions")
            .field("default_ttl", &self.default_ttl)
            .field("cleanup_interval", &self.cleanup_interval)
            .field("custom_clock", &self.clock.is_some())
            .finish()
    }
}

// == Cache Config ==
/// Cache configuration parameters.
///
/// All values can be configured via environment variables with sensible
/// defaults. Missing fields fall back to the defaults when deserializing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Maximum number of entries the cache can hold
    pub capacity: usize,
    /// Default TTL in milliseconds for entries without explicit TTL, 0 = never
    pub default_ttl_ms: i64,
    /// Background sweep interval in milliseconds, 0 = no sweeper
    pub cleanup_interval_ms: u64,
}

impl CacheConfig {
    /// Creates a new CacheConfig by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_CAPACITY` - Maximum cache entries (default: 1000)
    /// - `CACHE_DEFAULT_TTL_MS` - Default TTL in milliseconds (default: 0, never expire)
    /// - `CACHE_CLEANUP_INTERVAL_MS` - Sweep interval in milliseconds (default: 1000)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            capacity: env::var("CACHE_CAPACITY")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.capacity),
            default_ttl_ms: env::var("CACHE_DEFAULT_TTL_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.default_ttl_ms),
            cleanup_interval_ms: env::var("CACHE_CLEANUP_INTERVAL_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.cleanup_interval_ms),
        }
    }

    /// Checks the values a cache would reject at construction.
    pub fn validate(&self) -> Result<()> {
        if self.capacity == 0 {
            return Err(CacheError::InvalidCapacity(self.capacity));
        }
        if self.default_ttl_ms < 0 {
            return Err(CacheError::InvalidTtl(format!(
                "default TTL {}ms is negative",
                self.default_ttl_ms
            )));
        }
        Ok(())
    }

    /// Maps the config onto construction options using the system clock.
    ///
    /// Validates first, so a config that fails [`CacheConfig::validate`]
    /// never produces options.
    pub fn to_options(&self) -> Result<CacheOptions> {
        self.validate()?;
        let default_ttl =
            chrono::Duration::try_milliseconds(self.default_ttl_ms).ok_or_else(|| {
                CacheError::InvalidTtl(format!(
                    "default TTL {}ms is out of range",
                    self.default_ttl_ms
                ))
            })?;

        Ok(CacheOptions::new()
            .default_ttl(default_ttl)
            .cleanup_interval(Duration::from_millis(self.cleanup_interval_ms)))
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            default_ttl_ms: 0,
            cleanup_interval_ms: DEFAULT_CLEANUP_INTERVAL_MS,
        }
    }
}
