//! TTL Cleanup Task
//!
//! Background task that periodically removes expired cache entries.

use std::hash::Hash;
use std::sync::{Mutex, PoisonError, Weak};
use std::time::Duration;

use tokio::sync::{watch, Mutex as AsyncMutex};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, trace, warn};

use crate::cache::CacheStore;
use crate::error::{CacheError, Result};

// == Cleanup Handle ==
/// Owns the background cleanup task and its stop signal.
///
/// Dropping the handle closes the stop channel, which also ends the task.
#[derive(Debug)]
pub struct CleanupHandle {
    stop_tx: watch::Sender<bool>,
    task: AsyncMutex<Option<JoinHandle<()>>>,
}

impl CleanupHandle {
    /// Signals the task to stop without waiting for it.
    ///
    /// A sweep already in progress completes; no new sweep starts.
    pub fn stop(&self) {
        self.stop_tx.send_replace(true);
    }

    /// Returns true once a stop has been requested.
    pub fn is_stopped(&self) -> bool {
        *self.stop_tx.borrow()
    }

    /// Stops the task and waits until it has exited.
    ///
    /// Safe to call any number of times, concurrently or not; every caller
    /// returns only after the task is gone.
    pub async fn shutdown(&self) {
        self.stop();

        // Held across the await so concurrent callers queue behind the join
        let mut task = self.task.lock().await;
        if let Some(handle) = task.take() {
            if let Err(e) = handle.await {
                warn!("TTL cleanup task ended abnormally: {}", e);
            }
        }
    }
}

/// Spawns a background task that periodically cleans up expired cache entries.
///
/// The first sweep runs one `interval` after spawning. Each sweep takes the
/// store lock and purges every expired entry. The task holds only a weak
/// reference, so it also exits once the store itself is dropped.
///
/// # Arguments
/// * `store` - Weak reference to the locked cache store
/// * `interval` - Time between sweeps, must be non-zero
///
/// # Errors
/// - `CacheError::InvalidInterval` if `interval` is zero or the first
///   deadline does not fit in an `Instant`
/// - `CacheError::RuntimeUnavailable` if called outside a tokio runtime
pub fn spawn_cleanup_task<K, V>(
    store: Weak<Mutex<CacheStore<K, V>>>,
    interval: Duration,
) -> Result<CleanupHandle>
where
    K: Hash + Eq + Clone + Send + 'static,
    V: Send + 'static,
{
    if interval.is_zero() {
        return Err(CacheError::InvalidInterval(
            "interval must be greater than zero".to_string(),
        ));
    }
    let start = Instant::now().checked_add(interval).ok_or_else(|| {
        CacheError::InvalidInterval(format!("{}ms is too large", interval.as_millis()))
    })?;

    let runtime =
        tokio::runtime::Handle::try_current().map_err(|_| CacheError::RuntimeUnavailable)?;
    let (stop_tx, stop_rx) = watch::channel(false);

    let handle = runtime.spawn(run_cleanup(store, start, interval, stop_rx));

    Ok(CleanupHandle {
        stop_tx,
        task: AsyncMutex::new(Some(handle)),
    })
}

async fn run_cleanup<K, V>(
    store: Weak<Mutex<CacheStore<K, V>>>,
    start: Instant,
    period: Duration,
    mut stop_rx: watch::Receiver<bool>,
) where
    K: Hash + Eq + Clone,
{
    info!(
        "Starting TTL cleanup task with interval of {}ms",
        period.as_millis()
    );

    let mut ticker = interval_at(start, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            biased;

            changed = stop_rx.changed() => {
                // Err means every handle is gone
                if changed.is_err() || *stop_rx.borrow() {
                    break;
                }
            }
            _ = ticker.tick() => {
                let Some(store) = store.upgrade() else {
                    break;
                };
                let removed = store
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .purge_expired();

                if removed > 0 {
                    debug!("TTL cleanup: removed {} expired entries", removed);
                } else {
                    trace!("TTL cleanup: no expired entries found");
                }
            }
        }
    }

    debug!("TTL cleanup task stopped");
}
