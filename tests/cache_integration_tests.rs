//! Integration Tests for the Cache
//!
//! Exercises the public API end to end, including real-time expiry and the
//! background sweeper.

mod common;

use std::sync::Arc;
use std::thread::sleep;
use std::time::Duration;

use tokio_test::{assert_err, assert_ok};
use ttl_lru_cache::{Cache, CacheConfig, CacheError, CacheOptions, ManualClock};

fn ms(n: i64) -> chrono::Duration {
    chrono::Duration::milliseconds(n)
}

// == Eviction ==

#[test]
fn test_lru_eviction_after_get() -> anyhow::Result<()> {
    common::init_tracing();
    let cache: Cache<&str, i32> = Cache::new(2, CacheOptions::new())?;

    cache.set("a", 1)?;
    cache.set("b", 2)?;
    assert_eq!(cache.get("a"), Some(1));
    cache.set("c", 3)?;

    assert_eq!(cache.get("b"), None);
    assert_eq!(cache.get("a"), Some(1));
    assert_eq!(cache.get("c"), Some(3));
    Ok(())
}

#[test]
fn test_capacity_one_keeps_latest() -> anyhow::Result<()> {
    let cache: Cache<String, String> = Cache::new(1, CacheOptions::new())?;

    cache.set("first".to_string(), "1".to_string())?;
    cache.set("second".to_string(), "2".to_string())?;
    assert_eq!(cache.len(), 1);
    assert_eq!(cache.get("second").as_deref(), Some("2"));

    // touching the only key and inserting another still keeps just the newest
    assert_eq!(cache.get("second").as_deref(), Some("2"));
    cache.set("third".to_string(), "3".to_string())?;
    assert_eq!(cache.get("second"), None);
    assert_eq!(cache.get("third").as_deref(), Some("3"));
    Ok(())
}

#[test]
fn test_peek_does_not_change_eviction_order() -> anyhow::Result<()> {
    let cache: Cache<&str, i32> = Cache::new(3, CacheOptions::new())?;

    cache.set("a", 1)?;
    cache.set("b", 2)?;
    cache.set("c", 3)?;
    for _ in 0..3 {
        assert_eq!(cache.peek("a"), Some(1));
    }
    cache.set("d", 4)?;

    assert!(!cache.contains("a"));
    assert!(cache.contains("b"));
    Ok(())
}

#[test]
fn test_overwrite_keeps_count_and_promotes() -> anyhow::Result<()> {
    let cache: Cache<&str, i32> = Cache::new(2, CacheOptions::new())?;

    cache.set("a", 1)?;
    cache.set("b", 2)?;
    cache.set("a", 10)?;
    assert_eq!(cache.len(), 2);

    cache.set("c", 3)?;
    assert_eq!(cache.peek("a"), Some(10));
    assert_eq!(cache.peek("b"), None);
    Ok(())
}

// == Expiration ==

#[test]
fn test_entry_expires_after_ttl() -> anyhow::Result<()> {
    let cache: Cache<&str, i32> = Cache::new(4, CacheOptions::new())?;

    cache.set_with_ttl("x", 9, ms(10))?;
    sleep(Duration::from_millis(20));

    assert_eq!(cache.get("x"), None);
    assert_eq!(cache.resident_len(), 0);
    Ok(())
}

#[test]
fn test_update_resets_ttl() -> anyhow::Result<()> {
    let cache: Cache<&str, i32> = Cache::new(4, CacheOptions::new())?;

    cache.set_with_ttl("a", 1, ms(10))?;
    sleep(Duration::from_millis(5));
    cache.set_with_ttl("a", 2, ms(20))?;
    sleep(Duration::from_millis(12));

    assert_eq!(cache.get("a"), Some(2));
    Ok(())
}

#[test]
fn test_len_ignores_expired_entries() -> anyhow::Result<()> {
    let clock = ManualClock::new();
    let cache: Cache<&str, i32> = Cache::new(8, CacheOptions::new().clock(clock.clone()))?;

    cache.set_with_ttl("short", 1, ms(10))?;
    cache.set_with_ttl("medium", 2, ms(20))?;
    cache.set("forever", 3)?;
    assert_eq!(cache.len(), 3);

    clock.advance(Duration::from_millis(10));
    assert_eq!(cache.len(), 2);

    clock.advance(Duration::from_millis(10));
    assert_eq!(cache.len(), 1);
    assert_eq!(cache.get("forever"), Some(3));
    Ok(())
}

#[test]
fn test_negative_ttl_rejected() -> anyhow::Result<()> {
    let cache: Cache<&str, i32> = Cache::new(4, CacheOptions::new())?;
    cache.set("k", 1)?;

    let err = assert_err!(cache.set_with_ttl("k", 2, ms(-10)));
    assert!(matches!(err, CacheError::InvalidTtl(_)));
    assert_eq!(cache.get("k"), Some(1), "failed set leaves prior value");
    Ok(())
}

#[test]
fn test_purge_expired_reports_count() -> anyhow::Result<()> {
    let clock = ManualClock::new();
    let cache: Cache<u32, u32> = Cache::new(16, CacheOptions::new().clock(clock.clone()))?;

    for i in 0..10 {
        let ttl = if i % 2 == 0 { ms(5) } else { ms(0) };
        cache.set_with_ttl(i, i, ttl)?;
    }
    clock.advance(Duration::from_millis(5));

    assert_eq!(cache.purge_expired(), 5);
    assert_eq!(cache.purge_expired(), 0);
    assert_eq!(cache.len(), 5);
    Ok(())
}

// == Background Sweeper ==

#[tokio::test]
async fn test_sweeper_purges_without_access() -> anyhow::Result<()> {
    common::init_tracing();
    let cache: Cache<&str, i32> = Cache::new(
        3,
        CacheOptions::new().cleanup_interval(Duration::from_millis(10)),
    )?;

    cache.set_with_ttl("short", 1, ms(20))?;
    cache.set_with_ttl("keep", 2, ms(0))?;

    tokio::time::sleep(Duration::from_millis(60)).await;

    assert_eq!(cache.resident_len(), 1, "sweeper removed the stale entry");
    assert_eq!(cache.len(), 1);
    assert_eq!(cache.get("keep"), Some(2));

    cache.close().await;
    Ok(())
}

#[tokio::test]
async fn test_close_is_idempotent_and_stops_sweeping() -> anyhow::Result<()> {
    let clock = ManualClock::new();
    let cache: Cache<&str, i32> = Cache::new(
        3,
        CacheOptions::new()
            .clock(clock.clone())
            .cleanup_interval(Duration::from_millis(5)),
    )?;

    cache.close().await;
    cache.close().await;
    assert!(!cache.is_sweeping());

    cache.set_with_ttl("stale", 1, ms(1))?;
    clock.advance(Duration::from_millis(1));
    tokio::time::sleep(Duration::from_millis(30)).await;

    assert_eq!(cache.resident_len(), 1, "no sweep runs after close");
    assert_eq!(cache.get("stale"), None, "lazy expiry still applies");
    Ok(())
}

#[tokio::test]
async fn test_concurrent_close_calls() -> anyhow::Result<()> {
    let cache: Cache<String, i32> = Cache::new(
        3,
        CacheOptions::new().cleanup_interval(Duration::from_millis(5)),
    )?;

    let closers: Vec<_> = (0..4)
        .map(|_| {
            let cache = cache.clone();
            tokio::spawn(async move { cache.close().await })
        })
        .collect();
    for closer in closers {
        closer.await?;
    }

    assert!(!cache.is_sweeping());
    Ok(())
}

// == Misc ==

#[test]
fn test_delete_missing_on_empty_cache() -> anyhow::Result<()> {
    let cache: Cache<&str, i32> = Cache::new(2, CacheOptions::new())?;

    assert!(!cache.delete("missing"));
    assert_eq!(cache.len(), 0);
    assert!(cache.is_empty());
    Ok(())
}

#[test]
fn test_delete_then_get() -> anyhow::Result<()> {
    let cache: Cache<&str, i32> = Cache::new(2, CacheOptions::new())?;

    cache.set("k", 1)?;
    assert!(cache.delete("k"));
    assert_eq!(cache.get("k"), None);
    assert!(!cache.delete("k"));
    Ok(())
}

#[test]
fn test_clear_empties_cache() -> anyhow::Result<()> {
    let cache: Cache<u32, u32> = Cache::new(8, CacheOptions::new())?;
    for i in 0..8 {
        cache.set(i, i)?;
    }

    cache.clear();

    assert_eq!(cache.len(), 0);
    assert_eq!(cache.get(&3), None);
    assert_eq!(cache.capacity(), 8);
    Ok(())
}

#[test]
fn test_invalid_construction() {
    let err = assert_err!(Cache::<u32, u32>::new(0, CacheOptions::new()));
    assert_eq!(err, CacheError::InvalidCapacity(0));

    let err = assert_err!(Cache::<u32, u32>::new(
        1,
        CacheOptions::new().default_ttl(ms(-1))
    ));
    assert!(matches!(err, CacheError::InvalidTtl(_)));
}

#[tokio::test]
async fn test_unschedulable_cleanup_interval_fails_construction() {
    let err = assert_err!(Cache::<u32, u32>::new(
        2,
        CacheOptions::new().cleanup_interval(Duration::MAX)
    ));
    assert!(matches!(err, CacheError::InvalidInterval(_)));
}

#[test]
fn test_config_with_extreme_ttl_fails_construction() {
    let config = CacheConfig {
        capacity: 1,
        default_ttl_ms: i64::MIN,
        cleanup_interval_ms: 0,
    };
    let err = assert_err!(Cache::<u32, u32>::from_config(&config));
    assert!(matches!(err, CacheError::InvalidTtl(_)));
}

#[tokio::test]
async fn test_from_json_config() -> anyhow::Result<()> {
    let config: CacheConfig =
        serde_json::from_str(r#"{"capacity": 2, "default_ttl_ms": 50}"#)?;
    assert_eq!(config.cleanup_interval_ms, 1000, "missing field uses default");

    let cache: Cache<String, i32> = assert_ok!(Cache::from_config(&config));
    assert!(cache.is_sweeping());
    assert_eq!(cache.capacity(), 2);

    cache.set("a".to_string(), 1)?;
    assert!(cache.ttl_remaining("a").is_some_and(|left| left <= Duration::from_millis(50)));

    cache.close().await;
    Ok(())
}

#[test]
fn test_concurrent_access_respects_capacity() -> anyhow::Result<()> {
    let cache = Arc::new(Cache::<u64, u64>::new(32, CacheOptions::new())?);

    let workers: Vec<_> = (0..8u64)
        .map(|worker| {
            let cache = Arc::clone(&cache);
            std::thread::spawn(move || {
                for i in 0..500u64 {
                    let key = (worker * 1000 + i) % 97;
                    if i % 3 == 0 {
                        let _ = cache.get(&key);
                    } else if i % 7 == 0 {
                        cache.delete(&key);
                    } else {
                        cache.set(key, key * 2).expect("set without TTL cannot fail");
                    }
                    assert!(cache.resident_len() <= 32);
                }
            })
        })
        .collect();

    for worker in workers {
        worker.join().expect("worker panicked");
    }

    assert!(cache.len() <= 32);
    for key in 0..97u64 {
        if let Some(value) = cache.peek(&key) {
            assert_eq!(value, key * 2);
        }
    }
    Ok(())
}
