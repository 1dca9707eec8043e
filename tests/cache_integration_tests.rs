//! Integration Tests for the Cache
//!
//! Exercises the public operation set end to end, including the background
//! reaper and concurrent access.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use mini_cache::cache::{entry_size, MAX_TTL, MB};
use mini_cache::{Cache, CacheError, Config, SizeHint};
use tokio_test::{assert_err, assert_ok};

// == Helper Functions ==

fn create_test_cache() -> Cache<String> {
    let cache = Cache::new();
    assert!(cache.set_max_memory("100MB"));
    cache
}

// == Set / Get ==

#[test]
fn test_get_after_set_returns_value() {
    let cache = create_test_cache();

    assert_ok!(cache.set("key1", "123456789".to_string(), Duration::from_secs(2)));

    assert_eq!(cache.get("key1"), Some("123456789".to_string()));
}

#[test]
fn test_get_after_ttl_returns_nothing() {
    let cache = create_test_cache();

    assert_ok!(cache.set("key1", "123456789".to_string(), Duration::from_secs(1)));
    thread::sleep(Duration::from_millis(1100));

    assert_eq!(cache.get("key1"), None);
    assert!(!cache.exists("key1"));
}

#[test]
fn test_exists_repeatedly_on_live_key() {
    let cache = create_test_cache();
    assert_ok!(cache.set("key1", "v".to_string(), Duration::from_secs(2)));

    assert!(cache.exists("key1"));
    assert!(cache.exists("key1"));
    assert!(!cache.exists("key2"));
}

// == Memory Budget ==

#[test]
fn test_set_max_memory_exact_bytes() {
    let cache = create_test_cache();

    assert!(cache.set_max_memory("12KB"));
    assert_eq!(cache.max_memory(), 12 * 1024);

    assert!(!cache.set_max_memory("abc"));
    assert_eq!(cache.max_memory(), 12 * 1024);

    assert!(cache.set_max_memory("1MB"));
    assert_eq!(cache.max_memory(), MB);
}

#[test]
fn test_rejected_set_changes_nothing() {
    let cache = create_test_cache();
    assert!(cache.set_max_memory("1KB"));

    assert_ok!(cache.set("small", "v".to_string(), Duration::from_secs(60)));
    let keys = cache.keys();
    let used = cache.used_memory();

    let err = assert_err!(cache.set("big", "x".repeat(2048), Duration::from_secs(60)));
    assert!(matches!(err, CacheError::CapacityExceeded { ref key, .. } if key == "big"));

    assert_eq!(cache.keys(), keys);
    assert_eq!(cache.used_memory(), used);
    assert_eq!(cache.get("small"), Some("v".to_string()));
    assert!(!cache.exists("big"));
}

#[test]
fn test_repeated_larger_overwrites_do_not_accumulate() {
    let cache = create_test_cache();

    for len in (0..2000).step_by(100) {
        let value = "x".repeat(len);
        assert_ok!(cache.set("grow", value.clone(), Duration::from_secs(60)));
        assert_eq!(cache.used_memory(), entry_size("grow", &value));
    }
    assert_eq!(cache.keys(), 1);
}

#[test]
fn test_size_hint_values_charge_their_hint() {
    #[derive(Clone)]
    struct Blob;

    let cache: Cache<SizeHint<Blob>> = Cache::new();
    assert!(cache.set_max_memory("1KB"));

    assert_ok!(cache.set("blob", SizeHint::new(Blob, 500), Duration::from_secs(60)));
    assert_eq!(cache.used_memory(), entry_size("blob", &SizeHint::new(Blob, 500)));
    assert_err!(cache.set("blob2", SizeHint::new(Blob, 600), Duration::from_secs(60)));
}

#[test]
fn test_oversized_hint_is_rejected() {
    #[derive(Clone)]
    struct Blob;

    let cache: Cache<SizeHint<Blob>> = Cache::new();
    assert!(cache.set_max_memory("1PB"));

    let huge = SizeHint::new(Blob, u64::MAX - 10);
    let err = assert_err!(cache.set("huge", huge, Duration::from_secs(60)));
    assert!(matches!(err, CacheError::CapacityExceeded { requested: u64::MAX, .. }));
    assert_eq!(cache.keys(), 0);
    assert_eq!(cache.used_memory(), 0);
}

#[test]
fn test_shared_payloads_are_sized_by_content() {
    let cache: Cache<Arc<Vec<u8>>> = Cache::new();
    assert!(cache.set_max_memory("1KB"));

    let payload = Arc::new(vec![0u8; 4096]);
    assert_err!(cache.set("payload", payload, Duration::from_secs(60)));
    assert_eq!(cache.keys(), 0);
}

// == Del / Flush / Keys ==

#[test]
fn test_del_present_and_absent() {
    let cache = create_test_cache();
    assert_ok!(cache.set("a", "1".to_string(), Duration::from_secs(60)));
    assert_ok!(cache.set("b", "2".to_string(), Duration::from_secs(60)));

    assert!(cache.del("a"));
    assert_eq!(cache.keys(), 1);

    let used = cache.used_memory();
    assert!(!cache.del("a"));
    assert_eq!(cache.keys(), 1);
    assert_eq!(cache.used_memory(), used);
}

#[test]
fn test_flush_clears_everything() {
    let cache = create_test_cache();
    for i in 0..10 {
        assert_ok!(cache.set(format!("key{}", i), "v".to_string(), Duration::from_secs(60)));
    }

    assert!(cache.flush());

    assert_eq!(cache.keys(), 0);
    assert_eq!(cache.used_memory(), 0);
    assert!(!cache.exists("key1"));
}

#[test]
fn test_keys_counts_only_live_entries() {
    let cache = create_test_cache();
    assert_ok!(cache.set("short", "v".to_string(), Duration::from_millis(50)));
    assert_ok!(cache.set("long", "v".to_string(), Duration::from_secs(60)));

    thread::sleep(Duration::from_millis(100));

    assert_eq!(cache.len(), 2);
    assert_eq!(cache.keys(), 1);
    assert_eq!(cache.used_memory(), entry_size("long", &"v".to_string()));
}

#[test]
fn test_ttl_counts_down_and_clamps() {
    let cache = create_test_cache();
    assert_ok!(cache.set("key", "v".to_string(), Duration::from_secs(5)));
    assert_ok!(cache.set("forever", "v".to_string(), Duration::MAX));

    let left = cache.ttl("key").unwrap();
    assert!(left > Duration::from_secs(4) && left <= Duration::from_secs(5));
    assert!(cache.ttl("forever").is_some_and(|left| left <= MAX_TTL));
    assert_eq!(cache.ttl("absent"), None);
}

// == Reaper ==

#[tokio::test]
async fn test_reaper_drains_unread_keys_with_default_interval() {
    let cache = create_test_cache();
    for i in 0..100 {
        assert_ok!(cache.set(format!("key{}", i), "value".to_string(), Duration::from_secs(1)));
    }

    assert_eq!(cache.start_reaper(), Ok(true));
    tokio::time::sleep(Duration::from_secs(6)).await;

    // No reads happened; only the reaper could have removed anything.
    let remaining = cache.len();
    assert!(remaining < 100, "reaper removed nothing ({} left)", remaining);
    assert_eq!(cache.stats().hits + cache.stats().misses, 0);

    assert!(cache.stop_reaper().await);
}

#[tokio::test]
async fn test_reaper_drains_to_zero_with_short_interval() {
    let config = Config::default()
        .with_max_memory(100 * MB)
        .with_reaper_interval(Duration::from_millis(50));
    let cache: Cache<String> = Cache::with_config(&config);
    for i in 0..100 {
        assert_ok!(cache.set(format!("key{}", i), "value".to_string(), Duration::from_millis(200)));
    }

    assert_ok!(cache.start_reaper());
    tokio::time::sleep(Duration::from_secs(3)).await;

    assert_eq!(cache.len(), 0);
    assert_eq!(cache.used_memory(), 0);
    assert_eq!(cache.stats().reaped, 100);

    assert!(cache.stop_reaper().await);
}

#[tokio::test]
async fn test_reaper_stops_touching_entries_after_stop() {
    let config = Config::default()
        .with_max_memory(100 * MB)
        .with_reaper_interval(Duration::from_millis(20));
    let cache: Cache<String> = Cache::with_config(&config);

    assert_ok!(cache.start_reaper());
    assert!(cache.stop_reaper().await);

    assert_ok!(cache.set("key", "value".to_string(), Duration::from_millis(10)));
    tokio::time::sleep(Duration::from_millis(300)).await;

    assert_eq!(cache.len(), 1);
    assert_eq!(cache.stats().reaped, 0);
}

// == Concurrency ==

#[test]
fn test_concurrent_access_keeps_budget() {
    let cache = create_test_cache();
    assert!(cache.set_max_memory("64KB"));

    let handles: Vec<_> = (0..8)
        .map(|t| {
            let cache = cache.clone();
            thread::spawn(move || {
                for i in 0..500 {
                    let key = format!("k{}", (t * 31 + i) % 200);
                    let _ = cache.set(key.clone(), "x".repeat(i % 300), Duration::from_secs(60));
                    cache.get(&key);
                    if i % 5 == 0 {
                        cache.del(&key);
                    }
                    assert!(cache.used_memory() <= 64 * 1024);
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    let live = cache.keys();
    assert!(cache.used_memory() <= 64 * 1024);
    assert_eq!(cache.len() as u64, live);
    assert!(cache.flush());
    assert_eq!(cache.used_memory(), 0);
}
