//! Unit tests for the in-memory cache

use super::*;

use std::time::Duration;

#[derive(Debug, PartialEq)]
struct Payload {
    name: String,
}

#[tokio::test]
async fn test_set_and_get_heterogeneous_values() {
    let cache = MemoryCache::new(Duration::from_secs(60), Duration::ZERO);

    cache.set("key1", "value1".to_string());
    cache.set("key2", 2u64);
    cache.set(
        "key3",
        Payload {
            name: "test".to_string(),
        },
    );

    assert_eq!(cache.get_as::<String>("key1").unwrap().as_str(), "value1");
    assert_eq!(*cache.get_as::<u64>("key2").unwrap(), 2);
    assert_eq!(cache.get_as::<Payload>("key3").unwrap().name, "test");
    assert!(cache.get("not_exists").is_none());
}

#[tokio::test]
async fn test_wrong_type_is_a_miss() {
    let cache = MemoryCache::new(Duration::from_secs(60), Duration::ZERO);
    cache.set("key", "value".to_string());

    assert!(cache.get_as::<u64>("key").is_none());
    assert!(cache.get_as::<String>("key").is_some());
    assert!(cache.get("key").is_some());
}

#[tokio::test]
async fn test_remove() {
    let cache = MemoryCache::new(Duration::from_secs(60), Duration::ZERO);
    cache.set("key", 1u32);

    assert!(cache.get("key").is_some());
    assert!(cache.remove("key"));
    assert!(cache.get("key").is_none());
    assert!(!cache.remove("key"));
}

#[tokio::test]
async fn test_expiration() {
    let cache = MemoryCache::new(Duration::from_secs(60), Duration::ZERO);
    cache.set_with_ttl("expire_key", "value".to_string(), Ttl::For(Duration::from_millis(50)));

    assert!(cache.get("expire_key").is_some());
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(cache.get("expire_key").is_none());
}

#[tokio::test]
async fn test_never_expire() {
    let cache = MemoryCache::new(Duration::from_millis(50), Duration::ZERO);
    cache.set_with_ttl("never", "value".to_string(), Ttl::Forever);
    cache.set("short", "value".to_string());

    tokio::time::sleep(Duration::from_millis(120)).await;
    assert!(cache.get("never").is_some());
    assert!(cache.get("short").is_none());
}

#[tokio::test]
async fn test_zero_ttl_falls_back_to_default() {
    let cache = MemoryCache::new(Duration::from_millis(50), Duration::ZERO);
    cache.set_with_ttl("key", "value".to_string(), Ttl::For(Duration::ZERO));

    assert!(cache.get("key").is_some());
    tokio::time::sleep(Duration::from_millis(120)).await;
    assert!(cache.get("key").is_none());
}

#[tokio::test]
async fn test_zero_default_ttl_falls_back_to_an_hour() {
    let cache = MemoryCache::new(Duration::ZERO, Duration::ZERO);
    assert_eq!(cache.default_ttl(), Duration::from_secs(3600));
}

#[tokio::test]
async fn test_overwrite_restarts_expiry() {
    let cache = MemoryCache::new(Duration::from_secs(60), Duration::ZERO);
    cache.set_with_ttl("key", 1u32, Ttl::For(Duration::from_millis(150)));
    tokio::time::sleep(Duration::from_millis(100)).await;

    cache.set_with_ttl("key", 2u32, Ttl::For(Duration::from_millis(150)));
    tokio::time::sleep(Duration::from_millis(100)).await;

    // 200ms after the first write, but only 100ms after the second
    assert_eq!(*cache.get_as::<u32>("key").unwrap(), 2);
}

#[tokio::test]
async fn test_len_counts_expired_entries_until_swept() {
    let cache = MemoryCache::new(Duration::from_secs(60), Duration::ZERO);
    cache.set_with_ttl("gone", "value".to_string(), Ttl::For(Duration::from_millis(30)));
    tokio::time::sleep(Duration::from_millis(80)).await;

    assert!(cache.get("gone").is_none());
    assert_eq!(cache.len(), 1);
}

#[tokio::test]
async fn test_clear_and_len() {
    let cache = MemoryCache::new(Duration::from_secs(60), Duration::ZERO);
    cache.set("key1", 1u32);
    cache.set("key2", 2u32);
    cache.set("key3", 3u32);
    assert_eq!(cache.len(), 3);

    cache.remove("key1");
    assert_eq!(cache.len(), 2);

    cache.clear();
    assert_eq!(cache.len(), 0);
    assert!(cache.is_empty());
    assert!(cache.get("key2").is_none());
}

#[tokio::test]
async fn test_background_sweep_evicts_expired_entries() {
    let cache = MemoryCache::new(Duration::from_millis(30), Duration::from_millis(50));
    cache.set("key1", "value1".to_string());
    cache.set("key2", "value2".to_string());
    assert_eq!(cache.len(), 2);

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(cache.len(), 0);

    cache.close();
}

#[tokio::test]
async fn test_sweep_keeps_live_entries() {
    let cache = MemoryCache::new(Duration::from_secs(60), Duration::from_millis(40));
    cache.set("live", 1u32);
    cache.set_with_ttl("dead", 2u32, Ttl::For(Duration::from_millis(20)));

    tokio::time::sleep(Duration::from_millis(150)).await;
    assert_eq!(cache.len(), 1);
    assert!(cache.get("live").is_some());

    cache.close();
}

#[tokio::test]
async fn test_close_is_idempotent_and_store_stays_usable() {
    let cache = MemoryCache::new(Duration::from_secs(60), Duration::from_millis(50));
    assert!(!cache.is_closed());

    cache.close();
    cache.close();
    assert!(cache.is_closed());

    cache.set("after_close", 1u32);
    assert!(cache.get("after_close").is_some());
}

#[tokio::test]
async fn test_clones_share_storage() {
    let cache = MemoryCache::new(Duration::from_secs(60), Duration::ZERO);
    let handle = cache.clone();

    cache.set("key", 41u32);
    assert_eq!(*handle.get_as::<u32>("key").unwrap(), 41);

    handle.clear();
    assert!(cache.is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_access() {
    let cache = MemoryCache::new(Duration::from_secs(60), Duration::ZERO);

    let mut handles = Vec::new();
    for task in 0..8u32 {
        let cache = cache.clone();
        handles.push(tokio::spawn(async move {
            for i in 0..50u32 {
                let key = format!("t{task}k{i}");
                cache.set(&key, task * 100 + i);
                assert_eq!(*cache.get_as::<u32>(&key).unwrap(), task * 100 + i);
            }
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    assert_eq!(cache.len(), 400);
}
