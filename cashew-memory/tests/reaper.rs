use std::time::Duration;

use bytes::Bytes;
use cashew_backend::RequestCache;
use cashew_core::{CacheEntry, CacheKey};
use cashew_memory::{Error, MemoryCache, MemoryCacheConfig};
use chrono::Utc;

fn make_key(id: u32) -> CacheKey {
    CacheKey::from_str("id", &id.to_string())
}

fn short_lived() -> CacheEntry<Bytes> {
    CacheEntry::new(
        Bytes::from_static(b"short"),
        Duration::from_millis(200),
        Duration::from_millis(100),
    )
    .unwrap()
}

#[tokio::test]
async fn get_treats_hard_expired_entry_as_absent() {
    let cache = MemoryCache::new();
    let key = make_key(1);
    let past = Utc::now() - chrono::Duration::milliseconds(1);
    let entry = CacheEntry::with_deadlines(Bytes::from_static(b"old"), past, past).unwrap();
    cache.set(&key, entry).await.unwrap();
    assert_eq!(cache.len(), 1);

    assert!(cache.get(&key).await.unwrap().is_none());
    // Purged as a side effect of the read.
    assert_eq!(cache.len(), 0);
}

#[tokio::test]
async fn hard_and_soft_deadlines_over_time() {
    let cache = MemoryCache::new();
    let key = make_key(2);
    let entry = CacheEntry::new(
        Bytes::from_static(b"payload"),
        Duration::from_secs(2),
        Duration::from_secs(1),
    )
    .unwrap();
    cache.set(&key, entry).await.unwrap();

    let fresh = cache.get(&key).await.unwrap().unwrap();
    assert!(!fresh.is_soft_expired());

    tokio::time::sleep(Duration::from_millis(1100)).await;
    let stale = cache.get(&key).await.unwrap().unwrap();
    assert_eq!(stale.value(), &Bytes::from_static(b"payload"));
    assert!(stale.is_soft_expired());

    tokio::time::sleep(Duration::from_millis(1400)).await;
    assert!(cache.get(&key).await.unwrap().is_none());
}

#[tokio::test]
async fn reaper_purges_without_reads() {
    let cache = MemoryCache::builder()
        .eviction_interval(Duration::from_secs(1))
        .build()
        .unwrap();
    for id in 0..5 {
        cache.set(&make_key(id), short_lived()).await.unwrap();
    }
    assert_eq!(cache.len(), 5);

    tokio::time::sleep(Duration::from_millis(2300)).await;
    assert_eq!(cache.len(), 0);
    assert!(cache.is_reaper_running().await);

    cache.destroy().await.unwrap();
}

#[tokio::test]
async fn destroy_stops_reaper() {
    let cache = MemoryCache::builder()
        .eviction_interval(Duration::from_secs(60))
        .build()
        .unwrap();
    assert!(cache.is_reaper_running().await);

    // Returns promptly even though the next tick is a minute away.
    tokio::time::timeout(Duration::from_secs(1), cache.destroy())
        .await
        .expect("destroy should not wait for the next tick")
        .unwrap();
    assert!(!cache.is_reaper_running().await);

    // Idempotent.
    cache.destroy().await.unwrap();
}

#[tokio::test]
async fn sub_second_interval_is_rejected() {
    let result = MemoryCache::builder()
        .eviction_interval(Duration::from_millis(999))
        .build();
    assert!(matches!(result, Err(Error::InvalidInterval { .. })));
}

#[test]
fn reaper_outside_runtime_is_rejected() {
    let result = MemoryCache::builder()
        .eviction_interval(Duration::from_secs(5))
        .build();
    assert!(matches!(result, Err(Error::NoRuntime)));
}

#[tokio::test]
async fn builds_from_yaml_config() {
    let yaml = r#"
eviction_interval: 2s
name: sessions
"#;
    let config: MemoryCacheConfig = serde_saphyr::from_str(yaml).expect("failed to deserialize");
    assert_eq!(config.eviction_interval, Some(Duration::from_secs(2)));

    let cache = config.build().unwrap();
    assert_eq!(cache.name(), "sessions");
    assert!(cache.is_reaper_running().await);
    cache.destroy().await.unwrap();
}
