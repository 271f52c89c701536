//! Typed layer over an in-test DashMap storage.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use cashew_backend::{BackendResult, DeleteStatus, RequestCache, TypedCache};
use cashew_core::{CacheEntry, CacheKey, Raw};
use chrono::Utc;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};

#[derive(Clone, Default)]
struct MapCache {
    store: Arc<DashMap<CacheKey, CacheEntry<Raw>>>,
}

#[async_trait]
impl RequestCache for MapCache {
    async fn get(&self, key: &CacheKey) -> BackendResult<Option<CacheEntry<Raw>>> {
        let expired = match self.store.get(key) {
            Some(entry) if entry.is_hard_expired() => true,
            Some(entry) => return Ok(Some(entry.clone())),
            None => return Ok(None),
        };
        if expired {
            self.store.remove(key);
        }
        Ok(None)
    }

    async fn set(&self, key: &CacheKey, entry: CacheEntry<Raw>) -> BackendResult<()> {
        self.store.insert(key.clone(), entry);
        Ok(())
    }

    async fn remove(&self, key: &CacheKey) -> BackendResult<DeleteStatus> {
        Ok(match self.store.remove(key) {
            Some(_) => DeleteStatus::Deleted(1),
            None => DeleteStatus::Missing,
        })
    }

    async fn clear(&self) -> BackendResult<()> {
        self.store.clear();
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Quote {
    symbol: String,
    price: f64,
}

#[tokio::test]
async fn typed_roundtrip_keeps_validators() {
    let cache = MapCache::default();
    let key = CacheKey::from_str("symbol", "ACME");
    let entry = CacheEntry::new(
        Quote {
            symbol: "ACME".to_owned(),
            price: 12.5,
        },
        Duration::from_secs(60),
        Duration::from_secs(30),
    )
    .unwrap()
    .with_validators(Some("\"v1\"".to_owned()), None);

    cache.set_typed(&key, &entry).await.unwrap();
    let read = cache.get_typed::<Quote>(&key).await.unwrap().unwrap();

    assert_eq!(read, entry);
    assert_eq!(read.etag(), Some("\"v1\""));
}

#[tokio::test]
async fn typed_read_of_foreign_bytes_fails() {
    let cache = MapCache::default();
    let key = CacheKey::from_str("symbol", "BAD");
    let entry = CacheEntry::new(
        Raw::from_static(b"<html>"),
        Duration::from_secs(60),
        Duration::from_secs(60),
    )
    .unwrap();
    cache.set(&key, entry).await.unwrap();

    assert!(cache.get_typed::<Quote>(&key).await.is_err());
}

#[tokio::test]
async fn trait_object_delegates() {
    let cache: Box<dyn RequestCache> = Box::new(MapCache::default());
    let key = CacheKey::from_str("k", "v");
    let past = Utc::now() - chrono::Duration::seconds(1);
    let entry = CacheEntry::with_deadlines(Raw::from_static(b"1"), past, past).unwrap();

    cache.set(&key, entry).await.unwrap();
    assert!(cache.get(&key).await.unwrap().is_none());
    assert_eq!(cache.remove(&key).await.unwrap(), DeleteStatus::Missing);
    cache.destroy().await.unwrap();
}
