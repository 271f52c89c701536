//! DashMap-backed [`RequestCache`] implementation.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use cashew_backend::{BackendResult, DeleteStatus, RequestCache};
use cashew_core::{CacheEntry, CacheKey, Raw};
use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::{debug, trace};

use crate::builder::MemoryCacheBuilder;
use crate::reaper::{self, Reaper, Store};

/// In-process cache over a concurrent map.
///
/// Cloning is cheap; clones share the same map and reaper.
///
/// # Caveats
///
/// - Data is **not persisted** and **not shared** across processes.
/// - Without a reaper, entries nobody reads again stay in memory until
///   [`clear`](RequestCache::clear) or [`sweep`](Self::sweep).
#[derive(Clone, Debug)]
pub struct MemoryCache {
    store: Store,
    reaper: Arc<Mutex<Option<Reaper>>>,
    name: Arc<str>,
}

impl MemoryCache {
    /// Creates a new builder.
    pub fn builder() -> MemoryCacheBuilder {
        MemoryCacheBuilder::default()
    }

    /// Creates a cache without a background reaper.
    pub fn new() -> Self {
        Self::without_reaper("memory".to_owned())
    }

    pub(crate) fn without_reaper(name: String) -> Self {
        MemoryCache {
            store: Arc::new(DashMap::new()),
            reaper: Arc::new(Mutex::new(None)),
            name: name.into(),
        }
    }

    pub(crate) fn with_reaper(
        name: String,
        runtime: &tokio::runtime::Handle,
        interval: Duration,
    ) -> Self {
        let store: Store = Arc::new(DashMap::new());
        let reaper = Reaper::spawn(runtime, store.clone(), interval, name.clone());
        MemoryCache {
            store,
            reaper: Arc::new(Mutex::new(Some(reaper))),
            name: name.into(),
        }
    }

    /// Number of stored entries, including not yet purged expired ones.
    pub fn len(&self) -> usize {
        self.store.len()
    }

    /// Whether the map holds no entries.
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Runs one eviction pass inline and returns the number of removed entries.
    pub fn sweep(&self) -> usize {
        reaper::sweep(&self.store)
    }

    /// Whether the background reaper is alive.
    pub async fn is_reaper_running(&self) -> bool {
        self.reaper
            .lock()
            .await
            .as_ref()
            .is_some_and(Reaper::is_running)
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RequestCache for MemoryCache {
    async fn get(&self, key: &CacheKey) -> BackendResult<Option<CacheEntry<Raw>>> {
        let entry = match self.store.get(key) {
            Some(entry) => entry.clone(),
            None => return Ok(None),
        };
        if entry.is_hard_expired() {
            trace!(cache_key = %key, "purging hard-expired entry on read");
            // Only drop the entry we saw; a concurrent set may have replaced it.
            self.store
                .remove_if(key, |_, current| current.is_hard_expired());
            return Ok(None);
        }
        Ok(Some(entry))
    }

    async fn set(&self, key: &CacheKey, entry: CacheEntry<Raw>) -> BackendResult<()> {
        self.store.insert(key.clone(), entry);
        Ok(())
    }

    async fn remove(&self, key: &CacheKey) -> BackendResult<DeleteStatus> {
        match self.store.remove(key) {
            Some(_) => Ok(DeleteStatus::Deleted(1)),
            None => Ok(DeleteStatus::Missing),
        }
    }

    async fn clear(&self) -> BackendResult<()> {
        self.store.clear();
        Ok(())
    }

    async fn destroy(&self) -> BackendResult<()> {
        if let Some(reaper) = self.reaper.lock().await.take() {
            debug!(backend = %self.name, "stopping reaper");
            reaper.stop().await;
        }
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(hard: Duration, soft: Duration) -> CacheEntry<Raw> {
        CacheEntry::new(Raw::from_static(b"value"), hard, soft).unwrap()
    }

    #[tokio::test]
    async fn remove_reports_presence() {
        let cache = MemoryCache::new();
        let key = CacheKey::from_str("id", "1");
        cache
            .set(&key, entry(Duration::from_secs(5), Duration::from_secs(1)))
            .await
            .unwrap();

        assert_eq!(cache.remove(&key).await.unwrap(), DeleteStatus::Deleted(1));
        assert_eq!(cache.remove(&key).await.unwrap(), DeleteStatus::Missing);
    }

    #[tokio::test]
    async fn soft_expired_entry_is_still_returned() {
        let cache = MemoryCache::new();
        let key = CacheKey::from_str("id", "2");
        cache
            .set(&key, entry(Duration::from_secs(5), Duration::ZERO))
            .await
            .unwrap();

        let read = cache.get(&key).await.unwrap().unwrap();
        assert!(read.is_soft_expired());
        assert!(!read.is_hard_expired());
    }

    #[tokio::test]
    async fn clear_drops_everything() {
        let cache = MemoryCache::new();
        for i in 0..10 {
            let key = CacheKey::from_str("id", &i.to_string());
            cache
                .set(&key, entry(Duration::from_secs(5), Duration::from_secs(5)))
                .await
                .unwrap();
        }
        assert_eq!(cache.len(), 10);
        cache.clear().await.unwrap();
        assert!(cache.is_empty());
    }
}
