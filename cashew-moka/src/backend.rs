//! Moka backend implementation.

use async_trait::async_trait;
use cashew_backend::format::{Format, JsonFormat};
use cashew_backend::{BackendResult, DeleteStatus, RequestCache};
use cashew_core::{CacheEntry, CacheKey, Raw};
use moka::future::Cache;
use tracing::trace;

use crate::builder::{MokaCacheBuilder, NoCapacity};

/// In-memory cache backend powered by Moka.
///
/// Moka expires entries at their hard deadline. Because its expiration is
/// best-effort, `get` re-checks the deadline and invalidates late entries so
/// a hard-expired entry is never returned.
///
/// # Caveats
///
/// - Data is **not persisted** and **not shared** across processes; use
///   `cashew-redis` for a distributed cache.
/// - Capacity eviction may drop entries before their deadline.
#[derive(Clone)]
pub struct MokaCache<S = JsonFormat>
where
    S: Format,
{
    pub(crate) cache: Cache<CacheKey, CacheEntry<Raw>>,
    pub(crate) serializer: S,
    pub(crate) name: String,
}

impl<S: Format> std::fmt::Debug for MokaCache<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MokaCache")
            .field("name", &self.name)
            .field("cache", &self.cache)
            .field("serializer", &self.serializer)
            .finish()
    }
}

impl MokaCache<JsonFormat> {
    /// Creates a new builder. A capacity must be chosen before `build`.
    pub fn builder() -> MokaCacheBuilder<NoCapacity, JsonFormat> {
        MokaCacheBuilder::new()
    }
}

impl<S: Format> MokaCache<S> {
    /// Underlying Moka cache, mainly for `run_pending_tasks` in tests.
    pub fn cache(&self) -> &Cache<CacheKey, CacheEntry<Raw>> {
        &self.cache
    }

    fn record_capacity(&self) {
        crate::metrics::record_capacity(
            &self.name,
            self.cache.entry_count(),
            self.cache.weighted_size(),
        );
    }
}

#[async_trait]
impl<S> RequestCache for MokaCache<S>
where
    S: Format + Send + Sync,
{
    async fn get(&self, key: &CacheKey) -> BackendResult<Option<CacheEntry<Raw>>> {
        match self.cache.get(key).await {
            Some(entry) if entry.is_hard_expired() => {
                trace!(cache_key = %key, "invalidating hard-expired entry");
                self.cache.invalidate(key).await;
                Ok(None)
            }
            entry => Ok(entry),
        }
    }

    async fn set(&self, key: &CacheKey, entry: CacheEntry<Raw>) -> BackendResult<()> {
        self.cache.insert(key.clone(), entry).await;
        self.record_capacity();
        Ok(())
    }

    async fn remove(&self, key: &CacheKey) -> BackendResult<DeleteStatus> {
        let removed = self.cache.remove(key).await;
        self.record_capacity();
        match removed {
            Some(_) => Ok(DeleteStatus::Deleted(1)),
            None => Ok(DeleteStatus::Missing),
        }
    }

    async fn clear(&self) -> BackendResult<()> {
        self.cache.invalidate_all();
        self.cache.run_pending_tasks().await;
        self.record_capacity();
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn value_format(&self) -> &dyn Format {
        &self.serializer
    }
}
