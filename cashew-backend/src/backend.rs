use std::{future::Future, sync::Arc};

use async_trait::async_trait;
use cashew_core::{CacheEntry, CacheKey, Cacheable, Raw};
use tracing::trace;

use crate::{
    BackendError, DeleteStatus,
    format::{Format, FormatExt, JsonFormat},
};

pub type BackendResult<T> = Result<T, BackendError>;

/// Raw key/value storage of cache entries.
#[async_trait]
pub trait RequestCache: Sync + Send {
    /// Reads an entry. Hard-expired entries are removed and reported as `None`.
    async fn get(&self, key: &CacheKey) -> BackendResult<Option<CacheEntry<Raw>>>;

    /// Stores an entry, replacing any previous one under the same key.
    async fn set(&self, key: &CacheKey, entry: CacheEntry<Raw>) -> BackendResult<()>;

    async fn remove(&self, key: &CacheKey) -> BackendResult<DeleteStatus>;

    /// Drops every entry owned by this cache.
    async fn clear(&self) -> BackendResult<()>;

    /// Releases backend resources such as reaper tasks.
    ///
    /// The cache may still answer calls afterwards, but background eviction
    /// stops. Calling `destroy` twice is a no-op.
    async fn destroy(&self) -> BackendResult<()> {
        Ok(())
    }

    /// Backend name used in logs and metrics labels.
    fn name(&self) -> &str {
        "backend"
    }

    fn value_format(&self) -> &dyn Format {
        &JsonFormat
    }
}

#[async_trait]
impl RequestCache for &dyn RequestCache {
    async fn get(&self, key: &CacheKey) -> BackendResult<Option<CacheEntry<Raw>>> {
        (*self).get(key).await
    }

    async fn set(&self, key: &CacheKey, entry: CacheEntry<Raw>) -> BackendResult<()> {
        (*self).set(key, entry).await
    }

    async fn remove(&self, key: &CacheKey) -> BackendResult<DeleteStatus> {
        (*self).remove(key).await
    }

    async fn clear(&self) -> BackendResult<()> {
        (*self).clear().await
    }

    async fn destroy(&self) -> BackendResult<()> {
        (*self).destroy().await
    }

    fn name(&self) -> &str {
        (*self).name()
    }

    fn value_format(&self) -> &dyn Format {
        (*self).value_format()
    }
}

#[async_trait]
impl RequestCache for Box<dyn RequestCache> {
    async fn get(&self, key: &CacheKey) -> BackendResult<Option<CacheEntry<Raw>>> {
        (**self).get(key).await
    }

    async fn set(&self, key: &CacheKey, entry: CacheEntry<Raw>) -> BackendResult<()> {
        (**self).set(key, entry).await
    }

    async fn remove(&self, key: &CacheKey) -> BackendResult<DeleteStatus> {
        (**self).remove(key).await
    }

    async fn clear(&self) -> BackendResult<()> {
        (**self).clear().await
    }

    async fn destroy(&self) -> BackendResult<()> {
        (**self).destroy().await
    }

    fn name(&self) -> &str {
        (**self).name()
    }

    fn value_format(&self) -> &dyn Format {
        (**self).value_format()
    }
}

#[async_trait]
impl RequestCache for Arc<dyn RequestCache + Send + 'static> {
    async fn get(&self, key: &CacheKey) -> BackendResult<Option<CacheEntry<Raw>>> {
        (**self).get(key).await
    }

    async fn set(&self, key: &CacheKey, entry: CacheEntry<Raw>) -> BackendResult<()> {
        (**self).set(key, entry).await
    }

    async fn remove(&self, key: &CacheKey) -> BackendResult<DeleteStatus> {
        (**self).remove(key).await
    }

    async fn clear(&self) -> BackendResult<()> {
        (**self).clear().await
    }

    async fn destroy(&self) -> BackendResult<()> {
        (**self).destroy().await
    }

    fn name(&self) -> &str {
        (**self).name()
    }

    fn value_format(&self) -> &dyn Format {
        (**self).value_format()
    }
}

/// Typed operations over a [`RequestCache`].
///
/// Values are encoded with the backend's [`value_format`](RequestCache::value_format);
/// entry deadlines and validators are carried over untouched.
pub trait TypedCache: RequestCache {
    fn get_typed<T>(
        &self,
        key: &CacheKey,
    ) -> impl Future<Output = BackendResult<Option<CacheEntry<T>>>> + Send
    where
        T: Cacheable,
    {
        async move {
            match self.get(key).await? {
                Some(entry) => {
                    trace!(backend = self.name(), cache_key = %key, "decoding cached entry");
                    let format = self.value_format();
                    let entry = entry.try_map(|raw| format.deserialize::<T>(&raw))?;
                    Ok(Some(entry))
                }
                None => Ok(None),
            }
        }
    }

    fn set_typed<T>(
        &self,
        key: &CacheKey,
        entry: &CacheEntry<T>,
    ) -> impl Future<Output = BackendResult<()>> + Send
    where
        T: Cacheable,
    {
        async move {
            let raw = self.value_format().serialize(entry.value())?;
            self.set(key, entry.with_value(raw)).await
        }
    }
}

impl<B: RequestCache + ?Sized> TypedCache for B {}
