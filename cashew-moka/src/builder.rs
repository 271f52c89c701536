//! Builder for configuring [`MokaCache`].

use std::time::{Duration, Instant};

use cashew_backend::format::{Format, JsonFormat};
use cashew_core::{CacheEntry, CacheKey, Raw};
use chrono::Utc;
use moka::Expiry;
use moka::future::{Cache, CacheBuilder};
use moka::policy::EvictionPolicy;

use crate::backend::MokaCache;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
struct HardDeadline;

impl Expiry<CacheKey, CacheEntry<Raw>> for HardDeadline {
    fn expire_after_create(
        &self,
        _key: &CacheKey,
        value: &CacheEntry<Raw>,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(Self::remaining(value))
    }

    fn expire_after_update(
        &self,
        _key: &CacheKey,
        value: &CacheEntry<Raw>,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        // Moka keeps the old deadline by default; a replaced entry brings its own.
        Some(Self::remaining(value))
    }
}

impl HardDeadline {
    fn remaining(value: &CacheEntry<Raw>) -> Duration {
        let millis = (value.hard_expire() - Utc::now()).num_milliseconds();
        if millis <= 0 {
            Duration::ZERO
        } else {
            Duration::from_millis(millis as u64)
        }
    }
}

/// Marker: no capacity chosen yet.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCapacity;

/// Marker: capacity counted in entries.
#[derive(Debug, Clone, Copy)]
pub struct EntryCapacity(pub(crate) u64);

/// Marker: capacity counted in approximate bytes.
#[derive(Debug, Clone, Copy)]
pub struct ByteCapacity(pub(crate) u64);

/// Builder for [`MokaCache`].
///
/// Capacity is a typestate: `build` only exists after
/// [`max_entries`](Self::max_entries) or [`max_bytes`](Self::max_bytes).
pub struct MokaCacheBuilder<Cap, S = JsonFormat>
where
    S: Format,
{
    capacity: Cap,
    serializer: S,
    name: String,
    eviction_policy: Option<EvictionPolicy>,
}

impl MokaCacheBuilder<NoCapacity, JsonFormat> {
    /// Creates a builder with JSON values and the name `"moka"`.
    pub fn new() -> Self {
        Self {
            capacity: NoCapacity,
            serializer: JsonFormat,
            name: "moka".to_owned(),
            eviction_policy: None,
        }
    }
}

impl Default for MokaCacheBuilder<NoCapacity, JsonFormat> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Format> MokaCacheBuilder<NoCapacity, S> {
    /// Bounds the cache by number of entries.
    pub fn max_entries(self, capacity: u64) -> MokaCacheBuilder<EntryCapacity, S> {
        MokaCacheBuilder {
            capacity: EntryCapacity(capacity),
            serializer: self.serializer,
            name: self.name,
            eviction_policy: self.eviction_policy,
        }
    }

    /// Bounds the cache by approximate memory use.
    ///
    /// Each entry weighs its key plus its raw value and metadata.
    pub fn max_bytes(self, bytes: u64) -> MokaCacheBuilder<ByteCapacity, S> {
        MokaCacheBuilder {
            capacity: ByteCapacity(bytes),
            serializer: self.serializer,
            name: self.name,
            eviction_policy: self.eviction_policy,
        }
    }
}

impl<Cap, S: Format> MokaCacheBuilder<Cap, S> {
    /// Sets the backend name used in logs and metrics.
    ///
    /// # Default
    ///
    /// `"moka"`
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Overrides the eviction policy.
    pub fn eviction_policy(mut self, policy: EvictionPolicy) -> Self {
        self.eviction_policy = Some(policy);
        self
    }

    /// Sets the value format used by typed access.
    pub fn value_format<NewS: Format>(self, serializer: NewS) -> MokaCacheBuilder<Cap, NewS> {
        MokaCacheBuilder {
            capacity: self.capacity,
            serializer,
            name: self.name,
            eviction_policy: self.eviction_policy,
        }
    }
}

impl<S: Format> MokaCacheBuilder<EntryCapacity, S> {
    /// Builds the cache with entry-count capacity and TinyLFU eviction by default.
    pub fn build(self) -> MokaCache<S> {
        let policy = self
            .eviction_policy
            .unwrap_or_else(EvictionPolicy::tiny_lfu);
        let cache: Cache<CacheKey, CacheEntry<Raw>> = CacheBuilder::new(self.capacity.0)
            .eviction_policy(policy)
            .expire_after(HardDeadline)
            .build();

        MokaCache {
            cache,
            serializer: self.serializer,
            name: self.name,
        }
    }
}

impl<S: Format> MokaCacheBuilder<ByteCapacity, S> {
    /// Builds the cache with byte capacity and LRU eviction by default.
    ///
    /// TinyLFU admission can reject new entries even when eviction would make
    /// room, so weighted caches default to LRU.
    pub fn build(self) -> MokaCache<S> {
        let policy = self.eviction_policy.unwrap_or_else(EvictionPolicy::lru);
        let cache: Cache<CacheKey, CacheEntry<Raw>> = CacheBuilder::new(self.capacity.0)
            .weigher(byte_weight)
            .eviction_policy(policy)
            .expire_after(HardDeadline)
            .build();

        MokaCache {
            cache,
            serializer: self.serializer,
            name: self.name,
        }
    }
}

fn byte_weight(key: &CacheKey, value: &CacheEntry<Raw>) -> u32 {
    (key.memory_size() + value.memory_size()).min(u32::MAX as usize) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn byte_weight_counts_value_bytes() {
        let key = CacheKey::from_str("id", "1");
        let ttl = Duration::from_secs(5);
        let small = CacheEntry::new(Raw::from_static(b"x"), ttl, ttl).unwrap();
        let large = CacheEntry::new(Raw::from(vec![0u8; 1025]), ttl, ttl).unwrap();
        assert_eq!(byte_weight(&key, &large) - byte_weight(&key, &small), 1024);
    }

    #[test]
    fn byte_capacity_builds_with_custom_format() {
        let cache = MokaCacheBuilder::new()
            .max_bytes(4096)
            .value_format(JsonFormat)
            .name("weighted")
            .build();
        assert_eq!(cache.cache().policy().max_capacity(), Some(4096));
    }
}
