//! Redis backend implementation.

use async_trait::async_trait;
use bytes::Bytes;
use cashew_backend::{BackendError, BackendResult, DeleteStatus, RequestCache};
use cashew_core::{CacheEntry, CacheKey, Raw};
use chrono::{DateTime, Utc};
use redis::{Client, aio::ConnectionManager};
use sha2::{Digest, Sha256};
use tokio::sync::OnceCell;
use tracing::{debug, trace};

use crate::error::Error;

const SCAN_BATCH: usize = 500;

/// Hash fields as returned by `HMGET d h s e m`.
type StoredFields = (
    Option<Vec<u8>>,
    Option<i64>,
    Option<i64>,
    Option<String>,
    Option<i64>,
);

/// Redis cache backend based on redis-rs crate.
///
/// Uses a [`ConnectionManager`] created lazily on first use.
///
/// [`ConnectionManager`]: redis::aio::ConnectionManager
#[derive(Clone)]
pub struct RedisCache {
    client: Client,
    connection: OnceCell<ConnectionManager>,
    namespace: String,
    name: String,
}

impl std::fmt::Debug for RedisCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisCache")
            .field("namespace", &self.namespace)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl RedisCache {
    /// Creates new RedisCache builder with default settings.
    #[must_use]
    pub fn builder() -> RedisCacheBuilder {
        RedisCacheBuilder::default()
    }

    /// Create lazy connection to redis via [`ConnectionManager`]
    pub async fn connection(&self) -> Result<&ConnectionManager, BackendError> {
        trace!("Get connection manager");
        let manager = self
            .connection
            .get_or_try_init(|| {
                trace!("Initialize new redis connection manager");
                self.client.get_connection_manager()
            })
            .await
            .map_err(Error::from)?;
        Ok(manager)
    }

    /// Namespace prepended to every key.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    fn redis_key(&self, key: &CacheKey) -> String {
        redis_key(&self.namespace, key)
    }
}

/// Part of builder pattern implementation for RedisCache.
#[derive(Debug, Clone)]
pub struct RedisCacheBuilder {
    connection_info: String,
    namespace: String,
    name: String,
}

impl Default for RedisCacheBuilder {
    fn default() -> Self {
        Self {
            connection_info: "redis://127.0.0.1/".to_owned(),
            namespace: "cashew".to_owned(),
            name: "redis".to_owned(),
        }
    }
}

impl RedisCacheBuilder {
    /// Set connection info (host, port, database, etc.).
    pub fn server(mut self, connection_info: impl Into<String>) -> Self {
        self.connection_info = connection_info.into();
        self
    }

    /// Set the key namespace.
    ///
    /// # Default
    ///
    /// `"cashew"`
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// Set a custom name for this backend, used in logs.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Create new instance of Redis backend with passed settings.
    ///
    /// No connection is made until the first cache operation.
    pub fn build(self) -> Result<RedisCache, Error> {
        if self.namespace.is_empty() {
            return Err(Error::EmptyNamespace);
        }
        Ok(RedisCache {
            client: Client::open(self.connection_info)?,
            connection: OnceCell::new(),
            namespace: self.namespace,
            name: self.name,
        })
    }
}

/// `namespace:` followed by a SHA-256 digest of the key. Every component is
/// length-prefixed before hashing, so keys whose rendered forms look alike
/// still get distinct digests.
fn redis_key(namespace: &str, key: &CacheKey) -> String {
    let mut hasher = Sha256::new();
    hash_field(&mut hasher, key.prefix());
    hasher.update(key.version().to_le_bytes());
    for part in key.parts() {
        hash_field(&mut hasher, part.key());
        match part.value() {
            Some(value) => {
                hasher.update([1]);
                hash_field(&mut hasher, value);
            }
            None => hasher.update([0]),
        }
    }
    format!("{namespace}:{}", hex::encode(hasher.finalize()))
}

fn hash_field(hasher: &mut Sha256, field: &str) {
    hasher.update((field.len() as u64).to_le_bytes());
    hasher.update(field.as_bytes());
}

/// `SCAN MATCH` pattern for every key in `namespace`, with glob characters escaped.
fn namespace_pattern(namespace: &str) -> String {
    let mut pattern = String::with_capacity(namespace.len() + 2);
    for ch in namespace.chars() {
        if matches!(ch, '*' | '?' | '[' | ']' | '\\') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push_str(":*");
    pattern
}

/// Rebuilds an entry from hash fields. `Err(())` marks a stale or corrupt
/// hash that must be deleted.
fn decode_entry(fields: StoredFields, now: DateTime<Utc>) -> Result<Option<CacheEntry<Raw>>, ()> {
    let (data, hard_ms, soft_ms, etag, modified_ms) = fields;
    let Some(data) = data else {
        return Ok(None);
    };
    let hard = hard_ms.and_then(DateTime::from_timestamp_millis).ok_or(())?;
    if now >= hard {
        return Err(());
    }
    let soft = soft_ms
        .and_then(DateTime::from_timestamp_millis)
        .unwrap_or(hard);
    let entry = CacheEntry::with_deadlines(Bytes::from(data), hard, soft.min(hard))
        .map_err(|_| ())?
        .with_validators(
            etag,
            modified_ms.and_then(DateTime::from_timestamp_millis),
        );
    Ok(Some(entry))
}

#[async_trait]
impl RequestCache for RedisCache {
    async fn get(&self, key: &CacheKey) -> BackendResult<Option<CacheEntry<Raw>>> {
        let mut con = self.connection().await?.clone();
        let redis_key = self.redis_key(key);

        let fields: StoredFields = redis::cmd("HMGET")
            .arg(&redis_key)
            .arg("d")
            .arg("h")
            .arg("s")
            .arg("e")
            .arg("m")
            .query_async(&mut con)
            .await
            .map_err(Error::from)?;

        match decode_entry(fields, Utc::now()) {
            Ok(entry) => Ok(entry),
            Err(()) => {
                trace!(cache_key = %key, "purging expired redis entry");
                redis::cmd("DEL")
                    .arg(&redis_key)
                    .query_async::<()>(&mut con)
                    .await
                    .map_err(Error::from)?;
                Ok(None)
            }
        }
    }

    async fn set(&self, key: &CacheKey, entry: CacheEntry<Raw>) -> BackendResult<()> {
        let mut con = self.connection().await?.clone();
        let redis_key = self.redis_key(key);
        let hard_ms = entry.hard_expire().timestamp_millis();

        // DEL first so fields of a previous entry (etag, last-modified) do not survive.
        let mut hset = redis::cmd("HSET");
        hset.arg(&redis_key)
            .arg("d")
            .arg(entry.value().as_ref())
            .arg("h")
            .arg(hard_ms)
            .arg("s")
            .arg(entry.soft_expire().timestamp_millis());
        if let Some(etag) = entry.etag() {
            hset.arg("e").arg(etag);
        }
        if let Some(modified) = entry.last_modified() {
            hset.arg("m").arg(modified.timestamp_millis());
        }

        let mut pipe = redis::pipe();
        pipe.atomic()
            .cmd("DEL")
            .arg(&redis_key)
            .ignore()
            .add_command(hset)
            .ignore()
            .cmd("PEXPIREAT")
            .arg(&redis_key)
            .arg(hard_ms)
            .ignore();

        pipe.query_async::<()>(&mut con)
            .await
            .map_err(Error::from)?;
        Ok(())
    }

    async fn remove(&self, key: &CacheKey) -> BackendResult<DeleteStatus> {
        let mut con = self.connection().await?.clone();

        let deleted: i32 = redis::cmd("DEL")
            .arg(self.redis_key(key))
            .query_async(&mut con)
            .await
            .map_err(Error::from)?;

        if deleted > 0 {
            Ok(DeleteStatus::Deleted(deleted as u32))
        } else {
            Ok(DeleteStatus::Missing)
        }
    }

    async fn clear(&self) -> BackendResult<()> {
        let mut con = self.connection().await?.clone();
        let pattern = namespace_pattern(&self.namespace);
        let mut cursor: u64 = 0;
        let mut removed = 0usize;
        loop {
            let (next, keys): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg(SCAN_BATCH)
                .query_async(&mut con)
                .await
                .map_err(Error::from)?;
            if !keys.is_empty() {
                removed += keys.len();
                redis::cmd("DEL")
                    .arg(&keys)
                    .query_async::<()>(&mut con)
                    .await
                    .map_err(Error::from)?;
            }
            if next == 0 {
                break;
            }
            cursor = next;
        }
        debug!(namespace = %self.namespace, removed, "cleared redis namespace");
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }
}
