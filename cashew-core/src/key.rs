//! Cache key types and construction.
//!
//! - [`CacheKey`] - The complete cache key with prefix, version, and parts
//! - [`KeyPart`] - A single key-value component of a cache key
//! - [`KeyParts`] - Builder for accumulating key parts
//!
//! ## Format
//!
//! Keys render as `{prefix}:v{version}:key1=value1&key2=value2`.
//! The prefix is omitted if empty and the version is omitted if zero.
//!
//! ```
//! use cashew_core::{CacheKey, KeyPart};
//!
//! let key = CacheKey::new("api", 1, vec![KeyPart::new("id", Some("42"))]);
//! assert_eq!(format!("{}", key), "api:v1:id=42");
//!
//! let key = CacheKey::new("", 0, vec![
//!     KeyPart::new("method", Some("GET")),
//!     KeyPart::new("body", None::<&str>),
//! ]);
//! assert_eq!(format!("{}", key), "method=GET&body");
//! ```
//!
//! Two keys are equal exactly when prefix, version and every part match in
//! order. Producers are responsible for a deterministic part order.

use smol_str::SmolStr;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

// SmolStr keeps strings up to this length inline.
const INLINE_CAP: usize = 23;

#[derive(Clone, Debug, Eq, PartialEq, Hash, serde::Serialize)]
struct CacheKeyInner {
    parts: Vec<KeyPart>,
    version: u32,
    prefix: SmolStr,
    #[serde(skip)]
    content_size: usize,
}

impl CacheKeyInner {
    fn new(prefix: SmolStr, version: u32, parts: Vec<KeyPart>) -> Self {
        let heap_size = |len: usize| len.saturating_sub(INLINE_CAP);
        let content_size = heap_size(prefix.len())
            + parts
                .iter()
                .map(|p| heap_size(p.key().len()) + p.value().map_or(0, |v| heap_size(v.len())))
                .sum::<usize>();
        CacheKeyInner {
            parts,
            version,
            prefix,
            content_size,
        }
    }
}

/// Identity of a cached entry.
///
/// `CacheKey` wraps its data in [`Arc`], so `clone()` only bumps a reference
/// count. Keys are cloned into the refresh registry, background tasks and
/// storage calls, so this matters.
///
/// ```
/// use cashew_core::{CacheKey, KeyPart};
///
/// let key = CacheKey::new(
///     "cashew",
///     1,
///     vec![
///         KeyPart::new("method", Some("GET")),
///         KeyPart::new("path", Some("/users/123")),
///     ],
/// );
///
/// assert_eq!(key.prefix(), "cashew");
/// assert_eq!(key.version(), 1);
/// assert_eq!(format!("{}", key), "cashew:v1:method=GET&path=/users/123");
/// ```
#[derive(Clone, Debug, serde::Serialize)]
#[serde(into = "CacheKeyInner")]
pub struct CacheKey {
    inner: Arc<CacheKeyInner>,
}

impl PartialEq for CacheKey {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner) || self.inner == other.inner
    }
}

impl Eq for CacheKey {}

impl Hash for CacheKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.inner.hash(state);
    }
}

impl From<CacheKey> for CacheKeyInner {
    fn from(key: CacheKey) -> Self {
        Arc::try_unwrap(key.inner).unwrap_or_else(|arc| (*arc).clone())
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.inner.prefix.is_empty() {
            write!(f, "{}:", self.inner.prefix)?;
        }
        if self.inner.version > 0 {
            write!(f, "v{}:", self.inner.version)?;
        }
        for (i, part) in self.inner.parts.iter().enumerate() {
            if i > 0 {
                write!(f, "&")?;
            }
            write!(f, "{}", part)?;
        }
        Ok(())
    }
}

impl CacheKey {
    /// Creates a new cache key with the given components.
    pub fn new(prefix: impl Into<SmolStr>, version: u32, parts: Vec<KeyPart>) -> Self {
        CacheKey {
            inner: Arc::new(CacheKeyInner::new(prefix.into(), version, parts)),
        }
    }

    /// Creates a key with a single key-value part, no prefix and version 0.
    pub fn from_str(key: &str, value: &str) -> Self {
        Self::new(SmolStr::default(), 0, vec![KeyPart::new(key, Some(value))])
    }

    /// Creates a key from key-value pairs, no prefix and version 0.
    pub fn from_slice(parts: &[(&str, Option<&str>)]) -> Self {
        let parts = parts
            .iter()
            .map(|(key, value)| KeyPart::new(key, *value))
            .collect();
        Self::new(SmolStr::default(), 0, parts)
    }

    pub fn parts(&self) -> impl Iterator<Item = &KeyPart> {
        self.inner.parts.iter()
    }

    pub fn version(&self) -> u32 {
        self.inner.version
    }

    pub fn prefix(&self) -> &str {
        &self.inner.prefix
    }

    /// Estimated memory usage of this key in bytes.
    ///
    /// Counts the `Arc` allocation, the parts vector and heap-allocated strings.
    pub fn memory_size(&self) -> usize {
        use std::mem::size_of;

        let arc_overhead = 2 * size_of::<usize>() + size_of::<CacheKeyInner>();
        let vec_overhead = self.inner.parts.len() * size_of::<KeyPart>();
        arc_overhead + vec_overhead + self.inner.content_size
    }
}

/// A single `key[=value]` component of a cache key.
///
/// ```
/// use cashew_core::KeyPart;
///
/// let method = KeyPart::new("method", Some("GET"));
/// assert_eq!(method.key(), "method");
/// assert_eq!(method.value(), Some("GET"));
///
/// let flag = KeyPart::new("gzip", None::<&str>);
/// assert_eq!(flag.value(), None);
/// ```
#[derive(Clone, Debug, Eq, PartialEq, Hash, serde::Serialize, serde::Deserialize)]
pub struct KeyPart {
    key: SmolStr,
    value: Option<SmolStr>,
}

impl fmt::Display for KeyPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key)?;
        if let Some(ref value) = self.value {
            write!(f, "={}", value)?;
        }
        Ok(())
    }
}

impl KeyPart {
    pub fn new<K: AsRef<str>, V: AsRef<str>>(key: K, value: Option<V>) -> Self {
        KeyPart {
            key: SmolStr::new(key),
            value: value.map(SmolStr::new),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }
}

/// Accumulates key parts before producing a [`CacheKey`].
///
/// ```
/// use cashew_core::KeyParts;
///
/// let key = KeyParts::default()
///     .push("method", Some("GET"))
///     .push("path", Some("/"))
///     .into_cache_key("cashew", 1);
/// assert_eq!(key.to_string(), "cashew:v1:method=GET&path=/");
/// ```
#[derive(Debug, Default, Clone)]
pub struct KeyParts {
    parts: Vec<KeyPart>,
}

impl KeyParts {
    /// Appends a single part.
    pub fn push<K: AsRef<str>, V: AsRef<str>>(mut self, key: K, value: Option<V>) -> Self {
        self.parts.push(KeyPart::new(key, value));
        self
    }

    /// Appends many parts preserving iteration order.
    pub fn extend<I>(mut self, parts: I) -> Self
    where
        I: IntoIterator<Item = KeyPart>,
    {
        self.parts.extend(parts);
        self
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    pub fn into_cache_key(self, prefix: impl Into<SmolStr>, version: u32) -> CacheKey {
        CacheKey::new(prefix, version, self.parts)
    }
}
