//! Cached entry type with hard and soft expiration.
//!
//! A [`CacheEntry`] wraps a cached value together with two deadlines:
//!
//! - **Soft expiry** - after this moment the value is stale. It is still a valid
//!   fallback, but a refresh against the origin should be attempted.
//! - **Hard expiry** - after this moment the value must never be served. Storage
//!   backends treat hard-expired entries as absent.
//!
//! Entries optionally carry origin validators (`ETag` and `Last-Modified`) that
//! allow a conditional revalidation instead of a full refetch.
//!
//! ## Cache States
//!
//! [`CacheEntry::state`] evaluates both deadlines against the current time:
//!
//! - [`CacheState::Actual`] - neither soft nor hard expired
//! - [`CacheState::Stale`] - soft expired, not hard expired
//! - [`CacheState::Expired`] - hard expired
//!
//! ```
//! use cashew_core::{CacheEntry, CacheState};
//! use std::time::Duration;
//!
//! let entry = CacheEntry::new("payload", Duration::from_secs(60), Duration::from_secs(10)).unwrap();
//!
//! match entry.state() {
//!     CacheState::Actual(e) => println!("fresh: {}", e.value()),
//!     CacheState::Stale(e) => println!("stale, refresh: {}", e.value()),
//!     CacheState::Expired(_) => println!("gone"),
//! }
//! ```

use std::mem::size_of;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::Raw;

/// Errors raised when constructing a [`CacheEntry`] with inconsistent deadlines.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EntryError {
    /// The soft deadline lies after the hard deadline.
    #[error("soft expiry {soft} must not be after hard expiry {hard}")]
    SoftAfterHard {
        /// Requested hard expiry.
        hard: DateTime<Utc>,
        /// Requested soft expiry.
        soft: DateTime<Utc>,
    },
    /// A TTL does not fit into a timestamp.
    #[error("ttl of {0:?} is out of range")]
    TtlOutOfRange(Duration),
}

/// Freshness state of a cache entry.
#[derive(Debug, PartialEq, Eq)]
pub enum CacheState<T> {
    /// Entry is fresh.
    Actual(T),
    /// Entry is soft expired but still servable as a fallback.
    Stale(T),
    /// Entry is hard expired and must not be served.
    Expired(T),
}

/// Immutable snapshot of a cached value and its lifecycle metadata.
///
/// Invariant: `soft_expire <= hard_expire`. The only way to change an entry is
/// to build a new one and store it under the same key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry<V> {
    value: V,
    hard_expire: DateTime<Utc>,
    soft_expire: DateTime<Utc>,
    etag: Option<String>,
    last_modified: Option<DateTime<Utc>>,
}

impl<V> CacheEntry<V> {
    /// Creates an entry expiring `hard_ttl` / `soft_ttl` from now.
    pub fn new(value: V, hard_ttl: Duration, soft_ttl: Duration) -> Result<Self, EntryError> {
        let now = Utc::now();
        Self::with_deadlines(value, deadline(now, hard_ttl)?, deadline(now, soft_ttl)?)
    }

    /// Creates an entry with absolute deadlines.
    pub fn with_deadlines(
        value: V,
        hard_expire: DateTime<Utc>,
        soft_expire: DateTime<Utc>,
    ) -> Result<Self, EntryError> {
        if soft_expire > hard_expire {
            return Err(EntryError::SoftAfterHard {
                hard: hard_expire,
                soft: soft_expire,
            });
        }
        Ok(CacheEntry {
            value,
            hard_expire,
            soft_expire,
            etag: None,
            last_modified: None,
        })
    }

    /// Attaches origin validators to the entry.
    pub fn with_validators(
        mut self,
        etag: Option<String>,
        last_modified: Option<DateTime<Utc>>,
    ) -> Self {
        self.etag = etag;
        self.last_modified = last_modified;
        self
    }

    /// Returns a reference to the cached value.
    #[inline]
    pub fn value(&self) -> &V {
        &self.value
    }

    /// Consumes the entry and returns the cached value.
    pub fn into_value(self) -> V {
        self.value
    }

    #[inline]
    pub fn hard_expire(&self) -> DateTime<Utc> {
        self.hard_expire
    }

    #[inline]
    pub fn soft_expire(&self) -> DateTime<Utc> {
        self.soft_expire
    }

    /// Origin entity tag, if the origin sent one.
    pub fn etag(&self) -> Option<&str> {
        self.etag.as_deref()
    }

    /// Origin `Last-Modified` timestamp, if known.
    pub fn last_modified(&self) -> Option<DateTime<Utc>> {
        self.last_modified
    }

    /// Whether the entry carries any validator usable for a conditional request.
    pub fn has_validators(&self) -> bool {
        self.etag.is_some() || self.last_modified.is_some()
    }

    pub fn is_soft_expired(&self) -> bool {
        Utc::now() >= self.soft_expire
    }

    pub fn is_hard_expired(&self) -> bool {
        Utc::now() >= self.hard_expire
    }

    /// Remaining time until hard expiry, `None` once hard expired.
    pub fn ttl(&self) -> Option<Duration> {
        (self.hard_expire - Utc::now())
            .to_std()
            .ok()
            .filter(|ttl| !ttl.is_zero())
    }

    /// Classifies the entry against the current time.
    pub fn state(self) -> CacheState<Self> {
        let now = Utc::now();
        if now >= self.hard_expire {
            CacheState::Expired(self)
        } else if now >= self.soft_expire {
            CacheState::Stale(self)
        } else {
            CacheState::Actual(self)
        }
    }

    /// Replaces the value while keeping deadlines and validators.
    ///
    /// Used by storage layers to move between raw and typed representations.
    pub fn map<U, F>(self, f: F) -> CacheEntry<U>
    where
        F: FnOnce(V) -> U,
    {
        CacheEntry {
            value: f(self.value),
            hard_expire: self.hard_expire,
            soft_expire: self.soft_expire,
            etag: self.etag,
            last_modified: self.last_modified,
        }
    }

    /// Builds an entry holding `value` with the same deadlines and validators.
    pub fn with_value<U>(&self, value: U) -> CacheEntry<U> {
        CacheEntry {
            value,
            hard_expire: self.hard_expire,
            soft_expire: self.soft_expire,
            etag: self.etag.clone(),
            last_modified: self.last_modified,
        }
    }

    /// Fallible variant of [`map`](Self::map).
    pub fn try_map<U, E, F>(self, f: F) -> Result<CacheEntry<U>, E>
    where
        F: FnOnce(V) -> Result<U, E>,
    {
        Ok(CacheEntry {
            value: f(self.value)?,
            hard_expire: self.hard_expire,
            soft_expire: self.soft_expire,
            etag: self.etag,
            last_modified: self.last_modified,
        })
    }
}

impl CacheEntry<Raw> {
    /// Estimated memory footprint of a raw entry in bytes.
    pub fn memory_size(&self) -> usize {
        size_of::<Self>()
            + self.value.len()
            + self.etag.as_ref().map_or(0, String::len)
    }
}

fn deadline(now: DateTime<Utc>, ttl: Duration) -> Result<DateTime<Utc>, EntryError> {
    chrono::Duration::from_std(ttl)
        .ok()
        .and_then(|delta| now.checked_add_signed(delta))
        .ok_or(EntryError::TtlOutOfRange(ttl))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_entry_is_actual() {
        let entry = CacheEntry::new(1u8, Duration::from_secs(2), Duration::from_secs(1)).unwrap();
        assert!(!entry.is_soft_expired());
        assert!(!entry.is_hard_expired());
        assert!(matches!(entry.state(), CacheState::Actual(_)));
    }

    #[test]
    fn soft_after_hard_is_rejected() {
        let result = CacheEntry::new((), Duration::from_secs(1), Duration::from_secs(2));
        assert!(matches!(result, Err(EntryError::SoftAfterHard { .. })));
    }

    #[test]
    fn equal_deadlines_are_allowed() {
        let now = Utc::now();
        assert!(CacheEntry::with_deadlines((), now, now).is_ok());
    }

    #[test]
    fn past_soft_deadline_is_stale() {
        let now = Utc::now();
        let entry = CacheEntry::with_deadlines(
            "v",
            now + chrono::Duration::seconds(30),
            now - chrono::Duration::seconds(1),
        )
        .unwrap();
        assert!(entry.is_soft_expired());
        assert!(!entry.is_hard_expired());
        assert!(matches!(entry.state(), CacheState::Stale(_)));
    }

    #[test]
    fn past_hard_deadline_is_expired() {
        let past = Utc::now() - chrono::Duration::seconds(1);
        let entry = CacheEntry::with_deadlines("v", past, past).unwrap();
        assert!(entry.is_hard_expired());
        assert_eq!(entry.ttl(), None);
        assert!(matches!(entry.state(), CacheState::Expired(_)));
    }

    #[test]
    fn map_keeps_metadata() {
        let modified = Utc::now();
        let entry = CacheEntry::new(2u32, Duration::from_secs(10), Duration::from_secs(5))
            .unwrap()
            .with_validators(Some("\"abc\"".to_owned()), Some(modified));
        let hard = entry.hard_expire();
        let mapped = entry.map(|v| v.to_string());
        assert_eq!(mapped.value(), "2");
        assert_eq!(mapped.hard_expire(), hard);
        assert_eq!(mapped.etag(), Some("\"abc\""));
        assert_eq!(mapped.last_modified(), Some(modified));
        assert!(mapped.has_validators());
    }
}
