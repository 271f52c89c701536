//! Header-driven cache policy.
//!
//! [`HeaderPolicy`] reads `Cache-Control`, `Expires`, `Age`, `ETag`,
//! `Last-Modified` and `Date` from an origin response and decides whether it
//! may be cached and for how long. Only `ETag` and `Last-Modified` count as
//! validators; `Date` is used solely to anchor `Expires`.
//!
//! ## Deadlines
//!
//! - **soft** is the end of the freshness lifetime: `max-age` (minus `Age`),
//!   otherwise `Expires` (relative to `Date`).
//! - **hard** extends soft by the stale window: the larger of
//!   `stale-while-revalidate` / `stale-if-error`, or the configured
//!   default when neither is sent. `must-revalidate` disables the extension.
//! - With a validator the entry is kept at least `validator_ttl` past soft,
//!   so it can be revalidated with a conditional request instead of refetched.
//! - `no-cache` makes the entry immediately stale (soft = now).
//!
//! A response is not cacheable when it is not `2xx`, carries `no-store`,
//! or has neither a freshness lifetime nor a validator.

use std::time::Duration;

use cashew_core::{CacheEntry, CachePolicy, EntryError};
use chrono::{DateTime, Utc};
use http::{HeaderMap, header};
use serde::{Deserialize, Serialize};

use crate::response::HttpResponse;

/// Lifetime and validators computed for a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Freshness {
    pub hard_expire: DateTime<Utc>,
    pub soft_expire: DateTime<Utc>,
    pub etag: Option<String>,
    pub last_modified: Option<DateTime<Utc>>,
}

impl Freshness {
    /// Wraps `value` into an entry carrying these deadlines and validators.
    pub fn into_entry<V>(self, value: V) -> Result<CacheEntry<V>, EntryError> {
        Ok(
            CacheEntry::with_deadlines(value, self.hard_expire, self.soft_expire)?
                .with_validators(self.etag, self.last_modified),
        )
    }
}

/// Decides whether an origin response may be cached.
pub trait ResponsePolicy: Send + Sync {
    /// Returns the entry lifetime, or `NonCacheable` when the response must
    /// not be stored.
    fn resolve(&self, response: &HttpResponse) -> CachePolicy<Freshness, ()>;
}

/// Cache policy derived from standard HTTP caching headers.
///
/// ```
/// use std::time::Duration;
/// use cashew_http::HeaderPolicy;
///
/// let policy: HeaderPolicy = serde_saphyr::from_str("
/// stale_window: 30s
/// validator_ttl: 1h
/// ").unwrap();
/// assert_eq!(policy.stale_window, Duration::from_secs(30));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeaderPolicy {
    /// Stale extension used when the origin sends no `stale-*` directive.
    #[serde(with = "humantime_serde")]
    pub stale_window: Duration,
    /// How long past soft expiry an entry with a validator is kept.
    #[serde(with = "humantime_serde")]
    pub validator_ttl: Duration,
}

impl Default for HeaderPolicy {
    fn default() -> Self {
        HeaderPolicy {
            stale_window: Duration::ZERO,
            validator_ttl: Duration::from_secs(600),
        }
    }
}

impl ResponsePolicy for HeaderPolicy {
    fn resolve(&self, response: &HttpResponse) -> CachePolicy<Freshness, ()> {
        if !response.is_success() {
            return CachePolicy::NonCacheable(());
        }
        match self.freshness(response.headers(), Utc::now()) {
            Some(freshness) => CachePolicy::Cacheable(freshness),
            None => CachePolicy::NonCacheable(()),
        }
    }
}

impl HeaderPolicy {
    /// Computes deadlines for `headers` as of `now`.
    pub fn freshness(&self, headers: &HeaderMap, now: DateTime<Utc>) -> Option<Freshness> {
        let directives = CacheControl::parse(headers);
        if directives.no_store {
            return None;
        }

        let etag = header_str(headers, header::ETAG).map(str::to_owned);
        let last_modified = header_date(headers, header::LAST_MODIFIED);
        let has_validator = etag.is_some() || last_modified.is_some();

        let lifetime = if directives.no_cache {
            Some(chrono::Duration::zero())
        } else if let Some(max_age) = directives.max_age {
            let age = header_str(headers, header::AGE)
                .and_then(|age| age.trim().parse::<i64>().ok())
                .unwrap_or(0);
            chrono::Duration::try_seconds(max_age.saturating_sub(age).max(0))
        } else {
            expires_lifetime(headers)
        };

        let (soft, hard) = match lifetime {
            Some(lifetime) => {
                let soft = later(now, lifetime);
                let stale = if directives.must_revalidate {
                    Duration::ZERO
                } else {
                    directives.stale_extension().unwrap_or(self.stale_window)
                };
                let mut hard = later(soft, to_chrono(stale));
                if has_validator {
                    hard = hard.max(later(soft, to_chrono(self.validator_ttl)));
                }
                (soft, hard)
            }
            None if has_validator => (now, later(now, to_chrono(self.validator_ttl))),
            None => return None,
        };

        if hard <= now {
            return None;
        }

        Some(Freshness {
            hard_expire: hard,
            soft_expire: soft,
            etag,
            last_modified,
        })
    }
}

#[derive(Debug, Default)]
struct CacheControl {
    no_store: bool,
    no_cache: bool,
    must_revalidate: bool,
    max_age: Option<i64>,
    stale_while_revalidate: Option<u64>,
    stale_if_error: Option<u64>,
}

impl CacheControl {
    fn parse(headers: &HeaderMap) -> Self {
        let mut cc = CacheControl::default();
        for value in headers.get_all(header::CACHE_CONTROL) {
            let Ok(value) = value.to_str() else {
                continue;
            };
            for directive in value.split(',') {
                let directive = directive.trim();
                let (name, arg) = match directive.split_once('=') {
                    Some((name, arg)) => (name.trim(), Some(arg.trim().trim_matches('"'))),
                    None => (directive, None),
                };
                match name.to_ascii_lowercase().as_str() {
                    "no-store" => cc.no_store = true,
                    "no-cache" => cc.no_cache = true,
                    "must-revalidate" => cc.must_revalidate = true,
                    "max-age" => cc.max_age = arg.and_then(|a| a.parse().ok()),
                    "stale-while-revalidate" => {
                        cc.stale_while_revalidate = arg.and_then(|a| a.parse().ok())
                    }
                    "stale-if-error" => cc.stale_if_error = arg.and_then(|a| a.parse().ok()),
                    _ => {}
                }
            }
        }
        cc
    }

    fn stale_extension(&self) -> Option<Duration> {
        self.stale_while_revalidate
            .into_iter()
            .chain(self.stale_if_error)
            .max()
            .map(Duration::from_secs)
    }
}

fn header_str(headers: &HeaderMap, name: header::HeaderName) -> Option<&str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

pub(crate) fn header_date(headers: &HeaderMap, name: header::HeaderName) -> Option<DateTime<Utc>> {
    header_str(headers, name)
        .and_then(|v| httpdate::parse_http_date(v).ok())
        .map(DateTime::<Utc>::from)
}

/// Freshness lifetime from `Expires`, measured against `Date` when present.
///
/// An unparsable `Expires` means "already expired".
fn expires_lifetime(headers: &HeaderMap) -> Option<chrono::Duration> {
    let raw = header_str(headers, header::EXPIRES)?;
    let Ok(expires) = httpdate::parse_http_date(raw) else {
        return Some(chrono::Duration::zero());
    };
    let expires = DateTime::<Utc>::from(expires);
    let date = header_date(headers, header::DATE).unwrap_or_else(Utc::now);
    Some((expires - date).max(chrono::Duration::zero()))
}

fn later(at: DateTime<Utc>, by: chrono::Duration) -> DateTime<Utc> {
    at.checked_add_signed(by).unwrap_or(DateTime::<Utc>::MAX_UTC)
}

fn to_chrono(duration: Duration) -> chrono::Duration {
    chrono::Duration::from_std(duration).unwrap_or(chrono::Duration::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;
    use std::time::SystemTime;

    fn headers(pairs: &[(&'static str, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.append(*name, HeaderValue::from_str(value).unwrap());
        }
        map
    }

    fn policy() -> HeaderPolicy {
        HeaderPolicy {
            stale_window: Duration::from_secs(5),
            validator_ttl: Duration::from_secs(60),
        }
    }

    #[test]
    fn no_store_is_not_cacheable() {
        let h = headers(&[("cache-control", "no-store, max-age=60"), ("etag", "\"a\"")]);
        assert_eq!(policy().freshness(&h, Utc::now()), None);
    }

    #[test]
    fn no_freshness_no_validators_is_not_cacheable() {
        assert_eq!(policy().freshness(&HeaderMap::new(), Utc::now()), None);
    }

    #[test]
    fn max_age_sets_soft_and_default_stale_window() {
        let now = Utc::now();
        let f = policy()
            .freshness(&headers(&[("cache-control", "public, max-age=60")]), now)
            .unwrap();
        assert_eq!(f.soft_expire, now + chrono::Duration::seconds(60));
        assert_eq!(f.hard_expire, now + chrono::Duration::seconds(65));
        assert_eq!(f.etag, None);
    }

    #[test]
    fn age_is_subtracted() {
        let now = Utc::now();
        let f = policy()
            .freshness(&headers(&[("cache-control", "max-age=60"), ("age", "50")]), now)
            .unwrap();
        assert_eq!(f.soft_expire, now + chrono::Duration::seconds(10));
    }

    #[test]
    fn stale_directives_override_window() {
        let now = Utc::now();
        let f = policy()
            .freshness(
                &headers(&[(
                    "cache-control",
                    "max-age=10, stale-while-revalidate=30, stale-if-error=120",
                )]),
                now,
            )
            .unwrap();
        assert_eq!(f.hard_expire, now + chrono::Duration::seconds(130));
    }

    #[test]
    fn must_revalidate_disables_stale_window() {
        let now = Utc::now();
        let f = policy()
            .freshness(&headers(&[("cache-control", "max-age=10, must-revalidate")]), now)
            .unwrap();
        assert_eq!(f.hard_expire, f.soft_expire);
    }

    #[test]
    fn etag_only_is_kept_for_revalidation() {
        let now = Utc::now();
        let f = policy()
            .freshness(&headers(&[("etag", "\"abc\"")]), now)
            .unwrap();
        assert_eq!(f.soft_expire, now);
        assert_eq!(f.hard_expire, now + chrono::Duration::seconds(60));
        assert_eq!(f.etag.as_deref(), Some("\"abc\""));
    }

    #[test]
    fn validator_extends_short_lifetime() {
        let now = Utc::now();
        let f = policy()
            .freshness(&headers(&[("cache-control", "max-age=1"), ("etag", "\"v\"")]), now)
            .unwrap();
        assert_eq!(f.soft_expire, now + chrono::Duration::seconds(1));
        assert_eq!(f.hard_expire, now + chrono::Duration::seconds(61));
    }

    #[test]
    fn no_cache_is_immediately_stale() {
        let now = Utc::now();
        let f = policy()
            .freshness(&headers(&[("cache-control", "no-cache"), ("etag", "\"v\"")]), now)
            .unwrap();
        assert_eq!(f.soft_expire, now);
        assert!(f.hard_expire > now);
    }

    #[test]
    fn expires_relative_to_date() {
        let date = SystemTime::now();
        let expires = date + Duration::from_secs(120);
        let h = headers(&[
            ("date", &httpdate::fmt_http_date(date)),
            ("expires", &httpdate::fmt_http_date(expires)),
        ]);
        let now = Utc::now();
        let f = policy().freshness(&h, now).unwrap();
        assert_eq!(f.soft_expire, now + chrono::Duration::seconds(120));
        assert_eq!(f.last_modified, None);
    }

    #[test]
    fn date_alone_is_not_a_validator() {
        let h = headers(&[("date", &httpdate::fmt_http_date(SystemTime::now()))]);
        assert_eq!(policy().freshness(&h, Utc::now()), None);
    }

    #[test]
    fn last_modified_is_kept_for_revalidation() {
        let modified = SystemTime::now() - Duration::from_secs(3600);
        let h = headers(&[
            ("date", &httpdate::fmt_http_date(SystemTime::now())),
            ("last-modified", &httpdate::fmt_http_date(modified)),
        ]);
        let f = policy().freshness(&h, Utc::now()).unwrap();
        assert!(f.last_modified.is_some());
    }

    #[test]
    fn invalid_expires_without_validator_is_not_cacheable() {
        let h = headers(&[("expires", "0")]);
        let strict = HeaderPolicy {
            stale_window: Duration::ZERO,
            ..policy()
        };
        assert_eq!(strict.freshness(&h, Utc::now()), None);
    }

    #[test]
    fn error_status_is_not_cacheable() {
        let response = HttpResponse::new(
            http::StatusCode::INTERNAL_SERVER_ERROR,
            headers(&[("cache-control", "max-age=60")]),
            "boom",
        );
        assert!(!policy().resolve(&response).is_cacheable());
    }

    #[test]
    fn freshness_into_entry() {
        let now = Utc::now();
        let freshness = Freshness {
            hard_expire: now + chrono::Duration::seconds(10),
            soft_expire: now + chrono::Duration::seconds(5),
            etag: Some("\"v\"".to_owned()),
            last_modified: None,
        };
        let entry = freshness.clone().into_entry("v").unwrap();
        assert_eq!(entry.soft_expire(), freshness.soft_expire);
        assert_eq!(entry.etag(), Some("\"v\""));

        let backwards = Freshness {
            soft_expire: freshness.hard_expire,
            hard_expire: freshness.soft_expire,
            ..freshness
        };
        assert!(backwards.into_entry("v").is_err());
    }
}
