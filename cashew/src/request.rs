//! Per-call caching parameters.

use std::sync::Arc;
use std::time::Duration;

use cashew_http::HttpRequest;
use serde::{Deserialize, Serialize};

use crate::error::CacheError;

const MIN_TTL: Duration = Duration::from_secs(1);

/// Validated, whole-second lifetime of a cached value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Ttl {
    pub(crate) hard: Duration,
    pub(crate) soft: Duration,
}

impl Ttl {
    /// Truncates both TTLs to whole seconds and checks `hard >= soft >= 1s`.
    pub(crate) fn new(hard: Duration, soft: Duration) -> Result<Self, CacheError> {
        let hard = Duration::from_secs(hard.as_secs());
        let soft = Duration::from_secs(soft.as_secs());
        if soft < MIN_TTL || hard < soft {
            return Err(CacheError::InvalidTtl { hard, soft });
        }
        Ok(Ttl { hard, soft })
    }
}

/// A request with caller-chosen TTLs for the response flavor.
///
/// ```
/// use cashew::CachingRequest;
/// use cashew_http::HttpRequest;
/// use std::time::Duration;
///
/// let request = CachingRequest::new(
///     HttpRequest::get("/rates"),
///     Duration::from_secs(600),
///     Duration::from_millis(60_500),
/// )
/// .unwrap()
/// .async_update(true);
///
/// assert_eq!(request.soft_ttl(), Duration::from_secs(60));
/// assert!(CachingRequest::new(HttpRequest::get("/"), Duration::from_secs(1), Duration::from_secs(2)).is_err());
/// ```
#[derive(Debug, Clone)]
pub struct CachingRequest {
    request: HttpRequest,
    ttl: Ttl,
    async_update: bool,
}

impl CachingRequest {
    pub fn new(request: HttpRequest, hard_ttl: Duration, soft_ttl: Duration) -> Result<Self, CacheError> {
        Ok(CachingRequest {
            request,
            ttl: Ttl::new(hard_ttl, soft_ttl)?,
            async_update: false,
        })
    }

    /// Serve soft-expired entries immediately and refresh them in the
    /// background. Requires an offload manager on the engine.
    pub fn async_update(mut self, enabled: bool) -> Self {
        self.async_update = enabled;
        self
    }

    pub fn request(&self) -> &HttpRequest {
        &self.request
    }

    pub fn hard_ttl(&self) -> Duration {
        self.ttl.hard
    }

    pub fn soft_ttl(&self) -> Duration {
        self.ttl.soft
    }

    pub fn is_async_update(&self) -> bool {
        self.async_update
    }

    pub(crate) fn ttl(&self) -> Ttl {
        self.ttl
    }
}

/// A request plus the extractor whose output is cached.
#[derive(Debug)]
pub struct CachingExtractorRequest<E> {
    request: HttpRequest,
    extractor: Arc<E>,
    ttl: Ttl,
    async_update: bool,
}

impl<E> Clone for CachingExtractorRequest<E> {
    fn clone(&self) -> Self {
        CachingExtractorRequest {
            request: self.request.clone(),
            extractor: self.extractor.clone(),
            ttl: self.ttl,
            async_update: self.async_update,
        }
    }
}

impl<E> CachingExtractorRequest<E> {
    pub fn new(
        request: HttpRequest,
        extractor: E,
        hard_ttl: Duration,
        soft_ttl: Duration,
    ) -> Result<Self, CacheError> {
        Ok(CachingExtractorRequest {
            request,
            extractor: Arc::new(extractor),
            ttl: Ttl::new(hard_ttl, soft_ttl)?,
            async_update: false,
        })
    }

    /// See [`CachingRequest::async_update`].
    pub fn async_update(mut self, enabled: bool) -> Self {
        self.async_update = enabled;
        self
    }

    pub fn request(&self) -> &HttpRequest {
        &self.request
    }

    pub fn extractor(&self) -> &E {
        &self.extractor
    }

    pub fn hard_ttl(&self) -> Duration {
        self.ttl.hard
    }

    pub fn soft_ttl(&self) -> Duration {
        self.ttl.soft
    }

    pub fn is_async_update(&self) -> bool {
        self.async_update
    }

    pub(crate) fn shared_extractor(&self) -> Arc<E> {
        self.extractor.clone()
    }

    pub(crate) fn ttl(&self) -> Ttl {
        self.ttl
    }
}

/// TTL settings loadable from configuration files.
///
/// ```
/// use cashew::TtlConfig;
/// use std::time::Duration;
///
/// let config: TtlConfig = serde_saphyr::from_str("
/// hard: 1h
/// soft: 5m
/// async_update: true
/// ").unwrap();
/// assert_eq!(config.soft, Duration::from_secs(300));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TtlConfig {
    #[serde(with = "humantime_serde")]
    pub hard: Duration,
    #[serde(with = "humantime_serde")]
    pub soft: Duration,
    #[serde(default)]
    pub async_update: bool,
}

impl TtlConfig {
    pub fn caching_request(&self, request: HttpRequest) -> Result<CachingRequest, CacheError> {
        Ok(CachingRequest::new(request, self.hard, self.soft)?.async_update(self.async_update))
    }

    pub fn extractor_request<E>(
        &self,
        request: HttpRequest,
        extractor: E,
    ) -> Result<CachingExtractorRequest<E>, CacheError> {
        Ok(
            CachingExtractorRequest::new(request, extractor, self.hard, self.soft)?
                .async_update(self.async_update),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ttls_are_truncated_to_seconds() {
        let ttl = Ttl::new(Duration::from_millis(2_999), Duration::from_millis(1_001)).unwrap();
        assert_eq!(ttl.hard, Duration::from_secs(2));
        assert_eq!(ttl.soft, Duration::from_secs(1));
    }

    #[test]
    fn sub_second_soft_ttl_is_rejected() {
        assert!(matches!(
            Ttl::new(Duration::from_secs(5), Duration::from_millis(999)),
            Err(CacheError::InvalidTtl { .. })
        ));
    }

    #[test]
    fn hard_below_soft_is_rejected() {
        assert!(Ttl::new(Duration::from_secs(1), Duration::from_secs(2)).is_err());
        assert!(Ttl::new(Duration::from_secs(2), Duration::from_secs(2)).is_ok());
    }

    #[test]
    fn config_builds_request() {
        let config = TtlConfig {
            hard: Duration::from_secs(10),
            soft: Duration::from_secs(20),
            async_update: false,
        };
        assert!(config.caching_request(HttpRequest::get("/")).is_err());
    }
}
