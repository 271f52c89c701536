//! The decision algorithm shared by both caching flavors.
//!
//! For one key the engine looks the entry up and then:
//!
//! 1. absent - fetch, store, return ([`CacheStatus::Miss`])
//! 2. fresh - return it without touching the origin ([`CacheStatus::Hit`])
//! 3. soft-expired - refresh, unless another refresh for the key is running:
//!    - synchronously, returning the new value, or the stale one when the
//!      refresh fails
//!    - in the background when `async_update` is set, returning the stale
//!      value right away
//!
//! Refreshes of entries that carry validators are sent as conditional
//! requests; a `304` keeps the stored entry as it is.

use std::sync::Arc;

use cashew_backend::{RequestCache, TypedCache};
use cashew_core::{CacheEntry, CacheKey, CachePolicy, Cacheable, Offload};
use cashew_http::{
    HttpRequest, HttpResponse, ResponsePolicy, Sender, conditional_request,
    has_conditional_headers,
};
use tracing::{Instrument, debug, debug_span, info, warn};

use crate::error::CacheError;
use crate::metrics;
use crate::offload::OffloadManager;
use crate::refresh::RefreshRegistry;
use crate::request::Ttl;
use crate::status::CacheStatus;

/// A value produced by the engine and how it was obtained.
#[derive(Debug, Clone, PartialEq)]
pub struct Fetched<V> {
    pub value: V,
    pub status: CacheStatus,
}

impl<V> Fetched<V> {
    pub(crate) fn new(value: V, status: CacheStatus) -> Self {
        Fetched { value, status }
    }

    pub fn into_value(self) -> V {
        self.value
    }
}

/// Turns an origin response into the cached value.
pub(crate) type Materialize<V> =
    Arc<dyn Fn(&HttpResponse) -> Result<V, CacheError> + Send + Sync + 'static>;

/// Where entry deadlines come from.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Lifetime {
    Fixed(Ttl),
    Headers,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct Plan {
    pub(crate) lifetime: Lifetime,
    pub(crate) async_update: bool,
}

impl Plan {
    pub(crate) fn headers() -> Self {
        Plan {
            lifetime: Lifetime::Headers,
            async_update: false,
        }
    }

    pub(crate) fn fixed(ttl: Ttl, async_update: bool) -> Self {
        Plan {
            lifetime: Lifetime::Fixed(ttl),
            async_update,
        }
    }
}

pub(crate) struct Engine<S, C, O = OffloadManager> {
    sender: Arc<S>,
    cache: Arc<C>,
    policy: Arc<dyn ResponsePolicy>,
    offload: Option<O>,
    refreshing: RefreshRegistry,
}

impl<S, C, O: Clone> Clone for Engine<S, C, O> {
    fn clone(&self) -> Self {
        Engine {
            sender: self.sender.clone(),
            cache: self.cache.clone(),
            policy: self.policy.clone(),
            offload: self.offload.clone(),
            refreshing: self.refreshing.clone(),
        }
    }
}

impl<S, C, O> Engine<S, C, O>
where
    S: Sender + 'static,
    C: RequestCache + 'static,
    O: Offload + 'static,
{
    pub(crate) fn new(sender: S, cache: C, policy: Arc<dyn ResponsePolicy>) -> Self {
        Engine {
            sender: Arc::new(sender),
            cache: Arc::new(cache),
            policy,
            offload: None,
            refreshing: RefreshRegistry::new(),
        }
    }

    pub(crate) fn set_policy(&mut self, policy: Arc<dyn ResponsePolicy>) {
        self.policy = policy;
    }

    /// Swaps in the pool that runs background refreshes.
    pub(crate) fn with_offload<P: Offload>(self, offload: P) -> Engine<S, C, P> {
        Engine {
            sender: self.sender,
            cache: self.cache,
            policy: self.policy,
            offload: Some(offload),
            refreshing: self.refreshing,
        }
    }

    pub(crate) fn sender(&self) -> &S {
        &self.sender
    }

    pub(crate) fn cache(&self) -> &C {
        &self.cache
    }

    pub(crate) fn refreshing(&self) -> &RefreshRegistry {
        &self.refreshing
    }

    pub(crate) async fn close(&self) -> Result<(), CacheError> {
        self.sender.close().await;
        self.cache.destroy().await?;
        Ok(())
    }

    pub(crate) async fn run<V>(
        &self,
        key: CacheKey,
        request: &HttpRequest,
        plan: Plan,
        materialize: Materialize<V>,
    ) -> Result<Fetched<V>, CacheError>
    where
        V: Cacheable + Clone + 'static,
    {
        let span = debug_span!("cashew.request", cache_key = %key, backend = self.cache.name());
        let result = self
            .decide(key, request, plan, materialize)
            .instrument(span)
            .await;
        if let Ok(fetched) = &result {
            metrics::record_status(fetched.status);
        }
        result
    }

    async fn decide<V>(
        &self,
        key: CacheKey,
        request: &HttpRequest,
        plan: Plan,
        materialize: Materialize<V>,
    ) -> Result<Fetched<V>, CacheError>
    where
        V: Cacheable + Clone + 'static,
    {
        if plan.async_update && self.offload.is_none() {
            return Err(CacheError::OffloadNotConfigured);
        }

        let Some(entry) = self.lookup::<V>(&key).await else {
            if has_conditional_headers(request) {
                return Err(CacheError::IllegalState(format!(
                    "request carries a validator header but no entry is cached for {key}"
                )));
            }
            debug!("cache miss");
            let response = self.sender.execute(request).await?;
            let value = materialize(&response)?;
            self.store(&key, &response, &value, plan).await;
            return Ok(Fetched::new(value, CacheStatus::Miss));
        };

        if !entry.is_soft_expired() {
            debug!("cache hit");
            return Ok(Fetched::new(entry.into_value(), CacheStatus::Hit));
        }

        let Some(guard) = self.refreshing.try_acquire(&key) else {
            debug!("refresh already in flight, serving stale entry");
            return Ok(Fetched::new(entry.into_value(), CacheStatus::Stale));
        };

        if plan.async_update {
            let Some(offload) = &self.offload else {
                return Err(CacheError::OffloadNotConfigured);
            };
            debug!("soft-expired, refreshing in background");
            let engine = self.clone();
            let request = request.clone();
            let stale = entry.clone();
            offload.spawn("refresh", async move {
                let _guard = guard;
                if let Err(error) = engine.refresh(&key, &request, plan, &materialize, &stale).await {
                    metrics::refresh_failed();
                    warn!(cache_key = %key, error = %error, "background refresh failed, keeping stale entry");
                }
            });
            return Ok(Fetched::new(entry.into_value(), CacheStatus::Stale));
        }

        debug!("soft-expired, refreshing");
        let refreshed = self.refresh(&key, request, plan, &materialize, &entry).await;
        drop(guard);
        match refreshed {
            Ok(fetched) => Ok(fetched),
            Err(error) => {
                metrics::refresh_failed();
                warn!(error = %error, "refresh failed, serving stale entry");
                Ok(Fetched::new(entry.into_value(), CacheStatus::Stale))
            }
        }
    }

    async fn refresh<V>(
        &self,
        key: &CacheKey,
        request: &HttpRequest,
        plan: Plan,
        materialize: &Materialize<V>,
        stale: &CacheEntry<V>,
    ) -> Result<Fetched<V>, CacheError>
    where
        V: Cacheable + Clone + 'static,
    {
        metrics::refresh_started();
        let outgoing = if stale.has_validators() {
            conditional_request(request, stale)
        } else {
            request.clone()
        };

        let response = self.sender.execute(&outgoing).await?;
        if response.is_not_modified() {
            debug!(cache_key = %key, "origin reports entry unchanged");
            return Ok(Fetched::new(stale.value().clone(), CacheStatus::Revalidated));
        }
        if response.status().is_server_error() {
            return Err(CacheError::UpstreamStatus(response.status()));
        }

        let value = materialize(&response)?;
        let status = if self.store(key, &response, &value, plan).await {
            CacheStatus::Refreshed
        } else {
            // Nothing was stored; the stale entry stays as it was.
            CacheStatus::Miss
        };
        Ok(Fetched::new(value, status))
    }

    /// Reads an entry; storage and decoding failures count as a miss.
    async fn lookup<V>(&self, key: &CacheKey) -> Option<CacheEntry<V>>
    where
        V: Cacheable,
    {
        match self.cache.get_typed::<V>(key).await {
            Ok(Some(entry)) if !entry.is_hard_expired() => Some(entry),
            Ok(_) => None,
            Err(error) => {
                warn!(cache_key = %key, error = %error, "cache lookup failed, treating as miss");
                None
            }
        }
    }

    /// Stores `value` if the plan and the response allow it. Returns whether
    /// an entry was written; failures are logged and never reach the caller.
    async fn store<V>(&self, key: &CacheKey, response: &HttpResponse, value: &V, plan: Plan) -> bool
    where
        V: Cacheable + Clone,
    {
        let entry = match plan.lifetime {
            Lifetime::Fixed(ttl) => {
                if !response.is_success() {
                    debug!(cache_key = %key, status = %response.status(), "not caching non-success response");
                    return false;
                }
                CacheEntry::new(value.clone(), ttl.hard, ttl.soft)
            }
            Lifetime::Headers => match self.policy.resolve(response) {
                CachePolicy::Cacheable(freshness) => freshness.into_entry(value.clone()),
                CachePolicy::NonCacheable(()) => {
                    if response.is_success() {
                        info!(cache_key = %key, status = %response.status(), "response headers disallow caching");
                    }
                    return false;
                }
            },
        };

        let entry = match entry {
            Ok(entry) => entry,
            Err(error) => {
                warn!(cache_key = %key, error = %error, "could not build cache entry");
                return false;
            }
        };

        match self.cache.set_typed(key, &entry).await {
            Ok(()) => true,
            Err(error) => {
                warn!(cache_key = %key, error = %error, "failed to store cache entry");
                false
            }
        }
    }
}
