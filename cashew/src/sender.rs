//! Response flavor: caches whole origin responses.

use std::sync::Arc;
use std::time::Duration;

use cashew_backend::RequestCache;
use cashew_core::Offload;
use cashew_http::{
    Extractor, HeaderPolicy, HttpRequest, HttpResponse, ResponsePolicy, Sender,
};

use crate::engine::{Engine, Fetched, Materialize, Plan};
use crate::error::CacheError;
use crate::offload::OffloadManager;
use crate::refresh::RefreshRegistry;
use crate::request::{CachingRequest, Ttl};
use crate::status::CacheStatus;

/// A response together with a value extracted from it.
#[derive(Debug, Clone, PartialEq)]
pub struct Extracted<T> {
    pub response: HttpResponse,
    pub extracted: T,
    pub status: CacheStatus,
}

/// A [`Sender`] wrapped with a response cache.
///
/// Stored responses are reusable: several extractions of the same request
/// share one cache entry.
///
/// ```no_run
/// # async fn demo(origin: impl cashew_http::Sender + 'static) -> Result<(), cashew::CacheError> {
/// use cashew::CachingSender;
/// use cashew_http::HttpRequest;
/// use cashew_memory::MemoryCache;
///
/// let cache = MemoryCache::builder().build().unwrap();
/// let client = CachingSender::new(origin, cache);
///
/// let first = client.execute(&HttpRequest::get("/quotes")).await?;
/// let second = client.execute(&HttpRequest::get("/quotes")).await?;
/// assert_eq!(first.value, second.value);
/// # Ok(())
/// # }
/// ```
pub struct CachingSender<S, C, O = OffloadManager> {
    engine: Engine<S, C, O>,
}

impl<S, C> CachingSender<S, C>
where
    S: Sender + 'static,
    C: RequestCache + 'static,
{
    /// Caches through `cache` with the default [`HeaderPolicy`] and no
    /// offload manager.
    pub fn new(sender: S, cache: C) -> Self {
        CachingSender {
            engine: Engine::new(sender, cache, Arc::new(HeaderPolicy::default())),
        }
    }
}

impl<S, C, O> CachingSender<S, C, O>
where
    S: Sender + 'static,
    C: RequestCache + 'static,
    O: Offload + 'static,
{
    /// Replaces the policy used by header-driven calls.
    pub fn with_policy<P>(mut self, policy: P) -> Self
    where
        P: ResponsePolicy + 'static,
    {
        self.engine.set_policy(Arc::new(policy));
        self
    }

    /// Enables `async_update` requests, running background refreshes on
    /// `offload`. Any [`Offload`] implementation can be plugged in; the
    /// bundled one is [`OffloadManager`].
    pub fn with_offload<P: Offload + 'static>(self, offload: P) -> CachingSender<S, C, P> {
        CachingSender {
            engine: self.engine.with_offload(offload),
        }
    }

    /// Sends `request`, letting response headers decide cacheability.
    ///
    /// Stale entries with validators are revalidated with a conditional
    /// request.
    pub async fn execute(&self, request: &HttpRequest) -> Result<Fetched<HttpResponse>, CacheError> {
        let key = self.engine.sender().cache_key(request);
        self.engine
            .run(key, request, Plan::headers(), identity())
            .await
    }

    /// Sends `request`, caching successful responses for `ttl` regardless of
    /// their headers.
    pub async fn execute_with_ttl(
        &self,
        request: &HttpRequest,
        ttl: Duration,
    ) -> Result<Fetched<HttpResponse>, CacheError> {
        let ttl = Ttl::new(ttl, ttl)?;
        let key = self.engine.sender().cache_key(request);
        self.engine
            .run(key, request, Plan::fixed(ttl, false), identity())
            .await
    }

    /// Sends the wrapped request with its own hard and soft TTLs.
    pub async fn execute_caching(
        &self,
        request: &CachingRequest,
    ) -> Result<Fetched<HttpResponse>, CacheError> {
        let key = self.engine.sender().cache_key(request.request());
        self.engine
            .run(
                key,
                request.request(),
                Plan::fixed(request.ttl(), request.is_async_update()),
                identity(),
            )
            .await
    }

    /// Header-driven [`execute`](Self::execute) followed by extraction.
    ///
    /// The response is cached, not the extracted value, so different
    /// extractors reuse the same entry.
    pub async fn extract<E>(
        &self,
        request: &HttpRequest,
        extractor: &E,
    ) -> Result<Extracted<E::Output>, CacheError>
    where
        E: Extractor,
    {
        let fetched = self.execute(request).await?;
        let extracted = extractor.extract(&fetched.value)?;
        Ok(Extracted {
            response: fetched.value,
            extracted,
            status: fetched.status,
        })
    }

    pub fn sender(&self) -> &S {
        self.engine.sender()
    }

    pub fn cache(&self) -> &C {
        self.engine.cache()
    }

    /// Keys currently being refreshed.
    pub fn refreshing(&self) -> &RefreshRegistry {
        self.engine.refreshing()
    }

    /// Closes the sender and destroys the cache, stopping its background
    /// tasks.
    pub async fn close(&self) -> Result<(), CacheError> {
        self.engine.close().await
    }
}

fn identity() -> Materialize<HttpResponse> {
    Arc::new(|response: &HttpResponse| -> Result<HttpResponse, CacheError> {
        Ok(response.clone())
    })
}
