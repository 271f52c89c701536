//! Extractor flavor: caches decoded values.

use std::sync::Arc;

use cashew_backend::RequestCache;
use cashew_core::{CacheKey, Cacheable, Offload};
use cashew_http::{Extractor, HeaderPolicy, HttpResponse, Sender};

use crate::engine::{Engine, Fetched, Materialize, Plan};
use crate::error::CacheError;
use crate::offload::OffloadManager;
use crate::refresh::RefreshRegistry;
use crate::request::CachingExtractorRequest;

/// Prefix separating extracted values from cached responses in a shared
/// cache.
const EXTRACT_PREFIX: &str = "extract";

/// A [`Sender`] whose extracted values are cached.
///
/// The response is decoded once and only the decoded value is stored.
/// Extractors used on the same request must produce the same type; a value
/// that fails to decode is treated as a miss and overwritten.
pub struct CachingExtractor<S, C, O = OffloadManager> {
    engine: Engine<S, C, O>,
}

impl<S, C> CachingExtractor<S, C>
where
    S: Sender + 'static,
    C: RequestCache + 'static,
{
    pub fn new(sender: S, cache: C) -> Self {
        CachingExtractor {
            engine: Engine::new(sender, cache, Arc::new(HeaderPolicy::default())),
        }
    }
}

impl<S, C, O> CachingExtractor<S, C, O>
where
    S: Sender + 'static,
    C: RequestCache + 'static,
    O: Offload + 'static,
{
    /// Enables `async_update` requests, running background refreshes on
    /// `offload`. Any [`Offload`] implementation can be plugged in; the
    /// bundled one is [`OffloadManager`].
    pub fn with_offload<P: Offload + 'static>(self, offload: P) -> CachingExtractor<S, C, P> {
        CachingExtractor {
            engine: self.engine.with_offload(offload),
        }
    }

    pub async fn extract<E>(
        &self,
        request: &CachingExtractorRequest<E>,
    ) -> Result<Fetched<E::Output>, CacheError>
    where
        E: Extractor + 'static,
        E::Output: Cacheable + Clone + 'static,
    {
        let key = extract_key(self.engine.sender().cache_key(request.request()));
        let extractor = request.shared_extractor();
        let materialize: Materialize<E::Output> = Arc::new(
            move |response: &HttpResponse| -> Result<E::Output, CacheError> {
                Ok(extractor.extract(response)?)
            },
        );
        self.engine
            .run(
                key,
                request.request(),
                Plan::fixed(request.ttl(), request.is_async_update()),
                materialize,
            )
            .await
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

    /// Closes the sender and destroys the cache.
    pub async fn close(&self) -> Result<(), CacheError> {
        self.engine.close().await
    }
}

fn extract_key(key: CacheKey) -> CacheKey {
    CacheKey::new(EXTRACT_PREFIX, key.version(), key.parts().cloned().collect())
}
