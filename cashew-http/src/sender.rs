//! Origin fetcher contract.

use std::sync::Arc;

use async_trait::async_trait;
use cashew_core::CacheKey;

use crate::error::TransportError;
use crate::key::request_key;
use crate::request::HttpRequest;
use crate::response::HttpResponse;

/// Sends requests to one origin.
///
/// The origin string identifies the sender for caching: requests through
/// senders with different origins never share cache entries.
#[async_trait]
pub trait Sender: Send + Sync {
    /// Base URL requests are resolved against.
    fn origin(&self) -> &str;

    /// Sends `request` and buffers the whole response.
    async fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError>;

    /// Cache key for `request` sent through this sender.
    fn cache_key(&self, request: &HttpRequest) -> CacheKey {
        request_key(self.origin(), request)
    }

    /// Releases transport resources. Later calls to `execute` may fail with
    /// [`TransportError::Closed`].
    async fn close(&self) {}
}

#[async_trait]
impl<S> Sender for Arc<S>
where
    S: Sender + ?Sized,
{
    fn origin(&self) -> &str {
        self.as_ref().origin()
    }

    async fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        self.as_ref().execute(request).await
    }

    fn cache_key(&self, request: &HttpRequest) -> CacheKey {
        self.as_ref().cache_key(request)
    }

    async fn close(&self) {
        self.as_ref().close().await
    }
}

#[async_trait]
impl<S> Sender for Box<S>
where
    S: Sender + ?Sized,
{
    fn origin(&self) -> &str {
        self.as_ref().origin()
    }

    async fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        self.as_ref().execute(request).await
    }

    fn cache_key(&self, request: &HttpRequest) -> CacheKey {
        self.as_ref().cache_key(request)
    }

    async fn close(&self) {
        self.as_ref().close().await
    }
}
