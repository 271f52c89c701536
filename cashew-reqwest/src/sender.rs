//! [`Sender`] over a reqwest client.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use cashew_http::{HttpRequest, HttpResponse, Sender, TransportError};
use http::{HeaderValue, header};
use reqwest::{Client, Url};
use tracing::{debug, trace};

use crate::config::SenderConfig;

/// Sends requests to one base URL through a pooled reqwest client.
///
/// Parameters go to the query string, except for `POST`/`PUT`/`PATCH`
/// requests without a body, where they are form-encoded.
#[derive(Debug)]
pub struct ReqwestSender {
    client: Client,
    origin: String,
    accept: Option<HeaderValue>,
    closed: AtomicBool,
}

impl ReqwestSender {
    pub fn new(config: SenderConfig) -> Result<Self, TransportError> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .read_timeout(config.read_timeout)
            .gzip(config.gzip)
            .build()
            .map_err(|e| TransportError::InvalidRequest(format!("client configuration: {e}")))?;
        let mut sender = Self::with_client(client, &config.url)?;
        if let Some(accept) = config.accept {
            sender.accept = Some(
                HeaderValue::try_from(accept)
                    .map_err(|e| TransportError::InvalidRequest(format!("accept header: {e}")))?,
            );
        }
        Ok(sender)
    }

    /// Uses an existing client; its timeouts and pool settings apply.
    pub fn with_client(client: Client, url: &str) -> Result<Self, TransportError> {
        Url::parse(url).map_err(|e| TransportError::InvalidRequest(format!("base url {url:?}: {e}")))?;
        Ok(ReqwestSender {
            client,
            origin: url.trim_end_matches('/').to_owned(),
            accept: None,
            closed: AtomicBool::new(false),
        })
    }

    fn url_for(&self, request: &HttpRequest) -> Result<Url, TransportError> {
        let path = request.path();
        let joined = if path.starts_with('/') {
            format!("{}{}", self.origin, path)
        } else {
            format!("{}/{}", self.origin, path)
        };
        let mut url = Url::parse(&joined)
            .map_err(|e| TransportError::InvalidRequest(format!("url {joined:?}: {e}")))?;
        if !request.params().is_empty() && !self.form_encoded(request) {
            url.query_pairs_mut().extend_pairs(request.params());
        }
        Ok(url)
    }

    fn form_encoded(&self, request: &HttpRequest) -> bool {
        request.has_body_method() && request.body_bytes().is_none()
    }
}

#[async_trait]
impl Sender for ReqwestSender {
    fn origin(&self) -> &str {
        &self.origin
    }

    async fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(TransportError::Closed);
        }

        let url = self.url_for(request)?;
        let mut builder = self
            .client
            .request(request.method().clone(), url.clone())
            .headers(request.headers().clone());

        if let Some(accept) = &self.accept
            && !request.headers().contains_key(header::ACCEPT)
        {
            builder = builder.header(header::ACCEPT, accept.clone());
        }

        if let Some(body) = request.body_bytes() {
            builder = builder.body(body.clone());
        } else if self.form_encoded(request) && !request.params().is_empty() {
            let form = serde_urlencoded::to_string(request.params())
                .map_err(|e| TransportError::InvalidRequest(format!("form parameters: {e}")))?;
            builder = builder
                .header(
                    header::CONTENT_TYPE,
                    HeaderValue::from_static("application/x-www-form-urlencoded"),
                )
                .body(form);
        }

        debug!(method = %request.method(), url = %url, "sending request");
        let response = builder.send().await.map_err(|e| transport_error(&url, e))?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await.map_err(|e| transport_error(&url, e))?;
        trace!(url = %url, status = %status, bytes = body.len(), "response buffered");

        Ok(HttpResponse::new(status, headers, body))
    }

    async fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }
}

fn transport_error(url: &Url, error: reqwest::Error) -> TransportError {
    if error.is_timeout() {
        TransportError::Timeout {
            url: url.to_string(),
        }
    } else if error.is_connect() {
        TransportError::Connect {
            url: url.to_string(),
            source: Box::new(error),
        }
    } else if error.is_builder() {
        TransportError::InvalidRequest(error.to_string())
    } else {
        TransportError::Io(Box::new(error))
    }
}
