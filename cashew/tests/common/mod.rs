#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use cashew_http::{HttpRequest, HttpResponse, Sender, TransportError};
use http::{HeaderMap, HeaderValue, StatusCode};

type Respond = dyn Fn(&HttpRequest, usize) -> HttpResponse + Send + Sync;

/// In-test origin with a call counter and a failure switch.
#[derive(Clone)]
pub struct Origin {
    url: String,
    calls: Arc<AtomicUsize>,
    failing: Arc<AtomicBool>,
    delay: Duration,
    seen: Arc<Mutex<Vec<HttpRequest>>>,
    respond: Arc<Respond>,
}

impl Origin {
    /// Answers `200` with the call number as body.
    pub fn counting(url: &str) -> Self {
        Self::new(url, |_, call| ok(call.to_string(), &[]))
    }

    pub fn new<F>(url: &str, respond: F) -> Self
    where
        F: Fn(&HttpRequest, usize) -> HttpResponse + Send + Sync + 'static,
    {
        Origin {
            url: url.to_owned(),
            calls: Arc::new(AtomicUsize::new(0)),
            failing: Arc::new(AtomicBool::new(false)),
            delay: Duration::ZERO,
            seen: Arc::new(Mutex::new(Vec::new())),
            respond: Arc::new(respond),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn fail(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn seen(&self) -> Vec<HttpRequest> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl Sender for Origin {
    fn origin(&self) -> &str {
        &self.url
    }

    async fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.seen.lock().unwrap().push(request.clone());
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(TransportError::Connect {
                url: self.url.clone(),
                source: "origin is down".into(),
            });
        }
        Ok((self.respond)(request, call))
    }
}

/// Routes engine logs to the test output; filter with `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn ok(body: impl Into<bytes::Bytes>, headers: &[(&'static str, &'static str)]) -> HttpResponse {
    response(StatusCode::OK, body, headers)
}

pub fn response(
    status: StatusCode,
    body: impl Into<bytes::Bytes>,
    headers: &[(&'static str, &'static str)],
) -> HttpResponse {
    let mut map = HeaderMap::new();
    for (name, value) in headers {
        map.append(*name, HeaderValue::from_static(value));
    }
    HttpResponse::new(status, map, body)
}
