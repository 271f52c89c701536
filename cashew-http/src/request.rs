//! Outgoing request model.

use bytes::Bytes;
use http::{HeaderMap, HeaderName, HeaderValue, Method};

use crate::error::TransportError;

/// A request relative to a sender's base URL.
///
/// Parameters are multi-valued and keep insertion order per name; they are
/// sent as the query string by `GET`/`DELETE` senders and may be form-encoded
/// by senders for body methods.
///
/// ```
/// use cashew_http::HttpRequest;
///
/// let request = HttpRequest::get("/quotes")
///     .param("symbol", "ACME")
///     .param("symbol", "INIT")
///     .header("accept", "application/json")
///     .unwrap();
///
/// assert_eq!(request.path(), "/quotes");
/// assert_eq!(request.params().len(), 2);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    method: Method,
    path: String,
    params: Vec<(String, String)>,
    headers: HeaderMap,
    body: Option<Bytes>,
}

impl HttpRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        HttpRequest {
            method,
            path: path.into(),
            params: Vec::new(),
            headers: HeaderMap::new(),
            body: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Appends a parameter value.
    pub fn param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((name.into(), value.into()));
        self
    }

    /// Appends a header value. Fails on names or values that are not valid HTTP.
    pub fn header(mut self, name: &str, value: &str) -> Result<Self, TransportError> {
        let name = HeaderName::try_from(name)
            .map_err(|e| TransportError::InvalidRequest(format!("header name {name:?}: {e}")))?;
        let value = HeaderValue::try_from(value)
            .map_err(|e| TransportError::InvalidRequest(format!("header value for {name}: {e}")))?;
        self.headers.append(name, value);
        Ok(self)
    }

    /// Sets a header, replacing previous values.
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    pub fn body_bytes(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }

    /// Whether the method carries a request body on the wire.
    pub fn has_body_method(&self) -> bool {
        matches!(self.method, Method::POST | Method::PUT | Method::PATCH)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_header_is_rejected() {
        let result = HttpRequest::get("/").header("bad header", "x");
        assert!(matches!(result, Err(TransportError::InvalidRequest(_))));
    }

    #[test]
    fn header_appends_values() {
        let request = HttpRequest::get("/")
            .header("x-tag", "a")
            .and_then(|r| r.header("x-tag", "b"))
            .unwrap();
        assert_eq!(request.headers().get_all("x-tag").iter().count(), 2);
    }

    #[test]
    fn body_methods() {
        assert!(HttpRequest::post("/").has_body_method());
        assert!(HttpRequest::put("/").has_body_method());
        assert!(!HttpRequest::get("/").has_body_method());
        assert!(!HttpRequest::delete("/").has_body_method());
    }
}
