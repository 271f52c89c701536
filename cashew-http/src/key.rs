//! Cache key derivation for requests.
//!
//! A key is built from the sender origin and the logical request:
//!
//! - `origin` - the sender's base URL, so equal requests to different
//!   origins never share an entry
//! - `method` and `path`
//! - `p:{name}` - every parameter, ordered by name (values keep their order)
//! - `h:{name}` - every header except the conditional ones, ordered by
//!   lowercase name
//! - `body` - SHA-256 of the body, when present
//!
//! `If-None-Match` and `If-Modified-Since` are left out so a revalidation
//! request maps to the entry it revalidates.

use cashew_core::{CacheKey, KeyPart, KeyParts};
use http::header;
use sha2::{Digest, Sha256};

use crate::request::HttpRequest;

/// Key format version. Bump when the layout below changes.
pub const KEY_VERSION: u32 = 1;

/// Derives the cache key for `request` sent through a sender at `origin`.
///
/// ```
/// use cashew_http::{HttpRequest, request_key};
///
/// let a = HttpRequest::get("/q").param("b", "2").param("a", "1");
/// let b = HttpRequest::get("/q").param("a", "1").param("b", "2");
/// assert_eq!(request_key("http://x", &a), request_key("http://x", &b));
/// assert_ne!(request_key("http://x", &a), request_key("http://y", &a));
/// ```
pub fn request_key(origin: &str, request: &HttpRequest) -> CacheKey {
    let mut params: Vec<&(String, String)> = request.params().iter().collect();
    // Stable: values of a repeated parameter keep their order.
    params.sort_by(|a, b| a.0.cmp(&b.0));

    let mut headers: Vec<(&str, &[u8])> = request
        .headers()
        .iter()
        .filter(|(name, _)| !is_conditional(name))
        .map(|(name, value)| (name.as_str(), value.as_bytes()))
        .collect();
    headers.sort_by(|a, b| a.0.cmp(b.0));

    let mut parts = KeyParts::default()
        .push("origin", Some(origin))
        .push("method", Some(request.method().as_str()))
        .push("path", Some(request.path()))
        .extend(
            params
                .into_iter()
                .map(|(name, value)| KeyPart::new(format!("p:{name}"), Some(value))),
        )
        .extend(headers.into_iter().map(|(name, value)| {
            KeyPart::new(
                format!("h:{name}"),
                Some(String::from_utf8_lossy(value)),
            )
        }));

    if let Some(body) = request.body_bytes() {
        parts = parts.push("body", Some(body_digest(body)));
    }

    parts.into_cache_key("", KEY_VERSION)
}

fn is_conditional(name: &header::HeaderName) -> bool {
    *name == header::IF_NONE_MATCH || *name == header::IF_MODIFIED_SINCE
}

fn body_digest(body: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(body);
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conditional_headers_do_not_change_key() {
        let plain = HttpRequest::get("/a");
        let conditional = HttpRequest::get("/a")
            .header("if-none-match", "\"abc\"")
            .unwrap();
        assert_eq!(request_key("o", &plain), request_key("o", &conditional));
    }

    #[test]
    fn repeated_param_order_is_significant() {
        let a = HttpRequest::get("/").param("x", "1").param("x", "2");
        let b = HttpRequest::get("/").param("x", "2").param("x", "1");
        assert_ne!(request_key("o", &a), request_key("o", &b));
    }

    #[test]
    fn headers_are_case_insensitive_and_sorted() {
        let a = HttpRequest::get("/")
            .header("Accept", "text/plain")
            .and_then(|r| r.header("X-Api", "1"))
            .unwrap();
        let b = HttpRequest::get("/")
            .header("x-api", "1")
            .and_then(|r| r.header("accept", "text/plain"))
            .unwrap();
        assert_eq!(request_key("o", &a), request_key("o", &b));
    }

    #[test]
    fn body_and_method_distinguish() {
        let a = HttpRequest::post("/").body("one");
        let b = HttpRequest::post("/").body("two");
        let c = HttpRequest::put("/").body("one");
        assert_ne!(request_key("o", &a), request_key("o", &b));
        assert_ne!(request_key("o", &a), request_key("o", &c));
        assert_eq!(
            request_key("o", &a),
            request_key("o", &HttpRequest::post("/").body("one"))
        );
    }

    #[test]
    fn key_layout() {
        let request = HttpRequest::get("/q").param("id", "7");
        assert_eq!(
            request_key("http://h", &request).to_string(),
            "v1:origin=http://h&method=GET&path=/q&p:id=7"
        );
    }
}
