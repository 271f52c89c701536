//! Conditional revalidation requests.

use cashew_core::CacheEntry;
use http::{HeaderValue, header};

use crate::request::HttpRequest;

/// Copies `request` and conditions it on the validators stored in `entry`.
///
/// `If-None-Match` is set from the entry's tag and `If-Modified-Since` from
/// its last-modified date. Headers the caller already set are replaced.
pub fn conditional_request<V>(request: &HttpRequest, entry: &CacheEntry<V>) -> HttpRequest {
    let mut conditional = request.clone();
    let headers = conditional.headers_mut();

    if let Some(etag) = entry.etag().and_then(|tag| HeaderValue::from_str(tag).ok()) {
        headers.insert(header::IF_NONE_MATCH, etag);
    }
    if let Some(modified) = entry.last_modified() {
        let date = httpdate::fmt_http_date(modified.into());
        if let Ok(value) = HeaderValue::from_str(&date) {
            headers.insert(header::IF_MODIFIED_SINCE, value);
        }
    }
    conditional
}

/// Whether the caller put a validator header on `request` themselves.
pub fn has_conditional_headers(request: &HttpRequest) -> bool {
    let headers = request.headers();
    headers.contains_key(header::IF_NONE_MATCH) || headers.contains_key(header::IF_MODIFIED_SINCE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use std::time::Duration;

    #[test]
    fn adds_both_validators() {
        let modified = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let entry = CacheEntry::new((), Duration::from_secs(10), Duration::from_secs(5))
            .unwrap()
            .with_validators(Some("\"abc\"".to_owned()), Some(modified));

        let request = conditional_request(&HttpRequest::get("/a"), &entry);

        assert_eq!(request.headers()[header::IF_NONE_MATCH], "\"abc\"");
        assert_eq!(
            request.headers()[header::IF_MODIFIED_SINCE],
            "Fri, 01 Mar 2024 12:00:00 GMT"
        );
        assert!(has_conditional_headers(&request));
    }

    #[test]
    fn entry_without_validators_leaves_request_plain() {
        let entry = CacheEntry::new((), Duration::from_secs(10), Duration::from_secs(5)).unwrap();
        let request = conditional_request(&HttpRequest::get("/a"), &entry);
        assert!(!has_conditional_headers(&request));
    }
}
