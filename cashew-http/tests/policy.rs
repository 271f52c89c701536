use std::time::Duration;

use cashew_core::CachePolicy;
use cashew_http::{
    HeaderPolicy, HttpRequest, HttpResponse, ResponsePolicy, conditional_request, request_key,
};
use chrono::Utc;
use http::{HeaderMap, HeaderValue, StatusCode, header};

fn response(status: StatusCode, pairs: &[(header::HeaderName, &'static str)]) -> HttpResponse {
    let mut headers = HeaderMap::new();
    for (name, value) in pairs {
        headers.append(name.clone(), HeaderValue::from_static(value));
    }
    HttpResponse::new(status, headers, "body")
}

#[test]
fn yaml_config_with_defaults() {
    let policy: HeaderPolicy = serde_saphyr::from_str("stale_window: 2m\n").unwrap();
    assert_eq!(policy.stale_window, Duration::from_secs(120));
    assert_eq!(policy.validator_ttl, HeaderPolicy::default().validator_ttl);
}

#[test]
fn resolved_entry_revalidates_with_same_key() {
    let policy = HeaderPolicy::default();
    let origin = response(
        StatusCode::OK,
        &[
            (header::CACHE_CONTROL, "max-age=30"),
            (header::ETAG, "\"abc\""),
        ],
    );

    let CachePolicy::Cacheable(freshness) = policy.resolve(&origin) else {
        panic!("response with max-age and etag must be cacheable");
    };
    let entry = freshness.into_entry(origin.clone()).unwrap();
    assert!(!entry.is_soft_expired());
    assert!(entry.hard_expire() > Utc::now() + chrono::Duration::seconds(30));

    let request = HttpRequest::get("/r").param("q", "1");
    let revalidation = conditional_request(&request, &entry);
    assert_eq!(revalidation.headers()[header::IF_NONE_MATCH], "\"abc\"");
    assert_eq!(
        request_key("http://origin", &request),
        request_key("http://origin", &revalidation)
    );
}

#[test]
fn not_modified_and_no_store_are_not_cacheable() {
    let policy = HeaderPolicy::default();
    let not_modified = response(StatusCode::NOT_MODIFIED, &[(header::ETAG, "\"abc\"")]);
    let no_store = response(
        StatusCode::OK,
        &[(header::CACHE_CONTROL, "private, no-store")],
    );

    assert_eq!(policy.resolve(&not_modified), CachePolicy::NonCacheable(()));
    assert_eq!(policy.resolve(&no_store), CachePolicy::NonCacheable(()));
}
