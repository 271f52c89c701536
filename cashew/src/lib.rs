//! Transparent response cache for HTTP clients.
//!
//! `cashew` sits between the caller and a [`Sender`](cashew_http::Sender)
//! and decides per request whether a stored response can be served, whether
//! it has to be refreshed or revalidated, and how to keep concurrent callers
//! from refreshing the same key twice.
//!
//! Two flavors share one engine:
//!
//! - [`CachingSender`] stores whole responses. Lifetimes come from response
//!   headers ([`execute`](CachingSender::execute)) or from the caller
//!   ([`execute_with_ttl`](CachingSender::execute_with_ttl),
//!   [`execute_caching`](CachingSender::execute_caching)).
//! - [`CachingExtractor`] stores the decoded value of an
//!   [`Extractor`](cashew_http::Extractor).
//!
//! Every entry has a soft deadline, after which it is refreshed, and a hard
//! deadline, after which it is gone. Between the two the stale value is
//! served when the origin fails, or immediately while a background refresh
//! runs on an [`OffloadManager`](offload::OffloadManager) or any other
//! [`Offload`] pool supplied by the embedder.
#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

#[allow(missing_docs)]
mod engine;

/// Engine error type.
#[allow(missing_docs)]
pub mod error;

#[allow(missing_docs)]
mod extractor;

/// Metrics recorded by the engine and the offload manager when the
/// `metrics` feature is enabled.
pub mod metrics;

/// Background execution of asynchronous refreshes.
#[allow(missing_docs)]
pub mod offload;

#[allow(missing_docs)]
mod refresh;

#[allow(missing_docs)]
mod request;

#[allow(missing_docs)]
mod sender;

mod status;

pub use engine::Fetched;
pub use error::CacheError;
pub use extractor::CachingExtractor;
pub use refresh::{RefreshGuard, RefreshRegistry};
pub use request::{CachingExtractorRequest, CachingRequest, TtlConfig};
pub use sender::{CachingSender, Extracted};
pub use status::CacheStatus;

pub use cashew_core::{CacheEntry, CacheKey, CacheState, Offload};
