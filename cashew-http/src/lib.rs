//! HTTP model and origin contract for the cashew response cache.
//!
//! This crate holds everything the caching engine needs to know about HTTP
//! without committing to a transport:
//!
//! - [`HttpRequest`] / [`HttpResponse`] - request model and the buffered,
//!   serializable response that the engine stores
//! - [`Sender`] - the origin fetcher implemented by transports such as
//!   `cashew-reqwest`
//! - [`HeaderPolicy`] - decides cacheability and lifetime from response
//!   headers
//! - [`Extractor`] - decodes responses into typed values
//! - [`request_key`] - derives the cache key of a request
pub mod conditional;
pub mod error;
pub mod extract;
pub mod key;
pub mod policy;
pub mod request;
pub mod response;
pub mod sender;

pub use conditional::{conditional_request, has_conditional_headers};
pub use error::{ExtractError, TransportError};
pub use extract::{BytesExtractor, Extractor, JsonExtractor, StringExtractor};
pub use key::{KEY_VERSION, request_key};
pub use policy::{Freshness, HeaderPolicy, ResponsePolicy};
pub use request::HttpRequest;
pub use response::HttpResponse;
pub use sender::Sender;
