#![warn(missing_docs)]
//! Redis storage for cashew.
//!
//! Each entry is a Redis hash under `{namespace}:{sha256 of the cache key}` that expires
//! at the entry's hard deadline (`PEXPIREAT`). Several applications can share
//! one Redis as long as they use distinct namespaces; `clear` only touches
//! keys of its own namespace.
//!
//! ```no_run
//! use cashew_redis::RedisCache;
//!
//! let cache = RedisCache::builder()
//!     .server("redis://127.0.0.1/")
//!     .namespace("quotes")
//!     .build()
//!     .unwrap();
//! ```

pub mod backend;
pub mod error;

#[doc(inline)]
pub use crate::backend::{RedisCache, RedisCacheBuilder};
#[doc(inline)]
pub use crate::error::Error;
