#![warn(missing_docs)]
//! In-process storage for cashew.
//!
//! [`MemoryCache`] keeps entries in a concurrent map. Hard-expired entries are
//! purged lazily on `get` and, when an eviction interval is configured, by a
//! background reaper task that sweeps the whole map.
//!
//! ```no_run
//! # async fn run() -> Result<(), cashew_memory::Error> {
//! use std::time::Duration;
//! use cashew_memory::MemoryCache;
//!
//! let cache = MemoryCache::builder()
//!     .eviction_interval(Duration::from_secs(30))
//!     .build()?;
//! # Ok(())
//! # }
//! ```

mod backend;
mod builder;
mod error;
pub mod metrics;
mod reaper;

pub use backend::MemoryCache;
pub use builder::{MemoryCacheBuilder, MemoryCacheConfig, MIN_EVICTION_INTERVAL};
pub use error::Error;
