#![warn(missing_docs)]
//! Bounded in-memory storage for cashew, powered by [Moka](https://docs.rs/moka).
//!
//! Entries are evicted by capacity (entry count or approximate bytes) and
//! expire at their hard deadline.
//!
//! ```
//! use cashew_moka::MokaCache;
//!
//! let cache = MokaCache::builder().max_entries(10_000).build();
//! ```

mod backend;
mod builder;
pub mod metrics;

pub use backend::MokaCache;
pub use builder::{ByteCapacity, EntryCapacity, MokaCacheBuilder, NoCapacity};
pub use moka::policy::EvictionPolicy;
