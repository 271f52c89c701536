#![warn(missing_docs)]
//! # cashew-core
//!
//! Core types shared by every cashew crate.
//!
//! - [`CacheEntry`] - a cached value with hard and soft deadlines and validators
//! - [`CacheKey`] - identity of a cached request
//! - [`CachePolicy`] - the decision whether a fetched value may be stored
//! - [`Offload`] - abstraction over background task execution
//!
//! Storage backends live in `cashew-backend` and its implementations; the
//! caching engine lives in `cashew`.

#[allow(missing_docs)]
pub mod entry;
#[allow(missing_docs)]
pub mod key;
pub mod offload;
pub mod policy;

use serde::{Serialize, de::DeserializeOwned};

pub use entry::{CacheEntry, CacheState, EntryError};
pub use key::{CacheKey, KeyPart, KeyParts};
pub use offload::Offload;
pub use policy::CachePolicy;
#[doc(hidden)]
pub use smol_str::SmolStr;

/// Raw byte data type used for serialized cache values.
pub type Raw = bytes::Bytes;

/// Bounds required of any value stored through a typed cache.
pub trait Cacheable: Serialize + DeserializeOwned + Send + Sync {}

impl<T> Cacheable for T where T: Serialize + DeserializeOwned + Send + Sync {}
