//! Storage contract for cashew.
//!
//! Implement [`RequestCache`] to plug a new storage engine under the caching
//! engine. Every implementation must honor the same contract:
//!
//! - `get` never returns a hard-expired entry. A hard-expired stored entry is
//!   removed as a side effect and reported as absent.
//! - `set` overwrites (last writer wins).
//! - `remove` reports whether the key was present.
//! - `clear` drops all entries owned by this cache.
//! - `destroy` releases background resources (reaper tasks, connections).
//!
//! [`TypedCache`] is implemented for every `RequestCache` and adds typed
//! `get_typed` / `set_typed` on top of the raw byte contract.
mod backend;
mod error;
pub mod format;

pub use backend::{BackendResult, RequestCache, TypedCache};
pub use error::BackendError;
pub use format::{Format, FormatError, JsonFormat};

/// Status of a delete operation.
#[derive(Debug, PartialEq, Eq)]
pub enum DeleteStatus {
    /// Record successfully deleted.
    Deleted(u32),
    /// Record already missing.
    Missing,
}

impl DeleteStatus {
    /// Whether the key was present before removal.
    pub fn was_present(&self) -> bool {
        matches!(self, DeleteStatus::Deleted(_))
    }
}
