//! Bounded background execution for asynchronous refreshes.
//!
//! When a caller opts into `async_update`, a soft-expired entry is returned
//! immediately and the refresh runs on an [`OffloadManager`] owned by the
//! embedder.
//!
//! ```no_run
//! use cashew::offload::{OffloadConfig, OffloadManager, TimeoutPolicy};
//! use std::time::Duration;
//!
//! let manager = OffloadManager::new(
//!     OffloadConfig::builder()
//!         .max_concurrent_tasks(8)
//!         .timeout(Duration::from_secs(30))
//!         .build(),
//! );
//! # let _ = (manager, TimeoutPolicy::None);
//! ```

mod manager;
mod policy;

pub use manager::OffloadManager;
pub use policy::{OffloadConfig, OffloadConfigBuilder, TimeoutPolicy};
