//! Offload trait for background task execution.

use std::future::Future;

use smol_str::SmolStr;

/// Spawns background work off the caller's path.
///
/// Used by the caching engine to run asynchronous refreshes. The bundled
/// implementation is `OffloadManager` in the `cashew` crate; embedders with
/// their own worker pool implement this trait and pass it to `with_offload`.
///
/// Implementors should share state through `Arc` so clones observe the same
/// task set.
pub trait Offload: Send + Sync + Clone {
    /// Spawn a future to be executed in the background.
    ///
    /// `kind` labels the task (e.g. `"refresh"`) for tracing and metrics.
    fn spawn<F>(&self, kind: impl Into<SmolStr>, future: F)
    where
        F: Future<Output = ()> + Send + 'static;
}
