//! Reaper metrics.
//!
//! Enable the `metrics` feature to record them.
//!
//! - `cashew_memory_entries` - entries left after the last sweep (gauge)
//! - `cashew_memory_evicted_total` - entries removed by the reaper (counter)
//!
//! Both carry a `backend` label.

#[cfg(feature = "metrics")]
use lazy_static::lazy_static;

#[cfg(feature = "metrics")]
lazy_static! {
    /// Metric name for the entry count gauge.
    pub static ref MEMORY_ENTRIES: &'static str = {
        metrics::describe_gauge!(
            "cashew_memory_entries",
            "Entries held by the in-process cache after the last eviction pass."
        );
        "cashew_memory_entries"
    };

    /// Metric name for the evicted entries counter.
    pub static ref MEMORY_EVICTED_TOTAL: &'static str = {
        metrics::describe_counter!(
            "cashew_memory_evicted_total",
            "Hard-expired entries removed by the reaper."
        );
        "cashew_memory_evicted_total"
    };
}

/// Record the outcome of one eviction pass.
#[cfg(feature = "metrics")]
#[inline]
pub fn record_sweep(backend: &str, removed: usize, remaining: usize) {
    metrics::counter!(*MEMORY_EVICTED_TOTAL, "backend" => backend.to_string())
        .increment(removed as u64);
    metrics::gauge!(*MEMORY_ENTRIES, "backend" => backend.to_string()).set(remaining as f64);
}

/// Record the outcome of one eviction pass (no-op when `metrics` feature disabled).
#[cfg(not(feature = "metrics"))]
#[inline]
pub fn record_sweep(_backend: &str, _removed: usize, _remaining: usize) {}
