//! Moka capacity metrics.
//!
//! Enable the `metrics` feature to record them.
//!
//! - `cashew_moka_entries` - entries currently held (gauge)
//! - `cashew_moka_size_bytes` - current weighted size (gauge)
//!
//! Both carry a `backend` label. Values come from Moka's own counters and lag
//! behind pending maintenance tasks.

#[cfg(feature = "metrics")]
use lazy_static::lazy_static;

#[cfg(feature = "metrics")]
lazy_static! {
    /// Metric name for the entry count gauge.
    pub static ref MOKA_ENTRIES: &'static str = {
        metrics::describe_gauge!(
            "cashew_moka_entries",
            "Current number of entries in the Moka cache."
        );
        "cashew_moka_entries"
    };

    /// Metric name for the weighted size gauge.
    pub static ref MOKA_SIZE_BYTES: &'static str = {
        metrics::describe_gauge!(
            "cashew_moka_size_bytes",
            "Current weighted size of the Moka cache."
        );
        "cashew_moka_size_bytes"
    };
}

/// Record current capacity gauges for `backend`.
#[cfg(feature = "metrics")]
#[inline]
pub fn record_capacity(backend: &str, entries: u64, size: u64) {
    metrics::gauge!(*MOKA_ENTRIES, "backend" => backend.to_string()).set(entries as f64);
    metrics::gauge!(*MOKA_SIZE_BYTES, "backend" => backend.to_string()).set(size as f64);
}

/// Record current capacity gauges (no-op when `metrics` feature disabled).
#[cfg(not(feature = "metrics"))]
#[inline]
pub fn record_capacity(_backend: &str, _entries: u64, _size: u64) {}
