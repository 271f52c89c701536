//! Engine metrics.
//!
//! Enable the `metrics` feature to record them; every helper here is a no-op
//! otherwise.
//!
//! - `cashew_requests_total{status}` - engine results by [`CacheStatus`]
//! - `cashew_refresh_started_total` / `cashew_refresh_failed_total`
//! - `cashew_offload_tasks_active{kind}` and
//!   `cashew_offload_task_duration_seconds{kind}`
//! - `cashew_offload_tasks_timeout_total`

use std::time::Duration;

use crate::status::CacheStatus;

#[cfg(feature = "metrics")]
use lazy_static::lazy_static;

#[cfg(feature = "metrics")]
lazy_static! {
    /// Engine results labelled by cache status.
    pub static ref REQUESTS_TOTAL: &'static str = {
        metrics::describe_counter!(
            "cashew_requests_total",
            "Engine results by cache status (hit, miss, stale, refreshed, revalidated)."
        );
        "cashew_requests_total"
    };
    /// Refreshes of soft-expired entries that reached the origin.
    pub static ref REFRESH_STARTED_TOTAL: &'static str = {
        metrics::describe_counter!(
            "cashew_refresh_started_total",
            "Refreshes of soft-expired entries sent to the origin."
        );
        "cashew_refresh_started_total"
    };
    /// Refreshes that failed and left the stale entry in place.
    pub static ref REFRESH_FAILED_TOTAL: &'static str = {
        metrics::describe_counter!(
            "cashew_refresh_failed_total",
            "Refreshes that failed; the stale entry was kept."
        );
        "cashew_refresh_failed_total"
    };
    /// Currently running offloaded tasks.
    pub static ref OFFLOAD_TASKS_ACTIVE: &'static str = {
        metrics::describe_gauge!(
            "cashew_offload_tasks_active",
            "Number of currently running offloaded tasks."
        );
        "cashew_offload_tasks_active"
    };
    /// Offloaded task duration.
    pub static ref OFFLOAD_TASK_DURATION: &'static str = {
        metrics::describe_histogram!(
            "cashew_offload_task_duration_seconds",
            metrics::Unit::Seconds,
            "Duration of offloaded tasks in seconds."
        );
        "cashew_offload_task_duration_seconds"
    };
    /// Offloaded tasks cancelled by their timeout policy.
    pub static ref OFFLOAD_TASKS_TIMEOUT: &'static str = {
        metrics::describe_counter!(
            "cashew_offload_tasks_timeout_total",
            "Offloaded tasks cancelled by the timeout policy."
        );
        "cashew_offload_tasks_timeout_total"
    };
}

#[cfg(feature = "metrics")]
#[inline]
pub(crate) fn record_status(status: CacheStatus) {
    metrics::counter!(*REQUESTS_TOTAL, "status" => status.as_str()).increment(1);
}

#[cfg(not(feature = "metrics"))]
#[inline]
pub(crate) fn record_status(_status: CacheStatus) {}

#[cfg(feature = "metrics")]
#[inline]
pub(crate) fn refresh_started() {
    metrics::counter!(*REFRESH_STARTED_TOTAL).increment(1);
}

#[cfg(not(feature = "metrics"))]
#[inline]
pub(crate) fn refresh_started() {}

#[cfg(feature = "metrics")]
#[inline]
pub(crate) fn refresh_failed() {
    metrics::counter!(*REFRESH_FAILED_TOTAL).increment(1);
}

#[cfg(not(feature = "metrics"))]
#[inline]
pub(crate) fn refresh_failed() {}

#[cfg(feature = "metrics")]
#[inline]
pub(crate) fn offload_started(kind: &str) {
    metrics::gauge!(*OFFLOAD_TASKS_ACTIVE, "kind" => kind.to_string()).increment(1.0);
}

#[cfg(not(feature = "metrics"))]
#[inline]
pub(crate) fn offload_started(_kind: &str) {}

#[cfg(feature = "metrics")]
#[inline]
pub(crate) fn offload_finished(kind: &str, elapsed: Duration) {
    metrics::gauge!(*OFFLOAD_TASKS_ACTIVE, "kind" => kind.to_string()).decrement(1.0);
    metrics::histogram!(*OFFLOAD_TASK_DURATION, "kind" => kind.to_string())
        .record(elapsed.as_secs_f64());
}

#[cfg(not(feature = "metrics"))]
#[inline]
pub(crate) fn offload_finished(_kind: &str, _elapsed: Duration) {}

#[cfg(feature = "metrics")]
#[inline]
pub(crate) fn offload_timed_out() {
    metrics::counter!(*OFFLOAD_TASKS_TIMEOUT).increment(1);
}

#[cfg(not(feature = "metrics"))]
#[inline]
pub(crate) fn offload_timed_out() {}
