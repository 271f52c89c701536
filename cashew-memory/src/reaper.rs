//! Background sweep of hard-expired entries.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::time::Duration;

use cashew_core::{CacheEntry, CacheKey, Raw};
use dashmap::DashMap;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{Instrument, debug, info_span, trace, warn};

pub(crate) type Store = Arc<DashMap<CacheKey, CacheEntry<Raw>>>;

/// Handle to a running reaper task.
///
/// Dropping the handle drops the stop sender, which also ends the loop.
#[derive(Debug)]
pub(crate) struct Reaper {
    stop: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl Reaper {
    pub(crate) fn spawn(
        runtime: &tokio::runtime::Handle,
        store: Store,
        interval: Duration,
        name: String,
    ) -> Self {
        let (stop, mut stopped) = watch::channel(false);
        let span = info_span!("cashew.reaper", backend = %name, interval = ?interval);
        let handle = runtime.spawn(
            async move {
                let mut ticker = tokio::time::interval(interval);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                ticker.tick().await;
                loop {
                    tokio::select! {
                        _ = ticker.tick() => {}
                        changed = stopped.changed() => {
                            // Sender dropped or stop requested.
                            if changed.is_err() || *stopped.borrow() {
                                debug!("reaper stopped");
                                break;
                            }
                        }
                    }
                    match catch_unwind(AssertUnwindSafe(|| sweep(&store))) {
                        Ok(removed) => {
                            trace!(removed, remaining = store.len(), "eviction pass finished");
                            crate::metrics::record_sweep(&name, removed, store.len());
                        }
                        Err(_) => warn!("eviction pass failed"),
                    }
                }
            }
            .instrument(span),
        );
        Reaper { stop, handle }
    }

    pub(crate) fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }

    /// Signals the loop to stop and waits for it to exit.
    pub(crate) async fn stop(self) {
        let _ = self.stop.send(true);
        if let Err(err) = self.handle.await {
            warn!(error = %err, "reaper task ended abnormally");
        }
    }
}

/// Removes hard-expired entries, returning how many were dropped.
pub(crate) fn sweep(store: &DashMap<CacheKey, CacheEntry<Raw>>) -> usize {
    let before = store.len();
    store.retain(|_, entry| !entry.is_hard_expired());
    before.saturating_sub(store.len())
}
