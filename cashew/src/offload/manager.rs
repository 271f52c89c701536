//! OffloadManager implementation for background task execution.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use cashew_core::Offload;
use dashmap::DashMap;
use smol_str::SmolStr;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::{Instrument, debug, info_span, warn};

use super::policy::{OffloadConfig, TimeoutPolicy};
use crate::metrics;

#[derive(Debug)]
struct TaskHandle {
    kind: SmolStr,
    handle: JoinHandle<()>,
}

#[derive(Debug)]
struct OffloadManagerInner {
    config: OffloadConfig,
    tasks: DashMap<u64, TaskHandle>,
    next_id: AtomicU64,
    slots: Option<Arc<Semaphore>>,
}

/// Runs background tasks with an optional concurrency limit and timeout.
///
/// Clones share the same task set.
#[derive(Clone, Debug)]
pub struct OffloadManager {
    inner: Arc<OffloadManagerInner>,
}

impl OffloadManager {
    pub fn new(config: OffloadConfig) -> Self {
        let slots = config
            .max_concurrent_tasks
            .map(|max| Arc::new(Semaphore::new(max.max(1))));
        Self {
            inner: Arc::new(OffloadManagerInner {
                config,
                tasks: DashMap::new(),
                next_id: AtomicU64::new(0),
                slots,
            }),
        }
    }

    /// Spawns `task` on the current tokio runtime.
    ///
    /// `kind` labels the task in tracing spans and metrics. Must be called
    /// from within a runtime.
    pub fn spawn<F>(&self, kind: impl Into<SmolStr>, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let kind = kind.into();
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let span = info_span!("cashew.offload", kind = %kind, id);

        let inner = self.inner.clone();
        let task_kind = kind.clone();
        let handle = tokio::spawn(
            async move {
                let _permit = match &inner.slots {
                    Some(slots) => match slots.clone().acquire_owned().await {
                        Ok(permit) => Some(permit),
                        // Closed only when the manager is gone.
                        Err(_) => return,
                    },
                    None => None,
                };
                metrics::offload_started(&task_kind);
                let start = Instant::now();
                run_with_policy(inner.config.timeout_policy, task).await;
                metrics::offload_finished(&task_kind, start.elapsed());
                inner.tasks.remove(&id);
            }
            .instrument(span),
        );

        debug!(kind = %kind, id, "offloaded task");
        if !handle.is_finished() {
            self.inner.tasks.insert(id, TaskHandle { kind, handle });
        }
    }

    /// Number of tracked tasks that have not finished yet, including ones
    /// waiting for a free slot.
    pub fn active_task_count(&self) -> usize {
        self.inner
            .tasks
            .iter()
            .filter(|task| !task.handle.is_finished())
            .count()
    }

    /// Aborts every tracked task.
    pub fn cancel_all(&self) {
        for task in self.inner.tasks.iter() {
            debug!(kind = %task.kind, id = *task.key(), "cancelling offloaded task");
            task.handle.abort();
        }
        self.cleanup_finished();
    }

    fn cleanup_finished(&self) {
        self.inner.tasks.retain(|_, task| !task.handle.is_finished());
    }

    /// Waits until every tracked task has finished.
    pub async fn wait_all(&self) {
        loop {
            self.cleanup_finished();
            if self.inner.tasks.is_empty() {
                break;
            }
            tokio::task::yield_now().await;
        }
    }

    /// Like [`wait_all`](Self::wait_all) with an upper bound. Returns `false`
    /// if tasks were still running when the timeout elapsed.
    pub async fn wait_all_timeout(&self, timeout: Duration) -> bool {
        tokio::time::timeout(timeout, self.wait_all()).await.is_ok()
    }
}

async fn run_with_policy<F>(policy: TimeoutPolicy, task: F)
where
    F: Future<Output = ()>,
{
    match policy {
        TimeoutPolicy::None => task.await,
        TimeoutPolicy::Cancel(limit) => {
            if tokio::time::timeout(limit, task).await.is_err() {
                warn!(timeout_ms = limit.as_millis(), "offloaded task cancelled after timeout");
                metrics::offload_timed_out();
            }
        }
        TimeoutPolicy::Warn(limit) => {
            let start = Instant::now();
            task.await;
            let elapsed = start.elapsed();
            if elapsed > limit {
                warn!(
                    elapsed_ms = elapsed.as_millis(),
                    threshold_ms = limit.as_millis(),
                    "offloaded task exceeded timeout threshold"
                );
            }
        }
    }
}

impl Default for OffloadManager {
    fn default() -> Self {
        Self::new(OffloadConfig::default())
    }
}

impl Offload for OffloadManager {
    fn spawn<F>(&self, kind: impl Into<SmolStr>, future: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        OffloadManager::spawn(self, kind, future);
    }
}
