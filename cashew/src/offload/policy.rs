//! Offload task policies and configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// What to do with a task that runs too long.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeoutPolicy {
    /// Run until completion.
    #[default]
    None,
    /// Cancel the task after the duration.
    Cancel(#[serde(with = "humantime_serde")] Duration),
    /// Log a warning once the task finishes past the duration.
    Warn(#[serde(with = "humantime_serde")] Duration),
}

/// Configuration for the [`OffloadManager`](super::OffloadManager).
///
/// ```
/// use cashew::offload::{OffloadConfig, TimeoutPolicy};
/// use std::time::Duration;
///
/// let config: OffloadConfig = serde_saphyr::from_str("
/// max_concurrent_tasks: 4
/// timeout_policy:
///   warn: 10s
/// ").unwrap();
/// assert_eq!(config.max_concurrent_tasks, Some(4));
/// assert_eq!(config.timeout_policy, TimeoutPolicy::Warn(Duration::from_secs(10)));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OffloadConfig {
    /// Maximum number of tasks running at once; `None` means unlimited.
    /// Tasks above the limit wait for a slot.
    pub max_concurrent_tasks: Option<usize>,
    pub timeout_policy: TimeoutPolicy,
}

impl OffloadConfig {
    pub fn builder() -> OffloadConfigBuilder {
        OffloadConfigBuilder::default()
    }
}

/// Builder for [`OffloadConfig`].
#[derive(Debug, Clone, Default)]
pub struct OffloadConfigBuilder {
    max_concurrent_tasks: Option<usize>,
    timeout_policy: TimeoutPolicy,
}

impl OffloadConfigBuilder {
    pub fn max_concurrent_tasks(self, max: usize) -> Self {
        Self {
            max_concurrent_tasks: Some(max),
            ..self
        }
    }

    pub fn timeout_policy(self, policy: TimeoutPolicy) -> Self {
        Self {
            timeout_policy: policy,
            ..self
        }
    }

    /// Cancel tasks running longer than `duration`.
    pub fn timeout(self, duration: Duration) -> Self {
        self.timeout_policy(TimeoutPolicy::Cancel(duration))
    }

    pub fn build(self) -> OffloadConfig {
        OffloadConfig {
            max_concurrent_tasks: self.max_concurrent_tasks,
            timeout_policy: self.timeout_policy,
        }
    }
}
