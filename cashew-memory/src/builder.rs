//! Builder and serde configuration for [`MemoryCache`].

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::backend::MemoryCache;
use crate::error::Error;

/// Smallest accepted reaper interval.
pub const MIN_EVICTION_INTERVAL: Duration = Duration::from_secs(1);

/// Serializable configuration for a [`MemoryCache`].
///
/// ```
/// use std::time::Duration;
/// use cashew_memory::MemoryCacheConfig;
///
/// let config: MemoryCacheConfig = serde_saphyr::from_str("eviction_interval: 30s").unwrap();
/// assert_eq!(config.eviction_interval, Some(Duration::from_secs(30)));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryCacheConfig {
    /// Period of the background reaper. `None` disables it.
    #[serde(default, with = "humantime_serde")]
    pub eviction_interval: Option<Duration>,
    /// Backend name used in logs and metrics.
    #[serde(default)]
    pub name: Option<String>,
}

impl MemoryCacheConfig {
    /// Builds a cache from this configuration.
    pub fn build(self) -> Result<MemoryCache, Error> {
        let mut builder = MemoryCache::builder();
        if let Some(interval) = self.eviction_interval {
            builder = builder.eviction_interval(interval);
        }
        if let Some(name) = self.name {
            builder = builder.name(name);
        }
        builder.build()
    }
}

/// Builder for [`MemoryCache`].
#[derive(Debug, Clone)]
pub struct MemoryCacheBuilder {
    eviction_interval: Option<Duration>,
    name: String,
}

impl Default for MemoryCacheBuilder {
    fn default() -> Self {
        Self {
            eviction_interval: None,
            name: "memory".to_owned(),
        }
    }
}

impl MemoryCacheBuilder {
    /// Enables the background reaper with the given period.
    ///
    /// The period must be at least [`MIN_EVICTION_INTERVAL`], and
    /// [`build`](Self::build) must then run inside a tokio runtime.
    pub fn eviction_interval(mut self, interval: Duration) -> Self {
        self.eviction_interval = Some(interval);
        self
    }

    /// Sets the backend name.
    ///
    /// # Default
    ///
    /// `"memory"`
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Builds the cache, starting the reaper if an interval was set.
    pub fn build(self) -> Result<MemoryCache, Error> {
        match self.eviction_interval {
            Some(interval) if interval < MIN_EVICTION_INTERVAL => Err(Error::InvalidInterval {
                got: interval,
                min: MIN_EVICTION_INTERVAL,
            }),
            Some(interval) => {
                let runtime =
                    tokio::runtime::Handle::try_current().map_err(|_| Error::NoRuntime)?;
                Ok(MemoryCache::with_reaper(self.name, &runtime, interval))
            }
            None => Ok(MemoryCache::without_reaper(self.name)),
        }
    }
}
