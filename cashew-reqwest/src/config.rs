//! Sender configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Settings for a [`ReqwestSender`](crate::ReqwestSender).
///
/// ```
/// use cashew_reqwest::SenderConfig;
/// use std::time::Duration;
///
/// let config: SenderConfig = serde_saphyr::from_str("
/// url: https://api.example.com
/// read_timeout: 3s
/// accept: application/json
/// ").unwrap();
///
/// assert_eq!(config.connect_timeout, Duration::from_secs(5));
/// assert_eq!(config.read_timeout, Duration::from_secs(3));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SenderConfig {
    /// Base URL; request paths are appended to it.
    pub url: String,
    #[serde(with = "humantime_serde", default = "default_connect_timeout")]
    pub connect_timeout: Duration,
    #[serde(with = "humantime_serde", default = "default_read_timeout")]
    pub read_timeout: Duration,
    /// `Accept` value for requests that do not set one.
    #[serde(default)]
    pub accept: Option<String>,
    /// Ask for and transparently decode gzip responses.
    #[serde(default)]
    pub gzip: bool,
}

fn default_connect_timeout() -> Duration {
    Duration::from_secs(5)
}

fn default_read_timeout() -> Duration {
    Duration::from_secs(20)
}

impl SenderConfig {
    pub fn new(url: impl Into<String>) -> Self {
        SenderConfig {
            url: url.into(),
            connect_timeout: default_connect_timeout(),
            read_timeout: default_read_timeout(),
            accept: None,
            gzip: false,
        }
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    pub fn accept(mut self, accept: impl Into<String>) -> Self {
        self.accept = Some(accept.into());
        self
    }

    pub fn gzip(mut self, enabled: bool) -> Self {
        self.gzip = enabled;
        self
    }
}
