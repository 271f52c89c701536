//! Cache status reported with every engine result.

/// How a value was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheStatus {
    /// Served from a fresh cached entry; the origin was not contacted.
    Hit,
    /// Fetched from the origin without storing the result: there was no
    /// usable entry, or a refresh produced a response that may not be cached.
    Miss,
    /// A soft-expired entry was served, either because a refresh is running
    /// elsewhere or because the refresh failed.
    Stale,
    /// A soft-expired entry was replaced by a fresh origin response.
    Refreshed,
    /// The origin answered `304 Not Modified`; the cached value was served.
    Revalidated,
}

impl CacheStatus {
    /// Label used in logs and metrics.
    #[inline]
    pub const fn as_str(&self) -> &'static str {
        match self {
            CacheStatus::Hit => "hit",
            CacheStatus::Miss => "miss",
            CacheStatus::Stale => "stale",
            CacheStatus::Refreshed => "refreshed",
            CacheStatus::Revalidated => "revalidated",
        }
    }

    /// Whether the value came from the cache rather than a new origin body.
    pub fn is_cached(&self) -> bool {
        matches!(
            self,
            CacheStatus::Hit | CacheStatus::Stale | CacheStatus::Revalidated
        )
    }
}

impl std::fmt::Display for CacheStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
