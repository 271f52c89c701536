//! Cache decision type.

/// Result of a cache decision.
///
/// Both variants keep the entity; the variant tells the caller whether it
/// may be stored.
///
/// ```
/// use cashew_core::CachePolicy;
///
/// fn decide(status: u16, body: String) -> CachePolicy<String, String> {
///     if status == 200 {
///         CachePolicy::Cacheable(body)
///     } else {
///         CachePolicy::NonCacheable(body)
///     }
/// }
///
/// assert!(decide(200, "ok".into()).is_cacheable());
/// assert!(!decide(500, "boom".into()).is_cacheable());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CachePolicy<C, N> {
    /// Entity should be cached.
    Cacheable(C),
    /// Entity should not be cached; pass it through.
    NonCacheable(N),
}

impl<C, N> CachePolicy<C, N> {
    pub fn is_cacheable(&self) -> bool {
        matches!(self, CachePolicy::Cacheable(_))
    }

    /// Applies `f` to the cacheable variant.
    pub fn map_cacheable<U, F>(self, f: F) -> CachePolicy<U, N>
    where
        F: FnOnce(C) -> U,
    {
        match self {
            CachePolicy::Cacheable(c) => CachePolicy::Cacheable(f(c)),
            CachePolicy::NonCacheable(n) => CachePolicy::NonCacheable(n),
        }
    }
}
