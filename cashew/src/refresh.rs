//! In-flight refresh tracking.

use std::sync::Arc;

use cashew_core::CacheKey;
use dashmap::{DashMap, mapref::entry::Entry};

/// Keys whose refresh is currently running.
///
/// [`try_acquire`](Self::try_acquire) is an atomic check-and-insert: for a
/// given key at most one [`RefreshGuard`] exists at a time. The key is
/// released when the guard drops, so a refresh that fails, panics or is
/// cancelled never blocks later ones.
#[derive(Debug, Clone, Default)]
pub struct RefreshRegistry {
    in_flight: Arc<DashMap<CacheKey, ()>>,
}

impl RefreshRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks `key` as refreshing, or returns `None` if it already is.
    pub fn try_acquire(&self, key: &CacheKey) -> Option<RefreshGuard> {
        match self.in_flight.entry(key.clone()) {
            Entry::Occupied(_) => None,
            Entry::Vacant(slot) => {
                slot.insert(());
                Some(RefreshGuard {
                    in_flight: self.in_flight.clone(),
                    key: key.clone(),
                })
            }
        }
    }

    pub fn is_refreshing(&self, key: &CacheKey) -> bool {
        self.in_flight.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.in_flight.len()
    }

    pub fn is_empty(&self) -> bool {
        self.in_flight.is_empty()
    }
}

/// Releases its key from the [`RefreshRegistry`] on drop.
#[derive(Debug)]
#[must_use = "the refresh is released as soon as the guard is dropped"]
pub struct RefreshGuard {
    in_flight: Arc<DashMap<CacheKey, ()>>,
    key: CacheKey,
}

impl RefreshGuard {
    pub fn key(&self) -> &CacheKey {
        &self.key
    }
}

impl Drop for RefreshGuard {
    fn drop(&mut self) {
        self.in_flight.remove(&self.key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_acquire_fails_until_release() {
        let registry = RefreshRegistry::new();
        let key = CacheKey::from_str("k", "1");

        let guard = registry.try_acquire(&key).unwrap();
        assert!(registry.try_acquire(&key).is_none());
        assert!(registry.is_refreshing(&key));

        drop(guard);
        assert!(!registry.is_refreshing(&key));
        assert!(registry.try_acquire(&key).is_some());
    }

    #[test]
    fn keys_are_independent() {
        let registry = RefreshRegistry::new();
        let _a = registry.try_acquire(&CacheKey::from_str("k", "a")).unwrap();
        let _b = registry.try_acquire(&CacheKey::from_str("k", "b")).unwrap();
        assert_eq!(registry.len(), 2);
    }

    #[tokio::test]
    async fn released_when_task_panics() {
        let registry = RefreshRegistry::new();
        let key = CacheKey::from_str("k", "panic");
        let guard = registry.try_acquire(&key).unwrap();

        let result = tokio::spawn(async move {
            let _guard = guard;
            panic!("refresh blew up");
        })
        .await;

        assert!(result.is_err());
        assert!(registry.is_empty());
    }
}
