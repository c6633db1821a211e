use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use tracing::debug;

/// Derived results memoized per store snapshot version.
///
/// import で version が進むと古いエントリは次の保存時に捨てられる。
pub struct SnapshotCache<T> {
    name: &'static str,
    enabled: bool,
    entries: DashMap<u64, Arc<T>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl<T> SnapshotCache<T> {
    pub fn new(name: &'static str, enabled: bool) -> Self {
        Self {
            name,
            enabled,
            entries: DashMap::new(),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Return the cached value for `version`, or compute and remember it
    pub fn get_or_try_insert<E, F>(&self, version: u64, compute: F) -> Result<Arc<T>, E>
    where
        F: FnOnce() -> Result<T, E>,
    {
        if self.enabled {
            if let Some(entry) = self.entries.get(&version) {
                self.hits.fetch_add(1, Ordering::Relaxed);
                return Ok(Arc::clone(entry.value()));
            }
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let value = Arc::new(compute()?);

        if self.enabled {
            self.entries.retain(|v, _| *v > version);
            self.entries.insert(version, value.clone());
            debug!("{} cache stored for version {}", self.name, version);
        }
        Ok(value)
    }

    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    pub fn get_stats(&self) -> serde_json::Value {
        let hits = self.hits();
        let misses = self.misses();
        let total = hits + misses;
        let hit_rate = if total > 0 { hits as f64 / total as f64 * 100.0 } else { 0.0 };

        serde_json::json!({
            "name": self.name,
            "enabled": self.enabled,
            "entries": self.entries.len(),
            "hits": hits,
            "misses": misses,
            "hit_rate_percent": format!("{:.1}", hit_rate),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::Infallible;

    #[test]
    fn test_hit_on_same_version() {
        let cache: SnapshotCache<u32> = SnapshotCache::new("test", true);
        let mut calls = 0;
        let a = cache.get_or_try_insert::<Infallible, _>(1, || { calls += 1; Ok(10) }).unwrap();
        let b = cache.get_or_try_insert::<Infallible, _>(1, || { calls += 1; Ok(20) }).unwrap();
        assert_eq!(*a, 10);
        assert_eq!(*b, 10);
        assert_eq!(calls, 1);
        assert_eq!(cache.hits(), 1);
        assert_eq!(cache.misses(), 1);
    }

    #[test]
    fn test_new_version_recomputes_and_evicts() {
        let cache: SnapshotCache<u32> = SnapshotCache::new("test", true);
        cache.get_or_try_insert::<Infallible, _>(1, || Ok(10)).unwrap();
        let v2 = cache.get_or_try_insert::<Infallible, _>(2, || Ok(20)).unwrap();
        assert_eq!(*v2, 20);
        assert_eq!(cache.entries.len(), 1);
        assert!(cache.entries.contains_key(&2));
    }

    #[test]
    fn test_disabled_always_computes() {
        let cache: SnapshotCache<u32> = SnapshotCache::new("test", false);
        let mut calls = 0;
        for _ in 0..3 {
            cache.get_or_try_insert::<Infallible, _>(1, || { calls += 1; Ok(1) }).unwrap();
        }
        assert_eq!(calls, 3);
        assert_eq!(cache.hits(), 0);
        assert_eq!(cache.entries.len(), 0);
    }

    #[test]
    fn test_errors_are_not_cached() {
        let cache: SnapshotCache<u32> = SnapshotCache::new("test", true);
        assert!(cache.get_or_try_insert(1, || Err("boom")).is_err());
        let ok = cache.get_or_try_insert::<&str, _>(1, || Ok(5)).unwrap();
        assert_eq!(*ok, 5);
    }
}
