//! Single-writer wrapper over [`Lru`].
//!
//! The teacher's concurrent caches shard keys across segments, each with its
//! own lock, trading a single global recency order for parallelism. That
//! trade doesn't fit here: the spec requires one global LRU order and one
//! global byte budget per group, so `SyncCache` instead holds the whole
//! [`Lru`] behind a single `parking_lot::Mutex`. `get` takes the same
//! exclusive lock as every writer because it mutates recency — there is no
//! read-only path into the underlying cache.
//!
//! This is the *only* type in the crate allowed to touch a raw [`Lru`]; a
//! [`crate::group::Group`] never holds one directly.

use crate::lru::{EvictCallback, Lru};
use crate::stats::CacheMetrics;
use crate::value::Value;
use parking_lot::Mutex;

/// A mutex-guarded [`Lru`], safe to share across threads via `Arc`.
pub struct SyncCache {
    inner: Mutex<Lru>,
    metrics: Mutex<CacheMetrics>,
}

impl SyncCache {
    /// Creates a cache with the given byte budget and optional eviction
    /// callback. `max_bytes == 0` disables the byte budget.
    pub fn new(max_bytes: i64, on_evict: Option<EvictCallback>) -> Self {
        Self {
            inner: Mutex::new(Lru::new(max_bytes, on_evict)),
            metrics: Mutex::new(CacheMetrics::default()),
        }
    }

    /// Looks up `key`, recording a hit or miss and promoting recency on a hit.
    pub fn get(&self, key: &str) -> Option<Value> {
        let mut inner = self.inner.lock();
        let hit = inner.get(key).cloned();
        let mut metrics = self.metrics.lock();
        match &hit {
            Some(_) => metrics.record_hit(),
            None => metrics.record_miss(),
        }
        hit
    }

    /// Inserts or replaces `key`.
    pub fn add(&self, key: String, value: Value) {
        let mut inner = self.inner.lock();
        inner.add(key, value);
        self.metrics.lock().sync_bytes(inner.current_bytes());
    }

    /// Removes `key` if present.
    pub fn remove(&self, key: &str) {
        let mut inner = self.inner.lock();
        inner.remove(key);
        self.metrics.lock().sync_bytes(inner.current_bytes());
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    /// True when the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    /// Evicts every entry.
    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.clear();
        self.metrics.lock().sync_bytes(0);
    }

    /// A snapshot of hit/miss/byte counters for observability.
    pub fn metrics(&self) -> CacheMetrics {
        self.metrics.lock().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> Value {
        Value::with_expire(s.as_bytes().to_vec(), "g", i64::MAX)
    }

    #[test]
    fn get_and_add_serialize_through_one_lock() {
        let cache = SyncCache::new(0, None);
        cache.add("k".into(), v("v"));
        assert_eq!(cache.get("k").unwrap().bytes().as_ref(), b"v");
        assert!(cache.get("missing").is_none());
        let m = cache.metrics();
        assert_eq!(m.hits, 1);
        assert_eq!(m.misses, 1);
    }

    #[test]
    fn remove_and_clear_update_metrics_bytes() {
        let cache = SyncCache::new(0, None);
        cache.add("k".into(), v("v"));
        cache.remove("k");
        assert_eq!(cache.metrics().current_bytes, 0);
        cache.add("a".into(), v("1"));
        cache.add("b".into(), v("2"));
        cache.clear();
        assert_eq!(cache.len(), 0);
        assert_eq!(cache.metrics().current_bytes, 0);
    }
}
