//! Lightweight hit/miss/byte counters for a [`crate::sync_cache::SyncCache`].
//!
//! Kept deliberately smaller than the teacher's per-policy `metrics` module:
//! there is exactly one eviction policy here, so there is no need for the
//! `CacheMetrics` trait object / `BTreeMap` reporting layer the teacher uses
//! to compare five algorithms side by side.

/// A point-in-time snapshot of a cache's hit/miss/byte counters.
#[derive(Debug, Default, Clone, Copy)]
pub struct CacheMetrics {
    /// Number of `get` calls that found a live entry.
    pub hits: u64,
    /// Number of `get` calls that found nothing (or an expired entry).
    pub misses: u64,
    /// Current billed bytes held by the underlying [`crate::lru::Lru`].
    pub current_bytes: i64,
}

impl CacheMetrics {
    pub(crate) fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub(crate) fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub(crate) fn sync_bytes(&mut self, current_bytes: i64) {
        self.current_bytes = current_bytes;
    }

    /// Hit ratio in `[0.0, 1.0]`; `0.0` when there have been no lookups yet.
    pub fn hit_ratio(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}
