//! The `(key, Value)` pair stored in each [`crate::list::List`] slot.

use crate::value::Value;

/// One element of the LRU's recency-ordered list.
///
/// The cache's index maps `key -> list position`; this struct is the
/// payload at that position. Kept as a named struct (rather than a bare
/// tuple) so call sites read `entry.key`/`entry.value` instead of `.0`/`.1`.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// The cache key.
    pub key: String,
    /// The cached value.
    pub value: Value,
}

impl CacheEntry {
    /// Builds an entry from a key and value.
    pub fn new(key: String, value: Value) -> Self {
        Self { key, value }
    }

    /// The billed size of this entry: `key.len() + value.len()`.
    pub fn billed_size(&self) -> i64 {
        crate::value::billed_size(&self.key, &self.value)
    }
}
