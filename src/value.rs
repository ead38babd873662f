//! The cached value shape.
//!
//! The source this crate is modeled on carried two incompatible value shapes
//! (a bare byte slice, and a byte slice plus expiry plus owning group). This
//! crate standardizes on the richer shape everywhere: every [`Value`] knows
//! its own absolute expiration and the group it was populated for, so a
//! [`crate::group::Group`] never has to thread that context through separately.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// An immutable cached payload with an absolute expiration timestamp.
///
/// Values are never mutated after construction; a caller who wants to change
/// one builds a new `Value` and calls `add`/`Set` again. `expire` is seconds
/// since the Unix epoch, matching the wire format in [`crate::node_client`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Value {
    bytes: Bytes,
    expire: i64,
    group: String,
}

impl Value {
    /// Builds a value that expires `ttl_secs` from `now`.
    pub fn new(bytes: impl Into<Bytes>, group: impl Into<String>, now: i64, ttl_secs: i64) -> Self {
        Self {
            bytes: bytes.into(),
            expire: now.saturating_add(ttl_secs),
            group: group.into(),
        }
    }

    /// Builds a value with an explicit absolute expiration.
    pub fn with_expire(bytes: impl Into<Bytes>, group: impl Into<String>, expire: i64) -> Self {
        Self {
            bytes: bytes.into(),
            expire,
            group: group.into(),
        }
    }

    /// The payload bytes. Cloning a `Value` is a cheap refcount bump on this
    /// field, not a deep copy, so callers never see a torn read.
    pub fn bytes(&self) -> &Bytes {
        &self.bytes
    }

    /// Payload length in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// True when the payload is empty.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Absolute expiration, seconds since the Unix epoch.
    pub fn expire(&self) -> i64 {
        self.expire
    }

    /// The group this value was populated for.
    pub fn group(&self) -> &str {
        &self.group
    }

    /// Whether this value is stale as of `now`. `EXPIRED` entries are never
    /// served; the reader that observes this removes the entry.
    pub fn is_expired(&self, now: i64) -> bool {
        now >= self.expire
    }
}

/// The billed size of a cache entry: `key.len() + value.len()`, matching the
/// byte-budget accounting in [`crate::lru::Lru`].
pub fn billed_size(key: &str, value: &Value) -> i64 {
    (key.len() + value.len()) as i64
}
