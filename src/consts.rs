//! TTL and sizing constants carried over from the original implementation.
//!
//! Per design note, these look low for production but are preserved as-is
//! and exposed through [`crate::config::Config`] rather than hardcoded.

/// TTL applied to a value fetched from a peer or the loader and cached locally.
pub const DEFAULT_LOCAL_TTL_SECS: i64 = 1;

/// TTL applied when a value is populated as the authoritative owner copy.
pub const DEFAULT_NODE_TTL_SECS: i64 = 60;

/// Default virtual replicas per node on the consistent hash ring.
pub const DEFAULT_REPLICAS: usize = 50;

/// Byte budget for a group the serve endpoint auto-creates for inbound peer
/// traffic it was never explicitly configured for.
pub const DEFAULT_AUTO_GROUP_MAX_BYTES: i64 = 64 * 1024 * 1024;

/// Current time as seconds since the Unix epoch, clamped to the representable
/// range of `i64`. Centralized here so every TTL comparison in the crate uses
/// the same clock source.
pub fn now_unix() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}
