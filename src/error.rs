//! Crate-wide error type.
//!
//! Every fallible operation in `distcache` returns [`CacheError`]. The
//! variants line up with the error kinds named in the design: validation
//! failures are the caller's fault, everything else originates somewhere in
//! the cluster (a peer, a loader, the discovery backend).

use thiserror::Error;

/// The result type used throughout this crate.
pub type CacheResult<T> = Result<T, CacheError>;

/// Errors surfaced by groups, the node client, discovery and configuration.
#[derive(Error, Debug, Clone)]
pub enum CacheError {
    /// A caller-supplied argument was invalid (empty key, missing config field).
    #[error("validation error: {0}")]
    Validation(String),

    /// The key was absent from the local cache and the loader reported it
    /// does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Connect failure, timeout, or a non-2xx status from a peer.
    #[error("transport error: {0}")]
    Transport(String),

    /// A peer response could not be decoded.
    #[error("decode error: {0}")]
    Decode(String),

    /// A peer responded with `success = false`.
    #[error("peer error: {0}")]
    Peer(String),

    /// The user-supplied loader returned an error.
    #[error("loader error: {0}")]
    Loader(String),

    /// The coordination service is unreachable or a lease was not granted.
    #[error("discovery error: {0}")]
    Discovery(String),
}

impl CacheError {
    /// True for the kinds `Get` recovers from by falling through to the
    /// loader: a dead peer, an undecodable response, or a peer-reported
    /// logical failure.
    pub fn is_peer_recoverable(&self) -> bool {
        matches!(self, CacheError::Transport(_) | CacheError::Peer(_) | CacheError::Decode(_))
    }
}
