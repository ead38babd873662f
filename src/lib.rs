//! A distributed in-memory key/value cache organized into named groups.
//!
//! Peers form a logical cluster discovered through an external coordination
//! service; any peer can serve any key, but every key has a single owning
//! peer determined by consistent hashing. On a miss, a peer forwards the
//! request to the owner or falls back to a caller-supplied loader.
//! Concurrent misses for the same key coalesce into a single load. Every
//! cached entry carries an absolute expiration timestamp.
//!
//! # Composing a process
//!
//! ```no_run
//! use distcache::hub::Hub;
//! use distcache::group::{GetterFn, Loader};
//! use async_trait::async_trait;
//! use bytes::Bytes;
//!
//! struct StaticLoader;
//!
//! #[async_trait]
//! impl Loader for StaticLoader {
//!     async fn load(&self, key: &str) -> distcache::error::CacheResult<Bytes> {
//!         Ok(Bytes::from(format!("value-for-{key}")))
//!     }
//! }
//!
//! # async fn run() -> distcache::error::CacheResult<()> {
//! let hub = Hub::standalone();
//! let group = hub.new_group("my-group", 10 * 1024 * 1024, std::sync::Arc::new(StaticLoader))?;
//! let value = group.get("some-key").await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Module map
//!
//! - [`lru`] / [`sync_cache`]: the bounded, single-writer cache core.
//! - [`ring`]: consistent-hash peer selection.
//! - [`coalescer`]: at-most-one-in-flight-load-per-key request coalescing.
//! - [`node_client`]: owner-to-owner HTTP transport.
//! - [`discovery`]: cluster membership and the ring/node-table it feeds.
//! - [`group`]: the coordinator weaving the above together.
//! - [`hub`]: the process-wide registry of groups.
//! - [`server`]: the inbound serve endpoint for peer traffic.
//! - [`config`]: external TOML configuration.

/// Cached value shape: payload bytes, absolute expiration, owning group.
pub mod value;

/// The `(key, value)` pair stored in each LRU list slot.
pub mod entry;

/// A recency-ordered slab-backed doubly linked list, the LRU's backbone.
pub(crate) mod list;

/// A byte-budgeted LRU cache with eviction callbacks.
pub mod lru;

/// Single-writer lock plus hit/miss/byte metrics over an [`lru::Lru`].
pub mod sync_cache;

/// Hit/miss/byte counters for a [`sync_cache::SyncCache`].
pub mod stats;

/// Consistent hash ring for owner selection.
pub mod ring;

/// Request coalescing ("singleflight"): at most one in-flight load per key.
pub mod coalescer;

/// Owner-to-owner peer transport over HTTP.
pub mod node_client;

/// Cluster membership: peer discovery feeding the ring and node table.
pub mod discovery;

/// The group coordinator: cache, ring, coalescer and loader woven together.
pub mod group;

/// Process-wide composition root owning every named group.
pub mod hub;

/// Inbound serve endpoint for peer `Get`/`Set`/`Delete` traffic.
pub mod server;

/// External TOML configuration, parsed and validated.
pub mod config;

/// TTL and sizing constants.
pub mod consts;

/// Error types shared across the crate.
pub mod error;

pub use error::{CacheError, CacheResult};
pub use group::Group;
pub use hub::Hub;
pub use value::Value;
