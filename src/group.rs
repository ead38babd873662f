//! The group coordinator: cache lookup, peer forwarding, loader fallback.
//!
//! Grounded on `original_source/distributed_cache.go`'s `Group`/`Getter`
//! pair, rebuilt around this crate's async transport and coalescer. `Loader`
//! is the Rust shape of `Getter`/`GetterFunc`: a trait object for handwritten
//! implementations, plus a blanket impl so a plain async closure can be
//! passed directly to [`crate::hub::Hub::new_group`].

use crate::coalescer::Coalescer;
use crate::consts::{now_unix, DEFAULT_LOCAL_TTL_SECS, DEFAULT_NODE_TTL_SECS};
use crate::discovery::Subscriber;
use crate::error::{CacheError, CacheResult};
use crate::sync_cache::SyncCache;
use crate::value::Value;
use async_trait::async_trait;
use bytes::Bytes;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tracing::warn;

/// Fetches the canonical value for a key on a cache miss. Implementations
/// must not themselves cache the result — that's the group's job.
#[async_trait]
pub trait Loader: Send + Sync {
    async fn load(&self, key: &str) -> CacheResult<Bytes>;
}

type BoxFuture<'a> = Pin<Box<dyn Future<Output = CacheResult<Bytes>> + Send + 'a>>;

/// Wraps a closure `Fn(&str) -> Future<Output = CacheResult<Bytes>>` as a [`Loader`].
pub struct GetterFn<F>(F);

impl<F> GetterFn<F>
where
    F: for<'a> Fn(&'a str) -> BoxFuture<'a> + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

#[async_trait]
impl<F> Loader for GetterFn<F>
where
    F: for<'a> Fn(&'a str) -> BoxFuture<'a> + Send + Sync,
{
    async fn load(&self, key: &str) -> CacheResult<Bytes> {
        (self.0)(key).await
    }
}

/// A loader that never succeeds; used for serve-side auto-created groups
/// (spec's design note: a group auto-created by an inbound peer request has
/// no user-supplied loader and cannot satisfy a local miss).
pub struct NullLoader;

#[async_trait]
impl Loader for NullLoader {
    async fn load(&self, key: &str) -> CacheResult<Bytes> {
        Err(CacheError::Loader(format!(
            "no loader configured for key {key:?}"
        )))
    }
}

/// A named cache namespace: local cache, peer ring, coalescer, and loader
/// woven together. The group name is fixed at construction.
pub struct Group {
    name: String,
    cache: SyncCache,
    coalescer: Coalescer<Value>,
    loader: Arc<dyn Loader>,
    subscriber: Option<Arc<Subscriber>>,
    self_name: Option<String>,
}

impl Group {
    pub(crate) fn new(
        name: String,
        max_bytes: i64,
        loader: Arc<dyn Loader>,
        subscriber: Option<Arc<Subscriber>>,
        self_name: Option<String>,
    ) -> Self {
        Self {
            name,
            cache: SyncCache::new(max_bytes, None),
            coalescer: Coalescer::new(),
            loader,
            subscriber,
            self_name,
        }
    }

    /// This group's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fetches `key`: local cache, then a coalesced peer-or-loader fill.
    pub async fn get(&self, key: &str) -> CacheResult<Value> {
        if key.is_empty() {
            return Err(CacheError::Validation("key must not be empty".into()));
        }

        let now = now_unix();
        if let Some(value) = self.cache.get(key) {
            if !value.is_expired(now) {
                return Ok(value);
            }
            self.cache.remove(key);
        }

        self.coalescer.do_call(key, self.load_and_populate(key)).await
    }

    async fn load_and_populate(&self, key: &str) -> CacheResult<Value> {
        if let Some(owner) = self.pick_remote_owner(key) {
            match owner.get(&self.name, key).await {
                Ok(remote) => {
                    let now = now_unix();
                    let value = Value::new(remote.bytes, self.name.clone(), now, DEFAULT_LOCAL_TTL_SECS);
                    self.cache.add(key.to_string(), value.clone());
                    return Ok(value);
                }
                Err(err) if err.is_peer_recoverable() => {
                    warn!(group = %self.name, key, error = %err, "peer get failed, falling back to loader");
                }
                Err(err) => return Err(err),
            }
        }

        let bytes = self.loader.load(key).await?;
        let now = now_unix();
        let value = Value::new(bytes, self.name.clone(), now, DEFAULT_LOCAL_TTL_SECS);
        self.cache.add(key.to_string(), value.clone());
        Ok(value)
    }

    /// Populates `key` with `value`, optionally forwarding to the owning peer.
    pub async fn set(&self, key: &str, value: Bytes, write_local: bool) -> CacheResult<Value> {
        if key.is_empty() {
            return Err(CacheError::Validation("key must not be empty".into()));
        }

        let now = now_unix();
        let local = Value::new(value.clone(), self.name.clone(), now, DEFAULT_LOCAL_TTL_SECS);
        if write_local {
            self.cache.add(key.to_string(), local.clone());
        }

        if let Some(owner) = self.pick_remote_owner(key) {
            match owner.set(&self.name, key, value).await {
                Ok(remote) => {
                    return Ok(Value::with_expire(remote.bytes, self.name.clone(), remote.expire));
                }
                Err(err) => {
                    warn!(group = %self.name, key, error = %err, "peer set failed, keeping local write-through");
                }
            }
        }

        Ok(local)
    }

    /// Writes an owner-authoritative copy of `key`, stamped with the 60s
    /// node-cache TTL rather than the 1s local-cache TTL `set` uses. Used by
    /// the serve endpoint: a `Set` reaching it has already landed on the
    /// key's owning node, so the copy it writes is the canonical one, not a
    /// short-lived local echo.
    pub fn set_owned(&self, key: &str, value: Bytes) -> CacheResult<Value> {
        if key.is_empty() {
            return Err(CacheError::Validation("key must not be empty".into()));
        }
        let now = now_unix();
        let value = Value::new(value, self.name.clone(), now, Self::node_cache_ttl_secs());
        self.cache.add(key.to_string(), value.clone());
        Ok(value)
    }

    /// Removes `key` locally and, if owned remotely, forwards the delete.
    pub async fn delete(&self, key: &str) -> CacheResult<()> {
        if key.is_empty() {
            return Err(CacheError::Validation("key must not be empty".into()));
        }
        self.cache.remove(key);
        if let Some(owner) = self.pick_remote_owner(key) {
            if let Err(err) = owner.delete(&self.name, key).await {
                warn!(group = %self.name, key, error = %err, "peer delete failed");
            }
        }
        Ok(())
    }

    /// Picks the owning peer for `key`, short-circuiting to `None` when the
    /// ring names this process itself — that case falls straight to the
    /// loader rather than looping a request back over the network.
    fn pick_remote_owner(&self, key: &str) -> Option<Arc<dyn crate::node_client::NodeClient>> {
        let subscriber = self.subscriber.as_ref()?;
        let owner_name = subscriber.owner_name(key)?;
        if self.self_name.as_deref() == Some(owner_name.as_str()) {
            return None;
        }
        subscriber.pick(key)
    }

    /// Exposes the node-cache TTL for callers building owner-authoritative
    /// values outside the group (e.g. the serve endpoint).
    pub fn node_cache_ttl_secs() -> i64 {
        DEFAULT_NODE_TTL_SECS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StaticLoader(String);

    #[async_trait]
    impl Loader for StaticLoader {
        async fn load(&self, key: &str) -> CacheResult<Bytes> {
            Ok(Bytes::from(format!("{}-{key}", self.0)))
        }
    }

    fn no_peer_group(name: &str, loader: Arc<dyn Loader>) -> Group {
        Group::new(name.to_string(), 0, loader, None, None)
    }

    #[tokio::test]
    async fn get_rejects_empty_key() {
        let group = no_peer_group("g", Arc::new(StaticLoader("v".into())));
        assert!(group.get("").await.is_err());
    }

    #[tokio::test]
    async fn get_falls_back_to_loader_on_miss() {
        let group = no_peer_group("g", Arc::new(StaticLoader("v".into())));
        let value = group.get("k").await.unwrap();
        assert_eq!(value.bytes().as_ref(), b"v-k");
        assert_eq!(value.group(), "g");
    }

    /// Scenario 5: Set(writeLocal=true) then Get within the local TTL returns
    /// the written value without invoking the loader.
    #[tokio::test]
    async fn set_write_local_then_get_within_ttl_skips_loader() {
        let group = no_peer_group("g", Arc::new(StaticLoader("loader".into())));
        group.set("k", Bytes::from_static(b"written"), true).await.unwrap();
        let value = group.get("k").await.unwrap();
        assert_eq!(value.bytes().as_ref(), b"written");
    }

    #[tokio::test]
    async fn delete_removes_from_local_cache() {
        let group = no_peer_group("g", Arc::new(StaticLoader("v".into())));
        group.set("k", Bytes::from_static(b"x"), true).await.unwrap();
        group.delete("k").await.unwrap();
        let value = group.get("k").await.unwrap();
        // After deletion the loader runs again, producing a fresh value.
        assert_eq!(value.bytes().as_ref(), b"v-k");
    }

    #[tokio::test]
    async fn loader_error_surfaces_and_caches_nothing() {
        struct FailingLoader;
        #[async_trait]
        impl Loader for FailingLoader {
            async fn load(&self, _key: &str) -> CacheResult<Bytes> {
                Err(CacheError::Loader("boom".into()))
            }
        }
        let group = no_peer_group("g", Arc::new(FailingLoader));
        assert!(group.get("k").await.is_err());
        assert_eq!(group.cache.len(), 0);
    }

    #[test]
    fn node_cache_ttl_matches_the_documented_constant() {
        assert_eq!(Group::node_cache_ttl_secs(), DEFAULT_NODE_TTL_SECS);
    }

    #[test]
    fn set_owned_stamps_the_node_cache_ttl_not_the_local_ttl() {
        let group = no_peer_group("g", Arc::new(StaticLoader("v".into())));
        let now = now_unix();
        let value = group.set_owned("k", Bytes::from_static(b"authoritative")).unwrap();
        assert_eq!(value.bytes().as_ref(), b"authoritative");
        assert_eq!(value.expire(), now + DEFAULT_NODE_TTL_SECS);
    }

    #[tokio::test]
    async fn getter_fn_wraps_a_closure_as_a_loader() {
        let loader = GetterFn::new(|key: &str| {
            let owned = key.to_string();
            Box::pin(async move { Ok(Bytes::from(format!("closure-{owned}"))) }) as BoxFuture<'_>
        });
        let group = no_peer_group("g", Arc::new(loader));
        let value = group.get("k").await.unwrap();
        assert_eq!(value.bytes().as_ref(), b"closure-k");
    }
}
