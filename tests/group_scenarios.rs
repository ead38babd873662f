//! Cross-module scenarios spanning the group coordinator, its cache, and its
//! coalescer, modeled on the teacher's colocated-style correctness suite but
//! exercising this crate's async `Group` instead of a synchronous LFU/LRU.

use async_trait::async_trait;
use bytes::Bytes;
use distcache::error::CacheResult;
use distcache::group::Loader;
use distcache::hub::Hub;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

struct CountingLoader {
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl Loader for CountingLoader {
    async fn load(&self, key: &str) -> CacheResult<Bytes> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(Bytes::from(format!("value-for-{key}")))
    }
}

/// Scenario 4 / invariant 3: 100 concurrent `Get`s against a fresh cache
/// invoke the loader exactly once and every caller observes the same value.
#[tokio::test]
async fn concurrent_gets_against_a_fresh_cache_coalesce_into_one_load() {
    let calls = Arc::new(AtomicUsize::new(0));
    let hub = Hub::standalone();
    let group = hub
        .new_group("g", 0, Arc::new(CountingLoader { calls: calls.clone() }))
        .unwrap();

    let mut handles = Vec::new();
    for _ in 0..100 {
        let group = group.clone();
        handles.push(tokio::spawn(async move { group.get("k").await }));
    }

    let mut values = Vec::new();
    for h in handles {
        values.push(h.await.unwrap().unwrap());
    }

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    let expected = values[0].clone();
    for v in &values {
        assert_eq!(v, &expected);
    }
}

/// Scenario 5 / invariant 5: a local-only write is visible to an immediate
/// `Get` without ever invoking the loader.
#[tokio::test]
async fn write_local_set_then_get_never_touches_the_loader() {
    let calls = Arc::new(AtomicUsize::new(0));
    let hub = Hub::standalone();
    let group = hub
        .new_group("g", 0, Arc::new(CountingLoader { calls: calls.clone() }))
        .unwrap();

    group.set("k", Bytes::from_static(b"written"), true).await.unwrap();
    let value = group.get("k").await.unwrap();

    assert_eq!(value.bytes().as_ref(), b"written");
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

/// Invariant 4: a `Get` against an expired entry removes it, re-runs the
/// loader exactly once, and leaves a fresh entry behind.
#[tokio::test]
async fn get_against_an_expired_entry_reloads_exactly_once() {
    let calls = Arc::new(AtomicUsize::new(0));
    let hub = Hub::standalone();
    let group = hub
        .new_group("g", 0, Arc::new(CountingLoader { calls: calls.clone() }))
        .unwrap();

    // First load populates the cache with a 1s TTL.
    let first = group.get("k").await.unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    tokio::time::sleep(std::time::Duration::from_millis(1100)).await;

    let second = group.get("k").await.unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(first.bytes(), second.bytes());
    assert!(second.expire() > first.expire());
}

#[tokio::test]
async fn independent_hubs_never_cross_contaminate_groups() {
    let calls_a = Arc::new(AtomicUsize::new(0));
    let calls_b = Arc::new(AtomicUsize::new(0));
    let hub_a = Hub::standalone();
    let hub_b = Hub::standalone();
    let group_a = hub_a
        .new_group("same-name", 0, Arc::new(CountingLoader { calls: calls_a.clone() }))
        .unwrap();
    let group_b = hub_b
        .new_group("same-name", 0, Arc::new(CountingLoader { calls: calls_b.clone() }))
        .unwrap();

    group_a.get("k").await.unwrap();
    assert_eq!(calls_a.load(Ordering::SeqCst), 1);
    assert_eq!(calls_b.load(Ordering::SeqCst), 0);
    let _ = group_b;
}
