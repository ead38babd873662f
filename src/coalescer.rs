//! Request coalescing ("singleflight"): at most one in-flight load per key.
//!
//! Mirrors the teacher's lock-guarded shared-state pattern, adapted from
//! synchronous segment locks to an async completion signal: the producer
//! runs the supplied future to completion and broadcasts its result;
//! consumers that arrived while it was in flight await the broadcast instead
//! of re-running the future. Dropping a consumer's `await` (e.g. the caller's
//! task is cancelled) does not cancel the producer — the broadcast channel
//! is independent of any one receiver.

use crate::error::CacheError;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::broadcast;

type CallResult<T> = Result<T, CacheError>;

struct InFlight<T> {
    sender: broadcast::Sender<CallResult<T>>,
}

/// Deduplicates concurrent calls for the same key across all callers sharing
/// one `Coalescer`.
pub struct Coalescer<T: Clone + Send + 'static> {
    inflight: Mutex<HashMap<String, Arc<InFlight<T>>>>,
}

impl<T: Clone + Send + 'static> Coalescer<T> {
    /// An empty coalescer with no in-flight calls.
    pub fn new() -> Self {
        Self {
            inflight: Mutex::new(HashMap::new()),
        }
    }

    /// Runs `fut` for `key` if no call for that key is already in flight;
    /// otherwise awaits the in-flight call's result. Every caller for a key
    /// — producer and consumers alike — observes the identical result.
    ///
    /// The in-flight record is removed before the producer returns, so the
    /// next call for the same key always starts a fresh load.
    pub async fn do_call<F>(&self, key: &str, fut: F) -> CallResult<T>
    where
        F: Future<Output = CallResult<T>>,
    {
        let mut receiver = {
            let mut inflight = self.inflight.lock();
            if let Some(existing) = inflight.get(key) {
                Some(existing.sender.subscribe())
            } else {
                let (sender, _) = broadcast::channel(1);
                inflight.insert(key.to_string(), Arc::new(InFlight { sender }));
                None
            }
        };

        if let Some(rx) = receiver.take() {
            return wait_for_result(rx).await;
        }

        let result = fut.await;

        let record = self.inflight.lock().remove(key);
        if let Some(record) = record {
            // Ignore send errors: no consumers subscribed means nobody is
            // waiting, which is not a failure.
            let _ = record.sender.send(result.clone());
        }
        result
    }

    /// Number of keys with a load currently in flight.
    pub fn in_flight_count(&self) -> usize {
        self.inflight.lock().len()
    }
}

impl<T: Clone + Send + 'static> Default for Coalescer<T> {
    fn default() -> Self {
        Self::new()
    }
}

async fn wait_for_result<T: Clone>(
    mut rx: broadcast::Receiver<CallResult<T>>,
) -> CallResult<T> {
    match rx.recv().await {
        Ok(result) => result,
        Err(_) => Err(CacheError::Loader(
            "in-flight call producer was dropped before completing".into(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Invariant 3 / scenario 4: n concurrent calls for the same key invoke
    /// the underlying function exactly once and all observe the same result.
    #[tokio::test]
    async fn concurrent_calls_for_same_key_invoke_loader_once() {
        let coalescer = Arc::new(Coalescer::<String>::new());
        let calls = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..20 {
            let coalescer = coalescer.clone();
            let calls = calls.clone();
            handles.push(tokio::spawn(async move {
                coalescer
                    .do_call("shared-key", async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(20)).await;
                        Ok("value".to_string())
                    })
                    .await
            }));
        }

        let mut results = Vec::new();
        for h in handles {
            results.push(h.await.unwrap());
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        for r in results {
            assert_eq!(r.unwrap(), "value");
        }
    }

    #[tokio::test]
    async fn a_fresh_call_starts_after_the_prior_one_completes() {
        let coalescer = Coalescer::<u32>::new();
        let first = coalescer.do_call("k", async { Ok(1) }).await.unwrap();
        assert_eq!(first, 1);
        assert_eq!(coalescer.in_flight_count(), 0);

        let second = coalescer.do_call("k", async { Ok(2) }).await.unwrap();
        assert_eq!(second, 2);
    }

    #[tokio::test]
    async fn consumers_observe_the_producers_error() {
        let coalescer = Arc::new(Coalescer::<u32>::new());
        let gate = Arc::new(tokio::sync::Notify::new());

        let producer_gate = gate.clone();
        let coalescer_producer = coalescer.clone();
        let producer = tokio::spawn(async move {
            coalescer_producer
                .do_call("k", async move {
                    producer_gate.notified().await;
                    Err(CacheError::Loader("boom".into()))
                })
                .await
        });

        // Give the producer a chance to register the in-flight record.
        tokio::time::sleep(Duration::from_millis(10)).await;
        let coalescer_consumer = coalescer.clone();
        let consumer = tokio::spawn(async move {
            coalescer_consumer
                .do_call("k", async { panic!("consumer must not run its own thunk") })
                .await
        });

        gate.notify_one();
        let (p, c) = tokio::join!(producer, consumer);
        assert!(p.unwrap().is_err());
        assert!(c.unwrap().is_err());
    }
}
