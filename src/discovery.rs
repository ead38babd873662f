//! Cluster membership: peer discovery and the ring/node-table it feeds.
//!
//! Grounded on `original_source/internal/register/register.go`: a node
//! registers itself under a leased key and renews the lease on a background
//! timer (`ListenLeaseRespChan`'s Rust analogue is a `tokio::spawn`ed renewal
//! loop); other peers watch a prefix and react to `Put`/`Delete` events. The
//! external coordination service itself (etcd in the original) is out of
//! scope per the crate's non-goals — only the `DiscoveryBackend` interface is
//! specified, the same "external collaborator, interface only" treatment the
//! distilled requirements give the wire protocol and config parser.
//!
//! `Subscriber` keeps the node table and the ring behind one lock so the two
//! never drift apart mid-update, and `close` gives its watch task a
//! deterministic shutdown instead of leaving it detached forever.

use crate::node_client::NodeClient;
use crate::ring::HashRing;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::warn;

/// A membership change observed from the coordination service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscoveryEvent {
    /// Initial membership snapshot: `(node_name, endpoint)` pairs.
    Snapshot(Vec<(String, String)>),
    /// A node registered or refreshed its lease.
    Put(String, String),
    /// A node's lease expired or it deregistered explicitly.
    Delete(String),
}

/// A handle to an active lease registration; dropping it stops renewal.
pub struct LeaseHandle {
    _renew_task: tokio::task::JoinHandle<()>,
}

/// The external coordination-service interface. A production implementation
/// wraps a client for the service in use (etcd, Consul, ...); this crate
/// ships only the trait and an in-memory test double.
#[async_trait]
pub trait DiscoveryBackend: Send + Sync {
    /// A stream of membership events, starting with an initial `Snapshot`.
    async fn watch(&self) -> mpsc::Receiver<DiscoveryEvent>;

    /// Registers `name` at `endpoint` under a lease that must be renewed
    /// roughly every `lease_ttl / 2` to stay alive.
    async fn register(&self, name: String, endpoint: String, lease_ttl: Duration) -> LeaseHandle;
}

/// An in-memory `DiscoveryBackend` for tests and single-process demos: lets
/// a test drive `put`/`delete` synchronously without a running coordination
/// service.
#[derive(Default)]
pub struct StaticDiscoveryBackend {
    senders: parking_lot::Mutex<Vec<mpsc::Sender<DiscoveryEvent>>>,
    members: parking_lot::Mutex<HashMap<String, String>>,
}

impl StaticDiscoveryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers or updates a node and fans the event out to every watcher.
    pub fn put(&self, name: impl Into<String>, endpoint: impl Into<String>) {
        let (name, endpoint) = (name.into(), endpoint.into());
        self.members.lock().insert(name.clone(), endpoint.clone());
        self.broadcast(DiscoveryEvent::Put(name, endpoint));
    }

    /// Removes a node and fans the event out to every watcher.
    pub fn delete(&self, name: impl Into<String>) {
        let name = name.into();
        self.members.lock().remove(&name);
        self.broadcast(DiscoveryEvent::Delete(name));
    }

    fn broadcast(&self, event: DiscoveryEvent) {
        let mut senders = self.senders.lock();
        senders.retain(|tx| tx.try_send(event.clone()).is_ok());
    }
}

#[async_trait]
impl DiscoveryBackend for StaticDiscoveryBackend {
    async fn watch(&self) -> mpsc::Receiver<DiscoveryEvent> {
        let (tx, rx) = mpsc::channel(64);
        let snapshot: Vec<_> = self
            .members
            .lock()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        let _ = tx.try_send(DiscoveryEvent::Snapshot(snapshot));
        self.senders.lock().push(tx);
        rx
    }

    async fn register(&self, name: String, endpoint: String, lease_ttl: Duration) -> LeaseHandle {
        self.put(name.clone(), endpoint);
        let renew_task = tokio::spawn(async move {
            let mut interval = tokio::time::interval(lease_ttl / 2);
            loop {
                interval.tick().await;
                tracing::debug!(node = %name, "renewing lease");
            }
        });
        LeaseHandle {
            _renew_task: renew_task,
        }
    }
}

/// A factory turning a discovered `(name, endpoint)` pair into a
/// [`NodeClient`] for that peer.
pub type NodeClientFactory = Arc<dyn Fn(&str) -> Arc<dyn NodeClient> + Send + Sync>;

/// The node table and the ring behind one lock, so a reader never observes
/// one updated without the other.
struct SubscriberState {
    nodes: HashMap<String, Arc<dyn NodeClient>>,
    ring: HashRing,
}

/// Owns the node table and the ring, and is their sole writer: it consumes a
/// backend's event stream and keeps both in lockstep under a single lock.
pub struct Subscriber {
    state: RwLock<SubscriberState>,
    make_client: NodeClientFactory,
    watch_task: parking_lot::Mutex<Option<tokio::task::JoinHandle<()>>>,
    shutdown: Arc<tokio::sync::Notify>,
}

impl Subscriber {
    pub fn new(ring: HashRing, make_client: NodeClientFactory) -> Self {
        Self {
            state: RwLock::new(SubscriberState {
                nodes: HashMap::new(),
                ring,
            }),
            make_client,
            watch_task: parking_lot::Mutex::new(None),
            shutdown: Arc::new(tokio::sync::Notify::new()),
        }
    }

    /// Spawns a task that drains `backend`'s event stream and applies every
    /// event to the node table and ring until the channel closes or `close`
    /// is called. Replaces any previously spawned watch task.
    pub fn spawn_watch(self: &Arc<Self>, backend: Arc<dyn DiscoveryBackend>) {
        let this = self.clone();
        let shutdown = self.shutdown.clone();
        let task = tokio::spawn(async move {
            let mut events = backend.watch().await;
            loop {
                tokio::select! {
                    _ = shutdown.notified() => break,
                    event = events.recv() => match event {
                        Some(event) => this.apply(event),
                        None => {
                            warn!("discovery watch channel closed; node table is now frozen");
                            break;
                        }
                    },
                }
            }
        });
        *self.watch_task.lock() = Some(task);
    }

    /// Stops the watch task and waits for it to finish draining any
    /// in-flight event before returning. A no-op if `spawn_watch` was never
    /// called, or was already closed.
    pub async fn close(&self) {
        self.shutdown.notify_one();
        let task = self.watch_task.lock().take();
        if let Some(task) = task {
            let _ = task.await;
        }
    }

    fn apply(&self, event: DiscoveryEvent) {
        let mut state = self.state.write();
        match event {
            DiscoveryEvent::Snapshot(nodes) => {
                state.nodes.clear();
                let names: Vec<String> = nodes.iter().map(|(n, _)| n.clone()).collect();
                for (name, endpoint) in nodes {
                    let client = (self.make_client)(&endpoint);
                    state.nodes.insert(name, client);
                }
                state.ring.add(&names);
            }
            DiscoveryEvent::Put(name, endpoint) => {
                let client = (self.make_client)(&endpoint);
                state.nodes.insert(name.clone(), client);
                state.ring.add(&[name]);
            }
            DiscoveryEvent::Delete(name) => {
                state.nodes.remove(&name);
                state.ring.remove(&name);
            }
        }
    }

    /// The client for the node that owns `key`, or `None` if the ring is
    /// empty or the owner is not (yet) in the node table.
    pub fn pick(&self, key: &str) -> Option<Arc<dyn NodeClient>> {
        let state = self.state.read();
        let owner = state.ring.get(key)?;
        state.nodes.get(&owner).cloned()
    }

    /// The ring-assigned owner's node name for `key`, regardless of whether
    /// that name is present in the node table.
    pub fn owner_name(&self, key: &str) -> Option<String> {
        self.state.read().ring.get(key)
    }

    /// Number of known peers.
    pub fn node_count(&self) -> usize {
        self.state.read().nodes.len()
    }
}
