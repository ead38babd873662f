//! Consistent hash ring for owner-selection across peers.
//!
//! Grounded on `original_source/consistenthash/consistenthash.go`: each node
//! name is hashed under `replicas` virtual positions, the positions are kept
//! sorted, and `get` binary-searches for the first position `>= hash(key)`,
//! wrapping around to the first position when `hash(key)` exceeds them all.
//!
//! CRC32 (via `crc32fast`) replaces Go's `hash/crc32.ChecksumIEEE` as the
//! default hash — same algorithm, ecosystem crate instead of hand-rolling it.

use parking_lot::RwLock;
use std::collections::HashMap;

/// A pluggable hash function from bytes to a 32-bit digest.
pub type HashFn = Box<dyn Fn(&[u8]) -> u32 + Send + Sync>;

fn default_hash(data: &[u8]) -> u32 {
    crc32fast::hash(data)
}

struct RingState {
    positions: Vec<u32>,
    owners: HashMap<u32, String>,
}

/// A consistent hash ring mapping keys to owning node names.
///
/// `replicas` virtual positions are created per node to smooth load
/// distribution; `add`/`remove` take an exclusive lock, `get` a shared one.
pub struct HashRing {
    replicas: usize,
    hash: HashFn,
    state: RwLock<RingState>,
}

impl HashRing {
    /// Creates an empty ring with `replicas` virtual nodes per real node and
    /// the default CRC32 hash.
    pub fn new(replicas: usize) -> Self {
        Self::with_hash(replicas, Box::new(default_hash))
    }

    /// Creates an empty ring with a caller-supplied hash function.
    pub fn with_hash(replicas: usize, hash: HashFn) -> Self {
        Self {
            replicas,
            hash,
            state: RwLock::new(RingState {
                positions: Vec::new(),
                owners: HashMap::new(),
            }),
        }
    }

    /// Adds `nodes` to the ring, each under `replicas` virtual positions.
    /// Adding a name already present replaces its existing positions first,
    /// so `add` is idempotent with respect to ring membership.
    pub fn add(&self, nodes: &[String]) {
        let mut state = self.state.write();
        for name in nodes {
            remove_owner(&mut state, name);
            for i in 0..self.replicas {
                let key = format!("{i}{name}");
                let pos = (self.hash)(key.as_bytes());
                state.positions.push(pos);
                state.owners.insert(pos, name.clone());
            }
        }
        state.positions.sort_unstable();
        state.positions.dedup();
    }

    /// Removes `name` and all of its virtual positions from the ring.
    pub fn remove(&self, name: &str) {
        let mut state = self.state.write();
        remove_owner(&mut state, name);
    }

    /// Returns the owning node name for `key`, or `None` if the ring is empty.
    pub fn get(&self, key: &str) -> Option<String> {
        let state = self.state.read();
        if state.positions.is_empty() {
            return None;
        }
        let hash = (self.hash)(key.as_bytes());
        let idx = match state.positions.binary_search(&hash) {
            Ok(i) => i,
            Err(i) => i % state.positions.len(),
        };
        state.owners.get(&state.positions[idx]).cloned()
    }

    /// True when the ring holds no nodes.
    pub fn is_empty(&self) -> bool {
        self.state.read().positions.is_empty()
    }

    /// Number of distinct node names currently on the ring.
    pub fn node_count(&self) -> usize {
        let state = self.state.read();
        state.owners.values().collect::<std::collections::HashSet<_>>().len()
    }
}

fn remove_owner(state: &mut RingState, name: &str) {
    let stale: Vec<u32> = state
        .owners
        .iter()
        .filter(|(_, v)| v.as_str() == name)
        .map(|(k, _)| *k)
        .collect();
    for pos in stale {
        state.owners.remove(&pos);
        if let Ok(i) = state.positions.binary_search(&pos) {
            state.positions.remove(i);
        }
    }
}
