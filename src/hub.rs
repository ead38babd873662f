//! Process-wide composition root, replacing a package-level singleton.
//!
//! `original_source/distributed_cache.go` keeps `var groups =
//! make(map[string]*Group)` as global mutable state guarded by a package
//! lock. That shape doesn't survive translation: Rust has no implicit
//! process-wide statics to reach for, and tests need independent instances
//! to avoid cross-test interference. `Hub` makes that registry an explicit,
//! constructible value instead.

use crate::discovery::Subscriber;
use crate::error::{CacheError, CacheResult};
use crate::group::{Group, Loader, NullLoader};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Owns every named [`Group`] in one process plus the shared discovery
/// subscriber they forward peer traffic through.
pub struct Hub {
    discovery: Option<Arc<Subscriber>>,
    self_name: Option<String>,
    groups: RwLock<HashMap<String, Arc<Group>>>,
}

impl Hub {
    /// A hub with no peer discovery: every group behaves as a standalone
    /// cache, falling straight through to its loader on every miss.
    pub fn standalone() -> Self {
        Self {
            discovery: None,
            self_name: None,
            groups: RwLock::new(HashMap::new()),
        }
    }

    /// A hub that forwards peer traffic through `discovery`, identifying
    /// itself as `self_name` so the group layer can short-circuit local
    /// ring ownership back to the loader instead of looping over the wire.
    pub fn with_discovery(discovery: Arc<Subscriber>, self_name: impl Into<String>) -> Self {
        Self {
            discovery: Some(discovery),
            self_name: Some(self_name.into()),
            groups: RwLock::new(HashMap::new()),
        }
    }

    /// Creates and registers a new group. Fails if `name` is already taken —
    /// the only constructor for a `Group` is this method, so the registry
    /// can never drift out of sync with what's constructable.
    pub fn new_group(
        &self,
        name: impl Into<String>,
        max_bytes: i64,
        loader: Arc<dyn Loader>,
    ) -> CacheResult<Arc<Group>> {
        let name = name.into();
        let mut groups = self.groups.write();
        if groups.contains_key(&name) {
            return Err(CacheError::Validation(format!(
                "group {name:?} already exists"
            )));
        }
        let group = Arc::new(Group::new(
            name.clone(),
            max_bytes,
            loader,
            self.discovery.clone(),
            self.self_name.clone(),
        ));
        groups.insert(name, group.clone());
        Ok(group)
    }

    /// Returns an existing group, or auto-creates one with a null loader and
    /// `max_bytes` budget if absent. Used by the serve endpoint, which must
    /// accept inbound traffic for a group it never explicitly configured but
    /// cannot satisfy a local miss for (no loader was ever supplied).
    pub fn get_or_create_group(&self, name: &str, max_bytes: i64) -> Arc<Group> {
        if let Some(group) = self.groups.read().get(name) {
            return group.clone();
        }
        let mut groups = self.groups.write();
        groups
            .entry(name.to_string())
            .or_insert_with(|| {
                Arc::new(Group::new(
                    name.to_string(),
                    max_bytes,
                    Arc::new(NullLoader),
                    self.discovery.clone(),
                    self.self_name.clone(),
                ))
            })
            .clone()
    }

    /// Looks up a previously created group by name.
    pub fn group(&self, name: &str) -> Option<Arc<Group>> {
        self.groups.read().get(name).cloned()
    }

    /// Number of registered groups.
    pub fn group_count(&self) -> usize {
        self.groups.read().len()
    }
}
