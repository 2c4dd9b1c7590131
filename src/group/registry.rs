//! Named registry of cache groups.
//!
//! The node assembling the process owns one registry and hands it to the peer
//! server, which resolves inbound `{group}` path segments through it.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{info, warn};

use crate::group::cache_group::{Group, GroupError};
use crate::group::loader::OriginLoader;

#[derive(Debug, Default)]
pub struct GroupRegistry {
    groups: RwLock<HashMap<String, Arc<Group>>>,
}

impl GroupRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create and register a group, replacing any group with the same name.
    pub fn create<L>(&self, name: &str, cache_bytes: u64, loader: L) -> Arc<Group>
    where
        L: OriginLoader + 'static,
    {
        let group = Arc::new(Group::new(name, cache_bytes, Arc::new(loader)));
        let previous = self.groups.write().insert(name.to_string(), group.clone());
        if previous.is_some() {
            warn!(group = name, "Replaced existing group");
        }
        info!(group = name, cache_bytes, "Group created");
        group
    }

    /// Look up a group by name.
    pub fn get(&self, name: &str) -> Result<Arc<Group>, GroupError> {
        self.groups
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| GroupError::UnknownGroup(name.to_string()))
    }

    /// Registered group names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.groups.read().keys().cloned().collect();
        names.sort();
        names
    }
}
