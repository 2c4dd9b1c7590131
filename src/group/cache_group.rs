//! The cache group: one named namespace of cached values.
//!
//! A lookup goes local cache → owning peer → origin loader:
//! 1. A hit in the local cache returns immediately.
//! 2. On a miss, concurrent lookups of the same key are coalesced into one load,
//!    which runs on its own task and finishes even if every caller gives up.
//! 3. The load asks the peer picker for the key's owner. A remote owner is
//!    fetched over the transport; its value is returned but not cached here.
//! 4. With no remote owner, or if the peer fetch fails, the origin loader runs
//!    and its value is cached locally.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::cache::buffer::ByteBuffer;
use crate::cache::guarded::GuardedCache;
use crate::group::loader::OriginLoader;
use crate::group::singleflight::SingleFlight;
use crate::peers::{PeerGetter, PeerPicker, TransportError};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GroupError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Unknown group: {0}")]
    UnknownGroup(String),

    #[error("Origin load failed: {0}")]
    OriginLoadFailed(String),
}

/// Point-in-time copy of a group's counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupStats {
    /// Non-empty-key lookups.
    pub gets: u64,
    /// Lookups served from the local cache.
    pub cache_hits: u64,
    /// Misses that went through the coalescer.
    pub loads: u64,
    /// Loads actually executed after coalescing.
    pub loads_executed: u64,
    /// Values fetched from a remote owner.
    pub peer_loads: u64,
    /// Failed remote fetches (each fell back to the origin).
    pub peer_errors: u64,
    /// Values produced by the origin loader.
    pub local_loads: u64,
    /// Origin loader failures.
    pub local_load_errors: u64,
}

#[derive(Debug, Default)]
struct Counters {
    gets: AtomicU64,
    cache_hits: AtomicU64,
    loads: AtomicU64,
    loads_executed: AtomicU64,
    peer_loads: AtomicU64,
    peer_errors: AtomicU64,
    local_loads: AtomicU64,
    local_load_errors: AtomicU64,
}

fn bump(counter: &AtomicU64) {
    counter.fetch_add(1, Ordering::Relaxed);
}

/// A named cache namespace backed by an origin loader.
pub struct Group {
    name: String,
    loader: Arc<dyn OriginLoader>,
    main_cache: GuardedCache,
    flight: SingleFlight<Result<ByteBuffer, GroupError>>,
    peers: OnceLock<Arc<dyn PeerPicker>>,
    counters: Counters,
}

impl Group {
    /// Create a group caching at most `cache_bytes` (0 = unbounded).
    ///
    /// Most callers go through [`GroupRegistry::create`](crate::group::registry::GroupRegistry::create)
    /// so the group can be found by the peer server.
    pub fn new(name: impl Into<String>, cache_bytes: u64, loader: Arc<dyn OriginLoader>) -> Self {
        Self {
            name: name.into(),
            loader,
            main_cache: GuardedCache::new(cache_bytes),
            flight: SingleFlight::new(),
            peers: OnceLock::new(),
            counters: Counters::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Attach the peer picker used to route misses to their owners.
    ///
    /// # Panics
    ///
    /// If a picker was already registered on this group.
    pub fn register_peers(&self, peers: Arc<dyn PeerPicker>) {
        if self.peers.set(peers).is_err() {
            panic!("register_peers called more than once on group {}", self.name);
        }
    }

    /// Look up `key`, loading it from a peer or the origin on a miss.
    ///
    /// Dropping the returned future stops waiting but never cancels a load
    /// that has started.
    pub async fn get(self: &Arc<Self>, key: &str) -> Result<ByteBuffer, GroupError> {
        if key.is_empty() {
            return Err(GroupError::InvalidArgument("key is required".to_string()));
        }
        bump(&self.counters.gets);

        if let Some(value) = self.main_cache.get(key) {
            bump(&self.counters.cache_hits);
            debug!(group = %self.name, key, "Cache hit");
            return Ok(value);
        }

        self.load(key).await
    }

    pub fn stats(&self) -> GroupStats {
        let c = &self.counters;
        GroupStats {
            gets: c.gets.load(Ordering::Relaxed),
            cache_hits: c.cache_hits.load(Ordering::Relaxed),
            loads: c.loads.load(Ordering::Relaxed),
            loads_executed: c.loads_executed.load(Ordering::Relaxed),
            peer_loads: c.peer_loads.load(Ordering::Relaxed),
            peer_errors: c.peer_errors.load(Ordering::Relaxed),
            local_loads: c.local_loads.load(Ordering::Relaxed),
            local_load_errors: c.local_load_errors.load(Ordering::Relaxed),
        }
    }

    /// Entries held in this node's cache.
    pub fn cached_entries(&self) -> usize {
        self.main_cache.len()
    }

    /// Bytes accounted to this node's cache.
    pub fn cached_bytes(&self) -> u64 {
        self.main_cache.used_bytes()
    }

    async fn load(self: &Arc<Self>, key: &str) -> Result<ByteBuffer, GroupError> {
        bump(&self.counters.loads);

        let group = Arc::clone(self);
        let owned_key = key.to_string();
        self.flight
            .run(key, move || async move { group.load_once(&owned_key).await })
            .await
            .unwrap_or_else(|e| Err(GroupError::OriginLoadFailed(e.to_string())))
    }

    async fn load_once(&self, key: &str) -> Result<ByteBuffer, GroupError> {
        bump(&self.counters.loads_executed);

        if let Some(peer) = self.peers.get().and_then(|picker| picker.pick_peer(key)) {
            match self.get_from_peer(peer.as_ref(), key).await {
                Ok(value) => {
                    bump(&self.counters.peer_loads);
                    return Ok(value);
                }
                Err(e) => {
                    bump(&self.counters.peer_errors);
                    warn!(group = %self.name, key, error = %e, "Peer fetch failed, loading from origin");
                }
            }
        }

        self.get_locally(key).await
    }

    async fn get_from_peer(&self, peer: &dyn PeerGetter, key: &str) -> Result<ByteBuffer, TransportError> {
        let bytes = peer.fetch(&self.name, key).await?;
        debug!(group = %self.name, key, size = bytes.len(), "Fetched from peer");
        Ok(ByteBuffer::from(bytes))
    }

    async fn get_locally(&self, key: &str) -> Result<ByteBuffer, GroupError> {
        let bytes = self.loader.load(key).await.map_err(|e| {
            bump(&self.counters.local_load_errors);
            GroupError::OriginLoadFailed(e.to_string())
        })?;
        bump(&self.counters.local_loads);

        // The loader hands over ownership, so the cached payload is unaliased.
        let value = ByteBuffer::from(bytes);
        self.main_cache.set(key, value.clone());
        debug!(group = %self.name, key, size = value.len(), "Loaded from origin");
        Ok(value)
    }
}

impl fmt::Debug for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Group")
            .field("name", &self.name)
            .field("main_cache", &self.main_cache)
            .field("has_peers", &self.peers.get().is_some())
            .finish()
    }
}
