//! HTTP peer pool: picks the owning node for a key and serves peer requests.

use std::collections::HashMap;
use std::sync::Arc;

use axum::Router;
use parking_lot::Mutex;
use tracing::{debug, info};

use crate::group::registry::GroupRegistry;
use crate::peers::client::{HttpGetter, TransportOptions};
use crate::peers::hash_ring::HashRing;
use crate::peers::{PeerGetter, PeerPicker};
use crate::server::peer_routes::{build_router, PeerRouteState};

pub const DEFAULT_BASE_PATH: &str = "/vecache/";
pub const DEFAULT_REPLICAS: usize = 50;

#[derive(Debug)]
struct PeerSet {
    ring: HashRing,
    getters: HashMap<String, Arc<HttpGetter>>,
}

/// The HTTP peer pool of one node.
///
/// `self_addr` and every peer address are base URLs such as
/// `http://127.0.0.1:8001`. A key owned by this node is never fetched over
/// the network: [`PeerPicker::pick_peer`] reports it as unowned.
#[derive(Debug)]
pub struct HttpPool {
    self_addr: String,
    base_path: String,
    replicas: usize,
    options: TransportOptions,
    client: reqwest::Client,
    peers: Mutex<PeerSet>,
}

impl HttpPool {
    pub fn new(self_addr: impl Into<String>) -> Self {
        Self {
            self_addr: self_addr.into(),
            base_path: DEFAULT_BASE_PATH.to_string(),
            replicas: DEFAULT_REPLICAS,
            options: TransportOptions::default(),
            client: reqwest::Client::new(),
            peers: Mutex::new(PeerSet {
                ring: HashRing::new(DEFAULT_REPLICAS),
                getters: HashMap::new(),
            }),
        }
    }

    /// Serve and fetch under `base_path` instead of `/vecache/`.
    pub fn with_base_path(mut self, base_path: impl Into<String>) -> Self {
        let mut base_path = base_path.into();
        if !base_path.starts_with('/') {
            base_path.insert(0, '/');
        }
        if !base_path.ends_with('/') {
            base_path.push('/');
        }
        self.base_path = base_path;
        self
    }

    pub fn with_replicas(mut self, replicas: usize) -> Self {
        self.replicas = replicas;
        self
    }

    pub fn with_transport_options(mut self, options: TransportOptions) -> Self {
        self.options = options;
        self
    }

    pub fn self_addr(&self) -> &str {
        &self.self_addr
    }

    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    /// Replace the peer set (which should include this node's own address).
    pub fn set_peers<I, S>(&self, peers: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let peers: Vec<String> = peers.into_iter().map(Into::into).collect();

        let mut ring = HashRing::new(self.replicas);
        ring.add(&peers);

        let getters = peers
            .iter()
            .map(|peer| {
                let base_url = format!("{}{}", peer.trim_end_matches('/'), self.base_path);
                let getter = HttpGetter::new(base_url, self.client.clone(), self.options.clone());
                (peer.clone(), Arc::new(getter))
            })
            .collect();

        info!(node = %self.self_addr, peers = ?peers, "Peer set configured");
        *self.peers.lock() = PeerSet { ring, getters };
    }

    /// Router serving `GET {base_path}{group}/{key}` from `registry`.
    pub fn router(&self, registry: Arc<GroupRegistry>) -> Router {
        build_router(PeerRouteState {
            registry,
            self_addr: self.self_addr.clone(),
            base_path: self.base_path.clone(),
            wire_format: self.options.wire_format,
        })
    }

    fn is_self(&self, peer: &str) -> bool {
        normalize_addr(peer) == normalize_addr(&self.self_addr)
    }
}

impl PeerPicker for HttpPool {
    fn pick_peer(&self, key: &str) -> Option<Arc<dyn PeerGetter>> {
        let peers = self.peers.lock();
        let owner = peers.ring.get(key)?;
        if self.is_self(owner) {
            return None;
        }
        debug!(node = %self.self_addr, peer = owner, key, "Picked peer");
        let getter: Arc<dyn PeerGetter> = peers.getters.get(owner)?.clone();
        Some(getter)
    }
}

/// Strip the scheme and trailing slash so `http://host:1/` matches `host:1`.
fn normalize_addr(addr: &str) -> &str {
    let addr = addr
        .strip_prefix("http://")
        .or_else(|| addr.strip_prefix("https://"))
        .unwrap_or(addr);
    addr.trim_end_matches('/')
}
