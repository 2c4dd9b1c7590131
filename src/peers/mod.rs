//! Peer transport: how a node finds and fetches from the node owning a key.
//!
//! - [`hash_ring`]: consistent hash ring assigning keys to peers
//! - [`protocol`]: wire formats for peer responses
//! - [`client`]: HTTP implementation of [`PeerGetter`]
//! - [`pool`]: HTTP peer pool implementing [`PeerPicker`]

pub mod client;
pub mod hash_ring;
pub mod pool;
pub mod protocol;

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

/// Errors from a remote fetch. Never surfaced to cache callers: the group
/// falls back to its origin loader instead.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Peer request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Peer returned status {0}")]
    Status(u16),

    #[error("Failed to decode peer response: {0}")]
    Decode(String),
}

/// Fetches a value for `(group, key)` from one specific remote node.
#[async_trait]
pub trait PeerGetter: Send + Sync {
    async fn fetch(&self, group: &str, key: &str) -> Result<Bytes, TransportError>;
}

/// Chooses the remote node that owns a key.
pub trait PeerPicker: Send + Sync {
    /// Returns `None` when no peer is configured or the owner is this node.
    fn pick_peer(&self, key: &str) -> Option<Arc<dyn PeerGetter>>;
}
