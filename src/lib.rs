//! vecache: a distributed, embeddable key/value cache.
//!
//! Values are requested by `(group, key)` and served from the node's own
//! byte-budgeted LRU, from the peer that owns the key on the consistent hash
//! ring, or from the caller-supplied origin loader:
//!   local cache (hit) → owning peer (HTTP) → origin loader (cached locally)
//!
//! Concurrent misses for the same key are coalesced into a single load.

pub mod cache;
pub mod config;
pub mod group;
pub mod peers;
pub mod server;

pub use cache::buffer::ByteBuffer;
pub use group::cache_group::{Group, GroupError, GroupStats};
pub use group::loader::{LoaderFn, OriginLoader};
pub use group::registry::GroupRegistry;
pub use peers::pool::HttpPool;
pub use peers::{PeerGetter, PeerPicker, TransportError};
