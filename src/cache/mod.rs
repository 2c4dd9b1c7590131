//! Node-local cache storage.
//!
//! - [`buffer`]: ByteBuffer, the immutable cached value type
//! - [`lru`]: byte-budgeted LRU store (not synchronized)
//! - [`guarded`]: mutex-guarded, lazily initialized LRU used by cache groups

pub mod buffer;
pub mod guarded;
pub mod lru;
