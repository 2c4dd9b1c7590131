//! Thread-safe wrapper around [`LruStore`].

use parking_lot::Mutex;
use tracing::debug;

use crate::cache::buffer::ByteBuffer;
use crate::cache::lru::LruStore;

/// A mutex-guarded LRU of [`ByteBuffer`] values.
///
/// The underlying store is built lazily by the first `set`; reads before that
/// simply miss. The lock is only held around the O(1) store operations.
#[derive(Debug)]
pub struct GuardedCache {
    cache_bytes: u64,
    lru: Mutex<Option<LruStore<ByteBuffer>>>,
}

impl GuardedCache {
    pub fn new(cache_bytes: u64) -> Self {
        Self {
            cache_bytes,
            lru: Mutex::new(None),
        }
    }

    pub fn get(&self, key: &str) -> Option<ByteBuffer> {
        let mut guard = self.lru.lock();
        match &mut *guard {
            Some(lru) => lru.get(key).cloned(),
            None => None,
        }
    }

    pub fn set(&self, key: &str, value: ByteBuffer) {
        let mut guard = self.lru.lock();
        let lru = guard.get_or_insert_with(|| {
            debug!(cache_bytes = self.cache_bytes, "Initializing LRU store");
            LruStore::with_eviction_callback(
                self.cache_bytes,
                Box::new(|key: &str, value: &ByteBuffer| {
                    debug!(key, size = value.len(), "Evicted entry");
                }),
            )
        });
        lru.set(key.to_string(), value);
    }

    /// Number of cached entries.
    pub fn len(&self) -> usize {
        (*self.lru.lock()).as_ref().map_or(0, LruStore::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Bytes currently accounted to cached entries.
    pub fn used_bytes(&self) -> u64 {
        (*self.lru.lock()).as_ref().map_or(0, LruStore::used_bytes)
    }
}
