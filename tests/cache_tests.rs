//! Integration tests for the local cache layer.

use std::sync::{Arc, Mutex};

use vecache::cache::guarded::GuardedCache;
use vecache::cache::lru::LruStore;
use vecache::ByteBuffer;

#[test]
fn test_lru_evicts_until_within_budget() {
    // "k1" + "1234" = 6 bytes per entry.
    let mut lru: LruStore<ByteBuffer> = LruStore::new(12);
    lru.set("k1".to_string(), ByteBuffer::from("1234"));
    lru.set("k2".to_string(), ByteBuffer::from("1234"));
    assert_eq!(lru.used_bytes(), 12);

    lru.set("k3".to_string(), ByteBuffer::from("1234"));
    assert!(!lru.contains("k1"));
    assert!(lru.contains("k2"));
    assert!(lru.contains("k3"));
    assert_eq!(lru.used_bytes(), 12);
}

#[test]
fn test_lru_get_refreshes_recency() {
    let mut lru: LruStore<ByteBuffer> = LruStore::new(12);
    lru.set("k1".to_string(), ByteBuffer::from("1234"));
    lru.set("k2".to_string(), ByteBuffer::from("1234"));

    assert!(lru.get("k1").is_some());
    lru.set("k3".to_string(), ByteBuffer::from("1234"));

    assert!(lru.contains("k1"));
    assert!(!lru.contains("k2"));
}

#[test]
fn test_lru_eviction_callback_sees_evicted_entries() {
    let evicted = Arc::new(Mutex::new(Vec::new()));
    let sink = evicted.clone();
    let mut lru: LruStore<ByteBuffer> = LruStore::with_eviction_callback(
        10,
        Box::new(move |key, value| sink.lock().unwrap().push((key.to_string(), value.as_string()))),
    );

    lru.set("key1".to_string(), ByteBuffer::from("123456"));
    lru.set("k2".to_string(), ByteBuffer::from("k2"));
    lru.set("k3".to_string(), ByteBuffer::from("k3"));
    lru.set("k4".to_string(), ByteBuffer::from("k4"));

    assert_eq!(
        *evicted.lock().unwrap(),
        vec![("key1".to_string(), "123456".to_string()), ("k2".to_string(), "k2".to_string())]
    );
}

#[test]
fn test_lru_overwrite_adjusts_bytes_without_eviction() {
    let evicted = Arc::new(Mutex::new(0usize));
    let sink = evicted.clone();
    let mut lru: LruStore<ByteBuffer> =
        LruStore::with_eviction_callback(0, Box::new(move |_, _| *sink.lock().unwrap() += 1));

    lru.set("key".to_string(), ByteBuffer::from("12"));
    lru.set("key".to_string(), ByteBuffer::from("12345"));

    assert_eq!(lru.len(), 1);
    assert_eq!(lru.used_bytes(), 8);
    assert_eq!(*evicted.lock().unwrap(), 0);
}

#[test]
fn test_guarded_cache_is_lazy_and_shared() {
    let cache = Arc::new(GuardedCache::new(1024));
    assert!(cache.is_empty());
    assert!(cache.get("missing").is_none());

    let handles: Vec<_> = (0..4)
        .map(|t| {
            let cache = cache.clone();
            std::thread::spawn(move || {
                for i in 0..10 {
                    cache.set(&format!("t{t}-{i}"), ByteBuffer::from("v"));
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(cache.len(), 40);
    assert_eq!(cache.get("t3-9").unwrap().as_string(), "v");
}

#[test]
fn test_byte_buffer_copies_are_independent() {
    let value = ByteBuffer::copy_from_slice(b"630");
    let mut copy = value.to_vec();
    copy[0] = b'9';
    assert_eq!(value.as_string(), "630");
}
