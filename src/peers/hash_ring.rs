//! Consistent hash ring with virtual replicas.
//!
//! Each peer is placed on a 32-bit ring `replicas` times, at
//! `hash("{i}{peer}")` for `i in 0..replicas`. A key belongs to the first ring
//! position at or after `hash(key)`, wrapping to the start of the ring.

use std::collections::HashMap;

/// Hash function used to place peers and keys on the ring.
pub type HashFn = fn(&[u8]) -> u32;

/// Maps keys to peer identifiers.
#[derive(Debug, Clone)]
pub struct HashRing {
    hash: HashFn,
    replicas: usize,
    /// Ring positions, sorted ascending.
    positions: Vec<u32>,
    owners: HashMap<u32, String>,
}

impl HashRing {
    /// Create an empty ring using CRC-32 (IEEE).
    pub fn new(replicas: usize) -> Self {
        Self::with_hasher(replicas, crc32fast::hash)
    }

    /// Create an empty ring with a custom hash function.
    pub fn with_hasher(replicas: usize, hash: HashFn) -> Self {
        Self {
            hash,
            replicas,
            positions: Vec::new(),
            owners: HashMap::new(),
        }
    }

    /// Place each peer on the ring. Colliding positions keep the last peer added.
    pub fn add<I, S>(&mut self, peers: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for peer in peers {
            let peer = peer.as_ref();
            for i in 0..self.replicas {
                let position = (self.hash)(format!("{i}{peer}").as_bytes());
                self.positions.push(position);
                self.owners.insert(position, peer.to_string());
            }
        }
        self.positions.sort_unstable();
    }

    /// The peer owning `key`, or `None` if the ring is empty.
    pub fn get(&self, key: &str) -> Option<&str> {
        if self.positions.is_empty() {
            return None;
        }
        let hash = (self.hash)(key.as_bytes());
        let idx = self.positions.partition_point(|&p| p < hash) % self.positions.len();
        self.owners.get(&self.positions[idx]).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Number of ring positions (`replicas` x peers added).
    pub fn len(&self) -> usize {
        self.positions.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Parses the input as a decimal number so positions are predictable.
    fn numeric_hash(data: &[u8]) -> u32 {
        std::str::from_utf8(data).unwrap().parse().unwrap()
    }

    #[test]
    fn test_lookup_with_predictable_hash() {
        let mut ring = HashRing::with_hasher(3, numeric_hash);
        // Positions: 2, 4, 6, 12, 14, 16, 22, 24, 26
        ring.add(["6", "4", "2"]);
        assert_eq!(ring.len(), 9);

        for (key, peer) in [("2", "2"), ("11", "2"), ("23", "4"), ("27", "2")] {
            assert_eq!(ring.get(key), Some(peer), "key {key}");
        }

        // Adds 8, 18, 28.
        ring.add(["8"]);
        assert_eq!(ring.get("27"), Some("8"));
        assert_eq!(ring.get("11"), Some("2"));
    }

    #[test]
    fn test_empty_ring() {
        let ring = HashRing::new(50);
        assert!(ring.is_empty());
        assert_eq!(ring.get("anything"), None);
    }

    #[test]
    fn test_deterministic() {
        let mut ring = HashRing::new(50);
        ring.add(["http://a:8001", "http://b:8002", "http://c:8003"]);
        let first: Vec<_> = (0..100).map(|i| ring.get(&format!("key-{i}")).map(str::to_string)).collect();
        let second: Vec<_> = (0..100).map(|i| ring.get(&format!("key-{i}")).map(str::to_string)).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_adding_peer_moves_few_keys() {
        let peers = ["http://a:8001", "http://b:8002", "http://c:8003", "http://d:8004"];
        let mut ring = HashRing::new(50);
        ring.add(peers);

        let keys: Vec<String> = (0..10_000).map(|i| format!("key-{i}")).collect();
        let before: Vec<String> = keys.iter().map(|k| ring.get(k).unwrap().to_string()).collect();

        ring.add(["http://e:8005"]);
        let moved = keys
            .iter()
            .zip(&before)
            .filter(|(k, owner)| ring.get(k).unwrap() != owner.as_str())
            .count();

        // Ideal is 1/5 of the keys; allow generous slack for hash variance.
        assert!(moved > 0);
        assert!(moved < keys.len() * 35 / 100, "moved {moved} keys");
    }

    #[test]
    fn test_every_peer_gets_keys() {
        let peers = ["http://a:8001", "http://b:8002", "http://c:8003"];
        let mut ring = HashRing::new(50);
        ring.add(peers);

        let mut counts: HashMap<&str, usize> = HashMap::new();
        for i in 0..3000 {
            let key = format!("key-{i}");
            *counts.entry(ring.get(&key).unwrap()).or_default() += 1;
        }
        for peer in peers {
            assert!(counts.get(peer).copied().unwrap_or(0) > 300, "{peer} underloaded: {counts:?}");
        }
    }
}
