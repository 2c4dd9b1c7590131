//! Byte-budgeted LRU store.
//!
//! Entries live in a dense `Vec` threaded by an intrusive doubly-linked
//! recency list (indices, not pointers). The front of the list is the most
//! recently used entry, the back is the next eviction victim.
//!
//! An entry costs `key.len() + value.weight()` bytes. After every `set`, entries
//! are evicted from the back while `max_bytes > 0 && used_bytes > max_bytes`.
//! A `max_bytes` of zero disables eviction.
//!
//! The store does no locking of its own; see [`crate::cache::guarded`].

use std::collections::HashMap;
use std::fmt;

/// Values stored in the LRU report their size in bytes.
pub trait Weighted {
    fn weight(&self) -> usize;
}

/// Called with each entry removed by eviction (never on overwrite).
pub type EvictionCallback<V> = Box<dyn FnMut(&str, &V) + Send>;

struct Node<V> {
    key: String,
    value: V,
    prev: Option<usize>,
    next: Option<usize>,
}

impl<V: Weighted> Node<V> {
    fn size(&self) -> u64 {
        (self.key.len() + self.value.weight()) as u64
    }
}

/// A least-recently-used cache bounded by total byte size.
pub struct LruStore<V> {
    max_bytes: u64,
    used_bytes: u64,
    nodes: Vec<Node<V>>,
    index: HashMap<String, usize>,
    head: Option<usize>,
    tail: Option<usize>,
    on_evicted: Option<EvictionCallback<V>>,
}

impl<V: Weighted> LruStore<V> {
    /// Create a store holding at most `max_bytes` (0 = unbounded).
    pub fn new(max_bytes: u64) -> Self {
        Self {
            max_bytes,
            used_bytes: 0,
            nodes: Vec::new(),
            index: HashMap::new(),
            head: None,
            tail: None,
            on_evicted: None,
        }
    }

    /// Create a store that reports evicted entries to `on_evicted`.
    pub fn with_eviction_callback(max_bytes: u64, on_evicted: EvictionCallback<V>) -> Self {
        Self {
            on_evicted: Some(on_evicted),
            ..Self::new(max_bytes)
        }
    }

    /// Look up `key`, marking it most recently used on a hit.
    pub fn get(&mut self, key: &str) -> Option<&V> {
        let idx = *self.index.get(key)?;
        self.move_to_front(idx);
        Some(&self.nodes[idx].value)
    }

    /// Insert or replace `key`, then evict until back under budget.
    pub fn set(&mut self, key: String, value: V) {
        if let Some(&idx) = self.index.get(&key) {
            self.move_to_front(idx);
            let node = &mut self.nodes[idx];
            self.used_bytes = self.used_bytes - node.value.weight() as u64 + value.weight() as u64;
            node.value = value;
        } else {
            let idx = self.nodes.len();
            let node = Node {
                key: key.clone(),
                value,
                prev: None,
                next: None,
            };
            self.used_bytes += node.size();
            self.nodes.push(node);
            self.index.insert(key, idx);
            self.push_front(idx);
        }

        while self.max_bytes != 0 && self.used_bytes > self.max_bytes {
            if self.remove_oldest().is_none() {
                break;
            }
        }
    }

    /// Evict the least recently used entry, firing the eviction callback.
    pub fn remove_oldest(&mut self) -> Option<(String, V)> {
        let idx = self.tail?;
        let node = self.remove_at(idx);
        self.used_bytes -= node.size();
        if let Some(on_evicted) = self.on_evicted.as_mut() {
            on_evicted(&node.key, &node.value);
        }
        Some((node.key, node.value))
    }

    pub fn contains(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Sum of `key.len() + value.weight()` over all entries.
    pub fn used_bytes(&self) -> u64 {
        self.used_bytes
    }

    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    fn move_to_front(&mut self, idx: usize) {
        if self.head == Some(idx) {
            return;
        }
        self.unlink(idx);
        self.push_front(idx);
    }

    fn push_front(&mut self, idx: usize) {
        let old_head = self.head;
        self.nodes[idx].prev = None;
        self.nodes[idx].next = old_head;
        match old_head {
            Some(h) => self.nodes[h].prev = Some(idx),
            None => self.tail = Some(idx),
        }
        self.head = Some(idx);
    }

    fn unlink(&mut self, idx: usize) {
        let (prev, next) = (self.nodes[idx].prev, self.nodes[idx].next);
        match prev {
            Some(p) => self.nodes[p].next = next,
            None => self.head = next,
        }
        match next {
            Some(n) => self.nodes[n].prev = prev,
            None => self.tail = prev,
        }
        self.nodes[idx].prev = None;
        self.nodes[idx].next = None;
    }

    /// Remove the node at `idx`, relocating the last node into its slot.
    fn remove_at(&mut self, idx: usize) -> Node<V> {
        self.unlink(idx);
        let node = self.nodes.swap_remove(idx);
        self.index.remove(&node.key);

        if idx < self.nodes.len() {
            let (prev, next) = (self.nodes[idx].prev, self.nodes[idx].next);
            match prev {
                Some(p) => self.nodes[p].next = Some(idx),
                None => self.head = Some(idx),
            }
            match next {
                Some(n) => self.nodes[n].prev = Some(idx),
                None => self.tail = Some(idx),
            }
            if let Some(slot) = self.index.get_mut(&self.nodes[idx].key) {
                *slot = idx;
            }
        }
        node
    }
}

impl<V> fmt::Debug for LruStore<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LruStore")
            .field("max_bytes", &self.max_bytes)
            .field("used_bytes", &self.used_bytes)
            .field("len", &self.nodes.len())
            .finish()
    }
}
