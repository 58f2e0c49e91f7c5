//! LRU (Least Recently Used) store
//!
//! Entries live in an arena of slots and are linked by slot index, so the
//! recency list holds no owning pointers. Slots 0 and 1 are permanent
//! sentinels bracketing the list:
//!
//! ```text
//!   [HEAD] <-> lru <-> ... <-> mru <-> [TAIL]
//! ```
//!
//! Vacated slots go on a free list and are reused by the next insert, so an
//! insert that evicts recycles the evicted entry's slot. Shrinking the
//! capacity compacts the arena down to the live entries.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::rc::Rc;

use ahash::RandomState;
use tracing::{debug, trace};

use crate::capacity::{normalize_capacity, IntoCapacity, MIN_CAPACITY};
use crate::config::StoreConfig;
use crate::error::{Error, Result};
use crate::materialize::Materialize;
use crate::stats::CacheStats;

const HEAD: usize = 0;
const TAIL: usize = 1;

/// Key and value held by an occupied slot
struct Entry<K, V> {
    key: K,
    value: Rc<V>,
}

/// Slot in the recency list; sentinels and vacant slots carry no entry
struct Node<K, V> {
    entry: Option<Entry<K, V>>,
    prev: usize,
    next: usize,
}

/// Key-value store with a fixed capacity and least-recently-used eviction
///
/// `get`, `put` and eviction are O(1). The store is single-owner and not
/// thread-safe; wrap it in a lock if it has to be shared.
///
/// ```
/// use lrustore::LruStore;
///
/// let mut store = LruStore::with_capacity(2);
/// store.put("a", 1);
/// store.put("b", 2);
/// store.get(&"a");
/// store.put("c", 3); // evicts "b"
///
/// assert!(!store.contains(&"b"));
/// assert_eq!(store.get(&"a").as_deref(), Some(&1));
/// ```
pub struct LruStore<K, V> {
    map: HashMap<K, usize, RandomState>,
    nodes: Vec<Node<K, V>>,
    free_list: Vec<usize>,
    capacity: u32,
    materialize: Materialize,
    stats: CacheStats,
}

impl<K, V> LruStore<K, V>
where
    K: Hash + Eq + Clone,
    V: Clone,
{
    /// Create an empty store with the default capacity and shared values
    pub fn new() -> Self {
        Self::with_config(StoreConfig::default())
    }

    /// Create an empty store; unusable capacities fall back to the default
    pub fn with_capacity<C: IntoCapacity>(capacity: C) -> Self {
        Self::with_config(StoreConfig::new().with_capacity(capacity))
    }

    /// Create an empty store from a configuration
    pub fn with_config(config: StoreConfig) -> Self {
        debug!(
            capacity = config.capacity(),
            materialize = ?config.materialize(),
            "creating lru store"
        );

        // Empty ring: each sentinel points at the other
        let nodes = vec![
            Node {
                entry: None,
                prev: TAIL,
                next: TAIL,
            },
            Node {
                entry: None,
                prev: HEAD,
                next: HEAD,
            },
        ];

        Self {
            map: HashMap::with_hasher(RandomState::new()),
            nodes,
            free_list: Vec::new(),
            capacity: config.capacity().max(MIN_CAPACITY),
            materialize: config.materialize(),
            stats: CacheStats::new(),
        }
    }

    /// Get a value and mark its key as most recently used
    pub fn get<Q>(&mut self, key: &Q) -> Option<Rc<V>>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let Some(&slot) = self.map.get(key) else {
            self.stats.record_miss();
            return None;
        };

        self.touch(slot);
        self.stats.record_hit();
        self.load(slot)
    }

    /// Get a value without changing recency or statistics
    pub fn peek<Q>(&self, key: &Q) -> Option<Rc<V>>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.map.get(key).and_then(|&slot| self.load(slot))
    }

    /// Insert or update a key as the most recently used entry
    ///
    /// Inserting a new key into a full store evicts the least recently used
    /// entry first.
    pub fn put(&mut self, key: K, value: V) {
        // The store owns `value` outright, so no policy copy is needed
        self.put_stored(key, Rc::new(value));
    }

    /// Like [`put`](Self::put), for a value the caller keeps a handle to
    ///
    /// With [`Materialize::Shared`] the store keeps this exact allocation;
    /// with [`Materialize::DeepCopy`] it stores a clone of the value.
    pub fn put_rc(&mut self, key: K, value: Rc<V>) {
        let value = self.materialize.store(value);
        self.put_stored(key, value);
    }

    fn put_stored(&mut self, key: K, value: Rc<V>) {
        if let Some(&slot) = self.map.get(&key) {
            if let Some(entry) = self.nodes[slot].entry.as_mut() {
                entry.value = value;
            }
            self.touch(slot);
            self.stats.record_update();
            return;
        }

        if self.map.len() >= self.capacity as usize {
            self.evict_least_recent();
        }
        self.insert_new(key, value);
        self.stats.record_insert();
    }

    /// Remove a key from the store
    pub fn remove<Q>(&mut self, key: &Q) -> Option<Rc<V>>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let slot = self.map.remove(key)?;
        self.release(slot).map(|entry| entry.value)
    }

    /// Change the capacity, evicting least recently used entries to fit
    ///
    /// Invalid or zero capacities clamp to 1. Growing never evicts.
    pub fn set_capacity<C: IntoCapacity>(&mut self, capacity: C) {
        let capacity = normalize_capacity(capacity);
        let target = capacity as usize;

        if self.map.len() > target {
            debug!(
                len = self.map.len(),
                capacity, "shrinking lru store, evicting to fit"
            );
            while self.map.len() > target {
                self.evict_least_recent();
            }
            self.compact();
        } else {
            debug!(from = self.capacity, to = capacity, "resizing lru store");
        }

        self.capacity = capacity;
    }

    /// Current capacity
    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Materialization policy chosen at construction
    pub fn materialize(&self) -> Materialize {
        self.materialize
    }

    /// Get the current number of entries
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Check if the store is empty
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Check whether a key is stored, without touching it
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.map.contains_key(key)
    }

    /// Key that would be evicted next
    pub fn least_recent(&self) -> Option<&K> {
        self.key_at(self.nodes[HEAD].next)
    }

    /// Key touched most recently
    pub fn most_recent(&self) -> Option<&K> {
        self.key_at(self.nodes[TAIL].prev)
    }

    /// Iterate entries from least to most recently used
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            nodes: &self.nodes,
            current: self.nodes[HEAD].next,
            remaining: self.map.len(),
        }
    }

    /// Iterate keys from least to most recently used
    pub fn keys(&self) -> impl Iterator<Item = &K> + '_ {
        self.iter().map(|(key, _)| key)
    }

    /// Get store statistics
    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    /// Reset store statistics
    pub fn reset_stats(&mut self) {
        self.stats.reset();
    }

    /// Drop every entry; capacity and statistics are kept
    pub fn clear(&mut self) {
        self.map.clear();
        self.nodes.truncate(2);
        self.free_list.clear();
        self.nodes[HEAD].next = TAIL;
        self.nodes[HEAD].prev = TAIL;
        self.nodes[TAIL].prev = HEAD;
        self.nodes[TAIL].next = HEAD;
    }

    /// Check the structural invariants of the index and recency list
    pub fn validate(&self) -> Result<()> {
        if self.capacity < MIN_CAPACITY {
            return Err(Error::ZeroCapacity);
        }
        if self.map.len() > self.capacity as usize {
            return Err(Error::OverCapacity {
                len: self.map.len(),
                capacity: self.capacity,
            });
        }
        if self.nodes[HEAD].prev != TAIL || self.nodes[TAIL].next != HEAD {
            return Err(Error::BrokenLink { slot: HEAD });
        }

        let mut linked = 0;
        let mut prev = HEAD;
        let mut current = self.nodes[HEAD].next;

        while current != TAIL {
            // A cycle that skips the tail would walk forever
            if linked >= self.nodes.len() {
                return Err(Error::BrokenLink { slot: current });
            }
            let node = self
                .nodes
                .get(current)
                .ok_or(Error::BrokenLink { slot: prev })?;
            if node.prev != prev {
                return Err(Error::BrokenLink { slot: current });
            }
            let entry = node
                .entry
                .as_ref()
                .ok_or(Error::BrokenLink { slot: current })?;
            if self.map.get(&entry.key) != Some(&current) {
                return Err(Error::StaleIndex { slot: current });
            }

            linked += 1;
            prev = current;
            current = node.next;
        }

        if self.nodes[TAIL].prev != prev {
            return Err(Error::BrokenLink { slot: TAIL });
        }
        if linked != self.map.len() {
            return Err(Error::IndexMismatch {
                indexed: self.map.len(),
                linked,
            });
        }

        Ok(())
    }

    /// Rebuild the arena with only live entries, in recency order
    ///
    /// Vacant slots left behind by a shrink would otherwise stay allocated
    /// until `clear()`.
    fn compact(&mut self) {
        if self.free_list.is_empty() {
            return;
        }

        let len = self.map.len();
        let mut nodes = Vec::with_capacity(len + 2);
        nodes.push(Node {
            entry: None,
            prev: TAIL,
            next: if len > 0 { 2 } else { TAIL },
        });
        nodes.push(Node {
            entry: None,
            prev: if len > 0 { len + 1 } else { HEAD },
            next: HEAD,
        });

        let mut current = self.nodes[HEAD].next;
        while current != TAIL {
            let next = self.nodes[current].next;
            if let Some(entry) = self.nodes[current].entry.take() {
                let slot = nodes.len();
                if let Some(index) = self.map.get_mut(&entry.key) {
                    *index = slot;
                }
                nodes.push(Node {
                    entry: Some(entry),
                    prev: if slot == 2 { HEAD } else { slot - 1 },
                    next: if slot == len + 1 { TAIL } else { slot + 1 },
                });
            }
            current = next;
        }

        trace!(
            released = self.nodes.len() - nodes.len(),
            "compacted lru store arena"
        );
        self.nodes = nodes;
        self.free_list = Vec::new();
        self.map.shrink_to_fit();
    }

    fn load(&self, slot: usize) -> Option<Rc<V>> {
        self.nodes[slot]
            .entry
            .as_ref()
            .map(|entry| self.materialize.load(&entry.value))
    }

    fn key_at(&self, slot: usize) -> Option<&K> {
        self.nodes[slot].entry.as_ref().map(|entry| &entry.key)
    }

    fn touch(&mut self, slot: usize) {
        if self.nodes[TAIL].prev == slot {
            return; // Already most recent
        }

        self.unlink(slot);
        self.link_before_tail(slot);
    }

    fn evict_least_recent(&mut self) {
        let slot = self.nodes[HEAD].next;
        if slot == TAIL {
            return;
        }

        if let Some(entry) = self.release(slot) {
            self.map.remove(&entry.key);
            self.stats.record_eviction();
            trace!(slot, "evicted least recently used entry");
        }
    }

    fn insert_new(&mut self, key: K, value: Rc<V>) {
        let slot = self.alloc_slot(Entry {
            key: key.clone(),
            value,
        });
        self.link_before_tail(slot);
        self.map.insert(key, slot);
    }

    /// Unlink a slot and put it on the free list, returning its entry
    fn release(&mut self, slot: usize) -> Option<Entry<K, V>> {
        self.unlink(slot);
        let entry = self.nodes[slot].entry.take();
        self.free_list.push(slot);
        entry
    }

    fn unlink(&mut self, slot: usize) {
        let (prev, next) = (self.nodes[slot].prev, self.nodes[slot].next);
        self.nodes[prev].next = next;
        self.nodes[next].prev = prev;
    }

    fn link_before_tail(&mut self, slot: usize) {
        let last = self.nodes[TAIL].prev;
        self.nodes[slot].prev = last;
        self.nodes[slot].next = TAIL;
        self.nodes[last].next = slot;
        self.nodes[TAIL].prev = slot;
    }

    fn alloc_slot(&mut self, entry: Entry<K, V>) -> usize {
        if let Some(slot) = self.free_list.pop() {
            self.nodes[slot].entry = Some(entry);
            slot
        } else {
            self.nodes.push(Node {
                entry: Some(entry),
                prev: HEAD,
                next: TAIL,
            });
            self.nodes.len() - 1
        }
    }
}

impl<K, V> Default for LruStore<K, V>
where
    K: Hash + Eq + Clone,
    V: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> fmt::Debug for LruStore<K, V>
where
    K: fmt::Debug,
    V: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let entries = Iter {
            nodes: &self.nodes,
            current: self.nodes[HEAD].next,
            remaining: self.map.len(),
        };
        f.debug_struct("LruStore")
            .field("capacity", &self.capacity)
            .field("materialize", &self.materialize)
            .field("entries", &DebugEntries(entries))
            .finish()
    }
}

struct DebugEntries<'a, K, V>(Iter<'a, K, V>);

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for DebugEntries<'_, K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.0.clone()).finish()
    }
}

/// Iterator over store entries from least to most recently used
pub struct Iter<'a, K, V> {
    nodes: &'a [Node<K, V>],
    current: usize,
    remaining: usize,
}

impl<K, V> Clone for Iter<'_, K, V> {
    fn clone(&self) -> Self {
        Self {
            nodes: self.nodes,
            current: self.current,
            remaining: self.remaining,
        }
    }
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        if self.current == TAIL || self.remaining == 0 {
            return None;
        }
        let node = &self.nodes[self.current];
        let entry = node.entry.as_ref()?;
        self.current = node.next;
        self.remaining -= 1;
        Some((&entry.key, &*entry.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}
