use crate::cache_entry::{CacheEntry, NIL};
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;

/// Bounded key→value store with strict least-recently-used eviction.
///
/// Entries live in an arena (`Vec<CacheEntry>`) linked into a doubly-linked
/// recency list; a `HashMap` maps each key to its arena slot. The head of the
/// list is the most recently used entry, the tail the least recently used one.
///
/// # Capacity
///
/// * `Some(n)` with `n > 0` - at most `n` entries; inserting beyond that
///   evicts the tail
/// * `Some(0)` - nothing is ever stored
/// * `None` - unbounded, nothing is evicted automatically
///
/// # Performance
///
/// | Operation | Cost |
/// |-----------|------|
/// | `get`     | O(1) |
/// | `put`     | O(1) amortized |
/// | `remove`  | O(1) |
/// | eviction  | O(1) |
///
/// # Examples
///
/// ```
/// use lrumemo_core::{Displaced, LruStore};
///
/// let mut store = LruStore::new(Some(2));
/// store.put("a", 1);
/// store.put("b", 2);
/// store.get(&"a");
///
/// // "b" is now the least recently used entry
/// assert_eq!(store.put("c", 3), Some(Displaced::Evicted("b", 2)));
/// assert!(store.contains_key(&"a"));
/// ```
/// An entry pushed out of an [`LruStore`] by [`put`](LruStore::put).
///
/// Handed back to the caller so it decides where the old value is dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Displaced<K, V> {
    /// The key was already stored; this is its previous value.
    Replaced(V),
    /// The least recently used entry, evicted to make room.
    Evicted(K, V),
}

pub struct LruStore<K, V> {
    max_size: Option<usize>,
    map: HashMap<K, usize>,
    slots: Vec<CacheEntry<K, V>>,
    free: Vec<usize>,
    head: usize,
    tail: usize,
}

impl<K, V> fmt::Debug for LruStore<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LruStore")
            .field("max_size", &self.max_size)
            .field("len", &self.map.len())
            .finish()
    }
}

impl<K: Hash + Eq + Clone, V> LruStore<K, V> {
    /// Creates an empty store. `None` means unbounded.
    pub fn new(max_size: Option<usize>) -> Self {
        let reserve = max_size.unwrap_or(0).min(1024);
        Self {
            max_size,
            map: HashMap::with_capacity(reserve),
            slots: Vec::with_capacity(reserve),
            free: Vec::new(),
            head: NIL,
            tail: NIL,
        }
    }

    pub fn max_size(&self) -> Option<usize> {
        self.max_size
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.map.contains_key(key)
    }

    /// Looks up `key` and promotes it to most recently used.
    pub fn get(&mut self, key: &K) -> Option<&V> {
        let idx = *self.map.get(key)?;
        self.move_to_head(idx);
        self.slots[idx].value.as_ref()
    }

    /// Looks up `key` without touching the recency order.
    pub fn peek(&self, key: &K) -> Option<&V> {
        let idx = *self.map.get(key)?;
        self.slots[idx].value.as_ref()
    }

    /// Inserts or overwrites `key` as the most recently used entry.
    ///
    /// Returns what the insertion pushed out: the previous value of an
    /// overwritten key, or the least-recently-used pair when the store went
    /// over its maximum size. With a maximum size of zero the pair is handed
    /// straight back as evicted without being stored.
    pub fn put(&mut self, key: K, value: V) -> Option<Displaced<K, V>> {
        if self.max_size == Some(0) {
            return Some(Displaced::Evicted(key, value));
        }

        if let Some(&idx) = self.map.get(&key) {
            let previous = self.slots[idx].value.replace(value);
            self.move_to_head(idx);
            return previous.map(Displaced::Replaced);
        }

        let idx = self.allocate(key.clone(), value);
        self.map.insert(key, idx);
        self.push_head(idx);

        match self.max_size {
            Some(max) if self.map.len() > max => self
                .pop_lru()
                .map(|(key, value)| Displaced::Evicted(key, value)),
            _ => None,
        }
    }

    /// Removes `key`, returning its value. No-op if absent.
    pub fn remove(&mut self, key: &K) -> Option<V> {
        let idx = self.map.remove(key)?;
        self.unlink(idx);
        self.release(idx)
    }

    /// Removes and returns the least recently used entry.
    pub fn pop_lru(&mut self) -> Option<(K, V)> {
        if self.tail == NIL {
            return None;
        }
        let idx = self.tail;
        let (key, _) = self.map.remove_entry(&self.slots[idx].key)?;
        self.unlink(idx);
        let value = self.release(idx)?;
        Some((key, value))
    }

    /// Empties the store, returning the dropped values so the caller controls
    /// where they are released.
    pub fn clear(&mut self) -> Vec<V> {
        self.map.clear();
        self.free.clear();
        self.head = NIL;
        self.tail = NIL;
        self.slots
            .drain(..)
            .filter_map(|mut entry| entry.value.take())
            .collect()
    }

    /// Iterates keys from least to most recently used.
    pub fn keys_lru(&self) -> KeysLru<'_, K, V> {
        KeysLru {
            store: self,
            cursor: self.tail,
        }
    }

    fn allocate(&mut self, key: K, value: V) -> usize {
        match self.free.pop() {
            Some(idx) => {
                self.slots[idx].refill(key, value);
                idx
            }
            None => {
                self.slots.push(CacheEntry::new(key, value));
                self.slots.len() - 1
            }
        }
    }

    fn release(&mut self, idx: usize) -> Option<V> {
        let value = self.slots[idx].value.take();
        self.free.push(idx);
        value
    }

    fn unlink(&mut self, idx: usize) {
        let (prev, next) = (self.slots[idx].prev, self.slots[idx].next);

        if prev != NIL {
            self.slots[prev].next = next;
        } else {
            self.head = next;
        }

        if next != NIL {
            self.slots[next].prev = prev;
        } else {
            self.tail = prev;
        }

        self.slots[idx].prev = NIL;
        self.slots[idx].next = NIL;
    }

    fn push_head(&mut self, idx: usize) {
        self.slots[idx].prev = NIL;
        self.slots[idx].next = self.head;
        if self.head != NIL {
            self.slots[self.head].prev = idx;
        }
        self.head = idx;
        if self.tail == NIL {
            self.tail = idx;
        }
    }

    fn move_to_head(&mut self, idx: usize) {
        if self.head == idx {
            return;
        }
        self.unlink(idx);
        self.push_head(idx);
    }
}

/// Iterator over the keys of an [`LruStore`], least recently used first.
pub struct KeysLru<'a, K, V> {
    store: &'a LruStore<K, V>,
    cursor: usize,
}

impl<'a, K, V> Iterator for KeysLru<'a, K, V> {
    type Item = &'a K;

    fn next(&mut self) -> Option<Self::Item> {
        if self.cursor == NIL {
            return None;
        }
        let entry = &self.store.slots[self.cursor];
        self.cursor = entry.prev;
        Some(&entry.key)
    }
}
