/// Null link in the recency list.
pub(crate) const NIL: usize = usize::MAX;

/// A slot of the recency list owned by [`LruStore`](crate::LruStore).
///
/// Each entry owns its cached value together with its position in the
/// doubly-linked access-order list. Links are arena indices rather than
/// pointers, so the store needs no `unsafe` code to relink entries.
///
/// A slot whose `value` is `None` is free and waits on the store's free list
/// for the next insertion.
///
/// # Type Parameters
///
/// * `K` - The cache key type
/// * `V` - The cached value type
///
/// # Examples
///
/// ```
/// use lrumemo_core::CacheEntry;
///
/// let entry = CacheEntry::new("answer", 42);
/// assert_eq!(entry.key, "answer");
/// assert_eq!(entry.value, Some(42));
/// assert!(entry.is_occupied());
/// ```
#[derive(Clone, Debug)]
pub struct CacheEntry<K, V> {
    pub key: K,
    pub value: Option<V>,
    pub(crate) prev: usize,
    pub(crate) next: usize,
}

impl<K, V> CacheEntry<K, V> {
    /// Creates a detached entry holding `value` under `key`.
    pub fn new(key: K, value: V) -> Self {
        Self {
            key,
            value: Some(value),
            prev: NIL,
            next: NIL,
        }
    }

    /// Returns `true` while the slot holds a live value.
    pub fn is_occupied(&self) -> bool {
        self.value.is_some()
    }

    /// Reuses a free slot for a new key/value pair.
    pub(crate) fn refill(&mut self, key: K, value: V) {
        self.key = key;
        self.value = Some(value);
        self.prev = NIL;
        self.next = NIL;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_entry_is_detached() {
        let entry = CacheEntry::new(1u32, "one");
        assert_eq!(entry.prev, NIL);
        assert_eq!(entry.next, NIL);
        assert!(entry.is_occupied());
    }

    #[test]
    fn test_refill_replaces_key_and_value() {
        let mut entry = CacheEntry::new(1u32, "one");
        entry.prev = 3;
        entry.value = None;
        assert!(!entry.is_occupied());

        entry.refill(2, "two");
        assert_eq!(entry.key, 2);
        assert_eq!(entry.value, Some("two"));
        assert_eq!(entry.prev, NIL);
    }
}
