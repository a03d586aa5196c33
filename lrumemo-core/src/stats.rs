/// Live counters behind a cache's introspection.
///
/// Plain counters: the owning cache keeps them behind the same lock as its
/// store, so a snapshot taken under that lock is consistent with the store it
/// describes.
///
/// # Examples
///
/// ```
/// use lrumemo_core::CacheStats;
///
/// let mut stats = CacheStats::new();
///
/// stats.record_hit();
/// stats.record_hit();
/// stats.record_miss();
/// stats.record_eviction();
///
/// assert_eq!(stats.hits(), 2);
/// assert_eq!(stats.misses(), 1);
/// assert_eq!(stats.evictions(), 1);
/// assert!((stats.hit_rate() - 0.6666).abs() < 0.001);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    hits: u64,
    misses: u64,
    evictions: u64,
}

impl CacheStats {
    /// Creates a new `CacheStats` instance with zero counters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a call served from the store.
    #[inline]
    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    /// Records a call that was not served from the store, whether it started
    /// a computation or joined one already in flight.
    #[inline]
    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    /// Records an entry dropped to make room for a newer one.
    #[inline]
    pub fn record_eviction(&mut self) {
        self.evictions += 1;
    }

    #[inline]
    pub fn hits(&self) -> u64 {
        self.hits
    }

    #[inline]
    pub fn misses(&self) -> u64 {
        self.misses
    }

    #[inline]
    pub fn evictions(&self) -> u64 {
        self.evictions
    }

    /// Returns the total number of calls (hits + misses).
    #[inline]
    pub fn total_accesses(&self) -> u64 {
        self.hits + self.misses
    }

    /// Calculates the hit rate as a fraction (0.0 to 1.0).
    ///
    /// Returns 0.0 if there have been no accesses.
    #[inline]
    pub fn hit_rate(&self) -> f64 {
        let total = self.total_accesses();
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    /// Calculates the miss rate as a fraction (0.0 to 1.0).
    #[inline]
    pub fn miss_rate(&self) -> f64 {
        1.0 - self.hit_rate()
    }

    /// Resets all counters to zero.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Builds an immutable [`CacheInfo`] from the current counters.
    pub fn info(&self, max_size: Option<usize>, current_size: usize) -> CacheInfo {
        CacheInfo {
            hits: self.hits,
            misses: self.misses,
            max_size,
            current_size,
        }
    }
}

/// Point-in-time view of a cache.
///
/// A fresh snapshot is produced on every request; it never changes after
/// creation.
///
/// * `max_size` - `None` for an unbounded cache, `Some(0)` for a disabled one
/// * `current_size` - number of stored results
///
/// # Examples
///
/// ```
/// use lrumemo_core::{CacheInfo, CacheStats};
///
/// let mut stats = CacheStats::new();
/// stats.record_miss();
///
/// let info = stats.info(Some(128), 1);
/// assert_eq!(info, CacheInfo { hits: 0, misses: 1, max_size: Some(128), current_size: 1 });
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CacheInfo {
    pub hits: u64,
    pub misses: u64,
    pub max_size: Option<usize>,
    pub current_size: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_stats() {
        let stats = CacheStats::new();
        assert_eq!(stats.hits(), 0);
        assert_eq!(stats.misses(), 0);
        assert_eq!(stats.evictions(), 0);
        assert_eq!(stats.total_accesses(), 0);
    }

    #[test]
    fn test_record_hit_and_miss() {
        let mut stats = CacheStats::new();
        stats.record_hit();
        stats.record_miss();
        stats.record_miss();
        assert_eq!(stats.hits(), 1);
        assert_eq!(stats.misses(), 2);
        assert_eq!(stats.total_accesses(), 3);
    }

    #[test]
    fn test_hit_rate_no_accesses() {
        let stats = CacheStats::new();
        assert_eq!(stats.hit_rate(), 0.0);
        assert_eq!(stats.miss_rate(), 1.0);
    }

    #[test]
    fn test_reset() {
        let mut stats = CacheStats::new();
        stats.record_hit();
        stats.record_miss();
        stats.record_eviction();

        stats.reset();
        assert_eq!(stats, CacheStats::default());
    }

    #[test]
    fn test_clone_is_independent() {
        let mut stats = CacheStats::new();
        stats.record_hit();

        let cloned = stats.clone();
        stats.record_hit();
        assert_eq!(stats.hits(), 2);
        assert_eq!(cloned.hits(), 1);
    }

    #[test]
    fn test_info_snapshot() {
        let mut stats = CacheStats::new();
        stats.record_hit();
        stats.record_miss();

        let info = stats.info(None, 1);
        stats.record_hit();

        assert_eq!(info.hits, 1);
        assert_eq!(info.misses, 1);
        assert_eq!(info.max_size, None);
        assert_eq!(info.current_size, 1);
    }
}
