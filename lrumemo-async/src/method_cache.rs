use parking_lot::Mutex;
use std::any::Any;

/// Caches created by `#[lru_cache]` on a method, looked up by type.
///
/// A `static` declared inside a method cannot name `Self`, so the generated
/// accessor keeps a `MethodCaches` static instead. Methods of a generic
/// `impl` share that static across instantiations, hence one slot per cache
/// type.
#[doc(hidden)]
pub struct MethodCaches {
    caches: Mutex<Vec<&'static (dyn Any + Send + Sync)>>,
}

impl MethodCaches {
    pub const fn new() -> Self {
        Self {
            caches: parking_lot::const_mutex(Vec::new()),
        }
    }

    /// Returns the cache of type `C`, building it with `init` on first use.
    pub fn get_or_init<C, F>(&'static self, init: F) -> &'static C
    where
        C: Any + Send + Sync,
        F: FnOnce() -> C,
    {
        let mut caches = self.caches.lock();
        if let Some(cache) = caches
            .iter()
            .copied()
            .find_map(|cache| cache.downcast_ref::<C>())
        {
            return cache;
        }
        let cache: &'static C = Box::leak(Box::new(init()));
        caches.push(cache);
        cache
    }
}

impl Default for MethodCaches {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static SLOTS: MethodCaches = MethodCaches::new();

    #[test]
    fn test_one_instance_per_type() {
        let first: &'static String = SLOTS.get_or_init(|| "first".to_string());
        let again: &'static String = SLOTS.get_or_init(|| "second".to_string());
        let number: &'static u32 = SLOTS.get_or_init(|| 7);

        assert!(std::ptr::eq(first, again));
        assert_eq!(again, "first");
        assert_eq!(*number, 7);
    }
}
