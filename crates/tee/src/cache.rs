//! Bounded cache of derived pool keys.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use neo_mixer_crypto::ExtendedKey;
use parking_lot::RwLock;
use tracing::{debug, warn};

/// `index -> ExtendedKey`, filled on first derivation.
///
/// Once `capacity` entries are held, further indices are handed back
/// without being cached; derivation is pure so they are simply recomputed
/// on the next request. Lookups share a read lock and inserts take the
/// write lock, rechecking capacity under it.
#[derive(Debug)]
pub struct KeyCache {
    capacity: usize,
    entries: RwLock<HashMap<u32, Arc<ExtendedKey>>>,
    full_reported: AtomicBool,
}

impl KeyCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: RwLock::new(HashMap::new()),
            full_reported: AtomicBool::new(false),
        }
    }

    pub fn get(&self, index: u32) -> Option<Arc<ExtendedKey>> {
        self.entries.read().get(&index).cloned()
    }

    /// Returns the cached key for `index` or derives it with `derive`.
    ///
    /// `derive` runs without holding any lock.
    pub fn get_or_try_insert_with<E>(
        &self,
        index: u32,
        derive: impl FnOnce() -> Result<ExtendedKey, E>,
    ) -> Result<Arc<ExtendedKey>, E> {
        if let Some(key) = self.get(index) {
            return Ok(key);
        }

        let key = Arc::new(derive()?);
        Ok(self.insert(index, key))
    }

    /// Inserts `key` unless the cache is full, returning whichever key is
    /// now canonical for `index`.
    pub fn insert(&self, index: u32, key: Arc<ExtendedKey>) -> Arc<ExtendedKey> {
        let mut entries = self.entries.write();
        if let Some(existing) = entries.get(&index) {
            return Arc::clone(existing);
        }
        if entries.len() >= self.capacity {
            if !self.full_reported.swap(true, Ordering::Relaxed) {
                warn!(
                    target: "neo::tee",
                    capacity = self.capacity,
                    "key cache full, further keys are recomputed per request"
                );
            }
            return key;
        }
        entries.insert(index, Arc::clone(&key));
        debug!(target: "neo::tee", index, cached = entries.len(), "pool key cached");
        key
    }

    pub fn clear(&self) {
        self.entries.write().clear();
        self.full_reported.store(false, Ordering::Relaxed);
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use neo_mixer_crypto::HdError;

    fn key(byte: u8) -> ExtendedKey {
        ExtendedKey::from_seed(&[byte; 32]).unwrap()
    }

    #[test]
    fn test_caches_up_to_capacity() {
        let cache = KeyCache::new(2);
        for index in 0..4u32 {
            let derived = cache
                .get_or_try_insert_with(index, || Ok::<_, HdError>(key(index as u8)))
                .unwrap();
            assert_eq!(derived.public_key(), key(index as u8).public_key());
        }
        assert_eq!(cache.len(), 2);
        assert!(cache.get(0).is_some());
        assert!(cache.get(3).is_none());
    }

    #[test]
    fn test_cached_key_is_reused() {
        let cache = KeyCache::new(4);
        let first = cache
            .get_or_try_insert_with(1, || Ok::<_, HdError>(key(1)))
            .unwrap();
        let second = cache
            .get_or_try_insert_with(1, || Err(HdError::InvalidIndex(1)))
            .unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_errors_are_not_cached() {
        let cache = KeyCache::new(4);
        let err = cache
            .get_or_try_insert_with(5, || Err(HdError::InvalidIndex(5)))
            .unwrap_err();
        assert_eq!(err, HdError::InvalidIndex(5));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_clear() {
        let cache = KeyCache::new(4);
        cache.insert(1, Arc::new(key(1)));
        assert_eq!(cache.len(), 1);
        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.capacity(), 4);
    }
}
