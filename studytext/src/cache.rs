//! A bounded, least-recently-used memo for generated study text.

use lru::LruCache;
use std::hash::Hash;
use std::num::NonZeroUsize;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Thread-safe cache holding at most `capacity` entries.
///
/// Reads and writes both count as a use; inserting into a full cache evicts
/// the least recently used entry. A capacity of zero stores nothing.
pub struct BoundedCache<K, V> {
    capacity: usize,
    inner: Option<Mutex<LruCache<K, V>>>,
}

impl<K: Eq + Hash, V: Clone> BoundedCache<K, V> {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            inner: NonZeroUsize::new(capacity).map(|cap| Mutex::new(LruCache::new(cap))),
        }
    }

    fn lock(&self) -> Option<MutexGuard<'_, LruCache<K, V>>> {
        self.inner
            .as_ref()
            .map(|inner| inner.lock().unwrap_or_else(PoisonError::into_inner))
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.lock().map_or(0, |cache| cache.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Cached value for `key`, marking it as most recently used.
    pub fn get(&self, key: &K) -> Option<V> {
        self.lock()?.get(key).cloned()
    }

    /// Store `value`, evicting the least recently used entry when full.
    pub fn insert(&self, key: K, value: V) {
        if let Some(mut cache) = self.lock() {
            cache.put(key, value);
        }
    }

    /// Return the cached value or compute, store and return it.
    ///
    /// The lock is not held while `compute` runs; two callers racing on the
    /// same key may both compute, and the later insert wins. Errors are not
    /// cached.
    pub fn get_or_try_insert_with<E>(
        &self,
        key: K,
        compute: impl FnOnce() -> Result<V, E>,
    ) -> Result<V, E> {
        if let Some(value) = self.get(&key) {
            return Ok(value);
        }
        let value = compute()?;
        self.insert(key, value.clone());
        Ok(value)
    }

    pub fn clear(&self) {
        if let Some(mut cache) = self.lock() {
            cache.clear();
        }
    }
}
