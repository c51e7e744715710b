//! Thread-safe handle to a [`HashRing`].

use std::sync::{Arc, Mutex, MutexGuard};

use ringstore_store::StorageNode;
use serde::Serialize;

use crate::error::RingError;
use crate::ring::HashRing;

/// Cloneable, thread-safe handle to a [`HashRing`].
///
/// Every call holds one exclusive lock for its full duration, so a
/// membership change (splice, key migration, reindex) is never observed
/// half-done and lookups never walk a circle that is being spliced.
pub struct SharedHashRing<K, V> {
    inner: Arc<Mutex<HashRing<K, V>>>,
}

impl<K, V> Clone for SharedHashRing<K, V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<K, V> From<HashRing<K, V>> for SharedHashRing<K, V> {
    fn from(ring: HashRing<K, V>) -> Self {
        Self::new(ring)
    }
}

impl<K, V> SharedHashRing<K, V> {
    /// Wrap `ring` for shared use.
    pub fn new(ring: HashRing<K, V>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(ring)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashRing<K, V>> {
        self.inner.lock().expect("lock poisoned")
    }

    /// Run `f` against the ring while holding the lock.
    pub fn with_ring<R>(&self, f: impl FnOnce(&HashRing<K, V>) -> R) -> R {
        f(&self.lock())
    }

    /// See [`HashRing::size`].
    pub fn size(&self) -> usize {
        self.lock().size()
    }

    /// See [`HashRing::contains_node`].
    pub fn contains_node(&self, id: &str) -> bool {
        self.lock().contains_node(id)
    }

    /// See [`HashRing::placements`].
    pub fn placements(&self) -> Vec<(String, u32)> {
        self.lock().placements()
    }

    /// See [`HashRing::remove_node_by_id`].
    pub fn remove_node_by_id(&self, id: &str) -> Result<Arc<dyn StorageNode<K, V>>, RingError>
    where
        K: Clone,
        V: Clone,
    {
        self.lock().remove_node_by_id(id)
    }

    /// See [`HashRing::remove_node`].
    pub fn remove_node<N>(&self, node: &N) -> Result<(), RingError>
    where
        N: StorageNode<K, V> + ?Sized,
        K: Clone,
        V: Clone,
    {
        self.lock().remove_node(node)
    }
}

impl<K, V> SharedHashRing<K, V>
where
    K: Serialize + Clone,
    V: Clone,
{
    /// See [`HashRing::add_node`].
    pub fn add_node(&self, node: Arc<dyn StorageNode<K, V>>) -> Result<(), RingError> {
        self.lock().add_node(node)
    }

    /// See [`HashRing::put`].
    pub fn put(&self, key: K, value: V) -> Result<V, RingError> {
        self.lock().put(key, value)
    }

    /// See [`HashRing::get`].
    pub fn get(&self, key: &K) -> Result<Option<V>, RingError> {
        self.lock().get(key)
    }

    /// See [`HashRing::remove`].
    pub fn remove(&self, key: &K) -> Result<Option<V>, RingError> {
        self.lock().remove(key)
    }

    /// See [`HashRing::owner_of`].
    pub fn owner_of(&self, key: &K) -> Result<Option<String>, RingError> {
        self.lock().owner_of(key)
    }
}
