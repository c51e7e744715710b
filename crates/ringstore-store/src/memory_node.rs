//! In-memory storage node backend.

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::sync::RwLock;

use tracing::trace;

use crate::traits::StorageNode;

/// Unbounded in-memory storage node backed by a `RwLock<HashMap>`.
///
/// Each node gets a random UUID identity unless one is supplied with
/// [`MemoryNode::with_id`].
pub struct MemoryNode<K, V> {
    id: String,
    entries: RwLock<HashMap<K, V>>,
}

impl<K, V> MemoryNode<K, V> {
    /// Create an empty node with a random UUID identity.
    pub fn new() -> Self {
        Self::with_id(uuid::Uuid::new_v4().to_string())
    }

    /// Create an empty node with the given identity.
    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            entries: RwLock::new(HashMap::new()),
        }
    }
}

impl<K, V> Default for MemoryNode<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> MemoryNode<K, V>
where
    K: Clone,
    V: Clone,
{
    /// Snapshot of every stored entry, in unspecified order.
    pub fn entries(&self) -> Vec<(K, V)> {
        let map = self.entries.read().expect("lock poisoned");
        map.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
    }
}

impl<K, V> fmt::Debug for MemoryNode<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let len = self.entries.read().expect("lock poisoned").len();
        f.debug_struct("MemoryNode")
            .field("id", &self.id)
            .field("len", &len)
            .finish()
    }
}

impl<K, V> StorageNode<K, V> for MemoryNode<K, V>
where
    K: Eq + Hash + Send + Sync,
    V: Clone + Send + Sync,
{
    fn id(&self) -> &str {
        &self.id
    }

    fn put(&self, key: K, value: V) -> V {
        let mut map = self.entries.write().expect("lock poisoned");
        map.insert(key, value.clone());
        trace!(node_id = %self.id, entries = map.len(), "stored entry in memory");
        value
    }

    fn get(&self, key: &K) -> Option<V> {
        let map = self.entries.read().expect("lock poisoned");
        map.get(key).cloned()
    }

    fn remove(&self, key: &K) -> Option<V> {
        let mut map = self.entries.write().expect("lock poisoned");
        map.remove(key)
    }

    fn for_each(&self, f: &mut dyn FnMut(&K, &V)) {
        let map = self.entries.read().expect("lock poisoned");
        for (k, v) in map.iter() {
            f(k, v);
        }
    }

    fn len(&self) -> usize {
        self.entries.read().expect("lock poisoned").len()
    }
}
