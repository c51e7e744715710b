//! Core trait for ring storage nodes.

/// A unit of storage that a hash ring slot delegates key operations to.
///
/// Nodes are shared between the caller and the ring through `Arc`, so every
/// operation takes `&self`; implementations provide their own interior
/// mutability. A node never knows its position on the ring.
pub trait StorageNode<K, V>: Send + Sync {
    /// Stable, unique identity of this node.
    ///
    /// The ring rejects nodes whose identity is empty.
    fn id(&self) -> &str;

    /// Store `value` under `key`, returning the stored value.
    fn put(&self, key: K, value: V) -> V;

    /// Retrieve the value stored under `key`. Returns `None` if not found.
    fn get(&self, key: &K) -> Option<V>;

    /// Remove `key`, returning its value if it was present.
    fn remove(&self, key: &K) -> Option<V>;

    /// Visit every stored entry. Iteration order is unspecified.
    ///
    /// Implementations may hold an internal lock for the duration of the
    /// visit, so `f` must not call back into this node.
    fn for_each(&self, f: &mut dyn FnMut(&K, &V));

    /// Number of stored entries.
    fn len(&self) -> usize {
        let mut count = 0;
        self.for_each(&mut |_, _| count += 1);
        count
    }

    /// Whether the node holds no entries.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
