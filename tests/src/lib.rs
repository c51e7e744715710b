//! Shared test harness for ringstore integration tests.
//!
//! Provides [`TestCluster`]: a [`HashRing`] over N in-memory nodes with
//! helpers to write a key set, churn membership, and check that every key
//! lives in exactly one member.

use std::sync::Arc;

use ringstore_placement::{
    HashRing, PositionSource, RandomPositions, RingError, SequencePositions,
};
use ringstore_store::{MemoryNode, StorageNode};

/// Node type used by every integration test.
pub type TestNode = Arc<MemoryNode<String, u64>>;

/// A ring plus handles to every node that ever joined it.
pub struct TestCluster {
    ring: HashRing<String, u64>,
    nodes: Vec<TestNode>,
}

impl TestCluster {
    /// `n` nodes placed by a seeded random source over `max_positions`.
    pub fn new(n: usize, max_positions: u32, seed: u64) -> Self {
        let source = RandomPositions::seeded(seed);
        let mut c = Self::with_source(max_positions, source);
        for _ in 0..n {
            c.add_node().unwrap();
        }
        c
    }

    /// Empty cluster whose joiners take `positions` in order.
    pub fn with_positions(max_positions: u32, positions: &[u32]) -> Self {
        Self::with_source(max_positions, SequencePositions::new(positions.iter().copied()))
    }

    /// Empty cluster over an arbitrary position source.
    pub fn with_source(max_positions: u32, source: impl PositionSource + 'static) -> Self {
        Self {
            ring: HashRing::with_position_source(max_positions, source).unwrap(),
            nodes: Vec::new(),
        }
    }

    /// Add a fresh node named `node-{index}` and return its index.
    pub fn add_node(&mut self) -> Result<usize, RingError> {
        let idx = self.nodes.len();
        let node: TestNode = Arc::new(MemoryNode::with_id(format!("node-{idx}")));
        self.ring.add_node(node.clone())?;
        self.nodes.push(node);
        Ok(idx)
    }

    /// Remove node `i` from the ring. Its handle stays reachable via [`Self::node`].
    pub fn remove_node(&mut self, i: usize) -> Result<(), RingError> {
        self.ring.remove_node(self.nodes[i].as_ref())
    }

    /// Handle to node `i`, member or not.
    pub fn node(&self, i: usize) -> &TestNode {
        &self.nodes[i]
    }

    /// Indices of the nodes currently in the ring.
    pub fn members(&self) -> Vec<usize> {
        (0..self.nodes.len())
            .filter(|&i| self.ring.contains_node(self.nodes[i].id()))
            .collect()
    }

    pub fn ring(&self) -> &HashRing<String, u64> {
        &self.ring
    }

    /// Write `count` keys through the ring, returning what was written.
    pub fn write_keys(&self, count: u64) -> Vec<(String, u64)> {
        let keys = test_keys(count);
        for (k, v) in &keys {
            self.ring.put(k.clone(), *v).unwrap();
        }
        keys
    }

    /// Panic unless every key reads back its value through the ring.
    pub fn assert_readable(&self, keys: &[(String, u64)]) {
        for (k, v) in keys {
            assert_eq!(self.ring.get(k).unwrap(), Some(*v), "reading {k}");
        }
    }

    /// Entries node `i` holds, sorted by key.
    pub fn entries(&self, i: usize) -> Vec<(String, u64)> {
        let mut entries = self.nodes[i].entries();
        entries.sort_unstable();
        entries
    }

    /// Number of members holding `key`.
    pub fn holders(&self, key: &String) -> usize {
        self.members()
            .into_iter()
            .filter(|&i| self.nodes[i].get(key).is_some())
            .count()
    }

    /// Total entries held across current members.
    pub fn stored(&self) -> usize {
        self.members().into_iter().map(|i| self.nodes[i].len()).sum()
    }
}

/// `count` distinct keys `key-00000..` with their index as value.
pub fn test_keys(count: u64) -> Vec<(String, u64)> {
    (0..count).map(|i| (format!("key-{i:05}"), i)).collect()
}
