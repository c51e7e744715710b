//! Consistent hashing ring implementation.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use ringstore_store::StorageNode;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::RingConfig;
use crate::error::RingError;
use crate::hash::KeyHasher;
use crate::position::{PositionSource, RandomPositions};
use crate::slot::{SlotArena, SlotHandle};

/// Clockwise distance from position `from` to position `to` on a ring of
/// `max_positions` positions.
///
/// Asymmetric: `ring_distance(a, b, m) + ring_distance(b, a, m) == m` for
/// `a != b`.
pub fn ring_distance(from: u32, to: u32, max_positions: u32) -> u32 {
    if to >= from {
        to - from
    } else {
        max_positions - (from - to)
    }
}

/// Consistent hashing ring over a fixed space of `max_positions` positions.
///
/// Each member [`StorageNode`] occupies exactly one position. A key is owned
/// by the first node at or clockwise after the key's hashed position. Adding
/// a node moves into it only the keys it now owns; removing a node folds its
/// keys into its clockwise neighbor.
///
/// Membership changes take `&mut self`. Key operations take `&self` and rely
/// on the nodes' own interior mutability. Use
/// [`SharedHashRing`](crate::SharedHashRing) to share a ring across threads.
pub struct HashRing<K, V> {
    max_positions: u32,
    hasher: KeyHasher,
    positions: Box<dyn PositionSource>,
    slots: SlotArena<K, V>,
    /// Node identity -> slot. Holds exactly the slots on the circle.
    index: HashMap<String, SlotHandle>,
    head: Option<SlotHandle>,
}

impl<K, V> HashRing<K, V> {
    /// Create an empty ring with uniform random node placement.
    pub fn new(max_positions: u32) -> Result<Self, RingError> {
        Self::with_position_source(max_positions, RandomPositions::new())
    }

    /// Create an empty ring drawing node positions from `source`.
    pub fn with_position_source(
        max_positions: u32,
        source: impl PositionSource + 'static,
    ) -> Result<Self, RingError> {
        if max_positions < 1 {
            return Err(RingError::InvalidMaxPositions(max_positions));
        }
        Ok(Self {
            max_positions,
            hasher: KeyHasher::new(0, max_positions),
            positions: Box::new(source),
            slots: SlotArena::new(),
            index: HashMap::new(),
            head: None,
        })
    }

    /// Create an empty ring from configuration.
    ///
    /// Placement is random, seeded with `placement_seed` when set.
    pub fn from_config(config: &RingConfig) -> Result<Self, RingError> {
        config.validate()?;
        let source = match config.placement_seed {
            Some(seed) => RandomPositions::seeded(seed),
            None => RandomPositions::new(),
        };
        let ring = Self::with_position_source(config.max_positions, source)?;
        Ok(ring.with_key_seed(config.key_seed))
    }

    /// Use `seed` for key hashing instead of the default 0.
    pub fn with_key_seed(mut self, seed: u32) -> Self {
        self.hasher = KeyHasher::new(seed, self.max_positions);
        self
    }

    /// Number of member nodes.
    pub fn size(&self) -> usize {
        self.index.len()
    }

    /// Whether the ring has no members.
    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    /// Size of the ring space.
    pub fn max_positions(&self) -> u32 {
        self.max_positions
    }

    /// Whether a node with this identity is a member.
    pub fn contains_node(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Position of the member with this identity, if present.
    pub fn position_of(&self, id: &str) -> Option<u32> {
        self.index.get(id).map(|&h| self.slots[h].position)
    }

    /// Member identities in clockwise order, starting from the head slot.
    pub fn node_ids(&self) -> Vec<String> {
        self.walk().map(|(id, _)| id.to_string()).collect()
    }

    /// `(identity, position)` of every member in clockwise order, starting
    /// from the head slot.
    pub fn placements(&self) -> Vec<(String, u32)> {
        self.walk()
            .map(|(id, position)| (id.to_string(), position))
            .collect()
    }

    /// The member node with this identity, if present.
    pub fn node(&self, id: &str) -> Option<Arc<dyn StorageNode<K, V>>> {
        self.index.get(id).map(|&h| Arc::clone(&self.slots[h].node))
    }

    /// Remove `node` from the ring.
    ///
    /// If other members remain, every key `node` holds is copied into its
    /// clockwise neighbor. The node's own storage is never cleared, even when
    /// it was the last member.
    pub fn remove_node<N>(&mut self, node: &N) -> Result<(), RingError>
    where
        N: StorageNode<K, V> + ?Sized,
        K: Clone,
        V: Clone,
    {
        self.remove_node_by_id(node.id()).map(|_| ())
    }

    /// Remove the member with identity `id`, returning its node.
    ///
    /// See [`HashRing::remove_node`].
    pub fn remove_node_by_id(&mut self, id: &str) -> Result<Arc<dyn StorageNode<K, V>>, RingError>
    where
        K: Clone,
        V: Clone,
    {
        if id.is_empty() {
            return Err(RingError::EmptyNodeId);
        }
        let handle = self
            .index
            .remove(id)
            .ok_or_else(|| RingError::UnknownNode(id.to_string()))?;

        let position = self.slots[handle].position;
        match self.slots.unlink(handle) {
            None => {
                self.head = None;
                info!(node_id = %id, position, "removed last node from ring");
            }
            Some(successor) => {
                if self.head == Some(handle) {
                    self.head = Some(successor);
                }
                let heir = &self.slots[successor].node;
                let mut copied = 0usize;
                self.slots[handle].node.for_each(&mut |key, value| {
                    heir.put(key.clone(), value.clone());
                    copied += 1;
                });
                info!(
                    node_id = %id,
                    position,
                    heir = heir.id(),
                    copied,
                    "removed node from ring"
                );
            }
        }

        Ok(self.slots.remove(handle).node)
    }

    /// Walk the circle from the head, yielding `(identity, position)`.
    fn walk(&self) -> impl Iterator<Item = (&str, u32)> {
        self.head
            .into_iter()
            .flat_map(|head| self.slots.walk(head))
            .map(|(_, slot)| (slot.id(), slot.position))
    }

    fn distance(&self, from: u32, to: u32) -> u32 {
        ring_distance(from, to, self.max_positions)
    }

    /// Slot owning ring position `hash`: the first slot at or clockwise
    /// after it. `None` when the ring is empty.
    fn find_slot(&self, hash: u32) -> Option<SlotHandle> {
        let mut current = self.head?;
        loop {
            let slot = &self.slots[current];
            let next = &self.slots[slot.next];
            if self.distance(slot.position, hash) > self.distance(next.position, hash) {
                current = slot.next;
            } else {
                break;
            }
        }
        let slot = &self.slots[current];
        Some(if slot.position == hash {
            current
        } else {
            slot.next
        })
    }

    /// Draw a candidate from the position source and probe clockwise past
    /// occupied positions.
    fn free_position(&mut self) -> Result<u32, RingError> {
        let drawn = self
            .positions
            .next_position(self.max_positions)
            .ok_or(RingError::PositionsExhausted)?;
        let mut candidate = if drawn < self.max_positions {
            drawn
        } else {
            warn!(
                drawn,
                max_positions = self.max_positions,
                "position source returned an out-of-range position"
            );
            drawn % self.max_positions
        };

        let taken: HashSet<u32> = self.slots.iter().map(|slot| slot.position).collect();
        while taken.contains(&candidate) {
            candidate = (candidate + 1) % self.max_positions;
        }
        Ok(candidate)
    }

    /// Check the structural invariants of the circle and index. Panics on
    /// violation.
    #[cfg(test)]
    pub(crate) fn assert_invariants(&self) {
        assert_eq!(
            self.slots.iter().count(),
            self.index.len(),
            "arena and index disagree"
        );
        assert!(
            self.size() < self.max_positions as usize,
            "ring holds {} members with only {} positions",
            self.size(),
            self.max_positions
        );
        let Some(head) = self.head else {
            assert!(self.index.is_empty(), "empty ring with indexed slots");
            return;
        };

        let mut seen_positions = HashSet::new();
        let mut seen = 0;
        for (handle, slot) in self.slots.walk(head) {
            assert!(slot.position < self.max_positions);
            assert!(
                seen_positions.insert(slot.position),
                "duplicate position {}",
                slot.position
            );
            assert_eq!(self.slots[slot.next].prev, handle, "next/prev not inverse");
            assert_eq!(self.slots[slot.prev].next, handle, "prev/next not inverse");
            assert_eq!(self.index.get(slot.id()), Some(&handle), "slot not indexed");
            seen += 1;
        }
        assert_eq!(seen, self.index.len(), "circle length differs from index");
    }
}

impl<K, V> HashRing<K, V>
where
    K: Serialize + Clone,
    V: Clone,
{
    /// Add `node` to the ring.
    ///
    /// The node takes the position drawn from the position source, probing
    /// clockwise past occupied positions. Keys held by the node that
    /// previously owned that position move into `node` if their hash is now
    /// closer to it. On error the ring is left unchanged.
    pub fn add_node(&mut self, node: Arc<dyn StorageNode<K, V>>) -> Result<(), RingError> {
        let id = node.id().to_string();
        if id.is_empty() {
            return Err(RingError::EmptyNodeId);
        }
        if self.index.contains_key(&id) {
            return Err(RingError::DuplicateNode(id));
        }
        if self.size() + 1 >= self.max_positions as usize {
            return Err(RingError::CapacityExceeded {
                size: self.size(),
                max_positions: self.max_positions,
            });
        }

        let position = self.free_position()?;
        let handle = match self.find_slot(position) {
            None => {
                let handle = self.slots.insert(node, position);
                self.head = Some(handle);
                info!(node_id = %id, position, "added first node to ring");
                handle
            }
            Some(owner) => {
                // Hash everything before splicing so a bad key leaves the ring untouched.
                let moving = self.keys_closer_to(owner, position)?;
                let handle = self.slots.insert(node, position);
                self.slots.link_before(handle, owner);

                let from = &self.slots[owner].node;
                let to = &self.slots[handle].node;
                let moved = moving.len();
                for (key, value) in moving {
                    to.put(key.clone(), value);
                    from.remove(&key);
                }
                info!(
                    node_id = %id,
                    position,
                    from = from.id(),
                    moved,
                    "added node to ring"
                );
                handle
            }
        };

        self.index.insert(id, handle);
        Ok(())
    }

    /// Entries of `owner` whose hash is strictly closer to `position` than to
    /// the owner's own position.
    fn keys_closer_to(&self, owner: SlotHandle, position: u32) -> Result<Vec<(K, V)>, RingError> {
        let slot = &self.slots[owner];
        let mut moving = Vec::new();
        let mut failure = None;
        slot.node.for_each(&mut |key, value| {
            if failure.is_some() {
                return;
            }
            match self.hasher.position(key) {
                Ok(key_hash) => {
                    if self.distance(key_hash, slot.position) > self.distance(key_hash, position) {
                        moving.push((key.clone(), value.clone()));
                    }
                }
                Err(e) => failure = Some(e),
            }
        });
        match failure {
            Some(e) => Err(e),
            None => Ok(moving),
        }
    }

    /// Store `value` under `key` in the owning node, returning the stored
    /// value. Fails with [`RingError::EmptyRing`] if there are no members.
    pub fn put(&self, key: K, value: V) -> Result<V, RingError> {
        let key_hash = self.hasher.position(&key)?;
        let owner = self.find_slot(key_hash).ok_or(RingError::EmptyRing)?;
        let node = &self.slots[owner].node;
        debug!(key_hash, node_id = node.id(), "put key");
        Ok(node.put(key, value))
    }

    /// Value stored under `key`, if any. An empty ring holds no keys.
    pub fn get(&self, key: &K) -> Result<Option<V>, RingError> {
        let key_hash = self.hasher.position(key)?;
        let Some(owner) = self.find_slot(key_hash) else {
            return Ok(None);
        };
        let node = &self.slots[owner].node;
        debug!(key_hash, node_id = node.id(), "get key");
        Ok(node.get(key))
    }

    /// Remove `key` from its owning node, returning its value if present.
    pub fn remove(&self, key: &K) -> Result<Option<V>, RingError> {
        let key_hash = self.hasher.position(key)?;
        let Some(owner) = self.find_slot(key_hash) else {
            return Ok(None);
        };
        let node = &self.slots[owner].node;
        debug!(key_hash, node_id = node.id(), "remove key");
        Ok(node.remove(key))
    }

    /// Ring position `key` hashes to.
    pub fn key_position(&self, key: &K) -> Result<u32, RingError> {
        self.hasher.position(key)
    }

    /// Identity of the node owning `key`, or `None` on an empty ring.
    pub fn owner_of(&self, key: &K) -> Result<Option<String>, RingError> {
        let key_hash = self.hasher.position(key)?;
        Ok(self
            .find_slot(key_hash)
            .map(|owner| self.slots[owner].id().to_string()))
    }
}

impl<K, V> fmt::Debug for HashRing<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HashRing")
            .field("max_positions", &self.max_positions)
            .field("key_seed", &self.hasher.seed())
            .field("placements", &self.placements())
            .finish()
    }
}
