//! Ring slots and the arena that links them into a circle.
//!
//! Slots are addressed by [`SlotHandle`]s rather than references, so the
//! circular `next`/`prev` links carry no ownership. The arena is the only
//! owner of slot data; freed handles are recycled.

use std::ops::{Index, IndexMut};
use std::sync::Arc;

use ringstore_store::StorageNode;

/// Stable handle to a slot in a [`SlotArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct SlotHandle(usize);

/// A storage node placed on the ring.
pub(crate) struct RingSlot<K, V> {
    pub(crate) node: Arc<dyn StorageNode<K, V>>,
    pub(crate) position: u32,
    /// Clockwise neighbor.
    pub(crate) next: SlotHandle,
    /// Counter-clockwise neighbor.
    pub(crate) prev: SlotHandle,
}

impl<K, V> RingSlot<K, V> {
    pub(crate) fn id(&self) -> &str {
        self.node.id()
    }
}

pub(crate) struct SlotArena<K, V> {
    slots: Vec<Option<RingSlot<K, V>>>,
    free: Vec<usize>,
}

impl<K, V> SlotArena<K, V> {
    pub(crate) fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
        }
    }

    /// Store a new slot linked to itself and return its handle.
    pub(crate) fn insert(&mut self, node: Arc<dyn StorageNode<K, V>>, position: u32) -> SlotHandle {
        let handle = match self.free.pop() {
            Some(i) => SlotHandle(i),
            None => {
                self.slots.push(None);
                SlotHandle(self.slots.len() - 1)
            }
        };
        self.slots[handle.0] = Some(RingSlot {
            node,
            position,
            next: handle,
            prev: handle,
        });
        handle
    }

    /// Free a slot. The caller must unlink it first.
    pub(crate) fn remove(&mut self, handle: SlotHandle) -> RingSlot<K, V> {
        let slot = self.slots[handle.0].take().expect("dangling slot handle");
        self.free.push(handle.0);
        slot
    }

    /// Splice `new` into the circle immediately counter-clockwise of `owner`.
    pub(crate) fn link_before(&mut self, new: SlotHandle, owner: SlotHandle) {
        let prev = self[owner].prev;
        self[new].next = owner;
        self[new].prev = prev;
        self[prev].next = new;
        self[owner].prev = new;
    }

    /// Remove `handle` from the circle, joining its neighbors.
    ///
    /// Returns the clockwise neighbor, or `None` if `handle` was alone.
    pub(crate) fn unlink(&mut self, handle: SlotHandle) -> Option<SlotHandle> {
        let RingSlot { next, prev, .. } = self[handle];
        if next == handle {
            return None;
        }
        self[prev].next = next;
        self[next].prev = prev;
        self[handle].next = handle;
        self[handle].prev = handle;
        Some(next)
    }

    /// Walk the circle clockwise starting at `start`, visiting each slot once.
    pub(crate) fn walk(&self, start: SlotHandle) -> Walk<'_, K, V> {
        Walk {
            arena: self,
            start,
            current: Some(start),
        }
    }

    /// Every live slot, in storage order.
    pub(crate) fn iter(&self) -> impl Iterator<Item = &RingSlot<K, V>> {
        self.slots.iter().flatten()
    }
}

impl<K, V> Index<SlotHandle> for SlotArena<K, V> {
    type Output = RingSlot<K, V>;

    fn index(&self, handle: SlotHandle) -> &Self::Output {
        self.slots[handle.0].as_ref().expect("dangling slot handle")
    }
}

impl<K, V> IndexMut<SlotHandle> for SlotArena<K, V> {
    fn index_mut(&mut self, handle: SlotHandle) -> &mut Self::Output {
        self.slots[handle.0].as_mut().expect("dangling slot handle")
    }
}

/// Clockwise iterator over the circle.
pub(crate) struct Walk<'a, K, V> {
    arena: &'a SlotArena<K, V>,
    start: SlotHandle,
    current: Option<SlotHandle>,
}

impl<'a, K, V> Iterator for Walk<'a, K, V> {
    type Item = (SlotHandle, &'a RingSlot<K, V>);

    fn next(&mut self) -> Option<Self::Item> {
        let handle = self.current?;
        let slot = &self.arena[handle];
        self.current = (slot.next != self.start).then_some(slot.next);
        Some((handle, slot))
    }
}
