//! Doubly-linked segment list over the shared node arena.
//!
//! The three segment lists (Tiny, Probation, Protected) link records that
//! all live in one [`NodeArena`]; a `DList` is just a head/tail/len view
//! plus the splice operations, so moving a node between segments is two
//! O(1) link edits with no allocation.
//!
//! ```text
//!   head ─► [id_4] ◄──► [id_1] ◄──► [id_9] ◄── tail
//!            MRU                      LRU
//! ```
//!
//! Ordering is most-recently-touched at the head; eviction scans walk
//! backwards from the tail via [`DList::prev`].

use crate::node::{NodeArena, NodeId};

/// One segment's list view over the shared arena.
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct DList {
    head: Option<NodeId>,
    tail: Option<NodeId>,
    len: usize,
}

impl DList {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }

    pub(crate) fn head(&self) -> Option<NodeId> {
        self.head
    }

    pub(crate) fn tail(&self) -> Option<NodeId> {
        self.tail
    }

    /// Links an unlinked node at the head (MRU position).
    pub(crate) fn link_at_head(&mut self, arena: &mut NodeArena, id: NodeId) {
        let old_head = self.head;
        if let Some(node) = arena.get_mut(id) {
            node.prev = None;
            node.next = old_head;
        }
        match old_head {
            Some(head) => {
                if let Some(head_node) = arena.get_mut(head) {
                    head_node.prev = Some(id);
                }
            }
            None => self.tail = Some(id),
        }
        self.head = Some(id);
        self.len += 1;
    }

    /// Links an unlinked node at the tail (LRU position).
    pub(crate) fn link_at_tail(&mut self, arena: &mut NodeArena, id: NodeId) {
        let old_tail = self.tail;
        if let Some(node) = arena.get_mut(id) {
            node.next = None;
            node.prev = old_tail;
        }
        match old_tail {
            Some(tail) => {
                if let Some(tail_node) = arena.get_mut(tail) {
                    tail_node.next = Some(id);
                }
            }
            None => self.head = Some(id),
        }
        self.tail = Some(id);
        self.len += 1;
    }

    /// Unlinks `id` from this list, leaving its record in the arena.
    pub(crate) fn unlink(&mut self, arena: &mut NodeArena, id: NodeId) {
        let (prev, next) = match arena.get(id) {
            Some(node) => (node.prev, node.next),
            None => return,
        };

        match prev {
            Some(prev_id) => {
                if let Some(prev_node) = arena.get_mut(prev_id) {
                    prev_node.next = next;
                }
            }
            None => self.head = next,
        }

        match next {
            Some(next_id) => {
                if let Some(next_node) = arena.get_mut(next_id) {
                    next_node.prev = prev;
                }
            }
            None => self.tail = prev,
        }

        if let Some(node) = arena.get_mut(id) {
            node.prev = None;
            node.next = None;
        }
        self.len -= 1;
    }

    /// Moves an already-linked node to the head.
    pub(crate) fn move_to_head(&mut self, arena: &mut NodeArena, id: NodeId) {
        if self.head == Some(id) {
            return;
        }
        self.unlink(arena, id);
        self.link_at_head(arena, id);
    }

    /// Splices `new` into `old`'s position; `old` ends up unlinked.
    pub(crate) fn replace(&mut self, arena: &mut NodeArena, old: NodeId, new: NodeId) {
        let (prev, next) = match arena.get(old) {
            Some(node) => (node.prev, node.next),
            None => return,
        };

        if let Some(node) = arena.get_mut(new) {
            node.prev = prev;
            node.next = next;
        }
        match prev {
            Some(prev_id) => {
                if let Some(prev_node) = arena.get_mut(prev_id) {
                    prev_node.next = Some(new);
                }
            }
            None => self.head = Some(new),
        }
        match next {
            Some(next_id) => {
                if let Some(next_node) = arena.get_mut(next_id) {
                    next_node.prev = Some(new);
                }
            }
            None => self.tail = Some(new),
        }

        if let Some(node) = arena.get_mut(old) {
            node.prev = None;
            node.next = None;
        }
    }

    /// One step of reverse iteration: the node linked before `id`.
    pub(crate) fn prev(arena: &NodeArena, id: NodeId) -> Option<NodeId> {
        arena.get(id).and_then(|node| node.prev)
    }

    /// Collects ids head→tail. Used by stats and serialization.
    pub(crate) fn ids(&self, arena: &NodeArena) -> Vec<NodeId> {
        let mut out = Vec::with_capacity(self.len);
        let mut current = self.head;
        while let Some(id) = current {
            out.push(id);
            current = arena.get(id).and_then(|node| node.next);
        }
        out
    }

    #[cfg(any(test, debug_assertions))]
    pub(crate) fn debug_validate(&self, arena: &NodeArena) {
        if self.head.is_none() || self.tail.is_none() {
            assert!(self.head.is_none());
            assert!(self.tail.is_none());
            assert_eq!(self.len, 0);
            return;
        }

        let mut count = 0usize;
        let mut current = self.head;
        let mut prev = None;
        while let Some(id) = current {
            let node = arena.get(id).expect("linked node missing from arena");
            assert_eq!(node.prev, prev);
            prev = Some(id);
            current = node.next;
            count += 1;
            assert!(count <= self.len, "cycle in segment list");
        }
        assert_eq!(self.tail, prev);
        assert_eq!(count, self.len);
    }
}
