//! Recency List Module
//!
//! Arena-backed doubly-linked list that orders cache entries by recency.
//!
//! Nodes live in a `Vec` and link to each other by slot index, so relinking
//! is O(1) without raw back-pointers. Freed slots are recycled.
//!
//! - Front = Most recently used
//! - Back = Least recently used

/// Stable handle to a node in a [`RecencyList`].
pub type Slot = usize;

#[derive(Debug)]
struct Node<K, T> {
    /// Occupied nodes hold their key and payload; free nodes hold None
    entry: Option<(K, T)>,
    prev: Option<Slot>,
    next: Option<Slot>,
}

// == Recency List ==
/// Doubly-linked recency order over `(key, payload)` pairs.
#[derive(Debug)]
pub struct RecencyList<K, T> {
    nodes: Vec<Node<K, T>>,
    head: Option<Slot>,
    tail: Option<Slot>,
    free: Vec<Slot>,
    len: usize,
}

impl<K, T> RecencyList<K, T> {
    // == Constructor ==
    /// Creates a new empty list.
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            head: None,
            tail: None,
            free: Vec::new(),
            len: 0,
        }
    }

    /// Creates an empty list with room for `capacity` nodes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(capacity),
            ..Self::new()
        }
    }

    // == Push Front ==
    /// Inserts a new node as the most recently used and returns its slot.
    pub fn push_front(&mut self, key: K, item: T) -> Slot {
        let node = Node {
            entry: Some((key, item)),
            prev: None,
            next: None,
        };
        let slot = match self.free.pop() {
            Some(slot) => {
                self.nodes[slot] = node;
                slot
            }
            None => {
                self.nodes.push(node);
                self.nodes.len() - 1
            }
        };
        self.link_front(slot);
        self.len += 1;
        slot
    }

    // == Move To Front ==
    /// Marks a node as most recently used.
    pub fn move_to_front(&mut self, slot: Slot) {
        if !self.is_occupied(slot) || self.head == Some(slot) {
            return;
        }
        self.unlink(slot);
        self.link_front(slot);
    }

    // == Remove ==
    /// Unlinks a node and returns its key and payload.
    ///
    /// Returns None if the slot is not occupied.
    pub fn remove(&mut self, slot: Slot) -> Option<(K, T)> {
        if !self.is_occupied(slot) {
            return None;
        }
        self.unlink(slot);
        let entry = self.nodes[slot].entry.take();
        self.free.push(slot);
        self.len -= 1;
        entry
    }

    // == Pop Back ==
    /// Removes and returns the least recently used node.
    pub fn pop_back(&mut self) -> Option<(K, T)> {
        self.tail.and_then(|slot| self.remove(slot))
    }

    // == Navigation ==
    /// Slot of the most recently used node.
    pub fn front(&self) -> Option<Slot> {
        self.head
    }

    /// Slot of the least recently used node.
    pub fn back(&self) -> Option<Slot> {
        self.tail
    }

    /// Neighbour one step toward the front (more recent).
    pub fn prev(&self, slot: Slot) -> Option<Slot> {
        self.nodes.get(slot).and_then(|node| node.prev)
    }

    /// Neighbour one step toward the back (less recent).
    pub fn next(&self, slot: Slot) -> Option<Slot> {
        self.nodes.get(slot).and_then(|node| node.next)
    }

    // == Access ==
    pub fn key(&self, slot: Slot) -> Option<&K> {
        self.entry(slot).map(|(key, _)| key)
    }

    pub fn get(&self, slot: Slot) -> Option<&T> {
        self.entry(slot).map(|(_, item)| item)
    }

    pub fn get_mut(&mut self, slot: Slot) -> Option<&mut T> {
        self.nodes
            .get_mut(slot)
            .and_then(|node| node.entry.as_mut())
            .map(|(_, item)| item)
    }

    /// Iterates keys from most to least recently used.
    pub fn keys(&self) -> Keys<'_, K, T> {
        Keys {
            list: self,
            current: self.head,
        }
    }

    // == Length ==
    /// Returns the number of linked nodes.
    pub fn len(&self) -> usize {
        self.len
    }

    // == Is Empty ==
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    // == Clear ==
    /// Drops every node. The arena keeps its allocation for reuse.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.free.clear();
        self.head = None;
        self.tail = None;
        self.len = 0;
    }

    fn entry(&self, slot: Slot) -> Option<&(K, T)> {
        self.nodes.get(slot).and_then(|node| node.entry.as_ref())
    }

    fn is_occupied(&self, slot: Slot) -> bool {
        self.entry(slot).is_some()
    }

    fn unlink(&mut self, slot: Slot) {
        let (prev, next) = {
            let node = &self.nodes[slot];
            (node.prev, node.next)
        };
        match prev {
            Some(prev) => self.nodes[prev].next = next,
            None => self.head = next,
        }
        match next {
            Some(next) => self.nodes[next].prev = prev,
            None => self.tail = prev,
        }
        let node = &mut self.nodes[slot];
        node.prev = None;
        node.next = None;
    }

    fn link_front(&mut self, slot: Slot) {
        let old_head = self.head;
        {
            let node = &mut self.nodes[slot];
            node.prev = None;
            node.next = old_head;
        }
        match old_head {
            Some(head) => self.nodes[head].prev = Some(slot),
            None => self.tail = Some(slot),
        }
        self.head = Some(slot);
    }
}

impl<K, T> Default for RecencyList<K, T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over keys in most-to-least recently used order.
pub struct Keys<'a, K, T> {
    list: &'a RecencyList<K, T>,
    current: Option<Slot>,
}

impl<'a, K, T> Iterator for Keys<'a, K, T> {
    type Item = &'a K;

    fn next(&mut self) -> Option<Self::Item> {
        let slot = self.current?;
        self.current = self.list.next(slot);
        self.list.key(slot)
    }
}
