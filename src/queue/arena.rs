//! Slot arena backing the queue's ordered sequence.
//!
//! A doubly linked list whose nodes live in a single `Vec`. Freed slots are
//! threaded onto a free list and reused; every reuse bumps the slot's
//! generation so a stale [`Handle`] never resolves to a newer node.

/// Position marker for a node in the [`Arena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct Handle {
    index: usize,
    generation: u64,
}

#[derive(Debug)]
struct Node<K, V> {
    key: K,
    value: V,
    prev: Option<usize>,
    next: Option<usize>,
}

#[derive(Debug)]
enum Slot<K, V> {
    Occupied { generation: u64, node: Node<K, V> },
    Vacant { generation: u64, next_free: Option<usize> },
}

impl<K, V> Slot<K, V> {
    fn generation(&self) -> u64 {
        match self {
            Slot::Occupied { generation, .. } | Slot::Vacant { generation, .. } => *generation,
        }
    }
}

#[derive(Debug)]
pub(crate) struct Arena<K, V> {
    slots: Vec<Slot<K, V>>,
    head: Option<usize>,
    tail: Option<usize>,
    free: Option<usize>,
    len: usize,
}

impl<K, V> Arena<K, V> {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            head: None,
            tail: None,
            free: None,
            len: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    /// Append a node at the back of the list.
    pub fn push_back(&mut self, key: K, value: V) -> Handle {
        let node = Node {
            key,
            value,
            prev: self.tail,
            next: None,
        };

        let (index, generation) = match self.free {
            Some(index) => {
                let generation = self.slots[index].generation() + 1;
                let Slot::Vacant { next_free, .. } =
                    std::mem::replace(&mut self.slots[index], Slot::Occupied { generation, node })
                else {
                    unreachable!("free list points at an occupied slot");
                };
                self.free = next_free;
                (index, generation)
            }
            None => {
                self.slots.push(Slot::Occupied {
                    generation: 0,
                    node,
                });
                (self.slots.len() - 1, 0)
            }
        };

        match self.tail {
            Some(tail) => {
                if let Some(node) = self.node_mut(tail) {
                    node.next = Some(index);
                }
            }
            None => self.head = Some(index),
        }
        self.tail = Some(index);
        self.len += 1;

        Handle { index, generation }
    }

    /// Handle of the front node, if any.
    pub fn front(&self) -> Option<Handle> {
        let index = self.head?;
        Some(Handle {
            index,
            generation: self.slots[index].generation(),
        })
    }

    pub fn get(&self, handle: Handle) -> Option<(&K, &V)> {
        match self.slots.get(handle.index)? {
            Slot::Occupied { generation, node } if *generation == handle.generation => {
                Some((&node.key, &node.value))
            }
            _ => None,
        }
    }

    pub fn get_mut(&mut self, handle: Handle) -> Option<&mut V> {
        match self.slots.get_mut(handle.index)? {
            Slot::Occupied { generation, node } if *generation == handle.generation => {
                Some(&mut node.value)
            }
            _ => None,
        }
    }

    /// Replace the node's value with `f(value)`, keeping its position.
    ///
    /// Returns `false` if the handle is stale. If `f` panics, the node is
    /// unlinked and its slot freed, leaving the rest of the list intact.
    pub fn replace_value_with(&mut self, handle: Handle, f: impl FnOnce(V) -> V) -> bool {
        match self.slots.get(handle.index) {
            Some(Slot::Occupied { generation, .. }) if *generation == handle.generation => {}
            _ => return false,
        }

        let placeholder = Slot::Vacant {
            generation: handle.generation,
            next_free: None,
        };
        let Slot::Occupied {
            generation,
            mut node,
        } = std::mem::replace(&mut self.slots[handle.index], placeholder)
        else {
            return false;
        };

        let guard = UnlinkOnUnwind {
            arena: self,
            index: handle.index,
            prev: node.prev,
            next: node.next,
        };
        node.value = f(node.value);
        std::mem::forget(guard);

        self.slots[handle.index] = Slot::Occupied { generation, node };
        true
    }

    /// Unlink and free the node behind `handle`.
    ///
    /// Returns `None` (and changes nothing) if the handle is stale.
    pub fn remove(&mut self, handle: Handle) -> Option<(K, V)> {
        match self.slots.get(handle.index)? {
            Slot::Occupied { generation, .. } if *generation == handle.generation => {}
            _ => return None,
        }

        let vacant = Slot::Vacant {
            generation: handle.generation,
            next_free: None,
        };
        let Slot::Occupied { node, .. } = std::mem::replace(&mut self.slots[handle.index], vacant)
        else {
            return None;
        };
        self.unlink(handle.index, node.prev, node.next);

        Some((node.key, node.value))
    }

    /// Splice a slot that has already been emptied out of the list and
    /// push it onto the free list.
    fn unlink(&mut self, index: usize, prev: Option<usize>, next: Option<usize>) {
        if let Some(Slot::Vacant { next_free, .. }) = self.slots.get_mut(index) {
            *next_free = self.free;
        }
        self.free = Some(index);
        self.len -= 1;

        match prev {
            Some(prev) => {
                if let Some(prev) = self.node_mut(prev) {
                    prev.next = next;
                }
            }
            None => self.head = next,
        }
        match next {
            Some(next) => {
                if let Some(next) = self.node_mut(next) {
                    next.prev = prev;
                }
            }
            None => self.tail = prev,
        }
    }

    /// Drop every node. Slots are kept and recycled with fresh generations.
    pub fn clear(&mut self) {
        let mut free = None;
        for index in (0..self.slots.len()).rev() {
            let generation = self.slots[index].generation();
            self.slots[index] = Slot::Vacant {
                generation,
                next_free: free,
            };
            free = Some(index);
        }
        self.free = free;
        self.head = None;
        self.tail = None;
        self.len = 0;
    }

    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            arena: self,
            front: self.head,
            back: self.tail,
            remaining: self.len,
        }
    }

    fn node(&self, index: usize) -> Option<&Node<K, V>> {
        match self.slots.get(index)? {
            Slot::Occupied { node, .. } => Some(node),
            Slot::Vacant { .. } => None,
        }
    }

    fn node_mut(&mut self, index: usize) -> Option<&mut Node<K, V>> {
        match self.slots.get_mut(index)? {
            Slot::Occupied { node, .. } => Some(node),
            Slot::Vacant { .. } => None,
        }
    }
}

/// Frees a node's slot if a merge function unwinds while the node is
/// moved out of the arena.
struct UnlinkOnUnwind<'a, K, V> {
    arena: &'a mut Arena<K, V>,
    index: usize,
    prev: Option<usize>,
    next: Option<usize>,
}

impl<K, V> Drop for UnlinkOnUnwind<'_, K, V> {
    fn drop(&mut self) {
        self.arena.unlink(self.index, self.prev, self.next);
    }
}

/// Front-to-back iterator over live nodes.
pub(crate) struct Iter<'a, K, V> {
    arena: &'a Arena<K, V>,
    front: Option<usize>,
    back: Option<usize>,
    remaining: usize,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let node = self.arena.node(self.front?)?;
        self.front = node.next;
        self.remaining -= 1;
        Some((&node.key, &node.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> DoubleEndedIterator for Iter<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let node = self.arena.node(self.back?)?;
        self.back = node.prev;
        self.remaining -= 1;
        Some((&node.key, &node.value))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

impl<K, V> Clone for Iter<'_, K, V> {
    fn clone(&self) -> Self {
        Self {
            arena: self.arena,
            front: self.front,
            back: self.back,
            remaining: self.remaining,
        }
    }
}
