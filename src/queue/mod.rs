//! The unique queue.
//!
//! A FIFO queue holding at most one entry per key. Pushing a key that is
//! already queued does not move it; the caller's merge function combines
//! the stored value with the incoming one instead.
//!
//! Two containers back the queue: a key -> `Handle` map for O(1) lookup,
//! and an `Arena` linked list that records first-insertion order and
//! owns the entries. The handle is the entry's position marker, so removal
//! from the middle never scans.

mod arena;

use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;
use std::marker::PhantomData;

use serde::ser::{Serialize, Serializer};
use tracing::trace;

use crate::error::{Error, Result};
use crate::merge::MergePolicy;
use crate::telemetry::queue::report_inconsistency;

use arena::{Arena, Handle};

/// Type-erased merge function, as produced by the builder and by config.
pub type BoxedMerge<V> = Box<dyn FnMut(V, V) -> V + Send>;

// ---------------------------------------------------------------------------
// Queue
// ---------------------------------------------------------------------------

/// A deduplicating FIFO queue.
///
/// Keys must be `Eq + Hash + Clone`; values are unconstrained. `M` is the
/// merge function invoked as `merge(stored, incoming)` whenever a queued key
/// is pushed again.
///
/// The queue does no internal locking. Share it across threads by wrapping
/// the whole queue in a `Mutex`.
///
/// ```
/// use uniq_queue::{UniqueQueue, merge::retain_new};
///
/// let mut queue = UniqueQueue::new(retain_new);
/// assert!(queue.push("a", 1));
/// assert!(queue.push("b", 2));
/// assert!(!queue.push("a", 3));
///
/// assert_eq!(queue.pop(), Some(("a", 3)));
/// assert_eq!(queue.pop(), Some(("b", 2)));
/// assert_eq!(queue.pop(), None);
/// ```
pub struct UniqueQueue<K, V, M = BoxedMerge<V>> {
    index: HashMap<K, Handle>,
    order: Arena<K, V>,
    merge: M,
}

impl<K, V> UniqueQueue<K, V, BoxedMerge<V>> {
    /// Start building a queue whose merge function is chosen at runtime.
    pub fn builder() -> UniqueQueueBuilder<K, V> {
        UniqueQueueBuilder::new()
    }
}

impl<K, V, M> UniqueQueue<K, V, M> {
    /// Number of entries currently queued.
    pub fn len(&self) -> usize {
        debug_assert_eq!(self.index.len(), self.order.len());
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The oldest entry, without removing it.
    pub fn peek(&self) -> Option<(&K, &V)> {
        let front = self.order.front()?;
        self.order.get(front)
    }

    /// Entries front to back, in first-insertion order.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            inner: self.order.iter(),
        }
    }

    pub fn keys(&self) -> impl DoubleEndedIterator<Item = &K> + ExactSizeIterator + '_ {
        self.iter().map(|(k, _)| k)
    }

    pub fn values(&self) -> impl DoubleEndedIterator<Item = &V> + ExactSizeIterator + '_ {
        self.iter().map(|(_, v)| v)
    }

    /// Remove every entry.
    pub fn clear(&mut self) {
        self.index.clear();
        self.order.clear();
        trace!(len = 0, "queue cleared");
    }
}

impl<K, V, M> UniqueQueue<K, V, M>
where
    K: Eq + Hash + Clone,
    M: FnMut(V, V) -> V,
{
    /// Create an empty queue with the given merge function.
    pub fn new(merge: M) -> Self {
        Self::with_capacity(0, merge)
    }

    /// Create an empty queue with room for `capacity` entries.
    pub fn with_capacity(capacity: usize, merge: M) -> Self {
        Self {
            index: HashMap::with_capacity(capacity),
            order: Arena::with_capacity(capacity),
            merge,
        }
    }

    /// Queue `value` under `key`.
    ///
    /// Returns `true` if the key was not queued: it is appended at the back.
    /// Otherwise the stored value becomes `merge(stored, value)`, the key
    /// keeps its position, and `false` is returned.
    ///
    /// If the merge function panics, that key's entry is removed from the
    /// queue; every other entry keeps its value and position.
    pub fn push(&mut self, key: K, value: V) -> bool {
        // Unindexed while merging so an unwinding merge leaves no dangling key.
        if let Some(handle) = self.index.remove(&key) {
            let merge = &mut self.merge;
            let merged = self
                .order
                .replace_value_with(handle, |stored| merge(stored, value));
            if merged {
                self.index.insert(key, handle);
            } else {
                report_inconsistency("push: indexed key has no queued entry");
                debug_assert!(merged, "index and order out of sync on push");
            }
            trace!(is_new = false, len = self.order.len(), "queue push merged");
            return false;
        }

        let handle = self.order.push_back(key.clone(), value);
        self.index.insert(key, handle);
        trace!(is_new = true, len = self.order.len(), "queue push");
        true
    }

    /// Remove and return the oldest entry, or `None` if the queue is empty.
    pub fn pop(&mut self) -> Option<(K, V)> {
        let front = self.order.front()?;
        let (key, value) = self.order.remove(front)?;

        let indexed = self.index.remove(&key).is_some();
        if !indexed {
            // The slot is gone either way; only the value is withheld.
            report_inconsistency("pop: front key missing from index");
            debug_assert!(indexed, "index and order out of sync on pop");
            return None;
        }

        trace!(len = self.order.len(), "queue pop");
        Some((key, value))
    }

    /// The value queued under `key`, if any. Never changes the queue.
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let &handle = self.index.get(key)?;
        self.order.get(handle).map(|(_, v)| v)
    }

    /// Mutable access to the value queued under `key`. Position is unchanged.
    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let &handle = self.index.get(key)?;
        self.order.get_mut(handle)
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.index.contains_key(key)
    }

    /// Remove the entry for `key` wherever it sits and return its value.
    pub fn del<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let handle = self.index.remove(key)?;
        let removed = self.order.remove(handle);
        if removed.is_none() {
            report_inconsistency("del: indexed key has no queued entry");
            debug_assert!(removed.is_some(), "index and order out of sync on del");
        }
        trace!(len = self.order.len(), "queue del");
        removed.map(|(_, value)| value)
    }

    /// Pop every entry, front to back.
    ///
    /// Entries the iterator does not reach are removed when it is dropped.
    pub fn drain(&mut self) -> Drain<'_, K, V, M> {
        Drain { queue: self }
    }
}

impl<K, V, M> Extend<(K, V)> for UniqueQueue<K, V, M>
where
    K: Eq + Hash + Clone,
    M: FnMut(V, V) -> V,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.push(key, value);
        }
    }
}

impl<K, V, M> std::fmt::Debug for UniqueQueue<K, V, M>
where
    K: std::fmt::Debug,
    V: std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

/// Serialized as an ordered sequence of `[key, value]` pairs.
impl<K, V, M> Serialize for UniqueQueue<K, V, M>
where
    K: Serialize,
    V: Serialize,
{
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter())
    }
}

// ---------------------------------------------------------------------------
// Iterators
// ---------------------------------------------------------------------------

/// Borrowing iterator over a queue's entries in FIFO order.
pub struct Iter<'a, K, V> {
    inner: arena::Iter<'a, K, V>,
}

impl<K, V> Clone for Iter<'_, K, V> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> DoubleEndedIterator for Iter<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back()
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

impl<'a, K, V, M> IntoIterator for &'a UniqueQueue<K, V, M> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Draining iterator returned by [`UniqueQueue::drain`].
pub struct Drain<'a, K, V, M>
where
    K: Eq + Hash + Clone,
    M: FnMut(V, V) -> V,
{
    queue: &'a mut UniqueQueue<K, V, M>,
}

impl<K, V, M> Iterator for Drain<'_, K, V, M>
where
    K: Eq + Hash + Clone,
    M: FnMut(V, V) -> V,
{
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        self.queue.pop()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = self.queue.len();
        (len, Some(len))
    }
}

impl<K, V, M> Drop for Drain<'_, K, V, M>
where
    K: Eq + Hash + Clone,
    M: FnMut(V, V) -> V,
{
    fn drop(&mut self) {
        self.queue.clear();
    }
}

/// Owning iterator that pops entries in FIFO order.
pub struct IntoIter<K, V, M> {
    queue: UniqueQueue<K, V, M>,
}

impl<K, V, M> Iterator for IntoIter<K, V, M>
where
    K: Eq + Hash + Clone,
    M: FnMut(V, V) -> V,
{
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        self.queue.pop()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = self.queue.len();
        (len, Some(len))
    }
}

impl<K, V, M> IntoIterator for UniqueQueue<K, V, M>
where
    K: Eq + Hash + Clone,
    M: FnMut(V, V) -> V,
{
    type Item = (K, V);
    type IntoIter = IntoIter<K, V, M>;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter { queue: self }
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Fallible construction for queues whose merge function is picked at
/// runtime (for example from [`QueueConfig`](crate::config::QueueConfig)).
pub struct UniqueQueueBuilder<K, V> {
    merge: Option<BoxedMerge<V>>,
    capacity: usize,
    _key: PhantomData<fn() -> K>,
}

impl<K, V> Default for UniqueQueueBuilder<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> UniqueQueueBuilder<K, V> {
    pub fn new() -> Self {
        Self {
            merge: None,
            capacity: 0,
            _key: PhantomData,
        }
    }

    /// Use a custom merge function.
    pub fn merge(mut self, merge: impl FnMut(V, V) -> V + Send + 'static) -> Self {
        self.merge = Some(Box::new(merge));
        self
    }

    /// Use one of the standard merge policies.
    pub fn policy(self, policy: MergePolicy) -> Self
    where
        V: 'static,
    {
        self.merge(move |old, new| policy.merge(old, new))
    }

    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Build the queue.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingMerge`] if neither [`merge`](Self::merge) nor
    /// [`policy`](Self::policy) was called.
    pub fn build(self) -> Result<UniqueQueue<K, V>>
    where
        K: Eq + Hash + Clone,
    {
        let merge = self.merge.ok_or(Error::MissingMerge)?;
        Ok(UniqueQueue::with_capacity(self.capacity, merge))
    }
}
