//! Sorted set-backed task queue.
//!
//! [`SortedQueue`] keeps its elements in comparator order and exposes
//! only what the time manager needs: insert, peek/poll at the minimum,
//! keyed and predicate removal. Backed by a `BTreeSet`, so every
//! operation except predicate removal is O(log n).
//!
//! The queue itself is not synchronized. The time manager keeps it
//! behind the same mutex as the worker map, so the two are always
//! mutated together.

use std::collections::BTreeSet;

use tempora_core::QueueError;

/// An ordered set of elements with queue-style access to the minimum.
///
/// Elements that compare equal are merged: [`add`](SortedQueue::add)
/// returns `false` for an element already present. Callers must make
/// the ordering total over everything they intend to store.
#[derive(Clone, Debug)]
pub struct SortedQueue<E> {
    items: BTreeSet<E>,
}

impl<E: Ord> Default for SortedQueue<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Ord> SortedQueue<E> {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self {
            items: BTreeSet::new(),
        }
    }

    /// Insert `e`. Returns `true` if the queue changed.
    pub fn add(&mut self, e: E) -> bool {
        self.items.insert(e)
    }

    /// The minimum element, if any.
    pub fn peek(&self) -> Option<&E> {
        self.items.first()
    }

    /// Remove and return the minimum element.
    ///
    /// Returns [`QueueError::Empty`] if there is nothing to poll; check
    /// [`peek`](SortedQueue::peek) or [`is_empty`](SortedQueue::is_empty)
    /// first.
    pub fn poll(&mut self) -> Result<E, QueueError> {
        self.items.pop_first().ok_or(QueueError::Empty)
    }

    /// Remove the element equal to `e`. Returns `true` if it was present.
    pub fn remove(&mut self, e: &E) -> bool {
        self.items.remove(e)
    }

    /// Remove every element matching `filter`.
    pub fn remove_if<F>(&mut self, mut filter: F)
    where
        F: FnMut(&E) -> bool,
    {
        self.items.retain(|e| !filter(e));
    }

    /// Whether the queue holds no elements.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Whether the queue holds at least one element.
    pub fn is_not_empty(&self) -> bool {
        !self.items.is_empty()
    }

    /// Number of queued elements.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Elements in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = &E> + '_ {
        self.items.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn empty_queue() {
        let mut q: SortedQueue<u32> = SortedQueue::new();
        assert!(q.is_empty());
        assert!(!q.is_not_empty());
        assert_eq!(q.peek(), None);
        assert_eq!(q.poll(), Err(QueueError::Empty));
    }

    #[test]
    fn poll_returns_minimum_first() {
        let mut q = SortedQueue::new();
        for v in [5, 1, 4, 2, 3] {
            assert!(q.add(v));
        }
        assert_eq!(q.peek(), Some(&1));
        let drained: Vec<_> = std::iter::from_fn(|| q.poll().ok()).collect();
        assert_eq!(drained, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn duplicates_are_merged() {
        let mut q = SortedQueue::new();
        assert!(q.add(7));
        assert!(!q.add(7));
        assert_eq!(q.len(), 1);
    }

    #[test]
    fn remove_by_key_and_predicate() {
        let mut q: SortedQueue<u32> = (0..10).fold(SortedQueue::new(), |mut q, v| {
            q.add(v);
            q
        });
        assert!(q.remove(&3));
        assert!(!q.remove(&3));
        q.remove_if(|v| v % 2 == 0);
        assert_eq!(q.iter().copied().collect::<Vec<_>>(), vec![1, 5, 7, 9]);
    }

    proptest! {
        #[test]
        fn iteration_is_sorted_and_unique(values in prop::collection::vec(0u16..500, 0..200)) {
            let mut q = SortedQueue::new();
            for v in &values {
                q.add(*v);
            }
            let items: Vec<_> = q.iter().copied().collect();
            prop_assert!(items.windows(2).all(|w| w[0] < w[1]));
            let mut expected = values.clone();
            expected.sort_unstable();
            expected.dedup();
            prop_assert_eq!(items, expected);
        }

        #[test]
        fn remove_if_leaves_no_match(
            values in prop::collection::vec(0u16..500, 0..200),
            modulus in 1u16..10,
        ) {
            let mut q = SortedQueue::new();
            for v in &values {
                q.add(*v);
            }
            q.remove_if(|v| v % modulus == 0);
            prop_assert!(q.iter().all(|v| v % modulus != 0));
        }
    }
}
