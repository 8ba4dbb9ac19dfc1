// Fixed-capacity FIFO window
use serde::{Serialize, Serializer};
use std::collections::VecDeque;

/// Upper bound on the slots reserved up front; larger windows grow on demand
const PREALLOCATE_LIMIT: usize = 64;

/// Insertion-ordered sequence holding at most `capacity` elements.
///
/// Appending to a full sequence evicts the oldest element first, so the
/// sequence always holds the most recent `capacity` items, oldest first.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundedSequence<T> {
    items: VecDeque<T>,
    capacity: usize,
}

impl<T> BoundedSequence<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            items: VecDeque::with_capacity(capacity.min(PREALLOCATE_LIMIT)),
            capacity,
        }
    }

    /// Add an item as the newest element, evicting the oldest on overflow
    pub fn append(&mut self, item: T) {
        if self.capacity == 0 {
            return;
        }

        while self.items.len() >= self.capacity {
            self.items.pop_front();
        }
        self.items.push_back(item);
    }

    /// Discard the current contents and keep the last `capacity` of `items`
    pub fn replace_with<I>(&mut self, items: I)
    where
        I: IntoIterator<Item = T>,
    {
        self.items.clear();
        for item in items {
            self.append(item);
        }
    }

    /// Oldest-to-newest view of the current contents.
    ///
    /// The iterator borrows the sequence, so it cannot observe later appends,
    /// and it can be cloned to walk the same contents again.
    pub fn to_ordered_sequence(
        &self,
    ) -> impl DoubleEndedIterator<Item = &T> + ExactSizeIterator + Clone + '_ {
        self.items.iter()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<T: Serialize> Serialize for BoundedSequence<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.to_ordered_sequence())
    }
}
