//! Newest-first list with a hard capacity

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Newest-first list holding at most `capacity` items
///
/// Index 0 is always the most recently pushed item. Pushing past capacity
/// evicts from the back, i.e. the oldest entries.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundedLog<T> {
    items: VecDeque<T>,
    capacity: usize,
}

impl<T> BoundedLog<T> {
    /// A capacity of zero is treated as one
    pub fn new(capacity: usize) -> Self {
        Self {
            items: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    /// Adopt an existing newest-first list, dropping whatever exceeds capacity
    pub fn from_vec(items: Vec<T>, capacity: usize) -> Self {
        let mut log = Self {
            items: items.into(),
            capacity: capacity.max(1),
        };
        log.truncate();
        log
    }

    /// Prepend an item; returns how many old items were evicted
    pub fn push(&mut self, item: T) -> usize {
        self.items.push_front(item);
        self.truncate()
    }

    /// Change the capacity, evicting the oldest items if it shrank
    pub fn set_capacity(&mut self, capacity: usize) -> usize {
        self.capacity = capacity.max(1);
        self.truncate()
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

    pub fn get(&self, index: usize) -> Option<&T> {
        self.items.get(index)
    }

    /// Newest first
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }

    pub fn retain<F: FnMut(&T) -> bool>(&mut self, f: F) {
        self.items.retain(f);
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    fn truncate(&mut self) -> usize {
        let overflow = self.items.len().saturating_sub(self.capacity);
        self.items.truncate(self.capacity);
        overflow
    }
}

impl<T: Clone> BoundedLog<T> {
    /// Newest-first copy of the contents
    pub fn to_vec(&self) -> Vec<T> {
        self.items.iter().cloned().collect()
    }
}

// Persisted as a plain JSON array; capacity comes from configuration.
impl<T: Serialize> Serialize for BoundedLog<T> {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.items.serialize(serializer)
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for BoundedLog<T> {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let items = Vec::<T>::deserialize(deserializer)?;
        let capacity = items.len();
        Ok(Self::from_vec(items, capacity))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_push_is_newest_first() {
        let mut log = BoundedLog::new(3);
        log.push(1);
        log.push(2);
        log.push(3);
        assert_eq!(log.to_vec(), vec![3, 2, 1]);
    }

    #[test]
    fn test_push_evicts_oldest() {
        let mut log = BoundedLog::new(2);
        assert_eq!(log.push("a"), 0);
        assert_eq!(log.push("b"), 0);
        assert_eq!(log.push("c"), 1);
        assert_eq!(log.to_vec(), vec!["c", "b"]);
    }

    #[test]
    fn test_set_capacity_shrinks() {
        let mut log = BoundedLog::from_vec(vec![5, 4, 3, 2, 1], 10);
        assert_eq!(log.set_capacity(2), 3);
        assert_eq!(log.to_vec(), vec![5, 4]);
        assert_eq!(log.capacity(), 2);
    }

    #[test]
    fn test_zero_capacity_keeps_one() {
        let mut log = BoundedLog::new(0);
        log.push(1);
        log.push(2);
        assert_eq!(log.to_vec(), vec![2]);
    }

    #[test]
    fn test_from_vec_truncates_oldest() {
        let log = BoundedLog::from_vec(vec!["new", "mid", "old"], 2);
        assert_eq!(log.to_vec(), vec!["new", "mid"]);
    }

    #[test]
    fn test_retain_and_clear() {
        let mut log = BoundedLog::from_vec(vec![1, 2, 3, 4], 10);
        log.retain(|n| n % 2 == 0);
        assert_eq!(log.to_vec(), vec![2, 4]);
        log.clear();
        assert!(log.is_empty());
    }

    #[test]
    fn test_serializes_as_plain_array() {
        let log = BoundedLog::from_vec(vec![1, 2], 5);
        assert_eq!(serde_json::to_string(&log).unwrap(), "[1,2]");
        let parsed: BoundedLog<i32> = serde_json::from_str("[3,2,1]").unwrap();
        assert_eq!(parsed.to_vec(), vec![3, 2, 1]);
    }

    proptest! {
        #[test]
        fn prop_never_exceeds_capacity(capacity in 1usize..20, pushes in prop::collection::vec(any::<u32>(), 0..100)) {
            let mut log = BoundedLog::new(capacity);
            for item in &pushes {
                log.push(*item);
                prop_assert!(log.len() <= capacity);
            }
        }

        #[test]
        fn prop_keeps_the_newest_in_reverse_order(capacity in 1usize..20, pushes in prop::collection::vec(any::<u32>(), 0..100)) {
            let mut log = BoundedLog::new(capacity);
            for item in &pushes {
                log.push(*item);
            }
            let expected: Vec<u32> = pushes.iter().rev().take(capacity).copied().collect();
            prop_assert_eq!(log.to_vec(), expected);
        }

        #[test]
        fn prop_evicted_counts_add_up(capacity in 1usize..20, pushes in prop::collection::vec(any::<u8>(), 0..60)) {
            let mut log = BoundedLog::new(capacity);
            let evicted: usize = pushes.iter().map(|item| log.push(*item)).sum();
            prop_assert_eq!(evicted + log.len(), pushes.len());
        }
    }
}
