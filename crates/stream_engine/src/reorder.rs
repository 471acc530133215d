//! ReorderBuffer - releases out-of-order results in sequence-number order

use std::collections::BTreeMap;

/// Holds results keyed by sequence number until every earlier one arrived
#[derive(Debug)]
pub struct ReorderBuffer<T> {
    pending: BTreeMap<u64, T>,
    next_seq: u64,
    high_water: usize,
}

impl<T> Default for ReorderBuffer<T> {
    fn default() -> Self {
        Self {
            pending: BTreeMap::new(),
            next_seq: 0,
            high_water: 0,
        }
    }
}

impl<T> ReorderBuffer<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `item` under `seq`
    ///
    /// Returns false (and drops the item) when `seq` was already released or
    /// is already pending.
    pub fn insert(&mut self, seq: u64, item: T) -> bool {
        if seq < self.next_seq || self.pending.contains_key(&seq) {
            return false;
        }
        self.pending.insert(seq, item);
        self.high_water = self.high_water.max(self.pending.len());
        true
    }

    /// Take the next item if its predecessors have all been released
    pub fn pop_ready(&mut self) -> Option<T> {
        let item = self.pending.remove(&self.next_seq)?;
        self.next_seq += 1;
        Some(item)
    }

    /// Sequence number the buffer is waiting for
    pub fn next_seq(&self) -> u64 {
        self.next_seq
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Largest number of items held at once
    pub fn high_water(&self) -> usize {
        self.high_water
    }
}
