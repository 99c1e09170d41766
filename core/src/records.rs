//! Accumulated records with identity-key uniqueness.

use std::collections::HashSet;

use crate::types::Identified;

/// How a fetched batch is folded into what is already displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MergeMode {
    /// Paged tables: the newest batch is the whole collection.
    #[default]
    Replace,
    /// Option pickers: keep everything seen so far and append unseen records.
    Merge,
}

/// Ordered records, never holding two with the same key.
#[derive(Debug, Clone)]
pub struct RecordCollection<T: Identified> {
    items: Vec<T>,
    keys: HashSet<T::Key>,
}

impl<T: Identified> RecordCollection<T> {
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            keys: HashSet::new(),
        }
    }

    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    pub fn contains(&self, key: &T::Key) -> bool {
        self.keys.contains(key)
    }

    /// Append the records of `batch` whose key is not yet present and return
    /// how many were appended. Duplicates inside `batch` keep the first.
    pub fn merge(&mut self, batch: Vec<T>) -> usize {
        let before = self.items.len();
        for record in batch {
            if self.keys.insert(record.key()) {
                self.items.push(record);
            }
        }
        self.items.len() - before
    }

    /// Make `batch` the whole collection, still dropping repeated keys.
    pub fn replace(&mut self, batch: Vec<T>) -> usize {
        self.clear();
        self.merge(batch)
    }

    pub fn apply(&mut self, mode: MergeMode, batch: Vec<T>) -> usize {
        match mode {
            MergeMode::Replace => self.replace(batch),
            MergeMode::Merge => self.merge(batch),
        }
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.keys.clear();
    }
}

impl<T: Identified> Default for RecordCollection<T> {
    fn default() -> Self {
        Self::new()
    }
}
