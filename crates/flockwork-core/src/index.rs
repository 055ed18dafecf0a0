//! Dense sampling set
//!
//! Elements live in a contiguous vector with a position map beside it.
//! Removal swaps the last element into the vacated slot, so insert, remove
//! and uniform sampling are all O(1) amortized. Iteration order depends only
//! on the sequence of operations, never on hashing, which keeps seeded runs
//! reproducible.

use std::collections::HashMap;
use std::hash::Hash;

use crate::rng::SimRng;

/// Unordered set supporting uniform random sampling
#[derive(Debug, Clone)]
pub struct SampleSet<T> {
    items: Vec<T>,
    positions: HashMap<T, usize>,
}

impl<T: Copy + Eq + Hash> SampleSet<T> {
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            positions: HashMap::new(),
        }
    }

    /// Insert `item`; returns `false` if it was already present
    pub fn insert(&mut self, item: T) -> bool {
        if self.positions.contains_key(&item) {
            return false;
        }
        self.positions.insert(item, self.items.len());
        self.items.push(item);
        true
    }

    /// Remove `item`; returns `false` if it was not present
    pub fn remove(&mut self, item: &T) -> bool {
        let Some(position) = self.positions.remove(item) else {
            return false;
        };
        self.items.swap_remove(position);
        if let Some(moved) = self.items.get(position) {
            self.positions.insert(*moved, position);
        }
        true
    }

    pub fn contains(&self, item: &T) -> bool {
        self.positions.contains_key(item)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Draw one element uniformly at random, `None` if empty
    pub fn sample(&self, rng: &mut SimRng) -> Option<T> {
        if self.items.is_empty() {
            return None;
        }
        Some(self.items[rng.index_below(self.items.len())])
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.positions.clear();
    }
}

impl<T: Copy + Eq + Hash + Ord> SampleSet<T> {
    /// Contents in ascending order
    pub fn to_sorted_vec(&self) -> Vec<T> {
        let mut items = self.items.clone();
        items.sort_unstable();
        items
    }
}

impl<T: Copy + Eq + Hash> Default for SampleSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Copy + Eq + Hash> FromIterator<T> for SampleSet<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut set = Self::new();
        for item in iter {
            set.insert(item);
        }
        set
    }
}
