//! Bounded first-in-first-out cache of parsed trees, keyed by source text.

use crate::types::Tag;
use indexmap::IndexMap;

/// Number of documents kept by [`crate::TagParser::default`].
pub const DEFAULT_CAPACITY: usize = 40;

/// Parsed trees keyed by their exact source text.
///
/// Eviction is by insertion order; lookups do not refresh an entry.
#[derive(Debug, Clone)]
pub struct ParseCache {
    entries: IndexMap<String, Tag>,
    capacity: usize,
}

impl Default for ParseCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl ParseCache {
    /// A cache holding at most `capacity` trees. Zero disables caching.
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: IndexMap::with_capacity(capacity),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, source: &str) -> bool {
        self.entries.contains_key(source)
    }

    /// A deep copy of the cached tree for `source`.
    pub fn get(&self, source: &str) -> Option<Tag> {
        self.entries.get(source).cloned()
    }

    /// Store a copy of `tree`, evicting the oldest entry when full.
    pub fn insert(&mut self, source: &str, tree: &Tag) {
        if self.capacity == 0 {
            return;
        }
        if let Some(existing) = self.entries.get_mut(source) {
            *existing = tree.clone();
            return;
        }
        while self.entries.len() >= self.capacity {
            if let Some((evicted, _)) = self.entries.shift_remove_index(0) {
                tracing::debug!(len = evicted.len(), "evicted oldest cached tree");
            }
        }
        self.entries.insert(source.to_string(), tree.clone());
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
