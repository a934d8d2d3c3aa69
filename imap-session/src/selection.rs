//! Ordered toggle sets of selected query identifiers.

use imap_core::QueryKey;

/// Insertion-ordered set of query identifiers with toggle semantics.
///
/// Iteration yields members in the order they were (last) added; removing
/// and re-adding a member moves it to the end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionSet<K> {
    members: Vec<K>,
}

impl<K: QueryKey> Default for SelectionSet<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: QueryKey> SelectionSet<K> {
    pub fn new() -> Self {
        Self {
            members: Vec::new(),
        }
    }

    /// Adds `key` if absent, removes it if present. Returns whether `key`
    /// is a member afterwards.
    pub fn toggle(&mut self, key: K) -> bool {
        match self.members.iter().position(|m| *m == key) {
            Some(index) => {
                self.members.remove(index);
                false
            }
            None => {
                self.members.push(key);
                true
            }
        }
    }

    pub fn contains(&self, key: &K) -> bool {
        self.members.contains(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = K> + '_ {
        self.members.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn clear(&mut self) {
        self.members.clear();
    }

    pub fn to_vec(&self) -> Vec<K> {
        self.members.clone()
    }
}
