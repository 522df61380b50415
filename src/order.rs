//! Logical order of array items.
//!
//! The object store keeps its keys in a sorted map, so `list[10]` sorts before
//! `list[2]` and ids like `list[b]` sort by name, not by when they were added.
//! [`ItemOrder`] records the order in which item ids first received a value so
//! that arrays can be iterated in insertion order.
//!
//! ## Why IndexSet?
//!
//! [`IndexSet`] gives O(1) membership tests and stable insertion order, and
//! re-inserting an id that is already present keeps its original position.
//!
//! ```rust
//! use serde_bit::ItemOrder;
//!
//! let mut order = ItemOrder::new();
//! order.insert("10");
//! order.insert("2");
//! order.insert("10");
//! assert_eq!(order.iter().collect::<Vec<_>>(), vec!["10", "2"]);
//! ```

use indexmap::IndexSet;

/// Insertion-ordered set of array item ids.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ItemOrder(IndexSet<String>);

impl ItemOrder {
    /// Creates an empty `ItemOrder`.
    #[must_use]
    pub fn new() -> Self {
        ItemOrder(IndexSet::new())
    }

    /// Adds `id` at the end unless it is already present.
    ///
    /// Returns `true` if the id was new.
    pub fn insert(&mut self, id: &str) -> bool {
        if self.0.contains(id) {
            return false;
        }
        self.0.insert(id.to_string())
    }

    /// Places `id` at `index`, moving it there if it is already present.
    ///
    /// `index` is clamped to the current length.
    pub fn insert_at(&mut self, index: usize, id: &str) {
        self.0.shift_remove(id);
        let index = index.min(self.0.len());
        self.0.shift_insert(index, id.to_string());
    }

    /// Removes `id`, keeping the relative order of the others.
    pub fn remove(&mut self, id: &str) -> bool {
        self.0.shift_remove(id)
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.0.contains(id)
    }

    /// Position of `id` in insertion order.
    #[must_use]
    pub fn position(&self, id: &str) -> Option<usize> {
        self.0.get_index_of(id)
    }

    /// The id at `index` in insertion order.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&str> {
        self.0.get_index(index).map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns an iterator over the ids, in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &str> + '_ {
        self.0.iter().map(String::as_str)
    }
}

impl<'a> FromIterator<&'a str> for ItemOrder {
    fn from_iter<T: IntoIterator<Item = &'a str>>(iter: T) -> Self {
        let mut order = ItemOrder::new();
        for id in iter {
            order.insert(id);
        }
        order
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_keeps_first_position() {
        let mut order = ItemOrder::new();
        assert!(order.insert("b"));
        assert!(order.insert("a"));
        assert!(!order.insert("b"));
        assert_eq!(order.iter().collect::<Vec<_>>(), vec!["b", "a"]);
        assert_eq!(order.position("a"), Some(1));
    }

    #[test]
    fn test_remove_preserves_order() {
        let mut order: ItemOrder = ["a", "b", "c"].into_iter().collect();
        assert!(order.remove("b"));
        assert!(!order.remove("b"));
        assert_eq!(order.iter().collect::<Vec<_>>(), vec!["a", "c"]);
        assert_eq!(order.get(1), Some("c"));
    }

    #[test]
    fn test_insert_at() {
        let mut order: ItemOrder = ["a", "c"].into_iter().collect();
        order.insert_at(1, "b");
        assert_eq!(order.iter().collect::<Vec<_>>(), vec!["a", "b", "c"]);
        order.insert_at(0, "c");
        assert_eq!(order.iter().collect::<Vec<_>>(), vec!["c", "a", "b"]);
        order.insert_at(99, "z");
        assert_eq!(order.get(3), Some("z"));
    }
}
