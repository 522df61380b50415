//! The hierarchical object store.
//!
//! An [`Object`] is a handle onto a shared store plus a [`Key`]. The handle
//! returned by [`Object::new`] addresses the root of a fresh store; every
//! navigation method ([`at`](Object::at), [`parent`](Object::parent),
//! [`clip`](Object::clip), [`array`](Object::array), ...) returns another view
//! onto the same store. The store lives as long as any handle does.
//!
//! The store holds:
//!
//! - an ordered map from full path to value, where a value may be a tombstone
//!   (explicitly absent, distinct from never set),
//! - the set of nulled paths, i.e. subtrees that were erased as a whole,
//! - for every array path, the [`ItemOrder`] of its item ids, so arrays can be
//!   iterated in insertion order even though the map is sorted.
//!
//! ## Examples
//!
//! ```rust
//! use serde_bit::Object;
//!
//! let config = Object::new();
//! config.at("server.host").set("localhost");
//! config.at("server.port").set("8080");
//!
//! let server = config.at("server");
//! assert_eq!(server.at("port").value().as_deref(), Some("8080"));
//! assert_eq!(server.list_values().len(), 2);
//!
//! server.erase();
//! assert!(server.is_nulled());
//! assert!(config.at("server.port").value().is_none());
//! ```
//!
//! Views share the store, and are single-threaded: `Object` is neither `Send`
//! nor `Sync`.

use crate::array::Array;
use crate::key::{self, Key};
use crate::options::{EncodeOptions, RowMode};
use crate::order::ItemOrder;
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::cell::RefCell;
use std::collections::{btree_map, BTreeMap, BTreeSet, HashMap, HashSet};
use std::fmt;
use std::ops::Bound;
use std::rc::Rc;

/// Range bounds covering every path strictly below `path`.
fn below_bounds(path: &str) -> (Bound<String>, Bound<String>) {
    if path.is_empty() {
        (Bound::Excluded(String::new()), Bound::Unbounded)
    } else {
        (
            Bound::Included(format!("{path}.")),
            Bound::Excluded(format!("{path}/")),
        )
    }
}

/// Shared state behind every [`Object`] view of one store.
#[derive(Debug, Default, Clone)]
pub(crate) struct Detail {
    keys: BTreeMap<String, Option<String>>,
    nulled: BTreeSet<String>,
    records: BTreeMap<String, ItemOrder>,
    // item path -> slot asked for by `Array::insert_at`, taken on first value
    reserved: HashMap<String, usize>,
}

impl Detail {
    fn below(&self, path: &str) -> btree_map::Range<'_, String, Option<String>> {
        self.keys.range(below_bounds(path))
    }

    fn subtree<'a>(
        &'a self,
        path: &str,
    ) -> impl Iterator<Item = (&'a String, &'a Option<String>)> + 'a {
        self.keys
            .get_key_value(path)
            .into_iter()
            .chain(self.below(path))
    }

    fn has_value_at_or_below(&self, path: &str) -> bool {
        self.subtree(path).any(|(_, value)| value.is_some())
    }

    fn has_child(&self, path: &str) -> bool {
        self.below(path)
            .any(|(k, value)| value.is_some() || self.nulled.contains(k))
    }

    fn has_descendants(&self, path: &str) -> bool {
        self.below(path).next().is_some()
    }

    fn has_nulled_at_or_below(&self, path: &str) -> bool {
        self.nulled.contains(path) || self.nulled.range(below_bounds(path)).next().is_some()
    }

    pub(crate) fn records(&self, array: &str) -> Option<&ItemOrder> {
        self.records.get(array)
    }

    pub(crate) fn reserve_item(&mut self, item: &str, index: usize) {
        let array = key::array_name(item);
        let id = key::array_item_id(item);
        if let Some(order) = self.records.get_mut(array) {
            if order.contains(id) {
                order.insert_at(index, id);
                return;
            }
        }
        self.reserved.insert(item.to_string(), index);
    }

    pub(crate) fn item_in_use(&self, item: &str) -> bool {
        self.reserved.contains_key(item) || self.subtree(item).next().is_some()
    }

    fn store(&mut self, path: &str, value: Option<String>) {
        let added = value.is_some();
        self.keys.insert(path.to_string(), value);
        if added {
            self.verify_arrays_on_add(path);
        } else {
            self.verify_arrays_on_remove(path);
        }
    }

    fn verify_arrays_on_add(&mut self, path: &str) {
        let mut current = path;
        while !current.is_empty() {
            if key::is_array_item(current) {
                let slot = self.reserved.remove(current);
                let order = self
                    .records
                    .entry(key::array_name(current).to_string())
                    .or_default();
                let id = key::array_item_id(current);
                match slot {
                    Some(index) if !order.contains(id) => order.insert_at(index, id),
                    _ => {
                        order.insert(id);
                    }
                }
            }
            current = key::parent(current);
        }
    }

    fn verify_arrays_on_remove(&mut self, path: &str) {
        let mut current = path;
        while !current.is_empty() {
            if key::is_array_item(current) && !self.has_value_at_or_below(current) {
                let array = key::array_name(current);
                if let Some(order) = self.records.get_mut(array) {
                    order.remove(key::array_item_id(current));
                    if order.is_empty() {
                        self.records.remove(array);
                    }
                }
            }
            current = key::parent(current);
        }
    }

    /// Positions of the array items enclosing `path`, and `path` itself.
    fn item_slots(&self, path: &str) -> Vec<(String, String, usize)> {
        let mut slots = Vec::new();
        let mut current = path;
        while !current.is_empty() {
            if key::is_array_item(current) {
                let array = key::array_name(current);
                let id = key::array_item_id(current);
                if let Some(index) = self.records.get(array).and_then(|o| o.position(id)) {
                    slots.push((array.to_string(), id.to_string(), index));
                }
            }
            current = key::parent(current);
        }
        slots
    }

    /// Moves items that still hold a value back to their saved positions.
    fn restore_slots(&mut self, slots: &[(String, String, usize)]) {
        for (array, id, index) in slots {
            if let Some(order) = self.records.get_mut(array) {
                if order.contains(id) {
                    order.insert_at(*index, id);
                }
            }
        }
    }

    fn first_value(&self, path: &str) -> Option<(String, String)> {
        self.subtree(path).find_map(|(k, value)| {
            value
                .as_ref()
                .map(|v| (key::child_name(path, k).to_string(), v.clone()))
        })
    }

    fn clear(&mut self, path: &str) {
        let removed: Vec<String> = self.subtree(path).map(|(k, _)| k.clone()).collect();
        for k in &removed {
            self.keys.remove(k);
        }
        for k in &removed {
            self.verify_arrays_on_remove(k);
        }
        self.nulled.retain(|k| !key::is_child_or_same(path, k));
        self.reserved.retain(|k, _| !key::is_child_or_same(path, k));
    }

    fn erase(&mut self, path: &str) {
        self.clear(path);
        self.nulled.insert(path.to_string());
        self.store(path, None);
    }

    /// Direct child segments of `path`, array items in logical order.
    fn children(&self, path: &str) -> Vec<String> {
        let (mut cursor, end) = below_bounds(path);
        let mut segments: Vec<&str> = Vec::new();
        let mut seen: HashSet<&str> = HashSet::new();
        while let Some((k, _)) = self.keys.range((cursor.clone(), end.clone())).next() {
            let segment = key::first_segment(key::child_name(path, k));
            if seen.insert(segment) {
                segments.push(segment);
            }
            let child = key::join(path, segment);
            // skip the rest of the child's subtree in one step
            cursor = if k.len() > child.len() {
                Bound::Included(format!("{child}/"))
            } else {
                Bound::Excluded(k.clone())
            };
        }

        let mut ordered = Vec::with_capacity(segments.len());
        let mut arrays_done: HashSet<String> = HashSet::new();
        for &segment in &segments {
            if !key::is_array_item(segment) {
                ordered.push(segment.to_string());
                continue;
            }
            let array = key::array_name(&key::join(path, segment)).to_string();
            if arrays_done.contains(&array) {
                continue;
            }
            let items: HashMap<&str, &str> = segments
                .iter()
                .copied()
                .filter(|s| {
                    key::is_array_item(s) && key::array_name(&key::join(path, s)) == array
                })
                .map(|s| (key::array_item_id(s), s))
                .collect();
            let mut rest: Vec<&str> = items.values().copied().collect();
            rest.sort_unstable();
            if let Some(order) = self.records.get(&array) {
                for id in order.iter() {
                    if let Some(s) = items.get(id) {
                        ordered.push(s.to_string());
                    }
                }
                rest.retain(|s| !order.contains(key::array_item_id(s)));
            }
            ordered.extend(rest.into_iter().map(str::to_string));
            arrays_done.insert(array);
        }
        ordered
    }
}

/// Relative view of one subtree, used for comparisons and debugging.
#[derive(Debug, PartialEq)]
struct Snapshot {
    entries: BTreeMap<String, Option<String>>,
    nulled: BTreeSet<String>,
    records: BTreeMap<String, Vec<String>>,
}

/// A handle onto a shared key/value store, addressing one key.
///
/// Cloning an `Object` clones the handle, not the data; use
/// [`copy`](Object::copy) for a deep copy.
#[derive(Clone)]
pub struct Object {
    store: Rc<RefCell<Detail>>,
    key: Key,
}

impl Default for Object {
    fn default() -> Self {
        Self::new()
    }
}

impl Object {
    /// Creates an empty store and returns a handle to its root.
    #[must_use]
    pub fn new() -> Self {
        Object {
            store: Rc::new(RefCell::new(Detail::default())),
            key: Key::default(),
        }
    }

    pub(crate) fn view(&self, key: Key) -> Object {
        Object {
            store: Rc::clone(&self.store),
            key,
        }
    }

    fn path(&self) -> &str {
        self.key.path()
    }

    pub(crate) fn with_detail<R>(&self, f: impl FnOnce(&Detail) -> R) -> R {
        f(&self.store.borrow())
    }

    pub(crate) fn with_detail_mut<R>(&self, f: impl FnOnce(&mut Detail) -> R) -> R {
        f(&mut self.store.borrow_mut())
    }

    #[must_use]
    pub fn key(&self) -> &Key {
        &self.key
    }

    /// `true` if both handles view the same store.
    #[must_use]
    pub fn shares_store(&self, other: &Object) -> bool {
        Rc::ptr_eq(&self.store, &other.store)
    }

    /// The value at this key; `None` if never set or tombstoned.
    #[must_use]
    pub fn value(&self) -> Option<String> {
        self.store.borrow().keys.get(self.path()).cloned().flatten()
    }

    /// The raw entry at this key: `None` if nothing is stored,
    /// `Some(None)` for a tombstone.
    #[must_use]
    pub fn entry(&self) -> Option<Option<String>> {
        self.store.borrow().keys.get(self.path()).cloned()
    }

    /// Stores `value`, or a tombstone for `None`.
    pub fn assign(&self, value: Option<&str>) {
        self.store
            .borrow_mut()
            .store(self.path(), value.map(str::to_string));
    }

    /// Stores `value`.
    pub fn set(&self, value: impl Into<String>) {
        self.store
            .borrow_mut()
            .store(self.path(), Some(value.into()));
    }

    /// Removes this key and everything below it without leaving a tombstone.
    pub fn clear(&self) {
        self.store.borrow_mut().clear(self.path());
    }

    /// Clears the subtree and marks this key as nulled.
    pub fn erase(&self) {
        self.store.borrow_mut().erase(self.path());
    }

    #[must_use]
    pub fn is_nulled(&self) -> bool {
        self.store.borrow().nulled.contains(self.path())
    }

    /// `true` if neither this key nor anything below it holds a value.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        !self.store.borrow().has_value_at_or_below(self.path())
    }

    /// `true` if some key strictly below holds a value or is nulled.
    #[must_use]
    pub fn has_child(&self) -> bool {
        self.store.borrow().has_child(self.path())
    }

    /// `true` if nothing at all is stored below this key, tombstones included.
    pub(crate) fn is_leaf(&self) -> bool {
        !self.store.borrow().has_descendants(self.path())
    }

    /// `true` if this key or any key below it is nulled.
    pub(crate) fn contains_nulled(&self) -> bool {
        self.store.borrow().has_nulled_at_or_below(self.path())
    }

    /// First value at or below this key, with its path relative to it.
    pub(crate) fn first_value(&self) -> Option<(String, String)> {
        self.store.borrow().first_value(self.path())
    }

    /// Merges a decoded record into this key.
    ///
    /// A nulled `other` erases this subtree first. Array items enclosing this
    /// key keep their place in the order if `other` fills them again.
    /// Otherwise a nulled marker here is dropped as soon as `other` brings
    /// live content. The entry of `other` is then copied, and its children
    /// are merged recursively in order.
    pub fn append(&self, other: &Object) {
        let mut slots = Vec::new();
        if other.is_nulled() {
            slots = self.store.borrow().item_slots(self.path());
            self.erase();
        } else if self.is_nulled() && other.has_live_content() {
            self.store.borrow_mut().nulled.remove(self.path());
        }
        if let Some(entry) = other.entry() {
            self.assign(entry.as_deref());
        }
        for child in other.list_children() {
            let name = other.key.child_name(&child.key).to_string();
            self.at(&name).append(&child);
        }
        if !slots.is_empty() {
            self.store.borrow_mut().restore_slots(&slots);
        }
    }

    fn has_live_content(&self) -> bool {
        self.entry().is_some()
            || self
                .list_children()
                .iter()
                .any(|child| !child.is_nulled() && child.has_live_content())
    }

    /// View of `name` below this key. `name` may be a dotted path.
    #[must_use]
    pub fn at(&self, name: &str) -> Object {
        self.view(Key::append(&self.key, name))
    }

    #[must_use]
    pub fn parent(&self) -> Object {
        self.view(self.key.parent())
    }

    /// View of the logical root (the clip point, or the store root).
    #[must_use]
    pub fn root(&self) -> Object {
        self.view(self.key.root())
    }

    /// View rooted at this key: keys of descendants become relative to it.
    #[must_use]
    pub fn clip(&self) -> Object {
        self.view(self.key.clip())
    }

    /// Deep copy of this subtree into a new store, rooted at the copy's root.
    #[must_use]
    pub fn copy(&self) -> Object {
        let copy = Object::new();
        copy.append(self);
        copy
    }

    /// Array view over the items `key[id]` of this key.
    #[must_use]
    pub fn array(&self) -> Array {
        Array::new(self.clone())
    }

    /// Every stored key at or below this one, relative to it, in key order.
    /// This key itself appears as `""`.
    #[must_use]
    pub fn list_subkeys(&self) -> Vec<String> {
        let store = self.store.borrow();
        let path = self.path();
        store
            .subtree(path)
            .map(|(k, _)| key::child_name(path, k).to_string())
            .collect()
    }

    /// Direct children that hold a value and have nothing below them.
    #[must_use]
    pub fn list_values(&self) -> Vec<(String, String)> {
        let store = self.store.borrow();
        let path = self.path();
        store
            .children(path)
            .into_iter()
            .filter_map(|name| {
                let full = key::join(path, &name);
                if store.has_descendants(&full) {
                    return None;
                }
                match store.keys.get(&full) {
                    Some(Some(value)) => Some((name, value.clone())),
                    _ => None,
                }
            })
            .collect()
    }

    /// Direct children, in key order with array items in logical order.
    #[must_use]
    pub fn list_children(&self) -> Vec<Object> {
        let names = self.store.borrow().children(self.path());
        names.iter().map(|name| self.at(name)).collect()
    }

    /// Renders this subtree in the given row mode.
    #[must_use]
    pub fn encode(&self, row_mode: RowMode, raw: bool) -> String {
        let options = EncodeOptions::new().with_row_mode(row_mode).with_raw(raw);
        crate::ser::Encoder::new(options).encode(self)
    }

    fn snapshot(&self) -> Snapshot {
        let store = self.store.borrow();
        let path = self.path();
        let entries = store
            .subtree(path)
            .map(|(k, v)| (key::child_name(path, k).to_string(), v.clone()))
            .collect();
        let nulled = store
            .nulled
            .iter()
            .filter(|k| key::is_child_or_same(path, k))
            .map(|k| key::child_name(path, k).to_string())
            .collect();
        let records = store
            .records
            .iter()
            .filter(|(array, _)| path.is_empty() || key::is_child(path, array))
            .map(|(array, order)| {
                (
                    key::child_name(path, array).to_string(),
                    order.iter().map(str::to_string).collect(),
                )
            })
            .collect();
        Snapshot {
            entries,
            nulled,
            records,
        }
    }
}

impl PartialEq for Object {
    /// Compares the subtrees below both keys, relative to those keys.
    fn eq(&self, other: &Self) -> bool {
        self.snapshot() == other.snapshot()
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let snapshot = self.snapshot();
        f.debug_struct("Object")
            .field("key", &self.key.get())
            .field("entries", &snapshot.entries)
            .field("nulled", &snapshot.nulled)
            .field("records", &snapshot.records)
            .finish()
    }
}

impl Serialize for Object {
    /// Serializes as a flat map from relative key to value, `null` for
    /// tombstones.
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let entries = self.snapshot().entries;
        let mut map = serializer.serialize_map(Some(entries.len()))?;
        for (k, v) in &entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assign_and_value() {
        let obj = Object::new();
        obj.at("a.b").set("1");
        assert_eq!(obj.at("a.b").value().as_deref(), Some("1"));
        assert_eq!(obj.at("a").value(), None);
        assert_eq!(obj.at("a").entry(), None);

        obj.at("a.b").assign(None);
        assert_eq!(obj.at("a.b").value(), None);
        assert_eq!(obj.at("a.b").entry(), Some(None));
        assert!(!obj.at("a.b").is_nulled());
    }

    #[test]
    fn test_empty_string_is_a_value() {
        let obj = Object::new();
        obj.at("k").set("");
        assert_eq!(obj.at("k").value().as_deref(), Some(""));
        assert!(!obj.at("k").is_empty());
    }

    #[test]
    fn test_clear_removes_subtree_only() {
        let obj = Object::new();
        obj.at("a.x").set("1");
        obj.at("a.y.z").set("2");
        obj.at("ab").set("3");
        obj.at("a").clear();
        assert!(obj.at("a").is_empty());
        assert!(!obj.at("a").is_nulled());
        assert_eq!(obj.at("ab").value().as_deref(), Some("3"));
        assert_eq!(obj.list_subkeys(), vec!["ab".to_string()]);
    }

    #[test]
    fn test_erase_marks_nulled() {
        let obj = Object::new();
        obj.at("a.x").set("1");
        obj.at("a").erase();
        assert!(obj.at("a").is_nulled());
        assert!(obj.at("a").is_empty());
        assert!(!obj.at("a").has_child());
        assert_eq!(obj.at("a").entry(), Some(None));
        assert!(obj.has_child());

        obj.at("a.x").set("2");
        assert!(obj.at("a").is_nulled());
        assert!(obj.at("a").has_child());
    }

    #[test]
    fn test_has_child_counts_nulled_descendants() {
        let obj = Object::new();
        obj.at("a.b").erase();
        assert!(obj.at("a").has_child());
        assert!(obj.at("a").is_empty());
    }

    #[test]
    fn test_list_children_skips_subtrees() {
        let obj = Object::new();
        obj.at("a.x").set("1");
        obj.at("a.y").set("2");
        obj.at("a!").set("3");
        obj.at("a").set("4");
        obj.at("b").set("5");
        let names: Vec<String> = obj
            .list_children()
            .iter()
            .map(|c| c.key().get().to_string())
            .collect();
        assert_eq!(names, vec!["a", "a!", "b"]);
    }

    #[test]
    fn test_list_values_only_leaves() {
        let obj = Object::new();
        obj.at("r.leaf").set("1");
        obj.at("r.node").set("2");
        obj.at("r.node.deep").set("3");
        obj.at("r.gone").assign(None);
        let values = obj.at("r").list_values();
        assert_eq!(values, vec![("leaf".to_string(), "1".to_string())]);
    }

    #[test]
    fn test_array_items_iterate_in_insertion_order() {
        let obj = Object::new();
        obj.at("list[10]").set("a");
        obj.at("list[2]").set("b");
        obj.at("list[1]").set("c");
        let names: Vec<String> = obj
            .list_children()
            .iter()
            .map(|c| c.key().get().to_string())
            .collect();
        assert_eq!(names, vec!["list[10]", "list[2]", "list[1]"]);
    }

    #[test]
    fn test_records_follow_values() {
        let obj = Object::new();
        obj.at("list[a].x").set("1");
        obj.at("list[a].y").set("2");
        obj.with_detail(|d| assert_eq!(d.records("list").map(ItemOrder::len), Some(1)));
        obj.at("list[a].x").clear();
        obj.with_detail(|d| assert!(d.records("list").is_some()));
        obj.at("list[a].y").assign(None);
        obj.with_detail(|d| assert!(d.records("list").is_none()));
    }

    #[test]
    fn test_clip_makes_keys_relative() {
        let obj = Object::new();
        let customer = obj.at("customer[0]").clip();
        customer.at("name").set("Tom");
        assert_eq!(customer.at("name").key().get(), "name");
        assert_eq!(customer.at("name").key().path(), "customer[0].name");
        assert_eq!(obj.at("customer[0].name").value().as_deref(), Some("Tom"));
        assert_eq!(customer.at("name").root().key(), customer.key());
        assert_eq!(customer.at("name").parent().key(), customer.key());
    }

    #[test]
    fn test_copy_is_independent() {
        let obj = Object::new();
        obj.at("a.x").set("1");
        obj.at("a.list[q]").set("2");
        let copy = obj.at("a").copy();
        assert!(!copy.shares_store(&obj));
        assert_eq!(copy.at("x").value().as_deref(), Some("1"));
        assert_eq!(copy, obj.at("a"));
        copy.at("x").set("9");
        assert_eq!(obj.at("a.x").value().as_deref(), Some("1"));
    }

    #[test]
    fn test_append_merges_in_order() {
        let acc = Object::new();
        let first = Object::new();
        first.at("a.x").set("1");
        first.at("a.y").set("2");
        let second = Object::new();
        second.at("a.y").set("3");
        second.at("a.z").set("4");
        acc.append(&first);
        acc.append(&second);
        assert_eq!(acc.at("a.x").value().as_deref(), Some("1"));
        assert_eq!(acc.at("a.y").value().as_deref(), Some("3"));
        assert_eq!(acc.at("a.z").value().as_deref(), Some("4"));
    }

    #[test]
    fn test_append_nulled_then_child_unnulls() {
        let acc = Object::new();
        acc.at("k.old").set("1");
        let erase = Object::new();
        erase.at("k").erase();
        let update = Object::new();
        update.at("k.child").set("v");

        acc.append(&erase);
        assert!(acc.at("k").is_nulled());
        acc.append(&update);
        assert!(!acc.at("k").is_nulled());
        assert_eq!(acc.at("k.child").value().as_deref(), Some("v"));
        assert_eq!(acc.at("k.old").value(), None);
    }

    #[test]
    fn test_append_nested_nulled_keeps_parent_nulled() {
        let acc = Object::new();
        let first = Object::new();
        first.at("n").erase();
        first.at("n.x").set("1");
        let second = Object::new();
        second.at("n.d").erase();
        second.at("n.d.y").set("2");
        acc.append(&first);
        acc.append(&second);
        assert!(acc.at("n").is_nulled());
        assert!(acc.at("n.d").is_nulled());
        assert_eq!(acc.at("n.x").value().as_deref(), Some("1"));
    }

    #[test]
    fn test_equality_is_relative() {
        let left = Object::new();
        left.at("p.a").set("1");
        let right = Object::new();
        right.at("q.a").set("1");
        assert_eq!(left.at("p"), right.at("q"));
        assert_ne!(left, right);
    }

    #[test]
    fn test_serialize_flat_map() {
        let obj = Object::new();
        obj.at("a.b").set("1");
        obj.at("c").assign(None);
        let json = serde_json::to_value(&obj).unwrap();
        assert_eq!(json, serde_json::json!({ "a.b": "1", "c": null }));
    }
}
