//! Array views.
//!
//! An array is not a separate data type: the items of the array at `list` are
//! the keys `list[id]`, and the store tracks their order. [`Array`] wraps an
//! [`Object`] view and gives positional access to those items.
//!
//! ```rust
//! use serde_bit::Object;
//!
//! let obj = Object::new();
//! let tags = obj.at("tags").array();
//! tags.append().set("red");
//! tags.append().set("green");
//! tags.append_with_id("x").set("blue");
//!
//! assert_eq!(tags.size(), 3);
//! assert_eq!(tags.item_ids(), vec!["0", "1", "x"]);
//! assert_eq!(obj.at("tags[1]").value().as_deref(), Some("green"));
//! ```

use crate::key::{self, Key};
use crate::{Error, Object, Result};

/// Ordered view over the items of one array key.
#[derive(Clone, Debug)]
pub struct Array {
    object: Object,
}

impl Array {
    pub(crate) fn new(object: Object) -> Self {
        Array { object }
    }

    /// The key whose items this view addresses.
    #[must_use]
    pub fn object(&self) -> &Object {
        &self.object
    }

    fn path(&self) -> &str {
        self.object.key().path()
    }

    /// Number of items that currently hold a value.
    #[must_use]
    pub fn size(&self) -> usize {
        self.object
            .with_detail(|d| d.records(self.path()).map_or(0, |order| order.len()))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Item ids in logical order.
    #[must_use]
    pub fn item_ids(&self) -> Vec<String> {
        self.object.with_detail(|d| {
            d.records(self.path())
                .map(|order| order.iter().map(str::to_string).collect())
                .unwrap_or_default()
        })
    }

    /// Item views in logical order.
    #[must_use]
    pub fn items(&self) -> Vec<Object> {
        self.item_ids().iter().map(|id| self.at(id)).collect()
    }

    /// View of item `item_id`, whether or not it exists.
    #[must_use]
    pub fn at(&self, item_id: &str) -> Object {
        self.object.view(Key::item(self.object.key(), item_id))
    }

    /// View of the item at `index` in logical order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfRange`] if `index >= size()`.
    pub fn at_index(&self, index: usize) -> Result<Object> {
        let id = self
            .object
            .with_detail(|d| {
                d.records(self.path())
                    .and_then(|order| order.get(index))
                    .map(str::to_string)
            })
            .ok_or_else(|| Error::out_of_range(index, self.size()))?;
        Ok(self.at(&id))
    }

    fn next_id(&self) -> String {
        let mut n = self.size();
        loop {
            let id = n.to_string();
            let taken = self.object.with_detail(|d| {
                d.records(self.path()).is_some_and(|order| order.contains(&id))
                    || d.item_in_use(&key::item(self.path(), &id))
            });
            if !taken {
                return id;
            }
            n += 1;
        }
    }

    /// View of a new item after the last one, with a numeric id.
    ///
    /// The item joins the order when something is stored in it.
    #[must_use]
    pub fn append(&self) -> Object {
        let id = self.next_id();
        self.at(&id)
    }

    /// View of a new item with the given id.
    #[must_use]
    pub fn append_with_id(&self, item_id: &str) -> Object {
        self.at(item_id)
    }

    /// Returns the view of an item that will sit at `index`.
    ///
    /// The slot is taken when the item first receives a value; until then the
    /// array is unchanged. An item that already exists is moved to `index`.
    /// Without `item_id`, a numeric id is derived as for [`append`](Self::append).
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfRange`] if `index > size()`.
    pub fn insert_at(&self, index: usize, item_id: Option<&str>) -> Result<Object> {
        let size = self.size();
        if index > size {
            return Err(Error::out_of_range(index, size));
        }
        let id = match item_id {
            Some(id) => id.to_string(),
            None => self.next_id(),
        };
        let item = self.at(&id);
        self.object
            .with_detail_mut(|d| d.reserve_item(item.key().path(), index));
        Ok(item)
    }

    /// Removes item `item_id` and everything below it, leaving a tombstone.
    pub fn erase(&self, item_id: &str) {
        let item = self.at(item_id);
        item.clear();
        item.assign(None);
    }

    /// Removes the item at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfRange`] if `index >= size()`.
    pub fn erase_at(&self, index: usize) -> Result<()> {
        let item = self.at_index(index)?;
        item.clear();
        item.assign(None);
        Ok(())
    }
}
