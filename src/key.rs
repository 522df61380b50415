//! Hierarchical key addressing.
//!
//! A key is a dot-separated path such as `customer[0].address.city`. A segment
//! may end in a bracketed item id (`customer[0]`), which addresses one item of
//! the array `customer`. Dots inside brackets never split a path, so
//! `hosts[db.local].port` has the segments `hosts[db.local]` and `port`.
//!
//! The free functions in this module work on full path strings. [`Key`] adds an
//! `origin`, which lets a subtree act as its own root without copying the path:
//! the logical key returned by [`Key::get`] starts after the `.` at `origin`.
//!
//! ```rust
//! use serde_bit::key;
//!
//! assert_eq!(key::name("customer[0].address.city"), "city");
//! assert_eq!(key::parent("customer[0].address.city"), "customer[0].address");
//! assert_eq!(key::array_name("customer[0]"), "customer");
//! assert_eq!(key::array_item_id("customer[0]"), "0");
//! ```

/// Finds the last `.` outside of brackets.
fn last_delimiter(path: &str) -> Option<usize> {
    let mut depth = 0usize;
    for (i, b) in path.bytes().enumerate().rev() {
        match b {
            b']' => depth += 1,
            b'[' => depth = depth.saturating_sub(1),
            b'.' if depth == 0 => return Some(i),
            _ => {}
        }
    }
    None
}

/// Finds the first `.` outside of brackets.
fn first_delimiter(path: &str) -> Option<usize> {
    let mut depth = 0usize;
    for (i, b) in path.bytes().enumerate() {
        match b {
            b'[' => depth += 1,
            b']' => depth = depth.saturating_sub(1),
            b'.' if depth == 0 => return Some(i),
            _ => {}
        }
    }
    None
}

/// Position of the `[` opening the trailing item id.
fn item_bracket(path: &str) -> Option<usize> {
    if !path.ends_with(']') {
        return None;
    }
    let mut depth = 0usize;
    for (i, b) in path.bytes().enumerate().rev() {
        match b {
            b']' => depth += 1,
            b'[' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            b'.' if depth == 0 => return None,
            _ => {}
        }
    }
    None
}

/// Last segment of `path`.
#[must_use]
pub fn name(path: &str) -> &str {
    match last_delimiter(path) {
        Some(i) => &path[i + 1..],
        None => path,
    }
}

/// Everything before the last segment, or `""` for a top-level key.
#[must_use]
pub fn parent(path: &str) -> &str {
    match last_delimiter(path) {
        Some(i) => &path[..i],
        None => "",
    }
}

/// First segment of `path`, keeping a bracketed item id as part of it.
#[must_use]
pub fn first_segment(path: &str) -> &str {
    match first_delimiter(path) {
        Some(i) => &path[..i],
        None => path,
    }
}

#[must_use]
pub fn is_array_item(path: &str) -> bool {
    item_bracket(path).is_some()
}

/// The array an item belongs to: `a.b[3]` → `a.b`. Empty for non-items.
#[must_use]
pub fn array_name(path: &str) -> &str {
    match item_bracket(path) {
        Some(i) => &path[..i],
        None => "",
    }
}

/// The id inside the trailing brackets: `a.b[3]` → `3`. Empty for non-items.
#[must_use]
pub fn array_item_id(path: &str) -> &str {
    match item_bracket(path) {
        Some(i) => &path[i + 1..path.len() - 1],
        None => "",
    }
}

/// `true` if `child` equals `parent` or lies below it. Every path lies below
/// the root (`""`).
#[must_use]
pub fn is_child_or_same(parent: &str, child: &str) -> bool {
    if parent.is_empty() {
        return true;
    }
    child.starts_with(parent)
        && (child.len() == parent.len() || child.as_bytes()[parent.len()] == b'.')
}

/// `true` if `child` lies strictly below `parent`.
#[must_use]
pub fn is_child(parent: &str, child: &str) -> bool {
    child.len() > parent.len() && is_child_or_same(parent, child)
}

/// `child` relative to `parent`, without the separating `.`.
///
/// Callers must make sure `parent` is child-or-same of `child`.
#[must_use]
pub fn child_name<'a>(parent: &str, child: &'a str) -> &'a str {
    if parent.is_empty() {
        child
    } else {
        child.get(parent.len() + 1..).unwrap_or("")
    }
}

/// Joins two paths with a `.`, skipping empty sides.
#[must_use]
pub fn join(parent: &str, child: &str) -> String {
    if child.is_empty() {
        parent.to_string()
    } else if parent.is_empty() {
        child.to_string()
    } else {
        let mut path = String::with_capacity(parent.len() + child.len() + 1);
        path.push_str(parent);
        path.push('.');
        path.push_str(child);
        path
    }
}

/// Path of item `id` in the array at `array`.
#[must_use]
pub fn item(array: &str, id: &str) -> String {
    format!("{array}[{id}]")
}

/// A path plus the origin of its logical view.
///
/// `origin` is `0` for an unclipped key. After [`Key::clip`] it points at the
/// end of the clipped path, so every key derived from the clip has a `.` at
/// `origin` and [`Key::get`] yields the part after it.
///
/// ```rust
/// use serde_bit::Key;
///
/// let clip = Key::new("customer[0]").clip();
/// let city = Key::append(&clip, "address.city");
/// assert_eq!(city.path(), "customer[0].address.city");
/// assert_eq!(city.get(), "address.city");
/// assert_eq!(city.parent().get(), "address");
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Key {
    path: String,
    origin: usize,
}

impl Key {
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        Key {
            path: path.into(),
            origin: 0,
        }
    }

    /// The absolute path, ignoring the origin.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    #[must_use]
    pub fn origin(&self) -> usize {
        self.origin
    }

    /// The logical key, relative to the origin.
    #[must_use]
    pub fn get(&self) -> &str {
        let start = if self.origin > 0 { self.origin + 1 } else { 0 };
        self.path.get(start..).unwrap_or("")
    }

    /// `true` at the logical root (the store root or the clip point).
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.get().is_empty()
    }

    #[must_use]
    pub fn name(&self) -> &str {
        name(self.get())
    }

    /// The parent key. The logical root is its own parent.
    #[must_use]
    pub fn parent(&self) -> Key {
        let relative = self.get();
        if relative.is_empty() {
            return self.clone();
        }
        let up = parent(relative);
        if up.is_empty() {
            return self.root();
        }
        let start = self.path.len() - relative.len();
        Key {
            path: self.path[..start + up.len()].to_string(),
            origin: self.origin,
        }
    }

    /// The logical root this key is relative to.
    #[must_use]
    pub fn root(&self) -> Key {
        Key {
            path: self.path[..self.origin].to_string(),
            origin: self.origin,
        }
    }

    /// Makes this key the logical root of the keys derived from it.
    #[must_use]
    pub fn clip(&self) -> Key {
        Key {
            path: self.path.clone(),
            origin: self.path.len(),
        }
    }

    #[must_use]
    pub fn is_array_item(&self) -> bool {
        is_array_item(self.get())
    }

    #[must_use]
    pub fn array_name(&self) -> &str {
        array_name(self.get())
    }

    #[must_use]
    pub fn array_item_id(&self) -> &str {
        array_item_id(self.get())
    }

    #[must_use]
    pub fn is_child_or_same(&self, other: &Key) -> bool {
        is_child_or_same(&self.path, &other.path)
    }

    #[must_use]
    pub fn is_child(&self, other: &Key) -> bool {
        is_child(&self.path, &other.path)
    }

    /// `other` relative to this key.
    #[must_use]
    pub fn child_name<'a>(&self, other: &'a Key) -> &'a str {
        child_name(&self.path, &other.path)
    }

    /// `parent.child`, keeping the parent's origin.
    #[must_use]
    pub fn append(parent: &Key, child: &str) -> Key {
        if child.is_empty() {
            return parent.clone();
        }
        if parent.path.is_empty() {
            return Key::new(child);
        }
        Key {
            path: join(&parent.path, child),
            origin: parent.origin,
        }
    }

    /// Item `id` of the array at `parent`, keeping the parent's origin.
    ///
    /// Items sit beside their array key, not below it. For an array at a
    /// clip point the origin moves back to the `.` before the array name, so
    /// the item is addressed as `name[id]`.
    #[must_use]
    pub fn item(parent: &Key, id: &str) -> Key {
        let origin = if parent.origin > 0 && parent.is_root() {
            let start = parent.path.len() - name(&parent.path).len();
            start.saturating_sub(1)
        } else {
            parent.origin
        };
        Key {
            path: item(&parent.path, id),
            origin,
        }
    }
}

impl std::fmt::Display for Key {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.get())
    }
}
