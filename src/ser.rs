//! Encoding.
//!
//! This module renders an [`Object`] back into bit text with the [`Encoder`],
//! and fills an [`Object`] from any `Serialize` type with the
//! [`ObjectSerializer`].
//!
//! ## Row modes
//!
//! The [`RowMode`] decides how a subtree is split into lines:
//!
//! - **Object** (default): the whole subtree on one line
//! - **Child**: the object's own values on one line, then one line per child
//!   subtree
//! - **Leaf**: one line per node that holds values directly
//! - **Value**: one `path='value'` line per stored value
//!
//! A nulled key always starts a line of its own (`key :: ...`, or `key : null`
//! when nothing was stored under it afterwards), so every mode decodes back to
//! the same store.
//!
//! ## Usage
//!
//! ```rust
//! use serde_bit::{EncodeOptions, Encoder, Object, RowMode};
//!
//! let obj = Object::new();
//! obj.at("a.x").set("1");
//! obj.at("a.c.d").set("2");
//!
//! let leaf = Encoder::new(EncodeOptions::new().with_row_mode(RowMode::Leaf));
//! assert_eq!(leaf.encode(&obj.at("a")), "x='1'\nc : d='2'\n");
//!
//! let object = Encoder::new(EncodeOptions::new());
//! assert_eq!(object.encode(&obj), "a.c.d='2' a.x='1'\n");
//! ```

use crate::buffer::WriteBuffer;
use crate::key::{self, Key};
use crate::options::{EncodeOptions, RowMode};
use crate::{Error, Object, Result};
use serde::{ser, Serialize};
use std::collections::HashSet;
use std::fmt::Write as _;
use tracing::trace;

/// One `name=value` assignment, `name` relative to its row's record.
#[derive(Debug)]
struct Entry {
    name: String,
    value: Option<String>,
}

/// One encoded line.
#[derive(Debug)]
struct Row {
    record: String,
    nulled: bool,
    entries: Vec<Entry>,
}

impl Row {
    fn new(record: String, nulled: bool) -> Self {
        Row {
            record,
            nulled,
            entries: Vec::new(),
        }
    }
}

/// The entry stored at `o`, minus the tombstone every erase leaves behind.
fn own_entry(o: &Object) -> Option<Option<String>> {
    match o.entry() {
        Some(None) if o.is_nulled() => None,
        entry => entry,
    }
}

fn array_of(name: &str) -> Option<&str> {
    key::is_array_item(name).then(|| key::array_name(name))
}

/// Renders objects as bit text.
#[derive(Debug, Clone, Default)]
pub struct Encoder {
    options: EncodeOptions,
}

impl Encoder {
    #[must_use]
    pub fn new(options: EncodeOptions) -> Self {
        Encoder { options }
    }

    #[must_use]
    pub fn options(&self) -> &EncodeOptions {
        &self.options
    }

    /// Encodes the subtree at `obj`; keys are written relative to it.
    #[must_use]
    pub fn encode(&self, obj: &Object) -> String {
        self.lines(obj).concat()
    }

    /// Encodes the subtree at `obj` into `out`.
    pub fn encode_into<W>(&self, obj: &Object, out: &mut W)
    where
        W: WriteBuffer + ?Sized,
    {
        for line in self.lines(obj) {
            out.write_bytes(line.as_bytes());
        }
    }

    /// The encoded lines, each terminated by `\n`.
    #[must_use]
    pub fn lines(&self, obj: &Object) -> Vec<String> {
        let base = obj.key().clone();
        let mut rows = Vec::new();
        self.node_rows(&base, obj, &mut rows);
        let lines: Vec<String> = rows
            .iter()
            .filter(|row| row.nulled || !row.entries.is_empty())
            .map(|row| self.render(row))
            .collect();
        trace!(
            mode = self.options.row_mode.as_str(),
            lines = lines.len(),
            "encoded object"
        );
        lines
    }

    fn node_rows(&self, base: &Key, o: &Object, rows: &mut Vec<Row>) {
        if o.is_nulled() {
            return self.object_rows(base, o, rows);
        }
        match self.options.row_mode {
            RowMode::Object => self.object_rows(base, o, rows),
            RowMode::Child => self.split_rows(base, o, rows, false),
            RowMode::Leaf => self.split_rows(base, o, rows, true),
            RowMode::Value => self.value_rows(base, o, rows),
        }
    }

    /// The whole subtree on one row; nulled descendants, and array items
    /// that follow one, get rows of their own.
    fn object_rows(&self, base: &Key, o: &Object, rows: &mut Vec<Row>) {
        let nulled = o.is_nulled();
        let mut row = Row::new(base.child_name(o.key()).to_string(), nulled);
        let mut later = Vec::new();
        collect(o, "", !nulled, &mut row.entries, &mut later);
        rows.push(row);
        for child in &later {
            self.object_rows(base, child, rows);
        }
    }

    /// A row with the node's own and leaf values, then one or more rows per
    /// remaining child.
    fn split_rows(&self, base: &Key, o: &Object, rows: &mut Vec<Row>, recurse: bool) {
        let mut row = Row::new(base.child_name(o.key()).to_string(), false);
        if let Some(value) = own_entry(o) {
            row.entries.push(Entry {
                name: String::new(),
                value,
            });
        }
        let mut broken = HashSet::new();
        let mut later = Vec::new();
        for child in o.list_children() {
            let name = o.key().child_name(child.key()).to_string();
            let array = array_of(&name).map(str::to_string);
            let inline = child.is_leaf()
                && !child.is_nulled()
                && array.as_ref().map_or(true, |a| !broken.contains(a));
            match child.entry() {
                Some(value) if inline => row.entries.push(Entry { name, value }),
                _ => {
                    if let Some(array) = array {
                        broken.insert(array);
                    }
                    later.push(child);
                }
            }
        }
        rows.push(row);
        for child in &later {
            if recurse {
                self.node_rows(base, child, rows);
            } else {
                self.object_rows(base, child, rows);
            }
        }
    }

    fn value_rows(&self, base: &Key, o: &Object, rows: &mut Vec<Row>) {
        if o.is_nulled() {
            return self.object_rows(base, o, rows);
        }
        if let Some(value) = own_entry(o) {
            let mut row = Row::new(String::new(), false);
            row.entries.push(Entry {
                name: base.child_name(o.key()).to_string(),
                value,
            });
            rows.push(row);
        }
        for child in o.list_children() {
            self.value_rows(base, &child, rows);
        }
    }

    fn render(&self, row: &Row) -> String {
        let mut line = String::new();
        match (row.record.is_empty(), row.nulled, row.entries.is_empty()) {
            (true, true, true) => line.push_str("null"),
            (false, true, true) => {
                let _ = write!(line, "{} : null", row.record);
            }
            (true, true, false) => line.push_str(":: "),
            (false, true, false) => {
                let _ = write!(line, "{} :: ", row.record);
            }
            (true, false, _) => {}
            (false, false, _) => {
                let _ = write!(line, "{} : ", row.record);
            }
        }
        for (i, entry) in row.entries.iter().enumerate() {
            if i > 0 {
                line.push(' ');
            }
            self.render_entry(entry, &mut line);
        }
        line.push('\n');
        line
    }

    fn render_entry(&self, entry: &Entry, line: &mut String) {
        line.push_str(&entry.name);
        let value = match &entry.value {
            Some(value) => value,
            None => {
                line.push_str("=null");
                return;
            }
        };
        if self.length_prefixed(value) {
            let _ = write!(line, "({})='{}'", value.len(), value);
            return;
        }
        line.push_str("='");
        if self.options.raw {
            line.push_str(value);
        } else {
            escape_into(value, line);
        }
        line.push('\'');
    }

    fn length_prefixed(&self, value: &str) -> bool {
        let long = value.len() > self.options.long_value_threshold;
        if self.options.raw {
            long || value.contains(['\'', '\\', '\n'])
        } else {
            (long || value.contains('\''))
                && !value.contains(['\n', '\r', '\t', '\0'])
        }
    }
}

/// Adds the entries of `o` and its descendants in pre-order.
///
/// Nulled descendants go to `later`. With `keep_order`, an array item that
/// has a nulled node inside goes to `later` too, followed by every item after
/// it, so items are replayed in their logical order. Under a nulled record
/// items cannot leave the row without reviving the record; an item whose
/// values all sit in `later` rows is pinned to its place by repeating its
/// first value, and the later rows keep that place on replay.
fn collect(
    o: &Object,
    rel: &str,
    keep_order: bool,
    entries: &mut Vec<Entry>,
    later: &mut Vec<Object>,
) {
    if let Some(value) = own_entry(o) {
        entries.push(Entry {
            name: rel.to_string(),
            value,
        });
    }
    let mut broken: HashSet<String> = HashSet::new();
    for child in o.list_children() {
        let name = o.key().child_name(child.key()).to_string();
        let path = key::join(rel, &name);
        let array = array_of(&name).map(str::to_string);
        if keep_order {
            let deferred = child.is_nulled()
                || array
                    .as_ref()
                    .is_some_and(|a| broken.contains(a) || child.contains_nulled());
            if deferred {
                if let Some(array) = array {
                    broken.insert(array);
                }
                later.push(child);
            } else {
                collect(&child, &path, true, entries, later);
            }
            continue;
        }
        let start = entries.len();
        if child.is_nulled() {
            later.push(child.clone());
        } else {
            collect(&child, &path, false, entries, later);
        }
        let placed = entries[start..].iter().any(|e| e.value.is_some());
        if array.is_some() && !placed {
            if let Some((sub, value)) = child.first_value() {
                entries.push(Entry {
                    name: key::join(&path, &sub),
                    value: Some(value),
                });
            }
        }
    }
}

fn escape_into(value: &str, out: &mut String) {
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\0' => out.push_str("\\0"),
            c => out.push(c),
        }
    }
}

/// Serializes Rust values into an [`Object`].
///
/// Structs and maps become dotted keys, sequences become array items with
/// numeric ids, scalars are stored in their display form, and `None` or `()`
/// becomes a tombstone. Map keys must serialize to scalars and are used as
/// path segments verbatim.
///
/// ```rust
/// use serde::Serialize;
/// use serde_bit::{Object, ObjectSerializer};
///
/// #[derive(Serialize)]
/// struct Host { name: String, ports: Vec<u16> }
///
/// let obj = Object::new();
/// let host = Host { name: "db".into(), ports: vec![5432, 6432] };
/// host.serialize(ObjectSerializer::new(obj.at("host"))).unwrap();
///
/// assert_eq!(obj.at("host.name").value().as_deref(), Some("db"));
/// assert_eq!(obj.at("host.ports").array().size(), 2);
/// assert_eq!(obj.at("host.ports[1]").value().as_deref(), Some("6432"));
/// ```
pub struct ObjectSerializer {
    target: Object,
}

impl ObjectSerializer {
    #[must_use]
    pub fn new(target: Object) -> Self {
        ObjectSerializer { target }
    }

    fn scalar<T: ToString>(self, v: T) -> Result<()> {
        self.target.set(v.to_string());
        Ok(())
    }

    fn tombstone(self) -> Result<()> {
        self.target.assign(None);
        Ok(())
    }
}

/// Renders a map key through a scratch store.
fn map_key<T>(key: &T) -> Result<String>
where
    T: ?Sized + Serialize,
{
    let scratch = Object::new();
    key.serialize(ObjectSerializer::new(scratch.clone()))?;
    match scratch.value() {
        Some(name) if !scratch.has_child() => Ok(name),
        _ => Err(Error::custom("map keys must serialize to scalars")),
    }
}

impl ser::Serializer for ObjectSerializer {
    type Ok = ();
    type Error = Error;

    type SerializeSeq = SerializeItems;
    type SerializeTuple = SerializeItems;
    type SerializeTupleStruct = SerializeItems;
    type SerializeTupleVariant = SerializeItems;
    type SerializeMap = SerializeEntries;
    type SerializeStruct = SerializeEntries;
    type SerializeStructVariant = SerializeEntries;

    fn serialize_bool(self, v: bool) -> Result<()> {
        self.scalar(v)
    }

    fn serialize_i8(self, v: i8) -> Result<()> {
        self.scalar(v)
    }

    fn serialize_i16(self, v: i16) -> Result<()> {
        self.scalar(v)
    }

    fn serialize_i32(self, v: i32) -> Result<()> {
        self.scalar(v)
    }

    fn serialize_i64(self, v: i64) -> Result<()> {
        self.scalar(v)
    }

    fn serialize_u8(self, v: u8) -> Result<()> {
        self.scalar(v)
    }

    fn serialize_u16(self, v: u16) -> Result<()> {
        self.scalar(v)
    }

    fn serialize_u32(self, v: u32) -> Result<()> {
        self.scalar(v)
    }

    fn serialize_u64(self, v: u64) -> Result<()> {
        self.scalar(v)
    }

    fn serialize_f32(self, v: f32) -> Result<()> {
        self.scalar(v)
    }

    fn serialize_f64(self, v: f64) -> Result<()> {
        self.scalar(v)
    }

    fn serialize_char(self, v: char) -> Result<()> {
        self.scalar(v)
    }

    fn serialize_str(self, v: &str) -> Result<()> {
        self.scalar(v)
    }

    fn serialize_bytes(self, v: &[u8]) -> Result<()> {
        let array = self.target.array();
        for (i, b) in v.iter().enumerate() {
            array.at(&i.to_string()).set(b.to_string());
        }
        Ok(())
    }

    fn serialize_none(self) -> Result<()> {
        self.tombstone()
    }

    fn serialize_some<T>(self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<()> {
        self.tombstone()
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<()> {
        self.tombstone()
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<()> {
        self.scalar(variant)
    }

    fn serialize_newtype_struct<T>(self, _name: &'static str, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T>(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        value: &T,
    ) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(ObjectSerializer::new(self.target.at(variant)))
    }

    fn serialize_seq(self, _len: Option<usize>) -> Result<SerializeItems> {
        Ok(SerializeItems::new(self.target))
    }

    fn serialize_tuple(self, _len: usize) -> Result<SerializeItems> {
        Ok(SerializeItems::new(self.target))
    }

    fn serialize_tuple_struct(self, _name: &'static str, _len: usize) -> Result<SerializeItems> {
        Ok(SerializeItems::new(self.target))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        _len: usize,
    ) -> Result<SerializeItems> {
        Ok(SerializeItems::new(self.target.at(variant)))
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<SerializeEntries> {
        Ok(SerializeEntries::new(self.target))
    }

    fn serialize_struct(self, _name: &'static str, _len: usize) -> Result<SerializeEntries> {
        Ok(SerializeEntries::new(self.target))
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        _len: usize,
    ) -> Result<SerializeEntries> {
        Ok(SerializeEntries::new(self.target.at(variant)))
    }
}

/// Writes sequence elements as items `0`, `1`, ... of an array.
pub struct SerializeItems {
    target: Object,
    next: usize,
}

impl SerializeItems {
    fn new(target: Object) -> Self {
        SerializeItems { target, next: 0 }
    }

    fn push<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        let item = self.target.array().at(&self.next.to_string());
        self.next += 1;
        value.serialize(ObjectSerializer::new(item))
    }
}

impl ser::SerializeSeq for SerializeItems {
    type Ok = ();
    type Error = Error;

    fn serialize_element<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.push(value)
    }

    fn end(self) -> Result<()> {
        Ok(())
    }
}

impl ser::SerializeTuple for SerializeItems {
    type Ok = ();
    type Error = Error;

    fn serialize_element<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.push(value)
    }

    fn end(self) -> Result<()> {
        Ok(())
    }
}

impl ser::SerializeTupleStruct for SerializeItems {
    type Ok = ();
    type Error = Error;

    fn serialize_field<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.push(value)
    }

    fn end(self) -> Result<()> {
        Ok(())
    }
}

impl ser::SerializeTupleVariant for SerializeItems {
    type Ok = ();
    type Error = Error;

    fn serialize_field<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.push(value)
    }

    fn end(self) -> Result<()> {
        Ok(())
    }
}

/// Writes struct fields and map entries as child keys.
pub struct SerializeEntries {
    target: Object,
    current_key: Option<String>,
}

impl SerializeEntries {
    fn new(target: Object) -> Self {
        SerializeEntries {
            target,
            current_key: None,
        }
    }
}

impl ser::SerializeMap for SerializeEntries {
    type Ok = ();
    type Error = Error;

    fn serialize_key<T>(&mut self, key: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.current_key = Some(map_key(key)?);
        Ok(())
    }

    fn serialize_value<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        let key = self
            .current_key
            .take()
            .ok_or_else(|| Error::custom("map value without a key"))?;
        value.serialize(ObjectSerializer::new(self.target.at(&key)))
    }

    fn end(self) -> Result<()> {
        Ok(())
    }
}

impl ser::SerializeStruct for SerializeEntries {
    type Ok = ();
    type Error = Error;

    fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(ObjectSerializer::new(self.target.at(key)))
    }

    fn end(self) -> Result<()> {
        Ok(())
    }
}

impl ser::SerializeStructVariant for SerializeEntries {
    type Ok = ();
    type Error = Error;

    fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(ObjectSerializer::new(self.target.at(key)))
    }

    fn end(self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;
    use std::collections::BTreeMap;

    fn encoder(mode: RowMode) -> Encoder {
        Encoder::new(EncodeOptions::new().with_row_mode(mode))
    }

    fn sample() -> Object {
        let obj = Object::new();
        obj.at("a.x").set("1");
        obj.at("a.c.d").set("2");
        obj.at("b").set("3");
        obj
    }

    #[test]
    fn test_object_mode() {
        assert_eq!(
            encoder(RowMode::Object).encode(&sample()),
            "a.c.d='2' a.x='1' b='3'\n"
        );
    }

    #[test]
    fn test_child_mode() {
        assert_eq!(
            encoder(RowMode::Child).encode(&sample()),
            "b='3'\na : c.d='2' x='1'\n"
        );
    }

    #[test]
    fn test_leaf_mode() {
        assert_eq!(
            encoder(RowMode::Leaf).encode(&sample()),
            "b='3'\na : x='1'\na.c : d='2'\n"
        );
    }

    #[test]
    fn test_value_mode() {
        assert_eq!(
            encoder(RowMode::Value).encode(&sample()),
            "a.c.d='2'\na.x='1'\nb='3'\n"
        );
    }

    #[test]
    fn test_nulled_rows() {
        let obj = Object::new();
        obj.at("gone").erase();
        obj.at("again").erase();
        obj.at("again.x").set("1");
        obj.at("keep").set("2");
        assert_eq!(
            encoder(RowMode::Object).encode(&obj),
            "keep='2'\nagain :: x='1'\ngone : null\n"
        );

        let root = Object::new();
        root.erase();
        assert_eq!(encoder(RowMode::Value).encode(&root), "null\n");
        root.at("x").set("1");
        assert_eq!(encoder(RowMode::Leaf).encode(&root), ":: x='1'\n");
    }

    #[test]
    fn test_tombstones_and_own_values() {
        let obj = Object::new();
        obj.at("r").set("own");
        obj.at("r.x").assign(None);
        assert_eq!(encoder(RowMode::Leaf).encode(&obj), "r : ='own' x=null\n");
        assert_eq!(encoder(RowMode::Value).encode(&obj), "r='own'\nr.x=null\n");
    }

    #[test]
    fn test_escaped_values() {
        let obj = Object::new();
        obj.at("k").set("a\\b\nc\td");
        obj.at("q").set("it's\n");
        assert_eq!(
            encoder(RowMode::Value).encode(&obj),
            "k='a\\\\b\\nc\\td'\nq='it\\'s\\n'\n"
        );
    }

    #[test]
    fn test_length_prefixed_values() {
        let obj = Object::new();
        obj.at("q").set("it's");
        assert_eq!(encoder(RowMode::Object).encode(&obj), "q(4)='it's'\n");

        let raw = Encoder::new(EncodeOptions::new().with_raw(true));
        obj.at("q").set("a\\b");
        assert_eq!(raw.encode(&obj), "q(3)='a\\b'\n");
        obj.at("q").set("a\rb");
        assert_eq!(raw.encode(&obj), "q='a\rb'\n");

        let short = Encoder::new(EncodeOptions::new().with_long_value_threshold(3));
        obj.at("q").set("abcd");
        assert_eq!(short.encode(&obj), "q(4)='abcd'\n");
    }

    #[test]
    fn test_array_order_survives_nulled_items() {
        let obj = Object::new();
        let list = obj.at("list").array();
        list.append().set("a");
        list.append().at("x").set("b");
        list.append().set("c");
        obj.at("list[1]").erase();
        obj.at("list[1].x").set("b");
        obj.with_detail(|d| {
            let ids: Vec<&str> = d.records("list").map(|o| o.iter().collect()).unwrap_or_default();
            assert_eq!(ids, vec!["0", "2", "1"]);
        });
        assert_eq!(
            encoder(RowMode::Object).encode(&obj),
            "list[0]='a' list[2]='c'\nlist[1] :: x='b'\n"
        );
    }

    #[test]
    fn test_item_with_nulled_inside_keeps_its_place() {
        let obj = Object::new();
        obj.at("list[0].a").erase();
        obj.at("list[0].a.x").set("1");
        obj.at("list[1]").set("2");
        let text = encoder(RowMode::Object).encode(&obj);
        assert_eq!(text, "list[0].a :: x='1'\nlist[1] : ='2'\n");
        assert_eq!(crate::from_str(&text).unwrap(), obj);
    }

    fn assert_replays(obj: &Object) {
        for mode in [RowMode::Object, RowMode::Child, RowMode::Leaf, RowMode::Value] {
            for raw in [false, true] {
                let options = EncodeOptions::new().with_row_mode(mode).with_raw(raw);
                let text = Encoder::new(options).encode(obj);
                assert_eq!(&crate::from_str(&text).unwrap(), obj, "{mode:?} raw={raw} {text:?}");
            }
        }
    }

    #[test]
    fn test_nulled_item_under_nulled_root_keeps_its_place() {
        let obj = Object::new();
        obj.erase();
        obj.at("list[0]").erase();
        obj.at("list[0].x").set("1");
        obj.at("list[1]").set("2");
        assert_eq!(
            encoder(RowMode::Object).encode(&obj),
            ":: list[0].x='1' list[1]='2'\nlist[0] :: x='1'\n"
        );
        assert_replays(&obj);
        let replayed = crate::from_str(&encoder(RowMode::Leaf).encode(&obj)).unwrap();
        assert_eq!(replayed.at("list").array().item_ids(), vec!["0", "1"]);
    }

    #[test]
    fn test_item_with_nulled_inside_nulled_record_keeps_its_place() {
        let obj = Object::new();
        obj.at("r").erase();
        obj.at("r.list[0].a").erase();
        obj.at("r.list[0].a.x").set("1");
        obj.at("r.list[1]").set("2");
        assert_eq!(
            encoder(RowMode::Object).encode(&obj),
            "r :: list[0].a.x='1' list[1]='2'\nr.list[0].a :: x='1'\n"
        );
        assert_replays(&obj);
        let replayed = crate::from_str(&encoder(RowMode::Child).encode(&obj)).unwrap();
        assert!(replayed.at("r").is_nulled());
        assert_eq!(replayed.at("r.list").array().item_ids(), vec!["0", "1"]);
    }

    #[test]
    fn test_item_with_inline_values_needs_no_repeat() {
        let obj = Object::new();
        obj.at("r").erase();
        obj.at("r.list[0].b").set("3");
        obj.at("r.list[0].a").erase();
        obj.at("r.list[0].a.x").set("1");
        obj.at("r.list[1]").set("2");
        assert_eq!(
            encoder(RowMode::Object).encode(&obj),
            "r :: list[0].b='3' list[1]='2'\nr.list[0].a :: x='1'\n"
        );
        assert_replays(&obj);
    }

    #[test]
    fn test_leaf_items_after_subtree_item_get_rows() {
        let obj = Object::new();
        obj.at("list[0].x").set("a");
        obj.at("list[1]").set("b");
        assert_eq!(
            encoder(RowMode::Child).encode(&obj),
            "list[0] : x='a'\nlist[1] : ='b'\n"
        );
    }

    #[test]
    fn test_encode_into_buffer() {
        let mut out = Vec::new();
        encoder(RowMode::Object).encode_into(&sample(), &mut out);
        assert_eq!(out, b"a.c.d='2' a.x='1' b='3'\n");
    }

    #[derive(Serialize)]
    enum Shape {
        Circle { r: u32 },
        Point,
    }

    #[derive(Serialize)]
    struct Drawing {
        title: String,
        note: Option<String>,
        shapes: Vec<Shape>,
        tags: BTreeMap<String, bool>,
    }

    #[test]
    fn test_object_serializer() {
        let drawing = Drawing {
            title: "sketch".to_string(),
            note: None,
            shapes: vec![Shape::Circle { r: 2 }, Shape::Point],
            tags: BTreeMap::from([("draft".to_string(), true)]),
        };
        let obj = Object::new();
        drawing.serialize(ObjectSerializer::new(obj.clone())).unwrap();
        assert_eq!(obj.at("title").value().as_deref(), Some("sketch"));
        assert_eq!(obj.at("note").entry(), Some(None));
        assert_eq!(obj.at("shapes[0].Circle.r").value().as_deref(), Some("2"));
        assert_eq!(obj.at("shapes[1]").value().as_deref(), Some("Point"));
        assert_eq!(obj.at("tags.draft").value().as_deref(), Some("true"));
        assert_eq!(obj.at("shapes").array().item_ids(), vec!["0", "1"]);
    }

    #[test]
    fn test_map_key_must_be_scalar() {
        let mut map = BTreeMap::new();
        map.insert(vec![1, 2], "x");
        let obj = Object::new();
        assert!(map.serialize(ObjectSerializer::new(obj)).is_err());
    }
}
