//! # serde_bit
//!
//! A streamable, line-oriented text encoding ("bit") for hierarchical
//! key/value data, with a replayable in-memory store.
//!
//! ## What is bit?
//!
//! Every line of a bit stream is a self-contained record that sets values in
//! one subtree, or erases it. A file is the ordered concatenation of records,
//! and replaying it reconstructs the current state, much like a small
//! write-ahead log that people can read and edit:
//!
//! ```text
//! customer[0] : name='Tom' address.city='San Diego'
//! customer[1] : name='Rick'
//! customer[0] : address.city='Vista'
//! ```
//!
//! ## Key Features
//!
//! - **Append-only friendly**: records merge with last-writer-wins semantics,
//!   tombstones included
//! - **Resumable decoding**: the [`Decoder`] accepts input split at any byte
//!   and yields one record at a time
//! - **Ordered arrays**: items of `list[id]` keys keep their insertion order
//!   regardless of their ids
//! - **Views**: [`Object`] handles address subtrees of one shared store, with
//!   relative keys after [`Object::clip`]
//! - **Serde bridge**: [`to_object`] stores any `T: Serialize`, and [`Object`]
//!   serializes as a flat map
//!
//! ## Quick Start
//!
//! ```rust
//! use serde_bit::{from_str, to_string, Object};
//!
//! let log = "\
//! customer[0] : name='Tom' address.city='San Diego'
//! customer[1] : name='Rick'
//! customer[0] : address.city='Vista'
//! ";
//!
//! let state = from_str(log).unwrap();
//! assert_eq!(state.at("customer[0].address.city").value().as_deref(), Some("Vista"));
//! assert_eq!(state.at("customer").array().item_ids(), vec!["0", "1"]);
//!
//! // Write the current state back out as a compacted log.
//! let compacted = to_string(&state);
//! assert_eq!(from_str(&compacted).unwrap(), state);
//! ```
//!
//! ### Streaming
//!
//! ```rust
//! use serde_bit::{ByteBuffer, Decoder, Object, WriteBuffer};
//!
//! let state = Object::new();
//! let mut decoder = Decoder::new();
//! let mut buffer = ByteBuffer::new();
//!
//! for chunk in ["a : x='1", "' y='2'\na :", ": z='3'\n"] {
//!     buffer.write_bytes(chunk.as_bytes());
//!     while let Some(record) = decoder.decode(&mut buffer).unwrap() {
//!         state.append(&record);
//!     }
//! }
//!
//! assert!(state.at("a").is_nulled());
//! assert_eq!(state.at("a.x").value(), None);
//! assert_eq!(state.at("a.z").value().as_deref(), Some("3"));
//! ```
//!
//! ### Building Objects with the bit! Macro
//!
//! ```rust
//! use serde_bit::bit;
//!
//! let obj = bit! {
//!     "server.host" => "localhost",
//!     "server.port" => "8080",
//!     "server.debug" => null,
//! };
//! assert_eq!(obj.at("server").list_values().len(), 2);
//! ```
//!
//! ## Format Description
//!
//! See the [`grammar`] module for the line grammar, the value forms and the
//! error kinds.
//!
//! ## Examples
//!
//! The `demos/` directory holds runnable programs:
//!
//! - **`simple.rs`** - building, encoding and decoding an object
//! - **`log_replay.rs`** - replaying a log in chunks and compacting it
//!
//! Run one with: `cargo run --example <name>`

pub mod array;
pub mod buffer;
pub mod de;
pub mod error;
pub mod grammar;
pub mod key;
pub mod macros;
pub mod object;
pub mod options;
pub mod order;
pub mod ser;

pub use array::Array;
pub use buffer::{ByteBuffer, ReadBuffer, WriteBuffer};
pub use de::Decoder;
pub use error::{DecodeErrorKind, Error, Result};
pub use key::Key;
pub use object::Object;
pub use options::{DecoderOptions, EncodeOptions, RowMode};
pub use order::ItemOrder;
pub use ser::{Encoder, ObjectSerializer};

use serde::Serialize;
use std::io;
use tracing::warn;

const READ_CHUNK: usize = 8 * 1024;

/// Encode an object with the default options (one row for the whole object,
/// escaped values).
///
/// # Examples
///
/// ```rust
/// use serde_bit::{to_string, Object};
///
/// let obj = Object::new();
/// obj.at("a.x").set("1");
/// obj.at("a.y").set("it's");
/// assert_eq!(to_string(&obj), "a.x='1' a.y(4)='it's'\n");
/// ```
#[must_use]
pub fn to_string(obj: &Object) -> String {
    to_string_with_options(obj, &EncodeOptions::default())
}

/// Encode an object with custom options.
///
/// # Examples
///
/// ```rust
/// use serde_bit::{to_string_with_options, EncodeOptions, Object, RowMode};
///
/// let obj = Object::new();
/// obj.at("a.x").set("1");
/// obj.at("b.y").set("2");
///
/// let options = EncodeOptions::new().with_row_mode(RowMode::Child);
/// assert_eq!(to_string_with_options(&obj, &options), "a : x='1'\nb : y='2'\n");
/// ```
#[must_use]
pub fn to_string_with_options(obj: &Object, options: &EncodeOptions) -> String {
    Encoder::new(options.clone()).encode(obj)
}

/// Encode an object to a writer with the default options.
///
/// # Errors
///
/// Returns [`Error::Io`] if writing fails.
pub fn to_writer<W>(writer: W, obj: &Object) -> Result<()>
where
    W: io::Write,
{
    to_writer_with_options(writer, obj, &EncodeOptions::default())
}

/// Encode an object to a writer with custom options.
///
/// # Errors
///
/// Returns [`Error::Io`] if writing fails.
pub fn to_writer_with_options<W>(mut writer: W, obj: &Object, options: &EncodeOptions) -> Result<()>
where
    W: io::Write,
{
    for line in Encoder::new(options.clone()).lines(obj) {
        writer
            .write_all(line.as_bytes())
            .map_err(|e| Error::io(&e.to_string()))?;
    }
    Ok(())
}

/// Store any `T: Serialize` in a new object.
///
/// # Examples
///
/// ```rust
/// use serde::Serialize;
/// use serde_bit::to_object;
///
/// #[derive(Serialize)]
/// struct Point { x: i32, y: i32 }
///
/// let obj = to_object(&Point { x: 1, y: 2 }).unwrap();
/// assert_eq!(obj.at("x").value().as_deref(), Some("1"));
/// ```
///
/// # Errors
///
/// Returns [`Error::Custom`] if a map key does not serialize to a scalar.
pub fn to_object<T>(value: &T) -> Result<Object>
where
    T: ?Sized + Serialize,
{
    let obj = Object::new();
    value.serialize(ObjectSerializer::new(obj.clone()))?;
    Ok(obj)
}

/// Decodes every record in `buffer` into `target`, stopping at the first
/// syntax error.
fn decode_strict<B>(decoder: &mut Decoder, buffer: &mut B, target: &Object) -> Result<()>
where
    B: ReadBuffer + ?Sized,
{
    while let Some(record) = decoder.decode(buffer)? {
        target.append(&record);
    }
    Ok(())
}

/// Replay bit text into a new object.
///
/// A last line without `\n` is accepted.
///
/// # Examples
///
/// ```rust
/// use serde_bit::from_str;
///
/// let obj = from_str("a : x='1' y='2'\na : y='3' z='4'").unwrap();
/// assert_eq!(obj.at("a.y").value().as_deref(), Some("3"));
/// ```
///
/// # Errors
///
/// Returns the first [`Error::Decode`], or [`Error::UnexpectedEof`] if the
/// text ends inside a length-prefixed value.
pub fn from_str(s: &str) -> Result<Object> {
    from_slice(s.as_bytes())
}

/// Replay bit bytes into a new object.
///
/// # Errors
///
/// Same as [`from_str`].
pub fn from_slice(v: &[u8]) -> Result<Object> {
    let target = Object::new();
    let mut decoder = Decoder::new();
    let mut buffer = ByteBuffer::from(v);
    decode_strict(&mut decoder, &mut buffer, &target)?;
    if let Some(record) = decoder.finish()? {
        target.append(&record);
    }
    Ok(target)
}

/// Replay bit text into a new object, skipping malformed lines.
///
/// Every skipped line is logged and returned with the object.
///
/// # Examples
///
/// ```rust
/// use serde_bit::{from_str_lenient, DecodeErrorKind};
///
/// let (obj, errors) = from_str_lenient("a : x='1'\na : y=2\na : z='3'\n");
/// assert_eq!(obj.at("a.z").value().as_deref(), Some("3"));
/// assert_eq!(errors.len(), 1);
/// assert_eq!(errors[0].decode_kind(), Some(DecodeErrorKind::ExpectedValueOrValueSpec));
/// ```
#[must_use]
pub fn from_str_lenient(s: &str) -> (Object, Vec<Error>) {
    let target = Object::new();
    let mut decoder = Decoder::new();
    let mut buffer = ByteBuffer::from(s);
    let mut errors = decoder.decode_all(&mut buffer, &target);
    match decoder.finish() {
        Ok(Some(record)) => target.append(&record),
        Ok(None) => {}
        Err(err) => errors.push(err),
    }
    for err in &errors {
        warn!(error = %err, "skipped malformed line");
    }
    (target, errors)
}

/// Replay bit text from a reader into a new object, in chunks.
///
/// # Examples
///
/// ```rust
/// use serde_bit::from_reader;
/// use std::io::Cursor;
///
/// let obj = from_reader(Cursor::new(b"k(3)='a\nb'\n")).unwrap();
/// assert_eq!(obj.at("k").value().as_deref(), Some("a\nb"));
/// ```
///
/// # Errors
///
/// Returns [`Error::Io`] if reading fails, otherwise the same errors as
/// [`from_str`].
pub fn from_reader<R>(mut reader: R) -> Result<Object>
where
    R: io::Read,
{
    let target = Object::new();
    let mut decoder = Decoder::new();
    let mut buffer = ByteBuffer::with_capacity(READ_CHUNK);
    let mut chunk = vec![0u8; READ_CHUNK];
    loop {
        let n = match reader.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(Error::io(&e.to_string())),
        };
        buffer.write_bytes(&chunk[..n]);
        decode_strict(&mut decoder, &mut buffer, &target)?;
        buffer.compact();
    }
    if let Some(record) = decoder.finish()? {
        target.append(&record);
    }
    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;

    #[derive(Serialize)]
    struct Address {
        city: String,
        zip: Option<String>,
    }

    #[derive(Serialize)]
    struct Customer {
        name: String,
        address: Address,
        tags: Vec<String>,
    }

    fn customer() -> Customer {
        Customer {
            name: "Tom".to_string(),
            address: Address {
                city: "San Diego".to_string(),
                zip: None,
            },
            tags: vec!["new".to_string(), "vip".to_string()],
        }
    }

    #[test]
    fn test_to_object_and_back() {
        let obj = to_object(&customer()).unwrap();
        assert_eq!(obj.at("address.city").value().as_deref(), Some("San Diego"));
        assert_eq!(obj.at("address.zip").entry(), Some(None));
        assert_eq!(obj.at("tags[1]").value().as_deref(), Some("vip"));

        let text = to_string(&obj);
        assert_eq!(from_str(&text).unwrap(), obj);
    }

    #[test]
    fn test_round_trip_all_modes() {
        let obj = to_object(&customer()).unwrap();
        obj.at("old").erase();
        for mode in [RowMode::Value, RowMode::Child, RowMode::Leaf, RowMode::Object] {
            for raw in [false, true] {
                let options = EncodeOptions::new().with_row_mode(mode).with_raw(raw);
                let text = to_string_with_options(&obj, &options);
                assert_eq!(from_str(&text).unwrap(), obj, "{:?} raw={} {:?}", mode, raw, text);
            }
        }
    }

    #[test]
    fn test_from_str_stops_at_first_error() {
        let err = from_str("a : x='1'\na : 'y'\n").unwrap_err();
        assert_eq!(err, Error::decode(DecodeErrorKind::ExpectedKey, 2, 14));
    }

    #[test]
    fn test_from_str_unterminated_value() {
        assert!(matches!(
            from_str("k(5)='ab"),
            Err(Error::UnexpectedEof { missing: 3, .. })
        ));
    }

    #[test]
    fn test_from_str_lenient() {
        let (obj, errors) = from_str_lenient("bad\nk='v'\nk2='unterminated");
        assert_eq!(obj.at("k").value().as_deref(), Some("v"));
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn test_to_writer() {
        let obj = to_object(&customer()).unwrap();
        let mut out = Vec::new();
        to_writer(&mut out, &obj).unwrap();
        assert_eq!(from_slice(&out).unwrap(), obj);
    }

    #[test]
    fn test_from_reader_across_chunks() {
        let mut text = String::new();
        for i in 0..2000 {
            text.push_str(&format!("list[{i}] : value='{i}'\n"));
        }
        let obj = from_reader(std::io::Cursor::new(text.into_bytes())).unwrap();
        let list = obj.at("list").array();
        assert_eq!(list.size(), 2000);
        assert_eq!(list.at_index(1999).unwrap().at("value").value().as_deref(), Some("1999"));
    }
}
