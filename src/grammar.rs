//! The bit text format
//!
//! This module documents the line grammar read by the [`Decoder`](crate::Decoder)
//! and written by the [`Encoder`](crate::Encoder).
//!
//! # Overview
//!
//! A bit stream is a sequence of newline-terminated records. Each record names
//! one subtree of a hierarchical key/value store and states values (or
//! tombstones) inside it. Records are applied in order with
//! [`Object::append`](crate::Object::append), so a file is a replayable log
//! and the last writer wins.
//!
//! ```text
//! customer[0] : name='Tom' address.city='San Diego'
//! customer[1] : name='Rick'
//! customer[0] : address.city='Vista'
//! ```
//!
//! # Keys
//!
//! Keys are dotted paths. A segment may end in a bracketed item id, which
//! addresses one item of an array: `customer[0]` is item `0` of the array
//! `customer`. Dots, spaces and colons inside brackets do not split a key.
//! Array items keep the order in which they were first written, independent
//! of their ids.
//!
//! # Lines
//!
//! ```text
//! line       = ws* ( header? assignment* | "null" ) comment? "\r"? "\n"
//! header     = record ws* ":" ":"? ws*
//! assignment = key? ( "(" digits ")" "="? | "=" ( "(" digits ")" )? ) value ws*
//! value      = "'" chars "'" | "null"
//! comment    = "#" any*
//! ```
//!
//! | Form | Meaning |
//! |------|---------|
//! | `rec : k='v'` | set `rec.k` |
//! | `rec :: k='v'` | erase the subtree `rec`, then set `rec.k` |
//! | `rec : null` | erase the subtree `rec` |
//! | `rec : k=null` | store a tombstone at `rec.k` |
//! | `rec : ='v'` | set `rec` itself |
//! | `k='v'` | set `k` in the root record |
//! | `='v'` | set the root value |
//! | `null` | erase the root |
//!
//! A `null` in key position erases the record only when a delimiter follows
//! it, so `null='x'`, `nullable='x'` and `null : k='v'` all use `null` as a
//! name.
//!
//! # Values
//!
//! Quoted values understand the escapes `\\`, `\'`, `\n`, `\r`, `\t` and `\0`.
//! Any other escaped character is kept together with its backslash.
//!
//! A value preceded by `(N)` is read as exactly `N` raw bytes followed by the
//! closing quote, without escape processing:
//!
//! ```text
//! note(10)='it's "raw"'
//! ```
//!
//! The encoder picks this form for values that are longer than
//! [`EncodeOptions::long_value_threshold`](crate::EncodeOptions) or contain a
//! quote, unless escaping is required anyway for control characters. In raw
//! mode it is used for every value that could not be read back verbatim.
//!
//! # Errors
//!
//! Every syntax error is local to its line. The decoder reports the
//! [`DecodeErrorKind`](crate::DecodeErrorKind), line and byte offset, drops
//! everything the line contributed, and continues at the next line.
//!
//! | Kind | Example |
//! |------|---------|
//! | `ExpectedKey` | `rec : 'v'` |
//! | `ExpectedAssignment` | `rec : k'v'` |
//! | `ExpectedValue` | `rec : k(1)v` |
//! | `ExpectedValueOrValueSpec` | `rec : k=v` |
//! | `ExpectedValueSpec` | `rec : k()'v'` |
//! | `InvalidValueSpec` | `rec : k(1x)'v'` |
//! | `ExpectedValueDelimiter` | `rec : k='v` |
//! | `ExpectedTokenDelimiter` | `rec : a='1'b='2'` |
//!
//! # Row modes
//!
//! The same store can be written at several granularities, see
//! [`RowMode`](crate::RowMode). All of them decode back to the same store:
//!
//! ```rust
//! use serde_bit::{from_str, to_string_with_options, EncodeOptions, Object, RowMode};
//!
//! let obj = Object::new();
//! obj.at("host.name").set("db");
//! obj.at("host.port").set("5432");
//! obj.at("old").erase();
//!
//! for mode in [RowMode::Value, RowMode::Child, RowMode::Leaf, RowMode::Object] {
//!     let text = to_string_with_options(&obj, &EncodeOptions::new().with_row_mode(mode));
//!     assert_eq!(from_str(&text).unwrap(), obj);
//! }
//! ```
//!
//! # Limitations
//!
//! - Keys are written verbatim, so key segments must not contain whitespace,
//!   `:`, `=`, `(`, `'` or `#` outside brackets
//! - Values are byte strings on the wire; invalid UTF-8 is replaced when a
//!   value is stored
