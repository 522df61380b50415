//! Error types for bit encoding and decoding.
//!
//! Decoding errors are always local to one line: the [`Decoder`](crate::Decoder)
//! reports the [`DecodeErrorKind`] together with the line number and the
//! absolute byte offset of the offending byte, throws the rest of that line
//! away and resumes at the next one. What to do with the error (skip the
//! record and log it, or abort) is left to the caller.
//!
//! ## Examples
//!
//! ```rust
//! use serde_bit::{from_str, DecodeErrorKind, Error};
//!
//! let result = from_str("a : x='1'y='2'\n");
//! match result {
//!     Err(Error::Decode { kind, line, .. }) => {
//!         assert_eq!(kind, DecodeErrorKind::ExpectedTokenDelimiter);
//!         assert_eq!(line, 1);
//!     }
//!     other => panic!("unexpected {:?}", other),
//! }
//! ```

use std::fmt;
use thiserror::Error;

/// The syntax error kinds the decoder can report for a single line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum DecodeErrorKind {
    #[error("expected key")]
    ExpectedKey,
    #[error("expected '=' or '(' after key")]
    ExpectedAssignment,
    #[error("expected quoted value")]
    ExpectedValue,
    #[error("expected quoted value, 'null' or '(length)'")]
    ExpectedValueOrValueSpec,
    #[error("expected value length")]
    ExpectedValueSpec,
    #[error("invalid value length")]
    InvalidValueSpec,
    #[error("expected closing quote")]
    ExpectedValueDelimiter,
    #[error("expected whitespace, comment or end of line")]
    ExpectedTokenDelimiter,
}

/// Represents all possible errors produced by this crate.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// IO error during reading or writing
    #[error("IO error: {0}")]
    Io(String),

    /// Syntax error in one line of input
    #[error("Decode error at line {line}, offset {offset}: {kind}")]
    Decode {
        kind: DecodeErrorKind,
        line: usize,
        offset: usize,
    },

    /// Input ended while a length-prefixed value still expected bytes
    #[error("Unexpected end of input at line {line}, offset {offset}: {missing} value bytes missing")]
    UnexpectedEof {
        line: usize,
        offset: usize,
        missing: usize,
    },

    /// Array position outside the current array
    #[error("Index {index} out of range for array of size {size}")]
    OutOfRange { index: usize, size: usize },

    /// Custom error
    #[error("Error: {0}")]
    Custom(String),
}

impl Error {
    /// Creates a decode error for the given kind and position.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use serde_bit::{DecodeErrorKind, Error};
    ///
    /// let err = Error::decode(DecodeErrorKind::ExpectedKey, 3, 41);
    /// assert!(err.to_string().contains("line 3"));
    /// ```
    pub fn decode(kind: DecodeErrorKind, line: usize, offset: usize) -> Self {
        Error::Decode { kind, line, offset }
    }

    /// Creates an out-of-range error for array position access.
    pub fn out_of_range(index: usize, size: usize) -> Self {
        Error::OutOfRange { index, size }
    }

    /// Returns the decode error kind, if this is a syntax error.
    #[must_use]
    pub fn decode_kind(&self) -> Option<DecodeErrorKind> {
        match self {
            Error::Decode { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    /// Creates a custom error with a display message.
    pub fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }

    /// Creates an I/O error for reading/writing failures.
    pub fn io(msg: &str) -> Self {
        Error::Io(msg.to_string())
    }
}

impl serde::ser::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
