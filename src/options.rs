//! Configuration options for encoding and decoding.
//!
//! - [`EncodeOptions`]: row granularity, raw/escaped values, and when to switch
//!   to the length-prefixed value form
//! - [`RowMode`]: how an object is split into lines
//! - [`DecoderOptions`]: limits applied while decoding
//!
//! ## Examples
//!
//! ```rust
//! use serde_bit::{bit, to_string_with_options, EncodeOptions, RowMode};
//!
//! let obj = bit! {
//!     "a.x" => "1",
//!     "a.y" => "2",
//! };
//!
//! let options = EncodeOptions::new().with_row_mode(RowMode::Value);
//! let text = to_string_with_options(&obj, &options);
//! assert_eq!(text, "a.x='1'\na.y='2'\n");
//! ```

/// How an object is split into encoded lines.
///
/// # Examples
///
/// ```rust
/// use serde_bit::RowMode;
///
/// assert_eq!(RowMode::default(), RowMode::Object);
/// assert_eq!(RowMode::Leaf.as_str(), "leaf");
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum RowMode {
    /// One line per stored value.
    Value,
    /// One line for the object's own values, one per direct child subtree.
    Child,
    /// One line per node that directly holds values, at any depth.
    Leaf,
    /// The whole subtree on one line.
    #[default]
    Object,
}

impl RowMode {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            RowMode::Value => "value",
            RowMode::Child => "child",
            RowMode::Leaf => "leaf",
            RowMode::Object => "object",
        }
    }
}

/// Configuration options for encoding.
///
/// # Examples
///
/// ```rust
/// use serde_bit::{EncodeOptions, RowMode};
///
/// let options = EncodeOptions::new()
///     .with_row_mode(RowMode::Leaf)
///     .with_raw(true)
///     .with_long_value_threshold(64);
/// assert_eq!(options.long_value_threshold, 64);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncodeOptions {
    pub row_mode: RowMode,
    /// Write values without escapes; values that need them get a length prefix.
    pub raw: bool,
    /// Values longer than this many bytes use the `(N)'...'` form when they
    /// contain no control characters.
    pub long_value_threshold: usize,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        EncodeOptions {
            row_mode: RowMode::default(),
            raw: false,
            long_value_threshold: 256,
        }
    }
}

impl EncodeOptions {
    /// Creates default options (object rows, escaped values).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_row_mode(mut self, row_mode: RowMode) -> Self {
        self.row_mode = row_mode;
        self
    }

    #[must_use]
    pub fn with_raw(mut self, raw: bool) -> Self {
        self.raw = raw;
        self
    }

    #[must_use]
    pub fn with_long_value_threshold(mut self, threshold: usize) -> Self {
        self.long_value_threshold = threshold;
        self
    }
}

/// Limits applied by the [`Decoder`](crate::Decoder).
///
/// # Examples
///
/// ```rust
/// use serde_bit::DecoderOptions;
///
/// let options = DecoderOptions::new().with_max_value_len(1024);
/// assert_eq!(options.max_value_len, 1024);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecoderOptions {
    /// Largest accepted `(N)` length prefix; larger ones are `InvalidValueSpec`.
    pub max_value_len: usize,
}

impl Default for DecoderOptions {
    fn default() -> Self {
        DecoderOptions {
            max_value_len: 16 * 1024 * 1024,
        }
    }
}

impl DecoderOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_max_value_len(mut self, max_value_len: usize) -> Self {
        self.max_value_len = max_value_len;
        self
    }
}
