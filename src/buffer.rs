//! Byte buffers the codec reads from and writes to.
//!
//! The decoder only needs to see the unread bytes and to consume a prefix of
//! them ([`ReadBuffer`]); the encoder only appends ([`WriteBuffer`]). Any
//! stream type can be adapted by implementing these traits. [`ByteBuffer`] is
//! a growable in-memory buffer with a read cursor that implements both.
//!
//! ```rust
//! use serde_bit::{ByteBuffer, ReadBuffer, WriteBuffer};
//!
//! let mut buffer = ByteBuffer::new();
//! buffer.write_bytes(b"a : x='1'\n");
//! assert_eq!(buffer.byte_at(2), Some(b':'));
//! assert_eq!(buffer.consume(4), b"a : ");
//! assert_eq!(buffer.position(), 4);
//! assert_eq!(buffer.remaining(), b"x='1'\n");
//! ```

/// Source of bytes for the decoder.
pub trait ReadBuffer {
    /// Bytes not yet consumed.
    fn remaining(&self) -> &[u8];

    /// Advances the read cursor by `n` bytes and returns them.
    fn consume(&mut self, n: usize) -> &[u8];

    /// Absolute position of the read cursor.
    fn position(&self) -> usize;

    /// The byte at absolute `position`, if the buffer still holds it.
    ///
    /// The default only sees unread bytes.
    fn byte_at(&self, position: usize) -> Option<u8> {
        position
            .checked_sub(self.position())
            .and_then(|i| self.remaining().get(i))
            .copied()
    }
}

/// Sink for encoded bytes.
pub trait WriteBuffer {
    fn write_bytes(&mut self, bytes: &[u8]);
}

/// Growable byte buffer with a read cursor.
///
/// Consumed bytes are dropped lazily by [`compact`](ByteBuffer::compact);
/// positions stay absolute across compaction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ByteBuffer {
    data: Vec<u8>,
    read: usize,
    // absolute position of data[0]
    base: usize,
}

impl ByteBuffer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        ByteBuffer {
            data: Vec::with_capacity(capacity),
            read: 0,
            base: 0,
        }
    }

    /// Number of unread bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len() - self.read
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops consumed bytes from memory.
    pub fn compact(&mut self) {
        self.data.drain(..self.read);
        self.base += self.read;
        self.read = 0;
    }

    /// Everything written so far that is still buffered.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }
}

impl From<&[u8]> for ByteBuffer {
    fn from(bytes: &[u8]) -> Self {
        ByteBuffer {
            data: bytes.to_vec(),
            read: 0,
            base: 0,
        }
    }
}

impl From<&str> for ByteBuffer {
    fn from(text: &str) -> Self {
        ByteBuffer::from(text.as_bytes())
    }
}

impl ReadBuffer for ByteBuffer {
    fn remaining(&self) -> &[u8] {
        &self.data[self.read..]
    }

    fn consume(&mut self, n: usize) -> &[u8] {
        let start = self.read;
        self.read = (self.read + n).min(self.data.len());
        &self.data[start..self.read]
    }

    fn position(&self) -> usize {
        self.base + self.read
    }

    /// Also sees consumed bytes up to the last [`compact`](ByteBuffer::compact).
    fn byte_at(&self, position: usize) -> Option<u8> {
        position
            .checked_sub(self.base)
            .and_then(|i| self.data.get(i))
            .copied()
    }
}

impl WriteBuffer for ByteBuffer {
    fn write_bytes(&mut self, bytes: &[u8]) {
        self.data.extend_from_slice(bytes);
    }
}

impl WriteBuffer for Vec<u8> {
    fn write_bytes(&mut self, bytes: &[u8]) {
        self.extend_from_slice(bytes);
    }
}
