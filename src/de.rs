//! Incremental decoding.
//!
//! This module provides the [`Decoder`], a byte-at-a-time state machine that
//! turns a stream of bit text into one [`Object`] fragment per record line.
//!
//! ## Overview
//!
//! - **Resumable**: all partial tokens and values live in the decoder, so input
//!   may be split at any byte; [`Decoder::decode`] returns `Ok(None)` when it
//!   needs more bytes and picks up where it left off on the next call
//! - **Incremental**: every completed `key='value'` is applied to the record
//!   fragment immediately, and `record ::` erases the record before the
//!   assignments that follow it on the same line
//! - **Line-local errors**: a syntax error discards the rest of its line; the
//!   next line decodes normally
//!
//! ## Usage
//!
//! ```rust
//! use serde_bit::{ByteBuffer, Decoder, Object};
//!
//! let mut decoder = Decoder::new();
//! let state = Object::new();
//!
//! let mut buffer = ByteBuffer::from("customer[0] : name='Tom' addr");
//! assert!(decoder.decode(&mut buffer).unwrap().is_none());
//!
//! let mut buffer = ByteBuffer::from("ess.city='Vista'\n");
//! let record = decoder.decode(&mut buffer).unwrap().unwrap();
//! state.append(&record);
//!
//! assert_eq!(state.at("customer[0].address.city").value().as_deref(), Some("Vista"));
//! ```

use crate::buffer::ReadBuffer;
use crate::error::DecodeErrorKind;
use crate::options::DecoderOptions;
use crate::{Error, Object, Result};
use tracing::{debug, trace};

/// Decoder states, one per position in the line grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    /// Start of a line.
    Bol,
    /// Between assignments, expecting a key.
    PreToken,
    /// Inside a record name or key.
    Token,
    /// After a record name or key.
    PostToken,
    /// After `=`, expecting a quoted value, `null` or `(length)`.
    PreValue,
    /// Matching the letters of `null`.
    NullValue,
    /// Inside `(length)`.
    ValueSpec,
    /// Inside a quoted value.
    Value,
    /// After a closing quote or `null`.
    PostValue,
    /// After `#`, until end of line.
    Comment,
    /// Skipping the rest of a malformed line.
    Error,
    /// After `\r`, expecting `\n`.
    Eol,
}

/// Whether the token being read names the record or a key inside it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TokenRole {
    Record,
    Key,
}

/// Outcome of feeding one byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Continue,
    Record,
    Fail(DecodeErrorKind),
}

const NULL: &[u8] = b"null";

/// Streaming decoder for bit text.
///
/// One decoder reads one stream; it is not meant to be shared.
#[derive(Debug)]
pub struct Decoder {
    options: DecoderOptions,
    state: State,
    role: TokenRole,
    // record name of the current line
    record: String,
    token: Vec<u8>,
    value: Vec<u8>,
    bracket_depth: usize,
    // the record's ':' was just read; a second ':' erases the record
    colon: bool,
    // whitespace seen between a token and the current byte
    spaced: bool,
    escape: bool,
    // declared (N) of the current value, and bytes still to read
    value_len: Option<usize>,
    remaining: usize,
    spec_digits: usize,
    equals: bool,
    null_matched: usize,
    line_has_content: bool,
    result: Object,
    line: usize,
    offset: usize,
}

impl Default for Decoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder {
    #[must_use]
    pub fn new() -> Self {
        Self::with_options(DecoderOptions::default())
    }

    #[must_use]
    pub fn with_options(options: DecoderOptions) -> Self {
        Decoder {
            options,
            state: State::Bol,
            role: TokenRole::Record,
            record: String::new(),
            token: Vec::new(),
            value: Vec::new(),
            bracket_depth: 0,
            colon: false,
            spaced: false,
            escape: false,
            value_len: None,
            remaining: 0,
            spec_digits: 0,
            equals: false,
            null_matched: 0,
            line_has_content: false,
            result: Object::new(),
            line: 1,
            offset: 0,
        }
    }

    #[must_use]
    pub fn state(&self) -> State {
        self.state
    }

    /// Current line number, 1-based.
    #[must_use]
    pub fn line(&self) -> usize {
        self.line
    }

    /// Number of bytes decoded so far.
    #[must_use]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// The record being built from the current, unfinished line.
    ///
    /// Assignments show up here as soon as they are read. The fragment is
    /// handed out by [`decode`](Self::decode) once the line ends, and dropped
    /// if the line turns out to be malformed.
    #[must_use]
    pub fn partial(&self) -> &Object {
        &self.result
    }

    /// Decodes bytes from `buffer` until one record is complete.
    ///
    /// Returns `Ok(Some(record))` for a complete record, `Ok(None)` once the
    /// buffer is exhausted mid-record or between records, and
    /// [`Error::Decode`] for a malformed line. Only the bytes up to the end of
    /// the returned record (or the offending byte) are consumed, so the caller
    /// simply calls again.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Decode`] with the error kind, line and offset.
    pub fn decode<B>(&mut self, buffer: &mut B) -> Result<Option<Object>>
    where
        B: ReadBuffer + ?Sized,
    {
        let mut processed = 0;
        let mut outcome = Step::Continue;
        for &byte in buffer.remaining() {
            processed += 1;
            outcome = self.feed(byte);
            if outcome != Step::Continue {
                break;
            }
        }
        buffer.consume(processed);
        self.outcome(outcome)
    }

    /// Ends the stream, completing a last line that has no `\n`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnexpectedEof`] if a length-prefixed value is still
    /// missing bytes, or [`Error::Decode`] if the last line is malformed.
    pub fn finish(&mut self) -> Result<Option<Object>> {
        match self.state {
            State::Bol | State::Error => {
                self.reset_line();
                self.state = State::Bol;
                Ok(None)
            }
            State::Value if self.value_len.is_some() => {
                let err = Error::UnexpectedEof {
                    line: self.line,
                    offset: self.offset,
                    missing: self.remaining,
                };
                debug!(line = self.line, offset = self.offset, "stream ended inside value");
                self.reset_line();
                self.state = State::Bol;
                Err(err)
            }
            _ => {
                // the virtual newline is not counted as input
                let offset = self.offset;
                let step = self.feed(b'\n');
                self.offset = offset;
                self.outcome(step)
            }
        }
    }

    /// Folds every complete record in `buffer` into `target`.
    ///
    /// Malformed lines are skipped and returned; decoding stops when the
    /// buffer runs out, leaving any partial line in the decoder.
    pub fn decode_all<B>(&mut self, buffer: &mut B, target: &Object) -> Vec<Error>
    where
        B: ReadBuffer + ?Sized,
    {
        let mut errors = Vec::new();
        loop {
            match self.decode(buffer) {
                Ok(Some(record)) => target.append(&record),
                Ok(None) => break,
                Err(err) => errors.push(err),
            }
        }
        errors
    }

    fn outcome(&mut self, step: Step) -> Result<Option<Object>> {
        match step {
            Step::Continue => Ok(None),
            Step::Record => {
                let record = std::mem::take(&mut self.result);
                trace!(line = self.line - 1, "record decoded");
                Ok(Some(record))
            }
            Step::Fail(kind) => {
                // feed() already moved past the offending byte
                let offset = self.offset - 1;
                let line = if self.state == State::Bol {
                    self.line - 1
                } else {
                    self.line
                };
                debug!(?kind, line, offset, "malformed line");
                Err(Error::decode(kind, line, offset))
            }
        }
    }

    fn reset_line(&mut self) {
        self.record.clear();
        self.token.clear();
        self.value.clear();
        self.bracket_depth = 0;
        self.colon = false;
        self.spaced = false;
        self.escape = false;
        self.value_len = None;
        self.remaining = 0;
        self.spec_digits = 0;
        self.equals = false;
        self.null_matched = 0;
        self.line_has_content = false;
    }

    /// Feeds one byte, keeping line and offset counters.
    fn feed(&mut self, byte: u8) -> Step {
        self.offset += 1;
        let step = match self.step(byte) {
            Step::Fail(kind) => {
                self.result = Object::new();
                self.reset_line();
                self.state = if byte == b'\n' { State::Bol } else { State::Error };
                Step::Fail(kind)
            }
            other => other,
        };
        if byte == b'\n' && self.state == State::Bol {
            self.line += 1;
        }
        step
    }

    fn end_line(&mut self) -> Step {
        let had_content = self.line_has_content;
        self.reset_line();
        self.state = State::Bol;
        if had_content {
            Step::Record
        } else {
            Step::Continue
        }
    }

    fn target(&self) -> Object {
        self.result.at(&self.record)
    }

    fn erase_record(&mut self) {
        self.target().erase();
    }

    fn token_str(&self) -> String {
        String::from_utf8_lossy(&self.token).into_owned()
    }

    fn start_token(&mut self, role: TokenRole, byte: u8) {
        self.role = role;
        self.token.clear();
        self.token.push(byte);
        self.bracket_depth = usize::from(byte == b'[');
        self.spaced = false;
        self.state = State::Token;
    }

    fn start_assignment(&mut self, next: State) {
        self.value.clear();
        self.value_len = None;
        self.equals = next == State::PreValue;
        self.spec_digits = 0;
        self.escape = false;
        self.state = next;
    }

    fn apply(&mut self, value: Option<&str>) {
        let name = self.token_str();
        self.target().at(&name).assign(value);
        self.token.clear();
    }

    /// The transition function: one byte in the current state.
    fn step(&mut self, byte: u8) -> Step {
        match self.state {
            State::Bol => self.step_bol(byte),
            State::PreToken => self.step_pre_token(byte),
            State::Token => self.step_token(byte),
            State::PostToken => self.step_post_token(byte),
            State::PreValue => self.step_pre_value(byte),
            State::NullValue => self.step_null_value(byte),
            State::ValueSpec => self.step_value_spec(byte),
            State::Value => self.step_value(byte),
            State::PostValue => self.step_post_value(byte),
            State::Comment => {
                if byte == b'\n' {
                    self.end_line()
                } else {
                    Step::Continue
                }
            }
            State::Error => {
                if byte == b'\n' {
                    self.reset_line();
                    self.state = State::Bol;
                }
                Step::Continue
            }
            State::Eol => {
                if byte == b'\n' {
                    self.end_line()
                } else {
                    Step::Fail(DecodeErrorKind::ExpectedTokenDelimiter)
                }
            }
        }
    }

    fn step_bol(&mut self, byte: u8) -> Step {
        match byte {
            b' ' | b'\t' | b'\n' => Step::Continue,
            b'\r' => {
                self.state = State::Eol;
                Step::Continue
            }
            b'#' => {
                self.state = State::Comment;
                Step::Continue
            }
            b':' => {
                self.line_has_content = true;
                self.record.clear();
                self.colon = true;
                self.state = State::PreToken;
                Step::Continue
            }
            b'=' => {
                self.line_has_content = true;
                self.token.clear();
                self.start_assignment(State::PreValue);
                Step::Continue
            }
            b'(' => {
                self.line_has_content = true;
                self.token.clear();
                self.start_assignment(State::ValueSpec);
                Step::Continue
            }
            b'\'' | b')' => Step::Fail(DecodeErrorKind::ExpectedKey),
            _ => {
                self.line_has_content = true;
                self.start_token(TokenRole::Record, byte);
                Step::Continue
            }
        }
    }

    fn step_pre_token(&mut self, byte: u8) -> Step {
        if std::mem::take(&mut self.colon) && byte == b':' {
            self.erase_record();
            return Step::Continue;
        }
        match byte {
            b' ' | b'\t' => Step::Continue,
            b'\n' => self.end_line(),
            b'\r' => {
                self.state = State::Eol;
                Step::Continue
            }
            b'#' => {
                self.state = State::Comment;
                Step::Continue
            }
            b'=' => {
                self.token.clear();
                self.start_assignment(State::PreValue);
                Step::Continue
            }
            b'(' => {
                self.token.clear();
                self.start_assignment(State::ValueSpec);
                Step::Continue
            }
            b'\'' | b':' | b')' => Step::Fail(DecodeErrorKind::ExpectedKey),
            _ => {
                self.start_token(TokenRole::Key, byte);
                Step::Continue
            }
        }
    }

    fn step_token(&mut self, byte: u8) -> Step {
        if self.bracket_depth > 0 {
            match byte {
                b'\n' => return Step::Fail(DecodeErrorKind::ExpectedTokenDelimiter),
                b'[' => self.bracket_depth += 1,
                b']' => self.bracket_depth -= 1,
                _ => {}
            }
            self.token.push(byte);
            return Step::Continue;
        }
        match byte {
            b'[' => {
                self.bracket_depth = 1;
                self.token.push(byte);
                Step::Continue
            }
            b' ' | b'\t' | b'\n' | b'\r' | b'#' | b':' | b'=' | b'(' | b'\'' | b')' => {
                self.state = State::PostToken;
                self.step_post_token(byte)
            }
            _ => {
                self.token.push(byte);
                Step::Continue
            }
        }
    }

    fn is_null_token(&self) -> bool {
        self.token == NULL
    }

    fn step_post_token(&mut self, byte: u8) -> Step {
        if matches!(byte, b' ' | b'\t') {
            self.spaced = true;
            return Step::Continue;
        }
        match (self.role, byte) {
            (TokenRole::Record, b':') => {
                self.record = self.token_str();
                self.token.clear();
                self.colon = true;
                self.state = State::PreToken;
                Step::Continue
            }
            (TokenRole::Record | TokenRole::Key, b'=') => {
                self.start_assignment(State::PreValue);
                Step::Continue
            }
            (TokenRole::Record | TokenRole::Key, b'(') => {
                self.start_assignment(State::ValueSpec);
                Step::Continue
            }
            (TokenRole::Record, b'\n' | b'\r' | b'#') if self.is_null_token() => {
                // bare `null` line: erase the default record
                self.token.clear();
                self.erase_record();
                self.step_pre_token(byte)
            }
            (TokenRole::Record, _) => Step::Fail(DecodeErrorKind::ExpectedTokenDelimiter),
            (TokenRole::Key, b'\n' | b'\r' | b'#') if self.is_null_token() => {
                self.token.clear();
                self.erase_record();
                self.step_pre_token(byte)
            }
            (TokenRole::Key, _) if self.is_null_token() && self.spaced => {
                self.token.clear();
                self.erase_record();
                self.step_pre_token(byte)
            }
            (TokenRole::Key, _) => Step::Fail(DecodeErrorKind::ExpectedAssignment),
        }
    }

    fn step_pre_value(&mut self, byte: u8) -> Step {
        match byte {
            b'\'' => {
                if let Some(len) = self.value_len {
                    self.remaining = len;
                }
                self.state = State::Value;
                Step::Continue
            }
            b'=' if self.value_len.is_some() && !self.equals => {
                self.equals = true;
                Step::Continue
            }
            _ if self.value_len.is_some() => Step::Fail(DecodeErrorKind::ExpectedValue),
            b'(' => {
                self.spec_digits = 0;
                self.state = State::ValueSpec;
                Step::Continue
            }
            b'n' => {
                self.null_matched = 1;
                self.state = State::NullValue;
                Step::Continue
            }
            _ => Step::Fail(DecodeErrorKind::ExpectedValueOrValueSpec),
        }
    }

    fn step_null_value(&mut self, byte: u8) -> Step {
        if NULL.get(self.null_matched) != Some(&byte) {
            return Step::Fail(DecodeErrorKind::ExpectedValue);
        }
        self.null_matched += 1;
        if self.null_matched == NULL.len() {
            self.null_matched = 0;
            self.apply(None);
            self.state = State::PostValue;
        }
        Step::Continue
    }

    fn step_value_spec(&mut self, byte: u8) -> Step {
        match byte {
            b'0'..=b'9' => {
                let digit = usize::from(byte - b'0');
                let len = self
                    .value_len
                    .unwrap_or(0)
                    .checked_mul(10)
                    .and_then(|n| n.checked_add(digit));
                match len {
                    Some(len) if len <= self.options.max_value_len => {
                        self.value_len = Some(len);
                        self.spec_digits += 1;
                        Step::Continue
                    }
                    _ => Step::Fail(DecodeErrorKind::InvalidValueSpec),
                }
            }
            b')' if self.spec_digits > 0 => {
                self.state = State::PreValue;
                Step::Continue
            }
            _ if self.spec_digits == 0 => Step::Fail(DecodeErrorKind::ExpectedValueSpec),
            _ => Step::Fail(DecodeErrorKind::InvalidValueSpec),
        }
    }

    fn step_value(&mut self, byte: u8) -> Step {
        if self.value_len.is_some() {
            if self.remaining > 0 {
                self.value.push(byte);
                self.remaining -= 1;
                return Step::Continue;
            }
            return if byte == b'\'' {
                self.finish_value()
            } else {
                Step::Fail(DecodeErrorKind::ExpectedValueDelimiter)
            };
        }
        if std::mem::take(&mut self.escape) {
            match byte {
                b'\\' => self.value.push(b'\\'),
                b'\'' => self.value.push(b'\''),
                b'n' => self.value.push(b'\n'),
                b'r' => self.value.push(b'\r'),
                b't' => self.value.push(b'\t'),
                b'0' => self.value.push(0),
                b'\n' => return Step::Fail(DecodeErrorKind::ExpectedValueDelimiter),
                other => {
                    // unknown escape, kept literally
                    self.value.push(b'\\');
                    self.value.push(other);
                }
            }
            return Step::Continue;
        }
        match byte {
            b'\\' => {
                self.escape = true;
                Step::Continue
            }
            b'\'' => self.finish_value(),
            b'\n' => Step::Fail(DecodeErrorKind::ExpectedValueDelimiter),
            _ => {
                self.value.push(byte);
                Step::Continue
            }
        }
    }

    fn finish_value(&mut self) -> Step {
        let value = String::from_utf8_lossy(&self.value).into_owned();
        self.apply(Some(&value));
        self.value.clear();
        self.value_len = None;
        self.state = State::PostValue;
        Step::Continue
    }

    fn step_post_value(&mut self, byte: u8) -> Step {
        match byte {
            b' ' | b'\t' => {
                self.state = State::PreToken;
                Step::Continue
            }
            b'\n' => self.end_line(),
            b'\r' => {
                self.state = State::Eol;
                Step::Continue
            }
            b'#' => {
                self.state = State::Comment;
                Step::Continue
            }
            _ => Step::Fail(DecodeErrorKind::ExpectedTokenDelimiter),
        }
    }
}
