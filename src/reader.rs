//! Timeout-bounded reads over a [`ByteSource`].
//!
//! A [`Reader`] turns a non-blocking byte source into the small set of
//! blocking primitives the feed grammars need: skip noise, match a literal
//! header, wait for a single byte, and collect bytes up to a delimiter.
//!
//! Every blocking primitive takes the caller's [`Clock`] and a [`Deadline`]
//! computed once when the record started. Bytes that are already available
//! are always taken before the deadline is checked. When a read ends in
//! [`ReadError::Timeout`] or [`ReadError::Mismatch`] the reader flushes its
//! source, so the next cycle starts on a clean boundary instead of in the
//! middle of a stale token.

use crate::error::ReadError;
use crate::source::ByteSource;
use crate::timer::{Clock, Deadline};

/// A byte source with deadline-bounded blocking reads.
#[derive(Debug)]
pub struct Reader<S> {
    source: S,
}

impl<S: ByteSource> Reader<S> {
    /// Wraps a byte source.
    pub fn new(source: S) -> Self {
        Self { source }
    }

    /// Borrows the underlying source.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Mutably borrows the underlying source.
    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    /// Returns the underlying source.
    pub fn into_inner(self) -> S {
        self.source
    }

    /// Discards everything currently buffered on the source.
    pub fn flush(&mut self) {
        self.source.flush_input();
    }

    fn abort<T>(&mut self, err: ReadError) -> Result<T, ReadError> {
        self.flush();
        Err(err)
    }

    /// Consumes bytes until one of `wanted` is at the front of the stream.
    ///
    /// Never blocks. Returns the wanted byte, left unconsumed, or `None` once
    /// the source has nothing more to offer. Skipped bytes are stream noise,
    /// not a framing error.
    pub fn skip_until(&mut self, wanted: &[u8]) -> Option<u8> {
        while self.source.available() > 0 {
            match self.source.peek() {
                Some(byte) if wanted.contains(&byte) => return Some(byte),
                Some(_) => {
                    let _ = self.source.read();
                }
                None => break,
            }
        }
        None
    }

    /// Waits for and consumes a single byte.
    pub fn read_byte<C: Clock>(&mut self, clock: &C, deadline: Deadline) -> Result<u8, ReadError> {
        loop {
            match self.source.read() {
                Ok(byte) => return Ok(byte),
                Err(nb::Error::WouldBlock) => {
                    if deadline.expired(clock) {
                        return self.abort(ReadError::Timeout);
                    }
                }
                Err(nb::Error::Other(_)) => return self.abort(ReadError::Mismatch),
            }
        }
    }

    /// Waits for a single byte without consuming it.
    pub fn peek_byte<C: Clock>(&mut self, clock: &C, deadline: Deadline) -> Result<u8, ReadError> {
        loop {
            if let Some(byte) = self.source.peek() {
                return Ok(byte);
            }
            if deadline.expired(clock) {
                return self.abort(ReadError::Timeout);
            }
        }
    }

    /// Reads and compares a fixed literal, byte by byte.
    pub fn expect_literal<C: Clock>(
        &mut self,
        clock: &C,
        deadline: Deadline,
        literal: &[u8],
    ) -> Result<(), ReadError> {
        for &expected in literal {
            if self.read_byte(clock, deadline)? != expected {
                return self.abort(ReadError::Mismatch);
            }
        }
        Ok(())
    }

    /// Collects bytes into `buf` until one of `delimiters` is read.
    ///
    /// The delimiter is consumed but not stored. Returns the number of bytes
    /// stored and the delimiter that ended the field. A non-delimiter byte
    /// arriving when `buf` is already full overflows the field and is reported
    /// as [`ReadError::Mismatch`].
    pub fn read_until<C: Clock>(
        &mut self,
        clock: &C,
        deadline: Deadline,
        delimiters: &[u8],
        buf: &mut [u8],
    ) -> Result<(usize, u8), ReadError> {
        let mut len = 0;
        loop {
            let byte = self.read_byte(clock, deadline)?;
            if delimiters.contains(&byte) {
                return Ok((len, byte));
            }
            match buf.get_mut(len) {
                Some(slot) => *slot = byte,
                None => return self.abort(ReadError::Mismatch),
            }
            len += 1;
        }
    }
}
