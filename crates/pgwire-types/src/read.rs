//! Resumable reads of length-prefixed values.
//!
//! A value's byte length is known from its frame before any of its bytes are
//! read. [`ChunkedRead`] turns those bytes into a result in one of three
//! ways:
//!
//! - **Direct**: the whole value is already staged; decode it in place.
//! - **Await fill**: the value would fit in the buffer but has not fully
//!   arrived; consume nothing and ask the caller to refill.
//! - **Overflow**: the value is larger than the buffer; copy each staged piece
//!   into one allocation of exactly the value's length and decode once the
//!   last piece is in.
//!
//! Each step returns `Ok(None)` while more bytes are needed. The caller
//! refills the buffer from its transport and steps again. Dropping a read
//! part-way is always safe.

use bytes::Bytes;
use pgwire_codec::{Buffer, text};

use crate::error::TypeError;

/// Representation a value's bytes are decoded into.
pub trait ReadTarget: Sized {
    /// Decode bytes staged in the buffer.
    fn from_slice(bytes: &[u8]) -> Self;

    /// Decode a completed overflow allocation.
    fn from_overflow(bytes: Vec<u8>) -> Self {
        Self::from_slice(&bytes)
    }
}

impl ReadTarget for Bytes {
    fn from_slice(bytes: &[u8]) -> Self {
        Bytes::copy_from_slice(bytes)
    }

    fn from_overflow(bytes: Vec<u8>) -> Self {
        Bytes::from(bytes)
    }
}

impl ReadTarget for String {
    fn from_slice(bytes: &[u8]) -> Self {
        text::decode(bytes)
    }
}

impl ReadTarget for Vec<char> {
    fn from_slice(bytes: &[u8]) -> Self {
        text::decode_chars(bytes)
    }
}

#[derive(Debug)]
enum ReadState {
    Start,
    Overflow(Vec<u8>),
    Done,
}

/// Read state for one value.
#[derive(Debug)]
pub struct ChunkedRead<T> {
    len: usize,
    state: ReadState,
    _target: std::marker::PhantomData<fn() -> T>,
}

impl<T: ReadTarget> ChunkedRead<T> {
    /// Prepare to read a value of `len` bytes.
    #[must_use]
    pub fn new(len: usize) -> Self {
        Self {
            len,
            state: ReadState::Start,
            _target: std::marker::PhantomData,
        }
    }

    /// Declared length of the value.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the value is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Whether an overflow allocation is in use.
    #[must_use]
    pub fn is_overflow(&self) -> bool {
        matches!(self.state, ReadState::Overflow(_))
    }

    /// Bytes copied so far into the overflow allocation.
    #[must_use]
    pub fn bytes_read(&self) -> usize {
        match &self.state {
            ReadState::Overflow(data) => data.len(),
            ReadState::Done => self.len,
            ReadState::Start => 0,
        }
    }

    /// Advance the read.
    ///
    /// Returns the decoded value once complete and `None` while the caller
    /// must refill `buf`. Stepping a finished read is an error.
    pub fn step(&mut self, buf: &mut Buffer) -> Result<Option<T>, TypeError> {
        match std::mem::replace(&mut self.state, ReadState::Done) {
            ReadState::Start => {
                if self.len <= buf.readable_bytes() {
                    let value = T::from_slice(&buf.readable()[..self.len]);
                    buf.consume(self.len);
                    tracing::trace!(len = self.len, "read value directly");
                    return Ok(Some(value));
                }

                if self.len <= buf.capacity() {
                    tracing::trace!(
                        len = self.len,
                        readable = buf.readable_bytes(),
                        "awaiting fill"
                    );
                    self.state = ReadState::Start;
                    return Ok(None);
                }

                tracing::trace!(
                    len = self.len,
                    capacity = buf.capacity(),
                    "allocating overflow buffer"
                );
                self.overflow(Vec::with_capacity(self.len), buf)
            }
            ReadState::Overflow(data) => self.overflow(data, buf),
            ReadState::Done => Err(TypeError::TransferFinished),
        }
    }

    fn overflow(&mut self, mut data: Vec<u8>, buf: &mut Buffer) -> Result<Option<T>, TypeError> {
        let n = buf.readable_bytes().min(self.len - data.len());
        data.extend_from_slice(&buf.readable()[..n]);
        buf.consume(n);

        tracing::trace!(bytes = n, total = data.len(), len = self.len, "read overflow chunk");

        if data.len() == self.len {
            return Ok(Some(T::from_overflow(data)));
        }
        self.state = ReadState::Overflow(data);
        Ok(None)
    }
}

/// Discards a value of known length across refills.
#[derive(Debug)]
pub struct SkipTransfer {
    remaining: usize,
    finished: bool,
}

impl SkipTransfer {
    /// Prepare to skip `len` bytes.
    #[must_use]
    pub fn new(len: usize) -> Self {
        Self {
            remaining: len,
            finished: false,
        }
    }

    /// Bytes still to discard.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.remaining
    }

    /// Discard whatever part of the value is staged.
    ///
    /// Returns `Some(())` once the whole value has been discarded.
    pub fn step(&mut self, buf: &mut Buffer) -> Result<Option<()>, TypeError> {
        if self.finished {
            return Err(TypeError::TransferFinished);
        }

        let n = buf.readable_bytes().min(self.remaining);
        buf.consume(n);
        self.remaining -= n;

        if self.remaining == 0 {
            self.finished = true;
            return Ok(Some(()));
        }
        Ok(None)
    }
}
