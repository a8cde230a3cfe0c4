//! Resumable writes of length-prefixed values.
//!
//! The encoded length `L` of a value is negotiated before writing starts (see
//! [`LengthCache`](crate::LengthCache)). Each step then takes one of these
//! paths:
//!
//! - **Direct**: `L` fits in the free space; append the value and finish.
//! - **Await drain**: `L` fits in the buffer but not in its free space; write
//!   nothing and ask the caller to drain.
//! - **Direct overflow** ([`DirectWrite`]): `L` exceeds the buffer; hand the
//!   encoded value to the caller to send on its own, bypassing the buffer.
//! - **Chunked encode** ([`EncodeWrite`]): `L` exceeds the buffer and the
//!   source has no cheap one-shot encoding; encode as much as fits per step,
//!   then flush the encoder's residual output.
//!
//! Abandoning a write part-way leaves a partial value on the wire. The
//! connection must then be treated as broken.

use bytes::Bytes;
use pgwire_codec::{Buffer, text};

use crate::encoder::CharEncoder;
use crate::error::TypeError;

/// Outcome of a write step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteStatus {
    /// The value has been written.
    Complete,
    /// Drain the buffer, then step again.
    Pending,
    /// Drain the buffer, send these bytes directly, then step again.
    Direct(Bytes),
}

impl WriteStatus {
    /// Whether the value has been written.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        matches!(self, Self::Complete)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DirectState {
    Start,
    HandedOff,
    Done,
}

/// Write state for a byte-like value whose encoding is already at hand.
#[derive(Debug)]
pub struct DirectWrite {
    data: Bytes,
    state: DirectState,
}

impl DirectWrite {
    /// Prepare to write already-encoded bytes.
    #[must_use]
    pub fn new(data: Bytes) -> Self {
        Self {
            data,
            state: DirectState::Start,
        }
    }

    /// Prepare to write a string in the connection encoding.
    #[must_use]
    pub fn from_string(s: String) -> Self {
        Self::new(Bytes::from(s.into_bytes()))
    }

    /// Encoded length of the value.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the value is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Advance the write.
    pub fn step(&mut self, buf: &mut Buffer) -> Result<WriteStatus, TypeError> {
        match self.state {
            DirectState::Start => {
                let len = self.data.len();
                if len <= buf.writable_bytes() {
                    buf.write_bytes(&self.data);
                    self.state = DirectState::Done;
                    tracing::trace!(len, "wrote value directly");
                    return Ok(WriteStatus::Complete);
                }

                if len <= buf.capacity() {
                    tracing::trace!(len, writable = buf.writable_bytes(), "awaiting drain");
                    return Ok(WriteStatus::Pending);
                }

                self.state = DirectState::HandedOff;
                tracing::trace!(len, capacity = buf.capacity(), "handing off direct write");
                Ok(WriteStatus::Direct(std::mem::take(&mut self.data)))
            }
            DirectState::HandedOff => {
                self.state = DirectState::Done;
                Ok(WriteStatus::Complete)
            }
            DirectState::Done => Err(TypeError::TransferFinished),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EncodeState {
    Start,
    Encoding,
    Flushing,
    Done,
}

/// Write state for a character array encoded chunk by chunk.
#[derive(Debug)]
pub struct EncodeWrite {
    chars: Vec<char>,
    len: usize,
    position: usize,
    encoder: CharEncoder,
    state: EncodeState,
}

impl EncodeWrite {
    /// Prepare to write `chars`, whose encoded length is `len`.
    ///
    /// `len` normally comes from the row's length cache.
    #[must_use]
    pub fn new(chars: Vec<char>, len: usize) -> Self {
        Self {
            chars,
            len,
            position: 0,
            encoder: CharEncoder::new(),
            state: EncodeState::Start,
        }
    }

    /// Prepare to write `chars`, computing the encoded length.
    #[must_use]
    pub fn from_chars(chars: Vec<char>) -> Self {
        let len = text::chars_byte_len(&chars);
        Self::new(chars, len)
    }

    /// Encoded length of the value.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the value is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Characters consumed by the encoder so far.
    #[must_use]
    pub fn position(&self) -> usize {
        self.position
    }

    /// Advance the write.
    pub fn step(&mut self, buf: &mut Buffer) -> Result<WriteStatus, TypeError> {
        if self.state == EncodeState::Start {
            if self.len <= buf.writable_bytes() {
                buf.write_chars(&self.chars);
                self.position = self.chars.len();
                self.state = EncodeState::Done;
                tracing::trace!(len = self.len, "wrote characters directly");
                return Ok(WriteStatus::Complete);
            }

            if self.len <= buf.capacity() {
                tracing::trace!(len = self.len, writable = buf.writable_bytes(), "awaiting drain");
                return Ok(WriteStatus::Pending);
            }

            tracing::trace!(len = self.len, capacity = buf.capacity(), "encoding in chunks");
            self.state = EncodeState::Encoding;
        }

        if self.state == EncodeState::Encoding {
            let (consumed, written) = self
                .encoder
                .encode(&self.chars[self.position..], buf.spare_mut());
            buf.commit(written);
            self.position += consumed;

            tracing::trace!(
                consumed,
                written,
                position = self.position,
                total = self.chars.len(),
                "encoded chunk"
            );

            if self.position < self.chars.len() {
                return Ok(WriteStatus::Pending);
            }
            self.state = EncodeState::Flushing;
        }

        match self.state {
            EncodeState::Flushing => {
                let (written, finished) = self.encoder.flush(buf.spare_mut());
                buf.commit(written);
                tracing::trace!(written, finished, "flushed encoder");

                if finished {
                    self.state = EncodeState::Done;
                    Ok(WriteStatus::Complete)
                } else {
                    Ok(WriteStatus::Pending)
                }
            }
            _ => Err(TypeError::TransferFinished),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_direct() {
        let mut buf = Buffer::new(16);
        let mut write = DirectWrite::from_string("hello".to_owned());

        assert_eq!(write.step(&mut buf).unwrap(), WriteStatus::Complete);
        assert_eq!(buf.readable(), b"hello");
    }

    #[test]
    fn test_exactly_capacity_is_direct() {
        let mut buf = Buffer::new(4);
        let mut write = DirectWrite::new(Bytes::from_static(b"abcd"));
        assert_eq!(write.step(&mut buf).unwrap(), WriteStatus::Complete);
        assert_eq!(buf.writable_bytes(), 0);
    }

    #[test]
    fn test_await_drain_writes_nothing() {
        let mut buf = Buffer::new(8);
        buf.write_bytes(b"12345");
        let mut write = DirectWrite::new(Bytes::from_static(b"abcd"));

        assert_eq!(write.step(&mut buf).unwrap(), WriteStatus::Pending);
        assert_eq!(buf.readable(), b"12345");

        buf.clear();
        assert_eq!(write.step(&mut buf).unwrap(), WriteStatus::Complete);
        assert_eq!(buf.readable(), b"abcd");
    }

    #[test]
    fn test_direct_overflow_hands_off_then_completes() {
        let mut buf = Buffer::new(4);
        let mut write = DirectWrite::from_string("too long".to_owned());

        let status = write.step(&mut buf).unwrap();
        assert_eq!(status, WriteStatus::Direct(Bytes::from_static(b"too long")));
        assert!(buf.is_empty());

        assert_eq!(write.step(&mut buf).unwrap(), WriteStatus::Complete);
        assert!(matches!(write.step(&mut buf), Err(TypeError::TransferFinished)));
    }

    #[test]
    fn test_encode_direct() {
        let mut buf = Buffer::new(16);
        let mut write = EncodeWrite::from_chars("aé世".chars().collect());
        assert_eq!(write.len(), 6);

        assert_eq!(write.step(&mut buf).unwrap(), WriteStatus::Complete);
        assert_eq!(buf.readable(), "aé世".as_bytes());
        assert!(matches!(write.step(&mut buf), Err(TypeError::TransferFinished)));
    }

    #[test]
    fn test_encode_await_drain() {
        let mut buf = Buffer::new(8);
        buf.write_bytes(b"xxxxx");
        let mut write = EncodeWrite::from_chars(vec!['a', 'b', 'c', 'd']);

        assert_eq!(write.step(&mut buf).unwrap(), WriteStatus::Pending);
        assert_eq!(write.position(), 0);
        assert_eq!(buf.readable_bytes(), 5);
    }

    #[test]
    fn test_chunked_encode_needs_final_flush() {
        // 'a' 'b' then a 3-byte character straddling the first chunk boundary.
        let chars = vec!['a', 'b', '世'];
        let mut buf = Buffer::new(3);
        let mut write = EncodeWrite::from_chars(chars.clone());
        assert_eq!(write.len(), 5);

        let mut sent = Vec::new();

        // The consume step takes every character but cannot emit all bytes.
        assert_eq!(write.step(&mut buf).unwrap(), WriteStatus::Pending);
        assert_eq!(write.position(), chars.len());
        sent.extend_from_slice(buf.readable());
        buf.clear();
        assert_eq!(sent.len(), 3);

        // The flush step emits the rest.
        assert_eq!(write.step(&mut buf).unwrap(), WriteStatus::Complete);
        sent.extend_from_slice(buf.readable());
        assert_eq!(sent, "ab世".as_bytes());
    }

    #[test]
    fn test_chunked_encode_many_steps() {
        let text = "é".repeat(10);
        let mut buf = Buffer::new(3);
        let mut write = EncodeWrite::from_chars(text.chars().collect());

        let mut sent = Vec::new();
        let mut steps = 0;
        loop {
            let status = write.step(&mut buf).unwrap();
            sent.extend_from_slice(buf.readable());
            buf.clear();
            steps += 1;
            if status.is_complete() {
                break;
            }
        }
        assert_eq!(sent, text.as_bytes());
        assert_eq!(steps, 7);
    }
}
