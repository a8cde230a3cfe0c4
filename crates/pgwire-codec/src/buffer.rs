//! Fixed-capacity staging buffer.
//!
//! The buffer holds `capacity` bytes and two cursors with
//! `0 <= read_pos <= write_pos <= capacity`. Bytes in `read_pos..write_pos`
//! are staged and readable; bytes in `write_pos..capacity` are free.
//!
//! Every read and write requires the span to be available already. Asking for
//! more than is readable or writable is a caller bug and panics; codecs check
//! [`Buffer::readable_bytes`] and [`Buffer::writable_bytes`] first and hand
//! control back to the transport when they fall short.

use bytes::{Buf, Bytes};
use pgwire_protocol::ProtocolError;

use crate::text;

/// A fixed-capacity, rewindable byte staging area.
#[derive(Debug)]
pub struct Buffer {
    data: Box<[u8]>,
    read_pos: usize,
    write_pos: usize,
}

impl Buffer {
    /// Create an empty buffer of the given capacity.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "buffer capacity must be at least one byte");
        Self {
            data: vec![0; capacity].into_boxed_slice(),
            read_pos: 0,
            write_pos: 0,
        }
    }

    /// Total capacity in bytes.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Number of staged bytes not yet read.
    #[must_use]
    pub fn readable_bytes(&self) -> usize {
        self.write_pos - self.read_pos
    }

    /// Number of bytes that can be written without draining.
    #[must_use]
    pub fn writable_bytes(&self) -> usize {
        self.data.len() - self.write_pos
    }

    /// Whether no unread bytes are staged.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.read_pos == self.write_pos
    }

    /// The staged, unread bytes.
    #[must_use]
    pub fn readable(&self) -> &[u8] {
        &self.data[self.read_pos..self.write_pos]
    }

    /// Mark `n` staged bytes as read.
    ///
    /// # Panics
    ///
    /// Panics if fewer than `n` bytes are readable.
    pub fn consume(&mut self, n: usize) {
        self.assert_readable(n);
        self.read_pos += n;
        if self.read_pos == self.write_pos {
            self.clear();
        }
    }

    /// The free space after the staged bytes, for a transport to fill.
    pub fn spare_mut(&mut self) -> &mut [u8] {
        &mut self.data[self.write_pos..]
    }

    /// Mark `n` bytes of the free space as staged.
    ///
    /// # Panics
    ///
    /// Panics if fewer than `n` bytes are writable.
    pub fn commit(&mut self, n: usize) {
        self.assert_writable(n);
        self.write_pos += n;
    }

    /// Move the unread bytes to the front, maximising the free space.
    pub fn compact(&mut self) {
        if self.read_pos == 0 {
            return;
        }
        self.data.copy_within(self.read_pos..self.write_pos, 0);
        self.write_pos -= self.read_pos;
        self.read_pos = 0;
    }

    /// Discard everything staged.
    pub fn clear(&mut self) {
        self.read_pos = 0;
        self.write_pos = 0;
    }

    /// Discard `n` staged bytes. Alias of [`Buffer::consume`].
    pub fn skip(&mut self, n: usize) {
        self.consume(n);
    }

    /// Look at the next `n` staged bytes without consuming them.
    ///
    /// # Panics
    ///
    /// Panics if fewer than `n` bytes are readable.
    #[must_use]
    pub fn peek(&self, n: usize) -> &[u8] {
        self.assert_readable(n);
        &self.data[self.read_pos..self.read_pos + n]
    }

    /// Copy `dst.len()` staged bytes into `dst`.
    ///
    /// # Panics
    ///
    /// Panics if fewer than `dst.len()` bytes are readable.
    pub fn read_bytes_into(&mut self, dst: &mut [u8]) {
        dst.copy_from_slice(self.peek(dst.len()));
        self.consume(dst.len());
    }

    /// Read `n` staged bytes.
    ///
    /// # Panics
    ///
    /// Panics if fewer than `n` bytes are readable.
    pub fn read_bytes(&mut self, n: usize) -> Bytes {
        let bytes = Bytes::copy_from_slice(self.peek(n));
        self.consume(n);
        bytes
    }

    /// Decode `n` staged bytes as text in the connection encoding.
    ///
    /// # Panics
    ///
    /// Panics if fewer than `n` bytes are readable.
    pub fn read_string(&mut self, n: usize) -> String {
        let s = text::decode(self.peek(n));
        self.consume(n);
        s
    }

    /// Decode `n` staged bytes as characters in the connection encoding.
    ///
    /// # Panics
    ///
    /// Panics if fewer than `n` bytes are readable.
    pub fn read_chars(&mut self, n: usize) -> Vec<char> {
        let chars = text::decode_chars(self.peek(n));
        self.consume(n);
        chars
    }

    /// Read a single byte.
    ///
    /// # Panics
    ///
    /// Panics if no byte is readable.
    pub fn read_u8(&mut self) -> u8 {
        let value = self.peek(1)[0];
        self.consume(1);
        value
    }

    /// Read a big-endian 16-bit integer.
    ///
    /// # Panics
    ///
    /// Panics if fewer than 2 bytes are readable.
    pub fn read_i16(&mut self) -> i16 {
        let mut raw = [0; 2];
        self.read_bytes_into(&mut raw);
        i16::from_be_bytes(raw)
    }

    /// Read a big-endian 32-bit integer.
    ///
    /// # Panics
    ///
    /// Panics if fewer than 4 bytes are readable.
    pub fn read_i32(&mut self) -> i32 {
        let mut raw = [0; 4];
        self.read_bytes_into(&mut raw);
        i32::from_be_bytes(raw)
    }

    /// Read a big-endian 64-bit integer.
    ///
    /// # Panics
    ///
    /// Panics if fewer than 8 bytes are readable.
    pub fn read_i64(&mut self) -> i64 {
        let mut raw = [0; 8];
        self.read_bytes_into(&mut raw);
        i64::from_be_bytes(raw)
    }

    /// Read a null-terminated string from the staged bytes.
    ///
    /// Nothing is consumed if the terminator has not been staged yet.
    pub fn read_cstring(&mut self) -> Result<String, ProtocolError> {
        pgwire_protocol::codec::read_cstring(self)
    }

    /// Append bytes.
    ///
    /// # Panics
    ///
    /// Panics if fewer than `src.len()` bytes are writable.
    pub fn write_bytes(&mut self, src: &[u8]) {
        self.assert_writable(src.len());
        self.data[self.write_pos..self.write_pos + src.len()].copy_from_slice(src);
        self.write_pos += src.len();
    }

    /// Append a string in the connection encoding.
    ///
    /// # Panics
    ///
    /// Panics if the encoded string does not fit in the writable space.
    pub fn write_str(&mut self, s: &str) {
        self.write_bytes(s.as_bytes());
    }

    /// Append characters in the connection encoding.
    ///
    /// # Panics
    ///
    /// Panics if the encoded characters do not fit in the writable space.
    pub fn write_chars(&mut self, chars: &[char]) {
        self.assert_writable(text::chars_byte_len(chars));
        for ch in chars {
            let written = ch.encode_utf8(&mut self.data[self.write_pos..]).len();
            self.write_pos += written;
        }
    }

    /// Append a single byte.
    ///
    /// # Panics
    ///
    /// Panics if the buffer is full.
    pub fn write_u8(&mut self, value: u8) {
        self.write_bytes(&[value]);
    }

    /// Append a big-endian 16-bit integer.
    ///
    /// # Panics
    ///
    /// Panics if fewer than 2 bytes are writable.
    pub fn write_i16(&mut self, value: i16) {
        self.write_bytes(&value.to_be_bytes());
    }

    /// Append a big-endian 32-bit integer.
    ///
    /// # Panics
    ///
    /// Panics if fewer than 4 bytes are writable.
    pub fn write_i32(&mut self, value: i32) {
        self.write_bytes(&value.to_be_bytes());
    }

    /// Append a big-endian 64-bit integer.
    ///
    /// # Panics
    ///
    /// Panics if fewer than 8 bytes are writable.
    pub fn write_i64(&mut self, value: i64) {
        self.write_bytes(&value.to_be_bytes());
    }

    /// Append a null-terminated string.
    ///
    /// # Panics
    ///
    /// Panics if the string and its terminator do not fit.
    pub fn write_cstring(&mut self, s: &str) {
        self.assert_writable(pgwire_protocol::codec::cstring_len(s));
        self.write_bytes(s.as_bytes());
        self.write_u8(0);
    }

    /// Append a string zero-padded to `width` bytes.
    ///
    /// Fails with [`ProtocolError::ValueTooLarge`] without writing if the
    /// string is longer than `width`.
    ///
    /// # Panics
    ///
    /// Panics if fewer than `width` bytes are writable.
    pub fn write_fixed_str(&mut self, s: &str, width: usize) -> Result<(), ProtocolError> {
        if s.len() > width {
            return Err(ProtocolError::ValueTooLarge {
                len: s.len(),
                max: width,
            });
        }
        self.assert_writable(width);
        self.write_bytes(s.as_bytes());
        self.data[self.write_pos..self.write_pos + (width - s.len())].fill(0);
        self.write_pos += width - s.len();
        Ok(())
    }

    fn assert_readable(&self, n: usize) {
        assert!(
            n <= self.readable_bytes(),
            "read of {n} bytes with only {} readable",
            self.readable_bytes()
        );
    }

    fn assert_writable(&self, n: usize) {
        assert!(
            n <= self.writable_bytes(),
            "write of {n} bytes with only {} writable",
            self.writable_bytes()
        );
    }
}

impl Buf for Buffer {
    fn remaining(&self) -> usize {
        self.readable_bytes()
    }

    fn chunk(&self) -> &[u8] {
        self.readable()
    }

    fn advance(&mut self, cnt: usize) {
        self.consume(cnt);
    }
}
