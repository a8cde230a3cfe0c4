//! In-memory scripted transport.

use pgwire_codec::{Buffer, CodecError, Transport};

/// A [`Transport`] that serves a fixed byte script and records what is sent.
///
/// Fills are capped at `max_fill` bytes so tests can force values to arrive
/// in small pieces. Drains and direct writes are appended to one output in
/// the order they happen.
#[derive(Debug, Clone)]
pub struct ScriptedTransport {
    incoming: Vec<u8>,
    read_pos: usize,
    max_fill: usize,
    written: Vec<u8>,
    fills: usize,
    drains: usize,
    direct_writes: usize,
}

impl ScriptedTransport {
    /// Serve `incoming` with unbounded fills.
    #[must_use]
    pub fn new(incoming: Vec<u8>) -> Self {
        Self {
            incoming,
            read_pos: 0,
            max_fill: usize::MAX,
            written: Vec::new(),
            fills: 0,
            drains: 0,
            direct_writes: 0,
        }
    }

    /// A transport with nothing to read, for write-side tests.
    #[must_use]
    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    /// Cap every fill at `max_fill` bytes.
    ///
    /// # Panics
    ///
    /// Panics if `max_fill` is zero.
    #[must_use]
    pub fn with_max_fill(mut self, max_fill: usize) -> Self {
        assert!(max_fill > 0, "max_fill must be at least one byte");
        self.max_fill = max_fill;
        self
    }

    /// A transport that serves everything written so far.
    #[must_use]
    pub fn replay(&self) -> Self {
        Self::new(self.written.clone())
    }

    /// Bytes sent through drains and direct writes.
    #[must_use]
    pub fn written(&self) -> &[u8] {
        &self.written
    }

    /// Incoming bytes not yet staged.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.incoming.len() - self.read_pos
    }

    /// Number of fills that staged bytes.
    #[must_use]
    pub fn fills(&self) -> usize {
        self.fills
    }

    /// Number of drains that sent bytes.
    #[must_use]
    pub fn drains(&self) -> usize {
        self.drains
    }

    /// Number of direct writes.
    #[must_use]
    pub fn direct_writes(&self) -> usize {
        self.direct_writes
    }
}

impl Transport for ScriptedTransport {
    fn fill(&mut self, buf: &mut Buffer) -> Result<usize, CodecError> {
        buf.compact();
        if buf.writable_bytes() == 0 {
            return Ok(0);
        }

        let n = buf
            .writable_bytes()
            .min(self.max_fill)
            .min(self.remaining());
        if n == 0 {
            return Err(CodecError::TransportExhausted {
                buffered: buf.readable_bytes(),
            });
        }

        buf.write_bytes(&self.incoming[self.read_pos..self.read_pos + n]);
        self.read_pos += n;
        self.fills += 1;
        tracing::trace!(bytes = n, remaining = self.remaining(), "scripted fill");
        Ok(n)
    }

    fn drain(&mut self, buf: &mut Buffer) -> Result<(), CodecError> {
        if buf.is_empty() {
            return Ok(());
        }
        self.written.extend_from_slice(buf.readable());
        buf.clear();
        self.drains += 1;
        Ok(())
    }

    fn write_direct(&mut self, bytes: &[u8]) -> Result<(), CodecError> {
        self.written.extend_from_slice(bytes);
        self.direct_writes += 1;
        Ok(())
    }
}
