//! Blocking transport seam.
//!
//! Value codecs never perform IO. When a step reports that it needs more
//! staged bytes (reads) or more free space (writes), the caller uses a
//! [`Transport`] to refill or drain the buffer and then steps again.

use std::io::{ErrorKind, Read, Write};

use crate::buffer::Buffer;
use crate::error::CodecError;

/// Moves bytes between a [`Buffer`] and the network.
pub trait Transport {
    /// Stage more incoming bytes, compacting first to make room.
    ///
    /// Returns the number of bytes staged, which is zero only if the buffer
    /// was already full of unread bytes. End of stream is an error.
    fn fill(&mut self, buf: &mut Buffer) -> Result<usize, CodecError>;

    /// Send every staged byte and empty the buffer.
    fn drain(&mut self, buf: &mut Buffer) -> Result<(), CodecError>;

    /// Send bytes that bypass the buffer.
    ///
    /// Callers drain the buffer first so framing order is preserved.
    fn write_direct(&mut self, bytes: &[u8]) -> Result<(), CodecError>;
}

/// A [`Transport`] over any blocking `Read + Write` stream.
#[derive(Debug)]
pub struct IoTransport<S> {
    stream: S,
}

impl<S> IoTransport<S> {
    /// Wrap a stream.
    pub fn new(stream: S) -> Self {
        Self { stream }
    }

    /// Get a reference to the underlying stream.
    pub fn get_ref(&self) -> &S {
        &self.stream
    }

    /// Get a mutable reference to the underlying stream.
    pub fn get_mut(&mut self) -> &mut S {
        &mut self.stream
    }

    /// Consume the transport and return the underlying stream.
    pub fn into_inner(self) -> S {
        self.stream
    }
}

impl<S: Read + Write> IoTransport<S> {
    /// Drain the buffer and flush the underlying stream.
    pub fn flush(&mut self, buf: &mut Buffer) -> Result<(), CodecError> {
        self.drain(buf)?;
        self.stream.flush()?;
        Ok(())
    }
}

impl<S: Read + Write> Transport for IoTransport<S> {
    fn fill(&mut self, buf: &mut Buffer) -> Result<usize, CodecError> {
        buf.compact();
        if buf.writable_bytes() == 0 {
            return Ok(0);
        }

        loop {
            match self.stream.read(buf.spare_mut()) {
                Ok(0) => {
                    return Err(CodecError::TransportExhausted {
                        buffered: buf.readable_bytes(),
                    });
                }
                Ok(n) => {
                    buf.commit(n);
                    tracing::trace!(bytes = n, readable = buf.readable_bytes(), "filled buffer");
                    return Ok(n);
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
    }

    fn drain(&mut self, buf: &mut Buffer) -> Result<(), CodecError> {
        if buf.is_empty() {
            return Ok(());
        }
        let n = buf.readable_bytes();
        self.stream.write_all(buf.readable())?;
        buf.clear();
        tracing::trace!(bytes = n, "drained buffer");
        Ok(())
    }

    fn write_direct(&mut self, bytes: &[u8]) -> Result<(), CodecError> {
        self.stream.write_all(bytes)?;
        tracing::trace!(bytes = bytes.len(), "wrote direct bytes");
        Ok(())
    }
}
