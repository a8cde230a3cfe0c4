//! Buffered async stream.
//!
//! Pairs an async transport with a read buffer and a write buffer. The
//! refill/drain operations mirror [`Transport`](crate::Transport) so the same
//! value state machines can be driven over tokio IO.

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::buffer::Buffer;
use crate::config::BufferConfig;
use crate::error::CodecError;

/// An async transport with its staging buffers.
#[derive(Debug)]
pub struct BufferedStream<T> {
    io: T,
    read_buf: Buffer,
    write_buf: Buffer,
}

impl<T> BufferedStream<T>
where
    T: AsyncRead + AsyncWrite + Unpin,
{
    /// Wrap a transport using the default buffer sizes.
    pub fn new(io: T) -> Self {
        let config = BufferConfig::default();
        Self {
            io,
            read_buf: Buffer::new(config.read_capacity),
            write_buf: Buffer::new(config.write_capacity),
        }
    }

    /// Wrap a transport using the given buffer sizes.
    pub fn with_config(io: T, config: &BufferConfig) -> Result<Self, CodecError> {
        Ok(Self {
            io,
            read_buf: config.read_buffer()?,
            write_buf: config.write_buffer()?,
        })
    }

    /// The buffer incoming bytes are staged in.
    pub fn read_buffer(&self) -> &Buffer {
        &self.read_buf
    }

    /// Mutable access to the incoming buffer.
    pub fn read_buffer_mut(&mut self) -> &mut Buffer {
        &mut self.read_buf
    }

    /// The buffer outgoing bytes are staged in.
    pub fn write_buffer(&self) -> &Buffer {
        &self.write_buf
    }

    /// Mutable access to the outgoing buffer.
    pub fn write_buffer_mut(&mut self) -> &mut Buffer {
        &mut self.write_buf
    }

    /// Get a reference to the underlying transport.
    pub fn get_ref(&self) -> &T {
        &self.io
    }

    /// Consume the stream and return the underlying transport.
    ///
    /// Unsent bytes in the write buffer are discarded.
    pub fn into_inner(self) -> T {
        self.io
    }

    /// Stage more incoming bytes, compacting the read buffer first.
    ///
    /// Returns zero only if the read buffer is already full of unread bytes.
    pub async fn fill(&mut self) -> Result<usize, CodecError> {
        self.read_buf.compact();
        if self.read_buf.writable_bytes() == 0 {
            return Ok(0);
        }

        let n = self.io.read(self.read_buf.spare_mut()).await?;
        if n == 0 {
            return Err(CodecError::TransportExhausted {
                buffered: self.read_buf.readable_bytes(),
            });
        }
        self.read_buf.commit(n);

        tracing::trace!(bytes = n, readable = self.read_buf.readable_bytes(), "filled buffer");
        Ok(n)
    }

    /// Send every staged outgoing byte.
    pub async fn drain(&mut self) -> Result<(), CodecError> {
        if self.write_buf.is_empty() {
            return Ok(());
        }
        let n = self.write_buf.readable_bytes();
        self.io.write_all(self.write_buf.readable()).await?;
        self.write_buf.clear();

        tracing::trace!(bytes = n, "drained buffer");
        Ok(())
    }

    /// Send bytes that bypass the write buffer.
    ///
    /// Staged bytes are left alone; callers drain first so framing order is
    /// preserved, as with [`Transport::write_direct`](crate::Transport::write_direct).
    pub async fn write_direct(&mut self, bytes: &[u8]) -> Result<(), CodecError> {
        self.io.write_all(bytes).await?;

        tracing::trace!(bytes = bytes.len(), "wrote direct bytes");
        Ok(())
    }

    /// Drain the write buffer and flush the transport.
    pub async fn flush(&mut self) -> Result<(), CodecError> {
        self.drain().await?;
        self.io.flush().await?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tokio_test::io::Builder;

    #[test]
    fn test_fill_from_mock() {
        let mock = Builder::new().read(b"abc").read(b"def").build();
        let config = BufferConfig::new().capacity(4);
        let mut stream = BufferedStream::with_config(mock, &config).unwrap();

        tokio_test::block_on(async {
            assert_eq!(stream.fill().await.unwrap(), 3);
            stream.read_buffer_mut().consume(2);
            // Compaction leaves room for three more bytes.
            assert_eq!(stream.fill().await.unwrap(), 3);
            assert_eq!(stream.read_buffer().readable(), b"cdef");
        });
    }

    #[test]
    fn test_fill_at_end_of_stream() {
        let mock = Builder::new().build();
        let mut stream = BufferedStream::new(mock);

        let err = tokio_test::block_on(stream.fill()).unwrap_err();
        assert!(matches!(err, CodecError::TransportExhausted { buffered: 0 }));
    }

    #[test]
    fn test_drain_then_direct() {
        let mock = Builder::new().write(b"head").write(b"body").build();
        let mut stream = BufferedStream::new(mock);
        stream.write_buffer_mut().write_bytes(b"head");

        tokio_test::block_on(async {
            stream.drain().await.unwrap();
            stream.write_direct(b"body").await.unwrap();
            stream.flush().await.unwrap();
        });
        assert!(stream.write_buffer().is_empty());
    }

    #[test]
    fn test_direct_write_leaves_staged_bytes() {
        let mock = Builder::new().write(b"body").write(b"tail").build();
        let mut stream = BufferedStream::new(mock);
        stream.write_buffer_mut().write_bytes(b"tail");

        tokio_test::block_on(async {
            stream.write_direct(b"body").await.unwrap();
            assert_eq!(stream.write_buffer().readable(), b"tail");
            stream.flush().await.unwrap();
        });
    }
}
