//! Codec error types.

use pgwire_protocol::ProtocolError;
use thiserror::Error;

/// Errors that can occur while moving bytes between a buffer and a transport.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The transport reported end of stream while a value still needed bytes.
    #[error("transport exhausted with {buffered} bytes buffered")]
    TransportExhausted {
        /// Unread bytes left in the buffer when the stream ended.
        buffered: usize,
    },

    /// IO error from the underlying transport.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Wire primitive error.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Buffer configuration error.
    #[error("buffer configuration error: {0}")]
    Configuration(String),
}
