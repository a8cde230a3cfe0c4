//! Type codec error types.

use pgwire_codec::CodecError;
use pgwire_protocol::ProtocolError;
use thiserror::Error;

/// Errors that can occur while transferring a value.
#[derive(Debug, Error)]
pub enum TypeError {
    /// The handler cannot encode a value of this kind.
    #[error("{handler} cannot write a {actual} value")]
    UnsupportedValueType {
        /// Server type name of the handler.
        handler: &'static str,
        /// Kind of the rejected value.
        actual: &'static str,
    },

    /// A character sub-range started past the end of the value.
    #[error("character offset {requested} is past the end of the value ({available} characters)")]
    IndexingFault {
        /// Requested start offset.
        requested: usize,
        /// Characters the value actually holds.
        available: usize,
    },

    /// A write pass asked for a length the validate pass never cached.
    #[error("no cached length for value {slot}")]
    LengthNotCached {
        /// Index of the value within the row.
        slot: usize,
    },

    /// A completed transfer was stepped again.
    #[error("transfer already finished")]
    TransferFinished,

    /// A fixed-width value arrived with the wrong length.
    #[error("{type_name} expects {expected} bytes, got {actual}")]
    LengthMismatch {
        /// Server type name.
        type_name: &'static str,
        /// Width of the binary representation.
        expected: usize,
        /// Declared length on the wire.
        actual: usize,
    },

    /// A text-format value could not be parsed.
    #[error("invalid {type_name} text: {text:?}")]
    InvalidText {
        /// Server type name.
        type_name: &'static str,
        /// The offending text.
        text: String,
    },

    /// A row supplied a different number of values than it has columns.
    #[error("row has {expected} columns, got {actual} values")]
    ColumnCountMismatch {
        /// Columns described for the row.
        expected: usize,
        /// Values supplied or announced.
        actual: usize,
    },

    /// No handler is registered for a server type name.
    #[error("unknown type: {0}")]
    UnknownType(String),

    /// Wire primitive error, including `ValueTooLarge`.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// Transport error, including `TransportExhausted`.
    #[error(transparent)]
    Codec(#[from] CodecError),
}
