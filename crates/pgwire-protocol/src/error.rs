//! Protocol-level error types.

use thiserror::Error;

/// Errors raised while encoding or decoding wire primitives.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// A value does not fit in the fixed-width field it is written to.
    #[error("value too large: {len} bytes exceeds field width of {max}")]
    ValueTooLarge {
        /// Encoded length of the value.
        len: usize,
        /// Width of the target field.
        max: usize,
    },

    /// Fewer bytes are available than the primitive requires.
    #[error("unexpected end of data: need {needed} bytes, have {available}")]
    UnexpectedEof {
        /// Bytes needed.
        needed: usize,
        /// Bytes available.
        available: usize,
    },

    /// A null-terminated string ran off the end of the input.
    #[error("missing null terminator")]
    MissingTerminator,

    /// A string field was not valid UTF-8.
    #[error("invalid UTF-8 in string field")]
    InvalidUtf8,

    /// A hex-format bytea payload was malformed.
    #[error("invalid hex bytea: {0}")]
    InvalidHex(String),

    /// A format code other than 0 (text) or 1 (binary).
    #[error("invalid format code: {0}")]
    InvalidFormatCode(i16),
}
