//! Values carried by the codecs.

use bytes::Bytes;

/// A non-null value read from or written to the wire.
///
/// NULL is signalled by the framing layer's length sentinel and never reaches
/// the value codecs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WireValue {
    /// Text.
    Text(String),
    /// Text held as a character array.
    Chars(Vec<char>),
    /// Raw bytes.
    Bytes(Bytes),
    /// 16-bit integer.
    Int2(i16),
    /// 32-bit integer.
    Int4(i32),
    /// 64-bit integer.
    Int8(i64),
}

impl WireValue {
    /// Short name of the value's kind, for diagnostics.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::Chars(_) => "chars",
            Self::Bytes(_) => "bytes",
            Self::Int2(_) => "int2",
            Self::Int4(_) => "int4",
            Self::Int8(_) => "int8",
        }
    }

    /// Borrow as text if this is a text value.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Borrow as bytes if this is a byte value.
    #[must_use]
    pub fn as_bytes(&self) -> Option<&Bytes> {
        match self {
            Self::Bytes(b) => Some(b),
            _ => None,
        }
    }
}

impl From<String> for WireValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&str> for WireValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<Vec<char>> for WireValue {
    fn from(value: Vec<char>) -> Self {
        Self::Chars(value)
    }
}

impl From<Bytes> for WireValue {
    fn from(value: Bytes) -> Self {
        Self::Bytes(value)
    }
}

impl From<Vec<u8>> for WireValue {
    fn from(value: Vec<u8>) -> Self {
        Self::Bytes(Bytes::from(value))
    }
}

impl From<i16> for WireValue {
    fn from(value: i16) -> Self {
        Self::Int2(value)
    }
}

impl From<i32> for WireValue {
    fn from(value: i32) -> Self {
        Self::Int4(value)
    }
}

impl From<i64> for WireValue {
    fn from(value: i64) -> Self {
        Self::Int8(value)
    }
}
