//! Value format codes.

use crate::error::ProtocolError;

/// Representation of a value on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(i16)]
pub enum FormatCode {
    /// Textual representation.
    #[default]
    Text = 0,
    /// Binary representation.
    Binary = 1,
}

impl FormatCode {
    /// Create a format code from its wire value.
    pub fn from_i16(value: i16) -> Result<Self, ProtocolError> {
        match value {
            0 => Ok(Self::Text),
            1 => Ok(Self::Binary),
            _ => Err(ProtocolError::InvalidFormatCode(value)),
        }
    }

    /// The wire value of this format code.
    #[must_use]
    pub fn as_i16(self) -> i16 {
        self as i16
    }
}
