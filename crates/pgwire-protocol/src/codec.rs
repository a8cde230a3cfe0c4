//! Codec utilities for wire primitives.
//!
//! Integers travel in network byte order (big-endian) regardless of host
//! endianness. Strings are UTF-8, either null-terminated or zero-padded to a
//! fixed width.

use bytes::{Buf, BufMut};

use crate::error::ProtocolError;

/// Conversion between host and network (big-endian) byte order.
///
/// Useful for binary payloads that are assembled by hand and must round-trip
/// identically on little- and big-endian hosts.
pub trait NetworkOrder: Copy {
    /// Convert a host-order value to network order.
    #[must_use]
    fn to_network(self) -> Self;

    /// Convert a network-order value to host order.
    #[must_use]
    fn from_network(self) -> Self;
}

macro_rules! impl_network_order {
    ($($ty:ty),* $(,)?) => {
        $(
            impl NetworkOrder for $ty {
                #[inline]
                fn to_network(self) -> Self {
                    self.to_be()
                }

                #[inline]
                fn from_network(self) -> Self {
                    <$ty>::from_be(self)
                }
            }
        )*
    };
}

impl_network_order!(i16, i32, i64, u16, u32, u64);

fn ensure_remaining(src: &impl Buf, needed: usize) -> Result<(), ProtocolError> {
    if src.remaining() < needed {
        return Err(ProtocolError::UnexpectedEof {
            needed,
            available: src.remaining(),
        });
    }
    Ok(())
}

/// Read a single byte.
pub fn read_u8(src: &mut impl Buf) -> Result<u8, ProtocolError> {
    ensure_remaining(src, 1)?;
    Ok(src.get_u8())
}

/// Read a big-endian 16-bit signed integer.
pub fn read_i16(src: &mut impl Buf) -> Result<i16, ProtocolError> {
    ensure_remaining(src, 2)?;
    Ok(src.get_i16())
}

/// Read a big-endian 32-bit signed integer.
pub fn read_i32(src: &mut impl Buf) -> Result<i32, ProtocolError> {
    ensure_remaining(src, 4)?;
    Ok(src.get_i32())
}

/// Read a big-endian 64-bit signed integer.
pub fn read_i64(src: &mut impl Buf) -> Result<i64, ProtocolError> {
    ensure_remaining(src, 8)?;
    Ok(src.get_i64())
}

/// Write a big-endian 16-bit signed integer.
pub fn write_i16(dst: &mut impl BufMut, value: i16) {
    dst.put_i16(value);
}

/// Write a big-endian 32-bit signed integer.
pub fn write_i32(dst: &mut impl BufMut, value: i32) {
    dst.put_i32(value);
}

/// Write a big-endian 64-bit signed integer.
pub fn write_i64(dst: &mut impl BufMut, value: i64) {
    dst.put_i64(value);
}

/// Read a null-terminated UTF-8 string.
///
/// The terminator is consumed but not included in the result. The string
/// must lie within the current contiguous chunk of `src`.
pub fn read_cstring(src: &mut impl Buf) -> Result<String, ProtocolError> {
    let end = src
        .chunk()
        .iter()
        .position(|&b| b == 0)
        .ok_or(ProtocolError::MissingTerminator)?;

    let bytes = src.copy_to_bytes(end);
    src.advance(1);

    String::from_utf8(bytes.to_vec()).map_err(|_| ProtocolError::InvalidUtf8)
}

/// Write a UTF-8 string followed by a zero byte.
pub fn write_cstring(dst: &mut impl BufMut, s: &str) {
    dst.put_slice(s.as_bytes());
    dst.put_u8(0);
}

/// Encoded length of a null-terminated string, terminator included.
#[must_use]
pub fn cstring_len(s: &str) -> usize {
    s.len() + 1
}

/// Write a string into a fixed-width field, zero-padding the remainder.
///
/// Fails with [`ProtocolError::ValueTooLarge`] before writing anything if the
/// string's UTF-8 length exceeds `width`.
pub fn write_fixed_str(dst: &mut impl BufMut, s: &str, width: usize) -> Result<(), ProtocolError> {
    let len = s.len();
    if len > width {
        return Err(ProtocolError::ValueTooLarge { len, max: width });
    }

    dst.put_slice(s.as_bytes());
    dst.put_bytes(0, width - len);
    Ok(())
}

/// Read a fixed-width zero-padded string, dropping the padding.
pub fn read_fixed_str(src: &mut impl Buf, width: usize) -> Result<String, ProtocolError> {
    ensure_remaining(src, width)?;

    let field = src.copy_to_bytes(width);
    let len = field.iter().position(|&b| b == 0).unwrap_or(width);

    String::from_utf8(field[..len].to_vec()).map_err(|_| ProtocolError::InvalidUtf8)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use bytes::{Bytes, BytesMut};

    #[test]
    fn test_integers_are_big_endian() {
        let mut buf = BytesMut::new();
        write_i16(&mut buf, 0x0102);
        write_i32(&mut buf, 0x0304_0506);
        write_i64(&mut buf, -2);

        assert_eq!(&buf[..6], &[0x01, 0x02, 0x03, 0x04, 0x05, 0x06]);
        assert_eq!(&buf[6..], &[0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFE]);

        let mut src = buf.freeze();
        assert_eq!(read_i16(&mut src).unwrap(), 0x0102);
        assert_eq!(read_i32(&mut src).unwrap(), 0x0304_0506);
        assert_eq!(read_i64(&mut src).unwrap(), -2);
    }

    #[test]
    fn test_short_integer_read() {
        let mut src = Bytes::from_static(&[0x00, 0x01, 0x02]);
        assert_eq!(
            read_i32(&mut src),
            Err(ProtocolError::UnexpectedEof {
                needed: 4,
                available: 3
            })
        );
        // Nothing consumed on failure.
        assert_eq!(read_u8(&mut src).unwrap(), 0x00);
    }

    #[test]
    fn test_network_order_round_trip() {
        let value: i32 = 0x1122_3344;
        let wire = value.to_network();
        assert_eq!(wire.to_ne_bytes(), [0x11, 0x22, 0x33, 0x44]);
        assert_eq!(wire.from_network(), value);

        let value: u16 = 0xABCD;
        assert_eq!(value.to_network().from_network(), value);
    }

    #[test]
    fn test_cstring() {
        let mut buf = BytesMut::new();
        write_cstring(&mut buf, "héllo");
        assert_eq!(buf.len(), cstring_len("héllo"));
        assert_eq!(buf[buf.len() - 1], 0);

        buf.put_slice(b"rest");
        let mut src = buf.freeze();
        assert_eq!(read_cstring(&mut src).unwrap(), "héllo");
        assert_eq!(&src[..], b"rest");
    }

    #[test]
    fn test_cstring_missing_terminator() {
        let mut src = Bytes::from_static(b"abc");
        assert_eq!(read_cstring(&mut src), Err(ProtocolError::MissingTerminator));
    }

    #[test]
    fn test_empty_cstring() {
        let mut src = Bytes::from_static(&[0]);
        assert_eq!(read_cstring(&mut src).unwrap(), "");
        assert!(src.is_empty());
    }

    #[test]
    fn test_fixed_str_padding() {
        let mut buf = BytesMut::new();
        write_fixed_str(&mut buf, "ab", 5).unwrap();
        assert_eq!(&buf[..], b"ab\0\0\0");

        let mut src = buf.freeze();
        assert_eq!(read_fixed_str(&mut src, 5).unwrap(), "ab");
        assert!(src.is_empty());
    }

    #[test]
    fn test_fixed_str_exact_width() {
        let mut buf = BytesMut::new();
        write_fixed_str(&mut buf, "abcd", 4).unwrap();
        assert_eq!(&buf[..], b"abcd");
    }

    #[test]
    fn test_fixed_str_too_large() {
        let mut buf = BytesMut::new();
        let result = write_fixed_str(&mut buf, "12345678", 4);
        assert_eq!(result, Err(ProtocolError::ValueTooLarge { len: 8, max: 4 }));
        assert!(buf.is_empty());
    }

    #[test]
    fn test_fixed_str_counts_bytes_not_chars() {
        let mut buf = BytesMut::new();
        // Two characters, four bytes.
        assert!(write_fixed_str(&mut buf, "éé", 3).is_err());
        assert!(write_fixed_str(&mut buf, "éé", 4).is_ok());
    }
}
