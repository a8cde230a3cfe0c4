//! Type handlers.
//!
//! A [`Handler`] is chosen once per column from the server's type name and is
//! itself stateless. Every transfer gets a fresh [`ReadOp`] or [`WriteOp`]
//! holding the per-value state, which is dropped when the value completes.
//!
//! Writing follows the row's two-pass protocol:
//!
//! 1. [`Handler::validate_and_get_length`] checks the value's kind and returns
//!    its encoded length, storing length-dependent sizes in the row's
//!    [`LengthCache`].
//! 2. [`Handler::prepare_write`] retrieves those sizes in the same order and
//!    builds the write state.
//!
//! A value is length-dependent when its size needs a scan or a formatting
//! pass: character arrays, text-format `bytea` and text-format integers.

use bytes::{Bytes, BytesMut};
use pgwire_codec::{Buffer, BufferConfig, text};
use pgwire_protocol::{FormatCode, codec, escape};

use crate::chars::CharAccessRead;
use crate::error::TypeError;
use crate::length_cache::LengthCache;
use crate::read::ChunkedRead;
use crate::value::WireValue;
use crate::write::{DirectWrite, EncodeWrite, WriteStatus};

/// Server type names and the handlers serving them.
const TYPE_NAMES: &[(&str, Handler)] = &[
    ("text", Handler::Text),
    ("varchar", Handler::Text),
    ("bpchar", Handler::Text),
    ("name", Handler::Text),
    ("citext", Handler::Text),
    ("json", Handler::Text),
    ("xml", Handler::Text),
    ("unknown", Handler::Text),
    ("bytea", Handler::Bytea),
    ("int2", Handler::Int2),
    ("smallint", Handler::Int2),
    ("int4", Handler::Int4),
    ("integer", Handler::Int4),
    ("int", Handler::Int4),
    ("int8", Handler::Int8),
    ("bigint", Handler::Int8),
];

/// The closed set of supported wire types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum Handler {
    /// Text and its aliases.
    Text,
    /// Binary strings.
    Bytea,
    /// 16-bit integer.
    Int2,
    /// 32-bit integer.
    Int4,
    /// 64-bit integer.
    Int8,
}

impl Handler {
    /// Look up the handler for a server type name, ignoring ASCII case.
    pub fn for_type_name(name: &str) -> Result<Self, TypeError> {
        TYPE_NAMES
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, handler)| *handler)
            .ok_or_else(|| TypeError::UnknownType(name.to_owned()))
    }

    /// Canonical server type name.
    #[must_use]
    pub fn type_name(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Bytea => "bytea",
            Self::Int2 => "int2",
            Self::Int4 => "int4",
            Self::Int8 => "int8",
        }
    }

    /// Check that `value` can be written and return its encoded length.
    ///
    /// Length-dependent values have their size stored in `cache` for
    /// [`prepare_write`](Self::prepare_write) to retrieve.
    pub fn validate_and_get_length(
        self,
        value: &WireValue,
        format: FormatCode,
        cache: &mut LengthCache,
    ) -> Result<usize, TypeError> {
        match (self, value) {
            (Self::Text, WireValue::Text(s)) => Ok(s.len()),
            (Self::Text, WireValue::Chars(chars)) => Ok(cache.set(text::chars_byte_len(chars))),
            (Self::Bytea, WireValue::Bytes(bytes)) => match format {
                FormatCode::Binary => Ok(bytes.len()),
                FormatCode::Text => Ok(cache.set(escape::HEX_PREFIX.len() + 2 * bytes.len())),
            },
            _ => {
                let v = self.integer(value).ok_or_else(|| self.unsupported(value))?;
                match format {
                    FormatCode::Binary => Ok(self.width()),
                    FormatCode::Text => Ok(cache.set(v.to_string().len())),
                }
            }
        }
    }

    /// Build the write state for a value that passed validation.
    pub fn prepare_write(
        self,
        value: WireValue,
        format: FormatCode,
        cache: &mut LengthCache,
    ) -> Result<WriteOp, TypeError> {
        let op = match (self, value) {
            (Self::Text, WireValue::Text(s)) => WriteOp::Direct(DirectWrite::from_string(s)),
            (Self::Text, WireValue::Chars(chars)) => {
                WriteOp::Encode(EncodeWrite::new(chars, cache.get()?))
            }
            (Self::Bytea, WireValue::Bytes(bytes)) => match format {
                FormatCode::Binary => WriteOp::Direct(DirectWrite::new(bytes)),
                FormatCode::Text => {
                    let mut out = BytesMut::with_capacity(cache.get()?);
                    escape::encode_hex(&bytes, &mut out);
                    WriteOp::Direct(DirectWrite::new(out.freeze()))
                }
            },
            (_, value) => {
                let v = self.integer(&value).ok_or_else(|| self.unsupported(&value))?;
                let encoded = match format {
                    FormatCode::Binary => self.encode_binary(v),
                    FormatCode::Text => {
                        let mut out = BytesMut::with_capacity(cache.get()?);
                        out.extend_from_slice(v.to_string().as_bytes());
                        out.freeze()
                    }
                };
                WriteOp::Direct(DirectWrite::new(encoded))
            }
        };

        tracing::trace!(handler = self.type_name(), len = op.len(), "prepared write");
        Ok(op)
    }

    /// Build the read state for a value of `len` bytes.
    pub fn prepare_read(self, len: usize, format: FormatCode) -> Result<ReadOp, TypeError> {
        let repr = match (self, format) {
            (Self::Text, _) => ReadRepr::Text(ChunkedRead::new(len)),
            (Self::Bytea, _) => ReadRepr::Bytes(ChunkedRead::new(len)),
            (_, FormatCode::Text) => ReadRepr::Text(ChunkedRead::new(len)),
            (_, FormatCode::Binary) => {
                if len != self.width() {
                    return Err(TypeError::LengthMismatch {
                        type_name: self.type_name(),
                        expected: self.width(),
                        actual: len,
                    });
                }
                ReadRepr::Bytes(ChunkedRead::new(len))
            }
        };

        tracing::trace!(handler = self.type_name(), len, ?format, "prepared read");
        Ok(ReadOp {
            handler: self,
            format,
            repr,
        })
    }

    /// Build a read state that decodes a text value into characters.
    pub fn prepare_read_chars(self, len: usize) -> Result<ChunkedRead<Vec<char>>, TypeError> {
        match self {
            Self::Text => Ok(ChunkedRead::new(len)),
            _ => Err(TypeError::UnsupportedValueType {
                handler: self.type_name(),
                actual: "chars",
            }),
        }
    }

    /// Build a read state for random-access character retrieval.
    ///
    /// The completed read yields a [`CharReader`](crate::CharReader) that
    /// decodes in windows of `config.char_window` bytes.
    pub fn prepare_read_char_access(
        self,
        len: usize,
        config: &BufferConfig,
    ) -> Result<CharAccessRead, TypeError> {
        match self {
            Self::Text => CharAccessRead::new(len, config),
            _ => Err(TypeError::UnsupportedValueType {
                handler: self.type_name(),
                actual: "chars",
            }),
        }
    }

    fn unsupported(self, value: &WireValue) -> TypeError {
        TypeError::UnsupportedValueType {
            handler: self.type_name(),
            actual: value.kind(),
        }
    }

    /// Integer value widened to 64 bits; narrower kinds are accepted by
    /// wider handlers.
    fn integer(self, value: &WireValue) -> Option<i64> {
        match (self, value) {
            (Self::Int2 | Self::Int4 | Self::Int8, WireValue::Int2(v)) => Some(i64::from(*v)),
            (Self::Int4 | Self::Int8, WireValue::Int4(v)) => Some(i64::from(*v)),
            (Self::Int8, WireValue::Int8(v)) => Some(*v),
            _ => None,
        }
    }

    /// Width of the binary integer representation.
    fn width(self) -> usize {
        match self {
            Self::Int2 => 2,
            Self::Int4 => 4,
            _ => 8,
        }
    }

    #[allow(clippy::cast_possible_truncation)]
    fn encode_binary(self, v: i64) -> Bytes {
        let mut out = BytesMut::with_capacity(self.width());
        match self {
            Self::Int2 => codec::write_i16(&mut out, v as i16),
            Self::Int4 => codec::write_i32(&mut out, v as i32),
            _ => codec::write_i64(&mut out, v),
        }
        out.freeze()
    }

    fn from_text(self, text: String) -> Result<WireValue, TypeError> {
        let invalid = |text: &str| TypeError::InvalidText {
            type_name: self.type_name(),
            text: text.to_owned(),
        };
        match self {
            Self::Int2 => text.parse().map(WireValue::Int2).map_err(|_| invalid(&text)),
            Self::Int4 => text.parse().map(WireValue::Int4).map_err(|_| invalid(&text)),
            Self::Int8 => text.parse().map(WireValue::Int8).map_err(|_| invalid(&text)),
            _ => Ok(WireValue::Text(text)),
        }
    }

    fn from_bytes(self, mut bytes: Bytes, format: FormatCode) -> Result<WireValue, TypeError> {
        match (self, format) {
            (Self::Int2, FormatCode::Binary) => Ok(WireValue::Int2(codec::read_i16(&mut bytes)?)),
            (Self::Int4, FormatCode::Binary) => Ok(WireValue::Int4(codec::read_i32(&mut bytes)?)),
            (Self::Int8, FormatCode::Binary) => Ok(WireValue::Int8(codec::read_i64(&mut bytes)?)),
            (_, FormatCode::Text) => Ok(WireValue::Bytes(Bytes::from(
                escape::decode_bytea_text(&bytes)?,
            ))),
            (_, FormatCode::Binary) => Ok(WireValue::Bytes(bytes)),
        }
    }
}

/// Write state for one value.
#[derive(Debug)]
pub enum WriteOp {
    /// The encoding is at hand.
    Direct(DirectWrite),
    /// Characters encoded chunk by chunk.
    Encode(EncodeWrite),
}

impl WriteOp {
    /// Encoded length of the value.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Direct(write) => write.len(),
            Self::Encode(write) => write.len(),
        }
    }

    /// Whether the value is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Advance the write.
    pub fn step(&mut self, buf: &mut Buffer) -> Result<WriteStatus, TypeError> {
        match self {
            Self::Direct(write) => write.step(buf),
            Self::Encode(write) => write.step(buf),
        }
    }
}

#[derive(Debug)]
enum ReadRepr {
    Bytes(ChunkedRead<Bytes>),
    Text(ChunkedRead<String>),
}

/// Read state for one value.
#[derive(Debug)]
pub struct ReadOp {
    handler: Handler,
    format: FormatCode,
    repr: ReadRepr,
}

impl ReadOp {
    /// Handler that prepared this read.
    #[must_use]
    pub fn handler(&self) -> Handler {
        self.handler
    }

    /// Advance the read; `None` means refill and step again.
    pub fn step(&mut self, buf: &mut Buffer) -> Result<Option<WireValue>, TypeError> {
        match &mut self.repr {
            ReadRepr::Text(read) => match read.step(buf)? {
                Some(text) => self.handler.from_text(text).map(Some),
                None => Ok(None),
            },
            ReadRepr::Bytes(read) => match read.step(buf)? {
                Some(bytes) => self.handler.from_bytes(bytes, self.format).map(Some),
                None => Ok(None),
            },
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn write_all(op: &mut WriteOp, buf: &mut Buffer) {
        assert_eq!(op.step(buf).unwrap(), WriteStatus::Complete);
    }

    #[test]
    fn test_type_name_lookup() {
        assert_eq!(Handler::for_type_name("varchar").unwrap(), Handler::Text);
        assert_eq!(Handler::for_type_name("BIGINT").unwrap(), Handler::Int8);
        assert_eq!(Handler::for_type_name("bytea").unwrap(), Handler::Bytea);
        assert!(matches!(
            Handler::for_type_name("point"),
            Err(TypeError::UnknownType(name)) if name == "point"
        ));
    }

    #[test]
    fn test_unsupported_value_type() {
        let mut cache = LengthCache::new();
        let err = Handler::Int4
            .validate_and_get_length(&WireValue::from("42"), FormatCode::Binary, &mut cache)
            .unwrap_err();
        assert!(matches!(
            err,
            TypeError::UnsupportedValueType {
                handler: "int4",
                actual: "text"
            }
        ));

        // Narrowing is never accepted.
        assert!(
            Handler::Int2
                .validate_and_get_length(&WireValue::Int4(1), FormatCode::Binary, &mut cache)
                .is_err()
        );
        assert!(cache.is_empty());
    }

    #[test]
    fn test_only_length_dependent_values_are_cached() {
        let mut cache = LengthCache::new();
        let text = WireValue::from("hello");
        let chars = WireValue::Chars("héllo".chars().collect());

        assert_eq!(
            Handler::Text
                .validate_and_get_length(&text, FormatCode::Text, &mut cache)
                .unwrap(),
            5
        );
        assert!(cache.is_empty());

        assert_eq!(
            Handler::Text
                .validate_and_get_length(&chars, FormatCode::Text, &mut cache)
                .unwrap(),
            6
        );
        assert_eq!(cache.len(), 1);

        let op = Handler::Text
            .prepare_write(chars, FormatCode::Text, &mut cache)
            .unwrap();
        assert_eq!(op.len(), 6);
        assert!(cache.is_exhausted());
    }

    #[test]
    fn test_prepare_write_without_validate_fails() {
        let mut cache = LengthCache::new();
        let err = Handler::Text
            .prepare_write(WireValue::Chars(vec!['a']), FormatCode::Text, &mut cache)
            .unwrap_err();
        assert!(matches!(err, TypeError::LengthNotCached { slot: 0 }));
    }

    #[test]
    fn test_binary_integers_widen_and_round_trip() {
        let mut cache = LengthCache::new();
        let mut buf = Buffer::new(16);

        let len = Handler::Int8
            .validate_and_get_length(&WireValue::Int4(-7), FormatCode::Binary, &mut cache)
            .unwrap();
        assert_eq!(len, 8);

        let mut op = Handler::Int8
            .prepare_write(WireValue::Int4(-7), FormatCode::Binary, &mut cache)
            .unwrap();
        write_all(&mut op, &mut buf);
        assert_eq!(buf.readable(), (-7i64).to_be_bytes());

        let mut read = Handler::Int8.prepare_read(8, FormatCode::Binary).unwrap();
        assert_eq!(read.step(&mut buf).unwrap(), Some(WireValue::Int8(-7)));
    }

    #[test]
    fn test_binary_integer_length_mismatch() {
        let err = Handler::Int2.prepare_read(4, FormatCode::Binary).unwrap_err();
        assert!(matches!(
            err,
            TypeError::LengthMismatch {
                type_name: "int2",
                expected: 2,
                actual: 4
            }
        ));
    }

    #[test]
    fn test_text_format_integers() {
        let mut cache = LengthCache::new();
        let mut buf = Buffer::new(16);
        let value = WireValue::Int4(-12345);

        let len = Handler::Int4
            .validate_and_get_length(&value, FormatCode::Text, &mut cache)
            .unwrap();
        assert_eq!(len, 6);

        let mut op = Handler::Int4
            .prepare_write(value.clone(), FormatCode::Text, &mut cache)
            .unwrap();
        write_all(&mut op, &mut buf);
        assert_eq!(buf.readable(), b"-12345");

        let mut read = Handler::Int4.prepare_read(len, FormatCode::Text).unwrap();
        assert_eq!(read.step(&mut buf).unwrap(), Some(value));
    }

    #[test]
    fn test_text_format_integer_rejects_garbage() {
        let mut buf = Buffer::new(8);
        buf.write_str("12a");
        let mut read = Handler::Int2.prepare_read(3, FormatCode::Text).unwrap();
        assert!(matches!(
            read.step(&mut buf),
            Err(TypeError::InvalidText { type_name: "int2", .. })
        ));
    }

    #[test]
    fn test_text_format_integer_rejects_padding() {
        let mut buf = Buffer::new(8);
        buf.write_str(" 12 ");
        let mut read = Handler::Int4.prepare_read(4, FormatCode::Text).unwrap();
        assert!(matches!(
            read.step(&mut buf),
            Err(TypeError::InvalidText { type_name: "int4", text }) if text == " 12 "
        ));
    }

    #[test]
    fn test_text_format_bytea_uses_hex() {
        let mut cache = LengthCache::new();
        let mut buf = Buffer::new(32);
        let value = WireValue::from(vec![0xDEu8, 0xAD, 0x00]);

        let len = Handler::Bytea
            .validate_and_get_length(&value, FormatCode::Text, &mut cache)
            .unwrap();
        assert_eq!(len, 8);

        let mut op = Handler::Bytea
            .prepare_write(value.clone(), FormatCode::Text, &mut cache)
            .unwrap();
        write_all(&mut op, &mut buf);
        assert_eq!(buf.readable(), b"\\xdead00");

        let mut read = Handler::Bytea.prepare_read(len, FormatCode::Text).unwrap();
        assert_eq!(read.step(&mut buf).unwrap(), Some(value));
    }

    #[test]
    fn test_text_format_bytea_reads_escape_form() {
        let mut buf = Buffer::new(32);
        buf.write_bytes(b"a\\\\b\\001");
        let mut read = Handler::Bytea.prepare_read(8, FormatCode::Text).unwrap();
        assert_eq!(
            read.step(&mut buf).unwrap(),
            Some(WireValue::from(b"a\\b\x01".to_vec()))
        );
    }

    #[test]
    fn test_read_chars_is_text_only() {
        assert!(Handler::Text.prepare_read_chars(3).is_ok());
        assert!(matches!(
            Handler::Bytea.prepare_read_chars(3),
            Err(TypeError::UnsupportedValueType {
                handler: "bytea",
                actual: "chars"
            })
        ));
    }

    #[test]
    fn test_char_access_uses_configured_window() {
        let config = BufferConfig::new().char_window(16);
        let mut buf = Buffer::new(8);
        buf.write_str("abcdef");

        let mut read = Handler::Text.prepare_read_char_access(6, &config).unwrap();
        let mut reader = read.step(&mut buf).unwrap().unwrap();
        assert_eq!(reader.window(), 16);

        let mut out = ['\0'; 2];
        assert_eq!(reader.get_chars(3, Some(&mut out)).unwrap(), 2);
        assert_eq!(out, ['d', 'e']);
    }

    #[test]
    fn test_char_access_is_text_only() {
        let config = BufferConfig::new();
        assert!(matches!(
            Handler::Int4.prepare_read_char_access(4, &config),
            Err(TypeError::UnsupportedValueType {
                handler: "int4",
                actual: "chars"
            })
        ));
    }
}
