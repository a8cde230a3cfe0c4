//! Text forms of `bytea`.
//!
//! Servers emit binary strings in text format either as hex (`\x` followed by
//! two hex digits per byte) or, for `bytea_output = 'escape'` and servers
//! older than 9.0, in the legacy escape form:
//!
//! - `\\` stands for a single backslash
//! - `\NNN` stands for the byte whose octal value is `NNN`
//! - any other byte stands for itself
//!
//! Escaped input is trusted: the decoders never fail, they copy anything that
//! does not match the grammar literally.

use bytes::BufMut;

use crate::error::ProtocolError;

const BACKSLASH: u8 = b'\\';

/// Prefix marking the hex form.
pub const HEX_PREFIX: &[u8] = b"\\x";

/// One step of the escape grammar: how many input bytes the token at the
/// front of `src` occupies and the byte it stands for.
fn next_token(src: &[u8]) -> (usize, u8) {
    match src {
        [BACKSLASH, BACKSLASH, ..] => (2, BACKSLASH),
        [BACKSLASH, a, b, c, ..]
            if a.is_ascii_digit() && b.is_ascii_digit() && c.is_ascii_digit() =>
        {
            let value = (u32::from(a - b'0') << 6) | (u32::from(b - b'0') << 3) | u32::from(c - b'0');
            // Digits 8 and 9 are accepted, so the value can exceed a byte.
            (4, value as u8)
        }
        [byte, ..] => (1, *byte),
        [] => (0, 0),
    }
}

/// Decode an escaped byte sequence into `dst`, returning the number of bytes
/// produced.
pub fn decode_escaped_into(src: &[u8], dst: &mut impl BufMut) -> usize {
    let mut pos = 0;
    let mut produced = 0;
    while pos < src.len() {
        let (consumed, byte) = next_token(&src[pos..]);
        dst.put_u8(byte);
        pos += consumed;
        produced += 1;
    }
    produced
}

/// Decode an escaped byte sequence.
#[must_use]
pub fn decode_escaped(src: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(src.len());
    decode_escaped_into(src, &mut out);
    out
}

/// Discard the first `count` decoded bytes of an escaped sequence.
///
/// Returns the number of *input* bytes those decoded bytes occupied. Stops
/// early if `src` runs out.
#[must_use]
pub fn skip_escaped(src: &[u8], count: usize) -> usize {
    let mut pos = 0;
    let mut skipped = 0;
    while skipped < count && pos < src.len() {
        let (consumed, _) = next_token(&src[pos..]);
        pos += consumed;
        skipped += 1;
    }
    pos
}

/// Number of bytes an escaped sequence decodes to.
#[must_use]
pub fn decoded_escaped_len(src: &[u8]) -> usize {
    let mut pos = 0;
    let mut len = 0;
    while pos < src.len() {
        pos += next_token(&src[pos..]).0;
        len += 1;
    }
    len
}

fn is_literal(byte: u8) -> bool {
    (0x20..0x7F).contains(&byte) && byte != BACKSLASH
}

/// Encode bytes in the legacy escape form.
pub fn encode_escaped(src: &[u8], dst: &mut impl BufMut) {
    for &byte in src {
        if is_literal(byte) {
            dst.put_u8(byte);
        } else if byte == BACKSLASH {
            dst.put_slice(b"\\\\");
        } else {
            dst.put_slice(&[
                BACKSLASH,
                b'0' + (byte >> 6),
                b'0' + ((byte >> 3) & 0o7),
                b'0' + (byte & 0o7),
            ]);
        }
    }
}

/// Length of the escape form of `src`.
#[must_use]
pub fn escaped_len(src: &[u8]) -> usize {
    src.iter()
        .map(|&b| match b {
            BACKSLASH => 2,
            b if is_literal(b) => 1,
            _ => 4,
        })
        .sum()
}

/// Decode the digits of a hex-form bytea (without the `\x` prefix).
pub fn decode_hex(src: &[u8]) -> Result<Vec<u8>, ProtocolError> {
    hex::decode(src).map_err(|e| ProtocolError::InvalidHex(e.to_string()))
}

/// Encode bytes in hex form, `\x` prefix included.
pub fn encode_hex(src: &[u8], dst: &mut impl BufMut) {
    dst.put_slice(HEX_PREFIX);
    dst.put_slice(hex::encode(src).as_bytes());
}

/// Decode a text-format bytea, choosing hex or escape form by its prefix.
pub fn decode_bytea_text(src: &[u8]) -> Result<Vec<u8>, ProtocolError> {
    match src.strip_prefix(HEX_PREFIX) {
        Some(digits) => decode_hex(digits),
        None => Ok(decode_escaped(src)),
    }
}
