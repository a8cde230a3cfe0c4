//! Connection text encoding.
//!
//! The connection encoding is fixed to UTF-8. Decoding is lossy: malformed
//! sequences become U+FFFD rather than failing a value that has already been
//! consumed from the wire.

use encoding_rs::UTF_8;

/// Decode bytes in the connection encoding.
#[must_use]
pub fn decode(bytes: &[u8]) -> String {
    let (text, _had_errors) = UTF_8.decode_without_bom_handling(bytes);
    text.into_owned()
}

/// Decode bytes in the connection encoding into characters.
#[must_use]
pub fn decode_chars(bytes: &[u8]) -> Vec<char> {
    let (text, _had_errors) = UTF_8.decode_without_bom_handling(bytes);
    text.chars().collect()
}

/// Encoded length of a character array.
///
/// Walks the whole array; callers computing lengths for a row should do so
/// once and cache the result.
#[must_use]
pub fn chars_byte_len(chars: &[char]) -> usize {
    chars.iter().map(|c| c.len_utf8()).sum()
}
