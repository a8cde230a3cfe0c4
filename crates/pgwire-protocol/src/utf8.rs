//! UTF-8 character boundaries in partially received data.
//!
//! A value arriving in buffer-sized pieces can end in the middle of a
//! multi-byte character. These helpers tell whether a byte run ends on a
//! complete character and count characters without ever crediting a
//! character whose trailing bytes have not arrived yet.

/// Lead-byte mask and pattern for a sequence whose lead byte sits `n` bytes
/// before the last continuation byte (index `n - 1`).
const LEAD_PATTERNS: [(u8, u8); 3] = [
    (0b1110_0000, 0b1100_0000), // 2-byte sequence
    (0b1111_0000, 0b1110_0000), // 3-byte sequence
    (0b1111_1000, 0b1111_0000), // 4-byte sequence
];

#[inline]
fn is_continuation(byte: u8) -> bool {
    byte & 0b1100_0000 == 0b1000_0000
}

/// Whether `bytes[offset..offset + count]` ends on a complete character.
///
/// An empty run is complete. A run ending in ASCII is complete. A run ending
/// in a lead byte is not. A run ending in continuation bytes is complete only
/// if a lead byte of the matching width closes the sequence within the run.
///
/// # Panics
///
/// Panics if `offset + count` exceeds `bytes.len()`.
#[must_use]
pub fn is_complete_boundary(bytes: &[u8], offset: usize, count: usize) -> bool {
    if count == 0 {
        return true;
    }

    let run = &bytes[offset..offset + count];
    let last = run[count - 1];
    if last < 0x80 {
        return true;
    }
    if !is_continuation(last) {
        return false;
    }

    for (back, &(mask, lead)) in LEAD_PATTERNS.iter().enumerate() {
        let distance = back + 1;
        if distance >= count {
            return false;
        }
        let byte = run[count - 1 - distance];
        if byte & mask == lead {
            return true;
        }
        if !is_continuation(byte) {
            return false;
        }
    }

    false
}

/// Number of characters started within `bytes[offset..offset + count]`.
///
/// Every byte that is not a continuation byte begins a character, so a
/// trailing character whose remaining bytes are missing is still counted.
///
/// # Panics
///
/// Panics if `offset + count` exceeds `bytes.len()`.
#[must_use]
pub fn exact_char_count(bytes: &[u8], offset: usize, count: usize) -> usize {
    bytes[offset..offset + count]
        .iter()
        .filter(|&&b| !is_continuation(b))
        .count()
}

/// Character count that never includes an incomplete trailing character.
///
/// Equals [`exact_char_count`] once the run ends on a complete boundary and
/// is one less otherwise.
///
/// # Panics
///
/// Panics if `offset + count` exceeds `bytes.len()`.
#[must_use]
pub fn pessimistic_char_count(bytes: &[u8], offset: usize, count: usize) -> usize {
    let exact = exact_char_count(bytes, offset, count);
    if is_complete_boundary(bytes, offset, count) {
        exact
    } else {
        exact.saturating_sub(1)
    }
}

/// Length of the longest prefix of `bytes` that ends on a complete character.
///
/// Trims at most three trailing bytes. Runs that are malformed at the tail,
/// where no such prefix exists, are returned whole so a lossy decoder can
/// substitute them.
#[must_use]
pub fn complete_prefix_len(bytes: &[u8]) -> usize {
    let len = bytes.len();
    (0..=len.min(3))
        .map(|trim| len - trim)
        .find(|&prefix| is_complete_boundary(bytes, 0, prefix))
        .unwrap_or(len)
}
