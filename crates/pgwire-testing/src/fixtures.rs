//! Text fixtures.

/// Characters of every UTF-8 width, in width order.
pub const MIXED_WIDTHS: [char; 4] = ['a', 'é', '世', '🦀'];

/// `chars` characters cycling through one- to four-byte encodings.
#[must_use]
pub fn mixed_text(chars: usize) -> String {
    MIXED_WIDTHS.iter().copied().cycle().take(chars).collect()
}

/// `len` bytes of printable ASCII.
#[must_use]
pub fn ascii_text(len: usize) -> String {
    (b'!'..=b'~').cycle().take(len).map(char::from).collect()
}

/// `len` bytes covering every byte value.
#[must_use]
pub fn byte_pattern(len: usize) -> Vec<u8> {
    (0..=u8::MAX).cycle().take(len).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mixed_text_widths() {
        let text = mixed_text(8);
        assert_eq!(text.chars().count(), 8);
        assert_eq!(text.len(), 2 * (1 + 2 + 3 + 4));
    }

    #[test]
    fn test_ascii_text_len() {
        assert_eq!(ascii_text(5000).len(), 5000);
        assert!(ascii_text(200).is_ascii());
    }

    #[test]
    fn test_byte_pattern() {
        let bytes = byte_pattern(300);
        assert_eq!(bytes[255], 255);
        assert_eq!(bytes[256], 0);
    }
}
