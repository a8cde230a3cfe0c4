//! Random-access character retrieval.
//!
//! Byte-to-character decoding cannot seek, so [`CharReader`] keeps a
//! forward-only cursor into the value's character stream. Requests at or
//! after the cursor stream forward, skipping the gap. Requests before the
//! cursor restart from the first byte.
//!
//! Decoding proceeds in byte windows that are trimmed to end on a complete
//! character, so a window never splits a multi-byte sequence.

use bytes::Bytes;
use pgwire_codec::config::{DEFAULT_CHAR_WINDOW, MIN_CHAR_WINDOW};
use pgwire_codec::{Buffer, BufferConfig, text};
use pgwire_protocol::utf8::{complete_prefix_len, pessimistic_char_count};

use crate::error::TypeError;
use crate::read::ChunkedRead;

/// Serves arbitrary character sub-ranges of one text value.
#[derive(Debug)]
pub struct CharReader {
    bytes: Bytes,
    window: usize,
    byte_pos: usize,
    char_pos: usize,
    decoded: Vec<char>,
    decoded_pos: usize,
    restarts: usize,
}

impl CharReader {
    /// Create a reader over a value's encoded bytes.
    #[must_use]
    pub fn new(bytes: Bytes) -> Self {
        Self::with_window(bytes, DEFAULT_CHAR_WINDOW)
    }

    /// Create a reader that decodes `config.char_window` bytes at a time.
    pub fn with_config(bytes: Bytes, config: &BufferConfig) -> Result<Self, TypeError> {
        config.validate()?;
        Ok(Self::with_window(bytes, config.char_window))
    }

    /// Create a reader that decodes `window` bytes at a time.
    ///
    /// Windows smaller than one character are raised to four bytes.
    #[must_use]
    pub fn with_window(bytes: Bytes, window: usize) -> Self {
        Self {
            bytes,
            window: window.max(MIN_CHAR_WINDOW),
            byte_pos: 0,
            char_pos: 0,
            decoded: Vec::new(),
            decoded_pos: 0,
            restarts: 0,
        }
    }

    /// Bytes decoded per window.
    #[must_use]
    pub fn window(&self) -> usize {
        self.window
    }

    /// Index of the next character the cursor will deliver.
    #[must_use]
    pub fn position(&self) -> usize {
        self.char_pos
    }

    /// Number of times a backward request sent the cursor back to the start.
    #[must_use]
    pub fn restarts(&self) -> usize {
        self.restarts
    }

    /// Copy characters starting at `offset` into `output`.
    ///
    /// Returns the number of characters produced, which is less than
    /// `output.len()` only when the value ends first. With no output, returns
    /// the total number of characters in the value; this decodes everything
    /// after the cursor.
    pub fn get_chars(
        &mut self,
        offset: usize,
        output: Option<&mut [char]>,
    ) -> Result<usize, TypeError> {
        let Some(output) = output else {
            self.skip(usize::MAX);
            return Ok(self.char_pos);
        };

        if offset < self.char_pos {
            tracing::debug!(offset, position = self.char_pos, "restarting character cursor");
            self.restart();
        }

        let gap = offset - self.char_pos;
        let skipped = self.skip(gap);
        if skipped < gap {
            return Err(TypeError::IndexingFault {
                requested: offset,
                available: self.char_pos,
            });
        }

        let mut produced = 0;
        while produced < output.len() {
            if self.decoded_pos == self.decoded.len() && !self.decode_window() {
                break;
            }
            let n = (self.decoded.len() - self.decoded_pos).min(output.len() - produced);
            output[produced..produced + n]
                .copy_from_slice(&self.decoded[self.decoded_pos..self.decoded_pos + n]);
            self.decoded_pos += n;
            produced += n;
        }
        self.char_pos += produced;

        Ok(produced)
    }

    fn restart(&mut self) {
        self.byte_pos = 0;
        self.char_pos = 0;
        self.decoded.clear();
        self.decoded_pos = 0;
        self.restarts += 1;
    }

    /// Decode and discard up to `count` characters; returns how many were
    /// discarded.
    fn skip(&mut self, count: usize) -> usize {
        let mut skipped = 0;
        while skipped < count {
            let buffered = self.decoded.len() - self.decoded_pos;
            if buffered > 0 {
                let n = buffered.min(count - skipped);
                self.decoded_pos += n;
                skipped += n;
                continue;
            }

            // Whole windows of valid text are counted without materialising
            // their characters.
            let end = self.window_end();
            let window = &self.bytes[self.byte_pos..end];
            if window.is_empty() {
                break;
            }
            let chars = pessimistic_char_count(window, 0, window.len());
            if chars <= count - skipped && std::str::from_utf8(window).is_ok() {
                self.byte_pos = end;
                skipped += chars;
                continue;
            }

            if !self.decode_window() {
                break;
            }
        }
        self.char_pos += skipped;
        skipped
    }

    /// End of the next decode window, trimmed to a character boundary unless
    /// it reaches the end of the value.
    fn window_end(&self) -> usize {
        let end = (self.byte_pos + self.window).min(self.bytes.len());
        if end == self.bytes.len() {
            return end;
        }
        self.byte_pos + complete_prefix_len(&self.bytes[self.byte_pos..end])
    }

    /// Decode the next window into the character buffer. Returns false at
    /// the end of the value.
    fn decode_window(&mut self) -> bool {
        let end = self.window_end();
        if end == self.byte_pos {
            return false;
        }
        self.decoded = text::decode_chars(&self.bytes[self.byte_pos..end]);
        self.decoded_pos = 0;
        self.byte_pos = end;
        true
    }
}

/// Read state that collects a text value and then serves character
/// sub-ranges of it through a [`CharReader`].
#[derive(Debug)]
pub struct CharAccessRead {
    read: ChunkedRead<Bytes>,
    window: usize,
}

impl CharAccessRead {
    /// Prepare to read a value of `len` bytes, decoding it in windows of
    /// `config.char_window` bytes.
    pub fn new(len: usize, config: &BufferConfig) -> Result<Self, TypeError> {
        config.validate()?;
        Ok(Self {
            read: ChunkedRead::new(len),
            window: config.char_window,
        })
    }

    /// Advance the read; `None` means refill and step again.
    pub fn step(&mut self, buf: &mut Buffer) -> Result<Option<CharReader>, TypeError> {
        let window = self.window;
        Ok(self
            .read
            .step(buf)?
            .map(|bytes| CharReader::with_window(bytes, window)))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn reader(text: &str, window: usize) -> CharReader {
        CharReader::with_window(Bytes::copy_from_slice(text.as_bytes()), window)
    }

    #[test]
    fn test_configured_window_is_used() {
        let config = BufferConfig::new().char_window(64);
        let reader = CharReader::with_config(Bytes::from_static(b"abc"), &config).unwrap();
        assert_eq!(reader.window(), 64);

        assert_eq!(CharReader::new(Bytes::new()).window(), DEFAULT_CHAR_WINDOW);
    }

    #[test]
    fn test_invalid_window_config_is_rejected() {
        let config = BufferConfig::new().char_window(2);
        assert!(matches!(
            CharReader::with_config(Bytes::from_static(b"abc"), &config),
            Err(TypeError::Codec(pgwire_codec::CodecError::Configuration(_)))
        ));
    }

    #[test]
    fn test_char_access_read_across_fills() {
        let text = "héllo wörld";
        let config = BufferConfig::new().char_window(8);
        let mut read = CharAccessRead::new(text.len(), &config).unwrap();
        let mut buf = Buffer::new(32);

        buf.write_bytes(&text.as_bytes()[..5]);
        assert!(read.step(&mut buf).unwrap().is_none());
        buf.write_bytes(&text.as_bytes()[5..]);
        let mut reader = read.step(&mut buf).unwrap().unwrap();

        assert_eq!(reader.window(), 8);
        let mut out = ['\0'; 5];
        assert_eq!(reader.get_chars(6, Some(&mut out)).unwrap(), 5);
        assert_eq!(out.iter().collect::<String>(), "wörld");
    }

    #[test]
    fn test_sequential_reads() {
        let mut reader = reader("héllo wörld", 4);
        let mut out = ['\0'; 5];

        assert_eq!(reader.get_chars(0, Some(&mut out)).unwrap(), 5);
        assert_eq!(out.iter().collect::<String>(), "héllo");
        assert_eq!(reader.position(), 5);

        assert_eq!(reader.get_chars(5, Some(&mut out)).unwrap(), 5);
        assert_eq!(out.iter().collect::<String>(), " wörl");
    }

    #[test]
    fn test_forward_gap_is_skipped() {
        let mut reader = reader("0123456789", 4);
        let mut out = ['\0'; 2];
        assert_eq!(reader.get_chars(7, Some(&mut out)).unwrap(), 2);
        assert_eq!(out, ['7', '8']);
        assert_eq!(reader.position(), 9);
    }

    #[test]
    fn test_backward_request_restarts() {
        let text: String = (0..60).map(|i| char::from(b'a' + (i % 26) as u8)).collect();
        let mut reader = reader(&text, 8);
        let mut out = ['\0'; 10];

        reader.get_chars(40, Some(&mut out)).unwrap();
        assert_eq!(reader.position(), 50);

        // Offset 10 is behind the cursor at 50: the reader starts over.
        assert_eq!(reader.get_chars(10, Some(&mut out)).unwrap(), 10);
        assert_eq!(out.iter().collect::<String>(), &text[10..20]);
        assert_eq!(reader.position(), 20);
        assert_eq!(reader.restarts(), 1);
    }

    #[test]
    fn test_short_tail() {
        let mut reader = reader("abc", 4);
        let mut out = ['\0'; 10];
        assert_eq!(reader.get_chars(1, Some(&mut out)).unwrap(), 2);
        assert_eq!(&out[..2], &['b', 'c']);
    }

    #[test]
    fn test_offset_past_end_is_indexing_fault() {
        let mut reader = reader("abc", 4);
        let mut out = ['\0'; 1];
        assert!(matches!(
            reader.get_chars(5, Some(&mut out)),
            Err(TypeError::IndexingFault {
                requested: 5,
                available: 3
            })
        ));
    }

    #[test]
    fn test_offset_at_end_produces_nothing() {
        let mut reader = reader("abc", 4);
        let mut out = ['\0'; 1];
        assert_eq!(reader.get_chars(3, Some(&mut out)).unwrap(), 0);
    }

    #[test]
    fn test_length_only_request() {
        let mut reader = reader("a世🦀é", 4);
        assert_eq!(reader.get_chars(0, None).unwrap(), 4);

        // Reading after a length request restarts from the beginning.
        let mut out = ['\0'; 2];
        assert_eq!(reader.get_chars(1, Some(&mut out)).unwrap(), 2);
        assert_eq!(out, ['世', '🦀']);
    }

    #[test]
    fn test_length_after_partial_read() {
        let mut reader = reader("abcdef", 4);
        let mut out = ['\0'; 2];
        reader.get_chars(0, Some(&mut out)).unwrap();
        assert_eq!(reader.get_chars(0, None).unwrap(), 6);
    }

    #[test]
    fn test_multibyte_windows_never_split() {
        let text = "世界世界世界";
        let mut reader = reader(text, 4);
        let mut out = ['\0'; 6];
        assert_eq!(reader.get_chars(0, Some(&mut out)).unwrap(), 6);
        assert_eq!(out.iter().collect::<String>(), text);
    }

    proptest! {
        #[test]
        fn random_access_matches_linear_decode(
            text in "\\PC{0,80}",
            window in 4usize..32,
            requests in proptest::collection::vec((0usize..90, 0usize..12), 1..12),
        ) {
            let all: Vec<char> = text.chars().collect();
            let mut reader = reader(&text, window);

            for (offset, count) in requests {
                let mut out = vec!['\0'; count];
                let result = reader.get_chars(offset, Some(&mut out));
                if offset > all.len() {
                    let is_fault = matches!(result, Err(TypeError::IndexingFault { .. }));
                    prop_assert!(is_fault);
                    reader = CharReader::with_window(Bytes::copy_from_slice(text.as_bytes()), window);
                    continue;
                }
                let produced = result.unwrap();
                let expected = &all[offset..(offset + count).min(all.len())];
                prop_assert_eq!(&out[..produced], expected);
            }

            prop_assert_eq!(reader.get_chars(0, None).unwrap(), all.len());
        }
    }
}
