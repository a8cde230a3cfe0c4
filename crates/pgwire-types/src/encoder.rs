//! Stateful character encoder for chunked writes.

use encoding_rs::{CoderResult, Encoder, UTF_8};

/// Encodes a character array into whatever output space is available.
///
/// A character whose encoding does not fit in the remaining output is still
/// consumed; its leftover bytes stay pending inside the encoder and are
/// emitted by later calls. Consuming the last character therefore does not
/// mean every byte has been produced: [`CharEncoder::flush`] must be called
/// until it reports completion.
pub struct CharEncoder {
    encoder: Encoder,
    pending: Vec<u8>,
    pending_pos: usize,
    finalized: bool,
}

impl std::fmt::Debug for CharEncoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CharEncoder")
            .field("pending", &self.pending_len())
            .field("finalized", &self.finalized)
            .finish()
    }
}

impl Default for CharEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl CharEncoder {
    /// Create an encoder for the connection encoding.
    #[must_use]
    pub fn new() -> Self {
        Self {
            encoder: UTF_8.new_encoder(),
            pending: Vec::with_capacity(16),
            pending_pos: 0,
            finalized: false,
        }
    }

    /// Bytes produced but not yet emitted.
    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.pending.len() - self.pending_pos
    }

    /// Encode from `src` into `dst`.
    ///
    /// Returns `(characters consumed, bytes written)`.
    pub fn encode(&mut self, src: &[char], dst: &mut [u8]) -> (usize, usize) {
        let mut written = self.emit_pending(dst);
        let mut consumed = 0;

        while written < dst.len() && consumed < src.len() {
            let mut utf8 = [0; 4];
            let s = src[consumed].encode_utf8(&mut utf8);
            self.produce(s, false);
            consumed += 1;
            written += self.emit_pending(&mut dst[written..]);
        }

        (consumed, written)
    }

    /// Emit the encoder's final output after all input has been consumed.
    ///
    /// Returns `(bytes written, finished)`. Call again with fresh space until
    /// `finished` is true.
    pub fn flush(&mut self, dst: &mut [u8]) -> (usize, bool) {
        if !self.finalized {
            self.produce("", true);
            self.finalized = true;
        }
        let written = self.emit_pending(dst);
        (written, self.pending_len() == 0)
    }

    fn produce(&mut self, mut src: &str, last: bool) {
        if self.pending_pos == self.pending.len() {
            self.pending.clear();
            self.pending_pos = 0;
        }

        let mut scratch = [0; 16];
        loop {
            let (result, read, written, _had_replacements) =
                self.encoder.encode_from_utf8(src, &mut scratch, last);
            self.pending.extend_from_slice(&scratch[..written]);
            src = &src[read..];
            match result {
                CoderResult::InputEmpty => break,
                CoderResult::OutputFull => continue,
            }
        }
    }

    fn emit_pending(&mut self, dst: &mut [u8]) -> usize {
        let n = self.pending_len().min(dst.len());
        dst[..n].copy_from_slice(&self.pending[self.pending_pos..self.pending_pos + n]);
        self.pending_pos += n;
        n
    }
}
