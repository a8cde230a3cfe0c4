//! Buffer configuration.

use crate::buffer::Buffer;
use crate::error::CodecError;

/// Default read and write buffer capacity.
pub const DEFAULT_BUFFER_SIZE: usize = 8192;

/// Smallest accepted buffer capacity.
pub const MIN_BUFFER_SIZE: usize = 1;

/// Largest accepted buffer capacity (1 GiB, the largest value a row can hold).
pub const MAX_BUFFER_SIZE: usize = 1 << 30;

/// Default byte window for random-access character decoding.
pub const DEFAULT_CHAR_WINDOW: usize = 4096;

/// Smallest window that always holds a complete UTF-8 character.
pub const MIN_CHAR_WINDOW: usize = 4;

/// Sizes of the per-connection staging buffers.
///
/// This struct is marked `#[non_exhaustive]` to allow adding new fields
/// in future minor versions without breaking changes. Use the builder
/// pattern methods or [`Default::default()`] to construct instances.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub struct BufferConfig {
    /// Capacity of the buffer incoming bytes are staged in.
    pub read_capacity: usize,

    /// Capacity of the buffer outgoing bytes are staged in.
    pub write_capacity: usize,

    /// Bytes decoded per step when serving character sub-ranges of a value.
    pub char_window: usize,
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            read_capacity: DEFAULT_BUFFER_SIZE,
            write_capacity: DEFAULT_BUFFER_SIZE,
            char_window: DEFAULT_CHAR_WINDOW,
        }
    }
}

impl BufferConfig {
    /// Create a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the read buffer capacity.
    #[must_use]
    pub fn read_capacity(mut self, capacity: usize) -> Self {
        self.read_capacity = capacity;
        self
    }

    /// Set the write buffer capacity.
    #[must_use]
    pub fn write_capacity(mut self, capacity: usize) -> Self {
        self.write_capacity = capacity;
        self
    }

    /// Set both buffer capacities.
    #[must_use]
    pub fn capacity(self, capacity: usize) -> Self {
        self.read_capacity(capacity).write_capacity(capacity)
    }

    /// Set the character decoding window.
    #[must_use]
    pub fn char_window(mut self, window: usize) -> Self {
        self.char_window = window;
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), CodecError> {
        for (name, capacity) in [
            ("read_capacity", self.read_capacity),
            ("write_capacity", self.write_capacity),
        ] {
            if !(MIN_BUFFER_SIZE..=MAX_BUFFER_SIZE).contains(&capacity) {
                tracing::debug!(field = name, capacity, "rejected buffer capacity");
                return Err(CodecError::Configuration(format!(
                    "{name} must be between {MIN_BUFFER_SIZE} and {MAX_BUFFER_SIZE}, got {capacity}"
                )));
            }
        }

        if self.char_window < MIN_CHAR_WINDOW {
            tracing::debug!(window = self.char_window, "rejected char window");
            return Err(CodecError::Configuration(format!(
                "char_window must be at least {MIN_CHAR_WINDOW}, got {}",
                self.char_window
            )));
        }

        Ok(())
    }

    /// Build the read buffer.
    pub fn read_buffer(&self) -> Result<Buffer, CodecError> {
        self.validate()?;
        Ok(Buffer::new(self.read_capacity))
    }

    /// Build the write buffer.
    pub fn write_buffer(&self) -> Result<Buffer, CodecError> {
        self.validate()?;
        Ok(Buffer::new(self.write_capacity))
    }
}
