//! Per-row cache of encoded value lengths.
//!
//! Writing a row is two passes over its values. The validate pass computes
//! each length-dependent value's encoded size with [`LengthCache::set`]; the
//! write pass reads the same sizes back, in the same order, with
//! [`LengthCache::get`]. Sizes such as the UTF-8 length of a character array
//! are therefore computed once.
//!
//! A cache belongs to one row and is dropped once the row is written.

use crate::error::TypeError;

/// Ordered, write-once slots of encoded lengths.
#[derive(Debug, Default, Clone)]
pub struct LengthCache {
    slots: Vec<Option<usize>>,
    next_get: usize,
}

impl LengthCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a cache with room for `values` lengths.
    #[must_use]
    pub fn with_capacity(values: usize) -> Self {
        Self {
            slots: Vec::with_capacity(values),
            next_get: 0,
        }
    }

    /// Store the next value's length and return it.
    pub fn set(&mut self, len: usize) -> usize {
        self.slots.push(Some(len));
        len
    }

    /// Retrieve the next cached length, in the order they were set.
    ///
    /// Asking for a slot the validate pass has not populated is a contract
    /// violation reported as [`TypeError::LengthNotCached`].
    pub fn get(&mut self) -> Result<usize, TypeError> {
        let slot = self.next_get;
        let len = self
            .slots
            .get(slot)
            .copied()
            .flatten()
            .ok_or(TypeError::LengthNotCached { slot })?;
        self.next_get += 1;
        Ok(len)
    }

    /// Number of populated slots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether no slot has been populated.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Whether every populated slot has been read back.
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.next_get == self.slots.len()
    }
}
