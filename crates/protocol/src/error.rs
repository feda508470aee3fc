//! Encode error types.

use thiserror::Error;

/// Errors produced by the trace encoders.
///
/// Only [`EncodeError::Overflow`] is recoverable: the writer drops the
/// offending batch and keeps accepting appends. Every other variant means
/// the buffer state no longer matches what the encoder was told, which is a
/// programming or data-corruption error and must propagate.
#[derive(Debug, Error)]
pub enum EncodeError {
    /// Writing the batch would exceed the buffer's fixed capacity
    #[error("encode overflow: batch needs {needed} bytes, capacity is {capacity}")]
    Overflow { needed: usize, capacity: usize },

    /// Encoder invoked with a write offset that does not match the buffer
    #[error("offset mismatch: buffer length is {actual}, caller claims {expected}")]
    OffsetMismatch { expected: usize, actual: usize },
}

impl EncodeError {
    /// Create an overflow error
    #[inline]
    pub fn overflow(needed: usize, capacity: usize) -> Self {
        Self::Overflow { needed, capacity }
    }

    /// Check if this is a recoverable error (the batch is dropped and
    /// encoding continues)
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Overflow { .. })
    }
}
