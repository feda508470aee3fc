//! Trace encoders for the two wire-protocol versions.
//!
//! The writer owns exactly one encoder, selected when the protocol version
//! resolves and kept for its lifetime. Encoders append one trace batch at a
//! time into the shared buffer and never touch the reserved header region;
//! the final container payload is assembled by [`TraceEncoder::make_payload`]
//! at flush time.

mod compact;
mod legacy;

#[cfg(test)]
mod legacy_test;

pub use compact::CompactEncoder;
pub use legacy::LegacyEncoder;

use bytes::Bytes;

use crate::error::EncodeError;
use crate::span::TraceBatch;
use crate::version::ProtocolVersion;

/// Serializer for one wire-protocol version.
///
/// The buffer handed to [`encode`](Self::encode) always satisfies
/// `buf.len() == offset`; the encoder appends and returns the new offset.
/// On [`EncodeError::Overflow`] the encoder has already rolled the buffer
/// (and any internal state) back to where it was before the call.
pub trait TraceEncoder {
    /// Reset per-buffer encoder state. Called whenever the buffer is reset.
    fn init(&mut self);

    /// Serialize `batch` into `buf` starting at `offset`, staying within
    /// `capacity` bytes total.
    ///
    /// # Errors
    ///
    /// [`EncodeError::Overflow`] if the batch does not fit (recoverable);
    /// any other variant indicates a corrupted buffer and is fatal.
    fn encode(
        &mut self,
        buf: &mut Vec<u8>,
        offset: usize,
        capacity: usize,
        batch: &TraceBatch,
    ) -> Result<usize, EncodeError>;

    /// Build the final wire payload from the finalized container bytes.
    fn make_payload(&self, body: Bytes) -> Bytes;
}

/// Check the buffer/offset contract and roll back on overflow.
///
/// Shared tail of both encoders: `encode` appends freely, then this settles
/// whether the write stays.
fn settle(buf: &mut Vec<u8>, offset: usize, capacity: usize) -> Result<usize, EncodeError> {
    if buf.len() > capacity {
        let needed = buf.len();
        buf.truncate(offset);
        return Err(EncodeError::overflow(needed, capacity));
    }
    Ok(buf.len())
}

fn check_offset(buf: &[u8], offset: usize) -> Result<(), EncodeError> {
    if buf.len() != offset {
        return Err(EncodeError::OffsetMismatch {
            expected: offset,
            actual: buf.len(),
        });
    }
    Ok(())
}

/// Encoder for the resolved protocol version.
///
/// Tagged variant over the two concrete encoders so the writer can hold one
/// by value without a box at the seam.
#[derive(Debug)]
pub enum ProtocolEncoder {
    /// Legacy v1 map encoding
    Legacy(LegacyEncoder),
    /// Compact v2 string-table encoding
    Compact(CompactEncoder),
}

impl ProtocolEncoder {
    /// Create the encoder for a resolved protocol version
    pub fn for_version(version: ProtocolVersion) -> Self {
        match version {
            ProtocolVersion::V1 => Self::Legacy(LegacyEncoder::new()),
            ProtocolVersion::V2 => Self::Compact(CompactEncoder::new()),
        }
    }

    /// The protocol version this encoder serializes
    pub fn version(&self) -> ProtocolVersion {
        match self {
            Self::Legacy(_) => ProtocolVersion::V1,
            Self::Compact(_) => ProtocolVersion::V2,
        }
    }
}

impl TraceEncoder for ProtocolEncoder {
    fn init(&mut self) {
        match self {
            Self::Legacy(e) => e.init(),
            Self::Compact(e) => e.init(),
        }
    }

    fn encode(
        &mut self,
        buf: &mut Vec<u8>,
        offset: usize,
        capacity: usize,
        batch: &TraceBatch,
    ) -> Result<usize, EncodeError> {
        match self {
            Self::Legacy(e) => e.encode(buf, offset, capacity, batch),
            Self::Compact(e) => e.encode(buf, offset, capacity, batch),
        }
    }

    fn make_payload(&self, body: Bytes) -> Bytes {
        match self {
            Self::Legacy(e) => e.make_payload(body),
            Self::Compact(e) => e.make_payload(body),
        }
    }
}
