//! Fixed-capacity encode buffer.
//!
//! One buffer generation lives from reset to reset: traces accumulate
//! behind the reserved container header until a flush finalizes the region
//! and moves it out. The moved-out payload is independent of the next
//! generation, so an in-flight send never aliases live writes.

use bytes::Bytes;

use tracewire_protocol::msgpack::{write_container_header, CONTAINER_HEADER_LEN};
use tracewire_protocol::{EncodeError, ProtocolEncoder, TraceBatch, TraceEncoder};

/// Initial allocation for a fresh buffer generation; grows on demand up to
/// the configured capacity.
const INITIAL_RESERVE: usize = 16 * 1024;

/// Byte region for encoded traces, plus the write cursor and item count.
///
/// Invariants: `CONTAINER_HEADER_LEN <= write_offset() <= capacity()`;
/// `trace_count()` increments only on a successful encode.
#[derive(Debug)]
pub struct EncodeBuffer {
    buf: Vec<u8>,
    capacity: usize,
    trace_count: u32,
}

impl EncodeBuffer {
    /// Create a buffer with the given total capacity in bytes.
    pub fn new(capacity: usize) -> Self {
        debug_assert!(capacity > CONTAINER_HEADER_LEN);
        let mut buffer = Self {
            buf: Vec::new(),
            capacity,
            trace_count: 0,
        };
        buffer.rearm();
        buffer
    }

    fn rearm(&mut self) {
        self.buf = Vec::with_capacity(INITIAL_RESERVE.min(self.capacity));
        self.buf.resize(CONTAINER_HEADER_LEN, 0);
        self.trace_count = 0;
    }

    /// Reinitialize the buffer and the encoder's per-buffer state.
    pub fn reset(&mut self, encoder: &mut ProtocolEncoder) {
        self.rearm();
        encoder.init();
    }

    /// Encode one batch at the current write offset.
    ///
    /// On success the cursor advances and the count increments. On
    /// [`EncodeError::Overflow`] the buffer is exactly as it was before the
    /// call (the encoder already rolled back its partial write).
    ///
    /// # Errors
    ///
    /// Propagates the encoder's error; only overflow is recoverable.
    pub fn append(
        &mut self,
        encoder: &mut ProtocolEncoder,
        batch: &TraceBatch,
    ) -> Result<(), EncodeError> {
        let offset = self.buf.len();
        let new_offset = encoder.encode(&mut self.buf, offset, self.capacity, batch)?;
        debug_assert_eq!(new_offset, self.buf.len());
        self.trace_count += 1;
        Ok(())
    }

    /// Finalize the current generation: write the container count into the
    /// reserved header, build the wire payload, and start a fresh
    /// generation.
    ///
    /// Returns the payload and the trace count it carries.
    pub fn finish(&mut self, encoder: &mut ProtocolEncoder) -> (Bytes, u32) {
        write_container_header(&mut self.buf[..CONTAINER_HEADER_LEN], self.trace_count);
        let count = self.trace_count;
        let body = std::mem::take(&mut self.buf);
        let payload = encoder.make_payload(Bytes::from(body));
        self.rearm();
        encoder.init();
        (payload, count)
    }

    /// Current write offset in bytes
    #[inline]
    pub fn write_offset(&self) -> usize {
        self.buf.len()
    }

    /// Number of traces encoded into the current generation
    #[inline]
    pub fn trace_count(&self) -> u32 {
        self.trace_count
    }

    /// Total capacity in bytes
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Whether the current generation holds no traces
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.trace_count == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use tracewire_protocol::{ProtocolVersion, Span};

    fn encoder() -> ProtocolEncoder {
        ProtocolEncoder::for_version(ProtocolVersion::V1)
    }

    fn batch() -> TraceBatch {
        TraceBatch::new(vec![Span::new("web", "req", "/")])
    }

    #[test]
    fn test_fresh_buffer_reserves_header() {
        let buffer = EncodeBuffer::new(1024);
        assert_eq!(buffer.write_offset(), CONTAINER_HEADER_LEN);
        assert_eq!(buffer.trace_count(), 0);
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_append_advances_cursor_and_count() {
        let mut encoder = encoder();
        let mut buffer = EncodeBuffer::new(1024);

        buffer.append(&mut encoder, &batch()).unwrap();
        assert!(buffer.write_offset() > CONTAINER_HEADER_LEN);
        assert_eq!(buffer.trace_count(), 1);

        buffer.append(&mut encoder, &batch()).unwrap();
        assert_eq!(buffer.trace_count(), 2);
    }

    #[test]
    fn test_overflow_leaves_buffer_untouched() {
        let mut encoder = encoder();
        let mut buffer = EncodeBuffer::new(32);

        let err = buffer.append(&mut encoder, &batch()).unwrap_err();
        assert!(err.is_recoverable());
        assert_eq!(buffer.write_offset(), CONTAINER_HEADER_LEN);
        assert_eq!(buffer.trace_count(), 0);
    }

    #[test]
    fn test_overflow_after_success_keeps_earlier_traces() {
        let mut encoder = encoder();
        // room for one sample batch but not two
        let mut buffer = EncodeBuffer::new(CONTAINER_HEADER_LEN + 100);

        buffer.append(&mut encoder, &batch()).unwrap();
        let offset = buffer.write_offset();

        let err = buffer.append(&mut encoder, &batch()).unwrap_err();
        assert!(err.is_recoverable());
        assert_eq!(buffer.write_offset(), offset);
        assert_eq!(buffer.trace_count(), 1);

        // never exceeds capacity
        assert!(buffer.write_offset() <= buffer.capacity());
    }

    #[test]
    fn test_finish_writes_count_header_and_resets() {
        let mut encoder = encoder();
        let mut buffer = EncodeBuffer::new(1024);

        buffer.append(&mut encoder, &batch()).unwrap();
        buffer.append(&mut encoder, &batch()).unwrap();

        let (payload, count) = buffer.finish(&mut encoder);
        assert_eq!(count, 2);
        assert_eq!(&payload[..CONTAINER_HEADER_LEN], &[0xdd, 0, 0, 0, 2]);

        assert_eq!(buffer.write_offset(), CONTAINER_HEADER_LEN);
        assert_eq!(buffer.trace_count(), 0);
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_finished_payload_is_independent_of_next_generation() {
        let mut encoder = encoder();
        let mut buffer = EncodeBuffer::new(1024);

        buffer.append(&mut encoder, &batch()).unwrap();
        let (payload, _) = buffer.finish(&mut encoder);
        let snapshot = payload.to_vec();

        // new generation writes do not disturb the finalized payload
        buffer.append(&mut encoder, &batch()).unwrap();
        buffer.append(&mut encoder, &batch()).unwrap();
        assert_eq!(&payload[..], &snapshot[..]);
    }

    #[test]
    fn test_reset_reinitializes_encoder_state() {
        let mut encoder = ProtocolEncoder::for_version(ProtocolVersion::V2);
        let mut buffer = EncodeBuffer::new(1024);

        buffer.append(&mut encoder, &batch()).unwrap();
        let first_offset = buffer.write_offset();

        buffer.reset(&mut encoder);
        assert_eq!(buffer.write_offset(), CONTAINER_HEADER_LEN);

        // a reset string table yields the same bytes again
        buffer.append(&mut encoder, &batch()).unwrap();
        assert_eq!(buffer.write_offset(), first_offset);
    }
}
