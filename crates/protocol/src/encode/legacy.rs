//! Legacy (v1) trace encoding.
//!
//! Each trace is a msgpack array of spans; each span is a self-contained
//! map with string keys. Optional fields (`type`, empty tag maps) are
//! omitted, so the map arity is computed per span.

use bytes::Bytes;

use super::{check_offset, settle, TraceEncoder};
use crate::error::EncodeError;
use crate::msgpack::{write_array_header, write_f64, write_i64, write_map_header, write_str, write_u64};
use crate::span::{Span, TraceBatch};

/// Encoder for the legacy map-based encoding.
///
/// Stateless: spans carry their own strings, so there is nothing to reset
/// between buffers and the finalized container is already the payload.
#[derive(Debug, Default)]
pub struct LegacyEncoder;

impl LegacyEncoder {
    /// Create a legacy encoder
    pub fn new() -> Self {
        Self
    }
}

impl TraceEncoder for LegacyEncoder {
    fn init(&mut self) {}

    fn encode(
        &mut self,
        buf: &mut Vec<u8>,
        offset: usize,
        capacity: usize,
        batch: &TraceBatch,
    ) -> Result<usize, EncodeError> {
        check_offset(buf, offset)?;

        write_array_header(buf, batch.len());
        for span in batch.spans() {
            encode_span(buf, span);
        }

        settle(buf, offset, capacity)
    }

    fn make_payload(&self, body: Bytes) -> Bytes {
        body
    }
}

fn encode_span(buf: &mut Vec<u8>, span: &Span) {
    let mut arity = 9;
    if span.span_type.is_some() {
        arity += 1;
    }
    if !span.meta.is_empty() {
        arity += 1;
    }
    if !span.metrics.is_empty() {
        arity += 1;
    }
    write_map_header(buf, arity);

    write_str(buf, "service");
    write_str(buf, &span.service);
    write_str(buf, "name");
    write_str(buf, &span.name);
    write_str(buf, "resource");
    write_str(buf, &span.resource);
    write_str(buf, "trace_id");
    write_u64(buf, span.trace_id);
    write_str(buf, "span_id");
    write_u64(buf, span.span_id);
    write_str(buf, "parent_id");
    write_u64(buf, span.parent_id);
    write_str(buf, "start");
    write_i64(buf, span.start);
    write_str(buf, "duration");
    write_i64(buf, span.duration);
    write_str(buf, "error");
    write_i64(buf, i64::from(span.error));

    if let Some(span_type) = &span.span_type {
        write_str(buf, "type");
        write_str(buf, span_type);
    }
    if !span.meta.is_empty() {
        write_str(buf, "meta");
        write_map_header(buf, span.meta.len());
        for (k, v) in &span.meta {
            write_str(buf, k);
            write_str(buf, v);
        }
    }
    if !span.metrics.is_empty() {
        write_str(buf, "metrics");
        write_map_header(buf, span.metrics.len());
        for (k, v) in &span.metrics {
            write_str(buf, k);
            write_f64(buf, *v);
        }
    }
}
