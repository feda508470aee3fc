//! Tests for the legacy (v1) encoder.

use bytes::Bytes;

use crate::encode::{LegacyEncoder, TraceEncoder};
use crate::error::EncodeError;
use crate::span::{Span, TraceBatch};

const CAP: usize = 8 * 1024 * 1024;

fn sample_span() -> Span {
    Span {
        trace_id: 1,
        span_id: 2,
        parent_id: 0,
        start: 1000,
        duration: 100,
        ..Span::new("web", "req", "/")
    }
}

// =============================================================================
// Wire format tests
// =============================================================================

#[test]
fn test_encode_minimal_span_golden() {
    let mut encoder = LegacyEncoder::new();
    let mut buf = Vec::new();
    let batch = TraceBatch::new(vec![sample_span()]);

    let offset = encoder.encode(&mut buf, 0, CAP, &batch).unwrap();
    assert_eq!(offset, buf.len());

    let mut expected: Vec<u8> = vec![0x91, 0x89];
    expected.extend_from_slice(b"\xa7service\xa3web");
    expected.extend_from_slice(b"\xa4name\xa3req");
    expected.extend_from_slice(b"\xa8resource\xa1/");
    expected.extend_from_slice(b"\xa8trace_id\x01");
    expected.extend_from_slice(b"\xa7span_id\x02");
    expected.extend_from_slice(b"\xa9parent_id\x00");
    expected.extend_from_slice(b"\xa5start\xcd\x03\xe8");
    expected.extend_from_slice(b"\xa8duration\x64");
    expected.extend_from_slice(b"\xa5error\x00");
    assert_eq!(buf, expected);
}

#[test]
fn test_optional_fields_raise_map_arity() {
    let mut span = sample_span();
    span.span_type = Some("http".into());
    span.meta.insert("env".into(), "prod".into());
    span.metrics.insert("hits".into(), 1.0);

    let mut encoder = LegacyEncoder::new();
    let mut buf = Vec::new();
    encoder
        .encode(&mut buf, 0, CAP, &TraceBatch::new(vec![span]))
        .unwrap();

    // 9 base fields + type + meta + metrics
    assert_eq!(buf[1], 0x8c);
    let contains = |needle: &[u8]| buf.windows(needle.len()).any(|w| w == needle);
    assert!(contains(b"\xa4type\xa4http"));
    assert!(contains(b"\xa4meta\x81\xa3env\xa4prod"));
    assert!(contains(b"\xa7metrics\x81\xa4hits\xcb"));
}

#[test]
fn test_empty_batch_is_empty_array() {
    let mut encoder = LegacyEncoder::new();
    let mut buf = Vec::new();
    let offset = encoder
        .encode(&mut buf, 0, CAP, &TraceBatch::default())
        .unwrap();
    assert_eq!(offset, 1);
    assert_eq!(buf, [0x90]);
}

#[test]
fn test_make_payload_is_identity() {
    let encoder = LegacyEncoder::new();
    let body = Bytes::from_static(b"\xdd\x00\x00\x00\x00");
    assert_eq!(encoder.make_payload(body.clone()), body);
}

// =============================================================================
// Buffer contract tests
// =============================================================================

#[test]
fn test_encode_appends_at_offset() {
    let mut encoder = LegacyEncoder::new();
    let mut buf = Vec::new();
    let batch = TraceBatch::new(vec![sample_span()]);

    let first = encoder.encode(&mut buf, 0, CAP, &batch).unwrap();
    let second = encoder.encode(&mut buf, first, CAP, &batch).unwrap();

    assert_eq!(second, buf.len());
    assert_eq!(second, first * 2);
}

#[test]
fn test_overflow_rolls_buffer_back() {
    let mut encoder = LegacyEncoder::new();
    let mut buf = Vec::new();
    let batch = TraceBatch::new(vec![sample_span()]);

    let err = encoder.encode(&mut buf, 0, 8, &batch).unwrap_err();
    match err {
        EncodeError::Overflow { needed, capacity } => {
            assert!(needed > capacity);
            assert_eq!(capacity, 8);
        }
        other => panic!("expected overflow, got {other:?}"),
    }
    assert!(buf.is_empty());
}

#[test]
fn test_overflow_preserves_earlier_traces() {
    let mut encoder = LegacyEncoder::new();
    let mut buf = Vec::new();
    let batch = TraceBatch::new(vec![sample_span()]);

    let offset = encoder.encode(&mut buf, 0, CAP, &batch).unwrap();
    let err = encoder
        .encode(&mut buf, offset, offset + 4, &batch)
        .unwrap_err();
    assert!(err.is_recoverable());
    assert_eq!(buf.len(), offset);
}

#[test]
fn test_offset_mismatch_is_fatal() {
    let mut encoder = LegacyEncoder::new();
    let mut buf = vec![0u8; 3];
    let err = encoder
        .encode(&mut buf, 0, CAP, &TraceBatch::default())
        .unwrap_err();
    assert!(matches!(err, EncodeError::OffsetMismatch { .. }));
    assert!(!err.is_recoverable());
}
