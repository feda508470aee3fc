//! Tracewire protocol
//!
//! Span data model and wire-format encoders for the trace exporter.
//! The collector accepts two encodings of the same container layout:
//!
//! - **v1 (legacy)**: each span is a self-contained msgpack map with
//!   string keys. Verbose but readable by any msgpack decoder.
//! - **v2 (compact)**: strings are interned in a per-payload table and
//!   spans are fixed-arity msgpack arrays of table indices and scalars.
//!
//! # Wire Format
//!
//! Both versions share the outer trace container:
//!
//! ```text
//! [5 bytes: array32 header (0xdd + u32 count)]  <- reserved, written at flush
//! [trace 0: array of spans]
//! [trace 1: array of spans]
//! ...
//! ```
//!
//! The v2 payload additionally wraps the container in a two-element array
//! carrying the string table:
//!
//! ```text
//! [0x92][string table: array of str][trace container]
//! ```
//!
//! # Usage
//!
//! ```
//! use tracewire_protocol::{ProtocolEncoder, ProtocolVersion, TraceBatch, TraceEncoder};
//!
//! let mut encoder = ProtocolEncoder::for_version(ProtocolVersion::V2);
//! encoder.init();
//!
//! let mut buf = Vec::new();
//! let batch = TraceBatch::default();
//! let offset = encoder.encode(&mut buf, 0, 8 * 1024 * 1024, &batch).unwrap();
//! assert_eq!(offset, buf.len());
//! ```

mod error;
mod span;
mod version;

pub mod encode;
pub mod msgpack;

pub use encode::{CompactEncoder, LegacyEncoder, ProtocolEncoder, TraceEncoder};
pub use error::EncodeError;
pub use msgpack::CONTAINER_HEADER_LEN;
pub use span::{Span, TraceBatch};
pub use version::{ProtocolVersion, CONTENT_TYPE, PROBE_PAYLOAD};
