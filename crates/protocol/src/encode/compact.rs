//! Compact (v2) trace encoding.
//!
//! Strings are interned in a per-payload table and every span is a
//! fixed-arity msgpack array of table indices and scalars:
//!
//! ```text
//! [service, name, resource, trace_id, span_id, parent_id,
//!  start, duration, error, meta, metrics, type]
//! ```
//!
//! Index 0 of the table is always the empty string; an unset `type` encodes
//! as index 0. The table is carried next to the trace container in the
//! final payload, so it must only reference strings from batches that were
//! actually kept. A batch rolled back on overflow also rolls back the
//! table entries it added.

use std::collections::HashMap;

use bytes::{BufMut, Bytes, BytesMut};

use super::{check_offset, settle, TraceEncoder};
use crate::error::EncodeError;
use crate::msgpack::{write_array_header, write_f64, write_i64, write_map_header, write_str, write_u64};
use crate::span::{Span, TraceBatch};

/// Fields per span in the compact encoding
const SPAN_ARITY: usize = 12;

/// Encoder for the compact string-table encoding.
///
/// The string table is per-buffer state: `init()` clears it back to the
/// seeded empty-string entry whenever the writer resets the buffer.
#[derive(Debug)]
pub struct CompactEncoder {
    strings: Vec<String>,
    index: HashMap<String, u32>,
}

impl Default for CompactEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl CompactEncoder {
    /// Create a compact encoder with a fresh string table
    pub fn new() -> Self {
        let mut encoder = Self {
            strings: Vec::new(),
            index: HashMap::new(),
        };
        encoder.seed();
        encoder
    }

    fn seed(&mut self) {
        self.strings.push(String::new());
        self.index.insert(String::new(), 0);
    }

    fn intern(&mut self, s: &str) -> u32 {
        if let Some(&idx) = self.index.get(s) {
            return idx;
        }
        let idx = self.strings.len() as u32;
        self.strings.push(s.to_owned());
        self.index.insert(s.to_owned(), idx);
        idx
    }

    /// Drop table entries added at or past `len` (overflow rollback)
    fn truncate_table(&mut self, len: usize) {
        for s in self.strings.drain(len..) {
            self.index.remove(&s);
        }
    }

    /// Number of interned strings, including the seeded empty string
    #[cfg(test)]
    pub(crate) fn table_len(&self) -> usize {
        self.strings.len()
    }

    fn encode_span(&mut self, buf: &mut Vec<u8>, span: &Span) {
        write_array_header(buf, SPAN_ARITY);

        write_u64(buf, u64::from(self.intern(&span.service)));
        write_u64(buf, u64::from(self.intern(&span.name)));
        write_u64(buf, u64::from(self.intern(&span.resource)));
        write_u64(buf, span.trace_id);
        write_u64(buf, span.span_id);
        write_u64(buf, span.parent_id);
        write_i64(buf, span.start);
        write_i64(buf, span.duration);
        write_i64(buf, i64::from(span.error));

        write_map_header(buf, span.meta.len());
        for (k, v) in &span.meta {
            let key = self.intern(k);
            let value = self.intern(v);
            write_u64(buf, u64::from(key));
            write_u64(buf, u64::from(value));
        }

        write_map_header(buf, span.metrics.len());
        for (k, v) in &span.metrics {
            let key = self.intern(k);
            write_u64(buf, u64::from(key));
            write_f64(buf, *v);
        }

        let type_idx = span
            .span_type
            .as_deref()
            .map_or(0, |t| self.intern(t));
        write_u64(buf, u64::from(type_idx));
    }
}

impl TraceEncoder for CompactEncoder {
    fn init(&mut self) {
        self.strings.clear();
        self.index.clear();
        self.seed();
    }

    fn encode(
        &mut self,
        buf: &mut Vec<u8>,
        offset: usize,
        capacity: usize,
        batch: &TraceBatch,
    ) -> Result<usize, EncodeError> {
        check_offset(buf, offset)?;
        let table_mark = self.strings.len();

        write_array_header(buf, batch.len());
        for span in batch.spans() {
            self.encode_span(buf, span);
        }

        match settle(buf, offset, capacity) {
            Ok(new_offset) => Ok(new_offset),
            Err(e) => {
                self.truncate_table(table_mark);
                Err(e)
            }
        }
    }

    fn make_payload(&self, body: Bytes) -> Bytes {
        let mut table = Vec::with_capacity(16 + self.strings.iter().map(|s| s.len()).sum::<usize>());
        write_array_header(&mut table, self.strings.len());
        for s in &self.strings {
            write_str(&mut table, s);
        }

        let mut payload = BytesMut::with_capacity(1 + table.len() + body.len());
        payload.put_u8(0x92);
        payload.put_slice(&table);
        payload.put_slice(&body);
        payload.freeze()
    }
}
