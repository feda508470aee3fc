//! Span and trace batch data model.
//!
//! A [`TraceBatch`] is one logical trace: an ordered sequence of spans that
//! the writer treats as the unit of encoding. The exporter never inspects
//! span contents; only the encoders do.

use std::collections::BTreeMap;

/// One unit of work recorded by the instrumented application.
///
/// Tag maps are ordered (`BTreeMap`) so a span always encodes to the same
/// bytes regardless of insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Span {
    /// Service the span belongs to
    pub service: String,
    /// Operation name
    pub name: String,
    /// Resource being operated on (endpoint, query, ...)
    pub resource: String,
    /// Trace identifier shared by all spans of the trace
    pub trace_id: u64,
    /// Identifier of this span
    pub span_id: u64,
    /// Identifier of the parent span, 0 for a root span
    pub parent_id: u64,
    /// Start time, nanoseconds since the unix epoch
    pub start: i64,
    /// Duration in nanoseconds
    pub duration: i64,
    /// 1 if the span carries an error, 0 otherwise
    pub error: i32,
    /// Span kind (web, db, ...), omitted from the legacy encoding when unset
    pub span_type: Option<String>,
    /// String tags
    pub meta: BTreeMap<String, String>,
    /// Numeric tags
    pub metrics: BTreeMap<String, f64>,
}

impl Span {
    /// Create a span with the given identity, all other fields defaulted.
    pub fn new(
        service: impl Into<String>,
        name: impl Into<String>,
        resource: impl Into<String>,
    ) -> Self {
        Self {
            service: service.into(),
            name: name.into(),
            resource: resource.into(),
            ..Self::default()
        }
    }
}

/// One logical trace: an ordered sequence of spans.
///
/// Opaque to the writer beyond being the unit handed to the encoder.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TraceBatch {
    spans: Vec<Span>,
}

impl TraceBatch {
    /// Create a batch from spans, preserving their order.
    pub fn new(spans: Vec<Span>) -> Self {
        Self { spans }
    }

    /// Spans in this batch, in recording order
    #[inline]
    pub fn spans(&self) -> &[Span] {
        &self.spans
    }

    /// Number of spans in the batch
    #[inline]
    pub fn len(&self) -> usize {
        self.spans.len()
    }

    /// Whether the batch contains no spans
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }
}

impl From<Vec<Span>> for TraceBatch {
    fn from(spans: Vec<Span>) -> Self {
        Self::new(spans)
    }
}
