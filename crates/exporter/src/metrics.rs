//! Export activity counters.
//!
//! Lock-free atomics shared as an `Arc` handle: the writer and its send
//! tasks update them, embedders and tests read them. No reporting loop
//! lives here; external sinks poll the handle on their own schedule.

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters for everything the writer does.
#[derive(Debug, Default)]
pub struct ExportMetrics {
    /// Batches handed to the writer
    pub appends: AtomicU64,
    /// Batches successfully encoded into a buffer
    pub traces_encoded: AtomicU64,
    /// Batches dropped because they would not fit the buffer
    pub overflow_drops: AtomicU64,
    /// Queued batches discarded on ambiguous negotiation failures
    pub pending_dropped: AtomicU64,
    /// Negotiation probe retries
    pub probe_retries: AtomicU64,
    /// Payload flushes dispatched
    pub flushes: AtomicU64,
    /// Trace payload requests that produced a response or error
    pub requests: AtomicU64,
    /// 2xx responses
    pub responses_ok: AtomicU64,
    /// Non-2xx responses
    pub responses_error: AtomicU64,
    /// Requests failed with a timeout
    pub errors_timeout: AtomicU64,
    /// Requests failed to connect
    pub errors_connect: AtomicU64,
    /// Requests failed with socket IO errors
    pub errors_io: AtomicU64,
    /// Requests failed at the HTTP layer
    pub errors_http: AtomicU64,
    /// Requests failed for any other reason
    pub errors_other: AtomicU64,
    /// Collector responses whose rate table did not parse
    pub response_parse_failures: AtomicU64,
    /// Commands dropped because the writer channel was full
    pub channel_drops: AtomicU64,
}

impl ExportMetrics {
    /// Record a completed trace request by status class
    pub fn record_response(&self, status: u16) {
        self.requests.fetch_add(1, Ordering::Relaxed);
        if (200..300).contains(&status) {
            self.responses_ok.fetch_add(1, Ordering::Relaxed);
        } else {
            self.responses_error.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Record a failed trace request by transport error kind
    pub fn record_request_error(&self, kind: &str) {
        self.requests.fetch_add(1, Ordering::Relaxed);
        let counter = match kind {
            "timeout" => &self.errors_timeout,
            "connect" => &self.errors_connect,
            "io" => &self.errors_io,
            "http" => &self.errors_http,
            _ => &self.errors_other,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }
}
