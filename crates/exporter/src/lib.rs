//! Tracewire exporter - buffering trace writer with protocol negotiation.
//!
//! The writer accumulates application trace batches, encodes them into a
//! fixed-capacity buffer, and ships finalized payloads to the local
//! collector over HTTP, discovering on first contact which wire-protocol
//! version the collector speaks. Key principles:
//!
//! - **Never blocks the application**: appends and flushes are
//!   fire-and-forget channel sends; network calls and the negotiation
//!   retry delay are the only suspension points, and they happen off the
//!   caller's path.
//! - **Never crashes the host**: buffer overflow, ambiguous negotiation,
//!   transport failures, and malformed collector responses are logged and
//!   counted; traces can be lost, the process cannot.
//! - **Order-preserving**: batches encode in append order, including
//!   batches queued before the protocol resolved.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     ┌──────────────┐     ┌──────────────┐
//! │ Application │────▶│ WriterHandle │────▶│ Writer task  │
//! │  (tracer)   │     │ (try_send)   │     │ (owns state) │
//! └─────────────┘     └──────────────┘     └──────┬───────┘
//!                                                 │
//!                       ┌─────────────────────────┼─────────┐
//!                       ▼                         ▼         ▼
//!                ┌────────────┐          ┌────────────┐ ┌────────┐
//!                │ Negotiator │          │ EncodeBuf  │ │ Sends  │
//!                │ (probe)    │          │ (8 MiB)    │ │(spawn) │
//!                └────────────┘          └────────────┘ └────────┘
//! ```
//!
//! # Usage
//!
//! ```no_run
//! use tracewire_exporter::{spawn, ExporterConfig, Span, TraceBatch};
//!
//! # async fn export() -> Result<(), tracewire_exporter::ExportError> {
//! let config = ExporterConfig::default()
//!     .with_url("http://127.0.0.1:8128")
//!     .with_flush_interval(std::time::Duration::from_secs(2));
//! let (handle, _task) = spawn(config)?;
//!
//! let batch = TraceBatch::new(vec![Span::new("web", "request", "/users")]);
//! let _ = handle.append(batch); // fire-and-forget, never blocks
//! # Ok(())
//! # }
//! ```

mod buffer;
mod config;
mod diagnostics;
mod error;
mod metrics;
mod negotiate;
mod sampler;
mod writer;


pub use buffer::EncodeBuffer;
pub use config::{
    ExporterConfig, TracerIdentity, DEFAULT_CHANNEL_CAPACITY, DEFAULT_MAX_PAYLOAD_SIZE,
    DEFAULT_REQUEST_TIMEOUT, DEFAULT_RETRY_DELAY,
};
pub use diagnostics::{LogStartupObserver, StartupObserver};
pub use error::ExportError;
pub use metrics::ExportMetrics;
pub use sampler::{parse_rate_response, Sampler, SharedRates};
pub use writer::{Writer, WriterHandle};

// Re-export the data model so embedders need only this crate.
pub use tracewire_protocol::{ProtocolVersion, Span, TraceBatch};

use tokio::task::JoinHandle;

/// Spawn the writer as a background task.
///
/// Returns the handle for feeding it and the join handle of the task,
/// which resolves only on shutdown or a non-recoverable encode failure.
///
/// # Errors
///
/// Fails if the configured collector URL does not parse.
pub fn spawn(
    config: ExporterConfig,
) -> Result<(WriterHandle, JoinHandle<Result<(), ExportError>>), ExportError> {
    let (writer, handle) = Writer::new(config)?;
    let task = tokio::spawn(writer.run());
    Ok((handle, task))
}
