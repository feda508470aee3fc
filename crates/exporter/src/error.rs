//! Exporter error types.

use thiserror::Error;

use tracewire_protocol::EncodeError;
use tracewire_transport::TransportError;

/// Errors surfaced by the writer and its handle.
///
/// Transport failures after resolution are not represented here: they cost
/// the in-flight payload, are counted, and never escape the send task.
#[derive(Debug, Error)]
pub enum ExportError {
    /// Writer command channel is full (non-blocking send failed)
    #[error("writer channel full, command dropped")]
    ChannelFull,

    /// Writer task has shut down
    #[error("writer closed")]
    Closed,

    /// Encoder reported a non-recoverable failure
    #[error("encode failure: {0}")]
    Encode(#[from] EncodeError),

    /// Transport could not be built from the configuration
    #[error(transparent)]
    Transport(#[from] TransportError),
}
