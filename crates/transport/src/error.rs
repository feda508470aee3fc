//! Transport error types.

use thiserror::Error;

/// Errors that can occur while talking to the collector.
///
/// None of these are fatal to the writer: a failed trace request means the
/// payload is lost, a failed probe means negotiation retries. The writer
/// counts failures by [`kind`](TransportError::kind).
#[derive(Debug, Error)]
pub enum TransportError {
    /// Collector URL could not be parsed into a destination
    #[error("invalid collector destination: {0}")]
    InvalidDestination(String),

    /// Request did not complete within the configured timeout
    #[error("request timed out")]
    Timeout,

    /// Could not connect to the collector
    #[error("connection failed: {0}")]
    Connect(String),

    /// HTTP-level failure (request build, send, or body read)
    #[error("http error: {0}")]
    Http(String),

    /// Socket IO failure
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Response bytes did not parse as HTTP
    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

impl TransportError {
    /// Stable label for metrics, classifying the failure
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidDestination(_) => "destination",
            Self::Timeout => "timeout",
            Self::Connect(_) => "connect",
            Self::Http(_) => "http",
            Self::Io(_) => "io",
            Self::MalformedResponse(_) => "malformed_response",
        }
    }
}
