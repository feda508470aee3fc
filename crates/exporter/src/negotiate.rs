//! Collector protocol negotiation.
//!
//! One probe per attempt: PUT an empty compact payload to the compact
//! endpoint. A 200 means the collector speaks v2; a 404 means the endpoint
//! does not exist, leaving v1. Anything else (including transport errors)
//! is ambiguous and the writer retries after a fixed delay, indefinitely.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use tracing::{debug, warn};

use tracewire_protocol::{ProtocolVersion, CONTENT_TYPE, PROBE_PAYLOAD};
use tracewire_transport::{headers, Transport, TransportRequest};

use crate::diagnostics::StartupGate;

/// Outcome of one negotiation probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ProbeOutcome {
    /// Collector answered decisively
    Version(ProtocolVersion),
    /// Neither 200 nor 404, or the request failed; retry
    Ambiguous,
}

/// Map a probe response status to a protocol version.
pub(crate) fn classify_probe_status(status: u16) -> Option<ProtocolVersion> {
    match status {
        200 => Some(ProtocolVersion::V2),
        404 => Some(ProtocolVersion::V1),
        _ => None,
    }
}

/// The statically-known probe request.
pub(crate) fn probe_request() -> TransportRequest {
    TransportRequest::put(ProtocolVersion::V2.traces_path())
        .with_header("Content-Type", CONTENT_TYPE)
        .with_header(headers::TRACE_COUNT, "0")
        .with_body(Bytes::from_static(&PROBE_PAYLOAD))
}

/// Run one probe attempt, optionally after a retry delay.
pub(crate) async fn run_probe(
    transport: Arc<dyn Transport>,
    startup: StartupGate,
    delay: Option<Duration>,
) -> ProbeOutcome {
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }

    let result = transport.request(probe_request()).await;
    startup.report(result.as_ref().map(|r| r.status).map_err(|e| e));

    match result {
        Ok(response) => match classify_probe_status(response.status) {
            Some(version) => {
                debug!(%version, status = response.status, "protocol probe resolved");
                ProbeOutcome::Version(version)
            }
            None => {
                warn!(status = response.status, "protocol probe returned unexpected status");
                ProbeOutcome::Ambiguous
            }
        },
        Err(e) => {
            warn!(error = %e, kind = e.kind(), "protocol probe failed");
            ProbeOutcome::Ambiguous
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_probe_status() {
        assert_eq!(classify_probe_status(200), Some(ProtocolVersion::V2));
        assert_eq!(classify_probe_status(404), Some(ProtocolVersion::V1));
        assert_eq!(classify_probe_status(500), None);
        assert_eq!(classify_probe_status(202), None);
        assert_eq!(classify_probe_status(400), None);
    }

    #[test]
    fn test_probe_request_shape() {
        let request = probe_request();
        assert_eq!(request.method.as_str(), "PUT");
        assert_eq!(request.path, "/v2/traces");
        assert_eq!(&request.body[..], &PROBE_PAYLOAD);
        assert!(request
            .headers
            .iter()
            .any(|(name, value)| *name == headers::TRACE_COUNT && value == "0"));
        assert!(request
            .headers
            .iter()
            .any(|(name, value)| *name == "Content-Type" && value == CONTENT_TYPE));
    }
}
