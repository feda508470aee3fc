//! Tracewire transport
//!
//! HTTP delivery of trace payloads to the local collector. One request at a
//! time, no retries: retry policy belongs to the writer above this layer
//! (which, by design, does not retry payloads either).
//!
//! # Destinations
//!
//! The collector is reached either over TCP (`http://` / `https://` URLs,
//! driven through reqwest) or over a unix domain socket (`unix://` URLs,
//! driven as hand-framed HTTP/1.1 on a [`tokio::net::UnixStream`]).
//!
//! # Usage
//!
//! ```no_run
//! use bytes::Bytes;
//! use tracewire_transport::{AgentTransport, Transport, TransportRequest};
//!
//! # async fn send() -> Result<(), tracewire_transport::TransportError> {
//! let transport = AgentTransport::from_url(
//!     "http://127.0.0.1:8128",
//!     std::time::Duration::from_secs(2),
//!     None,
//! )?;
//!
//! let request = TransportRequest::put("/v2/traces")
//!     .with_header(tracewire_transport::headers::TRACE_COUNT, "0")
//!     .with_body(Bytes::from_static(&[0x92, 0x90, 0x90]));
//! let response = transport.request(request).await?;
//! assert_eq!(response.status, 200);
//! # Ok(())
//! # }
//! ```

mod client;
mod destination;
mod error;
mod unix;

pub mod headers;

pub use client::{AgentTransport, Transport, TransportRequest, TransportResponse};
pub use destination::{Destination, DEFAULT_COLLECTOR_PORT, DEFAULT_COLLECTOR_URL};
pub use error::TransportError;
