//! Collector HTTP client.
//!
//! One request, one response, no retries. TCP destinations go through a
//! shared reqwest client (with an optional static DNS override); unix
//! destinations go through the hand-framed HTTP/1.1 exchange in
//! [`crate::unix`].

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;

use crate::destination::Destination;
use crate::error::TransportError;
use crate::unix;

/// One HTTP request to the collector.
#[derive(Debug, Clone)]
pub struct TransportRequest {
    /// HTTP method (always PUT for trace traffic)
    pub method: reqwest::Method,
    /// Path below the collector root, e.g. `/v2/traces`
    pub path: String,
    /// Header name/value pairs
    pub headers: Vec<(&'static str, String)>,
    /// Request body
    pub body: Bytes,
}

impl TransportRequest {
    /// Create a PUT request with no headers and an empty body
    pub fn put(path: impl Into<String>) -> Self {
        Self {
            method: reqwest::Method::PUT,
            path: path.into(),
            headers: Vec::new(),
            body: Bytes::new(),
        }
    }

    /// Add a header
    #[must_use]
    pub fn with_header(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.headers.push((name, value.into()));
        self
    }

    /// Set the body
    #[must_use]
    pub fn with_body(mut self, body: Bytes) -> Self {
        self.body = body;
        self
    }
}

/// Collector response: status code plus raw body bytes.
#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: u16,
    pub body: Bytes,
}

/// Asynchronous request execution against the collector.
///
/// The writer only ever holds a `dyn Transport`, so tests substitute
/// scripted implementations.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Execute one request.
    ///
    /// # Errors
    ///
    /// Returns a [`TransportError`] classified for metrics; the caller
    /// decides whether the payload is lost or the attempt is retried.
    async fn request(&self, request: TransportRequest) -> Result<TransportResponse, TransportError>;
}

enum Inner {
    Http {
        client: reqwest::Client,
        base_url: String,
    },
    Unix {
        path: PathBuf,
        timeout: Duration,
    },
}

/// Transport for a concrete collector destination.
pub struct AgentTransport {
    inner: Inner,
}

impl AgentTransport {
    /// Create a transport for a parsed destination.
    ///
    /// `resolve` overrides DNS resolution for one host, bypassing the
    /// system resolver (passed through to the HTTP client; ignored for
    /// unix destinations).
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Http`] if the HTTP client cannot be built.
    pub fn new(
        destination: Destination,
        timeout: Duration,
        resolve: Option<(String, SocketAddr)>,
    ) -> Result<Self, TransportError> {
        let inner = match destination {
            Destination::Unix(path) => Inner::Unix { path, timeout },
            tcp @ Destination::Tcp { .. } => {
                let base_url = tcp
                    .base_url()
                    .ok_or_else(|| TransportError::Http("missing base url".into()))?;
                let mut builder = reqwest::Client::builder().timeout(timeout);
                if let Some((host, addr)) = resolve {
                    builder = builder.resolve(&host, addr);
                }
                let client = builder
                    .build()
                    .map_err(|e| TransportError::Http(e.to_string()))?;
                Inner::Http { client, base_url }
            }
        };
        Ok(Self { inner })
    }

    /// Parse a collector URL and create a transport for it.
    ///
    /// # Errors
    ///
    /// Returns an error for unparseable URLs or client build failures.
    pub fn from_url(
        url: &str,
        timeout: Duration,
        resolve: Option<(String, SocketAddr)>,
    ) -> Result<Self, TransportError> {
        Self::new(Destination::parse(url)?, timeout, resolve)
    }
}

#[async_trait]
impl Transport for AgentTransport {
    async fn request(&self, request: TransportRequest) -> Result<TransportResponse, TransportError> {
        match &self.inner {
            Inner::Unix { path, timeout } => {
                unix::request_over_unix(path, &request, *timeout).await
            }
            Inner::Http { client, base_url } => {
                let url = format!("{base_url}{}", request.path);
                let mut builder = client.request(request.method.clone(), url);
                for (name, value) in &request.headers {
                    builder = builder.header(*name, value);
                }
                let response = builder
                    .body(request.body.clone())
                    .send()
                    .await
                    .map_err(classify)?;
                let status = response.status().as_u16();
                let body = response.bytes().await.map_err(classify)?;
                Ok(TransportResponse { status, body })
            }
        }
    }
}

fn classify(e: reqwest::Error) -> TransportError {
    if e.is_timeout() {
        TransportError::Timeout
    } else if e.is_connect() {
        TransportError::Connect(e.to_string())
    } else {
        TransportError::Http(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    // Minimal one-shot HTTP server: reads a full request, replies canned.
    async fn serve_once(listener: TcpListener, response: &'static str) -> Vec<u8> {
        let (mut stream, _) = listener.accept().await.unwrap();
        let mut request = Vec::new();
        let mut chunk = [0u8; 1024];
        loop {
            let n = stream.read(&mut chunk).await.unwrap();
            request.extend_from_slice(&chunk[..n]);
            if let Some(header_end) = find_blank_line(&request) {
                let content_length = content_length(&request[..header_end]);
                if request.len() >= header_end + content_length {
                    break;
                }
            }
            if n == 0 {
                break;
            }
        }
        stream.write_all(response.as_bytes()).await.unwrap();
        stream.shutdown().await.unwrap();
        request
    }

    fn find_blank_line(raw: &[u8]) -> Option<usize> {
        raw.windows(4).position(|w| w == b"\r\n\r\n").map(|p| p + 4)
    }

    fn content_length(head: &[u8]) -> usize {
        let head = String::from_utf8_lossy(head);
        head.lines()
            .find_map(|line| {
                let (name, value) = line.split_once(':')?;
                name.eq_ignore_ascii_case("content-length")
                    .then(|| value.trim().parse().ok())?
            })
            .unwrap_or(0)
    }

    #[tokio::test]
    async fn test_tcp_put_roundtrip() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(serve_once(
            listener,
            "HTTP/1.1 200 OK\r\nContent-Length: 2\r\nConnection: close\r\n\r\n{}",
        ));

        let transport = AgentTransport::from_url(
            &format!("http://127.0.0.1:{}", addr.port()),
            Duration::from_secs(5),
            None,
        )
        .unwrap();

        let request = TransportRequest::put("/v2/traces")
            .with_header(crate::headers::TRACE_COUNT, "1")
            .with_body(Bytes::from_static(b"\x90"));
        let response = transport.request(request).await.unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(&response.body[..], b"{}");

        let seen = server.await.unwrap();
        let seen = String::from_utf8_lossy(&seen);
        assert!(seen.starts_with("PUT /v2/traces HTTP/1.1\r\n"));
        assert!(seen
            .to_ascii_lowercase()
            .contains("x-tracewire-trace-count: 1"));
    }

    #[tokio::test]
    async fn test_tcp_connect_failure_classified() {
        // bind then drop to get a port nothing listens on
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let transport = AgentTransport::from_url(
            &format!("http://127.0.0.1:{}", addr.port()),
            Duration::from_secs(1),
            None,
        )
        .unwrap();

        let err = transport
            .request(TransportRequest::put("/v2/traces"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            TransportError::Connect(_) | TransportError::Timeout
        ));
    }
}
