//! HTTP/1.1 over a unix domain socket.
//!
//! The collector socket speaks plain HTTP. Each request opens a fresh
//! connection, sends `Connection: close`, and reads the response until the
//! collector closes the stream.

use std::path::Path;
use std::time::Duration;

use bytes::Bytes;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::UnixStream;

use crate::client::{TransportRequest, TransportResponse};
use crate::error::TransportError;

pub(crate) async fn request_over_unix(
    path: &Path,
    request: &TransportRequest,
    timeout: Duration,
) -> Result<TransportResponse, TransportError> {
    match tokio::time::timeout(timeout, exchange(path, request)).await {
        Ok(result) => result,
        Err(_) => Err(TransportError::Timeout),
    }
}

async fn exchange(
    path: &Path,
    request: &TransportRequest,
) -> Result<TransportResponse, TransportError> {
    let mut stream = UnixStream::connect(path)
        .await
        .map_err(|e| TransportError::Connect(e.to_string()))?;

    let mut head = format!(
        "{} {} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\nContent-Length: {}\r\n",
        request.method,
        request.path,
        request.body.len()
    );
    for (name, value) in &request.headers {
        head.push_str(name);
        head.push_str(": ");
        head.push_str(value);
        head.push_str("\r\n");
    }
    head.push_str("\r\n");

    stream.write_all(head.as_bytes()).await?;
    stream.write_all(&request.body).await?;
    stream.flush().await?;

    let mut raw = Vec::new();
    stream.read_to_end(&mut raw).await?;
    parse_response(&raw)
}

fn parse_response(raw: &[u8]) -> Result<TransportResponse, TransportError> {
    let header_end = raw
        .windows(4)
        .position(|w| w == b"\r\n\r\n")
        .map(|p| p + 4)
        .ok_or_else(|| TransportError::MalformedResponse("no header terminator".into()))?;

    let head = std::str::from_utf8(&raw[..header_end])
        .map_err(|_| TransportError::MalformedResponse("non-utf8 header block".into()))?;
    let mut lines = head.split("\r\n");
    let status_line = lines
        .next()
        .ok_or_else(|| TransportError::MalformedResponse("empty response".into()))?;

    let status = status_line
        .split_whitespace()
        .nth(1)
        .and_then(|s| s.parse::<u16>().ok())
        .ok_or_else(|| {
            TransportError::MalformedResponse(format!("bad status line {status_line:?}"))
        })?;

    let mut body = &raw[header_end..];
    for line in lines {
        let Some((name, value)) = line.split_once(':') else {
            continue;
        };
        if name.eq_ignore_ascii_case("content-length") {
            let len: usize = value.trim().parse().map_err(|_| {
                TransportError::MalformedResponse(format!("bad content-length {value:?}"))
            })?;
            if len > body.len() {
                return Err(TransportError::MalformedResponse(
                    "body shorter than content-length".into(),
                ));
            }
            body = &body[..len];
            break;
        }
    }

    Ok(TransportResponse {
        status,
        body: Bytes::copy_from_slice(body),
    })
}
