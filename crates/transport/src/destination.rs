//! Collector destination parsing.
//!
//! The collector is addressed by a single URL in configuration:
//!
//! - `http://host:port` / `https://host:port` for TCP
//! - `unix:///path/to/collector.sock` for a local socket
//!
//! A missing port falls back to [`DEFAULT_COLLECTOR_PORT`].

use std::path::PathBuf;

use crate::error::TransportError;

/// Default collector port when the URL carries none
pub const DEFAULT_COLLECTOR_PORT: u16 = 8128;

/// Default collector URL (local agent over TCP)
pub const DEFAULT_COLLECTOR_URL: &str = "http://127.0.0.1:8128";

/// Where the collector listens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    /// Filesystem socket path
    Unix(PathBuf),
    /// Host/port/scheme triple
    Tcp {
        scheme: String,
        host: String,
        port: u16,
    },
}

impl Destination {
    /// Parse a collector URL.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::InvalidDestination`] for unknown schemes,
    /// empty hosts/paths, or unparseable ports.
    pub fn parse(url: &str) -> Result<Self, TransportError> {
        let url = url.trim();

        if let Some(path) = url.strip_prefix("unix://") {
            if path.is_empty() {
                return Err(TransportError::InvalidDestination(format!(
                    "empty socket path in {url:?}"
                )));
            }
            return Ok(Self::Unix(PathBuf::from(path)));
        }

        let (scheme, rest) = if let Some(rest) = url.strip_prefix("http://") {
            ("http", rest)
        } else if let Some(rest) = url.strip_prefix("https://") {
            ("https", rest)
        } else {
            return Err(TransportError::InvalidDestination(format!(
                "unsupported scheme in {url:?}"
            )));
        };

        let authority = rest.trim_end_matches('/');
        if authority.is_empty() {
            return Err(TransportError::InvalidDestination(format!(
                "missing host in {url:?}"
            )));
        }

        let (host, port) = match authority.rsplit_once(':') {
            Some((host, port)) => {
                let port = port.parse::<u16>().map_err(|_| {
                    TransportError::InvalidDestination(format!("invalid port in {url:?}"))
                })?;
                (host, port)
            }
            None => (authority, DEFAULT_COLLECTOR_PORT),
        };
        if host.is_empty() {
            return Err(TransportError::InvalidDestination(format!(
                "missing host in {url:?}"
            )));
        }

        Ok(Self::Tcp {
            scheme: scheme.to_owned(),
            host: host.to_owned(),
            port,
        })
    }

    /// Base URL for TCP destinations (`scheme://host:port`), None for unix
    pub fn base_url(&self) -> Option<String> {
        match self {
            Self::Unix(_) => None,
            Self::Tcp { scheme, host, port } => Some(format!("{scheme}://{host}:{port}")),
        }
    }

    /// Whether this destination is a unix socket
    pub fn is_unix(&self) -> bool {
        matches!(self, Self::Unix(_))
    }
}
