//! Exporter configuration.
//!
//! # Defaults
//!
//! - `url`: `http://127.0.0.1:8128`
//! - `max_payload_size`: 8 MiB
//! - `retry_delay`: 500 ms between negotiation probes
//! - `request_timeout`: 2 s per collector request
//! - `flush_interval`: unset (flushing is driven by [`WriterHandle::flush`])
//!
//! Setting `protocol_version` skips collector probing entirely.
//!
//! [`WriterHandle::flush`]: crate::WriterHandle::flush

use std::net::SocketAddr;
use std::time::Duration;

use serde::Deserialize;

use tracewire_transport::DEFAULT_COLLECTOR_URL;

/// Default encode buffer capacity
pub const DEFAULT_MAX_PAYLOAD_SIZE: usize = 8 * 1024 * 1024;

/// Default delay between negotiation probe attempts
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(500);

/// Default collector request timeout
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(2);

/// Default writer command channel capacity
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1024;

/// Identity of the tracer producing the payloads, carried as request
/// headers. Optional fields are omitted from requests when unknown.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TracerIdentity {
    /// Tracer library version
    pub tracer_version: String,
    /// Instrumented application language
    pub lang: Option<String>,
    /// Language/runtime version
    pub lang_version: Option<String>,
    /// Interpreter flavor
    pub lang_interpreter: Option<String>,
}

impl Default for TracerIdentity {
    fn default() -> Self {
        Self {
            tracer_version: env!("CARGO_PKG_VERSION").to_owned(),
            lang: None,
            lang_version: None,
            lang_interpreter: None,
        }
    }
}

/// Trace writer configuration.
///
/// # Example
///
/// ```toml
/// [exporter]
/// url = "unix:///var/run/collector.sock"
/// protocol_version = "v1.0"
/// retry_delay = "500ms"
/// flush_interval = "2s"
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExporterConfig {
    /// Collector URL (`http://`, `https://` or `unix://`)
    pub url: String,

    /// Explicit wire-protocol pin; when set, no probing happens.
    /// A `"v1"` prefix selects the legacy encoding, anything else compact.
    pub protocol_version: Option<String>,

    /// Encode buffer capacity in bytes
    pub max_payload_size: usize,

    /// Delay between negotiation probe attempts
    #[serde(with = "humantime_serde")]
    pub retry_delay: Duration,

    /// Timeout for each collector request
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,

    /// When set, the writer flushes itself on this interval; when unset,
    /// flushing is the caller's job
    #[serde(with = "humantime_serde")]
    pub flush_interval: Option<Duration>,

    /// Capacity of the writer command channel
    pub channel_capacity: usize,

    /// Tracer identity carried on trace requests
    pub identity: TracerIdentity,

    /// Static DNS override handed to the transport: resolve `host` to the
    /// given address instead of asking the system resolver
    #[serde(skip)]
    pub resolve: Option<(String, SocketAddr)>,
}

impl Default for ExporterConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_COLLECTOR_URL.to_owned(),
            protocol_version: None,
            max_payload_size: DEFAULT_MAX_PAYLOAD_SIZE,
            retry_delay: DEFAULT_RETRY_DELAY,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            flush_interval: None,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            identity: TracerIdentity::default(),
            resolve: None,
        }
    }
}

impl ExporterConfig {
    /// Set the collector URL
    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    /// Pin the wire-protocol version, skipping negotiation
    #[must_use]
    pub fn with_protocol_version(mut self, version: impl Into<String>) -> Self {
        self.protocol_version = Some(version.into());
        self
    }

    /// Set the encode buffer capacity
    #[must_use]
    pub fn with_max_payload_size(mut self, bytes: usize) -> Self {
        self.max_payload_size = bytes;
        self
    }

    /// Set the negotiation retry delay
    #[must_use]
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Set the collector request timeout
    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Enable self-driven flushing on an interval
    #[must_use]
    pub fn with_flush_interval(mut self, interval: Duration) -> Self {
        self.flush_interval = Some(interval);
        self
    }

    /// Set the writer command channel capacity
    #[must_use]
    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity;
        self
    }

    /// Set the tracer identity headers
    #[must_use]
    pub fn with_identity(mut self, identity: TracerIdentity) -> Self {
        self.identity = identity;
        self
    }

    /// Override DNS resolution for one host
    #[must_use]
    pub fn with_resolve(mut self, host: impl Into<String>, addr: SocketAddr) -> Self {
        self.resolve = Some((host.into(), addr));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ExporterConfig::default();
        assert_eq!(config.url, DEFAULT_COLLECTOR_URL);
        assert!(config.protocol_version.is_none());
        assert_eq!(config.max_payload_size, 8 * 1024 * 1024);
        assert_eq!(config.retry_delay, Duration::from_millis(500));
        assert!(config.flush_interval.is_none());
    }

    #[test]
    fn test_deserialize_empty() {
        let config: ExporterConfig = toml::from_str("").unwrap();
        assert_eq!(config.url, DEFAULT_COLLECTOR_URL);
        assert_eq!(config.channel_capacity, DEFAULT_CHANNEL_CAPACITY);
    }

    #[test]
    fn test_deserialize_full() {
        let toml = r#"
url = "unix:///var/run/collector.sock"
protocol_version = "v1.0"
max_payload_size = 1048576
retry_delay = "250ms"
request_timeout = "5s"
flush_interval = "2s"

[identity]
tracer_version = "1.2.3"
lang = "rust"
"#;
        let config: ExporterConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.url, "unix:///var/run/collector.sock");
        assert_eq!(config.protocol_version.as_deref(), Some("v1.0"));
        assert_eq!(config.max_payload_size, 1024 * 1024);
        assert_eq!(config.retry_delay, Duration::from_millis(250));
        assert_eq!(config.request_timeout, Duration::from_secs(5));
        assert_eq!(config.flush_interval, Some(Duration::from_secs(2)));
        assert_eq!(config.identity.tracer_version, "1.2.3");
        assert_eq!(config.identity.lang.as_deref(), Some("rust"));
        assert!(config.identity.lang_version.is_none());
    }

    #[test]
    fn test_builder_chain() {
        let config = ExporterConfig::default()
            .with_url("http://localhost:9000")
            .with_protocol_version("v1")
            .with_max_payload_size(1024)
            .with_retry_delay(Duration::from_millis(100))
            .with_flush_interval(Duration::from_secs(1));
        assert_eq!(config.url, "http://localhost:9000");
        assert_eq!(config.protocol_version.as_deref(), Some("v1"));
        assert_eq!(config.max_payload_size, 1024);
        assert_eq!(config.flush_interval, Some(Duration::from_secs(1)));
    }
}
