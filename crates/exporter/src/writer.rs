//! Trace writer: buffering, protocol negotiation, flush orchestration.
//!
//! The writer runs in a dedicated task and owns all buffer state; the
//! cloneable [`WriterHandle`] feeds it through a bounded channel with
//! non-blocking sends, so instrumented code never waits on the exporter.
//!
//! ```text
//! append ──▶ ┌──────────────┐        resolved ┌──────────────┐
//! flush  ──▶ │ WriterHandle │ ──channel──▶    │ Writer task  │
//!            └──────────────┘                 │  - negotiate │
//!                                             │  - encode    │
//!                                             │  - flush     │
//!                                             └──────┬───────┘
//!                                                    │ spawned send
//!                                                    ▼
//!                                             ┌──────────────┐
//!                                             │  collector   │
//!                                             └──────────────┘
//! ```
//!
//! # Lifecycle
//!
//! Until the wire-protocol version is known, appends queue in arrival
//! order and flushes set a pending flag. On resolution the queue replays
//! through the encode path (FIFO), then a pending flush runs. After that,
//! appends encode straight into the buffer and each flush moves the
//! finalized payload into a spawned send task, resetting the buffer
//! immediately: the writer never waits for the network.
//!
//! An ambiguous probe (status other than 200/404, or a transport error)
//! discards the queued traces and the pending-flush flag, then retries
//! after a fixed delay, indefinitely. Bounding memory wins over preserving
//! traces while the collector is unreachable.

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use tokio::sync::mpsc;
use tracing::{debug, trace, warn};

use tracewire_protocol::{ProtocolEncoder, ProtocolVersion, TraceBatch, CONTENT_TYPE};
use tracewire_transport::{headers, AgentTransport, Transport, TransportRequest};

use crate::buffer::EncodeBuffer;
use crate::config::ExporterConfig;
use crate::diagnostics::{LogStartupObserver, StartupGate, StartupObserver};
use crate::error::ExportError;
use crate::metrics::ExportMetrics;
use crate::negotiate::{self, ProbeOutcome};
use crate::sampler::{self, Sampler, SharedRates};

type ProbeFuture = Pin<Box<dyn Future<Output = ProbeOutcome> + Send>>;

/// Commands sent to the writer task.
enum WriterCommand {
    Append(TraceBatch),
    Flush,
    Shutdown,
}

/// Handle for feeding the writer.
///
/// Cheap to clone. Sends never block: if the channel is full the command
/// is dropped and counted.
#[derive(Clone)]
pub struct WriterHandle {
    tx: mpsc::Sender<WriterCommand>,
    metrics: Arc<ExportMetrics>,
}

impl WriterHandle {
    /// Hand one trace batch to the writer (non-blocking, fire-and-forget).
    ///
    /// # Errors
    ///
    /// [`ExportError::ChannelFull`] if the writer is backed up (the batch
    /// is dropped; do not retry), [`ExportError::Closed`] if it shut down.
    pub fn append(&self, batch: TraceBatch) -> Result<(), ExportError> {
        self.send(WriterCommand::Append(batch))
    }

    /// Request a flush of everything buffered so far.
    ///
    /// # Errors
    ///
    /// Same conditions as [`append`](Self::append).
    pub fn flush(&self) -> Result<(), ExportError> {
        self.send(WriterCommand::Flush)
    }

    /// Shut the writer down after a final flush.
    ///
    /// # Errors
    ///
    /// Same conditions as [`append`](Self::append).
    pub fn shutdown(&self) -> Result<(), ExportError> {
        self.send(WriterCommand::Shutdown)
    }

    /// Counters for export activity
    pub fn metrics(&self) -> Arc<ExportMetrics> {
        Arc::clone(&self.metrics)
    }

    fn send(&self, command: WriterCommand) -> Result<(), ExportError> {
        self.tx.try_send(command).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => {
                self.metrics.channel_drops.fetch_add(1, Ordering::Relaxed);
                ExportError::ChannelFull
            }
            mpsc::error::TrySendError::Closed(_) => ExportError::Closed,
        })
    }
}

/// Negotiation state. No transition leaves `Resolved`.
enum NegotiationState {
    /// Probe not yet dispatched
    Pending,
    /// Probe in flight or awaiting its retry delay
    Probing,
    /// Version fixed for the writer's lifetime, encoder selected
    Resolved(ProtocolEncoder),
}

/// The trace writer task.
pub struct Writer {
    config: ExporterConfig,
    rx: mpsc::Receiver<WriterCommand>,
    transport: Arc<dyn Transport>,
    sampler: Arc<dyn Sampler>,
    startup: StartupGate,
    metrics: Arc<ExportMetrics>,
    state: NegotiationState,
    buffer: EncodeBuffer,
    pending: VecDeque<TraceBatch>,
    flush_pending: bool,
}

impl Writer {
    /// Create a writer and its handle with default collaborators.
    ///
    /// # Errors
    ///
    /// Fails if the collector URL does not parse or the transport cannot
    /// be built.
    pub fn new(config: ExporterConfig) -> Result<(Self, WriterHandle), ExportError> {
        let transport = AgentTransport::from_url(
            &config.url,
            config.request_timeout,
            config.resolve.clone(),
        )?;
        Ok(Self::with_collaborators(
            config,
            Arc::new(transport),
            Arc::new(SharedRates::new()),
            Arc::new(LogStartupObserver),
        ))
    }

    /// Create a writer with explicit collaborators.
    pub fn with_collaborators(
        config: ExporterConfig,
        transport: Arc<dyn Transport>,
        sampler: Arc<dyn Sampler>,
        observer: Arc<dyn StartupObserver>,
    ) -> (Self, WriterHandle) {
        let (tx, rx) = mpsc::channel(config.channel_capacity.max(1));
        let metrics = Arc::new(ExportMetrics::default());
        let buffer = EncodeBuffer::new(config.max_payload_size);

        let writer = Self {
            config,
            rx,
            transport,
            sampler,
            startup: StartupGate::new(observer),
            metrics: Arc::clone(&metrics),
            state: NegotiationState::Pending,
            buffer,
            pending: VecDeque::new(),
            flush_pending: false,
        };
        let handle = WriterHandle { tx, metrics };

        (writer, handle)
    }

    /// Run the writer loop.
    ///
    /// Spawn this as a task. It runs until shutdown is requested or every
    /// handle is dropped.
    ///
    /// # Errors
    ///
    /// Returns only on non-recoverable encoder failures; everything the
    /// network does is absorbed, logged, and counted.
    pub async fn run(mut self) -> Result<(), ExportError> {
        if let Some(pin) = self.config.protocol_version.clone() {
            let version = ProtocolVersion::from_config_str(&pin);
            debug!(%version, pin = %pin, "protocol version pinned by configuration");
            self.resolve(version)?;
        }

        let mut probe: Option<ProbeFuture> = None;
        if !matches!(self.state, NegotiationState::Resolved(_)) {
            probe = Some(self.start_probe(None));
        }

        let mut flush_tick = self.config.flush_interval.map(|interval| {
            let mut tick = tokio::time::interval(interval);
            tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            tick
        });

        loop {
            tokio::select! {
                outcome = async {
                    match probe.as_mut() {
                        Some(probe) => probe.await,
                        None => std::future::pending().await,
                    }
                } => {
                    probe = None;
                    match outcome {
                        ProbeOutcome::Version(version) => self.resolve(version)?,
                        ProbeOutcome::Ambiguous => {
                            self.drop_pending();
                            probe = Some(self.start_probe(Some(self.config.retry_delay)));
                        }
                    }
                }
                _ = async {
                    match flush_tick.as_mut() {
                        Some(tick) => { tick.tick().await; }
                        None => std::future::pending().await,
                    }
                } => {
                    self.flush();
                }
                command = self.rx.recv() => match command {
                    Some(WriterCommand::Append(batch)) => self.append(batch)?,
                    Some(WriterCommand::Flush) => self.flush(),
                    Some(WriterCommand::Shutdown) | None => {
                        debug!("trace writer shutting down");
                        self.flush();
                        return Ok(());
                    }
                },
            }
        }
    }

    fn start_probe(&mut self, delay: Option<Duration>) -> ProbeFuture {
        self.state = NegotiationState::Probing;
        if delay.is_some() {
            self.metrics.probe_retries.fetch_add(1, Ordering::Relaxed);
        }
        Box::pin(negotiate::run_probe(
            Arc::clone(&self.transport),
            self.startup.clone(),
            delay,
        ))
    }

    /// Discard everything queued behind an unresolved protocol.
    fn drop_pending(&mut self) {
        let dropped = self.pending.len();
        if dropped > 0 || self.flush_pending {
            warn!(dropped, "negotiation inconclusive, discarding queued traces");
        }
        self.metrics
            .pending_dropped
            .fetch_add(dropped as u64, Ordering::Relaxed);
        self.pending.clear();
        self.flush_pending = false;
    }

    /// Fix the protocol version, replay the queue, honor a deferred flush.
    fn resolve(&mut self, version: ProtocolVersion) -> Result<(), ExportError> {
        let mut encoder = ProtocolEncoder::for_version(version);
        self.buffer.reset(&mut encoder);
        self.state = NegotiationState::Resolved(encoder);
        debug!(%version, "wire protocol resolved");

        let queued = std::mem::take(&mut self.pending);
        for batch in queued {
            self.encode_one(batch)?;
        }
        if std::mem::take(&mut self.flush_pending) {
            self.flush();
        }
        Ok(())
    }

    fn append(&mut self, batch: TraceBatch) -> Result<(), ExportError> {
        self.metrics.appends.fetch_add(1, Ordering::Relaxed);
        match self.state {
            NegotiationState::Resolved(_) => self.encode_one(batch),
            _ => {
                self.pending.push_back(batch);
                trace!(queued = self.pending.len(), "trace queued awaiting protocol resolution");
                Ok(())
            }
        }
    }

    fn encode_one(&mut self, batch: TraceBatch) -> Result<(), ExportError> {
        let NegotiationState::Resolved(encoder) = &mut self.state else {
            debug_assert!(false, "encode before protocol resolution");
            return Ok(());
        };
        match self.buffer.append(encoder, &batch) {
            Ok(()) => {
                self.metrics.traces_encoded.fetch_add(1, Ordering::Relaxed);
                Ok(())
            }
            Err(e) if e.is_recoverable() => {
                warn!(error = %e, spans = batch.len(), "trace dropped, does not fit in encode buffer");
                self.metrics.overflow_drops.fetch_add(1, Ordering::Relaxed);
                Ok(())
            }
            Err(e) => Err(ExportError::Encode(e)),
        }
    }

    fn flush(&mut self) {
        let NegotiationState::Resolved(encoder) = &mut self.state else {
            self.flush_pending = true;
            trace!("flush deferred until protocol resolution");
            return;
        };
        if self.buffer.is_empty() {
            trace!("flush skipped, no traces buffered");
            return;
        }

        let version = encoder.version();
        let (payload, count) = self.buffer.finish(encoder);
        self.metrics.flushes.fetch_add(1, Ordering::Relaxed);
        debug!(traces = count, bytes = payload.len(), %version, "dispatching trace payload");
        self.dispatch(payload, count, version);
    }

    /// Send one finalized payload without blocking the writer loop.
    fn dispatch(&self, payload: Bytes, count: u32, version: ProtocolVersion) {
        let request = self.trace_request(version, payload, count);
        let transport = Arc::clone(&self.transport);
        let sampler = Arc::clone(&self.sampler);
        let startup = self.startup.clone();
        let metrics = Arc::clone(&self.metrics);

        tokio::spawn(async move {
            let result = transport.request(request).await;
            startup.report(result.as_ref().map(|r| r.status).map_err(|e| e));

            match result {
                Ok(response) => {
                    metrics.record_response(response.status);
                    if (200..300).contains(&response.status) {
                        debug!(status = response.status, traces = count, "trace payload delivered");
                        match sampler::parse_rate_response(&response.body) {
                            Ok(rates) => sampler.update(rates),
                            Err(e) => {
                                metrics
                                    .response_parse_failures
                                    .fetch_add(1, Ordering::Relaxed);
                                debug!(error = %e, "ignoring malformed rate table in collector response");
                            }
                        }
                    } else {
                        warn!(status = response.status, traces = count, "collector rejected trace payload");
                    }
                }
                Err(e) => {
                    metrics.record_request_error(e.kind());
                    warn!(error = %e, kind = e.kind(), traces = count, "trace payload lost, transport request failed");
                }
            }
        });
    }

    fn trace_request(&self, version: ProtocolVersion, payload: Bytes, count: u32) -> TransportRequest {
        let identity = &self.config.identity;
        let mut request = TransportRequest::put(version.traces_path())
            .with_header("Content-Type", CONTENT_TYPE)
            .with_header(headers::TRACE_COUNT, count.to_string())
            .with_header(headers::TRACER_VERSION, identity.tracer_version.clone());
        if let Some(lang) = &identity.lang {
            request = request.with_header(headers::LANG, lang.clone());
        }
        if let Some(lang_version) = &identity.lang_version {
            request = request.with_header(headers::LANG_VERSION, lang_version.clone());
        }
        if let Some(interpreter) = &identity.lang_interpreter {
            request = request.with_header(headers::LANG_INTERPRETER, interpreter.clone());
        }
        request.with_body(payload)
    }
}
