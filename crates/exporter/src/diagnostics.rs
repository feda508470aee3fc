//! Startup diagnostics.
//!
//! The outcome of the very first collector request a writer makes (usually
//! the negotiation probe, or the first payload send when the version is
//! pinned) is reported exactly once, no matter how many requests follow.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{info, warn};

use tracewire_transport::TransportError;

/// Receiver of the one-time first-request report.
pub trait StartupObserver: Send + Sync {
    /// Called once with the status of the writer's first completed request,
    /// or the error that failed it.
    fn first_request_outcome(&self, outcome: Result<u16, &TransportError>);
}

/// Default observer: log whether the collector was reachable.
#[derive(Debug, Default)]
pub struct LogStartupObserver;

impl StartupObserver for LogStartupObserver {
    fn first_request_outcome(&self, outcome: Result<u16, &TransportError>) {
        match outcome {
            Ok(status) => info!(status, "collector reachable, first request completed"),
            Err(e) => warn!(error = %e, "collector unreachable on first request"),
        }
    }
}

/// Fires the observer for the first completed request only.
///
/// Cloned into the probe and every send task; the atomic flag makes sure
/// exactly one of them reports.
#[derive(Clone)]
pub struct StartupGate {
    observer: Arc<dyn StartupObserver>,
    fired: Arc<AtomicBool>,
}

impl StartupGate {
    /// Wrap an observer in a one-shot gate
    pub fn new(observer: Arc<dyn StartupObserver>) -> Self {
        Self {
            observer,
            fired: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Report an outcome; a no-op after the first call
    pub fn report(&self, outcome: Result<u16, &TransportError>) {
        if self.fired.swap(true, Ordering::SeqCst) {
            return;
        }
        self.observer.first_request_outcome(outcome);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::AtomicUsize;

    #[derive(Default)]
    struct CountingObserver {
        calls: AtomicUsize,
        last_ok: AtomicBool,
    }

    impl StartupObserver for CountingObserver {
        fn first_request_outcome(&self, outcome: Result<u16, &TransportError>) {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.last_ok.store(outcome.is_ok(), Ordering::SeqCst);
        }
    }

    #[test]
    fn test_gate_fires_once() {
        let observer = Arc::new(CountingObserver::default());
        let gate = StartupGate::new(observer.clone());

        gate.report(Err(&TransportError::Timeout));
        gate.report(Ok(200));
        gate.report(Ok(200));

        assert_eq!(observer.calls.load(Ordering::SeqCst), 1);
        // the first outcome won, even though it was a failure
        assert!(!observer.last_ok.load(Ordering::SeqCst));
    }

    #[test]
    fn test_clones_share_the_gate() {
        let observer = Arc::new(CountingObserver::default());
        let gate = StartupGate::new(observer.clone());
        let clone = gate.clone();

        clone.report(Ok(200));
        gate.report(Ok(404));

        assert_eq!(observer.calls.load(Ordering::SeqCst), 1);
    }
}
