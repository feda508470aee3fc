//! Wire header names.
//!
//! Centralized so the writer and tests assemble requests against the same
//! names the collector matches on. Identity headers are omitted from a
//! request when the corresponding value is unknown.

/// Decimal trace count carried on every trace request, as a string
pub const TRACE_COUNT: &str = "X-Tracewire-Trace-Count";

/// Version of the tracer library producing the payload
pub const TRACER_VERSION: &str = "X-Tracewire-Tracer-Version";

/// Language of the instrumented application
pub const LANG: &str = "X-Tracewire-Lang";

/// Language/runtime version
pub const LANG_VERSION: &str = "X-Tracewire-Lang-Version";

/// Runtime interpreter flavor
pub const LANG_INTERPRETER: &str = "X-Tracewire-Lang-Interpreter";
