//! Sampling-rate plumbing.
//!
//! The collector's flush response carries a `rate_by_service` table mapping
//! service keys to sampling rates. The writer parses it and hands it to the
//! [`Sampler`] collaborator; deciding what to do with the rates is not the
//! exporter's business.

use std::collections::HashMap;
use std::sync::RwLock;

use serde::Deserialize;

/// Consumer of collector-provided sampling rates.
pub trait Sampler: Send + Sync {
    /// Replace the rate table with the collector's latest
    fn update(&self, rates: HashMap<String, f64>);
}

#[derive(Debug, Deserialize)]
struct RateResponse {
    #[serde(default)]
    rate_by_service: HashMap<String, f64>,
}

/// Parse a collector flush response body into a rate table.
///
/// # Errors
///
/// Returns the JSON error for malformed bodies; the caller logs and counts
/// it, never fails on it.
pub fn parse_rate_response(body: &[u8]) -> Result<HashMap<String, f64>, serde_json::Error> {
    serde_json::from_slice::<RateResponse>(body).map(|r| r.rate_by_service)
}

/// Default [`Sampler`]: keeps the latest table behind a lock for lookup.
#[derive(Debug, Default)]
pub struct SharedRates {
    rates: RwLock<HashMap<String, f64>>,
}

impl SharedRates {
    /// Create an empty rate table
    pub fn new() -> Self {
        Self::default()
    }

    /// Current rate for a service key, if the collector reported one
    pub fn rate_for(&self, service_key: &str) -> Option<f64> {
        self.rates.read().ok()?.get(service_key).copied()
    }
}

impl Sampler for SharedRates {
    fn update(&self, rates: HashMap<String, f64>) {
        if let Ok(mut guard) = self.rates.write() {
            *guard = rates;
        }
    }
}
