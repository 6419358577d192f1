//! Geocoding: the external service seam, status normalization and
//! classification.
//!
//! The rest of the crate never looks at the service's status vocabulary; it
//! only sees the three-variant `GeocodeOutcome` produced by `invoke`.

use crate::domain::{
    ClassifiedResult, GeocodeOutcome, GeocodeResponse, QualitySignals, STATUS_OK,
    STATUS_OVER_QUERY_LIMIT, STATUS_ZERO_RESULTS,
};

pub mod classify;
pub mod google;

pub use classify::classify;
pub use google::{GoogleGeocoder, GoogleSettings};

/// The external geocoding service: one free-text lookup per call.
///
/// Implementations report transport problems as status strings rather than
/// errors, so every call yields a value.
pub trait Geocoder {
    fn geocode(&self, address: &str) -> GeocodeResponse;
}

/// Perform exactly one call to the service and normalize its answer.
pub fn invoke<G: Geocoder + ?Sized>(geocoder: &G, address: &str) -> GeocodeOutcome {
    normalize(geocoder.geocode(address))
}

/// Map a raw `(resultSet, status)` pair onto `GeocodeOutcome`.
pub fn normalize(response: GeocodeResponse) -> GeocodeOutcome {
    let GeocodeResponse {
        results,
        status,
        error_message,
    } = response;

    if let Some(message) = &error_message {
        log::warn!("Geocoding service reported {status}: {message}");
    }

    match status.as_str() {
        STATUS_OK if results.is_empty() => GeocodeOutcome::Failed {
            status: STATUS_ZERO_RESULTS.to_string(),
        },
        STATUS_OK => GeocodeOutcome::Resolved { results },
        STATUS_OVER_QUERY_LIMIT => GeocodeOutcome::RateLimited,
        _ => GeocodeOutcome::Failed { status },
    }
}

/// Build the per-address report for a terminal outcome.
///
/// Returns `None` for `RateLimited`, which never produces a row.
pub fn classify_outcome(address: &str, outcome: &GeocodeOutcome) -> Option<ClassifiedResult> {
    match outcome {
        GeocodeOutcome::Resolved { results } => {
            let first = results.first();
            Some(ClassifiedResult {
                address: address.to_string(),
                signals: classify(results),
                status: STATUS_OK.to_string(),
                location: first.map(|m| m.geometry.location),
                formatted_address: first.and_then(|m| m.formatted_address.clone()),
            })
        }
        GeocodeOutcome::Failed { status } => Some(ClassifiedResult {
            address: address.to_string(),
            signals: QualitySignals::default(),
            status: status.clone(),
            location: None,
            formatted_address: None,
        }),
        GeocodeOutcome::RateLimited => None,
    }
}
