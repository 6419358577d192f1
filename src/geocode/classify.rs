//! Quality signals for a resolved result set.

use crate::domain::{MatchEntry, QualitySignals};

/// Derive the three quality signals from a non-empty result set.
///
/// Pure: the same input always yields the same signals. An empty slice yields
/// all-false signals.
pub fn classify(results: &[MatchEntry]) -> QualitySignals {
    let single_match = results.len() == 1;
    let exact_match = single_match && !results[0].is_partial();
    let precise_location = results
        .first()
        .is_some_and(|m| m.geometry.location_type.is_highest_precision());

    QualitySignals {
        single_match,
        exact_match,
        precise_location,
    }
}
