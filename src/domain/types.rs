//! Shared domain types.
//!
//! These mirror the geocoding service's response shape closely enough to be
//! deserialized directly, and stay serializable so classified rows can be
//! exported.

use serde::{Deserialize, Serialize};

/// Status string the service returns for a successful lookup.
pub const STATUS_OK: &str = "OK";
/// Status string the service returns when the caller is over its query rate.
pub const STATUS_OVER_QUERY_LIMIT: &str = "OVER_QUERY_LIMIT";
/// Status reported when the service answered with no matches.
pub const STATUS_ZERO_RESULTS: &str = "ZERO_RESULTS";

/// One ingested input row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressRecord {
    /// Raw address text, exactly as it appeared in the input.
    pub text: String,
    /// 0-based position in the ingested sequence.
    pub position: usize,
}

impl AddressRecord {
    pub fn new(position: usize, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            position,
        }
    }
}

/// How exact a match's coordinates are, highest precision first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LocationType {
    Rooftop,
    RangeInterpolated,
    GeometricCenter,
    Approximate,
    #[serde(other)]
    Unknown,
}

impl LocationType {
    /// The service's highest-precision tier.
    pub fn is_highest_precision(self) -> bool {
        self == LocationType::Rooftop
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Geometry {
    pub location: LatLng,
    pub location_type: LocationType,
}

/// One candidate match in a result set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchEntry {
    #[serde(default)]
    pub formatted_address: Option<String>,
    pub geometry: Geometry,
    /// Present only when the service matched part of the query.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partial_match: Option<bool>,
}

impl MatchEntry {
    /// Any marker counts, whatever its value.
    pub fn is_partial(&self) -> bool {
        self.partial_match.is_some()
    }
}

/// Raw answer of the external service: `(resultSet, statusCode)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeocodeResponse {
    #[serde(default)]
    pub results: Vec<MatchEntry>,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl GeocodeResponse {
    /// A response with no matches and the given status.
    pub fn status_only(status: impl Into<String>) -> Self {
        Self {
            results: Vec::new(),
            status: status.into(),
            error_message: None,
        }
    }
}

/// Normalized result of one geocode call.
#[derive(Debug, Clone, PartialEq)]
pub enum GeocodeOutcome {
    /// Success with at least one match.
    Resolved { results: Vec<MatchEntry> },
    /// Service-imposed backpressure; the same address must be retried.
    RateLimited,
    /// Any other non-success status. Terminal for the address.
    Failed { status: String },
}

/// The three boolean quality signals derived from a result set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct QualitySignals {
    pub single_match: bool,
    pub exact_match: bool,
    pub precise_location: bool,
}

/// Coarse confidence tier, derived from the quality signals and status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    /// Single, exact and rooftop-precise.
    High,
    /// Single, with either exactness or precision but not both.
    Partial,
    /// Resolved, but ambiguous or imprecise.
    Unconfirmed,
    /// The service did not resolve the address.
    Failed,
}

impl Confidence {
    pub const ALL: [Confidence; 4] = [
        Confidence::High,
        Confidence::Partial,
        Confidence::Unconfirmed,
        Confidence::Failed,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Confidence::High => "high",
            Confidence::Partial => "partial",
            Confidence::Unconfirmed => "unconfirmed",
            Confidence::Failed => "failed",
        }
    }
}

/// Final per-address report.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedResult {
    pub address: String,
    pub signals: QualitySignals,
    pub status: String,
    /// Coordinates of the first match, when resolved.
    pub location: Option<LatLng>,
    pub formatted_address: Option<String>,
}

impl ClassifiedResult {
    pub fn is_single_match(&self) -> bool {
        self.signals.single_match
    }

    pub fn is_exact_match(&self) -> bool {
        self.signals.exact_match
    }

    pub fn is_precise_location(&self) -> bool {
        self.signals.precise_location
    }

    pub fn confidence(&self) -> Confidence {
        let s = self.signals;
        if s.single_match && s.exact_match && s.precise_location {
            Confidence::High
        } else if s.single_match && (s.exact_match || s.precise_location) {
            Confidence::Partial
        } else if self.status != STATUS_OK {
            Confidence::Failed
        } else {
            Confidence::Unconfirmed
        }
    }
}

/// A classified result together with the row index it is displayed under.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportedRow {
    pub index: usize,
    pub result: ClassifiedResult,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(signals: QualitySignals, status: &str) -> ClassifiedResult {
        ClassifiedResult {
            address: "x".to_string(),
            signals,
            status: status.to_string(),
            location: None,
            formatted_address: None,
        }
    }

    #[test]
    fn confidence_tiers() {
        let all = QualitySignals {
            single_match: true,
            exact_match: true,
            precise_location: true,
        };
        assert_eq!(result(all, STATUS_OK).confidence(), Confidence::High);

        let single_exact = QualitySignals {
            precise_location: false,
            ..all
        };
        assert_eq!(result(single_exact, STATUS_OK).confidence(), Confidence::Partial);

        let ambiguous = QualitySignals {
            single_match: false,
            exact_match: false,
            precise_location: true,
        };
        assert_eq!(result(ambiguous, STATUS_OK).confidence(), Confidence::Unconfirmed);

        assert_eq!(
            result(QualitySignals::default(), STATUS_ZERO_RESULTS).confidence(),
            Confidence::Failed
        );
    }

    #[test]
    fn any_partial_marker_is_partial() {
        let entry: MatchEntry = serde_json::from_str(
            r#"{ "geometry": { "location": { "lat": 0.0, "lng": 0.0 }, "location_type": "ROOFTOP" }, "partial_match": false }"#,
        )
        .unwrap();
        assert!(entry.is_partial());

        let entry = MatchEntry {
            partial_match: None,
            ..entry
        };
        assert!(!entry.is_partial());
    }

    #[test]
    fn unknown_location_type_deserializes() {
        let t: LocationType = serde_json::from_str("\"SOMETHING_NEW\"").unwrap();
        assert_eq!(t, LocationType::Unknown);
        let t: LocationType = serde_json::from_str("\"ROOFTOP\"").unwrap();
        assert!(t.is_highest_precision());
    }
}
