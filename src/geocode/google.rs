//! Google Maps Geocoding API integration.

use std::time::Duration;

use reqwest::StatusCode;
use reqwest::blocking::Client;

use crate::domain::{GeocodeResponse, STATUS_OVER_QUERY_LIMIT};
use crate::error::AppError;
use crate::geocode::Geocoder;

pub const DEFAULT_ENDPOINT: &str = "https://maps.googleapis.com/maps/api/geocode/json";
pub const API_KEY_ENV: &str = "GOOGLE_MAPS_API_KEY";

/// Status reported when the service could not be contacted.
pub const STATUS_TRANSPORT_ERROR: &str = "ERROR";
/// Status reported when a call exceeded the per-call timeout.
pub const STATUS_TIMEOUT: &str = "TIMEOUT";
/// Status reported when the body was not a geocoding response.
pub const STATUS_INVALID_RESPONSE: &str = "INVALID_RESPONSE";

#[derive(Debug, Clone)]
pub struct GoogleSettings {
    pub api_key: String,
    pub endpoint: String,
    pub timeout: Duration,
    /// Region bias (ccTLD, e.g. `uk`).
    pub region: Option<String>,
    pub language: Option<String>,
}

pub struct GoogleGeocoder {
    client: Client,
    settings: GoogleSettings,
}

impl GoogleGeocoder {
    pub fn new(settings: GoogleSettings) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(settings.timeout)
            .build()
            .map_err(|e| AppError::runtime(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { client, settings })
    }

    /// Resolve the API key from an explicit value or the process environment.
    pub fn api_key_from(explicit: Option<String>) -> Result<String, AppError> {
        if let Some(key) = explicit.filter(|k| !k.trim().is_empty()) {
            return Ok(key);
        }
        std::env::var(API_KEY_ENV)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| AppError::input(format!("Missing {API_KEY_ENV} in environment (.env).")))
    }

    fn fetch(&self, address: &str) -> Result<GeocodeResponse, String> {
        let mut query: Vec<(&str, &str)> = vec![("address", address), ("key", self.settings.api_key.as_str())];
        if let Some(region) = &self.settings.region {
            query.push(("region", region.as_str()));
        }
        if let Some(language) = &self.settings.language {
            query.push(("language", language.as_str()));
        }

        let resp = self
            .client
            .get(&self.settings.endpoint)
            .query(&query)
            .send()
            .map_err(|e| {
                if e.is_timeout() {
                    log::warn!("Geocoding request for '{address}' timed out");
                    STATUS_TIMEOUT.to_string()
                } else {
                    log::warn!("Geocoding request for '{address}' failed: {e}");
                    STATUS_TRANSPORT_ERROR.to_string()
                }
            })?;

        let http_status = resp.status();
        if http_status == StatusCode::TOO_MANY_REQUESTS {
            return Ok(GeocodeResponse::status_only(STATUS_OVER_QUERY_LIMIT));
        }
        if !http_status.is_success() {
            log::warn!("Geocoding request failed with HTTP status {http_status}");
            return Err(format!("HTTP_{}", http_status.as_u16()));
        }

        let body = resp.text().map_err(|e| {
            if e.is_timeout() {
                STATUS_TIMEOUT.to_string()
            } else {
                log::warn!("Failed to read geocoding response: {e}");
                STATUS_TRANSPORT_ERROR.to_string()
            }
        })?;

        parse_response_body(&body).map_err(|e| {
            log::warn!("Failed to parse geocoding response: {e}");
            STATUS_INVALID_RESPONSE.to_string()
        })
    }
}

impl Geocoder for GoogleGeocoder {
    fn geocode(&self, address: &str) -> GeocodeResponse {
        self.fetch(address).unwrap_or_else(GeocodeResponse::status_only)
    }
}

/// Parse a Geocoding API JSON body.
pub fn parse_response_body(body: &str) -> Result<GeocodeResponse, serde_json::Error> {
    serde_json::from_str(body)
}
