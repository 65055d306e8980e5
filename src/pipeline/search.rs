//! Nearby-hospital search capability.

use std::sync::Mutex;
use std::time::Duration;

use thiserror::Error;

use crate::models::{GeoPoint, HospitalCandidate};

/// Outbound search calls use a fixed short timeout.
pub const SEARCH_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Error, Debug)]
pub enum SearchError {
    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("Search API returned error (status {status}): {body}")]
    Api { status: u16, body: String },

    #[error("Search API rejected the request: {0}")]
    Rejected(String),

    #[error("Response parsing error: {0}")]
    ResponseParsing(String),
}

impl From<reqwest::Error> for SearchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            SearchError::HttpClient(format!("Request timed out after {}s", SEARCH_TIMEOUT.as_secs()))
        } else if e.is_decode() {
            SearchError::ResponseParsing(e.to_string())
        } else {
            SearchError::HttpClient(e.to_string())
        }
    }
}

/// Places/geocoding service abstraction (allows mocking).
pub trait HospitalSearch: Send + Sync {
    /// Hospitals within `radius_m` metres of `center`, in the order the
    /// backend chooses to rank them.
    fn nearby_hospitals(
        &self,
        center: GeoPoint,
        radius_m: u32,
    ) -> Result<Vec<HospitalCandidate>, SearchError>;
}

pub(crate) fn build_http_client() -> Result<reqwest::blocking::Client, SearchError> {
    reqwest::blocking::Client::builder()
        .timeout(SEARCH_TIMEOUT)
        .build()
        .map_err(|e| SearchError::HttpClient(format!("Failed to create HTTP client: {e}")))
}

/// Mock search for testing: fixed results or a fixed failure.
pub struct MockHospitalSearch {
    result: Result<Vec<HospitalCandidate>, String>,
    calls: Mutex<Vec<(GeoPoint, u32)>>,
}

impl MockHospitalSearch {
    pub fn with_results(results: Vec<HospitalCandidate>) -> Self {
        Self {
            result: Ok(results),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn named(names: &[&str]) -> Self {
        Self::with_results(names.iter().map(|n| HospitalCandidate::named(*n)).collect())
    }

    pub fn empty() -> Self {
        Self::with_results(Vec::new())
    }

    pub fn failing(message: &str) -> Self {
        Self {
            result: Err(message.to_string()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<(GeoPoint, u32)> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

impl HospitalSearch for MockHospitalSearch {
    fn nearby_hospitals(
        &self,
        center: GeoPoint,
        radius_m: u32,
    ) -> Result<Vec<HospitalCandidate>, SearchError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push((center, radius_m));
        }
        self.result
            .clone()
            .map_err(SearchError::HttpClient)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_is_object_safe() {
        fn _assert(_: &dyn HospitalSearch) {}
    }

    #[test]
    fn mock_records_calls() {
        let mock = MockHospitalSearch::named(&["A", "B"]);
        let center = GeoPoint { latitude: 1.0, longitude: 2.0 };
        let results = mock.nearby_hospitals(center, 5000).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(mock.calls(), vec![(center, 5000)]);
    }

    #[test]
    fn failing_mock_errors() {
        let mock = MockHospitalSearch::failing("offline");
        let center = GeoPoint { latitude: 0.0, longitude: 0.0 };
        assert!(mock.nearby_hospitals(center, 1).is_err());
    }
}
