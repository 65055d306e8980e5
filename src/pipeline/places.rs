use serde::Deserialize;

use super::search::{build_http_client, HospitalSearch, SearchError};
use crate::models::{GeoPoint, HospitalCandidate};

const PLACES_BASE_URL: &str = "https://maps.googleapis.com/maps/api/place";

/// Google Places nearby search restricted to `type=hospital`.
///
/// Results keep the API's own ranking.
pub struct PlacesSearch {
    base_url: String,
    api_key: String,
    client: reqwest::blocking::Client,
}

impl PlacesSearch {
    pub fn new(api_key: &str) -> Result<Self, SearchError> {
        Self::with_base_url(PLACES_BASE_URL, api_key)
    }

    pub fn with_base_url(base_url: &str, api_key: &str) -> Result<Self, SearchError> {
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            client: build_http_client()?,
        })
    }
}

#[derive(Deserialize)]
struct NearbyResponse {
    #[serde(default)]
    results: Vec<Place>,
    status: String,
    #[serde(default)]
    error_message: Option<String>,
}

#[derive(Deserialize)]
struct Place {
    name: String,
    #[serde(default)]
    geometry: Option<Geometry>,
}

#[derive(Deserialize)]
struct Geometry {
    location: LatLng,
}

#[derive(Deserialize)]
struct LatLng {
    lat: f64,
    lng: f64,
}

fn candidates_from(response: NearbyResponse, center: GeoPoint) -> Result<Vec<HospitalCandidate>, SearchError> {
    match response.status.as_str() {
        "OK" | "ZERO_RESULTS" => {}
        other => {
            let detail = response
                .error_message
                .map(|m| format!("{other}: {m}"))
                .unwrap_or_else(|| other.to_string());
            return Err(SearchError::Rejected(detail));
        }
    }

    Ok(response
        .results
        .into_iter()
        .map(|place| {
            let location = place.geometry.map(|g| GeoPoint {
                latitude: g.location.lat,
                longitude: g.location.lng,
            });
            HospitalCandidate {
                name: place.name,
                distance_km: location.map(|l| center.distance_km(&l)),
                location,
                specialty: "General".to_string(),
                emergency: false,
            }
        })
        .collect())
}

impl HospitalSearch for PlacesSearch {
    fn nearby_hospitals(
        &self,
        center: GeoPoint,
        radius_m: u32,
    ) -> Result<Vec<HospitalCandidate>, SearchError> {
        let url = format!("{}/nearbysearch/json", self.base_url);
        let location = format!("{},{}", center.latitude, center.longitude);
        let radius = radius_m.to_string();

        let response = self
            .client
            .get(&url)
            .query(&[
                ("location", location.as_str()),
                ("radius", radius.as_str()),
                ("type", "hospital"),
                ("key", self.api_key.as_str()),
            ])
            .send()?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(SearchError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: NearbyResponse = response.json()?;
        let hospitals = candidates_from(parsed, center)?;
        tracing::debug!(count = hospitals.len(), "Places nearby search returned hospitals");
        Ok(hospitals)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SF: GeoPoint = GeoPoint {
        latitude: 37.7749,
        longitude: -122.4194,
    };

    #[test]
    fn results_keep_api_order() {
        let parsed: NearbyResponse = serde_json::from_str(
            r#"{
                "status": "OK",
                "results": [
                    {"name": "Far Memorial", "geometry": {"location": {"lat": 37.80, "lng": -122.27}}},
                    {"name": "Close General", "geometry": {"location": {"lat": 37.776, "lng": -122.42}}}
                ]
            }"#,
        )
        .unwrap();
        let hospitals = candidates_from(parsed, SF).unwrap();
        assert_eq!(hospitals[0].name, "Far Memorial");
        assert_eq!(hospitals[1].name, "Close General");
        assert!(hospitals[0].distance_km.unwrap() > hospitals[1].distance_km.unwrap());
    }

    #[test]
    fn zero_results_is_empty_not_error() {
        let parsed: NearbyResponse =
            serde_json::from_str(r#"{"status": "ZERO_RESULTS", "results": []}"#).unwrap();
        assert!(candidates_from(parsed, SF).unwrap().is_empty());
    }

    #[test]
    fn denied_request_is_rejected() {
        let parsed: NearbyResponse = serde_json::from_str(
            r#"{"status": "REQUEST_DENIED", "error_message": "The provided API key is invalid."}"#,
        )
        .unwrap();
        let err = candidates_from(parsed, SF).unwrap_err();
        assert!(matches!(err, SearchError::Rejected(m) if m.starts_with("REQUEST_DENIED")));
    }
}
