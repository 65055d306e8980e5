use serde::Deserialize;

use super::search::{build_http_client, HospitalSearch, SearchError};
use crate::models::{GeoPoint, HospitalCandidate};

const OVERPASS_URL: &str = "https://overpass-api.de/api/interpreter";

/// OpenStreetMap Overpass search for `amenity=hospital` nodes.
///
/// Unlike the Places backend, results are sorted nearest first.
pub struct OverpassSearch {
    url: String,
    client: reqwest::blocking::Client,
}

impl OverpassSearch {
    pub fn new() -> Result<Self, SearchError> {
        Self::with_url(OVERPASS_URL)
    }

    pub fn with_url(url: &str) -> Result<Self, SearchError> {
        Ok(Self {
            url: url.to_string(),
            client: build_http_client()?,
        })
    }
}

/// Overpass QL for hospital nodes around a point.
pub fn build_query(center: GeoPoint, radius_m: u32) -> String {
    format!(
        "[out:json];\nnode[\"amenity\"=\"hospital\"](around:{radius_m},{},{});\nout body;\n>;\nout skel qt;",
        center.latitude, center.longitude
    )
}

#[derive(Deserialize)]
struct OverpassResponse {
    #[serde(default)]
    elements: Vec<Element>,
}

#[derive(Deserialize)]
struct Element {
    #[serde(default)]
    lat: Option<f64>,
    #[serde(default)]
    lon: Option<f64>,
    #[serde(default)]
    tags: Option<std::collections::HashMap<String, String>>,
}

fn candidates_from(response: OverpassResponse, center: GeoPoint) -> Vec<HospitalCandidate> {
    let mut hospitals: Vec<HospitalCandidate> = response
        .elements
        .into_iter()
        // Skeleton elements from the recursion carry no tags.
        .filter_map(|element| {
            let tags = element.tags?;
            let location = match (element.lat, element.lon) {
                (Some(latitude), Some(longitude)) => Some(GeoPoint { latitude, longitude }),
                _ => None,
            };
            Some(HospitalCandidate {
                name: tags
                    .get("name")
                    .cloned()
                    .unwrap_or_else(|| "Unknown Hospital".to_string()),
                specialty: tags
                    .get("healthcare:speciality")
                    .cloned()
                    .unwrap_or_else(|| "General".to_string()),
                emergency: tags.get("emergency").is_some_and(|v| v == "yes"),
                distance_km: location.map(|l| (center.distance_km(&l) * 100.0).round() / 100.0),
                location,
            })
        })
        .collect();

    hospitals.sort_by(|a, b| {
        let da = a.distance_km.unwrap_or(f64::INFINITY);
        let db = b.distance_km.unwrap_or(f64::INFINITY);
        da.total_cmp(&db)
    });
    hospitals
}

impl HospitalSearch for OverpassSearch {
    fn nearby_hospitals(
        &self,
        center: GeoPoint,
        radius_m: u32,
    ) -> Result<Vec<HospitalCandidate>, SearchError> {
        let query = build_query(center, radius_m);
        let response = self
            .client
            .get(&self.url)
            .query(&[("data", query.as_str())])
            .send()?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(SearchError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: OverpassResponse = response.json()?;
        let hospitals = candidates_from(parsed, center);
        tracing::info!(count = hospitals.len(), "Fetched hospitals from OpenStreetMap");
        Ok(hospitals)
    }
}
