use serde::{Deserialize, Serialize};

/// A coordinate in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    /// Great-circle distance in kilometres (haversine, mean Earth radius).
    pub fn distance_km(&self, other: &GeoPoint) -> f64 {
        const EARTH_RADIUS_KM: f64 = 6371.0088;

        let lat1 = self.latitude.to_radians();
        let lat2 = other.latitude.to_radians();
        let dlat = (other.latitude - self.latitude).to_radians();
        let dlon = (other.longitude - self.longitude).to_radians();

        let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
        2.0 * EARTH_RADIUS_KM * a.sqrt().asin()
    }
}

/// Hospital shown on the dashboard, read from the `hospitals` collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HospitalRecord {
    pub name: String,
    /// Occupancy in percent.
    pub capacity: f64,
    /// Kilometres from the reference point.
    pub distance: f64,
    pub specialty: String,
}

/// A hospital returned by a live nearby search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HospitalCandidate {
    pub name: String,
    pub location: Option<GeoPoint>,
    pub specialty: String,
    pub emergency: bool,
    pub distance_km: Option<f64>,
}

impl HospitalCandidate {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            location: None,
            specialty: "General".to_string(),
            emergency: false,
            distance_km: None,
        }
    }
}
