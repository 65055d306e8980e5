//! Resource allocation: nearest hospital for a triaged patient.

use std::sync::Arc;

use serde::Serialize;

use super::search::HospitalSearch;
use crate::models::{GeoPoint, HospitalCandidate, PatientRecord};

/// Stored as `recommended_hospital` when no candidate is available.
pub const NO_HOSPITAL_FOUND: &str = "No hospital found";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Allocation {
    pub recommended_hospital: String,
    pub hospital: Option<HospitalCandidate>,
    pub searched_from: GeoPoint,
}

impl Allocation {
    fn none(searched_from: GeoPoint) -> Self {
        Self {
            recommended_hospital: NO_HOSPITAL_FOUND.to_string(),
            hospital: None,
            searched_from,
        }
    }
}

pub struct ResourceAllocationNode {
    search: Arc<dyn HospitalSearch>,
    default_location: GeoPoint,
    radius_m: u32,
}

impl ResourceAllocationNode {
    pub fn new(search: Arc<dyn HospitalSearch>, default_location: GeoPoint, radius_m: u32) -> Self {
        Self {
            search,
            default_location,
            radius_m,
        }
    }

    /// Pick the first ranked candidate. Never fails: search errors degrade
    /// to the sentinel.
    pub fn process(&self, record: &PatientRecord) -> Allocation {
        let center = record.location.unwrap_or(self.default_location);

        let candidates = match self.search.nearby_hospitals(center, self.radius_m) {
            Ok(candidates) => candidates,
            Err(e) => {
                tracing::warn!(
                    patient_id = %record.patient_id,
                    error = %e,
                    "Hospital search failed"
                );
                return Allocation::none(center);
            }
        };

        match candidates.into_iter().next() {
            Some(hospital) => {
                tracing::info!(
                    patient_id = %record.patient_id,
                    hospital = %hospital.name,
                    distance_km = ?hospital.distance_km,
                    "Hospital allocated"
                );
                Allocation {
                    recommended_hospital: hospital.name.clone(),
                    hospital: Some(hospital),
                    searched_from: center,
                }
            }
            None => {
                tracing::warn!(patient_id = %record.patient_id, radius_m = self.radius_m, "No hospitals nearby");
                Allocation::none(center)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_LOCATION;
    use crate::pipeline::search::MockHospitalSearch;

    fn node(search: Arc<MockHospitalSearch>) -> ResourceAllocationNode {
        ResourceAllocationNode::new(search, DEFAULT_LOCATION, 5000)
    }

    fn patient() -> PatientRecord {
        PatientRecord::new("P1", vec!["chest pain".into()])
    }

    #[test]
    fn first_result_wins() {
        let search = Arc::new(MockHospitalSearch::named(&["Mercy General", "St. Luke"]));
        let allocation = node(search.clone()).process(&patient());

        assert_eq!(allocation.recommended_hospital, "Mercy General");
        assert_eq!(allocation.hospital.unwrap().name, "Mercy General");
        assert_eq!(search.calls(), vec![(DEFAULT_LOCATION, 5000)]);
    }

    #[test]
    fn empty_results_yield_sentinel() {
        let allocation = node(Arc::new(MockHospitalSearch::empty())).process(&patient());
        assert_eq!(allocation.recommended_hospital, NO_HOSPITAL_FOUND);
        assert!(allocation.hospital.is_none());
    }

    #[test]
    fn search_failure_yields_sentinel() {
        let allocation = node(Arc::new(MockHospitalSearch::failing("timeout"))).process(&patient());
        assert_eq!(allocation.recommended_hospital, NO_HOSPITAL_FOUND);
    }

    #[test]
    fn patient_location_overrides_default() {
        let search = Arc::new(MockHospitalSearch::named(&["Bellevue"]));
        let mut record = patient();
        let here = GeoPoint {
            latitude: 40.7128,
            longitude: -74.006,
        };
        record.location = Some(here);

        let allocation = node(search.clone()).process(&record);
        assert_eq!(allocation.searched_from, here);
        assert_eq!(search.calls()[0].0, here);
    }
}
