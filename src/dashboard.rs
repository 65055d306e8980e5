//! Dashboard views: prioritized patient list, metrics, hospitals, alerts,
//! and symptom/hospital analytics.
//!
//! Pure read-side queries over the `DocumentStore`. Nothing here writes.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::db::{DatabaseError, DocumentStore};
use crate::models::{AlertRecord, HospitalRecord, PatientRecord, Priority};
use crate::pipeline::rules::normalize_symptom;

/// Alerts shown on the dashboard panel.
pub const RECENT_ALERTS_LIMIT: usize = 5;
/// Symptoms listed on the analytics panel.
pub const ANALYTICS_TOP_SYMPTOMS: usize = 10;
/// Bucket for patients with no recommended hospital yet.
pub const UNKNOWN_HOSPITAL: &str = "Unknown";

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// One row of the prioritized patient list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientRow {
    pub patient_id: String,
    pub priority: Priority,
    pub triage_score: Option<f64>,
    pub symptoms: Vec<String>,
    pub symptom_summary: Option<String>,
    pub recommended_hospital: Option<String>,
    pub timestamp: Option<String>,
}

impl From<PatientRecord> for PatientRow {
    fn from(record: PatientRecord) -> Self {
        Self {
            priority: record.priority(),
            timestamp: record.timestamp.map(|t| t.to_rfc3339()),
            patient_id: record.patient_id,
            triage_score: record.triage_score,
            symptoms: record.symptoms,
            symptom_summary: record.symptom_summary,
            recommended_hospital: record.recommended_hospital,
        }
    }
}

/// Priority band counts. `high + medium + low == total`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriorityCounts {
    pub total: u32,
    pub high: u32,
    pub medium: u32,
    pub low: u32,
}

impl PriorityCounts {
    pub fn tally(patients: &[PatientRecord]) -> Self {
        patients.iter().fold(Self::default(), |mut counts, p| {
            counts.total += 1;
            match p.priority() {
                Priority::High => counts.high += 1,
                Priority::Medium => counts.medium += 1,
                Priority::Low => counts.low += 1,
            }
            counts
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymptomCount {
    pub symptom: String,
    pub count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HospitalCount {
    pub hospital: String,
    pub count: u32,
}

/// Sort tallies by descending count, then by key.
fn ranked(tally: BTreeMap<String, u32>) -> Vec<(String, u32)> {
    let mut entries: Vec<(String, u32)> = tally.into_iter().collect();
    // Stable sort keeps the map's key order among equal counts.
    entries.sort_by(|a, b| b.1.cmp(&a.1));
    entries
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Patients by descending triage score, limited to the given bands
/// (all bands when `bands` is empty). Unscored patients sort last; ties
/// break on identifier.
pub fn prioritized_patients(
    store: &dyn DocumentStore,
    bands: &[Priority],
) -> Result<Vec<PatientRow>, DatabaseError> {
    let mut patients: Vec<PatientRecord> = store
        .list_patients()?
        .into_iter()
        .filter(|p| bands.is_empty() || bands.contains(&p.priority()))
        .collect();

    patients.sort_by(|a, b| {
        let by_score = match (a.triage_score, b.triage_score) {
            (Some(x), Some(y)) => y.total_cmp(&x),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        };
        by_score.then_with(|| a.patient_id.cmp(&b.patient_id))
    });

    Ok(patients.into_iter().map(PatientRow::from).collect())
}

pub fn priority_counts(store: &dyn DocumentStore) -> Result<PriorityCounts, DatabaseError> {
    let patients = store.list_patients()?;
    Ok(PriorityCounts::tally(&patients))
}

pub fn hospitals(store: &dyn DocumentStore) -> Result<Vec<HospitalRecord>, DatabaseError> {
    store.list_hospitals()
}

pub fn recent_alerts(store: &dyn DocumentStore) -> Result<Vec<AlertRecord>, DatabaseError> {
    store.recent_alerts(RECENT_ALERTS_LIMIT)
}

/// Most reported symptoms across all patients. Symptoms are compared in
/// normalized form and counted once per patient.
pub fn symptom_frequencies(
    store: &dyn DocumentStore,
    limit: usize,
) -> Result<Vec<SymptomCount>, DatabaseError> {
    let mut tally: BTreeMap<String, u32> = BTreeMap::new();
    for patient in store.list_patients()? {
        let mut seen: Vec<String> = patient
            .symptoms
            .iter()
            .map(|s| normalize_symptom(s))
            .filter(|s| !s.is_empty())
            .collect();
        seen.sort();
        seen.dedup();
        for symptom in seen {
            *tally.entry(symptom).or_default() += 1;
        }
    }

    Ok(ranked(tally)
        .into_iter()
        .take(limit)
        .map(|(symptom, count)| SymptomCount { symptom, count })
        .collect())
}

/// Patient count per recommended hospital, largest first.
pub fn hospital_distribution(store: &dyn DocumentStore) -> Result<Vec<HospitalCount>, DatabaseError> {
    let mut tally: BTreeMap<String, u32> = BTreeMap::new();
    for patient in store.list_patients()? {
        let hospital = patient
            .recommended_hospital
            .unwrap_or_else(|| UNKNOWN_HOSPITAL.to_string());
        *tally.entry(hospital).or_default() += 1;
    }

    Ok(ranked(tally)
        .into_iter()
        .map(|(hospital, count)| HospitalCount { hospital, count })
        .collect())
}
