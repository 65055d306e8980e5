use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::enums::{Priority, ScoreSource};
use super::hospital::GeoPoint;

/// A vital sign reading. Forms submit numbers, seeded data sometimes strings ("140/90").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VitalValue {
    Number(f64),
    Text(String),
}

/// Symptoms grouped by severity keyword. Informational only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymptomCategories {
    pub severe: Vec<String>,
    pub moderate: Vec<String>,
    pub mild: Vec<String>,
}

/// A patient document in the `patients` collection.
///
/// Fields the service does not know about (name, age, ...) are carried in
/// `extra` so a merge never drops them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientRecord {
    pub patient_id: String,
    pub symptoms: Vec<String>,
    #[serde(default)]
    pub vitals: BTreeMap<String, VitalValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<GeoPoint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub triage_score: Option<f64>,
    /// Whether `triage_score` came from the rule table or the generator.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score_source: Option<ScoreSource>,
    /// Rule table version in force when the score was written.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rules_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symptom_summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symptom_categories: Option<SymptomCategories>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommended_hospital: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PatientRecord {
    pub fn new(patient_id: impl Into<String>, symptoms: Vec<String>) -> Self {
        Self {
            patient_id: patient_id.into(),
            symptoms,
            vitals: BTreeMap::new(),
            location: None,
            triage_score: None,
            score_source: None,
            rules_version: None,
            symptom_summary: None,
            symptom_categories: None,
            recommended_hospital: None,
            timestamp: None,
            extra: Map::new(),
        }
    }

    pub fn priority(&self) -> Priority {
        Priority::from_optional_score(self.triage_score)
    }

    /// Serialize into a JSON object suitable for a merge upsert.
    pub fn to_document(&self) -> Result<Map<String, Value>, serde_json::Error> {
        match serde_json::to_value(self)? {
            Value::Object(map) => Ok(map),
            // A struct always serializes to an object.
            other => Ok(Map::from_iter([("value".to_string(), other)])),
        }
    }

    pub fn from_document(doc: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(doc)
    }
}
