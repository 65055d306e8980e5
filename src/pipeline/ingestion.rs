//! Validates a candidate patient record and persists it.

use std::sync::Arc;

use serde_json::{Map, Value};

use super::preprocess::{clean_symptoms, normalize_vitals};
use super::PipelineError;
use crate::db::DocumentStore;
use crate::models::PatientRecord;

const REQUIRED_FIELDS: &[&str] = &["patient_id", "symptoms"];

/// Written only by later stages; never accepted from a submission.
pub const DERIVED_FIELDS: &[&str] = &[
    "triage_score",
    "score_source",
    "rules_version",
    "symptom_summary",
    "symptom_categories",
    "recommended_hospital",
];

/// First pipeline stage: validate, normalize, merge-upsert.
pub struct DataIngestionNode {
    store: Arc<dyn DocumentStore>,
}

impl DataIngestionNode {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Check a candidate record without touching the store.
    pub fn validate(candidate: &Value) -> Result<PatientRecord, PipelineError> {
        let object = candidate
            .as_object()
            .ok_or_else(|| PipelineError::validation("record", "expected a JSON object"))?;

        for field in REQUIRED_FIELDS {
            if !object.contains_key(*field) {
                return Err(PipelineError::validation(field, "missing required field"));
            }
        }

        match object.get("patient_id") {
            Some(Value::String(id)) if !id.trim().is_empty() => {}
            _ => return Err(PipelineError::validation("patient_id", "must be a non-empty string")),
        }

        let symptoms_ok = object
            .get("symptoms")
            .and_then(Value::as_array)
            .is_some_and(|list| list.iter().all(Value::is_string));
        if !symptoms_ok {
            return Err(PipelineError::validation("symptoms", "must be a list of strings"));
        }

        let mut document = object.clone();
        for key in DERIVED_FIELDS {
            if document.remove(*key).is_some() {
                tracing::warn!(field = *key, "Ignoring client-supplied derived field");
            }
        }

        let mut record = PatientRecord::from_document(Value::Object(document))
            .map_err(|e| PipelineError::validation("record", e.to_string()))?;
        record.patient_id = record.patient_id.trim().to_string();
        record.symptoms = clean_symptoms(record.symptoms);
        record.vitals = normalize_vitals(record.vitals);
        Ok(record)
    }

    /// Validate, then merge the record into the `patients` collection.
    ///
    /// Returns the stored document, which may carry fields from earlier
    /// submissions under the same identifier.
    pub fn process(&self, candidate: Value) -> Result<PatientRecord, PipelineError> {
        let record = match Self::validate(&candidate) {
            Ok(record) => record,
            Err(e) => {
                tracing::error!(error = %e, "Data validation failed");
                return Err(e);
            }
        };

        let mut fields = record.to_document()?;
        // The store assigns the write time.
        fields.remove("timestamp");

        let stored = self.store.upsert_patient(&record.patient_id, fields)?;
        tracing::info!(patient_id = %stored.patient_id, "Patient data saved");
        Ok(stored)
    }

    /// Merge already-validated fields into an existing patient document.
    pub fn merge_fields(
        &self,
        patient_id: &str,
        fields: Map<String, Value>,
    ) -> Result<PatientRecord, PipelineError> {
        Ok(self.store.upsert_patient(patient_id, fields)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::SqliteStore;
    use crate::models::VitalValue;
    use serde_json::json;

    fn node() -> (DataIngestionNode, Arc<SqliteStore>) {
        let store = Arc::new(SqliteStore::in_memory().unwrap());
        (DataIngestionNode::new(store.clone()), store)
    }

    #[test]
    fn missing_patient_id_rejected_without_write() {
        let (node, store) = node();
        let err = node.process(json!({"symptoms": ["cough"]})).unwrap_err();
        assert!(matches!(err, PipelineError::Validation { ref field, .. } if field == "patient_id"));
        assert!(store.list_patients().unwrap().is_empty());
    }

    #[test]
    fn missing_symptoms_rejected_without_write() {
        let (node, store) = node();
        let err = node.process(json!({"patient_id": "P1"})).unwrap_err();
        assert!(matches!(err, PipelineError::Validation { ref field, .. } if field == "symptoms"));
        assert!(store.list_patients().unwrap().is_empty());
    }

    #[test]
    fn wrong_types_rejected() {
        assert!(DataIngestionNode::validate(&json!({"patient_id": 7, "symptoms": []})).is_err());
        assert!(DataIngestionNode::validate(&json!({"patient_id": "  ", "symptoms": []})).is_err());
        assert!(DataIngestionNode::validate(&json!({"patient_id": "P", "symptoms": "cough"})).is_err());
        assert!(DataIngestionNode::validate(&json!({"patient_id": "P", "symptoms": [1]})).is_err());
        assert!(DataIngestionNode::validate(&json!(["P", "cough"])).is_err());
    }

    #[test]
    fn reingesting_merges_into_one_document() {
        let (node, store) = node();
        node.process(json!({
            "patient_id": "P1",
            "symptoms": ["fever"],
            "name": "Ada",
            "vitals": {"heart_rate": 90}
        }))
        .unwrap();
        let second = node
            .process(json!({
                "patient_id": "P1",
                "symptoms": ["fever", "cough"],
                "vitals": {"temperature": 38.2}
            }))
            .unwrap();

        assert_eq!(store.list_patients().unwrap().len(), 1);
        assert_eq!(second.symptoms, vec!["fever".to_string(), "cough".to_string()]);
        assert_eq!(second.extra.get("name"), Some(&json!("Ada")));
        assert_eq!(second.vitals["heart_rate"], VitalValue::Number(90.0));
        assert_eq!(second.vitals["temperature"], VitalValue::Number(38.2));
    }

    #[test]
    fn client_supplied_derived_fields_are_dropped() {
        let (node, store) = node();
        node.process(json!({
            "patient_id": "P4",
            "symptoms": ["cough"],
            "triage_score": 7.0,
            "recommended_hospital": "Forged",
            "symptom_summary": "forged",
            "symptom_categories": {"severe": ["cough"], "moderate": [], "mild": []}
        }))
        .unwrap();

        let stored = store.get_patient("P4").unwrap().unwrap();
        assert!(stored.triage_score.is_none());
        assert!(stored.recommended_hospital.is_none());
        assert!(stored.symptom_summary.is_none());
        assert!(stored.symptom_categories.is_none());
        assert!(stored.extra.is_empty());
    }

    #[test]
    fn malformed_derived_field_does_not_fail_validation() {
        let candidate = json!({"patient_id": "P5", "symptoms": [], "triage_score": "urgent"});
        let record = DataIngestionNode::validate(&candidate).unwrap();
        assert!(record.triage_score.is_none());
    }

    #[test]
    fn vitals_normalized_and_timestamp_stamped() {
        let (node, _store) = node();
        let stored = node
            .process(json!({
                "patient_id": "P2",
                "symptoms": ["Chest Pain", " "],
                "vitals": {"blood_pressure": "140/90", "temperature": 100.4}
            }))
            .unwrap();

        assert_eq!(stored.symptoms, vec!["Chest Pain".to_string()]);
        assert_eq!(stored.vitals["systolic_bp"], VitalValue::Number(140.0));
        assert_eq!(stored.vitals["temperature"], VitalValue::Number(38.0));
        assert!(stored.timestamp.is_some());
    }
}
