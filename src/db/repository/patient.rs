use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::{Map, Value};

use crate::db::DatabaseError;
use crate::models::PatientRecord;

/// Merge `patch` into `target`. Nested objects merge key by key; every
/// other value (arrays included) replaces what was there.
pub fn merge_document(target: &mut Map<String, Value>, patch: Map<String, Value>) {
    for (key, value) in patch {
        if let Value::Object(incoming) = value {
            if let Some(Value::Object(existing)) = target.get_mut(&key) {
                merge_document(existing, incoming);
                continue;
            }
            target.insert(key, Value::Object(incoming));
        } else {
            target.insert(key, value);
        }
    }
}

fn parse_document(patient_id: &str, raw: &str) -> Result<Map<String, Value>, DatabaseError> {
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(DatabaseError::MalformedDocument {
            id: patient_id.to_string(),
            reason: "document is not a JSON object".into(),
        }),
        Err(e) => Err(DatabaseError::MalformedDocument {
            id: patient_id.to_string(),
            reason: e.to_string(),
        }),
    }
}

fn to_record(patient_id: &str, doc: Map<String, Value>) -> Result<PatientRecord, DatabaseError> {
    PatientRecord::from_document(Value::Object(doc)).map_err(|e| DatabaseError::MalformedDocument {
        id: patient_id.to_string(),
        reason: e.to_string(),
    })
}

/// Raw JSON document for a patient, if any.
pub fn get_patient_document(
    conn: &Connection,
    patient_id: &str,
) -> Result<Option<Map<String, Value>>, DatabaseError> {
    let raw: Option<String> = conn
        .query_row(
            "SELECT document FROM patients WHERE patient_id = ?1",
            params![patient_id],
            |row| row.get(0),
        )
        .optional()?;

    raw.map(|r| parse_document(patient_id, &r)).transpose()
}

/// Merge `fields` into the patient document keyed by `patient_id`, creating
/// it when absent. `patient_id` and `timestamp` are always set by the store.
pub fn upsert_patient_document(
    conn: &Connection,
    patient_id: &str,
    fields: Map<String, Value>,
    now: DateTime<Utc>,
) -> Result<Map<String, Value>, DatabaseError> {
    let mut doc = get_patient_document(conn, patient_id)?.unwrap_or_default();
    merge_document(&mut doc, fields);

    let stamp = now.to_rfc3339_opts(SecondsFormat::Micros, true);
    doc.insert("patient_id".into(), Value::String(patient_id.to_string()));
    doc.insert("timestamp".into(), Value::String(stamp.clone()));

    let serialized = Value::Object(doc).to_string();
    conn.execute(
        "INSERT INTO patients (patient_id, document, updated_at) VALUES (?1, ?2, ?3)
         ON CONFLICT(patient_id) DO UPDATE SET
            document = excluded.document,
            updated_at = excluded.updated_at",
        params![patient_id, serialized, stamp],
    )?;

    parse_document(patient_id, &serialized)
}

pub fn get_patient(conn: &Connection, patient_id: &str) -> Result<Option<PatientRecord>, DatabaseError> {
    get_patient_document(conn, patient_id)?
        .map(|doc| to_record(patient_id, doc))
        .transpose()
}

/// Every patient document, ordered by identifier.
///
/// Documents that cannot be read as a patient (e.g. missing `symptoms`) are
/// skipped with a warning rather than failing the whole listing.
pub fn get_all_patients(conn: &Connection) -> Result<Vec<PatientRecord>, DatabaseError> {
    let mut stmt = conn.prepare("SELECT patient_id, document FROM patients ORDER BY patient_id")?;
    let rows = stmt.query_map([], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
    })?;

    let mut patients = Vec::new();
    for row in rows {
        let (patient_id, raw) = row?;
        match parse_document(&patient_id, &raw).and_then(|doc| to_record(&patient_id, doc)) {
            Ok(record) => patients.push(record),
            Err(e) => tracing::warn!(patient_id = %patient_id, error = %e, "Skipping unreadable patient document"),
        }
    }
    Ok(patients)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::sqlite::open_memory_database;
    use serde_json::json;

    fn obj(v: Value) -> Map<String, Value> {
        match v {
            Value::Object(m) => m,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn merge_replaces_scalars_and_arrays() {
        let mut target = obj(json!({"a": 1, "list": [1, 2], "keep": true}));
        merge_document(&mut target, obj(json!({"a": 2, "list": [3]})));
        assert_eq!(Value::Object(target), json!({"a": 2, "list": [3], "keep": true}));
    }

    #[test]
    fn merge_descends_into_nested_objects() {
        let mut target = obj(json!({"vitals": {"heart_rate": 90, "temperature": 37.0}}));
        merge_document(&mut target, obj(json!({"vitals": {"heart_rate": 110}})));
        assert_eq!(
            Value::Object(target),
            json!({"vitals": {"heart_rate": 110, "temperature": 37.0}})
        );
    }

    #[test]
    fn upsert_creates_then_merges_single_document() {
        let conn = open_memory_database().unwrap();
        upsert_patient_document(
            &conn,
            "P1",
            obj(json!({"symptoms": ["cough"], "name": "Ada"})),
            Utc::now(),
        )
        .unwrap();
        upsert_patient_document(&conn, "P1", obj(json!({"triage_score": 0.5})), Utc::now()).unwrap();

        assert_eq!(get_all_patients(&conn).unwrap().len(), 1);
        let record = get_patient(&conn, "P1").unwrap().unwrap();
        assert_eq!(record.symptoms, vec!["cough".to_string()]);
        assert_eq!(record.triage_score, Some(0.5));
        assert_eq!(record.extra.get("name"), Some(&json!("Ada")));
        assert!(record.timestamp.is_some());
    }

    #[test]
    fn upsert_stamps_server_time() {
        let conn = open_memory_database().unwrap();
        let now = Utc::now();
        let doc = upsert_patient_document(
            &conn,
            "P2",
            obj(json!({"symptoms": [], "timestamp": "client-supplied"})),
            now,
        )
        .unwrap();
        let stamped = doc["timestamp"].as_str().unwrap();
        let parsed = DateTime::parse_from_rfc3339(stamped).unwrap().with_timezone(&Utc);
        assert_eq!(parsed.timestamp_micros(), now.timestamp_micros());
    }

    #[test]
    fn missing_patient_is_none() {
        let conn = open_memory_database().unwrap();
        assert!(get_patient(&conn, "nobody").unwrap().is_none());
    }

    #[test]
    fn unreadable_documents_are_skipped_in_listing() {
        let conn = open_memory_database().unwrap();
        upsert_patient_document(&conn, "ok", obj(json!({"symptoms": ["fever"]})), Utc::now()).unwrap();
        // No symptoms list: not a valid patient record.
        upsert_patient_document(&conn, "bad", obj(json!({"name": "?"})), Utc::now()).unwrap();

        let all = get_all_patients(&conn).unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].patient_id, "ok");
    }
}
