//! Document store capability consumed by the pipeline and the read API.
//!
//! `SqliteStore` is the production implementation. It serializes access
//! through a single connection, so concurrent writers to the same patient
//! are last-write-wins.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::Utc;
use rusqlite::Connection;
use serde_json::{Map, Value};

use super::repository;
use super::sqlite::{open_database, open_memory_database};
use super::DatabaseError;
use crate::models::{AlertRecord, HospitalRecord, PatientRecord};

/// Collections the service reads and writes: patients, hospitals, alerts.
pub trait DocumentStore: Send + Sync {
    /// Merge `fields` into the patient document, stamping the write time.
    fn upsert_patient(
        &self,
        patient_id: &str,
        fields: Map<String, Value>,
    ) -> Result<PatientRecord, DatabaseError>;

    fn get_patient(&self, patient_id: &str) -> Result<Option<PatientRecord>, DatabaseError>;

    fn list_patients(&self) -> Result<Vec<PatientRecord>, DatabaseError>;

    fn list_hospitals(&self) -> Result<Vec<HospitalRecord>, DatabaseError>;

    /// Most recent alerts first.
    fn recent_alerts(&self, limit: usize) -> Result<Vec<AlertRecord>, DatabaseError>;
}

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self, DatabaseError> {
        let conn = open_database(path)?;
        tracing::info!(path = %path.display(), "Document store opened");
        Ok(Self::from_connection(conn))
    }

    pub fn in_memory() -> Result<Self, DatabaseError> {
        Ok(Self::from_connection(open_memory_database()?))
    }

    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, DatabaseError> {
        self.conn.lock().map_err(|_| DatabaseError::LockPoisoned)
    }

    pub fn insert_hospital(&self, hospital: &HospitalRecord) -> Result<(), DatabaseError> {
        let conn = self.lock()?;
        repository::insert_hospital(&conn, hospital)
    }

    pub fn insert_alert(&self, alert: &AlertRecord) -> Result<(), DatabaseError> {
        let conn = self.lock()?;
        repository::insert_alert(&conn, alert)
    }
}

impl DocumentStore for SqliteStore {
    fn upsert_patient(
        &self,
        patient_id: &str,
        fields: Map<String, Value>,
    ) -> Result<PatientRecord, DatabaseError> {
        let doc = {
            let conn = self.lock()?;
            repository::upsert_patient_document(&conn, patient_id, fields, Utc::now())?
        };
        PatientRecord::from_document(Value::Object(doc)).map_err(|e| DatabaseError::MalformedDocument {
            id: patient_id.to_string(),
            reason: e.to_string(),
        })
    }

    fn get_patient(&self, patient_id: &str) -> Result<Option<PatientRecord>, DatabaseError> {
        let conn = self.lock()?;
        repository::get_patient(&conn, patient_id)
    }

    fn list_patients(&self) -> Result<Vec<PatientRecord>, DatabaseError> {
        let conn = self.lock()?;
        repository::get_all_patients(&conn)
    }

    fn list_hospitals(&self) -> Result<Vec<HospitalRecord>, DatabaseError> {
        let conn = self.lock()?;
        repository::get_hospitals(&conn)
    }

    fn recent_alerts(&self, limit: usize) -> Result<Vec<AlertRecord>, DatabaseError> {
        let conn = self.lock()?;
        repository::get_recent_alerts(&conn, limit)
    }
}
