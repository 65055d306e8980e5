use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Free-text alert attached to a patient. Display only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertRecord {
    pub id: Uuid,
    pub patient_id: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}
