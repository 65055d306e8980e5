use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::AlertRecord;

/// Fixed-width UTC timestamps sort lexicographically in time order.
fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn insert_alert(conn: &Connection, alert: &AlertRecord) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO alerts (id, patient_id, message, timestamp) VALUES (?1, ?2, ?3, ?4)",
        params![
            alert.id.to_string(),
            alert.patient_id,
            alert.message,
            format_timestamp(&alert.timestamp),
        ],
    )?;
    Ok(())
}

/// Most recent alerts first, at most `limit`.
pub fn get_recent_alerts(conn: &Connection, limit: usize) -> Result<Vec<AlertRecord>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, patient_id, message, timestamp
         FROM alerts ORDER BY timestamp DESC LIMIT ?1",
    )?;

    let rows = stmt.query_map(params![limit as i64], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, String>(3)?,
        ))
    })?;

    let mut alerts = Vec::new();
    for row in rows {
        let (id, patient_id, message, timestamp) = row?;
        alerts.push(AlertRecord {
            id: Uuid::parse_str(&id)
                .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
            patient_id,
            message,
            timestamp: DateTime::parse_from_rfc3339(&timestamp)
                .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?
                .with_timezone(&Utc),
        });
    }
    Ok(alerts)
}
