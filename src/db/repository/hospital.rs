use rusqlite::{params, Connection};

use crate::db::DatabaseError;
use crate::models::HospitalRecord;

pub fn insert_hospital(conn: &Connection, hospital: &HospitalRecord) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO hospitals (name, capacity, distance, specialty) VALUES (?1, ?2, ?3, ?4)",
        params![
            hospital.name,
            hospital.capacity,
            hospital.distance,
            hospital.specialty,
        ],
    )?;
    Ok(())
}

/// All hospitals, nearest first.
pub fn get_hospitals(conn: &Connection) -> Result<Vec<HospitalRecord>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT name, capacity, distance, specialty FROM hospitals ORDER BY distance ASC, name ASC",
    )?;

    let rows = stmt.query_map([], |row| {
        Ok(HospitalRecord {
            name: row.get(0)?,
            capacity: row.get(1)?,
            distance: row.get(2)?,
            specialty: row.get(3)?,
        })
    })?;

    let mut hospitals = Vec::new();
    for row in rows {
        hospitals.push(row?);
    }
    Ok(hospitals)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::sqlite::open_memory_database;

    fn hospital(name: &str, distance: f64) -> HospitalRecord {
        HospitalRecord {
            name: name.into(),
            capacity: 72.0,
            distance,
            specialty: "General".into(),
        }
    }

    #[test]
    fn hospitals_sorted_by_distance() {
        let conn = open_memory_database().unwrap();
        insert_hospital(&conn, &hospital("Far", 12.5)).unwrap();
        insert_hospital(&conn, &hospital("Near", 1.2)).unwrap();

        let names: Vec<_> = get_hospitals(&conn)
            .unwrap()
            .into_iter()
            .map(|h| h.name)
            .collect();
        assert_eq!(names, vec!["Near", "Far"]);
    }

    #[test]
    fn capacity_over_100_rejected() {
        let conn = open_memory_database().unwrap();
        let mut h = hospital("Overfull", 2.0);
        h.capacity = 140.0;
        assert!(insert_hospital(&conn, &h).is_err());
    }
}
