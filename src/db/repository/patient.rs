use std::collections::{BTreeSet, HashMap};

use rusqlite::{params, params_from_iter, Connection};
use uuid::Uuid;

use super::parse_uuid;
use crate::db::DatabaseError;
use crate::models::*;

/// Upper bound on bound parameters per `IN (...)` lookup.
const LOOKUP_CHUNK: usize = 500;

pub fn insert_patient(conn: &Connection, patient: &PatientDisplay) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO patients (id, name, phone, email) VALUES (?1, ?2, ?3, ?4)",
        params![
            patient.id.to_string(),
            patient.name,
            patient.phone,
            patient.email,
        ],
    )?;
    Ok(())
}

pub fn patient_exists(conn: &Connection, id: &Uuid) -> Result<bool, DatabaseError> {
    let exists: bool = conn.query_row(
        "SELECT COUNT(*) > 0 FROM patients WHERE id = ?1",
        params![id.to_string()],
        |row| row.get(0),
    )?;
    Ok(exists)
}

/// Batched identity lookup. Ids with no registry row are simply absent
/// from the result.
pub fn get_patient_displays(
    conn: &Connection,
    ids: &BTreeSet<Uuid>,
) -> Result<HashMap<Uuid, PatientDisplay>, DatabaseError> {
    let mut out = HashMap::with_capacity(ids.len());
    let ids: Vec<String> = ids.iter().map(|id| id.to_string()).collect();

    for chunk in ids.chunks(LOOKUP_CHUNK) {
        let placeholders = vec!["?"; chunk.len()].join(", ");
        let sql = format!(
            "SELECT id, name, phone, email FROM patients WHERE id IN ({placeholders})"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(chunk.iter()), |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, Option<String>>(2)?,
                row.get::<_, Option<String>>(3)?,
            ))
        })?;

        for row in rows {
            let (id, name, phone, email) = row?;
            let id = parse_uuid("patient_id", &id)?;
            out.insert(
                id,
                PatientDisplay {
                    id,
                    name,
                    phone,
                    email,
                },
            );
        }
    }

    Ok(out)
}
