use std::collections::HashMap;
use std::str::FromStr;

use chrono::NaiveDateTime;
use rusqlite::{params, Connection};
use uuid::Uuid;

use super::{parse_timestamp, parse_uuid};
use crate::db::sqlite::TIMESTAMP_FORMAT;
use crate::db::DatabaseError;
use crate::models::enums::VisitStatus;
use crate::models::*;

/// Inserts a visit, registering its service on first sight.
pub fn insert_visit(conn: &Connection, visit: &Visit) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT OR IGNORE INTO services (id, name) VALUES (?1, ?2)",
        params![visit.service_id.to_string(), visit.service_name],
    )?;
    conn.execute(
        "INSERT INTO visits (id, patient_id, service_id, timestamp, status)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            visit.id.to_string(),
            visit.patient_id.to_string(),
            visit.service_id.to_string(),
            visit.timestamp.format(TIMESTAMP_FORMAT).to_string(),
            visit.status.as_str(),
        ],
    )?;
    Ok(())
}

/// All visits of one patient. Row order is not part of the contract.
pub fn get_visits_for_patient(
    conn: &Connection,
    patient_id: &Uuid,
) -> Result<Vec<Visit>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT v.id, v.patient_id, v.service_id, s.name, v.timestamp, v.status
         FROM visits v
         JOIN services s ON s.id = v.service_id
         WHERE v.patient_id = ?1",
    )?;

    let rows = stmt.query_map(params![patient_id.to_string()], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, String>(3)?,
            row.get::<_, String>(4)?,
            row.get::<_, String>(5)?,
        ))
    })?;

    let mut visits = Vec::new();
    for row in rows {
        let (id, patient_id, service_id, service_name, timestamp, status) = row?;
        visits.push(Visit {
            id: parse_uuid("visit_id", &id)?,
            patient_id: parse_uuid("patient_id", &patient_id)?,
            service_id: parse_uuid("service_id", &service_id)?,
            service_name,
            timestamp: parse_timestamp(&timestamp)?,
            status: VisitStatus::from_str(&status)?,
        });
    }
    Ok(visits)
}

pub fn count_visits_by_patient(conn: &Connection) -> Result<HashMap<Uuid, u32>, DatabaseError> {
    let mut stmt =
        conn.prepare("SELECT patient_id, COUNT(*) FROM visits GROUP BY patient_id")?;
    let rows = stmt.query_map([], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, u32>(1)?))
    })?;

    let mut counts = HashMap::new();
    for row in rows {
        let (patient_id, count) = row?;
        counts.insert(parse_uuid("patient_id", &patient_id)?, count);
    }
    Ok(counts)
}

pub fn last_visit_by_patient(
    conn: &Connection,
) -> Result<HashMap<Uuid, NaiveDateTime>, DatabaseError> {
    let mut stmt =
        conn.prepare("SELECT patient_id, MAX(timestamp) FROM visits GROUP BY patient_id")?;
    let rows = stmt.query_map([], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
    })?;

    let mut latest = HashMap::new();
    for row in rows {
        let (patient_id, timestamp) = row?;
        latest.insert(
            parse_uuid("patient_id", &patient_id)?,
            parse_timestamp(&timestamp)?,
        );
    }
    Ok(latest)
}
