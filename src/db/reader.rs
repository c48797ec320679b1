//! The read-side contract the follow-up engine consumes, plus its
//! SQLite-backed implementation.

use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::NaiveDateTime;
use rusqlite::Connection;
use uuid::Uuid;

use super::repository;
use super::sqlite::open_database;
use super::DatabaseError;
use crate::models::{PatientDisplay, Visit};

/// Read-only access to visit history. Implementations never mutate data.
pub trait VisitReader: Send + Sync {
    /// Every visit of one patient, in no particular order.
    /// Fails with `DatabaseError::NotFound` when the patient is unknown;
    /// a known patient without visits yields an empty list.
    fn list_visits_for_patient(&self, patient_id: &Uuid) -> Result<Vec<Visit>, DatabaseError>;

    /// Visit count per patient. Patients without visits are absent.
    fn count_visits_grouped_by_patient(&self) -> Result<HashMap<Uuid, u32>, DatabaseError>;

    /// Most recent visit timestamp per patient. Patients without visits are absent.
    fn last_visit_per_patient(&self) -> Result<HashMap<Uuid, NaiveDateTime>, DatabaseError>;

    /// Display fields for a set of patients, resolved in one batched read.
    fn resolve_patient_display_fields(
        &self,
        patient_ids: &BTreeSet<Uuid>,
    ) -> Result<HashMap<Uuid, PatientDisplay>, DatabaseError>;
}

pub struct SqliteVisitReader {
    conn: Mutex<Connection>,
}

impl SqliteVisitReader {
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    /// Open (or create) the database file and run migrations.
    pub fn open(path: &Path) -> Result<Self, DatabaseError> {
        Ok(Self::new(open_database(path)?))
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, DatabaseError> {
        self.conn.lock().map_err(|_| DatabaseError::LockPoisoned)
    }
}

impl VisitReader for SqliteVisitReader {
    fn list_visits_for_patient(&self, patient_id: &Uuid) -> Result<Vec<Visit>, DatabaseError> {
        let conn = self.conn()?;
        if !repository::patient_exists(&conn, patient_id)? {
            return Err(DatabaseError::NotFound {
                entity_type: "patient".into(),
                id: patient_id.to_string(),
            });
        }
        repository::get_visits_for_patient(&conn, patient_id)
    }

    fn count_visits_grouped_by_patient(&self) -> Result<HashMap<Uuid, u32>, DatabaseError> {
        repository::count_visits_by_patient(&*self.conn()?)
    }

    fn last_visit_per_patient(&self) -> Result<HashMap<Uuid, NaiveDateTime>, DatabaseError> {
        repository::last_visit_by_patient(&*self.conn()?)
    }

    fn resolve_patient_display_fields(
        &self,
        patient_ids: &BTreeSet<Uuid>,
    ) -> Result<HashMap<Uuid, PatientDisplay>, DatabaseError> {
        if patient_ids.is_empty() {
            return Ok(HashMap::new());
        }
        repository::get_patient_displays(&*self.conn()?, patient_ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::{insert_patient, insert_visit};
    use crate::db::sqlite::open_memory_database;
    use crate::models::enums::VisitStatus;
    use chrono::NaiveDate;

    fn reader_with_patient() -> (SqliteVisitReader, Uuid) {
        let conn = open_memory_database().unwrap();
        let id = Uuid::from_u128(7);
        insert_patient(
            &conn,
            &PatientDisplay {
                id,
                name: "Marta Diaz".into(),
                phone: None,
                email: Some("marta@example.com".into()),
            },
        )
        .unwrap();
        (SqliteVisitReader::new(conn), id)
    }

    #[test]
    fn unknown_patient_is_not_found() {
        let (reader, _) = reader_with_patient();
        let err = reader
            .list_visits_for_patient(&Uuid::from_u128(99))
            .unwrap_err();
        assert!(matches!(err, DatabaseError::NotFound { ref entity_type, .. } if entity_type == "patient"));
    }

    #[test]
    fn known_patient_without_visits_is_empty() {
        let (reader, id) = reader_with_patient();
        assert!(reader.list_visits_for_patient(&id).unwrap().is_empty());
        assert!(reader.count_visits_grouped_by_patient().unwrap().is_empty());
        assert!(reader.last_visit_per_patient().unwrap().is_empty());
    }

    #[test]
    fn reads_through_the_shared_connection() {
        let (reader, id) = reader_with_patient();
        {
            let conn = reader.conn().unwrap();
            insert_visit(
                &conn,
                &Visit {
                    id: Uuid::new_v4(),
                    patient_id: id,
                    service_id: Uuid::from_u128(500),
                    service_name: "Whitening".into(),
                    timestamp: NaiveDate::from_ymd_opt(2024, 2, 1)
                        .unwrap()
                        .and_hms_opt(10, 0, 0)
                        .unwrap(),
                    status: VisitStatus::Completed,
                },
            )
            .unwrap();
        }

        assert_eq!(reader.list_visits_for_patient(&id).unwrap().len(), 1);
        assert_eq!(reader.count_visits_grouped_by_patient().unwrap()[&id], 1);
        let names = reader
            .resolve_patient_display_fields(&BTreeSet::from([id]))
            .unwrap();
        assert_eq!(names[&id].email.as_deref(), Some("marta@example.com"));
    }
}
