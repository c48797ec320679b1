//! In-memory `VisitReader`: the same contract as the SQLite reader,
//! computed by folding over an owned snapshot of visits.

use std::collections::{BTreeSet, HashMap};

use chrono::NaiveDateTime;
use uuid::Uuid;

use super::reader::VisitReader;
use super::DatabaseError;
use crate::models::{PatientDisplay, Visit};

#[derive(Debug, Clone, Default)]
pub struct InMemoryVisitReader {
    patients: HashMap<Uuid, PatientDisplay>,
    visits: Vec<Visit>,
}

impl InMemoryVisitReader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_patient(mut self, patient: PatientDisplay) -> Self {
        self.patients.insert(patient.id, patient);
        self
    }

    pub fn with_visit(mut self, visit: Visit) -> Self {
        self.visits.push(visit);
        self
    }

    pub fn with_visits(mut self, visits: impl IntoIterator<Item = Visit>) -> Self {
        self.visits.extend(visits);
        self
    }
}

impl VisitReader for InMemoryVisitReader {
    fn list_visits_for_patient(&self, patient_id: &Uuid) -> Result<Vec<Visit>, DatabaseError> {
        if !self.patients.contains_key(patient_id) {
            return Err(DatabaseError::NotFound {
                entity_type: "patient".into(),
                id: patient_id.to_string(),
            });
        }
        Ok(self
            .visits
            .iter()
            .filter(|v| &v.patient_id == patient_id)
            .cloned()
            .collect())
    }

    fn count_visits_grouped_by_patient(&self) -> Result<HashMap<Uuid, u32>, DatabaseError> {
        Ok(self.visits.iter().fold(HashMap::new(), |mut acc, v| {
            *acc.entry(v.patient_id).or_insert(0) += 1;
            acc
        }))
    }

    fn last_visit_per_patient(&self) -> Result<HashMap<Uuid, NaiveDateTime>, DatabaseError> {
        Ok(self.visits.iter().fold(HashMap::new(), |mut acc, v| {
            acc.entry(v.patient_id)
                .and_modify(|latest: &mut NaiveDateTime| {
                    if v.timestamp > *latest {
                        *latest = v.timestamp;
                    }
                })
                .or_insert(v.timestamp);
            acc
        }))
    }

    fn resolve_patient_display_fields(
        &self,
        patient_ids: &BTreeSet<Uuid>,
    ) -> Result<HashMap<Uuid, PatientDisplay>, DatabaseError> {
        Ok(patient_ids
            .iter()
            .filter_map(|id| self.patients.get(id).map(|p| (*id, p.clone())))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::enums::VisitStatus;
    use chrono::NaiveDate;

    fn patient(n: u128) -> PatientDisplay {
        PatientDisplay {
            id: Uuid::from_u128(n),
            name: format!("Patient {n}"),
            phone: None,
            email: None,
        }
    }

    fn visit(patient: u128, day: u32) -> Visit {
        Visit {
            id: Uuid::new_v4(),
            patient_id: Uuid::from_u128(patient),
            service_id: Uuid::from_u128(900),
            service_name: "Checkup".into(),
            timestamp: NaiveDate::from_ymd_opt(2024, 1, day)
                .unwrap()
                .and_hms_opt(9, 0, 0)
                .unwrap(),
            status: VisitStatus::Completed,
        }
    }

    #[test]
    fn folds_match_visit_data() {
        let reader = InMemoryVisitReader::new()
            .with_patient(patient(1))
            .with_patient(patient(2))
            .with_visits([visit(1, 10), visit(1, 3), visit(1, 25), visit(2, 4)]);

        let counts = reader.count_visits_grouped_by_patient().unwrap();
        assert_eq!(counts[&Uuid::from_u128(1)], 3);
        assert_eq!(counts[&Uuid::from_u128(2)], 1);

        let latest = reader.last_visit_per_patient().unwrap();
        assert_eq!(latest[&Uuid::from_u128(1)], visit(1, 25).timestamp);
    }

    #[test]
    fn unknown_patient_is_not_found() {
        let reader = InMemoryVisitReader::new().with_patient(patient(1));
        assert!(reader.list_visits_for_patient(&Uuid::from_u128(1)).unwrap().is_empty());
        assert!(matches!(
            reader.list_visits_for_patient(&Uuid::from_u128(2)),
            Err(DatabaseError::NotFound { .. })
        ));
    }

    #[test]
    fn resolve_skips_unknown_ids() {
        let reader = InMemoryVisitReader::new().with_patient(patient(1));
        let ids = BTreeSet::from([Uuid::from_u128(1), Uuid::from_u128(5)]);
        let found = reader.resolve_patient_display_fields(&ids).unwrap();
        assert_eq!(found.len(), 1);
    }
}
