use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Instant;

use chrono::{Local, NaiveDateTime};
use uuid::Uuid;

use crate::config::FollowUpConfig;
use crate::db::{DatabaseError, VisitReader};
use crate::models::{PatientDisplay, Visit};

use super::inactivity::detect_inactive;
use super::messages::FollowUpMessages;
use super::pattern::analyze_visits;
use super::recurrence::rank_recurring;
use super::rules::{default_rules, FollowUpRule, RuleContext, RuleOutcome};
use super::types::{
    FollowUpError, InactivePatient, PatternOutcome, RecommendationBundle, RecurringPatient,
};

fn local_now() -> NaiveDateTime {
    Local::now().naive_local()
}

/// Read → compute → classify → emit. Holds no per-request state, so one
/// instance can serve concurrent callers behind an `Arc`.
pub struct FollowUpEngine {
    reader: Arc<dyn VisitReader>,
    config: FollowUpConfig,
    rules: Vec<Box<dyn FollowUpRule>>,
}

impl FollowUpEngine {
    pub fn new(reader: Arc<dyn VisitReader>) -> Self {
        Self::with_config(reader, FollowUpConfig::default())
    }

    pub fn with_config(reader: Arc<dyn VisitReader>, config: FollowUpConfig) -> Self {
        Self {
            reader,
            config,
            rules: default_rules(),
        }
    }

    /// Replace the rule list. Rules run in the given order.
    pub fn with_rules(mut self, rules: Vec<Box<dyn FollowUpRule>>) -> Self {
        self.rules = rules;
        self
    }

    pub fn config(&self) -> &FollowUpConfig {
        &self.config
    }

    /// Patients with at least `min_visits` visits (config default when `None`),
    /// most visits first, ties by patient id.
    pub fn find_recurring_patients(
        &self,
        min_visits: Option<u32>,
    ) -> Result<Vec<RecurringPatient>, FollowUpError> {
        let start = Instant::now();
        let min_visits = min_visits.unwrap_or(self.config.default_min_visits);

        let counts = self.reader.count_visits_grouped_by_patient()?;
        let ranked = rank_recurring(&counts, min_visits);

        let ids: BTreeSet<Uuid> = ranked.iter().map(|(id, _)| *id).collect();
        let mut displays = self.reader.resolve_patient_display_fields(&ids)?;

        let result: Vec<RecurringPatient> = ranked
            .into_iter()
            .map(|(id, total_visits)| RecurringPatient {
                patient: displays.remove(&id).unwrap_or_else(|| PatientDisplay::unknown(id)),
                total_visits,
            })
            .collect();

        tracing::info!(
            min_visits,
            patients_scanned = counts.len(),
            recurring = result.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Recurring patient scan complete"
        );

        Ok(result)
    }

    pub fn find_inactive_patients(
        &self,
        inactivity_days: Option<i64>,
    ) -> Result<Vec<InactivePatient>, FollowUpError> {
        self.find_inactive_patients_at(inactivity_days, local_now())
    }

    /// Patients whose last visit is more than `inactivity_days` before `now`.
    /// Patients who never visited are not part of this report.
    ///
    /// The cutoff compares timestamps, while `days_since_last_visit` is whole
    /// days truncated. A visit 90 days and 5 hours old is therefore listed at
    /// a 90-day threshold with `days_since_last_visit == 90`.
    pub fn find_inactive_patients_at(
        &self,
        inactivity_days: Option<i64>,
        now: NaiveDateTime,
    ) -> Result<Vec<InactivePatient>, FollowUpError> {
        let start = Instant::now();
        let inactivity_days = inactivity_days.unwrap_or(self.config.default_inactivity_days);

        let last_visits = self.reader.last_visit_per_patient()?;
        let stale = detect_inactive(&last_visits, inactivity_days, now);

        let ids: BTreeSet<Uuid> = stale.iter().map(|s| s.patient_id).collect();
        let mut displays = self.reader.resolve_patient_display_fields(&ids)?;

        let result: Vec<InactivePatient> = stale
            .into_iter()
            .map(|s| InactivePatient {
                patient: displays
                    .remove(&s.patient_id)
                    .unwrap_or_else(|| PatientDisplay::unknown(s.patient_id)),
                last_visit: s.last_visit,
                days_since_last_visit: s.days_since_last_visit,
            })
            .collect();

        tracing::info!(
            inactivity_days,
            patients_scanned = last_visits.len(),
            inactive = result.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Inactive patient scan complete"
        );

        Ok(result)
    }

    /// Visit pattern for one patient, recomputed from source visits.
    pub fn analyze_patient(&self, patient_id: &Uuid) -> Result<PatternOutcome, FollowUpError> {
        let visits = self.load_visits(patient_id)?;
        let outcome = analyze_visits(*patient_id, visits, self.config.top_services_limit);

        match &outcome {
            PatternOutcome::Pattern(p) => tracing::debug!(
                patient_id = %patient_id,
                total_visits = p.total_visits,
                average_interval_days = p.average_interval_days,
                "Visit pattern computed"
            ),
            PatternOutcome::InsufficientData { total_visits } => tracing::debug!(
                patient_id = %patient_id,
                total_visits,
                "Not enough visits for a pattern"
            ),
        }

        Ok(outcome)
    }

    pub fn recommend_for_patient(
        &self,
        patient_id: &Uuid,
    ) -> Result<RecommendationBundle, FollowUpError> {
        self.recommend_for_patient_at(patient_id, local_now())
    }

    /// Runs every rule against the patient's pattern as of `now`.
    pub fn recommend_for_patient_at(
        &self,
        patient_id: &Uuid,
        now: NaiveDateTime,
    ) -> Result<RecommendationBundle, FollowUpError> {
        let outcome = self.analyze_patient(patient_id)?;
        let patient = self.resolve_one(patient_id)?;

        let Some(pattern) = outcome.pattern() else {
            return Ok(RecommendationBundle {
                patient,
                recommendations: vec![
                    FollowUpMessages::insufficient_history(),
                    FollowUpMessages::generic_reminder(),
                ],
                actions: Vec::new(),
                projected_next_visit: None,
                average_interval_days: None,
            });
        };

        let ctx = RuleContext {
            pattern,
            now,
            config: &self.config,
        };

        let mut combined = RuleOutcome::default();
        for rule in &self.rules {
            if rule.applies(&ctx) {
                let emitted = rule.emit(&ctx);
                tracing::debug!(
                    rule = rule.name(),
                    messages = emitted.messages.len(),
                    actions = emitted.actions.len(),
                    "Rule fired"
                );
                combined.merge(emitted);
            }
        }

        tracing::info!(
            patient_id = %patient_id,
            recommendations = combined.messages.len(),
            actions = combined.actions.len(),
            "Follow-up recommendations generated"
        );

        Ok(RecommendationBundle {
            patient,
            recommendations: combined.messages,
            actions: combined.actions,
            projected_next_visit: Some(pattern.projected_next_visit),
            average_interval_days: Some(pattern.average_interval_days),
        })
    }

    fn load_visits(&self, patient_id: &Uuid) -> Result<Vec<Visit>, FollowUpError> {
        self.reader
            .list_visits_for_patient(patient_id)
            .map_err(|e| match e {
                DatabaseError::NotFound { .. } => FollowUpError::PatientNotFound(*patient_id),
                other => FollowUpError::DataAccess(other),
            })
    }

    fn resolve_one(&self, patient_id: &Uuid) -> Result<PatientDisplay, FollowUpError> {
        let mut found = self
            .reader
            .resolve_patient_display_fields(&BTreeSet::from([*patient_id]))?;
        Ok(found
            .remove(patient_id)
            .unwrap_or_else(|| PatientDisplay::unknown(*patient_id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::{insert_patient, insert_visit};
    use crate::db::{open_memory_database, InMemoryVisitReader, SqliteVisitReader};
    use crate::models::enums::{ActionKind, ActionPriority, VisitStatus};
    use chrono::{Duration, NaiveDate};
    use std::collections::HashMap;

    fn day(n: i64) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap()
            + Duration::days(n)
    }

    fn patient(n: u128) -> PatientDisplay {
        PatientDisplay {
            id: Uuid::from_u128(n),
            name: format!("Patient {n}"),
            phone: Some("555-0100".into()),
            email: None,
        }
    }

    fn visit(patient: u128, at: NaiveDateTime, service: &str) -> Visit {
        Visit {
            id: Uuid::new_v4(),
            patient_id: Uuid::from_u128(patient),
            service_id: Uuid::new_v5(&Uuid::NAMESPACE_OID, service.as_bytes()),
            service_name: service.into(),
            timestamp: at,
            status: VisitStatus::Completed,
        }
    }

    fn engine(reader: InMemoryVisitReader) -> FollowUpEngine {
        FollowUpEngine::new(Arc::new(reader))
    }

    /// Patient 1: cleanings on day 0, 30, 60.
    fn scenario_a() -> FollowUpEngine {
        engine(
            InMemoryVisitReader::new()
                .with_patient(patient(1))
                .with_visits([
                    visit(1, day(30), "Cleaning"),
                    visit(1, day(0), "Cleaning"),
                    visit(1, day(60), "Cleaning"),
                ]),
        )
    }

    #[test]
    fn scenario_a_pattern() {
        let outcome = scenario_a().analyze_patient(&Uuid::from_u128(1)).unwrap();
        let p = outcome.pattern().unwrap();
        assert_eq!(p.average_interval_days, 30.0);
        assert_eq!(p.top_services.len(), 1);
        assert_eq!(p.top_services[0].name, "Cleaning");
        assert_eq!(p.top_services[0].count, 3);
        assert_eq!(p.projected_next_visit, day(90));
    }

    #[test]
    fn scenario_b_overdue_patient_gets_high_contact() {
        let bundle = scenario_a()
            .recommend_for_patient_at(&Uuid::from_u128(1), day(155))
            .unwrap();

        let first = &bundle.actions[0];
        assert_eq!(first.kind, ActionKind::Contact);
        assert_eq!(first.priority, ActionPriority::High);
        assert!(bundle.recommendations[0].contains("95 days"));
        // staleness, maintenance program, preference, passed projection
        let kinds: Vec<ActionKind> = bundle.actions.iter().map(|a| a.kind).collect();
        assert_eq!(
            kinds,
            vec![
                ActionKind::Contact,
                ActionKind::Program,
                ActionKind::Preference,
                ActionKind::Contact
            ]
        );
        assert_eq!(bundle.projected_next_visit, Some(day(90)));
        assert_eq!(bundle.average_interval_days, Some(30.0));
        assert_eq!(bundle.patient.name, "Patient 1");
    }

    #[test]
    fn scenario_c_recurring_order() {
        let mut reader = InMemoryVisitReader::new();
        for (id, count) in [(1u128, 5), (2, 2), (3, 3), (4, 1)] {
            reader = reader.with_patient(patient(id));
            for n in 0..count {
                reader = reader.with_visit(visit(id, day(n * 10), "Checkup"));
            }
        }

        let recurring = engine(reader).find_recurring_patients(Some(3)).unwrap();
        let got: Vec<(u128, u32)> = recurring
            .iter()
            .map(|r| (r.patient.id.as_u128(), r.total_visits))
            .collect();
        assert_eq!(got, vec![(1, 5), (3, 3)]);
    }

    #[test]
    fn scenario_d_single_visit_gets_fallback_only() {
        let e = engine(
            InMemoryVisitReader::new()
                .with_patient(patient(1))
                .with_visit(visit(1, day(0), "Cleaning")),
        );

        assert_eq!(
            e.analyze_patient(&Uuid::from_u128(1)).unwrap(),
            PatternOutcome::InsufficientData { total_visits: 1 }
        );

        let bundle = e.recommend_for_patient_at(&Uuid::from_u128(1), day(400)).unwrap();
        assert_eq!(
            bundle.recommendations,
            vec![
                FollowUpMessages::insufficient_history(),
                FollowUpMessages::generic_reminder()
            ]
        );
        assert!(bundle.actions.is_empty());
        assert!(bundle.projected_next_visit.is_none());
        assert!(bundle.average_interval_days.is_none());
    }

    #[test]
    fn patient_without_visits_is_insufficient_not_missing() {
        let e = engine(InMemoryVisitReader::new().with_patient(patient(1)));
        assert_eq!(
            e.analyze_patient(&Uuid::from_u128(1)).unwrap(),
            PatternOutcome::InsufficientData { total_visits: 0 }
        );
    }

    #[test]
    fn unknown_patient_is_not_found() {
        let e = scenario_a();
        let missing = Uuid::from_u128(42);
        assert!(matches!(
            e.analyze_patient(&missing),
            Err(FollowUpError::PatientNotFound(id)) if id == missing
        ));
        assert!(matches!(
            e.recommend_for_patient_at(&missing, day(0)),
            Err(FollowUpError::PatientNotFound(_))
        ));
    }

    #[test]
    fn recommendations_are_deterministic() {
        let e = scenario_a();
        let a = e.recommend_for_patient_at(&Uuid::from_u128(1), day(100)).unwrap();
        let b = e.recommend_for_patient_at(&Uuid::from_u128(1), day(100)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn inactive_report_resolves_names_in_one_batch() {
        struct CountingReader {
            inner: InMemoryVisitReader,
            resolve_calls: std::sync::atomic::AtomicUsize,
        }

        impl VisitReader for CountingReader {
            fn list_visits_for_patient(&self, id: &Uuid) -> Result<Vec<Visit>, DatabaseError> {
                self.inner.list_visits_for_patient(id)
            }
            fn count_visits_grouped_by_patient(&self) -> Result<HashMap<Uuid, u32>, DatabaseError> {
                self.inner.count_visits_grouped_by_patient()
            }
            fn last_visit_per_patient(
                &self,
            ) -> Result<HashMap<Uuid, NaiveDateTime>, DatabaseError> {
                self.inner.last_visit_per_patient()
            }
            fn resolve_patient_display_fields(
                &self,
                ids: &BTreeSet<Uuid>,
            ) -> Result<HashMap<Uuid, PatientDisplay>, DatabaseError> {
                self.resolve_calls
                    .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
                self.inner.resolve_patient_display_fields(ids)
            }
        }

        let mut inner = InMemoryVisitReader::new();
        for id in 1..=5u128 {
            inner = inner
                .with_patient(patient(id))
                .with_visit(visit(id, day(0), "Checkup"));
        }
        let reader = Arc::new(CountingReader {
            inner,
            resolve_calls: Default::default(),
        });
        let e = FollowUpEngine::new(reader.clone());

        let inactive = e.find_inactive_patients_at(None, day(200)).unwrap();
        assert_eq!(inactive.len(), 5);
        assert!(inactive.iter().all(|p| p.days_since_last_visit == 200));
        assert!(inactive.iter().all(|p| p.patient.name.starts_with("Patient")));
        assert_eq!(
            reader.resolve_calls.load(std::sync::atomic::Ordering::SeqCst),
            1
        );
    }

    #[test]
    fn inactive_boundary_uses_configured_default() {
        let e = engine(
            InMemoryVisitReader::new()
                .with_patient(patient(1))
                .with_patient(patient(2))
                .with_patient(patient(3))
                .with_visit(visit(1, day(0), "Checkup"))
                .with_visit(visit(2, day(1), "Checkup")),
        );
        // day 91: patient 1 is 91 days out, patient 2 exactly 90, patient 3 never visited
        let inactive = e.find_inactive_patients_at(None, day(91)).unwrap();
        assert_eq!(inactive.len(), 1);
        assert_eq!(inactive[0].patient.id, Uuid::from_u128(1));
        assert_eq!(inactive[0].last_visit, day(0));
    }

    #[test]
    fn inactive_partial_day_is_listed_with_truncated_days() {
        let e = engine(
            InMemoryVisitReader::new()
                .with_patient(patient(1))
                .with_visit(visit(1, day(0), "Checkup")),
        );
        let inactive = e
            .find_inactive_patients_at(None, day(90) + Duration::hours(5))
            .unwrap();
        assert_eq!(inactive.len(), 1);
        assert_eq!(inactive[0].days_since_last_visit, 90);
    }

    #[test]
    fn inactive_threshold_beyond_calendar_returns_empty() {
        let e = engine(
            InMemoryVisitReader::new()
                .with_patient(patient(1))
                .with_visit(visit(1, day(0), "Checkup")),
        );
        assert!(e
            .find_inactive_patients_at(Some(i64::MAX), day(400))
            .unwrap()
            .is_empty());
        assert!(e
            .find_inactive_patients_at(Some(100_000_000), day(400))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn missing_registry_row_falls_back_to_placeholder() {
        let e = engine(InMemoryVisitReader::new().with_visits([
            visit(9, day(0), "Checkup"),
            visit(9, day(10), "Checkup"),
            visit(9, day(20), "Checkup"),
        ]));
        let recurring = e.find_recurring_patients(None).unwrap();
        assert_eq!(recurring[0].patient, PatientDisplay::unknown(Uuid::from_u128(9)));
    }

    #[test]
    fn custom_rule_list_replaces_defaults() {
        let e = scenario_a().with_rules(Vec::new());
        let bundle = e.recommend_for_patient_at(&Uuid::from_u128(1), day(155)).unwrap();
        assert!(bundle.recommendations.is_empty());
        assert!(bundle.actions.is_empty());
        assert_eq!(bundle.projected_next_visit, Some(day(90)));
    }

    #[test]
    fn sqlite_reader_feeds_the_same_pipeline() {
        let conn = open_memory_database().unwrap();
        insert_patient(&conn, &patient(1)).unwrap();
        for at in [day(0), day(30), day(60)] {
            insert_visit(&conn, &visit(1, at, "Orthodontics control")).unwrap();
        }
        let e = FollowUpEngine::new(Arc::new(SqliteVisitReader::new(conn)));

        let bundle = e.recommend_for_patient_at(&Uuid::from_u128(1), day(70)).unwrap();
        assert!(bundle
            .actions
            .iter()
            .any(|a| a.kind == ActionKind::FollowUp && a.priority == ActionPriority::High));
        assert_eq!(e.find_recurring_patients(None).unwrap().len(), 1);
    }
}
