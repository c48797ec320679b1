//! Inactivity detection over per-patient last-visit timestamps.

use std::collections::HashMap;

use chrono::{Duration, NaiveDateTime};
use uuid::Uuid;

use super::pattern::days_between;

/// A patient whose latest visit predates the cutoff.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StalePatient {
    pub patient_id: Uuid,
    pub last_visit: NaiveDateTime,
    pub days_since_last_visit: i64,
}

/// Patients whose last visit is strictly before `now - inactivity_days`.
/// Longest inactivity first; ties by patient id ascending.
///
/// The cutoff compares full timestamps while `days_since_last_visit` is
/// truncated, so a visit 90 days and a few hours old is inactive at a
/// 90-day threshold and reported with 90 days.
///
/// A cutoff outside the representable date range matches nobody.
pub fn detect_inactive(
    last_visits: &HashMap<Uuid, NaiveDateTime>,
    inactivity_days: i64,
    now: NaiveDateTime,
) -> Vec<StalePatient> {
    let Some(cutoff) =
        Duration::try_days(inactivity_days).and_then(|span| now.checked_sub_signed(span))
    else {
        return Vec::new();
    };

    let mut stale: Vec<StalePatient> = last_visits
        .iter()
        .filter(|(_, &last)| last < cutoff)
        .map(|(&patient_id, &last_visit)| StalePatient {
            patient_id,
            last_visit,
            days_since_last_visit: days_between(now, last_visit),
        })
        .collect();

    stale.sort_by(|a, b| {
        a.last_visit
            .cmp(&b.last_visit)
            .then_with(|| a.patient_id.cmp(&b.patient_id))
    });
    stale
}
