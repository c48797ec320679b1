use chrono::{NaiveDate, NaiveDateTime, Weekday};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::enums::{ActionKind, ActionPriority};
use crate::models::PatientDisplay;

// ═══════════════════════════════════════════════════════════
// Classification outputs
// ═══════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecurringPatient {
    pub patient: PatientDisplay,
    pub total_visits: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InactivePatient {
    pub patient: PatientDisplay,
    pub last_visit: NaiveDateTime,
    pub days_since_last_visit: i64,
}

// ═══════════════════════════════════════════════════════════
// Visit pattern
// ═══════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceCount {
    pub service_id: Uuid,
    pub name: String,
    pub count: u32,
}

/// Derived from one patient's history on every call; never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisitPattern {
    pub patient_id: Uuid,
    pub total_visits: usize,
    pub first_visit: NaiveDateTime,
    pub last_visit: NaiveDateTime,
    /// Whole days between chronologically adjacent visits (length n-1).
    pub intervals: Vec<i64>,
    /// Unrounded mean of `intervals`.
    pub average_interval_days: f64,
    pub top_services: Vec<ServiceCount>,
    /// Every weekday tied for the highest visit count, Sunday first.
    pub preferred_weekdays: Vec<Weekday>,
    /// Every hour of day tied for the highest visit count, ascending.
    pub preferred_hours: Vec<u32>,
    pub projected_next_visit: NaiveDateTime,
}

impl VisitPattern {
    /// Average interval rounded to whole days, as used for projection.
    pub fn rounded_interval_days(&self) -> i64 {
        self.average_interval_days.round() as i64
    }
}

/// Analyzer result. Fewer than two visits is a valid outcome, not an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PatternOutcome {
    Pattern(VisitPattern),
    InsufficientData { total_visits: usize },
}

impl PatternOutcome {
    pub fn pattern(&self) -> Option<&VisitPattern> {
        match self {
            Self::Pattern(p) => Some(p),
            Self::InsufficientData { .. } => None,
        }
    }
}

// ═══════════════════════════════════════════════════════════
// Recommendations
// ═══════════════════════════════════════════════════════════

/// A structured follow-up task for external dispatch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    pub kind: ActionKind,
    pub description: String,
    pub priority: ActionPriority,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub suggested_date: Option<NaiveDate>,
}

impl Action {
    pub fn new(kind: ActionKind, priority: ActionPriority, description: impl Into<String>) -> Self {
        Self {
            kind,
            description: description.into(),
            priority,
            suggested_date: None,
        }
    }

    pub fn on(mut self, date: NaiveDate) -> Self {
        self.suggested_date = Some(date);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationBundle {
    pub patient: PatientDisplay,
    pub recommendations: Vec<String>,
    pub actions: Vec<Action>,
    pub projected_next_visit: Option<NaiveDateTime>,
    pub average_interval_days: Option<f64>,
}

// ═══════════════════════════════════════════════════════════
// FollowUpError
// ═══════════════════════════════════════════════════════════

#[derive(Error, Debug)]
pub enum FollowUpError {
    #[error("Patient not found: {0}")]
    PatientNotFound(Uuid),

    #[error("Visit data unavailable: {0}")]
    DataAccess(#[from] DatabaseError),
}
