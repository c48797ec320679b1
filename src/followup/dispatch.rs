//! Hand-off of follow-up actions to a delivery channel. Delivery itself
//! (email, SMS, push) lives outside this crate; forwarding is best-effort.
//! The HTTP adapter forwards through this seam on
//! `POST /api/followup/patients/:id/dispatch`.

use serde::Serialize;
use thiserror::Error;

use crate::models::PatientDisplay;

use super::types::{Action, RecommendationBundle};

#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("Delivery channel unavailable: {0}")]
    Unavailable(String),

    #[error("Delivery rejected: {0}")]
    Rejected(String),
}

pub trait ActionDispatcher: Send + Sync {
    fn dispatch(&self, patient: &PatientDisplay, action: &Action) -> Result<(), DispatchError>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DispatchReport {
    pub delivered: usize,
    pub failed: usize,
}

/// Forwards every action in the bundle. A failed delivery is logged and
/// counted; it never stops the remaining actions.
pub fn forward_actions(
    dispatcher: &dyn ActionDispatcher,
    bundle: &RecommendationBundle,
) -> DispatchReport {
    let mut report = DispatchReport::default();

    for action in &bundle.actions {
        match dispatcher.dispatch(&bundle.patient, action) {
            Ok(()) => report.delivered += 1,
            Err(e) => {
                report.failed += 1;
                tracing::warn!(
                    patient_id = %bundle.patient.id,
                    kind = action.kind.as_str(),
                    "Follow-up action not delivered: {e}"
                );
            }
        }
    }

    report
}

/// Writes actions to the log instead of delivering them.
pub struct TracingDispatcher;

impl ActionDispatcher for TracingDispatcher {
    fn dispatch(&self, patient: &PatientDisplay, action: &Action) -> Result<(), DispatchError> {
        tracing::info!(
            patient_id = %patient.id,
            kind = action.kind.as_str(),
            priority = action.priority.as_str(),
            suggested_date = ?action.suggested_date,
            "{}",
            action.description
        );
        Ok(())
    }
}
