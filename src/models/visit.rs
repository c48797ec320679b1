use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::VisitStatus;

/// One appointment record. Never mutated once read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Visit {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub service_id: Uuid,
    pub service_name: String,
    pub timestamp: NaiveDateTime,
    pub status: VisitStatus,
}
