use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Display attributes owned by the patient registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientDisplay {
    pub id: Uuid,
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
}

impl PatientDisplay {
    /// Placeholder used when the registry returns no row for an id that
    /// still has visits attached.
    pub fn unknown(id: Uuid) -> Self {
        Self {
            id,
            name: String::new(),
            phone: None,
            email: None,
        }
    }
}
