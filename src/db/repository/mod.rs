//! Repository layer: entity-scoped database operations.

mod patient;
mod visit;

use chrono::NaiveDateTime;
use uuid::Uuid;

use super::sqlite::TIMESTAMP_FORMAT;
use super::DatabaseError;

pub use patient::*;
pub use visit::*;

pub(crate) fn parse_uuid(field: &str, raw: &str) -> Result<Uuid, DatabaseError> {
    Uuid::parse_str(raw).map_err(|_| DatabaseError::MalformedRow {
        field: field.into(),
        value: raw.into(),
    })
}

pub(crate) fn parse_timestamp(raw: &str) -> Result<NaiveDateTime, DatabaseError> {
    NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT).map_err(|_| {
        DatabaseError::MalformedRow {
            field: "timestamp".into(),
            value: raw.into(),
        }
    })
}
