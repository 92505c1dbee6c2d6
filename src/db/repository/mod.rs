//! Repository layer: entity-scoped database operations.
//!
//! Free functions over a borrowed `Connection`; ids are stored as UUID
//! text and instants as `YYYY-MM-DD HH:MM:SS[.fraction]` so that text
//! ordering is chronological ordering.

mod call_log;
mod medication;
mod patient;
mod schedule;

use chrono::NaiveDateTime;
use uuid::Uuid;

use super::DatabaseError;

pub use call_log::*;
pub use medication::*;
pub use patient::*;
pub use schedule::*;

const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

pub(crate) fn format_datetime(dt: &NaiveDateTime) -> String {
    dt.format(DATETIME_FORMAT).to_string()
}

pub(crate) fn parse_datetime(s: &str) -> Result<NaiveDateTime, DatabaseError> {
    NaiveDateTime::parse_from_str(s, DATETIME_FORMAT)
        .map_err(|e| DatabaseError::CorruptValue(format!("bad timestamp {s:?}: {e}")))
}

pub(crate) fn parse_uuid(s: &str) -> Result<Uuid, DatabaseError> {
    Uuid::parse_str(s).map_err(|e| DatabaseError::CorruptValue(e.to_string()))
}
