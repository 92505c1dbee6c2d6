//! Call-schedule engine: pure building blocks.
//!
//! - `frequency`: free-text frequency → calls per day
//! - `slots`: calls per day → wall-clock hours
//! - `generator`: medications → pending reminder and checkup events
//! - `outcome`: call result → log entry + final event status
//! - `clock`: injected source of the reference instant
//!
//! Nothing here touches storage; `crate::engine` wires these to a `CareStore`.

pub mod clock;
pub mod frequency;
pub mod generator;
pub mod outcome;
pub mod slots;

pub use clock::*;
pub use frequency::classify_frequency;
pub use generator::{build_schedule, GeneratedSchedule};
pub use outcome::{resolve_outcome, ResolvedOutcome};
pub use slots::slots_for_count;

use thiserror::Error;
use uuid::Uuid;

use crate::db::DatabaseError;

#[derive(Error, Debug)]
pub enum ScheduleError {
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("{entity_type} not found: {id}")]
    NotFound { entity_type: &'static str, id: Uuid },

    #[error("Patient {0} has no medications to schedule")]
    NoMedications(Uuid),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Patient lock poisoned")]
    LockPoisoned,
}

impl ScheduleError {
    pub fn patient_not_found(id: Uuid) -> Self {
        Self::NotFound { entity_type: "Patient", id }
    }

    pub fn schedule_not_found(id: Uuid) -> Self {
        Self::NotFound { entity_type: "CallSchedule", id }
    }
}
