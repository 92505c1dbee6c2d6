use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Outcome of one call attempt. Immutable once written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallLog {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub schedule_id: Option<Uuid>,
    pub call_time: NaiveDateTime,
    pub answered: bool,
    pub duration_secs: u32,
    pub notes: String,
    pub flagged: bool,
    pub created_at: NaiveDateTime,
}

/// What the caller reports after attempting a scheduled call.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CallOutcome {
    pub answered: bool,
    #[serde(default)]
    pub duration_secs: u32,
    #[serde(default)]
    pub notes: String,
}

impl CallOutcome {
    pub fn answered(duration_secs: u32, notes: impl Into<String>) -> Self {
        Self {
            answered: true,
            duration_secs,
            notes: notes.into(),
        }
    }

    pub fn unanswered(notes: impl Into<String>) -> Self {
        Self {
            answered: false,
            duration_secs: 0,
            notes: notes.into(),
        }
    }
}

/// Log row joined with its patient's name, for listings spanning patients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallLogWithPatient {
    pub log: CallLog,
    pub patient_name: String,
}
