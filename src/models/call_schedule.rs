use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::{CallStatus, CallType};

/// A future call event for one patient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallSchedule {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub scheduled_time: NaiveDateTime,
    pub call_type: CallType,
    pub status: CallStatus,
    pub created_at: NaiveDateTime,
}

impl CallSchedule {
    pub fn pending(
        patient_id: Uuid,
        scheduled_time: NaiveDateTime,
        call_type: CallType,
        created_at: NaiveDateTime,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            patient_id,
            scheduled_time,
            call_type,
            status: CallStatus::Pending,
            created_at,
        }
    }
}

/// Schedule row joined with its patient's name, for listings spanning patients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleWithPatient {
    pub schedule: CallSchedule,
    pub patient_name: String,
}
