//! Read-only views for the care team: roster, patient detail, the merged
//! call board and the flagged-call queue.
//!
//! Ordering contract: schedules ascend by `scheduled_time`, call logs
//! descend by `call_time`.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::*;
use crate::scheduling::ScheduleError;
use crate::store::CareStore;

/// Roster line, as exposed to external consumers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientSummary {
    pub id: Uuid,
    pub name: String,
    pub age: u32,
    pub diagnosis: String,
    pub phone: String,
}

impl From<&Patient> for PatientSummary {
    fn from(p: &Patient) -> Self {
        Self {
            id: p.id,
            name: p.name.clone(),
            age: p.age,
            diagnosis: p.diagnosis.clone(),
            phone: p.phone.clone(),
        }
    }
}

/// Everything shown on a patient's page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatientDetail {
    pub patient: Patient,
    pub medications: Vec<Medication>,
    pub schedules: Vec<CallSchedule>,
    pub call_logs: Vec<CallLog>,
    pub pending_calls: usize,
    pub flagged_calls: usize,
}

/// One schedule entry in the per-patient feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    pub id: Uuid,
    /// ISO-8601 without offset, e.g. `2024-03-01T09:00:00`.
    pub scheduled_time: String,
    pub call_type: CallType,
    pub status: CallStatus,
}

impl From<&CallSchedule> for ScheduleEntry {
    fn from(s: &CallSchedule) -> Self {
        Self {
            id: s.id,
            scheduled_time: s.scheduled_time.format("%Y-%m-%dT%H:%M:%S%.f").to_string(),
            call_type: s.call_type,
            status: s.status,
        }
    }
}

/// Patients, most recently registered first.
pub fn patient_roster(store: &dyn CareStore) -> Result<Vec<PatientSummary>, ScheduleError> {
    Ok(store.list_patients()?.iter().map(PatientSummary::from).collect())
}

pub fn patient_detail(
    store: &dyn CareStore,
    patient_id: Uuid,
) -> Result<PatientDetail, ScheduleError> {
    let patient = store
        .get_patient(&patient_id)?
        .ok_or_else(|| ScheduleError::patient_not_found(patient_id))?;
    let medications = store.list_medications(&patient_id)?;
    let schedules = store.list_schedules(&patient_id)?;
    let call_logs = store.list_call_logs(&patient_id)?;

    let pending_calls = schedules
        .iter()
        .filter(|s| s.status == CallStatus::Pending)
        .count();
    let flagged_calls = call_logs.iter().filter(|l| l.flagged).count();

    Ok(PatientDetail {
        patient,
        medications,
        schedules,
        call_logs,
        pending_calls,
        flagged_calls,
    })
}

/// Every patient's calls merged into one chronological board.
pub fn schedule_board(store: &dyn CareStore) -> Result<Vec<ScheduleWithPatient>, ScheduleError> {
    Ok(store.list_all_schedules()?)
}

/// Unanswered calls awaiting follow-up, most recent first.
pub fn flagged_calls(store: &dyn CareStore) -> Result<Vec<CallLogWithPatient>, ScheduleError> {
    Ok(store.list_flagged_calls()?)
}

/// Chronological schedule feed for one patient.
pub fn schedule_feed(
    store: &dyn CareStore,
    patient_id: Uuid,
) -> Result<Vec<ScheduleEntry>, ScheduleError> {
    Ok(store
        .list_schedules(&patient_id)?
        .iter()
        .map(ScheduleEntry::from)
        .collect())
}
