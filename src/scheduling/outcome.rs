//! Call outcome processor: one reported outcome → one log entry + one status change.

use chrono::NaiveDateTime;
use uuid::Uuid;

use crate::models::{CallLog, CallOutcome, CallSchedule, CallStatus};

/// Log entry to persist and the status the answered event ends in.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedOutcome {
    pub log: CallLog,
    pub status: CallStatus,
}

/// Resolve a call attempt against its scheduled event.
///
/// Unanswered calls are always flagged. Their event passes through `Missed`
/// and is escalated to `Flagged` in the same step, so `Missed` is never the
/// persisted state.
pub fn resolve_outcome(
    schedule: &CallSchedule,
    outcome: &CallOutcome,
    now: NaiveDateTime,
) -> ResolvedOutcome {
    let flagged = !outcome.answered;

    let log = CallLog {
        id: Uuid::new_v4(),
        patient_id: schedule.patient_id,
        schedule_id: Some(schedule.id),
        call_time: now,
        answered: outcome.answered,
        duration_secs: outcome.duration_secs,
        notes: outcome.notes.clone(),
        flagged,
        created_at: now,
    };

    let mut status = if outcome.answered {
        CallStatus::Completed
    } else {
        CallStatus::Missed
    };
    if flagged {
        status = CallStatus::Flagged;
    }

    ResolvedOutcome { log, status }
}
