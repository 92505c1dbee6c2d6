//! Schedule generator: a patient's medications → pending call events.
//!
//! Reminder instants keep the date arithmetic of "now + d days" but replace
//! the time of day with the slot hour, so calls land on clean hours no matter
//! when registration happened. Checkups follow the same rule at a fixed hour.

use chrono::{Duration, NaiveDateTime, NaiveTime};
use uuid::Uuid;

use super::frequency::classify_frequency;
use super::slots::slots_for_count;
use super::ScheduleError;
use crate::config::ScheduleLimits;
use crate::models::{CallSchedule, CallType, Medication};

/// Events produced for one patient by a single generation pass.
#[derive(Debug, Clone, Default)]
pub struct GeneratedSchedule {
    pub reminders: Vec<CallSchedule>,
    pub checkups: Vec<CallSchedule>,
}

impl GeneratedSchedule {
    pub fn len(&self) -> usize {
        self.reminders.len() + self.checkups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All events in one batch, reminders first.
    pub fn into_events(self) -> Vec<CallSchedule> {
        let mut events = self.reminders;
        events.extend(self.checkups);
        events
    }
}

/// Build the pending reminder and checkup events for `medications`.
///
/// Deterministic in its inputs apart from fresh event ids. An empty
/// medication list is `NoMedications`.
pub fn build_schedule(
    patient_id: Uuid,
    medications: &[Medication],
    now: NaiveDateTime,
    limits: &ScheduleLimits,
) -> Result<GeneratedSchedule, ScheduleError> {
    limits.validate()?;

    let max_duration_days = medications
        .iter()
        .map(|med| med.duration_days)
        .max()
        .ok_or(ScheduleError::NoMedications(patient_id))?;

    let mut generated = GeneratedSchedule::default();

    for med in medications {
        let calls_per_day = classify_frequency(&med.frequency);
        let hours = slots_for_count(calls_per_day)?;
        let days = med.duration_days.min(limits.reminder_horizon_days);

        tracing::debug!(
            medication = %med.name,
            frequency = %med.frequency,
            calls_per_day,
            days,
            "Scheduling medication reminders"
        );

        for day in 0..days {
            for &hour in hours {
                generated.reminders.push(CallSchedule::pending(
                    patient_id,
                    rebase(now, i64::from(day), hour)?,
                    CallType::MedicationReminder,
                    now,
                ));
            }
        }
    }

    let weeks = (max_duration_days / limits.checkup_interval_days).min(limits.max_checkups);
    for week in 1..=weeks {
        let offset_days = i64::from(week) * i64::from(limits.checkup_interval_days);
        generated.checkups.push(CallSchedule::pending(
            patient_id,
            rebase(now, offset_days, limits.checkup_hour)?,
            CallType::Checkup,
            now,
        ));
    }

    Ok(generated)
}

/// `now`'s date advanced by `days`, at `hour`:00:00.
fn rebase(now: NaiveDateTime, days: i64, hour: u32) -> Result<NaiveDateTime, ScheduleError> {
    let time = NaiveTime::from_hms_opt(hour, 0, 0)
        .ok_or_else(|| ScheduleError::InvalidArgument(format!("invalid call hour: {hour}")))?;
    let date = now
        .date()
        .checked_add_signed(Duration::days(days))
        .ok_or_else(|| ScheduleError::InvalidArgument(format!("date overflow adding {days} days")))?;
    Ok(date.and_time(time))
}
