//! Call engine: registration, schedule regeneration and outcome recording.
//!
//! Regeneration deletes pending events while outcome recording mutates one
//! of them, so both run under the same per-patient lock. Different patients
//! never contend. Each operation reads the clock exactly once.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::ScheduleLimits;
use crate::models::*;
use crate::scheduling::{build_schedule, resolve_outcome, Clock, ScheduleError};
use crate::store::CareStore;

/// Result of a successful generation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationSummary {
    pub events_created: usize,
    pub reminders: usize,
    pub checkups: usize,
    pub pending_cleared: usize,
}

/// Result of registering a patient with their prescriptions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Registration {
    pub patient: Patient,
    pub medications: Vec<Medication>,
    /// Events generated right after registration (0 when nothing was prescribed).
    pub events_created: usize,
}

/// Lazily-populated table of one mutex per patient.
#[derive(Default)]
struct PatientLocks {
    locks: Mutex<HashMap<Uuid, Arc<Mutex<()>>>>,
}

impl PatientLocks {
    fn for_patient(&self, patient_id: Uuid) -> Result<Arc<Mutex<()>>, ScheduleError> {
        let mut locks = self.locks.lock().map_err(|_| ScheduleError::LockPoisoned)?;
        Ok(Arc::clone(locks.entry(patient_id).or_default()))
    }

    fn forget(&self, patient_id: &Uuid) -> Result<(), ScheduleError> {
        let mut locks = self.locks.lock().map_err(|_| ScheduleError::LockPoisoned)?;
        locks.remove(patient_id);
        Ok(())
    }
}

pub struct CallEngine {
    store: Arc<dyn CareStore>,
    clock: Arc<dyn Clock>,
    limits: ScheduleLimits,
    locks: PatientLocks,
}

impl CallEngine {
    pub fn new(store: Arc<dyn CareStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            limits: ScheduleLimits::default(),
            locks: PatientLocks::default(),
        }
    }

    pub fn with_limits(mut self, limits: ScheduleLimits) -> Result<Self, ScheduleError> {
        limits.validate()?;
        self.limits = limits;
        Ok(self)
    }

    pub fn store(&self) -> &dyn CareStore {
        self.store.as_ref()
    }

    /// Persist a new patient and their prescriptions, then generate the call schedule.
    pub fn register_patient(&self, input: NewPatient) -> Result<Registration, ScheduleError> {
        validate_registration(&input)?;

        let now = self.clock.now();
        let (patient, new_meds) = input.into_patient(now);
        let medications: Vec<Medication> = new_meds
            .into_iter()
            .map(|m| m.into_medication(patient.id, now))
            .collect();

        let lock = self.locks.for_patient(patient.id)?;
        let _guard = lock.lock().map_err(|_| ScheduleError::LockPoisoned)?;

        self.store.register_patient(&patient, &medications)?;

        let events_created = match self.regenerate_locked(patient.id, now) {
            Ok(summary) => summary.events_created,
            Err(ScheduleError::NoMedications(_)) => 0,
            Err(e) => return Err(e),
        };

        tracing::info!(
            patient_id = %patient.id,
            medications = medications.len(),
            events_created,
            "Patient registered"
        );

        Ok(Registration {
            patient,
            medications,
            events_created,
        })
    }

    /// Replace the patient's pending schedule with a freshly generated one.
    ///
    /// Unknown patient: `NotFound`, nothing changes. No medications: the
    /// pending schedule is still cleared, then `NoMedications` is returned.
    pub fn generate_schedule(&self, patient_id: Uuid) -> Result<GenerationSummary, ScheduleError> {
        let now = self.clock.now();
        let lock = self.locks.for_patient(patient_id)?;
        let result = {
            let _guard = lock.lock().map_err(|_| ScheduleError::LockPoisoned)?;
            self.regenerate_locked(patient_id, now)
        };
        if matches!(result, Err(ScheduleError::NotFound { .. })) {
            self.locks.forget(&patient_id)?;
        }
        result
    }

    /// Caller must hold the patient's lock.
    fn regenerate_locked(
        &self,
        patient_id: Uuid,
        now: chrono::NaiveDateTime,
    ) -> Result<GenerationSummary, ScheduleError> {
        if self.store.get_patient(&patient_id)?.is_none() {
            return Err(ScheduleError::patient_not_found(patient_id));
        }

        let medications = self.store.list_medications(&patient_id)?;
        if medications.is_empty() {
            let pending_cleared = self.store.replace_pending_schedules(&patient_id, &[])?;
            tracing::warn!(
                patient_id = %patient_id,
                pending_cleared,
                "No medications to schedule; pending calls cleared without replacement"
            );
            return Err(ScheduleError::NoMedications(patient_id));
        }

        let generated = build_schedule(patient_id, &medications, now, &self.limits)?;
        let reminders = generated.reminders.len();
        let checkups = generated.checkups.len();
        let events = generated.into_events();
        let pending_cleared = self.store.replace_pending_schedules(&patient_id, &events)?;

        tracing::info!(
            patient_id = %patient_id,
            events_created = events.len(),
            reminders,
            checkups,
            pending_cleared,
            "Call schedule generated"
        );

        Ok(GenerationSummary {
            events_created: events.len(),
            reminders,
            checkups,
            pending_cleared,
        })
    }

    /// Record the outcome of a call attempt against a scheduled event.
    pub fn record_outcome(
        &self,
        schedule_id: Uuid,
        outcome: CallOutcome,
    ) -> Result<CallLog, ScheduleError> {
        let now = self.clock.now();

        let patient_id = self
            .store
            .get_schedule(&schedule_id)?
            .ok_or_else(|| ScheduleError::schedule_not_found(schedule_id))?
            .patient_id;

        let lock = self.locks.for_patient(patient_id)?;
        let _guard = lock.lock().map_err(|_| ScheduleError::LockPoisoned)?;

        // A regeneration may have removed the event while we waited for the lock
        let schedule = self
            .store
            .get_schedule(&schedule_id)?
            .ok_or_else(|| ScheduleError::schedule_not_found(schedule_id))?;

        if schedule.status.is_resolved() {
            tracing::warn!(
                schedule_id = %schedule_id,
                status = %schedule.status,
                "Recording outcome for an already resolved call"
            );
        }

        let resolved = resolve_outcome(&schedule, &outcome, now);
        self.store.record_call(&resolved.log, &schedule_id, resolved.status)?;

        tracing::info!(
            schedule_id = %schedule_id,
            patient_id = %patient_id,
            answered = outcome.answered,
            status = %resolved.status,
            "Call outcome recorded"
        );

        Ok(resolved.log)
    }

    /// Delete a patient with their medications, schedule and call history.
    pub fn delete_patient(&self, patient_id: Uuid) -> Result<(), ScheduleError> {
        let deleted = {
            let lock = self.locks.for_patient(patient_id)?;
            let _guard = lock.lock().map_err(|_| ScheduleError::LockPoisoned)?;
            self.store.delete_patient(&patient_id)?
        };
        self.locks.forget(&patient_id)?;
        if !deleted {
            return Err(ScheduleError::patient_not_found(patient_id));
        }
        tracing::info!(patient_id = %patient_id, "Patient deleted");
        Ok(())
    }
}

fn validate_registration(input: &NewPatient) -> Result<(), ScheduleError> {
    if input.name.trim().is_empty() {
        return Err(ScheduleError::InvalidArgument("patient name is required".into()));
    }
    for med in &input.medications {
        if med.name.trim().is_empty() {
            return Err(ScheduleError::InvalidArgument("medication name is required".into()));
        }
        if med.duration_days == 0 {
            return Err(ScheduleError::InvalidArgument(format!(
                "duration_days for {} must be at least 1",
                med.name
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DatabaseError;
    use crate::scheduling::FixedClock;
    use crate::store::SqliteCareStore;
    use chrono::{Duration, NaiveDate, NaiveDateTime, Timelike};
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicBool, Ordering};

    fn registered_at() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(11, 23, 45)
            .unwrap()
    }

    fn on(day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, day)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    fn setup() -> (CallEngine, Arc<FixedClock>) {
        let store = Arc::new(SqliteCareStore::open_in_memory().unwrap());
        let clock = Arc::new(FixedClock::new(registered_at()));
        (CallEngine::new(store, clock.clone()), clock)
    }

    fn new_patient(medications: Vec<NewMedication>) -> NewPatient {
        NewPatient {
            name: "Amina Wanjiru".into(),
            age: 54,
            sex: "female".into(),
            height_cm: 162.5,
            weight_kg: 70.2,
            phone: "+254700000001".into(),
            diagnosis: "Type 2 diabetes".into(),
            doctor_name: "Dr. Otieno".into(),
            medications,
        }
    }

    fn prescription(frequency: &str, duration_days: u32) -> NewMedication {
        NewMedication {
            name: "Metformin".into(),
            dosage: "500mg".into(),
            frequency: frequency.into(),
            duration_days,
            instructions: None,
        }
    }

    fn pending_count(engine: &CallEngine, patient_id: &Uuid) -> usize {
        engine
            .store()
            .list_schedules(patient_id)
            .unwrap()
            .iter()
            .filter(|s| s.status == CallStatus::Pending)
            .count()
    }

    #[test]
    fn engine_is_shareable_across_threads() {
        fn _assert<T: Send + Sync>() {}
        _assert::<CallEngine>();
    }

    #[test]
    fn twice_daily_end_to_end() {
        let (engine, clock) = setup();
        let reg = engine
            .register_patient(new_patient(vec![prescription("twice daily", 3)]))
            .unwrap();
        assert_eq!(reg.events_created, 6);

        let schedules = engine.store().list_schedules(&reg.patient.id).unwrap();
        let times: Vec<NaiveDateTime> = schedules.iter().map(|s| s.scheduled_time).collect();
        assert_eq!(
            times,
            vec![on(1, 9), on(1, 20), on(2, 9), on(2, 20), on(3, 9), on(3, 20)]
        );
        assert!(schedules.iter().all(|s| s.call_type == CallType::MedicationReminder));

        clock.set(on(1, 9) + Duration::minutes(3));
        let first = &schedules[0];
        let log = engine
            .record_outcome(first.id, CallOutcome::unanswered("No answer"))
            .unwrap();
        assert!(log.flagged);
        assert_eq!(log.call_time, on(1, 9) + Duration::minutes(3));

        let updated = engine.store().get_schedule(&first.id).unwrap().unwrap();
        assert_eq!(updated.status, CallStatus::Flagged);
        assert_eq!(pending_count(&engine, &reg.patient.id), 5);
    }

    #[test]
    fn answered_call_completes_event() {
        let (engine, _) = setup();
        let reg = engine
            .register_patient(new_patient(vec![prescription("once daily", 2)]))
            .unwrap();
        let event = engine.store().list_schedules(&reg.patient.id).unwrap()[0].clone();

        let log = engine
            .record_outcome(event.id, CallOutcome::answered(95, "Dose taken"))
            .unwrap();
        assert!(!log.flagged);
        assert_eq!(log.schedule_id, Some(event.id));
        assert_eq!(
            engine.store().get_schedule(&event.id).unwrap().unwrap().status,
            CallStatus::Completed
        );
        assert_eq!(engine.store().list_call_logs(&reg.patient.id).unwrap(), vec![log]);
    }

    #[test]
    fn regeneration_is_idempotent() {
        let (engine, _) = setup();
        let reg = engine
            .register_patient(new_patient(vec![prescription("three times daily", 10)]))
            .unwrap();
        let after_first = pending_count(&engine, &reg.patient.id);

        let summary = engine.generate_schedule(reg.patient.id).unwrap();
        assert_eq!(summary.pending_cleared, after_first);
        assert_eq!(summary.events_created, after_first);
        assert_eq!(pending_count(&engine, &reg.patient.id), after_first);
    }

    #[test]
    fn regeneration_preserves_resolved_history() {
        let (engine, clock) = setup();
        let reg = engine
            .register_patient(new_patient(vec![prescription("twice daily", 3)]))
            .unwrap();
        let events = engine.store().list_schedules(&reg.patient.id).unwrap();
        engine
            .record_outcome(events[0].id, CallOutcome::answered(60, ""))
            .unwrap();
        engine
            .record_outcome(events[1].id, CallOutcome::unanswered(""))
            .unwrap();

        clock.set(registered_at() + Duration::days(1));
        let summary = engine.generate_schedule(reg.patient.id).unwrap();
        assert_eq!(summary.pending_cleared, 4);
        assert_eq!(summary.events_created, 6);

        let schedules = engine.store().list_schedules(&reg.patient.id).unwrap();
        assert_eq!(schedules.len(), 8);
        let resolved: Vec<CallStatus> = schedules
            .iter()
            .filter(|s| s.status.is_resolved())
            .map(|s| s.status)
            .collect();
        assert_eq!(resolved, vec![CallStatus::Completed, CallStatus::Flagged]);
    }

    #[test]
    fn unknown_patient_is_not_found() {
        let (engine, _) = setup();
        let id = Uuid::new_v4();
        let result = engine.generate_schedule(id);
        assert!(matches!(
            result,
            Err(ScheduleError::NotFound { entity_type: "Patient", id: missing }) if missing == id
        ));
    }

    #[test]
    fn unknown_schedule_is_not_found() {
        let (engine, _) = setup();
        let result = engine.record_outcome(Uuid::new_v4(), CallOutcome::answered(10, ""));
        assert!(matches!(
            result,
            Err(ScheduleError::NotFound { entity_type: "CallSchedule", .. })
        ));
    }

    #[test]
    fn registration_without_medications_creates_no_events() {
        let (engine, _) = setup();
        let reg = engine.register_patient(new_patient(vec![])).unwrap();
        assert_eq!(reg.events_created, 0);
        assert!(engine.store().get_patient(&reg.patient.id).unwrap().is_some());

        let result = engine.generate_schedule(reg.patient.id);
        assert!(matches!(result, Err(ScheduleError::NoMedications(_))));
    }

    #[test]
    fn no_medications_still_clears_pending() {
        let (engine, clock) = setup();
        // Seed a patient with a pending event but no prescriptions
        let patient = new_patient(vec![]).into_patient(registered_at()).0;
        engine.store().register_patient(&patient, &[]).unwrap();
        engine
            .store()
            .replace_pending_schedules(
                &patient.id,
                &[CallSchedule::pending(patient.id, on(2, 10), CallType::Checkup, registered_at())],
            )
            .unwrap();
        assert_eq!(pending_count(&engine, &patient.id), 1);

        clock.advance(Duration::hours(1));
        let result = engine.generate_schedule(patient.id);
        assert!(matches!(result, Err(ScheduleError::NoMedications(id)) if id == patient.id));
        assert_eq!(pending_count(&engine, &patient.id), 0);
    }

    #[test]
    fn horizon_and_checkup_caps_through_engine() {
        let (engine, _) = setup();
        let reg = engine
            .register_patient(new_patient(vec![prescription("once daily", 100)]))
            .unwrap();
        let schedules = engine.store().list_schedules(&reg.patient.id).unwrap();
        let reminders = schedules
            .iter()
            .filter(|s| s.call_type == CallType::MedicationReminder)
            .count();
        let checkups: Vec<NaiveDateTime> = schedules
            .iter()
            .filter(|s| s.call_type == CallType::Checkup)
            .map(|s| s.scheduled_time)
            .collect();
        assert_eq!(reminders, 30);
        assert_eq!(checkups, vec![on(8, 10), on(15, 10), on(22, 10), on(29, 10)]);
        assert_eq!(reg.events_created, 34);
    }

    #[test]
    fn outcome_on_regenerated_away_event_is_not_found() {
        let (engine, _) = setup();
        let reg = engine
            .register_patient(new_patient(vec![prescription("daily", 2)]))
            .unwrap();
        let stale = engine.store().list_schedules(&reg.patient.id).unwrap()[0].id;
        engine.generate_schedule(reg.patient.id).unwrap();

        let result = engine.record_outcome(stale, CallOutcome::answered(30, ""));
        assert!(matches!(result, Err(ScheduleError::NotFound { .. })));
        assert!(engine.store().list_call_logs(&reg.patient.id).unwrap().is_empty());
    }

    #[test]
    fn registration_rejects_blank_names_and_zero_duration() {
        let (engine, _) = setup();

        let mut nameless = new_patient(vec![]);
        nameless.name = "  ".into();
        assert!(matches!(
            engine.register_patient(nameless),
            Err(ScheduleError::InvalidArgument(_))
        ));

        assert!(matches!(
            engine.register_patient(new_patient(vec![prescription("daily", 0)])),
            Err(ScheduleError::InvalidArgument(_))
        ));

        let mut blank_med = prescription("daily", 5);
        blank_med.name = String::new();
        assert!(matches!(
            engine.register_patient(new_patient(vec![blank_med])),
            Err(ScheduleError::InvalidArgument(_))
        ));
        assert!(engine.store().list_patients().unwrap().is_empty());
    }

    #[test]
    fn clock_read_once_per_generation() {
        let (engine, _) = setup();
        let reg = engine
            .register_patient(new_patient(vec![prescription("twice daily", 5)]))
            .unwrap();
        let schedules = engine.store().list_schedules(&reg.patient.id).unwrap();
        assert!(schedules.iter().all(|s| s.created_at == registered_at()));
        assert!(reg.medications.iter().all(|m| m.created_at == registered_at()));
    }

    #[test]
    fn custom_limits_rejected_when_invalid() {
        let (engine, _) = setup();
        let limits = ScheduleLimits {
            checkup_hour: 30,
            ..ScheduleLimits::default()
        };
        assert!(engine.with_limits(limits).is_err());
    }

    #[test]
    fn delete_patient_cascades_and_reports_missing() {
        let (engine, _) = setup();
        let reg = engine
            .register_patient(new_patient(vec![prescription("twice daily", 3)]))
            .unwrap();
        let event = engine.store().list_schedules(&reg.patient.id).unwrap()[0].id;
        engine
            .record_outcome(event, CallOutcome::unanswered(""))
            .unwrap();

        engine.delete_patient(reg.patient.id).unwrap();
        assert!(engine.store().get_patient(&reg.patient.id).unwrap().is_none());
        assert!(engine.store().list_schedules(&reg.patient.id).unwrap().is_empty());
        assert!(engine.store().list_flagged_calls().unwrap().is_empty());

        assert!(matches!(
            engine.delete_patient(reg.patient.id),
            Err(ScheduleError::NotFound { .. })
        ));
    }

    #[test]
    fn concurrent_patients_and_outcomes() {
        let (engine, _) = setup();
        let engine = Arc::new(engine);

        let patients: Vec<Uuid> = (0..4)
            .map(|_| {
                engine
                    .register_patient(new_patient(vec![prescription("twice daily", 7)]))
                    .unwrap()
                    .patient
                    .id
            })
            .collect();

        let handles: Vec<_> = patients
            .iter()
            .copied()
            .map(|patient_id| {
                let engine = Arc::clone(&engine);
                std::thread::spawn(move || {
                    for _ in 0..3 {
                        engine.generate_schedule(patient_id).unwrap();
                        let events = engine.store().list_schedules(&patient_id).unwrap();
                        if let Some(next) = events.iter().find(|s| s.status == CallStatus::Pending) {
                            engine
                                .record_outcome(next.id, CallOutcome::answered(45, ""))
                                .unwrap();
                        }
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        for patient_id in &patients {
            assert_eq!(pending_count(&engine, patient_id), 14);
            assert_eq!(engine.store().list_call_logs(patient_id).unwrap().len(), 3);
        }
    }

    /// SQLite store that can be told to sabotage its next writes from inside
    /// the transaction: batches gain a duplicate id, status updates miss.
    struct FaultyStore {
        inner: SqliteCareStore,
        duplicate_batches: AtomicBool,
        misdirect_status: AtomicBool,
    }

    impl FaultyStore {
        fn new() -> Self {
            Self {
                inner: SqliteCareStore::open_in_memory().unwrap(),
                duplicate_batches: AtomicBool::new(false),
                misdirect_status: AtomicBool::new(false),
            }
        }
    }

    impl CareStore for FaultyStore {
        fn register_patient(&self, p: &Patient, m: &[Medication]) -> Result<(), DatabaseError> {
            self.inner.register_patient(p, m)
        }
        fn delete_patient(&self, id: &Uuid) -> Result<bool, DatabaseError> {
            self.inner.delete_patient(id)
        }
        fn get_patient(&self, id: &Uuid) -> Result<Option<Patient>, DatabaseError> {
            self.inner.get_patient(id)
        }
        fn list_medications(&self, id: &Uuid) -> Result<Vec<Medication>, DatabaseError> {
            self.inner.list_medications(id)
        }
        fn replace_pending_schedules(
            &self,
            patient_id: &Uuid,
            batch: &[CallSchedule],
        ) -> Result<usize, DatabaseError> {
            let mut batch = batch.to_vec();
            if self.duplicate_batches.load(Ordering::SeqCst) {
                if let Some(first) = batch.first().cloned() {
                    batch.push(first);
                }
            }
            self.inner.replace_pending_schedules(patient_id, &batch)
        }
        fn get_schedule(&self, id: &Uuid) -> Result<Option<CallSchedule>, DatabaseError> {
            self.inner.get_schedule(id)
        }
        fn record_call(
            &self,
            log: &CallLog,
            schedule_id: &Uuid,
            status: CallStatus,
        ) -> Result<(), DatabaseError> {
            if self.misdirect_status.load(Ordering::SeqCst) {
                return self.inner.record_call(log, &Uuid::new_v4(), status);
            }
            self.inner.record_call(log, schedule_id, status)
        }
        fn list_patients(&self) -> Result<Vec<Patient>, DatabaseError> {
            self.inner.list_patients()
        }
        fn list_schedules(&self, id: &Uuid) -> Result<Vec<CallSchedule>, DatabaseError> {
            self.inner.list_schedules(id)
        }
        fn list_all_schedules(&self) -> Result<Vec<ScheduleWithPatient>, DatabaseError> {
            self.inner.list_all_schedules()
        }
        fn list_call_logs(&self, id: &Uuid) -> Result<Vec<CallLog>, DatabaseError> {
            self.inner.list_call_logs(id)
        }
        fn list_flagged_calls(&self) -> Result<Vec<CallLogWithPatient>, DatabaseError> {
            self.inner.list_flagged_calls()
        }
    }

    fn faulty_setup() -> (CallEngine, Arc<FaultyStore>) {
        let store = Arc::new(FaultyStore::new());
        let clock = Arc::new(FixedClock::new(registered_at()));
        (CallEngine::new(store.clone(), clock), store)
    }

    #[test]
    fn failed_regeneration_keeps_previous_pending_schedule() {
        let (engine, store) = faulty_setup();
        let reg = engine
            .register_patient(new_patient(vec![prescription("twice daily", 3)]))
            .unwrap();
        let before = engine.store().list_schedules(&reg.patient.id).unwrap();
        assert_eq!(before.len(), 6);

        store.duplicate_batches.store(true, Ordering::SeqCst);
        let result = engine.generate_schedule(reg.patient.id);
        assert!(matches!(result, Err(ScheduleError::Database(_))));
        assert_eq!(engine.store().list_schedules(&reg.patient.id).unwrap(), before);
    }

    #[test]
    fn failed_status_update_leaves_no_call_log() {
        let (engine, store) = faulty_setup();
        let reg = engine
            .register_patient(new_patient(vec![prescription("once daily", 2)]))
            .unwrap();
        let event = engine.store().list_schedules(&reg.patient.id).unwrap()[0].clone();

        store.misdirect_status.store(true, Ordering::SeqCst);
        let result = engine.record_outcome(event.id, CallOutcome::unanswered("No answer"));
        assert!(matches!(
            result,
            Err(ScheduleError::Database(DatabaseError::NotFound { .. }))
        ));
        assert!(engine.store().list_call_logs(&reg.patient.id).unwrap().is_empty());
        assert_eq!(
            engine.store().get_schedule(&event.id).unwrap().unwrap().status,
            CallStatus::Pending
        );
    }

    #[test]
    fn same_patient_regeneration_and_outcomes_serialize() {
        let (engine, _) = setup();
        let engine = Arc::new(engine);
        let reg = engine
            .register_patient(new_patient(vec![prescription("twice daily", 7)]))
            .unwrap();
        let patient_id = reg.patient.id;
        let per_generation = reg.events_created;

        let regenerators: Vec<_> = (0..2)
            .map(|_| {
                let engine = Arc::clone(&engine);
                std::thread::spawn(move || {
                    for _ in 0..5 {
                        engine.generate_schedule(patient_id).unwrap();
                    }
                })
            })
            .collect();

        // Morning and evening callers never pick the same event
        let callers: Vec<_> = [true, false]
            .into_iter()
            .map(|morning| {
                let engine = Arc::clone(&engine);
                std::thread::spawn(move || {
                    let mut resolved = Vec::new();
                    for _ in 0..5 {
                        let events = engine.store().list_schedules(&patient_id).unwrap();
                        let next = events.iter().find(|s| {
                            s.status == CallStatus::Pending
                                && (s.scheduled_time.hour() < 12) == morning
                        });
                        let Some(event) = next else { continue };
                        match engine.record_outcome(event.id, CallOutcome::answered(40, "")) {
                            Ok(log) => resolved.push(log.schedule_id.unwrap()),
                            Err(ScheduleError::NotFound { .. }) => {}
                            Err(e) => panic!("unexpected error: {e}"),
                        }
                    }
                    resolved
                })
            })
            .collect();

        for handle in regenerators {
            handle.join().unwrap();
        }
        let resolved: Vec<Uuid> = callers
            .into_iter()
            .flat_map(|handle| handle.join().unwrap())
            .collect();

        let logs = engine.store().list_call_logs(&patient_id).unwrap();
        assert_eq!(logs.len(), resolved.len());
        for id in &resolved {
            assert_eq!(logs.iter().filter(|l| l.schedule_id == Some(*id)).count(), 1);
            assert_eq!(
                engine.store().get_schedule(id).unwrap().unwrap().status,
                CallStatus::Completed
            );
        }

        let pending: Vec<(NaiveDateTime, CallType)> = engine
            .store()
            .list_schedules(&patient_id)
            .unwrap()
            .into_iter()
            .filter(|s| s.status == CallStatus::Pending)
            .map(|s| (s.scheduled_time, s.call_type))
            .collect();
        let distinct: HashSet<_> = pending.iter().copied().collect();
        assert_eq!(distinct.len(), pending.len(), "interleaved regenerations");
        assert!(pending.len() <= per_generation);

        let summary = engine.generate_schedule(patient_id).unwrap();
        assert_eq!(summary.pending_cleared, pending.len());
        assert_eq!(pending_count(&engine, &patient_id), per_generation);
    }

    #[test]
    fn unknown_ids_leave_no_lock_entries() {
        let (engine, _) = setup();
        for _ in 0..3 {
            assert!(engine.generate_schedule(Uuid::new_v4()).is_err());
            assert!(engine.delete_patient(Uuid::new_v4()).is_err());
        }
        assert!(engine.locks.locks.lock().unwrap().is_empty());
    }
}
