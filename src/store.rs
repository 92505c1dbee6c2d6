//! Storage collaborator consumed by the call engine.
//!
//! `CareStore` is the seam between the engine and persistence. The SQLite
//! implementation serializes access to one connection; the engine layers
//! per-patient locking on top.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use rusqlite::Connection;
use uuid::Uuid;

use crate::db::{self, repository, DatabaseError};
use crate::models::*;

pub trait CareStore: Send + Sync {
    // Registration
    /// Patient plus prescriptions, all-or-nothing.
    fn register_patient(
        &self,
        patient: &Patient,
        medications: &[Medication],
    ) -> Result<(), DatabaseError>;
    fn delete_patient(&self, id: &Uuid) -> Result<bool, DatabaseError>;

    // Engine operations
    fn get_patient(&self, id: &Uuid) -> Result<Option<Patient>, DatabaseError>;
    fn list_medications(&self, patient_id: &Uuid) -> Result<Vec<Medication>, DatabaseError>;
    /// Delete the patient's pending events and insert `batch` as one unit.
    /// Returns the number of pending events removed.
    fn replace_pending_schedules(
        &self,
        patient_id: &Uuid,
        batch: &[CallSchedule],
    ) -> Result<usize, DatabaseError>;
    fn get_schedule(&self, id: &Uuid) -> Result<Option<CallSchedule>, DatabaseError>;
    /// Insert `log` and set the event's status as one unit.
    fn record_call(
        &self,
        log: &CallLog,
        schedule_id: &Uuid,
        status: CallStatus,
    ) -> Result<(), DatabaseError>;

    // Read-only display queries
    fn list_patients(&self) -> Result<Vec<Patient>, DatabaseError>;
    /// Chronological (ascending `scheduled_time`).
    fn list_schedules(&self, patient_id: &Uuid) -> Result<Vec<CallSchedule>, DatabaseError>;
    /// Chronological across all patients.
    fn list_all_schedules(&self) -> Result<Vec<ScheduleWithPatient>, DatabaseError>;
    /// Most recent call first.
    fn list_call_logs(&self, patient_id: &Uuid) -> Result<Vec<CallLog>, DatabaseError>;
    /// Most recent call first, flagged only.
    fn list_flagged_calls(&self) -> Result<Vec<CallLogWithPatient>, DatabaseError>;
}

/// SQLite-backed care store.
pub struct SqliteCareStore {
    conn: Mutex<Connection>,
}

impl SqliteCareStore {
    /// Open (or create) the database file and run migrations.
    pub fn open(path: &Path) -> Result<Self, DatabaseError> {
        Ok(Self::from_connection(db::open_database(path)?))
    }

    /// Open an in-memory store (for testing).
    pub fn open_in_memory() -> Result<Self, DatabaseError> {
        Ok(Self::from_connection(db::open_memory_database()?))
    }

    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, DatabaseError> {
        self.conn.lock().map_err(|_| DatabaseError::LockPoisoned)
    }
}

impl CareStore for SqliteCareStore {
    fn register_patient(
        &self,
        patient: &Patient,
        medications: &[Medication],
    ) -> Result<(), DatabaseError> {
        let conn = self.conn()?;
        repository::insert_patient_with_medications(&conn, patient, medications)
    }

    fn delete_patient(&self, id: &Uuid) -> Result<bool, DatabaseError> {
        let conn = self.conn()?;
        repository::delete_patient(&conn, id)
    }

    fn get_patient(&self, id: &Uuid) -> Result<Option<Patient>, DatabaseError> {
        let conn = self.conn()?;
        repository::get_patient(&conn, id)
    }

    fn list_medications(&self, patient_id: &Uuid) -> Result<Vec<Medication>, DatabaseError> {
        let conn = self.conn()?;
        repository::get_medications_for_patient(&conn, patient_id)
    }

    fn replace_pending_schedules(
        &self,
        patient_id: &Uuid,
        batch: &[CallSchedule],
    ) -> Result<usize, DatabaseError> {
        let conn = self.conn()?;
        repository::replace_pending_schedules(&conn, patient_id, batch)
    }

    fn get_schedule(&self, id: &Uuid) -> Result<Option<CallSchedule>, DatabaseError> {
        let conn = self.conn()?;
        repository::get_schedule(&conn, id)
    }

    fn record_call(
        &self,
        log: &CallLog,
        schedule_id: &Uuid,
        status: CallStatus,
    ) -> Result<(), DatabaseError> {
        let conn = self.conn()?;
        repository::record_call(&conn, log, schedule_id, status)
    }

    fn list_patients(&self) -> Result<Vec<Patient>, DatabaseError> {
        let conn = self.conn()?;
        repository::list_patients(&conn)
    }

    fn list_schedules(&self, patient_id: &Uuid) -> Result<Vec<CallSchedule>, DatabaseError> {
        let conn = self.conn()?;
        repository::get_schedules_for_patient(&conn, patient_id)
    }

    fn list_all_schedules(&self) -> Result<Vec<ScheduleWithPatient>, DatabaseError> {
        let conn = self.conn()?;
        repository::get_all_schedules(&conn)
    }

    fn list_call_logs(&self, patient_id: &Uuid) -> Result<Vec<CallLog>, DatabaseError> {
        let conn = self.conn()?;
        repository::get_call_logs_for_patient(&conn, patient_id)
    }

    fn list_flagged_calls(&self) -> Result<Vec<CallLogWithPatient>, DatabaseError> {
        let conn = self.conn()?;
        repository::get_flagged_call_logs(&conn)
    }
}
