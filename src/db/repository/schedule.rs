use std::str::FromStr;

use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use super::{format_datetime, parse_datetime, parse_uuid};
use crate::db::DatabaseError;
use crate::models::*;

pub fn insert_schedule(conn: &Connection, schedule: &CallSchedule) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO call_schedules (id, patient_id, scheduled_time, call_type, status, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            schedule.id.to_string(),
            schedule.patient_id.to_string(),
            format_datetime(&schedule.scheduled_time),
            schedule.call_type.as_str(),
            schedule.status.as_str(),
            format_datetime(&schedule.created_at),
        ],
    )?;
    Ok(())
}

/// Remove the open (pending) schedule of a patient. Resolved events are kept as history.
pub fn delete_pending_schedules(conn: &Connection, patient_id: &Uuid) -> Result<usize, DatabaseError> {
    let deleted = conn.execute(
        "DELETE FROM call_schedules WHERE patient_id = ?1 AND status = 'pending'",
        params![patient_id.to_string()],
    )?;
    Ok(deleted)
}

/// Swap a patient's pending schedule for `batch` in one transaction.
///
/// Returns how many pending events were removed. On any failure the old
/// pending schedule is left in place. An empty batch only clears.
pub fn replace_pending_schedules(
    conn: &Connection,
    patient_id: &Uuid,
    batch: &[CallSchedule],
) -> Result<usize, DatabaseError> {
    let tx = conn.unchecked_transaction()?;
    let cleared = delete_pending_schedules(&tx, patient_id)?;
    for schedule in batch {
        insert_schedule(&tx, schedule)?;
    }
    tx.commit()?;
    Ok(cleared)
}

pub fn get_schedule(conn: &Connection, id: &Uuid) -> Result<Option<CallSchedule>, DatabaseError> {
    let row = conn
        .query_row(
            "SELECT id, patient_id, scheduled_time, call_type, status, created_at
             FROM call_schedules WHERE id = ?1",
            params![id.to_string()],
            schedule_row_from_rusqlite,
        )
        .optional()?;

    row.map(schedule_from_row).transpose()
}

pub fn update_schedule_status(
    conn: &Connection,
    id: &Uuid,
    status: CallStatus,
) -> Result<(), DatabaseError> {
    let updated = conn.execute(
        "UPDATE call_schedules SET status = ?1 WHERE id = ?2",
        params![status.as_str(), id.to_string()],
    )?;
    if updated == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "CallSchedule".into(),
            id: id.to_string(),
        });
    }
    Ok(())
}

/// Schedule of one patient in chronological order.
pub fn get_schedules_for_patient(
    conn: &Connection,
    patient_id: &Uuid,
) -> Result<Vec<CallSchedule>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, patient_id, scheduled_time, call_type, status, created_at
         FROM call_schedules WHERE patient_id = ?1
         ORDER BY scheduled_time ASC, rowid ASC",
    )?;

    let rows = stmt.query_map(params![patient_id.to_string()], schedule_row_from_rusqlite)?;

    let mut schedules = Vec::new();
    for row in rows {
        schedules.push(schedule_from_row(row?)?);
    }
    Ok(schedules)
}

/// Every patient's schedule merged in chronological order.
pub fn get_all_schedules(conn: &Connection) -> Result<Vec<ScheduleWithPatient>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT s.id, s.patient_id, s.scheduled_time, s.call_type, s.status, s.created_at, p.name
         FROM call_schedules s
         JOIN patients p ON p.id = s.patient_id
         ORDER BY s.scheduled_time ASC, s.rowid ASC",
    )?;

    let rows = stmt.query_map([], |row| {
        Ok((schedule_row_from_rusqlite(row)?, row.get::<_, String>(6)?))
    })?;

    let mut schedules = Vec::new();
    for row in rows {
        let (schedule_row, patient_name) = row?;
        schedules.push(ScheduleWithPatient {
            schedule: schedule_from_row(schedule_row)?,
            patient_name,
        });
    }
    Ok(schedules)
}

struct ScheduleRow {
    id: String,
    patient_id: String,
    scheduled_time: String,
    call_type: String,
    status: String,
    created_at: String,
}

fn schedule_row_from_rusqlite(row: &rusqlite::Row<'_>) -> Result<ScheduleRow, rusqlite::Error> {
    Ok(ScheduleRow {
        id: row.get(0)?,
        patient_id: row.get(1)?,
        scheduled_time: row.get(2)?,
        call_type: row.get(3)?,
        status: row.get(4)?,
        created_at: row.get(5)?,
    })
}

fn schedule_from_row(row: ScheduleRow) -> Result<CallSchedule, DatabaseError> {
    Ok(CallSchedule {
        id: parse_uuid(&row.id)?,
        patient_id: parse_uuid(&row.patient_id)?,
        scheduled_time: parse_datetime(&row.scheduled_time)?,
        call_type: CallType::from_str(&row.call_type)?,
        status: CallStatus::from_str(&row.status)?,
        created_at: parse_datetime(&row.created_at)?,
    })
}
