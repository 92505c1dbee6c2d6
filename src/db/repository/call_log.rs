use rusqlite::{params, Connection};
use uuid::Uuid;

use super::{format_datetime, parse_datetime, parse_uuid};
use crate::db::DatabaseError;
use crate::models::*;

pub fn insert_call_log(conn: &Connection, log: &CallLog) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO call_logs (id, patient_id, schedule_id, call_time, answered, duration_secs,
         notes, flagged, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            log.id.to_string(),
            log.patient_id.to_string(),
            log.schedule_id.map(|id| id.to_string()),
            format_datetime(&log.call_time),
            log.answered as i32,
            log.duration_secs,
            log.notes,
            log.flagged as i32,
            format_datetime(&log.created_at),
        ],
    )?;
    Ok(())
}

/// Store a call log and move its event to `status` together.
///
/// `schedule_id` names the event to update; an unknown id rolls the log back.
pub fn record_call(
    conn: &Connection,
    log: &CallLog,
    schedule_id: &Uuid,
    status: CallStatus,
) -> Result<(), DatabaseError> {
    let tx = conn.unchecked_transaction()?;
    insert_call_log(&tx, log)?;
    super::update_schedule_status(&tx, schedule_id, status)?;
    tx.commit()?;
    Ok(())
}

/// Call history of one patient, most recent call first.
pub fn get_call_logs_for_patient(
    conn: &Connection,
    patient_id: &Uuid,
) -> Result<Vec<CallLog>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, patient_id, schedule_id, call_time, answered, duration_secs, notes, flagged,
         created_at
         FROM call_logs WHERE patient_id = ?1
         ORDER BY call_time DESC, rowid DESC",
    )?;

    let rows = stmt.query_map(params![patient_id.to_string()], call_log_row_from_rusqlite)?;

    let mut logs = Vec::new();
    for row in rows {
        logs.push(call_log_from_row(row?)?);
    }
    Ok(logs)
}

/// Flagged calls across all patients, most recent first.
pub fn get_flagged_call_logs(conn: &Connection) -> Result<Vec<CallLogWithPatient>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT l.id, l.patient_id, l.schedule_id, l.call_time, l.answered, l.duration_secs,
         l.notes, l.flagged, l.created_at, p.name
         FROM call_logs l
         JOIN patients p ON p.id = l.patient_id
         WHERE l.flagged = 1
         ORDER BY l.call_time DESC, l.rowid DESC",
    )?;

    let rows = stmt.query_map([], |row| {
        Ok((call_log_row_from_rusqlite(row)?, row.get::<_, String>(9)?))
    })?;

    let mut logs = Vec::new();
    for row in rows {
        let (log_row, patient_name) = row?;
        logs.push(CallLogWithPatient {
            log: call_log_from_row(log_row)?,
            patient_name,
        });
    }
    Ok(logs)
}

struct CallLogRow {
    id: String,
    patient_id: String,
    schedule_id: Option<String>,
    call_time: String,
    answered: i32,
    duration_secs: u32,
    notes: String,
    flagged: i32,
    created_at: String,
}

fn call_log_row_from_rusqlite(row: &rusqlite::Row<'_>) -> Result<CallLogRow, rusqlite::Error> {
    Ok(CallLogRow {
        id: row.get(0)?,
        patient_id: row.get(1)?,
        schedule_id: row.get(2)?,
        call_time: row.get(3)?,
        answered: row.get(4)?,
        duration_secs: row.get(5)?,
        notes: row.get(6)?,
        flagged: row.get(7)?,
        created_at: row.get(8)?,
    })
}

fn call_log_from_row(row: CallLogRow) -> Result<CallLog, DatabaseError> {
    Ok(CallLog {
        id: parse_uuid(&row.id)?,
        patient_id: parse_uuid(&row.patient_id)?,
        schedule_id: row.schedule_id.as_deref().map(parse_uuid).transpose()?,
        call_time: parse_datetime(&row.call_time)?,
        answered: row.answered != 0,
        duration_secs: row.duration_secs,
        notes: row.notes,
        flagged: row.flagged != 0,
        created_at: parse_datetime(&row.created_at)?,
    })
}
