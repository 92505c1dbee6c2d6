use rusqlite::{params, Connection};
use uuid::Uuid;

use super::{format_datetime, parse_datetime, parse_uuid};
use crate::db::DatabaseError;
use crate::models::*;

pub fn insert_medication(conn: &Connection, med: &Medication) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO medications (id, patient_id, name, dosage, frequency, duration_days,
         instructions, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            med.id.to_string(),
            med.patient_id.to_string(),
            med.name,
            med.dosage,
            med.frequency,
            med.duration_days,
            med.instructions,
            format_datetime(&med.created_at),
        ],
    )?;
    Ok(())
}

/// Medications of one patient, in the order they were prescribed.
pub fn get_medications_for_patient(
    conn: &Connection,
    patient_id: &Uuid,
) -> Result<Vec<Medication>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, patient_id, name, dosage, frequency, duration_days, instructions, created_at
         FROM medications WHERE patient_id = ?1
         ORDER BY created_at ASC, rowid ASC",
    )?;

    let rows = stmt.query_map(params![patient_id.to_string()], |row| {
        Ok(MedicationRow {
            id: row.get(0)?,
            patient_id: row.get(1)?,
            name: row.get(2)?,
            dosage: row.get(3)?,
            frequency: row.get(4)?,
            duration_days: row.get(5)?,
            instructions: row.get(6)?,
            created_at: row.get(7)?,
        })
    })?;

    let mut meds = Vec::new();
    for row in rows {
        meds.push(medication_from_row(row?)?);
    }
    Ok(meds)
}

// Internal row type for Medication mapping
struct MedicationRow {
    id: String,
    patient_id: String,
    name: String,
    dosage: String,
    frequency: String,
    duration_days: u32,
    instructions: Option<String>,
    created_at: String,
}

fn medication_from_row(row: MedicationRow) -> Result<Medication, DatabaseError> {
    Ok(Medication {
        id: parse_uuid(&row.id)?,
        patient_id: parse_uuid(&row.patient_id)?,
        name: row.name,
        dosage: row.dosage,
        frequency: row.frequency,
        duration_days: row.duration_days,
        instructions: row.instructions,
        created_at: parse_datetime(&row.created_at)?,
    })
}
