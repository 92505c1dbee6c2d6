use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use super::{format_datetime, parse_datetime, parse_uuid};
use crate::db::DatabaseError;
use crate::models::*;

pub fn insert_patient(conn: &Connection, patient: &Patient) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO patients (id, name, age, sex, height_cm, weight_kg, phone, diagnosis,
         doctor_name, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            patient.id.to_string(),
            patient.name,
            patient.age,
            patient.sex,
            patient.height_cm,
            patient.weight_kg,
            patient.phone,
            patient.diagnosis,
            patient.doctor_name,
            format_datetime(&patient.created_at),
        ],
    )?;
    Ok(())
}

/// Insert a patient and their prescriptions in one transaction.
pub fn insert_patient_with_medications(
    conn: &Connection,
    patient: &Patient,
    medications: &[Medication],
) -> Result<(), DatabaseError> {
    let tx = conn.unchecked_transaction()?;
    insert_patient(&tx, patient)?;
    for med in medications {
        super::insert_medication(&tx, med)?;
    }
    tx.commit()?;
    Ok(())
}

pub fn get_patient(conn: &Connection, id: &Uuid) -> Result<Option<Patient>, DatabaseError> {
    let row = conn
        .query_row(
            "SELECT id, name, age, sex, height_cm, weight_kg, phone, diagnosis, doctor_name,
             created_at
             FROM patients WHERE id = ?1",
            params![id.to_string()],
            patient_row_from_rusqlite,
        )
        .optional()?;

    row.map(patient_from_row).transpose()
}

/// All patients, most recently registered first.
pub fn list_patients(conn: &Connection) -> Result<Vec<Patient>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, name, age, sex, height_cm, weight_kg, phone, diagnosis, doctor_name,
         created_at
         FROM patients ORDER BY created_at DESC",
    )?;

    let rows = stmt.query_map([], patient_row_from_rusqlite)?;

    let mut patients = Vec::new();
    for row in rows {
        patients.push(patient_from_row(row?)?);
    }
    Ok(patients)
}

/// Delete a patient; medications, schedules and logs go with it (ON DELETE CASCADE).
/// Returns false when no such patient existed.
pub fn delete_patient(conn: &Connection, id: &Uuid) -> Result<bool, DatabaseError> {
    let affected = conn.execute("DELETE FROM patients WHERE id = ?1", params![id.to_string()])?;
    Ok(affected > 0)
}

struct PatientRow {
    id: String,
    name: String,
    age: u32,
    sex: String,
    height_cm: f64,
    weight_kg: f64,
    phone: String,
    diagnosis: String,
    doctor_name: String,
    created_at: String,
}

fn patient_row_from_rusqlite(row: &rusqlite::Row<'_>) -> Result<PatientRow, rusqlite::Error> {
    Ok(PatientRow {
        id: row.get(0)?,
        name: row.get(1)?,
        age: row.get(2)?,
        sex: row.get(3)?,
        height_cm: row.get(4)?,
        weight_kg: row.get(5)?,
        phone: row.get(6)?,
        diagnosis: row.get(7)?,
        doctor_name: row.get(8)?,
        created_at: row.get(9)?,
    })
}

fn patient_from_row(row: PatientRow) -> Result<Patient, DatabaseError> {
    Ok(Patient {
        id: parse_uuid(&row.id)?,
        name: row.name,
        age: row.age,
        sex: row.sex,
        height_cm: row.height_cm,
        weight_kg: row.weight_kg,
        phone: row.phone,
        diagnosis: row.diagnosis,
        doctor_name: row.doctor_name,
        created_at: parse_datetime(&row.created_at)?,
    })
}
