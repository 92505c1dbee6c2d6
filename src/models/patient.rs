use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::medication::NewMedication;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Patient {
    pub id: Uuid,
    pub name: String,
    pub age: u32,
    pub sex: String,
    pub height_cm: f64,
    pub weight_kg: f64,
    pub phone: String,
    pub diagnosis: String,
    pub doctor_name: String,
    pub created_at: NaiveDateTime,
}

/// Registration input: a patient together with the prescriptions written at intake.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPatient {
    pub name: String,
    pub age: u32,
    pub sex: String,
    pub height_cm: f64,
    pub weight_kg: f64,
    pub phone: String,
    pub diagnosis: String,
    pub doctor_name: String,
    #[serde(default)]
    pub medications: Vec<NewMedication>,
}

impl NewPatient {
    /// Materialize the patient record with a fresh id.
    pub fn into_patient(self, created_at: NaiveDateTime) -> (Patient, Vec<NewMedication>) {
        let patient = Patient {
            id: Uuid::new_v4(),
            name: self.name,
            age: self.age,
            sex: self.sex,
            height_cm: self.height_cm,
            weight_kg: self.weight_kg,
            phone: self.phone,
            diagnosis: self.diagnosis,
            doctor_name: self.doctor_name,
            created_at,
        };
        (patient, self.medications)
    }
}
