use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Medication {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub name: String,
    pub dosage: String,
    /// Free text such as "twice daily"; interpreted by the frequency classifier.
    pub frequency: String,
    pub duration_days: u32,
    pub instructions: Option<String>,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewMedication {
    pub name: String,
    pub dosage: String,
    pub frequency: String,
    pub duration_days: u32,
    #[serde(default)]
    pub instructions: Option<String>,
}

impl NewMedication {
    pub fn into_medication(self, patient_id: Uuid, created_at: NaiveDateTime) -> Medication {
        Medication {
            id: Uuid::new_v4(),
            patient_id,
            name: self.name,
            dosage: self.dosage,
            frequency: self.frequency,
            duration_days: self.duration_days,
            instructions: self.instructions.filter(|s| !s.trim().is_empty()),
            created_at,
        }
    }
}
