use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Placeholder substituted for every missing optional field at render time.
pub const PLACEHOLDER: &str = "No especificado";

/// Stored prescription. Doctor/patient fields are snapshots taken at
/// creation; the record is immutable afterwards except for deletion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prescription {
    pub id: String,
    pub doctor_id: String,
    pub patient_id: String,
    pub doctor_name: String,
    pub doctor_specialty: Option<String>,
    pub doctor_license: Option<String>,
    pub doctor_clinic: Option<String>,
    pub patient_name: String,
    pub patient_age: Option<u32>,
    pub medications: Vec<MedicationEntry>,
    pub diagnosis: Option<String>,
    pub notes: Option<String>,
    pub signature_url: Option<String>,
    pub stamp_url: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MedicationEntry {
    pub name: String,
    pub dosage: String,
    pub frequency: String,
    pub duration: Option<String>,
    pub instructions: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewPrescription {
    pub doctor_id: String,
    pub patient_id: String,
    pub medications: Vec<MedicationEntry>,
    pub diagnosis: Option<String>,
    pub notes: Option<String>,
}

/// Input to the layout routine. Built in exactly one place
/// (`Prescription::to_record`) so field defaulting is centralized
/// instead of scattered across call sites.
#[derive(Debug, Clone)]
pub struct PrescriptionRecord {
    pub folio: String,
    pub doctor_name: String,
    pub doctor_specialty: Option<String>,
    pub doctor_license: Option<String>,
    pub doctor_clinic: Option<String>,
    pub patient_name: String,
    pub patient_age: Option<u32>,
    pub medications: Vec<MedicationEntry>,
    pub diagnosis: Option<String>,
    pub notes: Option<String>,
    pub signature_url: Option<String>,
    pub stamp_url: Option<String>,
    pub issued_on: NaiveDate,
}

impl Prescription {
    /// Project the stored prescription into the layout input. The layout
    /// routine itself substitutes [`PLACEHOLDER`] for any `None` it meets.
    pub fn to_record(&self) -> PrescriptionRecord {
        let issued_on = self
            .created_at
            .get(..10)
            .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
            .unwrap_or_else(|| chrono::Local::now().date_naive());

        PrescriptionRecord {
            folio: self.id.clone(),
            doctor_name: self.doctor_name.clone(),
            doctor_specialty: self.doctor_specialty.clone(),
            doctor_license: self.doctor_license.clone(),
            doctor_clinic: self.doctor_clinic.clone(),
            patient_name: self.patient_name.clone(),
            patient_age: self.patient_age,
            medications: self.medications.clone(),
            diagnosis: self.diagnosis.clone(),
            notes: self.notes.clone(),
            signature_url: self.signature_url.clone(),
            stamp_url: self.stamp_url.clone(),
            issued_on,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn to_record_takes_issue_date_from_created_at() {
        let rx = Prescription {
            id: "rx-1".into(),
            doctor_id: "d-1".into(),
            patient_id: "p-1".into(),
            doctor_name: "Dra. Ruiz".into(),
            doctor_specialty: None,
            doctor_license: None,
            doctor_clinic: None,
            patient_name: "Ana García".into(),
            patient_age: Some(35),
            medications: vec![],
            diagnosis: None,
            notes: None,
            signature_url: None,
            stamp_url: None,
            created_at: "2026-08-26 10:00:00".into(),
        };
        let record = rx.to_record();
        assert_eq!(record.folio, "rx-1");
        assert_eq!(
            record.issued_on,
            NaiveDate::from_ymd_opt(2026, 8, 26).unwrap()
        );
    }
}
