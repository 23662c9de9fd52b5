use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Patient profile. `profile_complete` is derived, never set by clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Patient {
    pub id: String,
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub emergency_contact_name: Option<String>,
    pub emergency_contact_phone: Option<String>,
    pub insurance_provider: Option<String>,
    pub insurance_policy_number: Option<String>,
    pub profile_complete: bool,
    pub created_at: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewPatient {
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub emergency_contact_name: Option<String>,
    pub emergency_contact_phone: Option<String>,
    pub insurance_provider: Option<String>,
    pub insurance_policy_number: Option<String>,
}

/// Partial update; `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PatientUpdate {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub emergency_contact_name: Option<String>,
    pub emergency_contact_phone: Option<String>,
    pub insurance_provider: Option<String>,
    pub insurance_policy_number: Option<String>,
}

impl Patient {
    /// Completeness is recomputed in one place after every write.
    pub fn compute_complete(&self) -> bool {
        let filled = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.trim().is_empty());
        !self.full_name.trim().is_empty()
            && !self.email.trim().is_empty()
            && filled(&self.phone)
            && self.birth_date.is_some()
            && filled(&self.emergency_contact_name)
            && filled(&self.emergency_contact_phone)
            && filled(&self.insurance_provider)
            && filled(&self.insurance_policy_number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_patient() -> Patient {
        Patient {
            id: "p-1".into(),
            full_name: "Ana García".into(),
            email: "ana@example.com".into(),
            phone: Some("5551234".into()),
            birth_date: NaiveDate::from_ymd_opt(1990, 4, 12),
            emergency_contact_name: Some("Luis García".into()),
            emergency_contact_phone: Some("5554321".into()),
            insurance_provider: Some("AXA".into()),
            insurance_policy_number: Some("POL-99".into()),
            profile_complete: false,
            created_at: "2026-01-01".into(),
        }
    }

    #[test]
    fn complete_when_all_fields_filled() {
        assert!(full_patient().compute_complete());
    }

    #[test]
    fn incomplete_without_insurance() {
        let mut p = full_patient();
        p.insurance_policy_number = None;
        assert!(!p.compute_complete());
    }

    #[test]
    fn whitespace_only_field_counts_as_missing() {
        let mut p = full_patient();
        p.emergency_contact_name = Some("   ".into());
        assert!(!p.compute_complete());
    }
}
