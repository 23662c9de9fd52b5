use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Doctor {
    pub id: String,
    pub full_name: String,
    pub specialty: String,
    pub license_number: String,
    pub clinic_address: Option<String>,
    pub clinic_phone: Option<String>,
    pub signature_url: Option<String>,
    pub stamp_url: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewDoctor {
    pub full_name: String,
    pub specialty: String,
    pub license_number: String,
    pub clinic_address: Option<String>,
    pub clinic_phone: Option<String>,
    pub signature_url: Option<String>,
    pub stamp_url: Option<String>,
}

/// Directory search filter; all fields optional, matched with LIKE.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DoctorFilter {
    pub name: Option<String>,
    pub specialty: Option<String>,
}
