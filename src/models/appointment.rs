use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::enums::AppointmentStatus;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: String,
    pub patient_id: String,
    pub doctor_id: String,
    pub date: NaiveDate,
    /// HH:MM, 24-hour.
    pub time: String,
    pub status: AppointmentStatus,
    pub reason: Option<String>,
    pub notes: Option<String>,
    pub created_at: String,
}

/// Appointment row joined with display names, for list views.
#[derive(Debug, Clone, Serialize)]
pub struct AppointmentView {
    pub id: String,
    pub patient_id: String,
    pub patient_name: String,
    pub doctor_id: String,
    pub doctor_name: String,
    pub doctor_specialty: String,
    pub date: NaiveDate,
    pub time: String,
    pub status: AppointmentStatus,
    pub status_label: &'static str,
    pub status_color: &'static str,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewAppointment {
    pub patient_id: String,
    pub doctor_id: String,
    pub date: NaiveDate,
    pub time: String,
    pub reason: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppointmentFilter {
    pub patient_id: Option<String>,
    pub doctor_id: Option<String>,
    pub status: Option<AppointmentStatus>,
}
