//! Appointment booking and lifecycle endpoints.

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::db::repository::appointment;
use crate::models::{
    Appointment, AppointmentFilter, AppointmentStatus, AppointmentView, NewAppointment,
};

/// `POST /api/appointments` — booked appointments always start pending.
pub async fn create(
    State(ctx): State<ApiContext>,
    Json(new): Json<NewAppointment>,
) -> Result<Json<Appointment>, ApiError> {
    if !is_valid_time(&new.time) {
        return Err(ApiError::BadRequest(
            "La hora debe tener el formato HH:MM".into(),
        ));
    }

    let conn = ctx.core.open_db()?;
    Ok(Json(appointment::create_appointment(&conn, &new)?))
}

/// `GET /api/appointments?patient_id=&doctor_id=&status=`
pub async fn list(
    State(ctx): State<ApiContext>,
    Query(filter): Query<AppointmentFilter>,
) -> Result<Json<Vec<AppointmentView>>, ApiError> {
    let conn = ctx.core.open_db()?;
    Ok(Json(appointment::list_appointments(&conn, &filter)?))
}

/// `GET /api/appointments/:id`
pub async fn detail(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> Result<Json<Appointment>, ApiError> {
    let conn = ctx.core.open_db()?;
    Ok(Json(appointment::get_appointment(&conn, &id)?))
}

#[derive(Deserialize)]
pub struct StatusUpdateRequest {
    pub status: AppointmentStatus,
}

/// `PATCH /api/appointments/:id/status` — validated lifecycle transition.
pub async fn update_status(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
    Json(req): Json<StatusUpdateRequest>,
) -> Result<Json<Appointment>, ApiError> {
    let conn = ctx.core.open_db()?;
    Ok(Json(appointment::update_status(&conn, &id, req.status)?))
}

fn is_valid_time(time: &str) -> bool {
    let Some((h, m)) = time.split_once(':') else {
        return false;
    };
    let hours: Option<u8> = h.parse().ok();
    let minutes: Option<u8> = m.parse().ok();
    matches!((h.len(), m.len()), (2, 2))
        && hours.is_some_and(|v| v < 24)
        && minutes.is_some_and(|v| v < 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn time_format_validation() {
        assert!(is_valid_time("09:30"));
        assert!(is_valid_time("23:59"));
        assert!(!is_valid_time("9:30"));
        assert!(!is_valid_time("24:00"));
        assert!(!is_valid_time("09:60"));
        assert!(!is_valid_time("0930"));
    }
}
