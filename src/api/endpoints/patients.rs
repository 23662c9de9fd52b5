//! Patient profile endpoints.

use axum::extract::{Path, State};
use axum::Json;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::db::repository::patient;
use crate::models::{NewPatient, Patient, PatientUpdate};

/// `POST /api/patients`
pub async fn create(
    State(ctx): State<ApiContext>,
    Json(new): Json<NewPatient>,
) -> Result<Json<Patient>, ApiError> {
    if new.full_name.trim().is_empty() {
        return Err(ApiError::BadRequest("El nombre es obligatorio".into()));
    }
    if new.email.trim().is_empty() || !new.email.contains('@') {
        return Err(ApiError::BadRequest(
            "El correo electrónico no es válido".into(),
        ));
    }

    let conn = ctx.core.open_db()?;
    let created = patient::create_patient(&conn, &new)?;
    Ok(Json(created))
}

/// `GET /api/patients/:id`
pub async fn detail(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> Result<Json<Patient>, ApiError> {
    let conn = ctx.core.open_db()?;
    Ok(Json(patient::get_patient(&conn, &id)?))
}

/// `PUT /api/patients/:id` — partial update, completeness recomputed.
pub async fn update(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
    Json(update): Json<PatientUpdate>,
) -> Result<Json<Patient>, ApiError> {
    if let Some(email) = &update.email {
        if email.trim().is_empty() || !email.contains('@') {
            return Err(ApiError::BadRequest(
                "El correo electrónico no es válido".into(),
            ));
        }
    }

    let conn = ctx.core.open_db()?;
    let updated = patient::update_patient(&conn, &id, &update)?;
    Ok(Json(updated))
}
