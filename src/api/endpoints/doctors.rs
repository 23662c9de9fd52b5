//! Doctor directory endpoints.

use axum::extract::{Path, Query, State};
use axum::Json;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::db::repository::doctor;
use crate::models::{Doctor, DoctorFilter, NewDoctor};

/// `GET /api/doctors?name=&specialty=`
pub async fn list(
    State(ctx): State<ApiContext>,
    Query(filter): Query<DoctorFilter>,
) -> Result<Json<Vec<Doctor>>, ApiError> {
    let conn = ctx.core.open_db()?;
    Ok(Json(doctor::search_doctors(&conn, &filter)?))
}

/// `GET /api/doctors/:id`
pub async fn detail(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> Result<Json<Doctor>, ApiError> {
    let conn = ctx.core.open_db()?;
    Ok(Json(doctor::get_doctor(&conn, &id)?))
}

/// `POST /api/doctors`
pub async fn create(
    State(ctx): State<ApiContext>,
    Json(new): Json<NewDoctor>,
) -> Result<Json<Doctor>, ApiError> {
    if new.full_name.trim().is_empty() {
        return Err(ApiError::BadRequest("El nombre es obligatorio".into()));
    }
    if new.specialty.trim().is_empty() {
        return Err(ApiError::BadRequest("La especialidad es obligatoria".into()));
    }
    if new.license_number.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "La cédula profesional es obligatoria".into(),
        ));
    }

    let conn = ctx.core.open_db()?;
    Ok(Json(doctor::create_doctor(&conn, &new)?))
}
