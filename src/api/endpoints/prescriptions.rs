//! Prescription CRUD plus the PDF download endpoint.

use axum::extract::{Path, Query, State};
use axum::http::header;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::db::repository::prescription;
use crate::models::{NewPrescription, Prescription};
use crate::prescription::generate_prescription_pdf;

/// `POST /api/prescriptions`
pub async fn create(
    State(ctx): State<ApiContext>,
    Json(new): Json<NewPrescription>,
) -> Result<Json<Prescription>, ApiError> {
    if new.medications.iter().any(|m| {
        m.name.trim().is_empty() || m.dosage.trim().is_empty() || m.frequency.trim().is_empty()
    }) {
        return Err(ApiError::BadRequest(
            "Cada medicamento requiere nombre, dosis y frecuencia".into(),
        ));
    }

    let conn = ctx.core.open_db()?;
    Ok(Json(prescription::create_prescription(&conn, &new)?))
}

#[derive(Deserialize, Default)]
pub struct PrescriptionListQuery {
    pub patient_id: Option<String>,
    pub doctor_id: Option<String>,
}

/// `GET /api/prescriptions?patient_id=|doctor_id=`
pub async fn list(
    State(ctx): State<ApiContext>,
    Query(query): Query<PrescriptionListQuery>,
) -> Result<Json<Vec<Prescription>>, ApiError> {
    let conn = ctx.core.open_db()?;
    Ok(Json(prescription::list_prescriptions(
        &conn,
        query.patient_id.as_deref(),
        query.doctor_id.as_deref(),
    )?))
}

/// `GET /api/prescriptions/:id`
pub async fn detail(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> Result<Json<Prescription>, ApiError> {
    let conn = ctx.core.open_db()?;
    Ok(Json(prescription::get_prescription(&conn, &id)?))
}

/// `DELETE /api/prescriptions/:id`
pub async fn delete(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let conn = ctx.core.open_db()?;
    prescription::delete_prescription(&conn, &id)?;
    Ok(Json(serde_json::json!({ "deleted": id })))
}

#[derive(Deserialize, Default)]
pub struct PdfQuery {
    pub disposition: Option<String>,
}

/// `GET /api/prescriptions/:id/pdf?disposition=inline|attachment`
///
/// Defaults to inline viewing; anything else is a download.
pub async fn pdf(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
    Query(query): Query<PdfQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let rx = {
        let conn = ctx.core.open_db()?;
        prescription::get_prescription(&conn, &id)?
    };

    let bytes = generate_prescription_pdf(&ctx.http, &rx).await?;

    let disposition = match query.disposition.as_deref() {
        None | Some("inline") => format!("inline; filename=\"receta-{id}.pdf\""),
        _ => format!("attachment; filename=\"receta-{id}.pdf\""),
    };

    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    ))
}
