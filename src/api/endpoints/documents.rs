//! Appointment document upload and retrieval.
//!
//! Uploads arrive as JSON with the payload in a base64 data URL. Size and
//! MIME constraints are enforced here regardless of what the client
//! already checked.

use axum::extract::{Path, Query, State};
use axum::Json;
use base64::Engine;
use serde::Deserialize;
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::config::{ALLOWED_MIME_TYPES, MAX_UPLOAD_BYTES};
use crate::db::repository::{appointment, document};
use crate::models::{Document, DocumentView, UploaderRole};

#[derive(Deserialize)]
pub struct UploadRequest {
    pub appointment_id: String,
    pub title: String,
    pub file_name: String,
    pub uploader_role: UploaderRole,
    /// `data:<mime>;base64,<payload>`
    pub data_url: String,
}

/// Split a data URL into its declared MIME type and decoded bytes.
fn parse_data_url(data_url: &str) -> Result<(String, Vec<u8>), ApiError> {
    let rest = data_url
        .strip_prefix("data:")
        .ok_or_else(|| ApiError::BadRequest("El archivo debe enviarse como data URL".into()))?;
    let (mime, payload) = rest
        .split_once(";base64,")
        .ok_or_else(|| ApiError::BadRequest("El data URL debe estar codificado en base64".into()))?;

    let bytes = base64::engine::general_purpose::STANDARD
        .decode(payload)
        .map_err(|_| ApiError::BadRequest("El contenido base64 no es válido".into()))?;
    Ok((mime.to_string(), bytes))
}

/// `POST /api/documents`
pub async fn upload(
    State(ctx): State<ApiContext>,
    Json(req): Json<UploadRequest>,
) -> Result<Json<Document>, ApiError> {
    if req.title.trim().is_empty() {
        return Err(ApiError::BadRequest("El título es obligatorio".into()));
    }

    let (mut mime, bytes) = parse_data_url(&req.data_url)?;
    // Browsers send octet-stream for types they do not recognize; fall
    // back to the file extension before rejecting.
    if mime == "application/octet-stream" {
        if let Some(guessed) = mime_guess::from_path(&req.file_name).first_raw() {
            mime = guessed.to_string();
        }
    }
    if !ALLOWED_MIME_TYPES.contains(&mime.as_str()) {
        return Err(ApiError::UnsupportedMediaType(mime));
    }
    if bytes.len() > MAX_UPLOAD_BYTES {
        return Err(ApiError::PayloadTooLarge);
    }

    let conn = ctx.core.open_db()?;
    // Reject uploads against unknown appointments before touching disk.
    appointment::get_appointment(&conn, &req.appointment_id)?;

    let id = Uuid::new_v4().to_string();
    let extension = std::path::Path::new(&req.file_name)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("bin");
    let storage_path = ctx.core.documents_dir().join(format!("{id}.{extension}"));
    tokio::fs::write(&storage_path, &bytes)
        .await
        .map_err(|e| ApiError::Internal(format!("document write failed: {e}")))?;

    let doc = Document {
        id,
        appointment_id: req.appointment_id,
        title: req.title,
        file_name: req.file_name,
        size_bytes: bytes.len() as u64,
        mime_type: mime,
        storage_path: storage_path.to_string_lossy().into_owned(),
        uploader_role: req.uploader_role,
        uploaded_at: String::new(),
    };
    document::insert_document(&conn, &doc)?;
    let stored = document::get_document(&conn, &doc.id)?;
    Ok(Json(stored))
}

#[derive(Deserialize)]
pub struct DocumentListQuery {
    pub appointment_id: String,
}

/// `GET /api/documents?appointment_id=`
pub async fn list(
    State(ctx): State<ApiContext>,
    Query(query): Query<DocumentListQuery>,
) -> Result<Json<Vec<DocumentView>>, ApiError> {
    let conn = ctx.core.open_db()?;
    Ok(Json(document::list_by_appointment(
        &conn,
        &query.appointment_id,
    )?))
}

/// `DELETE /api/documents/:id` — removes the row, then the payload file.
pub async fn delete(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let storage_path = {
        let conn = ctx.core.open_db()?;
        document::delete_document(&conn, &id)?
    };
    if let Err(e) = tokio::fs::remove_file(&storage_path).await {
        // Metadata is already gone; an orphaned file is only worth a log line.
        tracing::warn!(path = %storage_path, error = %e, "document payload removal failed");
    }
    Ok(Json(serde_json::json!({ "deleted": id })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_url_parses_mime_and_bytes() {
        let (mime, bytes) = parse_data_url("data:application/pdf;base64,JVBERg==").unwrap();
        assert_eq!(mime, "application/pdf");
        assert_eq!(bytes, b"%PDF");
    }

    #[test]
    fn data_url_without_prefix_rejected() {
        assert!(matches!(
            parse_data_url("application/pdf;base64,AAAA"),
            Err(ApiError::BadRequest(_))
        ));
    }

    #[test]
    fn data_url_with_bad_base64_rejected() {
        assert!(matches!(
            parse_data_url("data:image/png;base64,%%%"),
            Err(ApiError::BadRequest(_))
        ));
    }
}
