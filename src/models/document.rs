use serde::{Deserialize, Serialize};

use super::enums::UploaderRole;

/// Stored metadata for an uploaded appointment document. The payload
/// itself lives on the filesystem at `storage_path`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub appointment_id: String,
    pub title: String,
    pub file_name: String,
    pub size_bytes: u64,
    pub mime_type: String,
    pub storage_path: String,
    pub uploader_role: UploaderRole,
    pub uploaded_at: String,
}

/// Document list entry with the size pre-formatted for display.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentView {
    pub id: String,
    pub title: String,
    pub file_name: String,
    pub size_bytes: u64,
    pub size_display: String,
    pub mime_type: String,
    pub uploader_role: UploaderRole,
    pub uploaded_at: String,
}
