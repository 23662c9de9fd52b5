use std::str::FromStr;

use rusqlite::{params, Connection, Row};

use crate::db::DatabaseError;
use crate::models::{Document, DocumentView, UploaderRole};
use crate::prescription::format::format_file_size;

fn document_from_row(row: &Row) -> rusqlite::Result<(Document, String)> {
    let role_raw: String = row.get(7)?;
    Ok((
        Document {
            id: row.get(0)?,
            appointment_id: row.get(1)?,
            title: row.get(2)?,
            file_name: row.get(3)?,
            size_bytes: row.get::<_, i64>(4)? as u64,
            mime_type: row.get(5)?,
            storage_path: row.get(6)?,
            uploader_role: UploaderRole::Patient, // replaced below
            uploaded_at: row.get(8)?,
        },
        role_raw,
    ))
}

const DOC_COLUMNS: &str = "id, appointment_id, title, file_name, size_bytes, \
     mime_type, storage_path, uploader_role, uploaded_at";

pub fn insert_document(conn: &Connection, doc: &Document) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO documents (id, appointment_id, title, file_name, size_bytes,
             mime_type, storage_path, uploader_role)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            doc.id,
            doc.appointment_id,
            doc.title,
            doc.file_name,
            doc.size_bytes as i64,
            doc.mime_type,
            doc.storage_path,
            doc.uploader_role.as_str(),
        ],
    )?;
    Ok(())
}

pub fn get_document(conn: &Connection, id: &str) -> Result<Document, DatabaseError> {
    let sql = format!("SELECT {DOC_COLUMNS} FROM documents WHERE id = ?1");
    let (mut doc, role_raw) = conn
        .query_row(&sql, params![id], document_from_row)
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => DatabaseError::NotFound {
                entity_type: "Document".into(),
                id: id.into(),
            },
            other => DatabaseError::from(other),
        })?;
    doc.uploader_role = UploaderRole::from_str(&role_raw)?;
    Ok(doc)
}

/// Documents attached to one appointment, newest first, with the size
/// pre-formatted for display.
pub fn list_by_appointment(
    conn: &Connection,
    appointment_id: &str,
) -> Result<Vec<DocumentView>, DatabaseError> {
    let sql = format!(
        "SELECT {DOC_COLUMNS} FROM documents
         WHERE appointment_id = ?1
         ORDER BY uploaded_at DESC"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![appointment_id], document_from_row)?;

    let mut views = Vec::new();
    for row in rows {
        let (doc, role_raw) = row?;
        views.push(DocumentView {
            size_display: format_file_size(doc.size_bytes),
            id: doc.id,
            title: doc.title,
            file_name: doc.file_name,
            size_bytes: doc.size_bytes,
            mime_type: doc.mime_type,
            uploader_role: UploaderRole::from_str(&role_raw)?,
            uploaded_at: doc.uploaded_at,
        });
    }
    Ok(views)
}

/// Remove the metadata row. Returns the storage path so the caller can
/// delete the payload file as well.
pub fn delete_document(conn: &Connection, id: &str) -> Result<String, DatabaseError> {
    let doc = get_document(conn, id)?;
    conn.execute("DELETE FROM documents WHERE id = ?1", params![id])?;
    Ok(doc.storage_path)
}
