use rusqlite::{params, Connection, Row};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::{Doctor, DoctorFilter, NewDoctor};

fn doctor_from_row(row: &Row) -> rusqlite::Result<Doctor> {
    Ok(Doctor {
        id: row.get(0)?,
        full_name: row.get(1)?,
        specialty: row.get(2)?,
        license_number: row.get(3)?,
        clinic_address: row.get(4)?,
        clinic_phone: row.get(5)?,
        signature_url: row.get(6)?,
        stamp_url: row.get(7)?,
        created_at: row.get(8)?,
    })
}

const DOCTOR_COLUMNS: &str = "id, full_name, specialty, license_number, \
     clinic_address, clinic_phone, signature_url, stamp_url, created_at";

pub fn create_doctor(conn: &Connection, new: &NewDoctor) -> Result<Doctor, DatabaseError> {
    let id = Uuid::new_v4().to_string();
    conn.execute(
        "INSERT INTO doctors (id, full_name, specialty, license_number,
             clinic_address, clinic_phone, signature_url, stamp_url)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            id,
            new.full_name,
            new.specialty,
            new.license_number,
            new.clinic_address,
            new.clinic_phone,
            new.signature_url,
            new.stamp_url,
        ],
    )?;
    get_doctor(conn, &id)
}

pub fn get_doctor(conn: &Connection, id: &str) -> Result<Doctor, DatabaseError> {
    let sql = format!("SELECT {DOCTOR_COLUMNS} FROM doctors WHERE id = ?1");
    conn.query_row(&sql, params![id], doctor_from_row)
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => DatabaseError::NotFound {
                entity_type: "Doctor".into(),
                id: id.into(),
            },
            other => DatabaseError::from(other),
        })
}

/// Directory search. Name and specialty match case-insensitively anywhere
/// in the field; both filters combine with AND.
pub fn search_doctors(
    conn: &Connection,
    filter: &DoctorFilter,
) -> Result<Vec<Doctor>, DatabaseError> {
    let sql = format!(
        "SELECT {DOCTOR_COLUMNS} FROM doctors
         WHERE (?1 IS NULL OR full_name LIKE '%' || ?1 || '%')
           AND (?2 IS NULL OR specialty LIKE '%' || ?2 || '%')
         ORDER BY full_name ASC"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![filter.name, filter.specialty], doctor_from_row)?;
    rows.collect::<Result<Vec<_>, _>>()
        .map_err(DatabaseError::from)
}
