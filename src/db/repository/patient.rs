use chrono::NaiveDate;
use rusqlite::{params, Connection, Row};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::{NewPatient, Patient, PatientUpdate};

fn patient_from_row(row: &Row) -> rusqlite::Result<Patient> {
    Ok(Patient {
        id: row.get(0)?,
        full_name: row.get(1)?,
        email: row.get(2)?,
        phone: row.get(3)?,
        birth_date: row
            .get::<_, Option<String>>(4)?
            .and_then(|d| NaiveDate::parse_from_str(&d, "%Y-%m-%d").ok()),
        emergency_contact_name: row.get(5)?,
        emergency_contact_phone: row.get(6)?,
        insurance_provider: row.get(7)?,
        insurance_policy_number: row.get(8)?,
        profile_complete: row.get(9)?,
        created_at: row.get(10)?,
    })
}

const PATIENT_COLUMNS: &str = "id, full_name, email, phone, birth_date, \
     emergency_contact_name, emergency_contact_phone, \
     insurance_provider, insurance_policy_number, profile_complete, created_at";

pub fn create_patient(conn: &Connection, new: &NewPatient) -> Result<Patient, DatabaseError> {
    let id = Uuid::new_v4().to_string();
    conn.execute(
        "INSERT INTO patients (id, full_name, email, phone, birth_date,
             emergency_contact_name, emergency_contact_phone,
             insurance_provider, insurance_policy_number, profile_complete)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, 0)",
        params![
            id,
            new.full_name,
            new.email,
            new.phone,
            new.birth_date.map(|d| d.to_string()),
            new.emergency_contact_name,
            new.emergency_contact_phone,
            new.insurance_provider,
            new.insurance_policy_number,
        ],
    )?;
    refresh_completeness(conn, &id)?;
    get_patient(conn, &id)
}

pub fn get_patient(conn: &Connection, id: &str) -> Result<Patient, DatabaseError> {
    let sql = format!("SELECT {PATIENT_COLUMNS} FROM patients WHERE id = ?1");
    conn.query_row(&sql, params![id], patient_from_row)
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => DatabaseError::NotFound {
                entity_type: "Patient".into(),
                id: id.into(),
            },
            other => DatabaseError::from(other),
        })
}

/// Apply a partial update, then recompute the completeness flag.
pub fn update_patient(
    conn: &Connection,
    id: &str,
    update: &PatientUpdate,
) -> Result<Patient, DatabaseError> {
    let current = get_patient(conn, id)?;

    let merged = Patient {
        full_name: update.full_name.clone().unwrap_or(current.full_name),
        email: update.email.clone().unwrap_or(current.email),
        phone: update.phone.clone().or(current.phone),
        birth_date: update.birth_date.or(current.birth_date),
        emergency_contact_name: update
            .emergency_contact_name
            .clone()
            .or(current.emergency_contact_name),
        emergency_contact_phone: update
            .emergency_contact_phone
            .clone()
            .or(current.emergency_contact_phone),
        insurance_provider: update
            .insurance_provider
            .clone()
            .or(current.insurance_provider),
        insurance_policy_number: update
            .insurance_policy_number
            .clone()
            .or(current.insurance_policy_number),
        ..current
    };

    conn.execute(
        "UPDATE patients SET full_name = ?1, email = ?2, phone = ?3, birth_date = ?4,
             emergency_contact_name = ?5, emergency_contact_phone = ?6,
             insurance_provider = ?7, insurance_policy_number = ?8
         WHERE id = ?9",
        params![
            merged.full_name,
            merged.email,
            merged.phone,
            merged.birth_date.map(|d| d.to_string()),
            merged.emergency_contact_name,
            merged.emergency_contact_phone,
            merged.insurance_provider,
            merged.insurance_policy_number,
            id,
        ],
    )?;
    refresh_completeness(conn, id)?;
    get_patient(conn, id)
}

fn refresh_completeness(conn: &Connection, id: &str) -> Result<(), DatabaseError> {
    let patient = get_patient(conn, id)?;
    conn.execute(
        "UPDATE patients SET profile_complete = ?1 WHERE id = ?2",
        params![patient.compute_complete(), id],
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::sqlite::open_memory_database;

    fn minimal_patient() -> NewPatient {
        NewPatient {
            full_name: "Ana García".into(),
            email: "ana@example.com".into(),
            phone: None,
            birth_date: None,
            emergency_contact_name: None,
            emergency_contact_phone: None,
            insurance_provider: None,
            insurance_policy_number: None,
        }
    }

    #[test]
    fn create_and_get() {
        let conn = open_memory_database().unwrap();
        let created = create_patient(&conn, &minimal_patient()).unwrap();
        assert!(!created.id.is_empty());
        assert!(!created.profile_complete);

        let fetched = get_patient(&conn, &created.id).unwrap();
        assert_eq!(fetched.full_name, "Ana García");
    }

    #[test]
    fn get_missing_returns_not_found() {
        let conn = open_memory_database().unwrap();
        let err = get_patient(&conn, "nope").unwrap_err();
        assert!(matches!(err, DatabaseError::NotFound { .. }));
    }

    #[test]
    fn update_fills_fields_and_flips_completeness() {
        let conn = open_memory_database().unwrap();
        let created = create_patient(&conn, &minimal_patient()).unwrap();

        let update = PatientUpdate {
            phone: Some("5551234".into()),
            birth_date: NaiveDate::from_ymd_opt(1991, 2, 3),
            emergency_contact_name: Some("Luis".into()),
            emergency_contact_phone: Some("5554321".into()),
            insurance_provider: Some("AXA".into()),
            insurance_policy_number: Some("POL-1".into()),
            ..Default::default()
        };
        let updated = update_patient(&conn, &created.id, &update).unwrap();
        assert!(updated.profile_complete);
        assert_eq!(updated.phone.as_deref(), Some("5551234"));
        // Untouched field kept
        assert_eq!(updated.email, "ana@example.com");
    }
}
