use std::str::FromStr;

use chrono::NaiveDate;
use rusqlite::{params, Connection, Row};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::{
    Appointment, AppointmentFilter, AppointmentStatus, AppointmentView, NewAppointment,
};

fn appointment_from_row(row: &Row) -> rusqlite::Result<(Appointment, String)> {
    let status_raw: String = row.get(5)?;
    let date_raw: String = row.get(3)?;
    Ok((
        Appointment {
            id: row.get(0)?,
            patient_id: row.get(1)?,
            doctor_id: row.get(2)?,
            date: NaiveDate::parse_from_str(&date_raw, "%Y-%m-%d").unwrap_or_default(),
            time: row.get(4)?,
            status: AppointmentStatus::Pending, // replaced below
            reason: row.get(6)?,
            notes: row.get(7)?,
            created_at: row.get(8)?,
        },
        status_raw,
    ))
}

fn finish(pair: (Appointment, String)) -> Result<Appointment, DatabaseError> {
    let (mut appt, status_raw) = pair;
    appt.status = AppointmentStatus::from_str(&status_raw)?;
    Ok(appt)
}

const APPT_COLUMNS: &str =
    "id, patient_id, doctor_id, date, time, status, reason, notes, created_at";

pub fn create_appointment(
    conn: &Connection,
    new: &NewAppointment,
) -> Result<Appointment, DatabaseError> {
    // Booking requires both parties to exist; surface a NotFound rather
    // than a bare FK violation.
    super::patient::get_patient(conn, &new.patient_id)?;
    super::doctor::get_doctor(conn, &new.doctor_id)?;

    let id = Uuid::new_v4().to_string();
    conn.execute(
        "INSERT INTO appointments (id, patient_id, doctor_id, date, time, status, reason, notes)
         VALUES (?1, ?2, ?3, ?4, ?5, 'pending', ?6, ?7)",
        params![
            id,
            new.patient_id,
            new.doctor_id,
            new.date.to_string(),
            new.time,
            new.reason,
            new.notes,
        ],
    )?;
    get_appointment(conn, &id)
}

pub fn get_appointment(conn: &Connection, id: &str) -> Result<Appointment, DatabaseError> {
    let sql = format!("SELECT {APPT_COLUMNS} FROM appointments WHERE id = ?1");
    let pair = conn
        .query_row(&sql, params![id], appointment_from_row)
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => DatabaseError::NotFound {
                entity_type: "Appointment".into(),
                id: id.into(),
            },
            other => DatabaseError::from(other),
        })?;
    finish(pair)
}

/// List appointments with display names joined in, newest first.
pub fn list_appointments(
    conn: &Connection,
    filter: &AppointmentFilter,
) -> Result<Vec<AppointmentView>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT a.id, a.patient_id, p.full_name, a.doctor_id, d.full_name, d.specialty,
                a.date, a.time, a.status, a.reason
         FROM appointments a
         JOIN patients p ON a.patient_id = p.id
         JOIN doctors d ON a.doctor_id = d.id
         WHERE (?1 IS NULL OR a.patient_id = ?1)
           AND (?2 IS NULL OR a.doctor_id = ?2)
           AND (?3 IS NULL OR a.status = ?3)
         ORDER BY a.date DESC, a.time DESC",
    )?;

    let status_filter = filter.status.map(|s| s.as_str().to_string());
    let rows = stmt.query_map(
        params![filter.patient_id, filter.doctor_id, status_filter],
        |row| {
            let date_raw: String = row.get(6)?;
            let status_raw: String = row.get(8)?;
            Ok((
                AppointmentView {
                    id: row.get(0)?,
                    patient_id: row.get(1)?,
                    patient_name: row.get(2)?,
                    doctor_id: row.get(3)?,
                    doctor_name: row.get(4)?,
                    doctor_specialty: row.get(5)?,
                    date: NaiveDate::parse_from_str(&date_raw, "%Y-%m-%d").unwrap_or_default(),
                    time: row.get(7)?,
                    status: AppointmentStatus::Pending, // replaced below
                    status_label: "",
                    status_color: "",
                    reason: row.get(9)?,
                },
                status_raw,
            ))
        },
    )?;

    let mut views = Vec::new();
    for row in rows {
        let (mut view, status_raw) = row?;
        let status = AppointmentStatus::from_str(&status_raw)?;
        view.status = status;
        view.status_label = status.display_label();
        view.status_color = status.color();
        views.push(view);
    }
    Ok(views)
}

/// Validated status transition. Rejects moves the lifecycle does not allow.
pub fn update_status(
    conn: &Connection,
    id: &str,
    next: AppointmentStatus,
) -> Result<Appointment, DatabaseError> {
    let current = get_appointment(conn, id)?;
    if !current.status.can_transition_to(next) {
        return Err(DatabaseError::ConstraintViolation(format!(
            "Transición de estado no permitida: {} → {}",
            current.status.as_str(),
            next.as_str()
        )));
    }
    conn.execute(
        "UPDATE appointments SET status = ?1 WHERE id = ?2",
        params![next.as_str(), id],
    )?;
    get_appointment(conn, id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::{doctor, patient};
    use crate::db::sqlite::open_memory_database;
    use crate::models::{NewDoctor, NewPatient};

    fn seed(conn: &Connection) -> (String, String) {
        let p = patient::create_patient(
            conn,
            &NewPatient {
                full_name: "Ana García".into(),
                email: "ana@example.com".into(),
                phone: None,
                birth_date: None,
                emergency_contact_name: None,
                emergency_contact_phone: None,
                insurance_provider: None,
                insurance_policy_number: None,
            },
        )
        .unwrap();
        let d = doctor::create_doctor(
            conn,
            &NewDoctor {
                full_name: "Dra. Elena Ruiz".into(),
                specialty: "Cardiología".into(),
                license_number: "123456".into(),
                clinic_address: None,
                clinic_phone: None,
                signature_url: None,
                stamp_url: None,
            },
        )
        .unwrap();
        (p.id, d.id)
    }

    fn book(conn: &Connection, patient_id: &str, doctor_id: &str, date: &str) -> Appointment {
        create_appointment(
            conn,
            &NewAppointment {
                patient_id: patient_id.into(),
                doctor_id: doctor_id.into(),
                date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
                time: "10:30".into(),
                reason: Some("Control anual".into()),
                notes: None,
            },
        )
        .unwrap()
    }

    #[test]
    fn booking_starts_pending() {
        let conn = open_memory_database().unwrap();
        let (p, d) = seed(&conn);
        let appt = book(&conn, &p, &d, "2026-09-01");
        assert_eq!(appt.status, AppointmentStatus::Pending);
    }

    #[test]
    fn booking_unknown_doctor_fails() {
        let conn = open_memory_database().unwrap();
        let (p, _) = seed(&conn);
        let err = create_appointment(
            &conn,
            &NewAppointment {
                patient_id: p,
                doctor_id: "ghost".into(),
                date: NaiveDate::from_ymd_opt(2026, 9, 1).unwrap(),
                time: "10:30".into(),
                reason: None,
                notes: None,
            },
        )
        .unwrap_err();
        assert!(matches!(err, DatabaseError::NotFound { .. }));
    }

    #[test]
    fn list_joins_names_and_labels() {
        let conn = open_memory_database().unwrap();
        let (p, d) = seed(&conn);
        book(&conn, &p, &d, "2026-09-01");
        book(&conn, &p, &d, "2026-09-15");

        let views = list_appointments(&conn, &AppointmentFilter::default()).unwrap();
        assert_eq!(views.len(), 2);
        // Newest first
        assert_eq!(views[0].date.to_string(), "2026-09-15");
        assert_eq!(views[0].patient_name, "Ana García");
        assert_eq!(views[0].doctor_name, "Dra. Elena Ruiz");
        assert_eq!(views[0].status_label, "Pendiente");
    }

    #[test]
    fn list_filters_by_status() {
        let conn = open_memory_database().unwrap();
        let (p, d) = seed(&conn);
        let a1 = book(&conn, &p, &d, "2026-09-01");
        book(&conn, &p, &d, "2026-09-15");

        update_status(&conn, &a1.id, AppointmentStatus::Confirmed).unwrap();

        let confirmed = list_appointments(
            &conn,
            &AppointmentFilter {
                status: Some(AppointmentStatus::Confirmed),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(confirmed.len(), 1);
        assert_eq!(confirmed[0].id, a1.id);
    }

    #[test]
    fn full_lifecycle() {
        let conn = open_memory_database().unwrap();
        let (p, d) = seed(&conn);
        let appt = book(&conn, &p, &d, "2026-09-01");

        let appt = update_status(&conn, &appt.id, AppointmentStatus::Confirmed).unwrap();
        assert_eq!(appt.status, AppointmentStatus::Confirmed);
        let appt = update_status(&conn, &appt.id, AppointmentStatus::Completed).unwrap();
        assert_eq!(appt.status, AppointmentStatus::Completed);
    }

    #[test]
    fn invalid_transition_rejected() {
        let conn = open_memory_database().unwrap();
        let (p, d) = seed(&conn);
        let appt = book(&conn, &p, &d, "2026-09-01");

        // pending → completed skips confirmation
        let err = update_status(&conn, &appt.id, AppointmentStatus::Completed).unwrap_err();
        assert!(matches!(err, DatabaseError::ConstraintViolation(_)));

        // cancelled is terminal
        update_status(&conn, &appt.id, AppointmentStatus::Cancelled).unwrap();
        let err = update_status(&conn, &appt.id, AppointmentStatus::Confirmed).unwrap_err();
        assert!(matches!(err, DatabaseError::ConstraintViolation(_)));
    }

    #[test]
    fn update_status_missing_appointment() {
        let conn = open_memory_database().unwrap();
        let err = update_status(&conn, "nope", AppointmentStatus::Confirmed).unwrap_err();
        assert!(matches!(err, DatabaseError::NotFound { .. }));
    }
}
