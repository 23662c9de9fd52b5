//! Prescription persistence. Doctor and patient fields are snapshotted at
//! creation so the rendered document stays stable if profiles change later;
//! rows are immutable afterwards except for deletion.

use rusqlite::{params, Connection};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::{MedicationEntry, NewPrescription, Prescription};

pub fn create_prescription(
    conn: &Connection,
    new: &NewPrescription,
) -> Result<Prescription, DatabaseError> {
    if new.medications.is_empty() {
        return Err(DatabaseError::ConstraintViolation(
            "Una receta debe incluir al menos un medicamento".into(),
        ));
    }

    let doctor = super::doctor::get_doctor(conn, &new.doctor_id)?;
    let patient = super::patient::get_patient(conn, &new.patient_id)?;

    let age = patient
        .birth_date
        .and_then(|b| chrono::Local::now().date_naive().years_since(b));

    // The record row and its medication rows commit together; an
    // immutable prescription must never exist with a truncated list.
    let tx = conn.unchecked_transaction()?;

    let id = Uuid::new_v4().to_string();
    tx.execute(
        "INSERT INTO prescriptions (id, doctor_id, patient_id,
             doctor_name, doctor_specialty, doctor_license, doctor_clinic,
             patient_name, patient_age, diagnosis, notes, signature_url, stamp_url)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
        params![
            id,
            new.doctor_id,
            new.patient_id,
            doctor.full_name,
            doctor.specialty,
            doctor.license_number,
            doctor.clinic_address,
            patient.full_name,
            age,
            new.diagnosis,
            new.notes,
            doctor.signature_url,
            doctor.stamp_url,
        ],
    )?;

    for (position, med) in new.medications.iter().enumerate() {
        tx.execute(
            "INSERT INTO prescription_medications
                 (id, prescription_id, position, name, dosage, frequency, duration, instructions)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                Uuid::new_v4().to_string(),
                id,
                position as i64,
                med.name,
                med.dosage,
                med.frequency,
                med.duration,
                med.instructions,
            ],
        )?;
    }

    tx.commit()?;
    get_prescription(conn, &id)
}

pub fn get_prescription(conn: &Connection, id: &str) -> Result<Prescription, DatabaseError> {
    let mut rx = conn
        .query_row(
            "SELECT id, doctor_id, patient_id, doctor_name, doctor_specialty,
                    doctor_license, doctor_clinic, patient_name, patient_age,
                    diagnosis, notes, signature_url, stamp_url, created_at
             FROM prescriptions WHERE id = ?1",
            params![id],
            |row| {
                Ok(Prescription {
                    id: row.get(0)?,
                    doctor_id: row.get(1)?,
                    patient_id: row.get(2)?,
                    doctor_name: row.get(3)?,
                    doctor_specialty: row.get(4)?,
                    doctor_license: row.get(5)?,
                    doctor_clinic: row.get(6)?,
                    patient_name: row.get(7)?,
                    patient_age: row.get(8)?,
                    medications: Vec::new(),
                    diagnosis: row.get(9)?,
                    notes: row.get(10)?,
                    signature_url: row.get(11)?,
                    stamp_url: row.get(12)?,
                    created_at: row.get(13)?,
                })
            },
        )
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => DatabaseError::NotFound {
                entity_type: "Prescription".into(),
                id: id.into(),
            },
            other => DatabaseError::from(other),
        })?;

    rx.medications = fetch_medications(conn, id)?;
    Ok(rx)
}

fn fetch_medications(
    conn: &Connection,
    prescription_id: &str,
) -> Result<Vec<MedicationEntry>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT name, dosage, frequency, duration, instructions
         FROM prescription_medications
         WHERE prescription_id = ?1
         ORDER BY position ASC",
    )?;
    let rows = stmt.query_map(params![prescription_id], |row| {
        Ok(MedicationEntry {
            name: row.get(0)?,
            dosage: row.get(1)?,
            frequency: row.get(2)?,
            duration: row.get(3)?,
            instructions: row.get(4)?,
        })
    })?;
    rows.collect::<Result<Vec<_>, _>>()
        .map_err(DatabaseError::from)
}

/// List prescriptions for a patient or doctor, newest first. A single
/// JOIN brings the medication rows along; rows are grouped back into
/// records as they stream in.
pub fn list_prescriptions(
    conn: &Connection,
    patient_id: Option<&str>,
    doctor_id: Option<&str>,
) -> Result<Vec<Prescription>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT p.id, p.doctor_id, p.patient_id, p.doctor_name, p.doctor_specialty,
                p.doctor_license, p.doctor_clinic, p.patient_name, p.patient_age,
                p.diagnosis, p.notes, p.signature_url, p.stamp_url, p.created_at,
                m.name, m.dosage, m.frequency, m.duration, m.instructions
         FROM prescriptions p
         LEFT JOIN prescription_medications m ON m.prescription_id = p.id
         WHERE (?1 IS NULL OR p.patient_id = ?1)
           AND (?2 IS NULL OR p.doctor_id = ?2)
         ORDER BY p.created_at DESC, p.id, m.position ASC",
    )?;

    let rows = stmt.query_map(params![patient_id, doctor_id], |row| {
        let rx = Prescription {
            id: row.get(0)?,
            doctor_id: row.get(1)?,
            patient_id: row.get(2)?,
            doctor_name: row.get(3)?,
            doctor_specialty: row.get(4)?,
            doctor_license: row.get(5)?,
            doctor_clinic: row.get(6)?,
            patient_name: row.get(7)?,
            patient_age: row.get(8)?,
            medications: Vec::new(),
            diagnosis: row.get(9)?,
            notes: row.get(10)?,
            signature_url: row.get(11)?,
            stamp_url: row.get(12)?,
            created_at: row.get(13)?,
        };
        let med = row
            .get::<_, Option<String>>(14)?
            .map(|name| -> rusqlite::Result<MedicationEntry> {
                Ok(MedicationEntry {
                    name,
                    dosage: row.get(15)?,
                    frequency: row.get(16)?,
                    duration: row.get(17)?,
                    instructions: row.get(18)?,
                })
            })
            .transpose()?;
        Ok((rx, med))
    })?;

    let mut out: Vec<Prescription> = Vec::new();
    for row in rows {
        let (rx, med) = row?;
        match out.last_mut() {
            Some(last) if last.id == rx.id => {
                if let Some(med) = med {
                    last.medications.push(med);
                }
            }
            _ => {
                let mut rx = rx;
                if let Some(med) = med {
                    rx.medications.push(med);
                }
                out.push(rx);
            }
        }
    }
    Ok(out)
}

pub fn delete_prescription(conn: &Connection, id: &str) -> Result<(), DatabaseError> {
    let changed = conn.execute("DELETE FROM prescriptions WHERE id = ?1", params![id])?;
    if changed == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "Prescription".into(),
            id: id.into(),
        });
    }
    Ok(())
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
                birth_date: chrono::NaiveDate::from_ymd_opt(1990, 4, 12),
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
                clinic_address: Some("Av. Reforma 100".into()),
                clinic_phone: None,
                signature_url: None,
                stamp_url: None,
            },
        )
        .unwrap();
        (p.id, d.id)
    }

    fn ibuprofen() -> MedicationEntry {
        MedicationEntry {
            name: "Ibuprofeno".into(),
            dosage: "600mg".into(),
            frequency: "Cada 8 horas".into(),
            duration: None,
            instructions: None,
        }
    }

    #[test]
    fn create_snapshots_doctor_and_patient() {
        let conn = open_memory_database().unwrap();
        let (p, d) = seed(&conn);

        let rx = create_prescription(
            &conn,
            &NewPrescription {
                doctor_id: d,
                patient_id: p,
                medications: vec![ibuprofen()],
                diagnosis: Some("Lumbalgia".into()),
                notes: None,
            },
        )
        .unwrap();

        assert_eq!(rx.doctor_name, "Dra. Elena Ruiz");
        assert_eq!(rx.doctor_specialty.as_deref(), Some("Cardiología"));
        assert_eq!(rx.patient_name, "Ana García");
        assert!(rx.patient_age.is_some());
        assert_eq!(rx.medications.len(), 1);
        assert_eq!(rx.medications[0].name, "Ibuprofeno");
    }

    #[test]
    fn create_requires_medications() {
        let conn = open_memory_database().unwrap();
        let (p, d) = seed(&conn);
        let err = create_prescription(
            &conn,
            &NewPrescription {
                doctor_id: d,
                patient_id: p,
                medications: vec![],
                diagnosis: None,
                notes: None,
            },
        )
        .unwrap_err();
        assert!(matches!(err, DatabaseError::ConstraintViolation(_)));
    }

    #[test]
    fn medications_keep_order() {
        let conn = open_memory_database().unwrap();
        let (p, d) = seed(&conn);

        let meds: Vec<MedicationEntry> = ["Amoxicilina", "Ibuprofeno", "Omeprazol"]
            .iter()
            .map(|name| MedicationEntry {
                name: (*name).into(),
                dosage: "1 tableta".into(),
                frequency: "Cada 12 horas".into(),
                duration: None,
                instructions: None,
            })
            .collect();

        let rx = create_prescription(
            &conn,
            &NewPrescription {
                doctor_id: d,
                patient_id: p,
                medications: meds,
                diagnosis: None,
                notes: None,
            },
        )
        .unwrap();

        let names: Vec<&str> = rx.medications.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, ["Amoxicilina", "Ibuprofeno", "Omeprazol"]);
    }

    #[test]
    fn failed_medication_insert_leaves_no_partial_prescription() {
        let conn = open_memory_database().unwrap();
        let (p, d) = seed(&conn);

        // Force the medication insert to fail mid-creation.
        conn.execute("DROP TABLE prescription_medications", [])
            .unwrap();

        let result = create_prescription(
            &conn,
            &NewPrescription {
                doctor_id: d,
                patient_id: p,
                medications: vec![ibuprofen()],
                diagnosis: None,
                notes: None,
            },
        );
        assert!(result.is_err());

        let orphans: i64 = conn
            .query_row("SELECT COUNT(*) FROM prescriptions", [], |row| row.get(0))
            .unwrap();
        assert_eq!(orphans, 0);
    }

    #[test]
    fn delete_cascades_medications() {
        let conn = open_memory_database().unwrap();
        let (p, d) = seed(&conn);
        let rx = create_prescription(
            &conn,
            &NewPrescription {
                doctor_id: d,
                patient_id: p,
                medications: vec![ibuprofen()],
                diagnosis: None,
                notes: None,
            },
        )
        .unwrap();

        delete_prescription(&conn, &rx.id).unwrap();

        let err = get_prescription(&conn, &rx.id).unwrap_err();
        assert!(matches!(err, DatabaseError::NotFound { .. }));
        let left: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM prescription_medications WHERE prescription_id = ?1",
                params![rx.id],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(left, 0);
    }

    #[test]
    fn delete_missing_returns_not_found() {
        let conn = open_memory_database().unwrap();
        let err = delete_prescription(&conn, "nope").unwrap_err();
        assert!(matches!(err, DatabaseError::NotFound { .. }));
    }

    #[test]
    fn list_filters_by_patient() {
        let conn = open_memory_database().unwrap();
        let (p, d) = seed(&conn);
        create_prescription(
            &conn,
            &NewPrescription {
                doctor_id: d.clone(),
                patient_id: p.clone(),
                medications: vec![ibuprofen()],
                diagnosis: None,
                notes: None,
            },
        )
        .unwrap();

        let for_patient = list_prescriptions(&conn, Some(&p), None).unwrap();
        assert_eq!(for_patient.len(), 1);
        let for_other = list_prescriptions(&conn, Some("other"), None).unwrap();
        assert!(for_other.is_empty());
    }

    #[test]
    fn list_groups_medications_per_prescription_in_order() {
        let conn = open_memory_database().unwrap();
        let (p, d) = seed(&conn);

        let make_meds = |names: &[&str]| -> Vec<MedicationEntry> {
            names
                .iter()
                .map(|name| MedicationEntry {
                    name: (*name).into(),
                    dosage: "1 tableta".into(),
                    frequency: "Cada 12 horas".into(),
                    duration: None,
                    instructions: None,
                })
                .collect()
        };

        let first = create_prescription(
            &conn,
            &NewPrescription {
                doctor_id: d.clone(),
                patient_id: p.clone(),
                medications: make_meds(&["Amoxicilina", "Omeprazol"]),
                diagnosis: None,
                notes: None,
            },
        )
        .unwrap();
        let second = create_prescription(
            &conn,
            &NewPrescription {
                doctor_id: d,
                patient_id: p.clone(),
                medications: make_meds(&["Ibuprofeno", "Paracetamol", "Loratadina"]),
                diagnosis: None,
                notes: None,
            },
        )
        .unwrap();

        let listed = list_prescriptions(&conn, Some(&p), None).unwrap();
        assert_eq!(listed.len(), 2);
        for rx in &listed {
            let expected = if rx.id == first.id {
                vec!["Amoxicilina", "Omeprazol"]
            } else {
                assert_eq!(rx.id, second.id);
                vec!["Ibuprofeno", "Paracetamol", "Loratadina"]
            };
            let names: Vec<&str> = rx.medications.iter().map(|m| m.name.as_str()).collect();
            assert_eq!(names, expected);
        }
    }
}
