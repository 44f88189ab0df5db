use super::cars::find_car;
use super::parse_date;
use crate::db::Database;
use crate::error::{Error, Result};
use crate::models::{CreateInsurance, CreateLegalDocument, Insurance, LegalDocument};

fn insurance_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Insurance> {
    Ok(Insurance {
        id: row.get(0)?,
        car_id: row.get(1)?,
        provider: row.get(2)?,
        policy_number: row.get(3)?,
        start_date: row.get(4)?,
        end_date: row.get(5)?,
        coverage: row.get(6)?,
    })
}

fn legal_doc_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<LegalDocument> {
    Ok(LegalDocument {
        id: row.get(0)?,
        car_id: row.get(1)?,
        doc_type: row.get(2)?,
        number: row.get(3)?,
        issue_date: row.get(4)?,
        expiry_date: row.get(5)?,
        file_url: row.get(6)?,
    })
}

pub fn create_insurance(db: &Database, car_id: i64, ins: CreateInsurance) -> Result<Insurance> {
    if ins.provider.trim().is_empty() || ins.policy_number.trim().is_empty() {
        return Err(Error::InvalidInput(
            "'provider' and 'policy_number' are required".to_string(),
        ));
    }
    parse_date("start_date", &ins.start_date)?;
    parse_date("end_date", &ins.end_date)?;

    db.write_tx(|tx| {
        if find_car(tx, car_id)?.is_none() {
            return Err(Error::NotFound {
                entity: "Car",
                id: car_id,
            });
        }

        tx.execute(
            "INSERT INTO insurances (car_id, provider, policy_number, start_date, end_date, coverage)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            rusqlite::params![
                car_id,
                ins.provider,
                ins.policy_number,
                ins.start_date,
                ins.end_date,
                ins.coverage
            ],
        )?;
        let id = tx.last_insert_rowid();

        let mut stmt = tx.prepare(
            "SELECT id, car_id, provider, policy_number, start_date, end_date, coverage
             FROM insurances WHERE id = ?1",
        )?;
        stmt.query_row([id], insurance_from_row).map_err(Into::into)
    })
}

pub fn list_insurance(db: &Database, car_id: i64) -> Result<Vec<Insurance>> {
    db.read(|conn| {
        if find_car(conn, car_id)?.is_none() {
            return Err(Error::NotFound {
                entity: "Car",
                id: car_id,
            });
        }

        let mut stmt = conn.prepare(
            "SELECT id, car_id, provider, policy_number, start_date, end_date, coverage
             FROM insurances
             WHERE car_id = ?1
             ORDER BY end_date DESC",
        )?;

        let records = stmt
            .query_map([car_id], insurance_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(records)
    })
}

pub fn create_legal_doc(
    db: &Database,
    car_id: i64,
    doc: CreateLegalDocument,
) -> Result<LegalDocument> {
    if doc.doc_type.trim().is_empty() {
        return Err(Error::InvalidInput("'doc_type' is required".to_string()));
    }
    if let Some(issue_date) = &doc.issue_date {
        parse_date("issue_date", issue_date)?;
    }
    if let Some(expiry_date) = &doc.expiry_date {
        parse_date("expiry_date", expiry_date)?;
    }

    db.write_tx(|tx| {
        if find_car(tx, car_id)?.is_none() {
            return Err(Error::NotFound {
                entity: "Car",
                id: car_id,
            });
        }

        tx.execute(
            "INSERT INTO legal_documents (car_id, doc_type, number, issue_date, expiry_date, file_url)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            rusqlite::params![
                car_id,
                doc.doc_type,
                doc.number,
                doc.issue_date,
                doc.expiry_date,
                doc.file_url
            ],
        )?;
        let id = tx.last_insert_rowid();

        let mut stmt = tx.prepare(
            "SELECT id, car_id, doc_type, number, issue_date, expiry_date, file_url
             FROM legal_documents WHERE id = ?1",
        )?;
        stmt.query_row([id], legal_doc_from_row).map_err(Into::into)
    })
}

pub fn list_legal_docs(db: &Database, car_id: i64) -> Result<Vec<LegalDocument>> {
    db.read(|conn| {
        if find_car(conn, car_id)?.is_none() {
            return Err(Error::NotFound {
                entity: "Car",
                id: car_id,
            });
        }

        let mut stmt = conn.prepare(
            "SELECT id, car_id, doc_type, number, issue_date, expiry_date, file_url
             FROM legal_documents
             WHERE car_id = ?1
             ORDER BY expiry_date DESC",
        )?;

        let docs = stmt
            .query_map([car_id], legal_doc_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(docs)
    })
}
