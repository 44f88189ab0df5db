use chrono::Duration;

use super::cars::find_car;
use super::{fmt_date, parse_date, today};
use crate::db::Database;
use crate::error::{Error, Result};
use crate::models::{CreateMaintenance, Maintenance, MaintenanceStatus, MaintenanceWithCar};

fn maintenance_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Maintenance> {
    Ok(Maintenance {
        id: row.get(0)?,
        car_id: row.get(1)?,
        maint_type: row.get(2)?,
        due_date: row.get(3)?,
        status: row.get(4)?,
        cost: row.get(5)?,
        notes: row.get(6)?,
    })
}

pub fn create_maintenance(db: &Database, record: CreateMaintenance) -> Result<Maintenance> {
    if record.maint_type.trim().is_empty() {
        return Err(Error::InvalidInput("'maint_type' is required".to_string()));
    }
    parse_date("due_date", &record.due_date)?;
    let cost = record.cost.unwrap_or(0.0);
    if cost < 0.0 {
        return Err(Error::InvalidInput(
            "'cost' cannot be negative".to_string(),
        ));
    }

    db.write_tx(|tx| {
        if find_car(tx, record.car_id)?.is_none() {
            return Err(Error::NotFound {
                entity: "Car",
                id: record.car_id,
            });
        }

        tx.execute(
            "INSERT INTO maintenance (car_id, maint_type, due_date, status, cost, notes)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            rusqlite::params![
                record.car_id,
                record.maint_type,
                record.due_date,
                record.status.unwrap_or(MaintenanceStatus::Pending),
                cost,
                record.notes
            ],
        )?;
        let id = tx.last_insert_rowid();

        let mut stmt = tx.prepare(
            "SELECT id, car_id, maint_type, due_date, status, cost, notes
             FROM maintenance WHERE id = ?1",
        )?;
        stmt.query_row([id], maintenance_from_row)
            .map_err(Into::into)
    })
}

/// Pending maintenance due within the next `days_ahead` days (default 30,
/// allowed range 1..=365), with the car it belongs to.
pub fn list_upcoming_maintenance(
    db: &Database,
    days_ahead: Option<i64>,
) -> Result<Vec<MaintenanceWithCar>> {
    let days_ahead = days_ahead.unwrap_or(30);
    if !(1..=365).contains(&days_ahead) {
        return Err(Error::InvalidInput(
            "'days' must be between 1 and 365".to_string(),
        ));
    }

    db.read(|conn| {
        let today = today();
        let limit_date = fmt_date(today + Duration::days(days_ahead));

        let mut stmt = conn.prepare(
            "SELECT m.id, m.car_id, m.maint_type, m.due_date, m.status, m.cost, m.notes,
                    c.make, c.model, c.year
             FROM maintenance m
             JOIN cars c ON m.car_id = c.id
             WHERE m.status = 'pending' AND m.due_date BETWEEN ?1 AND ?2
             ORDER BY m.due_date ASC",
        )?;

        let records = stmt
            .query_map([fmt_date(today), limit_date], |row| {
                Ok(MaintenanceWithCar {
                    maintenance: maintenance_from_row(row)?,
                    car_make: row.get(7)?,
                    car_model: row.get(8)?,
                    car_year: row.get(9)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(records)
    })
}
