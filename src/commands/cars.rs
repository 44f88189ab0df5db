use chrono::Datelike;
use rusqlite::Connection;

use crate::db::Database;
use crate::error::{Error, Result};
use crate::models::{Car, CreateCar};

fn car_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Car> {
    Ok(Car {
        id: row.get(0)?,
        make: row.get(1)?,
        model: row.get(2)?,
        year: row.get(3)?,
        price_per_day: row.get(4)?,
        available: row.get(5)?,
    })
}

pub(crate) fn find_car(conn: &Connection, id: i64) -> Result<Option<Car>> {
    let mut stmt = conn.prepare(
        "SELECT id, make, model, year, price_per_day, available FROM cars WHERE id = ?1",
    )?;

    let car = stmt.query_row([id], car_from_row);
    match car {
        Ok(car) => Ok(Some(car)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn create_car(db: &Database, car: CreateCar) -> Result<Car> {
    if car.make.trim().is_empty() || car.model.trim().is_empty() {
        return Err(Error::InvalidInput(
            "'make' and 'model' are required".to_string(),
        ));
    }
    let max_year = super::today().year() + 1;
    if car.year < 1900 || car.year > max_year {
        return Err(Error::InvalidInput(format!(
            "'year' must be between 1900 and {max_year}"
        )));
    }
    if car.price_per_day <= 0.0 {
        return Err(Error::InvalidInput(
            "'price_per_day' must be greater than 0".to_string(),
        ));
    }

    db.write_tx(|tx| {
        tx.execute(
            "INSERT INTO cars (make, model, year, price_per_day, available) VALUES (?1, ?2, ?3, ?4, ?5)",
            rusqlite::params![
                car.make,
                car.model,
                car.year,
                car.price_per_day,
                car.available.unwrap_or(true)
            ],
        )?;

        let id = tx.last_insert_rowid();
        find_car(tx, id)?.ok_or(Error::NotFound { entity: "Car", id })
    })
}

pub fn list_cars(db: &Database) -> Result<Vec<Car>> {
    db.read(|conn| {
        let mut stmt = conn.prepare(
            "SELECT id, make, model, year, price_per_day, available FROM cars ORDER BY make, model",
        )?;

        let cars = stmt
            .query_map([], car_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(cars)
    })
}

pub fn list_available_cars(db: &Database) -> Result<Vec<Car>> {
    db.read(|conn| {
        let mut stmt = conn.prepare(
            "SELECT id, make, model, year, price_per_day, available FROM cars
             WHERE available = 1
             ORDER BY make, model",
        )?;

        let cars = stmt
            .query_map([], car_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(cars)
    })
}
