use chrono::{Duration, NaiveDate};
use rusqlite::Connection;
use tracing::info;

use super::cars::find_car;
use super::customers::find_customer;
use super::{fmt_date, parse_date, today, OPEN_ENDED};
use crate::db::Database;
use crate::error::{is_unique_violation, Error, Result};
use crate::models::{
    Car, CreateRental, CustomerSummary, Invoice, Rental, RentalStatus, RentalWithDetails, Sale,
};

const RENTAL_COLUMNS: &str = "id, car_id, customer_id, start_date, end_date, total_cost, \
                              deposit_amount, is_paid, payment_method, status";

fn rental_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Rental> {
    Ok(Rental {
        id: row.get(0)?,
        car_id: row.get(1)?,
        customer_id: row.get(2)?,
        start_date: row.get(3)?,
        end_date: row.get(4)?,
        total_cost: row.get::<_, Option<f64>>(5)?.unwrap_or(0.0),
        deposit_amount: row.get(6)?,
        is_paid: row.get(7)?,
        payment_method: row.get(8)?,
        status: row.get(9)?,
    })
}

pub(crate) fn find_rental(conn: &Connection, id: i64) -> Result<Option<Rental>> {
    let mut stmt =
        conn.prepare(&format!("SELECT {RENTAL_COLUMNS} FROM rentals WHERE id = ?1"))?;

    match stmt.query_row([id], rental_from_row) {
        Ok(rental) => Ok(Some(rental)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub(crate) fn find_sale_by_rental(conn: &Connection, rental_id: i64) -> Result<Option<Sale>> {
    let mut stmt = conn.prepare(
        "SELECT id, rental_id, customer_id, car_id, total_cost, sale_date FROM sales WHERE rental_id = ?1",
    )?;

    let sale = stmt.query_row([rental_id], |row| {
        Ok(Sale {
            id: row.get(0)?,
            rental_id: row.get(1)?,
            customer_id: row.get(2)?,
            car_id: row.get(3)?,
            total_cost: row.get(4)?,
            sale_date: row.get(5)?,
        })
    });
    match sale {
        Ok(sale) => Ok(Some(sale)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Whether the car is free over `[start_date, end_date]`, both ends
/// inclusive. `None` for `end_date` means an open-ended request. Scans every
/// rental of the car, open or closed; an open rental occupies the car until
/// the sentinel date.
pub fn is_available(
    db: &Database,
    car_id: i64,
    start_date: &str,
    end_date: Option<&str>,
) -> Result<bool> {
    db.read(|conn| {
        if find_car(conn, car_id)?.is_none() {
            return Err(Error::NotFound {
                entity: "Car",
                id: car_id,
            });
        }
        has_no_overlap(conn, car_id, start_date, end_date)
    })
}

fn has_no_overlap(
    conn: &Connection,
    car_id: i64,
    start_date: &str,
    end_date: Option<&str>,
) -> Result<bool> {
    parse_date("start_date", start_date)?;
    if let Some(end) = end_date {
        parse_date("end_date", end)?;
    }

    let end = end_date.unwrap_or(OPEN_ENDED);
    let conflicts: i64 = conn.query_row(
        "SELECT COUNT(*) FROM rentals
         WHERE car_id = ?1
           AND start_date <= ?2
           AND COALESCE(end_date, '9999-12-31') >= ?3",
        rusqlite::params![car_id, end, start_date],
        |row| row.get(0),
    )?;

    Ok(conflicts == 0)
}

/// Books a car: validates the request, re-checks availability against the
/// rental rows inside the transaction, writes the open rental, and flags the
/// car unavailable. All-or-nothing.
pub fn create_rental(db: &Database, rental: CreateRental) -> Result<i64> {
    db.write_tx(|tx| {
        let car = find_car(tx, rental.car_id)?.ok_or(Error::NotFound {
            entity: "Car",
            id: rental.car_id,
        })?;
        if !car.available {
            return Err(Error::CarUnavailable {
                car_id: rental.car_id,
            });
        }
        if find_customer(tx, rental.customer_id)?.is_none() {
            return Err(Error::NotFound {
                entity: "Customer",
                id: rental.customer_id,
            });
        }

        let start = parse_date("start_date", &rental.start_date)?;
        let (end_date, total_cost) = match rental.days {
            Some(days) if days < 1 => {
                return Err(Error::InvalidInput(
                    "'days' must be at least 1".to_string(),
                ));
            }
            Some(days) => (
                Some(fmt_date(start + Duration::days(days))),
                days as f64 * car.price_per_day,
            ),
            None => (None, 0.0),
        };

        // The available flag only covers the car's current open rental;
        // closed rentals still occupy their historical interval
        if !has_no_overlap(tx, rental.car_id, &rental.start_date, end_date.as_deref())? {
            return Err(Error::CarUnavailable {
                car_id: rental.car_id,
            });
        }

        tx.execute(
            "INSERT INTO rentals (car_id, customer_id, start_date, end_date, total_cost, deposit_amount, is_paid, payment_method, status)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, 'open')",
            rusqlite::params![
                rental.car_id,
                rental.customer_id,
                rental.start_date,
                end_date,
                total_cost,
                rental.deposit_amount.unwrap_or(0.0),
                rental.is_paid.unwrap_or(false),
                rental.payment_method
            ],
        )
        .map_err(|e| {
            if is_unique_violation(&e) {
                // idx_rentals_open_car: the car already has an open rental
                Error::CarUnavailable {
                    car_id: rental.car_id,
                }
            } else {
                e.into()
            }
        })?;
        let rental_id = tx.last_insert_rowid();

        tx.execute(
            "UPDATE cars SET available = 0 WHERE id = ?1",
            [rental.car_id],
        )?;

        info!(
            rental_id,
            car_id = rental.car_id,
            customer_id = rental.customer_id,
            "rental created"
        );
        Ok(rental_id)
    })
}

/// Settles a rental as of the current local date. Returns the sale id.
pub fn return_rental(db: &Database, rental_id: i64) -> Result<i64> {
    return_rental_on(db, rental_id, today())
}

/// Settlement with an explicit calendar day: closes the rental, prices the
/// elapsed days (minimum one), emits the sale, and releases the car, all in
/// one transaction. Returning an already-closed rental hands back its
/// existing sale without touching anything.
pub fn return_rental_on(db: &Database, rental_id: i64, today: NaiveDate) -> Result<i64> {
    db.write_tx(|tx| {
        let rental = find_rental(tx, rental_id)?.ok_or(Error::NotFound {
            entity: "Rental",
            id: rental_id,
        })?;

        if rental.status == RentalStatus::Closed {
            return find_sale_by_rental(tx, rental_id)?
                .map(|sale| sale.id)
                .ok_or_else(|| {
                    Error::InvalidState(format!("Rental {rental_id} is closed but has no sale"))
                });
        }

        // Stored data, not caller input: a parse failure here means the row
        // itself is inconsistent
        let start = parse_date("start_date", &rental.start_date).map_err(|_| {
            Error::InvalidState(format!(
                "Rental {rental_id} has a malformed start_date '{}'",
                rental.start_date
            ))
        })?;

        let mut elapsed_days = (today - start).num_days();
        if elapsed_days < 0 {
            return Err(Error::InvalidState(format!(
                "Rental {rental_id} starts on {} and cannot be returned before then",
                rental.start_date
            )));
        }
        if elapsed_days == 0 {
            elapsed_days = 1; // same-day return still bills one day
        }

        let car = find_car(tx, rental.car_id)?.ok_or(Error::NotFound {
            entity: "Car",
            id: rental.car_id,
        })?;
        let total_cost = elapsed_days as f64 * car.price_per_day;
        let end_date = fmt_date(today);

        let changed = tx.execute(
            "UPDATE rentals SET status = 'closed', end_date = ?1, total_cost = ?2
             WHERE id = ?3 AND status = 'open'",
            rusqlite::params![end_date, total_cost, rental_id],
        )?;
        if changed == 0 {
            return Err(Error::InvalidState(format!(
                "Rental {rental_id} is no longer open"
            )));
        }

        let sale_id = match find_sale_by_rental(tx, rental_id)? {
            Some(sale) => sale.id,
            None => {
                if find_customer(tx, rental.customer_id)?.is_none() {
                    return Err(Error::NotFound {
                        entity: "Customer",
                        id: rental.customer_id,
                    });
                }
                tx.execute(
                    "INSERT INTO sales (rental_id, customer_id, car_id, total_cost, sale_date)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                    rusqlite::params![
                        rental_id,
                        rental.customer_id,
                        rental.car_id,
                        total_cost,
                        end_date
                    ],
                )?;
                tx.last_insert_rowid()
            }
        };

        tx.execute(
            "UPDATE cars SET available = 1 WHERE id = ?1",
            [rental.car_id],
        )?;

        info!(
            rental_id,
            sale_id, total_cost, "rental returned and settled"
        );
        Ok(sale_id)
    })
}

/// Flat invoice view for a settled rental. Read-only.
pub fn get_invoice(db: &Database, rental_id: i64) -> Result<Invoice> {
    db.read(|conn| {
        let rental = find_rental(conn, rental_id)?.ok_or(Error::NotFound {
            entity: "Rental",
            id: rental_id,
        })?;

        let end_date = match (&rental.status, &rental.end_date) {
            (RentalStatus::Closed, Some(end)) => end.clone(),
            _ => {
                return Err(Error::InvalidState(format!(
                    "Rental {rental_id} is not completed; invoice cannot be generated"
                )));
            }
        };

        let sale = find_sale_by_rental(conn, rental_id)?.ok_or(Error::NotFound {
            entity: "Sale for rental",
            id: rental_id,
        })?;
        let car = find_car(conn, rental.car_id)?.ok_or(Error::NotFound {
            entity: "Car",
            id: rental.car_id,
        })?;
        let customer = find_customer(conn, rental.customer_id)?.ok_or(Error::NotFound {
            entity: "Customer",
            id: rental.customer_id,
        })?;

        Ok(Invoice {
            rental_id: rental.id,
            sale_id: sale.id,
            customer_name: customer.name,
            customer_email: customer.email,
            car_make: car.make,
            car_model: car.model,
            car_year: car.year,
            start_date: rental.start_date,
            end_date,
            total_cost: rental.total_cost,
            deposit_amount: rental.deposit_amount,
            is_paid: rental.is_paid,
            payment_method: rental
                .payment_method
                .unwrap_or_else(|| "N/A".to_string()),
            sale_date: sale.sale_date,
        })
    })
}

pub fn list_rentals(db: &Database) -> Result<Vec<Rental>> {
    db.read(|conn| {
        let mut stmt = conn.prepare(&format!(
            "SELECT {RENTAL_COLUMNS} FROM rentals ORDER BY id DESC"
        ))?;

        let rentals = stmt
            .query_map([], rental_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(rentals)
    })
}

/// Rentals still occupying their car (no end date yet, or scheduled to end
/// after today), joined with car and customer summaries.
pub fn list_active_rentals(db: &Database) -> Result<Vec<RentalWithDetails>> {
    db.read(|conn| {
        let mut stmt = conn.prepare(
            "SELECT r.id, r.car_id, r.customer_id, r.start_date, r.end_date, r.total_cost,
                    r.deposit_amount, r.is_paid, r.payment_method, r.status,
                    c.make, c.model, c.year, c.price_per_day, c.available,
                    cu.name, cu.email
             FROM rentals r
             JOIN cars c ON r.car_id = c.id
             JOIN customers cu ON r.customer_id = cu.id
             WHERE r.end_date IS NULL OR r.end_date > ?1
             ORDER BY r.start_date DESC",
        )?;

        let rentals = stmt
            .query_map([fmt_date(today())], |row| {
                Ok(RentalWithDetails {
                    rental: rental_from_row(row)?,
                    car: Car {
                        id: row.get(1)?,
                        make: row.get(10)?,
                        model: row.get(11)?,
                        year: row.get(12)?,
                        price_per_day: row.get(13)?,
                        available: row.get(14)?,
                    },
                    customer: CustomerSummary {
                        id: row.get(2)?,
                        name: row.get(15)?,
                        email: row.get(16)?,
                    },
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(rentals)
    })
}
