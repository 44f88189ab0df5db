use rusqlite::Connection;

use crate::db::Database;
use crate::error::{is_unique_violation, Error, Result};
use crate::models::{CreateCustomer, Customer};

fn customer_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Customer> {
    Ok(Customer {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        id_card_url: row.get(3)?,
        driving_license_url: row.get(4)?,
    })
}

pub(crate) fn find_customer(conn: &Connection, id: i64) -> Result<Option<Customer>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, email, id_card_url, driving_license_url FROM customers WHERE id = ?1",
    )?;

    match stmt.query_row([id], customer_from_row) {
        Ok(customer) => Ok(Some(customer)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn create_customer(db: &Database, customer: CreateCustomer) -> Result<Customer> {
    if customer.name.trim().is_empty() || customer.email.trim().is_empty() {
        return Err(Error::InvalidInput(
            "'name' and 'email' are required".to_string(),
        ));
    }
    if !customer.email.contains('@') {
        return Err(Error::InvalidInput(
            "'email' must be a valid email address".to_string(),
        ));
    }

    db.write_tx(|tx| {
        tx.execute(
            "INSERT INTO customers (name, email, id_card_url, driving_license_url) VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params![
                customer.name,
                customer.email,
                customer.id_card_url,
                customer.driving_license_url
            ],
        )
        .map_err(|e| {
            if is_unique_violation(&e) {
                Error::Conflict(format!(
                    "Customer with email '{}' already exists",
                    customer.email
                ))
            } else {
                e.into()
            }
        })?;

        let id = tx.last_insert_rowid();
        find_customer(tx, id)?.ok_or(Error::NotFound {
            entity: "Customer",
            id,
        })
    })
}

pub fn list_customers(db: &Database) -> Result<Vec<Customer>> {
    db.read(|conn| {
        let mut stmt = conn.prepare(
            "SELECT id, name, email, id_card_url, driving_license_url FROM customers ORDER BY name",
        )?;

        let customers = stmt
            .query_map([], customer_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(customers)
    })
}
