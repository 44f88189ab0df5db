use chrono::Duration;
use rusqlite::Connection;

use super::{fmt_date, today};
use crate::db::Database;
use crate::error::Result;
use crate::models::Stats;

fn count(conn: &Connection, sql: &str) -> Result<i64> {
    conn.query_row(sql, [], |row| row.get(0)).map_err(Into::into)
}

/// Dashboard counters. Each figure is its own query; the result is a
/// best-effort snapshot, not one consistent read.
pub fn get_stats(db: &Database) -> Result<Stats> {
    db.read(|conn| {
        let now = today();
        let today = fmt_date(now);
        let window_end = fmt_date(now + Duration::days(30));

        let vehicles = count(conn, "SELECT COUNT(*) FROM cars")?;
        let customers = count(conn, "SELECT COUNT(*) FROM customers")?;

        let rentals_active: i64 = conn.query_row(
            "SELECT COUNT(*) FROM rentals WHERE end_date IS NULL OR end_date > ?1",
            [&today],
            |row| row.get(0),
        )?;

        let invoices = count(conn, "SELECT COUNT(*) FROM sales")?;
        let revenue: f64 = conn.query_row(
            "SELECT COALESCE(SUM(total_cost), 0) FROM sales",
            [],
            |row| row.get(0),
        )?;

        let insurance_expiring: i64 = conn.query_row(
            "SELECT COUNT(*) FROM insurances WHERE end_date BETWEEN ?1 AND ?2",
            [&today, &window_end],
            |row| row.get(0),
        )?;
        let docs_expiring: i64 = conn.query_row(
            "SELECT COUNT(*) FROM legal_documents WHERE expiry_date BETWEEN ?1 AND ?2",
            [&today, &window_end],
            |row| row.get(0),
        )?;
        let maintenance_due: i64 = conn.query_row(
            "SELECT COUNT(*) FROM maintenance WHERE status = 'pending' AND due_date BETWEEN ?1 AND ?2",
            [&today, &window_end],
            |row| row.get(0),
        )?;

        let users_active = count(conn, "SELECT COUNT(*) FROM users WHERE active = 1")?;

        Ok(Stats {
            vehicles,
            customers,
            rentals_active,
            invoices,
            revenue,
            insurance_expiring,
            docs_expiring,
            maintenance_due,
            users_active,
        })
    })
}
