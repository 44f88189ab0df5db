use rusqlite::{Connection, Transaction};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use crate::error::{Error, Result};

/// Handle to the rental database. A single connection behind a mutex: the
/// mutex is the write queue (one compound operation at a time), and
/// `write_tx` gives each compound operation all-or-nothing semantics.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        Self::from_connection(conn)
    }

    /// In-memory database, used by tests.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.pragma_update(None, "foreign_keys", true)?;
        Ok(Database {
            conn: Mutex::new(conn),
        })
    }

    pub fn initialize(&self) -> Result<()> {
        let conn = self.lock()?;

        conn.execute_batch(
            "
            -- Vehicle fleet
            CREATE TABLE IF NOT EXISTS cars (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                make TEXT NOT NULL,
                model TEXT NOT NULL,
                year INTEGER NOT NULL,
                price_per_day REAL NOT NULL,
                available BOOLEAN NOT NULL DEFAULT 1
            );

            CREATE TABLE IF NOT EXISTS customers (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                email TEXT NOT NULL UNIQUE
            );

            -- Rental periods; status is the lifecycle ('open' or 'closed'),
            -- end_date is the scheduled end while open and the actual end
            -- once closed
            CREATE TABLE IF NOT EXISTS rentals (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                car_id INTEGER NOT NULL,
                customer_id INTEGER NOT NULL,
                start_date TEXT NOT NULL,
                end_date TEXT,
                total_cost REAL,
                deposit_amount REAL NOT NULL DEFAULT 0.0,
                is_paid BOOLEAN NOT NULL DEFAULT 0,
                payment_method TEXT,
                status TEXT NOT NULL DEFAULT 'open',
                FOREIGN KEY (car_id) REFERENCES cars(id),
                FOREIGN KEY (customer_id) REFERENCES customers(id)
            );

            -- Store-level backstop for the availability checker: a car can
            -- carry at most one open rental
            CREATE UNIQUE INDEX IF NOT EXISTS idx_rentals_open_car
                ON rentals(car_id) WHERE status = 'open';

            -- One sale per settled rental
            CREATE TABLE IF NOT EXISTS sales (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                rental_id INTEGER NOT NULL UNIQUE,
                customer_id INTEGER NOT NULL,
                car_id INTEGER NOT NULL,
                total_cost REAL NOT NULL,
                sale_date TEXT NOT NULL,
                FOREIGN KEY (rental_id) REFERENCES rentals(id),
                FOREIGN KEY (customer_id) REFERENCES customers(id),
                FOREIGN KEY (car_id) REFERENCES cars(id)
            );

            CREATE TABLE IF NOT EXISTS insurances (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                car_id INTEGER NOT NULL,
                provider TEXT NOT NULL,
                policy_number TEXT NOT NULL,
                start_date TEXT NOT NULL,
                end_date TEXT NOT NULL,
                coverage TEXT,
                FOREIGN KEY (car_id) REFERENCES cars(id)
            );

            CREATE TABLE IF NOT EXISTS legal_documents (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                car_id INTEGER NOT NULL,
                doc_type TEXT NOT NULL,
                number TEXT,
                issue_date TEXT,
                expiry_date TEXT,
                file_url TEXT,
                FOREIGN KEY (car_id) REFERENCES cars(id)
            );

            CREATE TABLE IF NOT EXISTS maintenance (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                car_id INTEGER NOT NULL,
                maint_type TEXT NOT NULL,
                due_date TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'pending',
                cost REAL NOT NULL DEFAULT 0.0,
                notes TEXT,
                FOREIGN KEY (car_id) REFERENCES cars(id)
            );

            CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                email TEXT NOT NULL UNIQUE,
                role TEXT NOT NULL DEFAULT 'staff',
                active BOOLEAN NOT NULL DEFAULT 1
            );
            ",
        )?;

        // Run migrations for existing databases (pass connection to avoid deadlock)
        Self::migrate_conn(&conn)?;

        Ok(())
    }

    fn migrate_conn(conn: &Connection) -> Result<()> {
        // Customer document columns arrived after the first schema version
        let columns: Vec<String> = conn
            .prepare("PRAGMA table_info(customers)")?
            .query_map([], |row| row.get::<_, String>(1))?
            .filter_map(|r| r.ok())
            .collect();

        if !columns.contains(&"id_card_url".to_string()) {
            conn.execute("ALTER TABLE customers ADD COLUMN id_card_url TEXT", [])?;
        }
        if !columns.contains(&"driving_license_url".to_string()) {
            conn.execute(
                "ALTER TABLE customers ADD COLUMN driving_license_url TEXT",
                [],
            )?;
        }

        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|e| Error::Internal(e.to_string()))
    }

    /// Runs a read-only closure against the connection.
    pub fn read<T>(&self, f: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
        let conn = self.lock()?;
        f(&conn)
    }

    /// Runs a closure inside a transaction. Commits on Ok; a failing closure
    /// drops the transaction, which rolls it back, so a failed compound
    /// operation leaves no partial writes.
    pub fn write_tx<T>(&self, f: impl FnOnce(&Transaction<'_>) -> Result<T>) -> Result<T> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let value = f(&tx)?;
        tx.commit()?;
        Ok(value)
    }
}
