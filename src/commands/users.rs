use crate::db::Database;
use crate::error::{is_unique_violation, Error, Result};
use crate::models::{CreateUser, User, UserRole};

fn user_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        role: row.get(3)?,
        active: row.get(4)?,
    })
}

pub fn create_user(db: &Database, user: CreateUser) -> Result<User> {
    if user.name.trim().is_empty() || user.email.trim().is_empty() {
        return Err(Error::InvalidInput(
            "'name' and 'email' are required".to_string(),
        ));
    }

    db.write_tx(|tx| {
        tx.execute(
            "INSERT INTO users (name, email, role, active) VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params![
                user.name,
                user.email,
                user.role.unwrap_or(UserRole::Staff),
                user.active.unwrap_or(true)
            ],
        )
        .map_err(|e| {
            if is_unique_violation(&e) {
                Error::Conflict(format!("User with email '{}' already exists", user.email))
            } else {
                e.into()
            }
        })?;

        let id = tx.last_insert_rowid();
        let mut stmt =
            tx.prepare("SELECT id, name, email, role, active FROM users WHERE id = ?1")?;
        stmt.query_row([id], user_from_row).map_err(Into::into)
    })
}

pub fn list_users(db: &Database) -> Result<Vec<User>> {
    db.read(|conn| {
        let mut stmt =
            conn.prepare("SELECT id, name, email, role, active FROM users ORDER BY id DESC")?;

        let users = stmt
            .query_map([], user_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(users)
    })
}
