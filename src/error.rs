//! Error types shared by all commands.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid {field} '{value}': use YYYY-MM-DD")]
    InvalidDate { field: &'static str, value: String },

    #[error("{entity} with ID {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    #[error("Car with ID {car_id} is not available for the selected dates")]
    CarUnavailable { car_id: i64 },

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    InvalidState(String),

    #[error("Internal error: {0}")]
    Internal(String),

    // Display stays generic so storage-engine detail never reaches callers;
    // the From impl below logs the underlying error before wrapping it.
    #[error("Internal storage error")]
    Storage(#[source] rusqlite::Error),
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        tracing::error!(error = %err, "storage operation failed");
        Error::Storage(err)
    }
}

/// True when the error is a UNIQUE constraint violation. Callers that know
/// which column is constrained use this to report a `Conflict` with context
/// instead of a bare storage error.
pub(crate) fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

pub type Result<T> = std::result::Result<T, Error>;
