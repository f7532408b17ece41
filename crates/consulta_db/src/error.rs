//! Error types for the database client

use consulta_common::{ConsultaError, HttpStatusCode};
use thiserror::Error;

/// Errors that can occur when working with the database client
#[derive(Debug, Error)]
pub enum DbError {
    /// Error from SQLx
    #[error("Database error: {0}")]
    SqlxError(#[from] sqlx::Error),

    /// Error with the database configuration
    #[error("Database configuration error: {0}")]
    ConfigError(String),

    /// Error with database URL parsing
    #[error("Database URL error: {0}")]
    UrlError(String),

    /// Error with database pool creation
    #[error("Database pool error: {0}")]
    PoolError(String),

    /// Error with database query
    #[error("Database query error: {0}")]
    QueryError(String),

    /// Error with database transaction
    #[error("Database transaction error: {0}")]
    TransactionError(String),

    /// A stored value could not be mapped back into a domain record
    #[error("Corrupt row in {table}: {message}")]
    CorruptRow { table: &'static str, message: String },
}

impl From<DbError> for ConsultaError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::ConfigError(msg) | DbError::UrlError(msg) => ConsultaError::ConfigError(msg),
            other => ConsultaError::DatabaseError(other.to_string()),
        }
    }
}

impl HttpStatusCode for DbError {
    fn status_code(&self) -> u16 {
        500
    }
}

/// Whether a sqlx error is a unique/primary key violation.
///
/// SQLite and Postgres both report it through the error kind; the message
/// check covers drivers that do not classify extended result codes.
pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => {
            db_err.is_unique_violation()
                || db_err.message().contains("UNIQUE constraint failed")
                || db_err.message().contains("duplicate key value")
        }
        _ => false,
    }
}
