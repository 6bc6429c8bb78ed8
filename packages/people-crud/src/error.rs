//! Store error types.

use thiserror::Error;

/// SQLSTATE codes the harness distinguishes.
pub mod sqlstate {
    pub const UNIQUE_VIOLATION: &str = "23505";
    pub const STRING_DATA_RIGHT_TRUNCATION: &str = "22001";
    pub const IN_FAILED_SQL_TRANSACTION: &str = "25P02";
    pub const UNDEFINED_TABLE: &str = "42P01";
    pub const DUPLICATE_TABLE: &str = "42P07";
}

/// Errors raised by a [`PeopleStore`](crate::store::PeopleStore).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Connection could not be established or was lost
    #[error("Connection error: {0}")]
    Connection(String),

    /// Invalid configuration value
    #[error("Configuration error: {0}")]
    Config(String),

    /// Uniqueness constraint rejected a write
    #[error("Constraint violation: {detail}")]
    ConstraintViolation {
        constraint: Option<String>,
        detail: String,
    },

    /// Text value longer than the column allows
    #[error("Value too long for column '{column}' (max {max} characters)")]
    ValueTooLong { column: String, max: usize },

    /// A previous statement failed and the transaction must be rolled back
    #[error("Current transaction is aborted, commands ignored until rollback")]
    TransactionAborted,

    /// Table does not exist
    #[error("Table '{0}' not found")]
    TableNotFound(String),

    /// Table already exists
    #[error("Table '{0}' already exists")]
    TableAlreadyExists(String),

    /// Store was closed
    #[error("Store is closed")]
    Closed,

    /// Any other database error
    #[error("Database error: {0}")]
    Database(String),
}

impl StoreError {
    /// Maps a SQLSTATE code and server message onto an error variant.
    pub fn from_sqlstate(code: Option<&str>, message: &str, constraint: Option<&str>) -> Self {
        match code {
            Some(sqlstate::UNIQUE_VIOLATION) => StoreError::ConstraintViolation {
                constraint: constraint.map(str::to_string),
                detail: message.to_string(),
            },
            Some(sqlstate::STRING_DATA_RIGHT_TRUNCATION) => StoreError::ValueTooLong {
                column: crate::sql::COL_NAME.to_string(),
                max: crate::record::MAX_NAME_LEN,
            },
            Some(sqlstate::IN_FAILED_SQL_TRANSACTION) => StoreError::TransactionAborted,
            Some(sqlstate::UNDEFINED_TABLE) => {
                StoreError::TableNotFound(crate::sql::TABLE.to_string())
            }
            Some(sqlstate::DUPLICATE_TABLE) => {
                StoreError::TableAlreadyExists(crate::sql::TABLE.to_string())
            }
            Some(code) => StoreError::Database(format!("{message} (SQLSTATE {code})")),
            None => StoreError::Database(message.to_string()),
        }
    }

    /// Returns true for the error the duplicate-index case expects.
    pub fn is_constraint_violation(&self) -> bool {
        matches!(self, StoreError::ConstraintViolation { .. })
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(db) => StoreError::from_sqlstate(
                db.code().as_deref(),
                db.message(),
                db.constraint(),
            ),
            sqlx::Error::Io(e) => StoreError::Connection(e.to_string()),
            sqlx::Error::Tls(e) => StoreError::Connection(e.to_string()),
            sqlx::Error::PoolTimedOut => {
                StoreError::Connection("timed out waiting for a connection".to_string())
            }
            sqlx::Error::PoolClosed => StoreError::Closed,
            sqlx::Error::Configuration(e) => StoreError::Config(e.to_string()),
            other => StoreError::Database(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;
