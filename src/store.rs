//! Errors shared by the Postgres-backed stores.

/// Errors that can occur while reading or writing users and transactions.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The email used to create the user is already in use.
    #[error("the email is already in use")]
    DuplicateEmail,

    /// A row could not be turned into a domain value (e.g. an unknown transaction type).
    #[error("invalid row: {0}")]
    InvalidRow(String),

    /// An unhandled/unexpected SQL error.
    #[error("database error: {0}")]
    Database(sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(value: sqlx::Error) -> Self {
        match value {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                match db.constraint() {
                    Some(c) if c.contains("email") => StoreError::DuplicateEmail,
                    _ => StoreError::Database(value),
                }
            }
            other => StoreError::Database(other),
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;
