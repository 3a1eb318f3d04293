//! Error type shared by both store backends.
//!
//! The store surfaces only the failures handlers act on: a missing row, a
//! uniqueness conflict (a duplicate email in practice), and a broken
//! reference such as assigning a role that does not exist. Everything else
//! is carried opaquely and becomes a 500 at the API boundary.

use thiserror::Error;

/// Storage failure, categorized as far as callers care
#[derive(Error, Debug)]
pub enum DbError {
    /// No row matched the given identifier
    #[error("Entity not found")]
    NotFound,

    /// Unique constraint violation
    #[error("Unique constraint violation")]
    UniqueViolation {
        constraint: Option<String>,
        table: Option<String>,
        message: String,
    },

    /// Foreign key constraint violation
    #[error("Foreign key constraint violation")]
    ForeignKeyViolation {
        constraint: Option<String>,
        table: Option<String>,
        message: String,
    },

    /// Anything the caller cannot recover from
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        if matches!(err, sqlx::Error::RowNotFound) {
            return DbError::NotFound;
        }

        // Constraint violations keep enough detail for the API layer to name
        // the conflicting resource without echoing driver internals.
        if let sqlx::Error::Database(ref db_err) = err {
            let constraint = db_err.constraint().map(str::to_string);
            let table = db_err.table().map(str::to_string);
            let message = db_err.message().to_string();

            if db_err.is_unique_violation() {
                return DbError::UniqueViolation { constraint, table, message };
            }
            if db_err.is_foreign_key_violation() {
                return DbError::ForeignKeyViolation { constraint, table, message };
            }
        }

        DbError::Other(anyhow::Error::from(err))
    }
}

/// Type alias for store operation results
pub type Result<T> = std::result::Result<T, DbError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_not_found_maps_to_not_found() {
        assert!(matches!(DbError::from(sqlx::Error::RowNotFound), DbError::NotFound));
    }

    #[test]
    fn test_unclassified_errors_stay_opaque() {
        let err = DbError::from(sqlx::Error::PoolTimedOut);
        assert!(matches!(err, DbError::Other(_)));
    }
}
