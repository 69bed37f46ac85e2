//! Storage operation errors and their mapping to the application taxonomy.
//!
//! SQLx errors are mapped as follows:
//!
//! | SQLx error | Postgres code | StorageError | Scenario |
//! |------------|---------------|--------------|----------|
//! | Database (unique violation) | `23505` | `Conflict` | Duplicate value in a unique column |
//! | PoolTimedOut | N/A | `Exhausted` | Pool at max size past the acquire timeout |
//! | RowNotFound | N/A | `NotFound` | Expected row missing |
//! | anything else | any | `Backend` | Connectivity loss, protocol errors, bad SQL |

use thiserror::Error;

use finpuls_core::AppError;

/// Infrastructure-level persistence failure.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Caller passed an argument the facade rejects before touching the
    /// database (nil id, unknown field name, mismatched value type).
    #[error("invalid {field}: {message}")]
    InvalidArgument { field: &'static str, message: String },

    /// No row matched where one was required.
    #[error("{0}")]
    NotFound(String),

    /// A unique constraint rejected the write.
    #[error("unique constraint violated: {0}")]
    Conflict(String),

    /// The unit's connection pool stayed exhausted past the bounded
    /// acquire timeout.
    #[error("connection pool exhausted during {0}")]
    Exhausted(String),

    /// Any other backend failure.
    #[error("storage backend error during {operation}")]
    Backend {
        operation: &'static str,
        #[source]
        source: sqlx::Error,
    },
}

impl StorageError {
    pub fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidArgument { field, message: message.into() }
    }
}

/// Map a raw sqlx error for `operation` into the storage taxonomy.
pub(crate) fn map_sqlx_error(operation: &'static str, err: sqlx::Error) -> StorageError {
    match &err {
        sqlx::Error::PoolTimedOut => StorageError::Exhausted(operation.to_string()),
        sqlx::Error::RowNotFound => StorageError::NotFound(operation.to_string()),
        sqlx::Error::Database(db) if db.code().as_deref() == Some("23505") => {
            StorageError::Conflict(db.message().to_string())
        }
        _ => StorageError::Backend { operation, source: err },
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::InvalidArgument { field, message } => AppError::validation(field, message),
            StorageError::NotFound(message) => AppError::not_found(message),
            StorageError::Conflict(detail) => AppError::validation("unique", detail),
            other @ (StorageError::Exhausted(_) | StorageError::Backend { .. }) => {
                AppError::Internal(other.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_timeout_maps_to_exhausted() {
        let err = map_sqlx_error("find_all", sqlx::Error::PoolTimedOut);
        assert!(matches!(err, StorageError::Exhausted(_)));
    }

    #[test]
    fn invalid_argument_becomes_a_validation_error() {
        let app: AppError = StorageError::invalid("id", "must not be nil").into();
        assert_eq!(app.code(), "VALIDATION_ERROR");
        assert_eq!(app.status(), 400);
    }

    #[test]
    fn not_found_keeps_its_kind() {
        let app: AppError = StorageError::NotFound("no row with id 42".into()).into();
        assert_eq!(app.code(), "NOT_FOUND");
        assert_eq!(app.status(), 404);
    }

    #[test]
    fn conflict_surfaces_as_validation_not_500() {
        let app: AppError = StorageError::Conflict("uk_subscription_plans_name".into()).into();
        assert_eq!(app.status(), 400);
    }

    #[test]
    fn backend_errors_degrade_to_internal() {
        let app: AppError = map_sqlx_error("save", sqlx::Error::WorkerCrashed).into();
        assert_eq!(app.code(), "INTERNAL_ERROR");
        assert_eq!(app.status(), 500);
    }
}
