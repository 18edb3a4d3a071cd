use thiserror::Error;

/// Application-wide error type.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("database error: {0}")]
    Database(sqlx::Error),

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("provider error: {0}")]
    Provider(String),

    #[error("internal error: {0}")]
    Internal(anyhow::Error),
}

/// Convenience result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, AppError>;

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Database(err)
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AppError::NotFound("no transaction for TXN-1".to_string());
        assert_eq!(err.to_string(), "no transaction for TXN-1");

        let err = AppError::Provider("connection refused".to_string());
        assert_eq!(err.to_string(), "provider error: connection refused");
    }

    #[test]
    fn test_from_sqlx_error() {
        let err: AppError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, AppError::Database(_)));
    }
}
