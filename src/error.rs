//! Error types for the catalogue server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Numeric error codes carried in every error body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ErrorCode {
    StorageFailure = 3,
    BookUnavailable = 7,
    DuplicateIsbn = 8,
    MissingField = 14,
    BadValue = 18,
    NoSuchData = 20,
}

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Missing field: {0}")]
    MissingField(String),

    #[error("Invalid field: {0}")]
    InvalidField(String),

    #[error("Duplicate ISBN: {0}")]
    DuplicateIsbn(String),

    #[error("Book unavailable: {0}")]
    BookUnavailable(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl AppError {
    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::NotFound(_) => ErrorCode::NoSuchData,
            AppError::MissingField(_) => ErrorCode::MissingField,
            AppError::InvalidField(_) => ErrorCode::BadValue,
            AppError::DuplicateIsbn(_) => ErrorCode::DuplicateIsbn,
            AppError::BookUnavailable(_) => ErrorCode::BookUnavailable,
            AppError::Storage(_) => ErrorCode::StorageFailure,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::MissingField(_) | AppError::InvalidField(_) => StatusCode::BAD_REQUEST,
            AppError::DuplicateIsbn(_) | AppError::BookUnavailable(_) => StatusCode::CONFLICT,
            AppError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Classify low-level storage errors into catalogue error kinds.
///
/// Constraint violations are turned into the business error they stand for;
/// anything else becomes `Storage` and is logged here so it never disappears.
impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        match &e {
            sqlx::Error::RowNotFound => AppError::NotFound("Record not found".to_string()),
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                AppError::DuplicateIsbn("A book with this ISBN already exists".to_string())
            }
            sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
                AppError::NotFound("Referenced book not found".to_string())
            }
            _ => {
                tracing::error!("Database error: {:?}", e);
                AppError::Storage(e.to_string())
            }
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(e: validator::ValidationErrors) -> Self {
        let fields = e
            .field_errors()
            .keys()
            .map(|k| k.to_string())
            .collect::<Vec<_>>();
        AppError::InvalidField(format!("Field too long: {}", fields.join(", ")))
    }
}

/// Error response body
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub code: u32,
    pub error: String,
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let code = self.code();
        let message = match &self {
            AppError::Storage(_) => "Storage error".to_string(),
            AppError::NotFound(msg)
            | AppError::MissingField(msg)
            | AppError::InvalidField(msg)
            | AppError::DuplicateIsbn(msg)
            | AppError::BookUnavailable(msg) => msg.clone(),
        };

        let body = Json(ErrorResponse {
            code: code as u32,
            error: format!("{:?}", code),
            message,
        });

        (self.status(), body).into_response()
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(AppError::NotFound("x".into()), StatusCode::NOT_FOUND, ErrorCode::NoSuchData)]
    #[case(AppError::MissingField("x".into()), StatusCode::BAD_REQUEST, ErrorCode::MissingField)]
    #[case(AppError::InvalidField("x".into()), StatusCode::BAD_REQUEST, ErrorCode::BadValue)]
    #[case(AppError::DuplicateIsbn("x".into()), StatusCode::CONFLICT, ErrorCode::DuplicateIsbn)]
    #[case(AppError::BookUnavailable("x".into()), StatusCode::CONFLICT, ErrorCode::BookUnavailable)]
    #[case(AppError::Storage("x".into()), StatusCode::INTERNAL_SERVER_ERROR, ErrorCode::StorageFailure)]
    fn error_kinds_map_to_http(
        #[case] err: AppError,
        #[case] status: StatusCode,
        #[case] code: ErrorCode,
    ) {
        assert_eq!(err.status(), status);
        assert_eq!(err.code(), code);
        assert_eq!(err.into_response().status(), status);
    }

    #[rstest]
    #[case(ErrorCode::StorageFailure, 3)]
    #[case(ErrorCode::BookUnavailable, 7)]
    #[case(ErrorCode::DuplicateIsbn, 8)]
    #[case(ErrorCode::MissingField, 14)]
    #[case(ErrorCode::BadValue, 18)]
    #[case(ErrorCode::NoSuchData, 20)]
    fn error_codes_are_stable(#[case] code: ErrorCode, #[case] value: u32) {
        assert_eq!(code as u32, value);
    }

    #[test]
    fn row_not_found_is_not_found() {
        let err: AppError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[test]
    fn pool_errors_are_storage_failures() {
        let err: AppError = sqlx::Error::PoolTimedOut.into();
        assert!(matches!(err, AppError::Storage(_)));
    }
}
