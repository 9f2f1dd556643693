//! Structured application errors.

use serde::Serialize;
use std::fmt;

/// Error codes for programmatic error handling.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Validation errors
    MissingRequiredField,
    InvalidFieldValue,
    AlreadyExists,

    // Not found errors
    TaskNotFound,
    CategoryNotFound,
    UserNotFound,

    // Authentication errors
    InvalidCredentials,

    // Internal errors
    DatabaseError,
    InternalError,
}

/// Broad category an error code falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Unauthenticated,
    Internal,
}

impl ErrorCode {
    pub fn kind(&self) -> ErrorKind {
        match self {
            // Category ids only ever arrive as submitted form values.
            ErrorCode::MissingRequiredField
            | ErrorCode::InvalidFieldValue
            | ErrorCode::AlreadyExists
            | ErrorCode::CategoryNotFound => ErrorKind::Validation,
            ErrorCode::TaskNotFound | ErrorCode::UserNotFound => ErrorKind::NotFound,
            ErrorCode::InvalidCredentials => ErrorKind::Unauthenticated,
            ErrorCode::DatabaseError | ErrorCode::InternalError => ErrorKind::Internal,
        }
    }
}

/// Structured application error.
#[derive(Debug, Serialize, thiserror::Error)]
#[error("{message}")]
pub struct AppError {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl AppError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            field: None,
        }
    }

    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    pub fn kind(&self) -> ErrorKind {
        self.code.kind()
    }

    // Convenience constructors

    pub fn missing_field(field: &str) -> Self {
        Self::new(
            ErrorCode::MissingRequiredField,
            format!("{} is required", field),
        )
        .with_field(field)
    }

    pub fn invalid_value(field: &str, reason: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidFieldValue, reason).with_field(field)
    }

    pub fn already_exists(field: &str, reason: impl Into<String>) -> Self {
        Self::new(ErrorCode::AlreadyExists, reason).with_field(field)
    }

    pub fn task_not_found(task_id: i64) -> Self {
        Self::new(
            ErrorCode::TaskNotFound,
            format!("Task not found: {}", task_id),
        )
    }

    pub fn category_not_found(category_id: i64) -> Self {
        Self::new(
            ErrorCode::CategoryNotFound,
            format!("Category not found: {}", category_id),
        )
        .with_field("categories")
    }

    pub fn user_not_found(username: &str) -> Self {
        Self::new(
            ErrorCode::UserNotFound,
            format!("User not found: {}", username),
        )
    }

    pub fn invalid_credentials() -> Self {
        Self::new(
            ErrorCode::InvalidCredentials,
            "Please enter a correct username and password.",
        )
    }

    pub fn database(err: impl fmt::Display) -> Self {
        Self::new(ErrorCode::DatabaseError, err.to_string())
    }

    pub fn internal(err: impl fmt::Display) -> Self {
        Self::new(ErrorCode::InternalError, err.to_string())
    }
}

// Allow using ? with anyhow errors by converting them
impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast::<AppError>() {
            Ok(app_err) => app_err,
            Err(err) => match err.downcast::<rusqlite::Error>() {
                Ok(db_err) => AppError::database(db_err),
                Err(err) => AppError::internal(err),
            },
        }
    }
}

impl From<rusqlite::Error> for AppError {
    fn from(err: rusqlite::Error) -> Self {
        AppError::database(err)
    }
}

/// Result type for application operations.
pub type AppResult<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anyhow_roundtrip_preserves_app_error() {
        let err: anyhow::Error = AppError::task_not_found(7).into();
        let back = AppError::from(err);
        assert_eq!(back.code, ErrorCode::TaskNotFound);
        assert_eq!(back.message, "Task not found: 7");
    }

    #[test]
    fn foreign_anyhow_errors_become_internal() {
        let back = AppError::from(anyhow::anyhow!("boom"));
        assert_eq!(back.code, ErrorCode::InternalError);
        assert_eq!(back.kind(), ErrorKind::Internal);
    }

    #[test]
    fn sqlite_errors_become_database_errors() {
        let err: anyhow::Error = rusqlite::Error::QueryReturnedNoRows.into();
        assert_eq!(AppError::from(err).code, ErrorCode::DatabaseError);
    }

    #[test]
    fn codes_map_to_kinds() {
        assert_eq!(AppError::missing_field("title").kind(), ErrorKind::Validation);
        assert_eq!(
            AppError::already_exists("username", "taken").kind(),
            ErrorKind::Validation
        );
        assert_eq!(AppError::category_not_found(3).kind(), ErrorKind::Validation);
        assert_eq!(AppError::task_not_found(3).kind(), ErrorKind::NotFound);
        assert_eq!(
            AppError::invalid_credentials().kind(),
            ErrorKind::Unauthenticated
        );
    }

    #[test]
    fn serializes_code_in_screaming_snake_case() {
        let json = serde_json::to_value(AppError::missing_field("title")).unwrap();
        assert_eq!(json["code"], "MISSING_REQUIRED_FIELD");
        assert_eq!(json["field"], "title");
        assert_eq!(json["message"], "title is required");
    }
}
