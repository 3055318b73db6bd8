// src/error.rs

use std::fmt;

/// Global Application Error Enum.
/// Centralizes the failure taxonomy of exam sessions and their storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppError {
    // Exam (or attempt) does not exist. Fatal to a session.
    NotFound(String),

    // Malformed exam definition or rejected value.
    InvalidInput(String),

    // A submitted attempt already exists for (exam, student).
    Conflict(String),

    // The Result Store write did not succeed. Non-fatal to a session.
    PersistenceFailure(String),

    // Environment configuration could not be parsed.
    Config(String),

    // Database or serialization fault.
    InternalServerError(String),
}

impl AppError {
    /// Fatal errors end a session before it reaches IN_PROGRESS.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, AppError::PersistenceFailure(_))
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::NotFound(msg) => write!(f, "not found: {}", msg),
            AppError::InvalidInput(msg) => write!(f, "invalid input: {}", msg),
            AppError::Conflict(msg) => write!(f, "conflict: {}", msg),
            AppError::PersistenceFailure(msg) => write!(f, "persistence failure: {}", msg),
            AppError::Config(msg) => write!(f, "configuration error: {}", msg),
            AppError::InternalServerError(msg) => write!(f, "internal error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

/// Converts `sqlx::Error` into `AppError::InternalServerError`.
/// Allows using `?` operator on database queries.
impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::InternalServerError(err.to_string())
    }
}

impl From<sqlx::migrate::MigrateError> for AppError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        AppError::InternalServerError(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::InvalidInput(err.to_string())
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::InvalidInput(err.to_string())
    }
}
