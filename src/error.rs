//! Application error types

use serde::Serialize;
use thiserror::Error;

/// Application-wide error type
///
/// Nothing here is fatal to the process. Feed errors abort a refresh and keep
/// the previous values, `CodeNotFound` skips one holding, and `Validation` is
/// raised at the input boundary before anything reaches valuation.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Persistence error: {0}")]
    Persistence(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Price feed unavailable: {0}")]
    FeedUnavailable(String),

    #[error("Price feed payload malformed: {0}")]
    FeedParse(String),

    #[error("Unknown instrument code: {0}")]
    CodeNotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Stable machine-readable code for this error
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Persistence(_) => "PERSISTENCE_ERROR",
            AppError::Serialization(_) => "SERIALIZATION_ERROR",
            AppError::FeedUnavailable(_) => "FEED_UNAVAILABLE",
            AppError::FeedParse(_) => "FEED_PARSE_ERROR",
            AppError::CodeNotFound(_) => "CODE_NOT_FOUND",
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Config(_) => "CONFIG_ERROR",
            AppError::Io(_) => "IO_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

/// Serializable error response for `--json` output
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}

impl From<&AppError> for ErrorResponse {
    fn from(err: &AppError) -> Self {
        ErrorResponse {
            code: err.code().to_string(),
            message: err.to_string(),
        }
    }
}

impl From<AppError> for ErrorResponse {
    fn from(err: AppError) -> Self {
        ErrorResponse::from(&err)
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
