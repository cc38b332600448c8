//! Error types for the Publikator server
//!
//! All errors use thiserror for structured error handling.
//! Domain errors are rendered to clients as JSON envelopes; infrastructure
//! errors are logged and reported as a generic server fault.

use crate::forms::FieldErrors;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

pub const NO_QUESTION: &str = "Questions are required. No questions provided";

pub const UNKNOWN_TARGET: &str = "Attempt to create reference to non-existent target.";

pub const ANSWER_TWICE: &str = "Unable to answer twice";

/// Field errors reported to the client.
///
/// `Fields` is used when a single form failed; `PerItem` keeps one entry per
/// submitted item (question, condition, choice, answer) in submission order,
/// with empty entries for the items that were valid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ErrorList {
    Fields(FieldErrors),
    PerItem(Vec<FieldErrors>),
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON: {0}")]
    InvalidJson(String),

    #[error("Validation failed")]
    Validation(ErrorList),

    #[error("{}", NO_QUESTION)]
    NoQuestions,

    #[error("Missing answer for question #{0}")]
    MissingAnswer(i64),

    #[error("{}", UNKNOWN_TARGET)]
    UnknownTarget,

    #[error("{}", ANSWER_TWICE)]
    DuplicateSubmission,

    #[error("{0} not found")]
    NotFound(String),

    #[error("Authentication required")]
    Unauthenticated,

    #[error("Permission denied: {0}")]
    Forbidden(String),

    #[error("{0}")]
    Generic(String),
}

impl AppError {
    pub fn fields(errors: FieldErrors) -> Self {
        AppError::Validation(ErrorList::Fields(errors))
    }

    pub fn per_item(errors: Vec<FieldErrors>) -> Self {
        AppError::Validation(ErrorList::PerItem(errors))
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidJson(_)
            | AppError::Validation(_)
            | AppError::NoQuestions
            | AppError::MissingAnswer(_)
            | AppError::UnknownTarget
            | AppError::DuplicateSubmission => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Unauthenticated => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Database(_) | AppError::Io(_) | AppError::Generic(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::InvalidJson(err.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        let body = match &self {
            AppError::Validation(errors) => {
                tracing::debug!("Rejected request with field errors: {:?}", errors);
                json!({ "success": false, "errors": errors })
            }
            AppError::Database(_) | AppError::Io(_) | AppError::Generic(_) => {
                tracing::error!("Request failed: {}", self);
                json!({ "success": false, "error": "Internal server error" })
            }
            _ => {
                tracing::debug!("Rejected request: {}", self);
                json!({ "success": false, "error": self.to_string() })
            }
        };

        (status, Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
