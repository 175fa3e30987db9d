use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use common::forms::{FieldErrors, field_errors};
use sea_orm::{DbErr, SqlErr};
use thiserror::Error;
use tracing::{error, warn};
use validator::ValidationErrors;

use crate::schemas::ErrorResponse;

/// Key for validation errors that belong to the form as a whole.
pub const NON_FIELD_ERRORS: &str = "__all__";

pub const FIELD_REQUIRED: &str = "This field is required.";

/// Errors surfaced by the HTTP handlers
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from the database operations
    #[error("Database error: {0}")]
    Database(#[from] DbErr),

    /// Submitted form did not validate; nothing was written
    #[error("Invalid form data")]
    Validation(FieldErrors),

    #[error("{entity} with id {id} does not exist")]
    NotFound { entity: &'static str, id: i32 },

    #[error("Please enter a correct username and password. Note that both fields may be case-sensitive.")]
    InvalidCredentials,

    #[error("Password hashing error: {0}")]
    PasswordHash(String),
}

impl AppError {
    /// A validation error on a single field.
    pub fn field(field: &str, message: impl Into<String>) -> Self {
        let mut errors = FieldErrors::new();
        errors.insert(field.to_string(), vec![message.into()]);
        AppError::Validation(errors)
    }

    pub fn not_found(entity: &'static str, id: i32) -> Self {
        AppError::NotFound { entity, id }
    }

    fn code(&self) -> &'static str {
        match self {
            AppError::Database(_) => "DATABASE_ERROR",
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::NotFound { .. } => "NOT_FOUND",
            AppError::InvalidCredentials => "INVALID_CREDENTIALS",
            AppError::PasswordHash(_) => "PASSWORD_HASH_ERROR",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::InvalidCredentials => StatusCode::BAD_REQUEST,
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::Database(_) | AppError::PasswordHash(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        AppError::Validation(field_errors(&errors))
    }
}

/// Body rejections become form errors. A missing field is reported under its
/// own name; anything else (bad JSON, wrong types) under `__all__`.
impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        let detail = rejection.body_text();
        match missing_field(&detail) {
            Some(field) => AppError::field(field, FIELD_REQUIRED),
            None => AppError::field(NON_FIELD_ERRORS, detail),
        }
    }
}

/// Field name out of serde's "missing field `name`" message.
fn missing_field(detail: &str) -> Option<&str> {
    let rest = &detail[detail.find("missing field `")? + "missing field `".len()..];
    rest.split('`').next().filter(|field| !field.is_empty())
}

impl From<argon2::password_hash::Error> for AppError {
    fn from(error: argon2::password_hash::Error) -> Self {
        AppError::PasswordHash(error.to_string())
    }
}

/// True when the database refused a write because of a unique index.
pub fn is_unique_violation(error: &DbErr) -> bool {
    matches!(error.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("Request failed: {}", self);
        } else {
            warn!("Request rejected: {}", self);
        }

        let code = self.code().to_string();
        let (error, field_errors) = match self {
            AppError::Validation(errors) => ("Invalid form data".to_string(), Some(errors)),
            AppError::InvalidCredentials => {
                let message = AppError::InvalidCredentials.to_string();
                let mut errors = FieldErrors::new();
                errors.insert(NON_FIELD_ERRORS.to_string(), vec![message.clone()]);
                (message, Some(errors))
            }
            AppError::Database(_) => ("Internal server error".to_string(), None),
            other => (other.to_string(), None),
        };

        let body = ErrorResponse {
            error,
            code,
            success: false,
            field_errors,
        };
        (status, Json(body)).into_response()
    }
}
