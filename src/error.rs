use std::sync::atomic::{AtomicBool, Ordering};

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AppError>;

/// When set, 500 responses carry the underlying error message instead of a
/// generic one. Enabled from config for development deployments only.
static EXPOSE_ERRORS: AtomicBool = AtomicBool::new(false);

pub fn set_expose_errors(expose: bool) {
    EXPOSE_ERRORS.store(expose, Ordering::Relaxed);
}

#[derive(Debug, Clone, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Duplicate {field}")]
    Duplicate { field: String },

    #[error("Validation failed")]
    Validation(Vec<FieldError>),

    #[error("Too many requests: {0}")]
    TooManyRequests(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // 4xx failures are the client's fault ("fail"), 5xx ours ("error").
        let (status, body) = match self {
            AppError::Database(ref msg) => {
                tracing::error!("Database error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "status": "error", "message": exposed_or(msg, "Database error occurred") }),
                )
            }
            AppError::NotFound(msg) => (
                StatusCode::NOT_FOUND,
                json!({ "status": "fail", "message": msg }),
            ),
            AppError::Unauthorized(msg) => (
                StatusCode::UNAUTHORIZED,
                json!({ "status": "fail", "message": msg }),
            ),
            AppError::Forbidden(msg) => (
                StatusCode::FORBIDDEN,
                json!({ "status": "fail", "message": msg }),
            ),
            AppError::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                json!({ "status": "fail", "message": msg }),
            ),
            AppError::Duplicate { field } => (
                StatusCode::BAD_REQUEST,
                json!({
                    "status": "fail",
                    "message": format!("Duplicate {}. Please use another value.", field),
                }),
            ),
            AppError::Validation(errors) => {
                let joined = errors
                    .iter()
                    .map(|e| e.message.as_str())
                    .collect::<Vec<_>>()
                    .join(". ");
                (
                    StatusCode::BAD_REQUEST,
                    json!({
                        "status": "fail",
                        "message": format!("Invalid input data: {}", joined),
                        "errors": errors,
                    }),
                )
            }
            AppError::TooManyRequests(msg) => (
                StatusCode::TOO_MANY_REQUESTS,
                json!({ "status": "fail", "message": msg }),
            ),
            AppError::Internal(ref msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "status": "error", "message": exposed_or(msg, "Internal server error") }),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

fn exposed_or(detail: &str, generic: &'static str) -> String {
    if EXPOSE_ERRORS.load(Ordering::Relaxed) {
        detail.to_string()
    } else {
        generic.to_string()
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(ref db_err) = err {
            if db_err.is_unique_violation() {
                // SQLite reports "UNIQUE constraint failed: students.email";
                // surface the column under its API (camelCase) name.
                let message = db_err.message().to_string();
                let field = message
                    .rsplit('.')
                    .next()
                    .map(str::trim)
                    .unwrap_or("value");
                return AppError::Duplicate {
                    field: snake_to_camel(field),
                };
            }
        }
        AppError::Database(err.to_string())
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields = Vec::new();
        for (field, errs) in errors.field_errors() {
            for err in errs {
                let message = err
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("{} is invalid", field));
                fields.push(FieldError {
                    field: snake_to_camel(&field),
                    message,
                });
            }
        }
        AppError::Validation(fields)
    }
}

fn snake_to_camel(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    let mut upper_next = false;
    for ch in field.chars() {
        if ch == '_' {
            upper_next = true;
        } else if upper_next {
            out.extend(ch.to_uppercase());
            upper_next = false;
        } else {
            out.push(ch);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snake_to_camel() {
        assert_eq!(snake_to_camel("reg_number"), "regNumber");
        assert_eq!(snake_to_camel("email"), "email");
        assert_eq!(snake_to_camel("is_membership_active"), "isMembershipActive");
    }
}
