//! Application error taxonomy and HTTP response mapping.
//!
//! Every error carries a machine-readable `code`, a human-readable `message`
//! and a JSON `details` payload. Cache failures never appear here: they are
//! absorbed at the cache boundary and degrade to miss/allow behavior.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::{Value, json};
use std::fmt;

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorInfo,
}

/// Serializable error payload embedded in JSON responses.
#[derive(Debug, Serialize)]
pub struct ErrorInfo {
    pub code: &'static str,
    pub message: String,
    pub details: Value,
}

/// Application-level error type returned by services and handlers.
///
/// Expired and absent links both map to [`AppError::NotFound`] with an
/// identical body, so a caller cannot distinguish the two cases.
#[derive(Debug)]
pub enum AppError {
    Validation { message: String, details: Value },
    NotFound { message: String, details: Value },
    DuplicateCode { message: String, details: Value },
    DuplicateAlias { message: String, details: Value },
    PasswordRequired { message: String, details: Value },
    Forbidden { message: String, details: Value },
    Unauthorized { message: String, details: Value },
    Internal { message: String, details: Value },
}

impl AppError {
    pub fn bad_request(message: impl Into<String>, details: Value) -> Self {
        Self::Validation {
            message: message.into(),
            details,
        }
    }

    pub fn not_found(message: impl Into<String>, details: Value) -> Self {
        Self::NotFound {
            message: message.into(),
            details,
        }
    }

    pub fn duplicate_code(message: impl Into<String>, details: Value) -> Self {
        Self::DuplicateCode {
            message: message.into(),
            details,
        }
    }

    pub fn duplicate_alias(message: impl Into<String>, details: Value) -> Self {
        Self::DuplicateAlias {
            message: message.into(),
            details,
        }
    }

    pub fn password_required() -> Self {
        Self::PasswordRequired {
            message: "Password required".to_string(),
            details: json!({ "requires_password": true }),
        }
    }

    pub fn forbidden(message: impl Into<String>, details: Value) -> Self {
        Self::Forbidden {
            message: message.into(),
            details,
        }
    }

    pub fn unauthorized(message: impl Into<String>, details: Value) -> Self {
        Self::Unauthorized {
            message: message.into(),
            details,
        }
    }

    pub fn internal(message: impl Into<String>, details: Value) -> Self {
        Self::Internal {
            message: message.into(),
            details,
        }
    }

    /// Stable machine-readable code for this error kind.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "validation_error",
            Self::NotFound { .. } => "not_found",
            Self::DuplicateCode { .. } => "duplicate_code",
            Self::DuplicateAlias { .. } => "duplicate_alias",
            Self::PasswordRequired { .. } => "password_required",
            Self::Forbidden { .. } => "forbidden",
            Self::Unauthorized { .. } => "unauthorized",
            Self::Internal { .. } => "internal_error",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::Validation { .. } => StatusCode::BAD_REQUEST,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::DuplicateCode { .. } | Self::DuplicateAlias { .. } => StatusCode::CONFLICT,
            Self::PasswordRequired { .. } | Self::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            Self::Forbidden { .. } => StatusCode::FORBIDDEN,
            Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn into_parts(self) -> (&'static str, String, Value) {
        let code = self.code();
        match self {
            Self::Validation { message, details }
            | Self::NotFound { message, details }
            | Self::DuplicateCode { message, details }
            | Self::DuplicateAlias { message, details }
            | Self::PasswordRequired { message, details }
            | Self::Forbidden { message, details }
            | Self::Unauthorized { message, details }
            | Self::Internal { message, details } => (code, message, details),
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let message = match self {
            Self::Validation { message, .. }
            | Self::NotFound { message, .. }
            | Self::DuplicateCode { message, .. }
            | Self::DuplicateAlias { message, .. }
            | Self::PasswordRequired { message, .. }
            | Self::Forbidden { message, .. }
            | Self::Unauthorized { message, .. }
            | Self::Internal { message, .. } => message,
        };
        write!(f, "{}: {}", self.code(), message)
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (code, message, details) = self.into_parts();

        let body = ErrorBody {
            error: ErrorInfo {
                code,
                message,
                details,
            },
        };

        (status, Json(body)).into_response()
    }
}

/// Maps database errors to the application taxonomy.
///
/// Unique violations on the `urls` table surface as distinct duplicate kinds
/// so callers can retry generated codes and reject user-chosen aliases.
/// Everything else is an internal error with the cause logged, never echoed.
impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        if let Some(db) = e.as_database_error()
            && db.is_unique_violation()
        {
            return match db.constraint() {
                Some("urls_short_code_key") => AppError::duplicate_code(
                    "Short code already exists",
                    json!({ "constraint": "urls_short_code_key" }),
                ),
                Some("urls_custom_alias_key") => AppError::duplicate_alias(
                    "Custom alias already exists",
                    json!({ "constraint": "urls_custom_alias_key" }),
                ),
                constraint => AppError::internal(
                    "Unique constraint violation",
                    json!({ "constraint": constraint }),
                ),
            };
        }

        tracing::error!("Database error: {}", e);
        AppError::internal("Database error", json!({}))
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(e: validator::ValidationErrors) -> Self {
        let fields: Vec<String> = e.field_errors().keys().map(|k| k.to_string()).collect();
        AppError::bad_request("Validation error", json!({ "fields": fields }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            AppError::bad_request("bad", json!({})).code(),
            "validation_error"
        );
        assert_eq!(AppError::password_required().code(), "password_required");
        assert_eq!(
            AppError::duplicate_alias("taken", json!({})).code(),
            "duplicate_alias"
        );
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            AppError::not_found("gone", json!({})).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::duplicate_code("dup", json!({})).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::password_required().status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::forbidden("no", json!({})).status(),
            StatusCode::FORBIDDEN
        );
    }

    #[test]
    fn test_display_includes_code() {
        let err = AppError::not_found("Short link not found", json!({}));
        assert!(err.to_string().contains("not_found"));
        assert!(err.to_string().contains("Short link not found"));
    }
}

