//! Error conversions - From implementations for common error types
//!
//! Provides automatic conversion from common error types to [`AppError`].

use super::app_error::AppError;
use super::kind::ErrorKind;

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        if err.is_syntax() || err.is_data() {
            AppError::bad_request(format!("JSON parse error: {}", err)).with_source(err)
        } else {
            AppError::internal("JSON serialization error").with_source(err)
        }
    }
}

// ============================================================================
// SQLx conversions (feature-gated)
// ============================================================================

/// Classify a database error without consuming it.
///
/// Constraint violations become client errors so that a racing duplicate
/// insert surfaces as `Conflict` instead of a 500.
/// https://www.postgresql.org/docs/current/errcodes-appendix.html
#[cfg(feature = "sqlx")]
pub fn sqlx_error_kind(err: &sqlx::Error) -> (ErrorKind, &'static str) {
    match err {
        sqlx::Error::RowNotFound => (ErrorKind::NotFound, "Record not found"),
        sqlx::Error::PoolTimedOut => (
            ErrorKind::ServiceUnavailable,
            "Database connection pool exhausted",
        ),
        sqlx::Error::Io(_) => (ErrorKind::ServiceUnavailable, "Database connection error"),
        sqlx::Error::Database(db_err) => match db_err.code().as_deref() {
            // Class 23 - Integrity Constraint Violation
            Some("23000") => (ErrorKind::Conflict, "Integrity constraint violation"),
            Some("23001") => (ErrorKind::Conflict, "Restrict violation"),
            Some("23502") => (ErrorKind::BadRequest, "Required field is null"),
            Some("23503") => (ErrorKind::Conflict, "Referenced record does not exist"),
            Some("23505") => (ErrorKind::Conflict, "Duplicate key value"),
            Some("23514") => (ErrorKind::BadRequest, "Check constraint violation"),
            // Class 40 - Transaction Rollback
            Some("40001") | Some("40P01") => {
                (ErrorKind::Conflict, "Concurrent update, please retry")
            }
            Some("42501") => (ErrorKind::Forbidden, "Insufficient privilege"),
            Some("57P01") | Some("57P02") | Some("57P03") => {
                (ErrorKind::ServiceUnavailable, "Database unavailable")
            }
            _ => (ErrorKind::InternalServerError, "Database error"),
        },
        _ => (ErrorKind::InternalServerError, "Database error"),
    }
}

#[cfg(feature = "sqlx")]
impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        let (kind, message) = sqlx_error_kind(&err);
        AppError::new(kind, message).with_source(err)
    }
}

// ============================================================================
// Axum conversions (feature-gated)
// ============================================================================

#[cfg(feature = "axum")]
impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        use axum::Json;
        use axum::http::StatusCode;

        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        // RFC 7807 Problem Details for HTTP APIs
        let body = serde_json::json!({
            "type": format!("https://httpstatuses.io/{}", self.status_code()),
            "title": self.kind().as_str(),
            "status": self.status_code(),
            "detail": self.message(),
            "action": self.action(),
        });

        (status, Json(body)).into_response()
    }
}
