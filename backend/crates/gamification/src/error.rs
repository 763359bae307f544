//! Gamification Error Types
//!
//! This module provides gamification-specific error variants that integrate
//! with the unified `kernel::error::AppError` system.

use axum::response::{IntoResponse, Response};
use kernel::error::conversions::sqlx_error_kind;
use kernel::error::{app_error::AppError, kind::ErrorKind};
use thiserror::Error;

/// Gamification-specific result type alias
pub type GamificationResult<T> = Result<T, GamificationError>;

/// Gamification-specific error variants
///
/// Each variant maps to one `ErrorKind`; persistence errors are classified by
/// SQLSTATE so constraint races surface as client errors.
#[derive(Debug, Error)]
pub enum GamificationError {
    #[error("Mission not found")]
    MissionNotFound,

    #[error("Task not found")]
    TaskNotFound,

    #[error("Quiz not found")]
    QuizNotFound,

    #[error("Submission not found")]
    SubmissionNotFound,

    #[error("Enrollment not found")]
    EnrollmentNotFound,

    #[error("User not found")]
    UserNotFound,

    /// Join target missing or inactive
    #[error("Mission is not available")]
    MissionUnavailable,

    #[error("You must join the mission first")]
    NotEnrolled,

    #[error("Already enrolled in this mission")]
    AlreadyEnrolled,

    #[error("Task already completed")]
    TaskAlreadyCompleted,

    #[error("Quiz already completed")]
    QuizAlreadyCompleted,

    #[error("Task already has a quiz")]
    QuizAlreadyExists,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl GamificationError {
    /// Get the ErrorKind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            GamificationError::MissionNotFound
            | GamificationError::TaskNotFound
            | GamificationError::QuizNotFound
            | GamificationError::SubmissionNotFound
            | GamificationError::EnrollmentNotFound
            | GamificationError::UserNotFound => ErrorKind::NotFound,
            GamificationError::MissionUnavailable | GamificationError::InvalidInput(_) => {
                ErrorKind::BadRequest
            }
            GamificationError::NotEnrolled => ErrorKind::Forbidden,
            GamificationError::AlreadyEnrolled
            | GamificationError::TaskAlreadyCompleted
            | GamificationError::QuizAlreadyCompleted
            | GamificationError::QuizAlreadyExists => ErrorKind::Conflict,
            GamificationError::Database(e) => sqlx_error_kind(e).0,
            GamificationError::Internal(_) => ErrorKind::InternalServerError,
        }
    }

    /// Client-facing form. Persistence and internal details stay in the logs.
    pub fn to_app_error(&self) -> AppError {
        match self {
            GamificationError::Database(e) => {
                let (kind, message) = sqlx_error_kind(e);
                AppError::new(kind, message)
            }
            GamificationError::Internal(_) => AppError::internal("Internal server error"),
            _ => AppError::new(self.kind(), self.to_string()),
        }
    }

    /// Log the error with appropriate level
    fn log(&self) {
        match self {
            GamificationError::Database(e) => {
                if self.kind().is_server_error() {
                    tracing::error!(error = %e, "Gamification database error");
                } else {
                    tracing::warn!(error = %e, "Gamification constraint violation");
                }
            }
            GamificationError::Internal(msg) => {
                tracing::error!(message = %msg, "Gamification internal error");
            }
            GamificationError::TaskAlreadyCompleted | GamificationError::QuizAlreadyCompleted => {
                tracing::warn!(error = %self, "Repeated completion attempt");
            }
            _ => {
                tracing::debug!(error = %self, "Gamification error");
            }
        }
    }
}

impl From<GamificationError> for AppError {
    fn from(err: GamificationError) -> Self {
        err.to_app_error()
    }
}

impl IntoResponse for GamificationError {
    fn into_response(self) -> Response {
        self.log();
        self.to_app_error().into_response()
    }
}
