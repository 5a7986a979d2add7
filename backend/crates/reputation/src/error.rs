//! Reputation Error Types
//!
//! This module provides reputation-specific error variants that integrate
//! with the unified `kernel::error::AppError` system.

use crate::domain::value_object::MinerNameError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use kernel::error::{app_error::AppError, kind::ErrorKind};
use thiserror::Error;

/// Reputation-specific result type alias
pub type ReputationResult<T> = Result<T, ReputationError>;

/// Body sent to banned identities
pub const BANNED_REPLY: &str = "Your network identity has been banned from this service.";

/// Reputation-specific error variants
#[derive(Debug, Error)]
pub enum ReputationError {
    /// `name` query parameter missing or blank
    #[error("Miner name not specified")]
    NameMissing,

    /// Name failed validation
    #[error("Invalid miner name: {0}")]
    NameInvalid(MinerNameError),

    /// Another identity owns the name
    #[error("Miner name already taken")]
    NameTaken,

    /// Identity is banned
    #[error("Identity is banned")]
    Banned,

    /// Database error
    #[error("Database error: {0}")]
    Store(#[from] sqlx::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ReputationError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            ReputationError::NameMissing | ReputationError::NameInvalid(_) => {
                StatusCode::BAD_REQUEST
            }
            ReputationError::NameTaken => StatusCode::CONFLICT,
            ReputationError::Banned => StatusCode::FORBIDDEN,
            ReputationError::Store(_) | ReputationError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Get the ErrorKind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            ReputationError::NameMissing | ReputationError::NameInvalid(_) => {
                ErrorKind::BadRequest
            }
            ReputationError::NameTaken => ErrorKind::Conflict,
            ReputationError::Banned => ErrorKind::Forbidden,
            ReputationError::Store(_) | ReputationError::Internal(_) => {
                ErrorKind::InternalServerError
            }
        }
    }

    /// Plain-text body written to the client
    pub fn reply(&self) -> &'static str {
        match self {
            ReputationError::NameMissing => "specify a name",
            ReputationError::NameTaken => "name taken",
            ReputationError::Banned => BANNED_REPLY,
            _ => "error",
        }
    }

    /// Convert to AppError
    pub fn to_app_error(&self) -> AppError {
        AppError::new(self.kind(), self.to_string()).with_reply(self.reply())
    }

    /// Log the error with appropriate level
    fn log(&self) {
        match self {
            ReputationError::Store(e) => {
                tracing::error!(error = %e, "Reputation database error");
            }
            ReputationError::Internal(msg) => {
                tracing::error!(message = %msg, "Reputation internal error");
            }
            ReputationError::Banned => {
                tracing::warn!("Request from banned identity rejected");
            }
            _ => {
                tracing::debug!(error = %self, "Reputation error");
            }
        }
    }
}

impl IntoResponse for ReputationError {
    fn into_response(self) -> Response {
        self.log();
        self.to_app_error().into_response()
    }
}

impl From<MinerNameError> for ReputationError {
    fn from(err: MinerNameError) -> Self {
        match err {
            MinerNameError::Empty => ReputationError::NameMissing,
            other => ReputationError::NameInvalid(other),
        }
    }
}

impl From<AppError> for ReputationError {
    fn from(err: AppError) -> Self {
        ReputationError::Internal(err.to_string())
    }
}
