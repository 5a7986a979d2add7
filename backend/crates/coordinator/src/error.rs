//! Coordinator Error Types
//!
//! This module provides coordinator-specific error variants that integrate
//! with the unified `kernel::error::AppError` system.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use kernel::error::{app_error::AppError, kind::ErrorKind};
use platform::archive::ArchiveError;
use reputation::ReputationError;
use thiserror::Error;

/// Coordinator-specific result type alias
pub type JobResult<T> = Result<T, JobError>;

/// Coordinator-specific error variants
#[derive(Debug, Error)]
pub enum JobError {
    /// Friend code unparseable, out of range, or checksum mismatch
    #[error("Invalid friend code")]
    InvalidFriendCode,

    /// Identifier is not 32 hexadecimal characters
    #[error("Invalid id0")]
    InvalidId0,

    /// Identifier looks like an id1 (SD card CID)
    #[error("Identifier could be an id1")]
    CouldBeId1,

    /// part1 blob undecodable, too short, or with an empty LFCS
    #[error("Invalid part1: {0}")]
    InvalidPart1(&'static str),

    /// LFCS reported by the bot is missing or not hex
    #[error("Invalid LFCS")]
    InvalidLfcs,

    /// Uploaded result has the wrong shape
    #[error("Invalid upload: {0}")]
    InvalidUpload(String),

    /// Query parameter missing or not one of the accepted values
    #[error("Invalid parameter: {0}")]
    InvalidParameter(&'static str),

    /// No device matches
    #[error("Device not found")]
    DeviceNotFound,

    /// Device exists but lacks the requested data
    #[error("Device has no {0}")]
    NotReady(&'static str),

    /// Caller is not the configured bot
    #[error("Caller is not the trusted bot")]
    UntrustedBot,

    /// Event not allowed in the device's current stage
    #[error("Cannot apply {event} to a device in stage {stage}")]
    Transition {
        stage: &'static str,
        event: &'static str,
    },

    /// Device changed since it was read
    #[error("Device was modified concurrently")]
    Conflict,

    /// Caller does not hold a live lease on the device
    #[error("Caller does not hold the lease")]
    NotLeaseHolder,

    /// Database error
    #[error("Database error: {0}")]
    Store(#[from] sqlx::Error),

    /// Reputation ledger error
    #[error("Reputation error: {0}")]
    Reputation(#[from] ReputationError),

    /// msed archive error
    #[error("Archive error: {0}")]
    Archive(#[from] ArchiveError),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl JobError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            JobError::InvalidFriendCode
            | JobError::InvalidId0
            | JobError::CouldBeId1
            | JobError::InvalidPart1(_)
            | JobError::InvalidLfcs
            | JobError::InvalidUpload(_)
            | JobError::InvalidParameter(_) => StatusCode::BAD_REQUEST,
            JobError::DeviceNotFound | JobError::NotReady(_) => StatusCode::NOT_FOUND,
            JobError::UntrustedBot => StatusCode::FORBIDDEN,
            JobError::Transition { .. } | JobError::Conflict | JobError::NotLeaseHolder => {
                StatusCode::CONFLICT
            }
            JobError::Store(_)
            | JobError::Reputation(_)
            | JobError::Archive(_)
            | JobError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the ErrorKind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            JobError::InvalidFriendCode
            | JobError::InvalidId0
            | JobError::CouldBeId1
            | JobError::InvalidPart1(_)
            | JobError::InvalidLfcs
            | JobError::InvalidUpload(_)
            | JobError::InvalidParameter(_) => ErrorKind::BadRequest,
            JobError::DeviceNotFound | JobError::NotReady(_) => ErrorKind::NotFound,
            JobError::UntrustedBot => ErrorKind::Forbidden,
            JobError::Transition { .. } | JobError::Conflict | JobError::NotLeaseHolder => {
                ErrorKind::Conflict
            }
            JobError::Store(_)
            | JobError::Reputation(_)
            | JobError::Archive(_)
            | JobError::Internal(_) => ErrorKind::InternalServerError,
        }
    }

    /// Convert to AppError
    pub fn to_app_error(&self) -> AppError {
        AppError::new(self.kind(), self.to_string())
    }

    /// Log and render with a protocol reply other than `error`
    pub fn reply_with(self, reply: &'static str) -> Response {
        self.log();
        self.to_app_error().with_reply(reply).into_response()
    }

    /// Log the error with appropriate level
    pub fn log(&self) {
        match self {
            JobError::Store(e) => {
                tracing::error!(error = %e, "Coordinator database error");
            }
            JobError::Reputation(e) => {
                tracing::error!(error = %e, "Reputation ledger error");
            }
            JobError::Archive(e) => {
                tracing::error!(error = %e, "msed archive error");
            }
            JobError::Internal(msg) => {
                tracing::error!(message = %msg, "Coordinator internal error");
            }
            JobError::UntrustedBot => {
                tracing::warn!("Bot endpoint called by untrusted identity");
            }
            JobError::InvalidUpload(reason) => {
                tracing::warn!(reason = %reason, "Rejected upload");
            }
            _ => {
                tracing::debug!(error = %self, "Coordinator error");
            }
        }
    }
}

impl IntoResponse for JobError {
    fn into_response(self) -> Response {
        self.log();
        self.to_app_error().into_response()
    }
}

impl From<AppError> for JobError {
    fn from(err: AppError) -> Self {
        JobError::Internal(err.to_string())
    }
}
