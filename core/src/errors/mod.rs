//! Domain-specific error types and error handling.

use thiserror::Error;
use vc_shared::errors::{error_codes, ErrorResponse, IntoErrorResponse};

/// Errors reported by a verification store adapter
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Store connection failed: {0}")]
    Connection(String),

    #[error("Store command failed: {0}")]
    Command(String),

    #[error("Stored record is corrupt: {0}")]
    CorruptRecord(String),

    #[error("Invalid record update: {0}")]
    InvalidUpdate(String),
}

/// Core domain errors surfaced by the verification flows
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Invalid input for {field}: {message}")]
    InvalidInput { field: &'static str, message: String },

    #[error("Store unavailable: {0}")]
    StoreUnavailable(#[from] StoreError),

    #[error("Store did not acknowledge the write")]
    WriteNotAcknowledged,

    #[error("Secure random source failed: {message}")]
    RandomSource { message: String },
}

impl DomainError {
    pub fn invalid_input(field: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidInput {
            field,
            message: message.into(),
        }
    }

    /// Stable error code for callers
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidInput { .. } => error_codes::VALIDATION_ERROR,
            Self::StoreUnavailable(_) => error_codes::DATABASE_ERROR,
            Self::WriteNotAcknowledged => error_codes::DATABASE_WRITE_FAILED,
            Self::RandomSource { .. } => error_codes::INTERNAL_ERROR,
        }
    }
}

impl IntoErrorResponse for DomainError {
    fn to_error_response(&self) -> ErrorResponse {
        let response = ErrorResponse::new(self.error_code(), self.to_string());
        match self {
            Self::InvalidInput { field, .. } => response.with_field(*field),
            _ => response,
        }
    }
}

pub type DomainResult<T> = Result<T, DomainError>;
