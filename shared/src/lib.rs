//! Shared utilities and common types for the verification code service
//!
//! This crate provides common functionality used across all workspace modules:
//! - Configuration types
//! - Error codes and response structures
//! - Utility functions (sanitization, masking, logging setup)

pub mod config;
pub mod errors;
pub mod utils;

// Re-export commonly used items at crate root
pub use config::{
    CacheConfig, Environment, LogFormat, LoggingConfig, VerificationConfig,
};
pub use errors::{error_codes, ErrorResponse, IntoErrorResponse};
pub use utils::{logging, validation};
