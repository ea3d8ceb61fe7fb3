//! Verification code service module
//!
//! This module provides the verification code lifecycle:
//! - Code generation from a configured charset
//! - Cooldown enforcement between issuances for the same key pair
//! - Consumption with expiry and fail-count checks
//! - Fail-count tracking and background cleanup of consumed codes

mod context;
mod generator;
mod service;
mod traits;
mod types;

#[cfg(test)]
mod tests;

pub use context::{BackgroundTasks, RequestContext};
pub use generator::SecureCodeGenerator;
pub use service::VerificationService;
pub use traits::{CodeGenerator, VerificationStore};
pub use types::{CheckCodeRequest, CreateCodeRequest, IssueOutcome, IssuedCode};
