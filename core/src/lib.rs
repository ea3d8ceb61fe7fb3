//! # Verification Code Core
//!
//! Core business logic for issuing and validating short-lived, single-use
//! verification codes scoped to an entity, a service and a communication
//! channel. This crate contains the record model, key derivation, the store
//! contract, and the issuance and consumption flows.

pub mod domain;
pub mod errors;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::*;
pub use errors::*;
pub use services::*;
