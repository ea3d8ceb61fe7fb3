//! Common utility functions

pub mod logging;
pub mod validation;

// Re-export commonly used utilities
pub use logging::{init_tracing, mask_identifier};
pub use validation::sanitize_verification_code;
