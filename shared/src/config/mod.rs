//! Configuration module with business-specific sub-modules
//!
//! - `cache` - Redis backing store configuration
//! - `environment` - Environment detection and logging configuration
//! - `verification` - Verification code constraints and table naming

pub mod cache;
pub mod environment;
pub mod verification;

// Re-export commonly used types
pub use cache::{CacheConfig, CacheType};
pub use environment::{Environment, LogFormat, LoggingConfig};
pub use verification::VerificationConfig;
