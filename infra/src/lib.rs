//! # Infrastructure Layer
//!
//! This crate implements the infrastructure layer for the verification code
//! service. It provides concrete implementations of the core store contract
//! and the configuration loading for the workspace.
//!
//! ## Architecture
//!
//! The infrastructure layer contains:
//! - **Cache**: Redis client with retry logic, and the Redis-backed store
//! - **Memory**: In-process store for tests and single-node deployments
//! - **Config**: Environment and `.env` loading
//!
//! ## Features
//!
//! - `redis-cache`: Enable Redis store support (default)

use vc_core::errors::StoreError;

/// Cache module - Redis client and the verification store adapters
pub mod cache;

/// Configuration module for infrastructure services
pub mod config {
    //! Configuration management for infrastructure services
    //!
    //! Handles:
    //! - Store backend selection
    //! - Redis configuration
    //! - Verification code constraints
    //! - Logging settings

    use serde::{Deserialize, Serialize};
    use vc_shared::config::{CacheConfig, CacheType, Environment, LoggingConfig, VerificationConfig};

    use crate::InfrastructureError;

    /// Infrastructure configuration settings
    #[derive(Debug, Clone, Default, Serialize, Deserialize)]
    pub struct InfrastructureConfig {
        /// Which store backs verification records
        #[serde(default)]
        pub store: CacheType,
        /// Redis cache configuration
        pub cache: CacheConfig,
        /// Verification code settings
        #[serde(default)]
        pub verification: VerificationConfig,
        /// Logging settings
        pub logging: LoggingConfig,
    }

    /// Load infrastructure configuration from environment
    ///
    /// The environment specific file (e.g. `.env.production`) is read first,
    /// then `.env`. Variables already set in the process always win.
    pub fn load_config() -> Result<InfrastructureConfig, InfrastructureError> {
        dotenvy::from_filename(Environment::from_env().env_file()).ok();
        dotenvy::dotenv().ok(); // Load .env file if present

        let config = InfrastructureConfig {
            store: CacheType::from_env(),
            cache: CacheConfig::from_env(),
            verification: VerificationConfig::from_env(),
            logging: LoggingConfig::from_env(),
        };

        if config.verification.table_name.trim().is_empty() {
            return Err(InfrastructureError::Config(
                "VERIFY_DB_SOURCE must not be empty".to_string(),
            ));
        }

        Ok(config)
    }
}

pub use cache::{create_store, MemoryVerificationStore};
#[cfg(feature = "redis-cache")]
pub use cache::{RedisClient, RedisVerificationStore};

/// Infrastructure-specific error types
#[derive(Debug, thiserror::Error)]
pub enum InfrastructureError {
    /// Redis cache error
    #[cfg(feature = "redis-cache")]
    #[error("Cache error: {0}")]
    Cache(#[from] redis::RedisError),

    /// Stored record is missing fields or holds malformed values
    #[error("Corrupt record: {0}")]
    CorruptRecord(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<InfrastructureError> for StoreError {
    fn from(error: InfrastructureError) -> Self {
        match error {
            #[cfg(feature = "redis-cache")]
            InfrastructureError::Cache(e) => {
                if e.is_io_error() || e.is_connection_refusal() || e.is_connection_dropped() || e.is_timeout() {
                    StoreError::Connection(e.to_string())
                } else {
                    StoreError::Command(e.to_string())
                }
            }
            InfrastructureError::CorruptRecord(message) => StoreError::CorruptRecord(message),
            InfrastructureError::Config(message) => StoreError::Connection(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversion_to_store_error() {
        let store_error: StoreError = InfrastructureError::CorruptRecord("missing fc".to_string()).into();
        assert_eq!(store_error, StoreError::CorruptRecord("missing fc".to_string()));

        let store_error: StoreError = InfrastructureError::Config("bad url".to_string()).into();
        assert!(matches!(store_error, StoreError::Connection(_)));
    }

    #[cfg(feature = "redis-cache")]
    #[test]
    fn test_redis_error_classification() {
        let io_error = redis::RedisError::from(std::io::Error::new(
            std::io::ErrorKind::ConnectionRefused,
            "Connection refused",
        ));
        let store_error: StoreError = InfrastructureError::Cache(io_error).into();
        assert!(matches!(store_error, StoreError::Connection(_)));

        let type_error = redis::RedisError::from((redis::ErrorKind::TypeError, "Invalid type"));
        let store_error: StoreError = InfrastructureError::Cache(type_error).into();
        assert!(matches!(store_error, StoreError::Command(_)));
    }
}
