//! Cache module with the verification store adapters
//!
//! This module provides the store backends for verification records:
//! a Redis client with retry logic plus the Redis-backed store, and an
//! in-process store.

pub mod memory_store;
#[cfg(feature = "redis-cache")]
pub mod redis_client;
#[cfg(feature = "redis-cache")]
pub mod redis_store;

#[cfg(test)]
mod tests;

use std::sync::Arc;

use tracing::info;
use vc_core::services::VerificationStore;

pub use memory_store::MemoryVerificationStore;
#[cfg(feature = "redis-cache")]
pub use redis_client::RedisClient;
#[cfg(feature = "redis-cache")]
pub use redis_store::RedisVerificationStore;

// Re-export commonly used types
pub use vc_shared::config::cache::{CacheConfig, CacheType};

use crate::InfrastructureError;

/// Build the configured store backend
///
/// Connecting to Redis retries with backoff per `CacheConfig`.
pub async fn create_store(
    cache_type: CacheType,
    config: &CacheConfig,
) -> Result<Arc<dyn VerificationStore>, InfrastructureError> {
    match cache_type {
        CacheType::Memory => {
            info!(store = "memory", "Using in-memory verification store");
            Ok(Arc::new(MemoryVerificationStore::new()))
        }
        #[cfg(feature = "redis-cache")]
        CacheType::Redis => {
            let client = RedisClient::new(config.clone()).await?;
            info!(store = "redis", "Using Redis verification store");
            Ok(Arc::new(RedisVerificationStore::new(client)))
        }
        #[cfg(not(feature = "redis-cache"))]
        CacheType::Redis => {
            let _ = config;
            Err(InfrastructureError::Config(
                "Redis store requested but the redis-cache feature is disabled".to_string(),
            ))
        }
    }
}
