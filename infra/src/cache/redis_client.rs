//! Redis cache client implementation
//!
//! This module provides a Redis client with a multiplexed connection, retry
//! logic and the hash operations the verification store is built on:
//! atomic replace, read-all, guarded partial update and delete.

use redis::{
    aio::MultiplexedConnection, AsyncCommands, Client, IntoConnectionInfo, RedisError, RedisResult, Script,
};
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;
use tokio::time::{sleep, timeout};
use tracing::{debug, error, info, warn};

use crate::cache::CacheConfig;
use crate::InfrastructureError;

/// Upper bound for the exponential backoff between attempts
const MAX_RETRY_DELAY_MS: u64 = 5000;

/// Partial hash update, applied only when the hash exists
///
/// ARGV layout: set count, set pairs, remove count, remove fields,
/// increment count, increment pairs.
const GUARDED_UPDATE_SCRIPT: &str = r#"
if redis.call('EXISTS', KEYS[1]) == 0 then
  return 0
end
local idx = 1
local set_count = tonumber(ARGV[idx])
idx = idx + 1
for _ = 1, set_count do
  redis.call('HSET', KEYS[1], ARGV[idx], ARGV[idx + 1])
  idx = idx + 2
end
local remove_count = tonumber(ARGV[idx])
idx = idx + 1
for _ = 1, remove_count do
  redis.call('HDEL', KEYS[1], ARGV[idx])
  idx = idx + 1
end
local incr_count = tonumber(ARGV[idx])
idx = idx + 1
for _ = 1, incr_count do
  redis.call('HINCRBY', KEYS[1], ARGV[idx], ARGV[idx + 1])
  idx = idx + 2
end
return 1
"#;

type RedisFuture<T> = Pin<Box<dyn Future<Output = RedisResult<T>> + Send>>;

/// Redis cache client with a shared multiplexed connection and retry logic
///
/// Cloning is cheap; clones share the underlying connection.
#[derive(Clone)]
pub struct RedisClient {
    /// Redis multiplexed connection for async operations
    connection: MultiplexedConnection,
    /// Configuration used to create this client
    config: CacheConfig,
    /// Maximum number of attempts for retriable operations
    max_retries: u32,
    /// Base delay between retries (exponential backoff)
    retry_delay_ms: u64,
    /// Per-command response timeout
    response_timeout: Duration,
}

impl RedisClient {
    /// Create a new Redis client
    ///
    /// # Arguments
    /// * `config` - Cache configuration settings
    ///
    /// # Returns
    /// * `Result<Self, InfrastructureError>` - Redis client or error
    ///
    /// # Example
    /// ```no_run
    /// use vc_infra::cache::{CacheConfig, RedisClient};
    ///
    /// async fn create_client() -> Result<RedisClient, Box<dyn std::error::Error>> {
    ///     let config = CacheConfig::new("redis://localhost:6379").with_prefix("verify");
    ///     let client = RedisClient::new(config).await?;
    ///     Ok(client)
    /// }
    /// ```
    pub async fn new(config: CacheConfig) -> Result<Self, InfrastructureError> {
        let max_retries = config.max_retries.max(1);
        let retry_delay_ms = config.retry_delay_ms;

        info!(
            url = %mask_url(&config.url),
            database = config.database,
            max_retries = max_retries,
            "Creating Redis client"
        );

        let mut connection_info = config.url.as_str().into_connection_info().map_err(|e| {
            error!("Failed to parse Redis URL: {}", e);
            InfrastructureError::Config(format!("Invalid Redis URL: {}", e))
        })?;
        if config.database != 0 {
            connection_info.redis.db = i64::from(config.database);
        }

        let client = Client::open(connection_info).map_err(|e| {
            error!("Failed to open Redis client: {}", e);
            InfrastructureError::Config(format!("Invalid Redis URL: {}", e))
        })?;

        let connection = Self::create_connection_with_retry(
            client,
            max_retries,
            retry_delay_ms,
            Duration::from_secs(config.connection_timeout.max(1)),
        )
        .await?;

        info!("Redis client created successfully");

        Ok(Self {
            connection,
            response_timeout: Duration::from_secs(config.response_timeout.max(1)),
            config,
            max_retries,
            retry_delay_ms,
        })
    }

    /// Create multiplexed connection with retry logic
    async fn create_connection_with_retry(
        client: Client,
        max_retries: u32,
        retry_delay_ms: u64,
        connect_timeout: Duration,
    ) -> Result<MultiplexedConnection, InfrastructureError> {
        let mut attempts = 0;
        let mut delay = retry_delay_ms;

        loop {
            attempts += 1;
            debug!("Attempting to connect to Redis (attempt {})", attempts);

            let result = match timeout(connect_timeout, client.get_multiplexed_async_connection()).await {
                Ok(result) => result,
                Err(_) => Err(timeout_error()),
            };

            match result {
                Ok(connection) => {
                    info!("Successfully connected to Redis");
                    return Ok(connection);
                }
                Err(e) if attempts < max_retries => {
                    warn!(
                        "Failed to connect to Redis (attempt {}/{}): {}. Retrying in {}ms...",
                        attempts, max_retries, e, delay
                    );
                    sleep(Duration::from_millis(delay)).await;
                    delay = (delay * 2).min(MAX_RETRY_DELAY_MS);
                }
                Err(e) => {
                    error!("Failed to connect to Redis after {} attempts: {}", attempts, e);
                    return Err(InfrastructureError::Cache(e));
                }
            }
        }
    }

    /// Configuration this client was created with
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Read every field of a hash; empty when the key does not exist
    pub async fn hash_get_all(&self, key: &str) -> Result<HashMap<String, String>, InfrastructureError> {
        debug!("Reading hash '{}'", key);

        let key_owned = key.to_string();
        self.execute_with_retry(move |mut conn| {
            let key = key_owned.clone();
            Box::pin(async move { conn.hgetall::<_, HashMap<String, String>>(key).await })
        })
        .await
        .map_err(|e| {
            error!("Failed to read hash '{}': {}", key, e);
            InfrastructureError::Cache(e)
        })
    }

    /// Atomically replace a hash with exactly `fields`
    ///
    /// Returns whether Redis acknowledged the write.
    pub async fn replace_hash(
        &self,
        key: &str,
        fields: &[(&'static str, String)],
    ) -> Result<bool, InfrastructureError> {
        debug!("Replacing hash '{}' ({} fields)", key, fields.len());

        let key_owned = key.to_string();
        let fields_owned: Vec<(&'static str, String)> = fields.to_vec();

        // DEL + HSET in MULTI/EXEC is idempotent, so it may be retried
        let result = self
            .execute_with_retry(move |mut conn| {
                let key = key_owned.clone();
                let fields = fields_owned.clone();
                Box::pin(async move {
                    let (status,): (String,) = redis::pipe()
                        .atomic()
                        .del(&key)
                        .ignore()
                        .hset_multiple(&key, &fields[..])
                        .query_async(&mut conn)
                        .await?;
                    Ok(status)
                })
            })
            .await;

        match result {
            Ok(status) => {
                let acknowledged = status == "OK";
                if !acknowledged {
                    warn!("Unexpected reply replacing hash '{}': {}", key, status);
                }
                Ok(acknowledged)
            }
            Err(e) => {
                error!("Failed to replace hash '{}': {}", key, e);
                Err(InfrastructureError::Cache(e))
            }
        }
    }

    /// Apply a partial update to an existing hash
    ///
    /// Returns `false` without writing when the hash does not exist. Runs
    /// once: increments are not idempotent, so a lost reply is not retried.
    pub async fn update_hash(
        &self,
        key: &str,
        set_fields: &[(String, String)],
        remove_fields: &[String],
        increment_fields: &[(String, i64)],
    ) -> Result<bool, InfrastructureError> {
        debug!("Updating hash '{}'", key);

        let script = Script::new(GUARDED_UPDATE_SCRIPT);
        let mut invocation = script.key(key);
        invocation.arg(set_fields.len());
        for (field, value) in set_fields {
            invocation.arg(field).arg(value);
        }
        invocation.arg(remove_fields.len());
        for field in remove_fields {
            invocation.arg(field);
        }
        invocation.arg(increment_fields.len());
        for (field, by) in increment_fields {
            invocation.arg(field).arg(*by);
        }

        let mut conn = self.connection.clone();
        let result = match timeout(self.response_timeout, invocation.invoke_async::<_, i64>(&mut conn)).await {
            Ok(result) => result,
            Err(_) => Err(timeout_error()),
        };

        match result {
            Ok(applied) => {
                debug!("Hash '{}' update applied: {}", key, applied == 1);
                Ok(applied == 1)
            }
            Err(e) => {
                error!("Failed to update hash '{}': {}", key, e);
                Err(InfrastructureError::Cache(e))
            }
        }
    }

    /// Delete a key from cache
    ///
    /// # Returns
    /// * `Result<bool, InfrastructureError>` - True if key was deleted, false if not found
    pub async fn delete(&self, key: &str) -> Result<bool, InfrastructureError> {
        debug!("Deleting key '{}'", key);

        let key_owned = key.to_string();
        let result = self
            .execute_with_retry(move |mut conn| {
                let key = key_owned.clone();
                Box::pin(async move { conn.del::<_, u32>(key).await })
            })
            .await;

        match result {
            Ok(deleted_count) => {
                let deleted = deleted_count > 0;
                if deleted {
                    debug!("Successfully deleted key '{}'", key);
                } else {
                    debug!("Key '{}' was not found", key);
                }
                Ok(deleted)
            }
            Err(e) => {
                error!("Failed to delete key '{}': {}", key, e);
                Err(InfrastructureError::Cache(e))
            }
        }
    }

    /// Check if the Redis connection is healthy
    ///
    /// Performs a PING command to verify connectivity.
    pub async fn health_check(&self) -> Result<bool, InfrastructureError> {
        debug!("Performing Redis health check");

        let result = self
            .execute_with_retry(|mut conn| {
                Box::pin(async move { redis::cmd("PING").query_async::<_, String>(&mut conn).await })
            })
            .await;

        match result {
            Ok(response) if response == "PONG" => {
                debug!("Redis health check passed");
                Ok(true)
            }
            Ok(response) => {
                warn!("Redis health check returned unexpected response: {}", response);
                Ok(false)
            }
            Err(e) => {
                error!("Redis health check failed: {}", e);
                Err(InfrastructureError::Cache(e))
            }
        }
    }

    /// Execute a Redis operation with automatic retry logic
    ///
    /// Only transient errors are retried, with exponential backoff starting
    /// at the configured delay. Each attempt is bounded by the response timeout.
    async fn execute_with_retry<F, T>(&self, operation: F) -> RedisResult<T>
    where
        F: Fn(MultiplexedConnection) -> RedisFuture<T>,
    {
        let mut attempts = 0;
        let mut delay = self.retry_delay_ms;

        loop {
            attempts += 1;
            let conn = self.connection.clone();

            let result = match timeout(self.response_timeout, operation(conn)).await {
                Ok(result) => result,
                Err(_) => Err(timeout_error()),
            };

            match result {
                Ok(result) => return Ok(result),
                Err(e) if attempts < self.max_retries && is_retriable_error(&e) => {
                    warn!(
                        "Redis operation failed (attempt {}/{}): {}. Retrying in {}ms...",
                        attempts, self.max_retries, e, delay
                    );
                    sleep(Duration::from_millis(delay)).await;
                    delay = (delay * 2).min(MAX_RETRY_DELAY_MS);
                }
                Err(e) => {
                    error!("Redis operation failed after {} attempts: {}", attempts, e);
                    return Err(e);
                }
            }
        }
    }
}

fn timeout_error() -> RedisError {
    RedisError::from(std::io::Error::new(
        std::io::ErrorKind::TimedOut,
        "Redis operation timed out",
    ))
}

/// Check if a Redis error is retriable
///
/// Determines if an error is transient and the operation should be retried.
pub(crate) fn is_retriable_error(error: &RedisError) -> bool {
    matches!(
        error.kind(),
        redis::ErrorKind::IoError
            | redis::ErrorKind::BusyLoadingError
            | redis::ErrorKind::TryAgain
    )
}

/// Mask sensitive parts of Redis URL for logging
pub(crate) fn mask_url(url: &str) -> String {
    if let Some(at_pos) = url.find('@') {
        if let Some(proto_end) = url.find("://") {
            let proto = &url[..proto_end + 3];
            let host_part = &url[at_pos..];
            return format!("{}****{}", proto, host_part);
        }
    }
    url.to_string()
}
