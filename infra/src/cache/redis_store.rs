//! Redis-backed verification store
//!
//! Each record is one Redis hash whose fields are the stored record field
//! names (`p`, `id`, `code`, `fc`, `toc`, `toe`). The hash key is
//!
//! `[{prefix}:]{table}:{partition key length}:{partition key}:{record key}`
//!
//! The length prefix keeps keys distinct even when key components contain
//! `:`. Records carry no Redis TTL; expiry is enforced when they are read.

use async_trait::async_trait;
use std::collections::HashMap;
use tracing::{debug, warn};

use vc_core::domain::entities::{fields, VerificationRecord};
use vc_core::domain::value_objects::{CompositeKey, RecordUpdate, RecordValue};
use vc_core::errors::StoreError;
use vc_core::services::VerificationStore;

use crate::cache::RedisClient;
use crate::InfrastructureError;

/// Verification store over Redis hashes
#[derive(Clone)]
pub struct RedisVerificationStore {
    /// Redis client for cache operations
    redis_client: RedisClient,
}

impl RedisVerificationStore {
    pub fn new(redis_client: RedisClient) -> Self {
        Self { redis_client }
    }

    /// Full Redis key for a record
    pub fn storage_key(&self, table: &str, key: &CompositeKey) -> String {
        self.redis_client.config().make_key(&format_record_key(table, key))
    }

    pub fn client(&self) -> &RedisClient {
        &self.redis_client
    }
}

/// Redis key for a record, without the configured prefix
pub(crate) fn format_record_key(table: &str, key: &CompositeKey) -> String {
    format!(
        "{}:{}:{}:{}",
        table,
        key.partition_key.len(),
        key.partition_key,
        key.record_key
    )
}

/// Hash fields for a record, in storage order
pub(crate) fn record_to_fields(record: &VerificationRecord) -> Vec<(&'static str, String)> {
    vec![
        (fields::PARTITION_KEY, record.partition_key.clone()),
        (fields::RECORD_KEY, record.record_key.clone()),
        (fields::CODE, record.code.clone()),
        (fields::FAIL_COUNT, record.fail_count.to_string()),
        (fields::CREATED_AT, record.created_at.to_string()),
        (fields::EXPIRES_AT, record.expires_at.to_string()),
    ]
}

/// Rebuild a record from a hash; `None` for an empty (missing) hash
pub(crate) fn record_from_fields(
    mut hash: HashMap<String, String>,
) -> Result<Option<VerificationRecord>, InfrastructureError> {
    if hash.is_empty() {
        return Ok(None);
    }

    let mut take = |field: &str| {
        hash.remove(field)
            .ok_or_else(|| InfrastructureError::CorruptRecord(format!("missing field '{}'", field)))
    };

    let partition_key = take(fields::PARTITION_KEY)?;
    let record_key = take(fields::RECORD_KEY)?;
    let code = take(fields::CODE)?;
    let fail_count = take(fields::FAIL_COUNT)?;
    let created_at = take(fields::CREATED_AT)?;
    let expires_at = take(fields::EXPIRES_AT)?;

    Ok(Some(VerificationRecord {
        partition_key,
        record_key,
        code,
        fail_count: parse_field(fields::FAIL_COUNT, &fail_count)?,
        created_at: parse_field(fields::CREATED_AT, &created_at)?,
        expires_at: parse_field(fields::EXPIRES_AT, &expires_at)?,
    }))
}

fn parse_field<T: std::str::FromStr>(field: &str, value: &str) -> Result<T, InfrastructureError> {
    value
        .parse()
        .map_err(|_| InfrastructureError::CorruptRecord(format!("field '{}' has invalid value '{}'", field, value)))
}

#[async_trait]
impl VerificationStore for RedisVerificationStore {
    async fn get(&self, table: &str, key: &CompositeKey) -> Result<Option<VerificationRecord>, StoreError> {
        let storage_key = self.storage_key(table, key);
        let hash = self.redis_client.hash_get_all(&storage_key).await?;

        let record = record_from_fields(hash).map_err(|e| {
            warn!(key = %storage_key, error = %e, "Stored verification record is corrupt");
            e
        })?;

        // Guards against a hash written under a colliding key by another writer
        if let Some(record) = &record {
            if record.partition_key != key.partition_key || record.record_key != key.record_key {
                return Err(StoreError::CorruptRecord(format!(
                    "record at '{}' belongs to a different key",
                    storage_key
                )));
            }
        }

        Ok(record)
    }

    async fn put(&self, table: &str, record: &VerificationRecord) -> Result<bool, StoreError> {
        let storage_key = self.storage_key(table, &record.key());
        let acknowledged = self
            .redis_client
            .replace_hash(&storage_key, &record_to_fields(record))
            .await?;

        debug!(key = %storage_key, acknowledged, "Stored verification record");
        Ok(acknowledged)
    }

    async fn update(&self, table: &str, key: &CompositeKey, update: &RecordUpdate) -> Result<bool, StoreError> {
        update.validate()?;

        let storage_key = self.storage_key(table, key);
        let set_fields: Vec<(String, String)> = update
            .set_fields
            .iter()
            .map(|(field, value)| {
                let value = match value {
                    RecordValue::Text(text) => text.clone(),
                    RecordValue::Integer(n) => n.to_string(),
                };
                (field.clone(), value)
            })
            .collect();
        let increment_fields: Vec<(String, i64)> = update
            .increment_fields
            .iter()
            .map(|(field, by)| (field.clone(), *by))
            .collect();

        let applied = self
            .redis_client
            .update_hash(&storage_key, &set_fields, &update.remove_fields, &increment_fields)
            .await?;

        debug!(key = %storage_key, applied, "Updated verification record");
        Ok(applied)
    }

    async fn delete(&self, table: &str, key: &CompositeKey) -> Result<bool, StoreError> {
        let storage_key = self.storage_key(table, key);
        Ok(self.redis_client.delete(&storage_key).await?)
    }
}
