//! In-process verification store
//!
//! Keeps records in a map behind an async lock. Suitable for tests and
//! single-node deployments; records are lost on restart.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

use vc_core::domain::entities::VerificationRecord;
use vc_core::domain::value_objects::{CompositeKey, RecordUpdate};
use vc_core::errors::StoreError;
use vc_core::services::VerificationStore;

type TableKey = (String, CompositeKey);

/// Verification store held in memory
///
/// Clones share the same records.
#[derive(Debug, Clone, Default)]
pub struct MemoryVerificationStore {
    records: Arc<RwLock<HashMap<TableKey, VerificationRecord>>>,
}

impl MemoryVerificationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records across all tables
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    /// Remove every record
    pub async fn clear(&self) {
        self.records.write().await.clear();
    }
}

fn table_key(table: &str, key: &CompositeKey) -> TableKey {
    (table.to_string(), key.clone())
}

#[async_trait]
impl VerificationStore for MemoryVerificationStore {
    async fn get(&self, table: &str, key: &CompositeKey) -> Result<Option<VerificationRecord>, StoreError> {
        Ok(self.records.read().await.get(&table_key(table, key)).cloned())
    }

    async fn put(&self, table: &str, record: &VerificationRecord) -> Result<bool, StoreError> {
        self.records
            .write()
            .await
            .insert(table_key(table, &record.key()), record.clone());
        debug!(table, key = %record.key(), "Stored verification record in memory");
        Ok(true)
    }

    async fn update(&self, table: &str, key: &CompositeKey, update: &RecordUpdate) -> Result<bool, StoreError> {
        let mut records = self.records.write().await;
        match records.get_mut(&table_key(table, key)) {
            Some(record) => {
                // apply_update leaves the record untouched on error
                record.apply_update(update)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, table: &str, key: &CompositeKey) -> Result<bool, StoreError> {
        Ok(self.records.write().await.remove(&table_key(table, key)).is_some())
    }
}
