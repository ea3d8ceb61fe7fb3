//! Traits for store and random source integration

use async_trait::async_trait;

use crate::domain::entities::VerificationRecord;
use crate::domain::value_objects::{CompositeKey, RecordUpdate};
use crate::errors::{DomainResult, StoreError};

/// Trait for verification record storage
///
/// Every operation addresses a single record by composite key within a
/// named table. Write operations return whether the store acknowledged them.
#[async_trait]
pub trait VerificationStore: Send + Sync {
    /// Fetch a record, `None` when absent
    async fn get(&self, table: &str, key: &CompositeKey) -> Result<Option<VerificationRecord>, StoreError>;
    /// Insert or fully overwrite a record
    async fn put(&self, table: &str, record: &VerificationRecord) -> Result<bool, StoreError>;
    /// Apply a partial update; returns `false` without writing when the record is absent
    async fn update(&self, table: &str, key: &CompositeKey, update: &RecordUpdate) -> Result<bool, StoreError>;
    /// Remove a record; returns `false` when nothing was removed
    async fn delete(&self, table: &str, key: &CompositeKey) -> Result<bool, StoreError>;
}

/// Trait for verification code generation
pub trait CodeGenerator: Send + Sync {
    /// Produce a random code of exactly `length` symbols
    fn generate(&self, length: usize) -> DomainResult<String>;
}
