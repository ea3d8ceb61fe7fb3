//! Mock implementations for testing verification service

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::domain::entities::VerificationRecord;
use crate::domain::value_objects::{CompositeKey, RecordUpdate};
use crate::errors::{DomainError, DomainResult, StoreError};
use crate::services::verification::traits::{CodeGenerator, VerificationStore};

// Mock store for testing, with per-operation failure toggles
pub struct MockVerificationStore {
    pub records: Mutex<HashMap<(String, CompositeKey), VerificationRecord>>,
    pub fail_get: AtomicBool,
    pub fail_put: AtomicBool,
    pub fail_update: AtomicBool,
    pub fail_delete: AtomicBool,
    pub acknowledge_put: AtomicBool,
    pub get_calls: AtomicUsize,
    pub put_calls: AtomicUsize,
    pub update_calls: AtomicUsize,
    pub delete_calls: AtomicUsize,
}

impl MockVerificationStore {
    pub fn new() -> Self {
        Self {
            records: Mutex::new(HashMap::new()),
            fail_get: AtomicBool::new(false),
            fail_put: AtomicBool::new(false),
            fail_update: AtomicBool::new(false),
            fail_delete: AtomicBool::new(false),
            acknowledge_put: AtomicBool::new(true),
            get_calls: AtomicUsize::new(0),
            put_calls: AtomicUsize::new(0),
            update_calls: AtomicUsize::new(0),
            delete_calls: AtomicUsize::new(0),
        }
    }

    pub fn record(&self, table: &str, key: &CompositeKey) -> Option<VerificationRecord> {
        self.records
            .lock()
            .unwrap()
            .get(&(table.to_string(), key.clone()))
            .cloned()
    }

    pub fn insert(&self, table: &str, record: VerificationRecord) {
        self.records
            .lock()
            .unwrap()
            .insert((table.to_string(), record.key()), record);
    }

    pub fn calls(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl VerificationStore for MockVerificationStore {
    async fn get(&self, table: &str, key: &CompositeKey) -> Result<Option<VerificationRecord>, StoreError> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_get.load(Ordering::SeqCst) {
            return Err(StoreError::Connection("mock store unreachable".to_string()));
        }
        Ok(self.record(table, key))
    }

    async fn put(&self, table: &str, record: &VerificationRecord) -> Result<bool, StoreError> {
        self.put_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_put.load(Ordering::SeqCst) {
            return Err(StoreError::Command("mock write failed".to_string()));
        }
        if !self.acknowledge_put.load(Ordering::SeqCst) {
            return Ok(false);
        }
        self.insert(table, record.clone());
        Ok(true)
    }

    async fn update(&self, table: &str, key: &CompositeKey, update: &RecordUpdate) -> Result<bool, StoreError> {
        self.update_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_update.load(Ordering::SeqCst) {
            return Err(StoreError::Command("mock update failed".to_string()));
        }
        let mut records = self.records.lock().unwrap();
        match records.get_mut(&(table.to_string(), key.clone())) {
            Some(record) => {
                record.apply_update(update)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, table: &str, key: &CompositeKey) -> Result<bool, StoreError> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_delete.load(Ordering::SeqCst) {
            return Err(StoreError::Command("mock delete failed".to_string()));
        }
        Ok(self
            .records
            .lock()
            .unwrap()
            .remove(&(table.to_string(), key.clone()))
            .is_some())
    }
}

// Generator returning a known code
pub struct FixedCodeGenerator {
    pub code: String,
}

impl FixedCodeGenerator {
    pub fn new(code: &str) -> Self {
        Self {
            code: code.to_string(),
        }
    }
}

impl CodeGenerator for FixedCodeGenerator {
    fn generate(&self, length: usize) -> DomainResult<String> {
        Ok(self.code.chars().cycle().take(length).collect())
    }
}

// Generator simulating an unavailable random source
pub struct FailingGenerator;

impl CodeGenerator for FailingGenerator {
    fn generate(&self, _length: usize) -> DomainResult<String> {
        Err(DomainError::RandomSource {
            message: "entropy source unavailable".to_string(),
        })
    }
}
