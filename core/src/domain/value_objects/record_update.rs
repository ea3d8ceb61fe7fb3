//! Partial update of a stored verification record.

use std::collections::BTreeMap;

use crate::domain::entities::fields;
use crate::errors::StoreError;

/// Fields a partial update may overwrite
const SETTABLE_FIELDS: [&str; 4] = [fields::CODE, fields::FAIL_COUNT, fields::CREATED_AT, fields::EXPIRES_AT];

/// Fields a partial update may increment
const INCREMENTABLE_FIELDS: [&str; 3] = [fields::FAIL_COUNT, fields::CREATED_AT, fields::EXPIRES_AT];

/// Scalar value accepted by a partial update
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordValue {
    Text(String),
    Integer(i64),
}

/// Partial update applied to an existing record
///
/// Fields are addressed by their stored names (see
/// [`crate::domain::entities::verification_record::fields`]). Stores apply
/// the three groups in order: set, remove, increment. An update against a
/// missing record must not create one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordUpdate {
    /// Fields overwritten with a new value
    pub set_fields: BTreeMap<String, RecordValue>,
    /// Fields removed from the record
    pub remove_fields: Vec<String>,
    /// Fields atomically incremented by the given amount
    pub increment_fields: BTreeMap<String, i64>,
}

impl RecordUpdate {
    /// Update that only increments `field` by `by`
    pub fn increment(field: &str, by: i64) -> Self {
        let mut update = Self::default();
        update.increment_fields.insert(field.to_string(), by);
        update
    }

    /// Add a field overwrite to this update
    pub fn set(mut self, field: &str, value: RecordValue) -> Self {
        self.set_fields.insert(field.to_string(), value);
        self
    }

    /// Add a field removal to this update
    pub fn remove(mut self, field: &str) -> Self {
        self.remove_fields.push(field.to_string());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.set_fields.is_empty() && self.remove_fields.is_empty() && self.increment_fields.is_empty()
    }

    /// Check the update only touches mutable record fields
    ///
    /// Key fields never change and every field is required, so removals
    /// are always rejected.
    pub fn validate(&self) -> Result<(), StoreError> {
        for (field, value) in &self.set_fields {
            let type_ok = match value {
                RecordValue::Text(_) => field == fields::CODE,
                RecordValue::Integer(_) => field != fields::CODE,
            };
            if !SETTABLE_FIELDS.contains(&field.as_str()) || !type_ok {
                return Err(StoreError::InvalidUpdate(format!(
                    "field '{}' cannot be set to {:?}",
                    field, value
                )));
            }
        }

        if let Some(field) = self.remove_fields.first() {
            return Err(StoreError::InvalidUpdate(format!(
                "field '{}' is required and cannot be removed",
                field
            )));
        }

        for field in self.increment_fields.keys() {
            if !INCREMENTABLE_FIELDS.contains(&field.as_str()) {
                return Err(StoreError::InvalidUpdate(format!(
                    "field '{}' cannot be incremented",
                    field
                )));
            }
        }
        Ok(())
    }
}
