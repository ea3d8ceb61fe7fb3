//! Persisted verification record and its transient issuance counterpart.

use serde::{Deserialize, Serialize};

use crate::domain::value_objects::{CompositeKey, RecordUpdate, RecordValue};
use crate::errors::StoreError;

/// Stored field names of a verification record
pub mod fields {
    pub const PARTITION_KEY: &str = "p";
    pub const RECORD_KEY: &str = "id";
    pub const CODE: &str = "code";
    pub const FAIL_COUNT: &str = "fc";
    pub const CREATED_AT: &str = "toc";
    pub const EXPIRES_AT: &str = "toe";

    /// All fields, in storage order
    pub const ALL: [&str; 6] = [PARTITION_KEY, RECORD_KEY, CODE, FAIL_COUNT, CREATED_AT, EXPIRES_AT];
}

/// Verification record as kept in the store
///
/// At most one record exists per (partition key, record key). Issuance
/// replaces it wholesale; a failed check only ever bumps `fail_count`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationRecord {
    /// `entity_type.entity_id`
    #[serde(rename = "p")]
    pub partition_key: String,

    /// `service_code.communication_id`
    #[serde(rename = "id")]
    pub record_key: String,

    /// The secret code
    pub code: String,

    /// Failed validation attempts since issuance
    #[serde(rename = "fc", default)]
    pub fail_count: u32,

    /// Issuance time (unix seconds)
    #[serde(rename = "toc")]
    pub created_at: i64,

    /// Expiry time (unix seconds)
    #[serde(rename = "toe")]
    pub expires_at: i64,
}

impl VerificationRecord {
    pub fn key(&self) -> CompositeKey {
        CompositeKey::new(self.partition_key.clone(), self.record_key.clone())
    }

    /// Whether the record is past its expiry at `now`
    ///
    /// A record is still usable at exactly `expires_at`.
    pub fn is_expired(&self, now: i64) -> bool {
        now.saturating_sub(self.expires_at) > 0
    }

    pub fn has_reached_max_fail_count(&self, max_fail_count: u32) -> bool {
        self.fail_count >= max_fail_count
    }

    /// Whether a check at `now` may still compare codes against this record
    pub fn is_consumable(&self, now: i64, max_fail_count: u32) -> bool {
        !self.is_expired(now) && !self.has_reached_max_fail_count(max_fail_count)
    }

    /// Whether a new code for the same key pair must still be refused at `now`
    pub fn is_cooling_down(&self, cooldown_period: i64, now: i64) -> bool {
        cooldown_period > now.saturating_sub(self.created_at)
    }

    /// Apply a partial update in place
    ///
    /// Used by stores that keep records as whole values. Key fields are
    /// immutable and every field is required, so removals are rejected.
    /// The record is left untouched when the update is invalid.
    pub fn apply_update(&mut self, update: &RecordUpdate) -> Result<(), StoreError> {
        update.validate()?;
        let mut next = self.clone();

        for (field, value) in &update.set_fields {
            match (field.as_str(), value) {
                (fields::CODE, RecordValue::Text(code)) => next.code = code.clone(),
                (fields::FAIL_COUNT, RecordValue::Integer(count)) => {
                    next.fail_count = u32::try_from(*count).map_err(|_| {
                        StoreError::InvalidUpdate(format!("fail count out of range: {}", count))
                    })?;
                }
                (fields::CREATED_AT, RecordValue::Integer(ts)) => next.created_at = *ts,
                (fields::EXPIRES_AT, RecordValue::Integer(ts)) => next.expires_at = *ts,
                (other, _) => {
                    return Err(StoreError::InvalidUpdate(format!(
                        "field '{}' cannot be set to {:?}",
                        other, value
                    )))
                }
            }
        }

        for (field, by) in &update.increment_fields {
            match field.as_str() {
                fields::FAIL_COUNT => {
                    next.fail_count = i64::from(next.fail_count)
                        .checked_add(*by)
                        .and_then(|v| u32::try_from(v).ok())
                        .ok_or_else(|| {
                            StoreError::InvalidUpdate(format!("fail count increment by {} out of range", by))
                        })?;
                }
                fields::CREATED_AT => next.created_at = next.created_at.saturating_add(*by),
                fields::EXPIRES_AT => next.expires_at = next.expires_at.saturating_add(*by),
                other => {
                    return Err(StoreError::InvalidUpdate(format!(
                        "field '{}' cannot be incremented",
                        other
                    )))
                }
            }
        }

        *self = next;
        Ok(())
    }
}

/// Issuance output before persistence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationData {
    pub partition_key: String,
    pub record_key: String,
    pub code: String,
    pub created_at: i64,
    pub expires_at: i64,
}

impl From<VerificationData> for VerificationRecord {
    fn from(data: VerificationData) -> Self {
        Self {
            partition_key: data.partition_key,
            record_key: data.record_key,
            code: data.code,
            fail_count: 0,
            created_at: data.created_at,
            expires_at: data.expires_at,
        }
    }
}
