//! Main verification service implementation

use std::sync::Arc;

use constant_time_eq::constant_time_eq;
use regex::{Regex, RegexBuilder};
use vc_shared::config::VerificationConfig;
use vc_shared::utils::{mask_identifier, sanitize_verification_code};

use crate::domain::entities::{fields, VerificationData, VerificationRecord};
use crate::domain::value_objects::{CompositeKey, RecordUpdate};
use crate::errors::{DomainError, DomainResult};

use super::context::RequestContext;
use super::generator::SecureCodeGenerator;
use super::traits::{CodeGenerator, VerificationStore};
use super::types::{CheckCodeRequest, CreateCodeRequest, IssueOutcome, IssuedCode};

/// Verification service issuing and consuming verification codes
pub struct VerificationService<S: VerificationStore + ?Sized, G: CodeGenerator = SecureCodeGenerator> {
    /// Record storage
    store: Arc<S>,
    /// Random code source
    generator: G,
    /// Service configuration
    config: VerificationConfig,
    /// Compiled input sanitizer, see [`Self::sanitize_code`]
    sanitize_pattern: Regex,
}

impl<S: VerificationStore + ?Sized + 'static> VerificationService<S, SecureCodeGenerator> {
    /// Create a service using the OS random source and the configured charset
    pub fn with_secure_generator(store: Arc<S>, config: VerificationConfig) -> DomainResult<Self> {
        let generator = SecureCodeGenerator::new(&config.code_charset)?;
        Self::new(store, generator, config)
    }
}

impl<S: VerificationStore + ?Sized + 'static, G: CodeGenerator> VerificationService<S, G> {
    /// Create a new verification service
    ///
    /// # Arguments
    ///
    /// * `store` - Store adapter holding verification records
    /// * `generator` - Code generator
    /// * `config` - Service configuration
    ///
    /// # Errors
    ///
    /// `InvalidInput` when the sanitize pattern does not compile, the table
    /// name is empty or the max fail count is zero.
    pub fn new(store: Arc<S>, generator: G, config: VerificationConfig) -> DomainResult<Self> {
        if config.table_name.trim().is_empty() {
            return Err(DomainError::invalid_input("table_name", "must not be empty"));
        }
        if config.max_fail_count == 0 {
            return Err(DomainError::invalid_input("max_fail_count", "must be greater than zero"));
        }

        let sanitize_pattern = RegexBuilder::new(&config.code_sanitize_pattern)
            .case_insensitive(true)
            .build()
            .map_err(|e| DomainError::invalid_input("code_sanitize_pattern", e.to_string()))?;

        Ok(Self {
            store,
            generator,
            config,
            sanitize_pattern,
        })
    }

    pub fn config(&self) -> &VerificationConfig {
        &self.config
    }

    /// Strip characters matching the configured sanitize pattern from raw user input
    ///
    /// Callers apply this before building a [`CheckCodeRequest`];
    /// [`Self::check_verification_code`] compares the candidate as given.
    pub fn sanitize_code(&self, raw: &str) -> String {
        sanitize_verification_code(raw, &self.sanitize_pattern)
    }

    /// Issue a new verification code
    ///
    /// This method:
    /// 1. Validates the request
    /// 2. Derives the composite key
    /// 3. Generates a new code
    /// 4. Checks the cooldown of any existing record
    /// 5. Stores the record, replacing any previous one
    ///
    /// # Returns
    ///
    /// * `Ok(IssueOutcome::Issued)` - The code was stored and should be delivered
    /// * `Ok(IssueOutcome::CooldownActive)` - A code was issued too recently; nothing written
    /// * `Err(DomainError)` - Invalid input, store failure or random source failure
    pub async fn create_verification_code(
        &self,
        ctx: &RequestContext,
        request: &CreateCodeRequest,
    ) -> DomainResult<IssueOutcome> {
        request.validate()?;

        let now = ctx.now();
        let key = request.key();
        let masked = mask_identifier(&request.communication_id);

        let data = VerificationData {
            partition_key: key.partition_key.clone(),
            record_key: key.record_key.clone(),
            code: self.generator.generate(request.code_length)?,
            created_at: now,
            expires_at: now.saturating_add(request.code_ttl),
        };

        if !self.check_cooldown(&key, request.cooldown_period, now).await? {
            tracing::warn!(
                entity_type = %request.entity_type,
                service_code = %request.service_code,
                communication_id = %masked,
                cooldown_period = request.cooldown_period,
                event = "cooldown_active",
                "Verification code requested within cooldown period"
            );
            return Ok(IssueOutcome::CooldownActive);
        }

        let issued = IssuedCode {
            code: data.code.clone(),
            created_at: data.created_at,
            expires_at: data.expires_at,
        };
        self.store_verification_data(data).await?;

        tracing::info!(
            entity_type = %request.entity_type,
            service_code = %request.service_code,
            communication_id = %masked,
            expires_at = issued.expires_at,
            event = "code_issued",
            "Issued new verification code"
        );

        Ok(IssueOutcome::Issued(issued))
    }

    /// Check a candidate code, consuming it on success
    ///
    /// The candidate must equal the stored code exactly. Returns `Ok(false)`
    /// when no record exists, the record is expired or exhausted, or the code
    /// does not match. A mismatch increments the fail
    /// count; a match schedules deletion of the record on the context's
    /// background tasks and returns without waiting for it.
    pub async fn check_verification_code(
        &self,
        ctx: &RequestContext,
        request: &CheckCodeRequest,
    ) -> DomainResult<bool> {
        request.validate()?;

        let key = request.key();
        let masked = mask_identifier(&request.communication_id);

        let is_valid = self
            .consume_verification_code(ctx, &key, &request.verification_code)
            .await?;

        if is_valid {
            tracing::info!(
                entity_type = %request.entity_type,
                service_code = %request.service_code,
                communication_id = %masked,
                event = "code_verified",
                "Verification code accepted"
            );
        } else {
            tracing::info!(
                entity_type = %request.entity_type,
                service_code = %request.service_code,
                communication_id = %masked,
                event = "code_rejected",
                "Verification code rejected"
            );
        }

        Ok(is_valid)
    }

    /// Whether a new code may be issued for `key` at `now`
    ///
    /// A missing record or an elapsed cooldown means available. Store read
    /// errors are returned, so issuance fails closed.
    pub async fn check_cooldown(&self, key: &CompositeKey, cooldown_period: i64, now: i64) -> DomainResult<bool> {
        let record = self.store.get(&self.config.table_name, key).await.map_err(|e| {
            tracing::error!(key = %key.partition_key, error = %e, event = "cooldown_read_failed", "Failed to read verification record");
            DomainError::from(e)
        })?;

        Ok(match record {
            Some(record) => !record.is_cooling_down(cooldown_period, now),
            None => true,
        })
    }

    /// Persist issuance output as a fresh record
    async fn store_verification_data(&self, data: VerificationData) -> DomainResult<()> {
        let record = VerificationRecord::from(data);

        let acknowledged = self
            .store
            .put(&self.config.table_name, &record)
            .await
            .map_err(|e| {
                tracing::error!(
                    key = %record.partition_key,
                    error = %e,
                    event = "code_storage_failed",
                    "Failed to store verification code"
                );
                DomainError::from(e)
            })?;

        if !acknowledged {
            tracing::error!(
                key = %record.partition_key,
                event = "code_storage_not_acknowledged",
                "Store did not acknowledge verification code write"
            );
            return Err(DomainError::WriteNotAcknowledged);
        }

        Ok(())
    }

    /// Compare `candidate` with the stored record and apply the side effects
    async fn consume_verification_code(
        &self,
        ctx: &RequestContext,
        key: &CompositeKey,
        candidate: &str,
    ) -> DomainResult<bool> {
        let table = &self.config.table_name;

        let record = match self.store.get(table, key).await {
            Ok(Some(record)) => record,
            Ok(None) => return Ok(false),
            Err(e) => {
                tracing::error!(key = %key.partition_key, error = %e, event = "code_read_failed", "Failed to read verification record");
                return Err(e.into());
            }
        };

        // Unusable records are left alone; reissue overwrites them
        if !record.is_consumable(ctx.now(), self.config.max_fail_count) {
            tracing::debug!(
                key = %key.partition_key,
                expired = record.is_expired(ctx.now()),
                fail_count = record.fail_count,
                "Verification record no longer consumable"
            );
            return Ok(false);
        }

        if !codes_match(candidate, &record.code) {
            let update = RecordUpdate::increment(fields::FAIL_COUNT, 1);
            match self.store.update(table, key, &update).await {
                Ok(true) => {}
                Ok(false) => {
                    tracing::warn!(key = %key.partition_key, event = "fail_count_not_updated", "Record vanished before fail count increment");
                }
                Err(e) => {
                    tracing::warn!(key = %key.partition_key, error = %e, event = "fail_count_update_failed", "Failed to increment fail count");
                }
            }
            return Ok(false);
        }

        let store = Arc::clone(&self.store);
        let table = table.clone();
        let key = key.clone();
        ctx.tasks().spawn(async move {
            match store.delete(&table, &key).await {
                Ok(true) => {
                    tracing::debug!(key = %key.partition_key, event = "code_consumed", "Deleted consumed verification record");
                }
                Ok(false) => {
                    tracing::debug!(key = %key.partition_key, "Consumed verification record already gone");
                }
                Err(e) => {
                    tracing::warn!(key = %key.partition_key, error = %e, event = "code_cleanup_failed", "Failed to delete consumed verification record");
                }
            }
        });

        Ok(true)
    }
}

/// Exact, constant time code comparison
fn codes_match(candidate: &str, stored: &str) -> bool {
    candidate.len() == stored.len() && constant_time_eq(candidate.as_bytes(), stored.as_bytes())
}
