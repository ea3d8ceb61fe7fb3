//! Request and result types for verification operations

use serde::{Deserialize, Serialize};

use crate::domain::value_objects::{CompositeKey, KEY_SEPARATOR};
use crate::errors::{DomainError, DomainResult};

/// Request to issue a new verification code
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateCodeRequest {
    /// Namespace entity type (e.g. `user`, `acme`)
    pub entity_type: String,
    /// Namespace entity id
    pub entity_id: String,
    /// Purpose of the code (e.g. `login-phone`, `change-email`)
    pub service_code: String,
    /// Phone number with country code, or email address
    pub communication_id: String,
    /// Number of symbols in the generated code
    pub code_length: usize,
    /// Seconds before another code may be issued for the same key pair
    pub cooldown_period: i64,
    /// Lifetime of the code in seconds
    pub code_ttl: i64,
}

impl CreateCodeRequest {
    pub fn validate(&self) -> DomainResult<()> {
        validate_identifiers(
            &self.entity_type,
            &self.entity_id,
            &self.service_code,
            &self.communication_id,
        )?;

        if self.code_length == 0 {
            return Err(DomainError::invalid_input("code_length", "must be greater than zero"));
        }
        if self.code_ttl <= 0 {
            return Err(DomainError::invalid_input("code_ttl", "must be greater than zero"));
        }
        if self.cooldown_period < 0 {
            return Err(DomainError::invalid_input("cooldown_period", "must not be negative"));
        }
        Ok(())
    }

    pub fn key(&self) -> CompositeKey {
        CompositeKey::derive(
            &self.entity_type,
            &self.entity_id,
            &self.service_code,
            &self.communication_id,
        )
    }
}

/// Request to check (and on success consume) a verification code
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckCodeRequest {
    pub entity_type: String,
    pub entity_id: String,
    pub service_code: String,
    pub communication_id: String,
    /// Candidate code as entered by the user
    pub verification_code: String,
}

impl CheckCodeRequest {
    pub fn validate(&self) -> DomainResult<()> {
        validate_identifiers(
            &self.entity_type,
            &self.entity_id,
            &self.service_code,
            &self.communication_id,
        )
    }

    pub fn key(&self) -> CompositeKey {
        CompositeKey::derive(
            &self.entity_type,
            &self.entity_id,
            &self.service_code,
            &self.communication_id,
        )
    }
}

fn validate_identifiers(
    entity_type: &str,
    entity_id: &str,
    service_code: &str,
    communication_id: &str,
) -> DomainResult<()> {
    let required = [
        ("entity_type", entity_type),
        ("entity_id", entity_id),
        ("service_code", service_code),
        ("communication_id", communication_id),
    ];
    for (field, value) in required {
        if value.trim().is_empty() {
            return Err(DomainError::invalid_input(field, "must not be empty"));
        }
    }

    // Leading key components are split on the separator
    for (field, value) in [("entity_type", entity_type), ("service_code", service_code)] {
        if value.contains(KEY_SEPARATOR) {
            return Err(DomainError::invalid_input(
                field,
                format!("must not contain '{}'", KEY_SEPARATOR),
            ));
        }
    }
    Ok(())
}

/// A freshly issued code
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuedCode {
    /// The code to deliver to the user
    pub code: String,
    /// Issuance time (unix seconds)
    pub created_at: i64,
    /// Expiry time (unix seconds)
    pub expires_at: i64,
}

/// Result of an issuance request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IssueOutcome {
    /// A new code was stored
    Issued(IssuedCode),
    /// A code for the same key pair was issued within the cooldown period
    CooldownActive,
}

impl IssueOutcome {
    pub fn code(&self) -> Option<&str> {
        match self {
            Self::Issued(issued) => Some(&issued.code),
            Self::CooldownActive => None,
        }
    }

    pub fn is_cooldown_active(&self) -> bool {
        matches!(self, Self::CooldownActive)
    }
}
