//! Composite key derivation for verification records.
//!
//! A record is addressed by two strings:
//! - partition key: `entity_type.entity_id`
//! - record key: `service_code.communication_id`
//!
//! The leading component of each key (`entity_type`, `service_code`) must not
//! contain [`KEY_SEPARATOR`]; the flows reject such input, which keeps the
//! mapping injective (split at the first separator). The trailing component
//! may contain it, so email addresses work as communication ids.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Separator between the two components of a key
pub const KEY_SEPARATOR: char = '.';

/// Build the partition key from entity details
pub fn partition_key(entity_type: &str, entity_id: &str) -> String {
    format!("{}{}{}", entity_type, KEY_SEPARATOR, entity_id)
}

/// Build the record key from service and channel details
pub fn record_key(service_code: &str, communication_id: &str) -> String {
    format!("{}{}{}", service_code, KEY_SEPARATOR, communication_id)
}

/// Composite key uniquely addressing one verification record
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CompositeKey {
    /// Owning entity (`entity_type.entity_id`)
    pub partition_key: String,
    /// Verification purpose (`service_code.communication_id`)
    pub record_key: String,
}

impl CompositeKey {
    pub fn new(partition_key: impl Into<String>, record_key: impl Into<String>) -> Self {
        Self {
            partition_key: partition_key.into(),
            record_key: record_key.into(),
        }
    }

    /// Derive both keys from raw request identifiers
    pub fn derive(
        entity_type: &str,
        entity_id: &str,
        service_code: &str,
        communication_id: &str,
    ) -> Self {
        Self {
            partition_key: partition_key(entity_type, entity_id),
            record_key: record_key(service_code, communication_id),
        }
    }
}

impl fmt::Display for CompositeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.partition_key, self.record_key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partition_and_record_key_format() {
        assert_eq!(partition_key("acme", "abc"), "acme.abc");
        assert_eq!(record_key("login-phone", "+919999999999"), "login-phone.+919999999999");
    }

    #[test]
    fn test_key_derivation_is_pure() {
        let first = CompositeKey::derive("acme", "abc", "login-phone", "+919999999999");
        let second = CompositeKey::derive("acme", "abc", "login-phone", "+919999999999");

        assert_eq!(first, second);
        assert_eq!(first.partition_key, "acme.abc");
        assert_eq!(first.record_key, "login-phone.+919999999999");
    }

    #[test]
    fn test_email_communication_id_keeps_dots() {
        let key = CompositeKey::derive("user", "u-1", "change-email", "first.last@example.com");
        assert_eq!(key.record_key, "change-email.first.last@example.com");

        let (service, channel) = key.record_key.split_once(KEY_SEPARATOR).unwrap();
        assert_eq!(service, "change-email");
        assert_eq!(channel, "first.last@example.com");
    }

    #[test]
    fn test_distinct_services_do_not_collide() {
        let login = CompositeKey::derive("acme", "abc", "login-phone", "+1555");
        let register = CompositeKey::derive("acme", "abc", "register-phone", "+1555");
        assert_ne!(login, register);
    }

    #[test]
    fn test_display() {
        let key = CompositeKey::new("acme.abc", "login-phone.+1555");
        assert_eq!(key.to_string(), "acme.abc/login-phone.+1555");
    }
}
