//! Verification code configuration

use serde::{Deserialize, Serialize};

/// Symbols a generated code is drawn from. Only digits.
pub const DEFAULT_CODE_CHARSET: &str = "0123456789";

/// Characters stripped from user supplied codes before comparison.
pub const DEFAULT_CODE_SANITIZE_PATTERN: &str = "[^0-9]";

/// Wrong guesses allowed before a code deactivates itself.
pub const DEFAULT_MAX_FAIL_COUNT: u32 = 3;

/// Backing store collection holding verification records.
pub const DEFAULT_TABLE_NAME: &str = "verification_code";

/// Verification code constraints
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct VerificationConfig {
    /// Allowed symbols for generated codes
    #[serde(default = "default_code_charset")]
    pub code_charset: String,

    /// Regular expression matching characters to strip from raw user input
    /// before it is submitted for checking (applied case-insensitively)
    #[serde(default = "default_code_sanitize_pattern")]
    pub code_sanitize_pattern: String,

    /// Max number of wrong codes before the code stops being accepted
    #[serde(default = "default_max_fail_count")]
    pub max_fail_count: u32,

    /// Name of the backing store table
    #[serde(default = "default_table_name")]
    pub table_name: String,
}

impl Default for VerificationConfig {
    fn default() -> Self {
        Self {
            code_charset: default_code_charset(),
            code_sanitize_pattern: default_code_sanitize_pattern(),
            max_fail_count: default_max_fail_count(),
            table_name: default_table_name(),
        }
    }
}

impl VerificationConfig {
    /// Create from environment variables, falling back to defaults
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            code_charset: std::env::var("VERIFY_CODE_CHARSET")
                .ok()
                .filter(|v| !v.is_empty())
                .unwrap_or(defaults.code_charset),
            code_sanitize_pattern: std::env::var("VERIFY_CODE_SANITIZE_REGEX")
                .unwrap_or(defaults.code_sanitize_pattern),
            max_fail_count: std::env::var("VERIFY_CODE_FAIL_MAX_COUNT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_fail_count),
            table_name: std::env::var("VERIFY_DB_SOURCE").unwrap_or(defaults.table_name),
        }
    }

    /// Override the backing table name
    pub fn with_table_name(mut self, table_name: impl Into<String>) -> Self {
        self.table_name = table_name.into();
        self
    }

    /// Override the maximum fail count
    pub fn with_max_fail_count(mut self, max_fail_count: u32) -> Self {
        self.max_fail_count = max_fail_count;
        self
    }

    /// Override the code charset
    pub fn with_code_charset(mut self, charset: impl Into<String>) -> Self {
        self.code_charset = charset.into();
        self
    }
}

fn default_code_charset() -> String {
    DEFAULT_CODE_CHARSET.to_string()
}

fn default_code_sanitize_pattern() -> String {
    DEFAULT_CODE_SANITIZE_PATTERN.to_string()
}

fn default_max_fail_count() -> u32 {
    DEFAULT_MAX_FAIL_COUNT
}

fn default_table_name() -> String {
    DEFAULT_TABLE_NAME.to_string()
}
