//! Cryptographically secure code generation

use rand::{rngs::OsRng, RngCore};

use crate::errors::{DomainError, DomainResult};

use super::traits::CodeGenerator;

/// Charsets are indexed by a single random byte
const MAX_CHARSET_SIZE: usize = 256;

/// Code generator backed by the operating system CSPRNG
///
/// Each symbol is drawn uniformly from the charset. Bytes that would bias
/// the modulo reduction are discarded and redrawn.
#[derive(Debug, Clone)]
pub struct SecureCodeGenerator {
    charset: Vec<char>,
}

impl SecureCodeGenerator {
    pub fn new(charset: &str) -> DomainResult<Self> {
        let charset: Vec<char> = charset.chars().collect();
        if charset.is_empty() {
            return Err(DomainError::invalid_input("code_charset", "must not be empty"));
        }
        if charset.len() > MAX_CHARSET_SIZE {
            return Err(DomainError::invalid_input(
                "code_charset",
                format!("must contain at most {} symbols", MAX_CHARSET_SIZE),
            ));
        }
        Ok(Self { charset })
    }

    pub fn charset_len(&self) -> usize {
        self.charset.len()
    }

    /// Largest multiple of the charset size that fits in a byte
    fn acceptance_zone(&self) -> usize {
        MAX_CHARSET_SIZE - (MAX_CHARSET_SIZE % self.charset.len())
    }
}

impl Default for SecureCodeGenerator {
    fn default() -> Self {
        Self {
            charset: vc_shared::config::verification::DEFAULT_CODE_CHARSET.chars().collect(),
        }
    }
}

impl CodeGenerator for SecureCodeGenerator {
    fn generate(&self, length: usize) -> DomainResult<String> {
        if length == 0 {
            return Err(DomainError::invalid_input("code_length", "must be greater than zero"));
        }

        let zone = self.acceptance_zone();
        let mut code = String::with_capacity(length);
        let mut produced = 0;
        let mut buf = [0u8; 32];

        while produced < length {
            OsRng.try_fill_bytes(&mut buf).map_err(|e| {
                tracing::error!(error = %e, event = "random_source_failed", "OS random source failed");
                DomainError::RandomSource {
                    message: e.to_string(),
                }
            })?;

            for byte in buf {
                let byte = usize::from(byte);
                if byte >= zone {
                    continue;
                }
                code.push(self.charset[byte % self.charset.len()]);
                produced += 1;
                if produced == length {
                    break;
                }
            }
        }

        Ok(code)
    }
}
