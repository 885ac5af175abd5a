//! Secure Credential Storage
//!
//! Uses the system keychain (Keyring) for secure storage of the Gemini
//! API key. The key never touches the config file or the log stream.

use thiserror::Error;

const SERVICE_NAME: &str = "campaigner";

/// Keychain entry name for the Gemini API key.
pub const GEMINI_KEY_NAME: &str = "gemini_api_key";

// ============================================================================
// Error Types
// ============================================================================

#[derive(Error, Debug)]
pub enum CredentialError {
    #[error("Keyring error: {0}")]
    KeyringError(#[from] keyring::Error),

    #[error("Credential not found: {0}")]
    NotFound(String),
}

pub type Result<T> = std::result::Result<T, CredentialError>;

// ============================================================================
// Credential Manager
// ============================================================================

pub struct CredentialManager {
    service: String,
}

impl Default for CredentialManager {
    fn default() -> Self {
        Self::new()
    }
}

impl CredentialManager {
    pub fn new() -> Self {
        Self {
            service: SERVICE_NAME.to_string(),
        }
    }

    pub fn with_service(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    /// Store a raw string secret
    pub fn store_secret(&self, key: &str, value: &str) -> Result<()> {
        let entry = keyring::Entry::new(&self.service, key)?;
        entry.set_password(value)?;
        log::info!("Stored secret for key: {}", key);
        Ok(())
    }

    /// Retrieve a raw string secret
    pub fn get_secret(&self, key: &str) -> Result<String> {
        let entry = keyring::Entry::new(&self.service, key)?;
        match entry.get_password() {
            Ok(value) => Ok(value),
            Err(keyring::Error::NoEntry) => Err(CredentialError::NotFound(key.to_string())),
            Err(e) => Err(CredentialError::KeyringError(e)),
        }
    }

    /// Delete a secret
    pub fn delete_secret(&self, key: &str) -> Result<()> {
        let entry = keyring::Entry::new(&self.service, key)?;
        match entry.delete_password() {
            Ok(()) => {
                log::info!("Deleted secret for key: {}", key);
                Ok(())
            }
            Err(keyring::Error::NoEntry) => Ok(()), // Already deleted
            Err(e) => Err(CredentialError::KeyringError(e)),
        }
    }

    /// Check if a secret exists
    pub fn has_secret(&self, key: &str) -> bool {
        self.get_secret(key).is_ok()
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Mask an API key for display (show first 4 and last 4 chars)
pub fn mask_api_key(key: &str) -> String {
    if key.len() <= 8 {
        return "********".to_string();
    }
    format!("{}...{}", &key[..4], &key[key.len() - 4..])
}

/// Check if a key has valid Gemini API key format.
///
/// Gemini API keys start with "AIza". This is a pure format check and does
/// not verify the key is actually accepted by the API.
pub fn validate_api_key(key: &str) -> bool {
    let trimmed = key.trim();
    !trimmed.is_empty() && trimmed.starts_with("AIza")
}
