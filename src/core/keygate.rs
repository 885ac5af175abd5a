//! API-key gate.
//!
//! Guards every generation feature until a usable Gemini API key is
//! confirmed. The gate owns the credential state; the rest of the app only
//! reads a ready/not-ready signal and reports authorization failures back.
//!
//! State machine: `Unresolved → {Ready, NotReady}`; `NotReady → Ready` via
//! [`KeyGate::request_selection`]; `Ready → NotReady` (forced) via
//! [`KeyGate::report_authorization_failure`]. No terminal state.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

#[cfg(feature = "keyring")]
use crate::core::credentials::{
    validate_api_key, CredentialError, CredentialManager, GEMINI_KEY_NAME,
};

/// Environment variable consulted before any backing store.
pub const ENV_KEY_NAME: &str = "GEMINI_API_KEY";

// ============================================================================
// Selector capability
// ============================================================================

#[derive(Debug, Error)]
pub enum SelectorError {
    /// The backing store lost the entry that was just selected.
    #[error("Requested entity was not found: {0}")]
    NotFound(String),

    #[error("Invalid API key: {0}")]
    InvalidKey(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

pub type SelectorResult<T> = std::result::Result<T, SelectorError>;

/// Host capability for selecting and supplying an API key.
///
/// The gate treats this capability as optional: when none is wired, the
/// environment is assumed to carry an injected key (see
/// `gemini.trust_env_key`).
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait KeySelector: Send + Sync {
    /// Whether a usable key is currently selected.
    async fn has_selected_key(&self) -> SelectorResult<bool>;

    /// Persist a freshly selected key.
    async fn select_key(&self, key: &str) -> SelectorResult<()>;

    /// Current key material, re-read on every call. Never cached.
    fn api_key(&self) -> Option<String>;
}

/// Key injected by the environment, if any.
pub fn env_api_key() -> Option<String> {
    std::env::var(ENV_KEY_NAME)
        .ok()
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty())
}

/// Resolve the key for a generation call: environment override first, then
/// the selector's store. Called fresh per request so mid-session rotation
/// takes effect immediately.
pub fn resolve_api_key(selector: Option<&Arc<dyn KeySelector>>) -> Option<String> {
    env_api_key().or_else(|| selector.and_then(|s| s.api_key()))
}

// ============================================================================
// Gate state machine
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyStatus {
    /// Not yet probed.
    Unresolved,
    /// A usable key is available; generation calls may proceed.
    Ready,
    /// No usable key; the selection affordance must be shown.
    NotReady,
}

/// User-facing message after an upstream credential rejection.
pub const MSG_KEY_REJECTED: &str =
    "The previous API key was invalid or does not have permission for this model.";
/// User-facing message for the store-lost-the-entry selection failure.
pub const MSG_SESSION_INVALID: &str = "Session expired or invalid. Please select a key again.";
const MSG_SELECT_FAILED: &str = "Failed to select key. Please try again.";
const MSG_PROBE_FAILED: &str = "Failed to verify API key status.";

pub struct KeyGate {
    selector: Option<Arc<dyn KeySelector>>,
    trust_env_key: bool,
    status: KeyStatus,
    forced_reselection: bool,
    last_error: Option<String>,
}

impl KeyGate {
    pub fn new(selector: Option<Arc<dyn KeySelector>>, trust_env_key: bool) -> Self {
        Self {
            selector,
            trust_env_key,
            status: KeyStatus::Unresolved,
            forced_reselection: false,
            last_error: None,
        }
    }

    pub fn status(&self) -> KeyStatus {
        self.status
    }

    pub fn is_ready(&self) -> bool {
        self.status == KeyStatus::Ready
    }

    pub fn forced_reselection(&self) -> bool {
        self.forced_reselection
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn selector(&self) -> Option<&Arc<dyn KeySelector>> {
        self.selector.as_ref()
    }

    /// Probe whether a usable key is present.
    ///
    /// While a forced reselection is pending the probe is skipped entirely:
    /// a cached "selected" answer is exactly what got us rejected.
    pub async fn check_availability(&mut self) -> KeyStatus {
        if self.forced_reselection {
            self.status = KeyStatus::NotReady;
            return self.status;
        }

        match &self.selector {
            None => {
                if self.trust_env_key || env_api_key().is_some() {
                    log::warn!(
                        "No key-selection capability wired — assuming an environment-injected key"
                    );
                    self.status = KeyStatus::Ready;
                    self.last_error = None;
                } else {
                    self.status = KeyStatus::NotReady;
                    self.last_error = Some("No API key source is available.".to_string());
                }
            }
            Some(selector) => match selector.has_selected_key().await {
                Ok(true) => {
                    self.status = KeyStatus::Ready;
                    self.last_error = None;
                }
                Ok(false) => {
                    self.status = KeyStatus::NotReady;
                }
                Err(e) => {
                    log::error!("Key availability probe failed: {e}");
                    self.status = KeyStatus::NotReady;
                    self.last_error = Some(MSG_PROBE_FAILED.to_string());
                }
            },
        }

        self.status
    }

    /// Drive the interactive selection flow with a freshly provided key.
    ///
    /// On success the gate clears any prior error (including a forced
    /// reselection) and reports Ready. A missing-entry failure from the
    /// backing store gets its own session-invalidated message, distinct
    /// from a generic selection failure.
    pub async fn request_selection(&mut self, key: &str) -> KeyStatus {
        let Some(selector) = self.selector.clone() else {
            log::error!("Key selection requested but no selection capability is wired");
            self.status = KeyStatus::NotReady;
            self.last_error = Some("No key selection capability is available.".to_string());
            return self.status;
        };

        match selector.select_key(key).await {
            Ok(()) => {
                self.status = KeyStatus::Ready;
                self.forced_reselection = false;
                self.last_error = None;
            }
            Err(SelectorError::NotFound(entry)) => {
                log::warn!("Key selection lost its entry: {entry}");
                self.status = KeyStatus::NotReady;
                self.last_error = Some(MSG_SESSION_INVALID.to_string());
            }
            Err(e) => {
                log::error!("Key selection failed: {e}");
                self.status = KeyStatus::NotReady;
                self.last_error = Some(MSG_SELECT_FAILED.to_string());
            }
        }

        self.status
    }

    /// Called when any downstream call is rejected for credential reasons.
    /// Forces the gate back to not-ready regardless of cached readiness.
    pub fn report_authorization_failure(&mut self) {
        log::warn!("Upstream rejected the API key — forcing reselection");
        self.status = KeyStatus::NotReady;
        self.forced_reselection = true;
        self.last_error = Some(MSG_KEY_REJECTED.to_string());
    }
}

// ============================================================================
// Keychain-backed selector
// ============================================================================

/// Production [`KeySelector`] backed by the OS keychain, with the
/// environment variable taking precedence on reads.
#[cfg(feature = "keyring")]
pub struct KeychainSelector {
    store: CredentialManager,
}

#[cfg(feature = "keyring")]
impl KeychainSelector {
    pub fn new() -> Self {
        Self {
            store: CredentialManager::new(),
        }
    }
}

#[cfg(feature = "keyring")]
impl Default for KeychainSelector {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "keyring")]
#[async_trait]
impl KeySelector for KeychainSelector {
    async fn has_selected_key(&self) -> SelectorResult<bool> {
        Ok(env_api_key().is_some() || self.store.has_secret(GEMINI_KEY_NAME))
    }

    async fn select_key(&self, key: &str) -> SelectorResult<()> {
        if !validate_api_key(key) {
            return Err(SelectorError::InvalidKey(
                "Gemini API keys start with \"AIza\"".to_string(),
            ));
        }

        self.store
            .store_secret(GEMINI_KEY_NAME, key.trim())
            .map_err(|e| SelectorError::Storage(e.to_string()))?;

        // Read back to confirm the keychain actually kept the entry.
        match self.store.get_secret(GEMINI_KEY_NAME) {
            Ok(_) => Ok(()),
            Err(CredentialError::NotFound(entry)) => Err(SelectorError::NotFound(entry)),
            Err(e) => Err(SelectorError::Storage(e.to_string())),
        }
    }

    fn api_key(&self) -> Option<String> {
        env_api_key().or_else(|| self.store.get_secret(GEMINI_KEY_NAME).ok())
    }
}
