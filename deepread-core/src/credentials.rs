//! Credential storage for provider API keys.
//!
//! Provides a trait-based abstraction over credential storage with two implementations:
//! - `KeyringCredentialStore`: Uses the OS-native credential store (macOS Keychain,
//!   Windows Credential Manager, Linux Secret Service).
//! - `InMemoryCredentialStore`: In-memory store for testing and one-shot sessions.
//!
//! Keys are looked up by a fixed name (see [`crate::config::GENERATION_CREDENTIAL_KEY`]).
//! A missing entry means "not configured".

use crate::config::GenerationConfig;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

const SERVICE: &str = "deepread";

/// Errors from credential storage operations.
#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    #[error("Credential not found for {service}:{account}")]
    NotFound { service: String, account: String },

    #[error("Failed to store credential: {message}")]
    StoreFailed { message: String },

    #[error("Failed to delete credential: {message}")]
    DeleteFailed { message: String },

    #[error("Keyring backend not available: {message}")]
    BackendUnavailable { message: String },
}

/// Trait for credential storage backends.
pub trait CredentialStore: Send + Sync {
    /// Store a secret under the given key name, replacing any previous value.
    fn store_key(&self, key: &str, secret: &str) -> Result<(), CredentialError>;

    /// Retrieve the secret stored under the given key name.
    fn get_key(&self, key: &str) -> Result<String, CredentialError>;

    /// Delete the secret stored under the given key name.
    fn delete_key(&self, key: &str) -> Result<(), CredentialError>;

    /// Check whether a secret exists for the given key name.
    fn has_key(&self, key: &str) -> bool {
        self.get_key(key).is_ok()
    }
}

/// OS-native credential store using the `keyring` crate.
///
/// Stores credentials under service `"deepread"` with the key name as account.
pub struct KeyringCredentialStore {
    service: String,
}

impl KeyringCredentialStore {
    pub fn new() -> Self {
        Self {
            service: SERVICE.to_string(),
        }
    }

    fn entry(&self, key: &str) -> Result<keyring::Entry, CredentialError> {
        keyring::Entry::new(&self.service, key).map_err(|e| CredentialError::BackendUnavailable {
            message: e.to_string(),
        })
    }
}

impl Default for KeyringCredentialStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CredentialStore for KeyringCredentialStore {
    fn store_key(&self, key: &str, secret: &str) -> Result<(), CredentialError> {
        self.entry(key)?
            .set_password(secret)
            .map_err(|e| CredentialError::StoreFailed {
                message: e.to_string(),
            })
    }

    fn get_key(&self, key: &str) -> Result<String, CredentialError> {
        self.entry(key)?.get_password().map_err(|e| match e {
            keyring::Error::NoEntry => CredentialError::NotFound {
                service: self.service.clone(),
                account: key.to_string(),
            },
            other => CredentialError::StoreFailed {
                message: other.to_string(),
            },
        })
    }

    fn delete_key(&self, key: &str) -> Result<(), CredentialError> {
        self.entry(key)?
            .delete_credential()
            .map_err(|e| CredentialError::DeleteFailed {
                message: e.to_string(),
            })
    }
}

/// In-memory credential store.
///
/// Thread-safe via `Mutex<HashMap>`. Does not persist across process restarts.
#[derive(Default)]
pub struct InMemoryCredentialStore {
    store: Mutex<HashMap<String, String>>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store pre-populated with one key.
    pub fn with_key(key: &str, secret: &str) -> Self {
        let store = Self::new();
        store.entries().insert(key.to_string(), secret.to_string());
        store
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<String, String>> {
        self.store.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl CredentialStore for InMemoryCredentialStore {
    fn store_key(&self, key: &str, secret: &str) -> Result<(), CredentialError> {
        self.entries().insert(key.to_string(), secret.to_string());
        Ok(())
    }

    fn get_key(&self, key: &str) -> Result<String, CredentialError> {
        self.entries()
            .get(key)
            .cloned()
            .ok_or_else(|| CredentialError::NotFound {
                service: SERVICE.to_string(),
                account: key.to_string(),
            })
    }

    fn delete_key(&self, key: &str) -> Result<(), CredentialError> {
        self.entries().remove(key);
        Ok(())
    }

    fn has_key(&self, key: &str) -> bool {
        self.entries().contains_key(key)
    }
}

/// Where a resolved generation key came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeySource {
    Config,
    CredentialStore,
    Environment,
}

impl std::fmt::Display for KeySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KeySource::Config => write!(f, "config file"),
            KeySource::CredentialStore => write!(f, "credential store"),
            KeySource::Environment => write!(f, "environment"),
        }
    }
}

/// Resolve the generation API key: inline config, then credential store, then env var.
///
/// Returns `None` when nothing is configured. Credential store failures other
/// than a missing entry are logged and treated as absent.
pub fn resolve_generation_key(
    config: &GenerationConfig,
    store: &dyn CredentialStore,
) -> Option<(String, KeySource)> {
    if let Some(key) = config.api_key.as_deref().filter(|k| !k.trim().is_empty()) {
        return Some((key.to_string(), KeySource::Config));
    }

    match store.get_key(&config.credential_store_key) {
        Ok(key) if !key.trim().is_empty() => return Some((key, KeySource::CredentialStore)),
        Ok(_) | Err(CredentialError::NotFound { .. }) => {}
        Err(e) => tracing::warn!(error = %e, "Credential store lookup failed"),
    }

    std::env::var(&config.api_key_env)
        .ok()
        .filter(|k| !k.trim().is_empty())
        .map(|k| (k, KeySource::Environment))
}
