//! Secret stores backing the server password reference.
//!
//! The settings record only holds the *name* of a secret. Resolution happens
//! at probe time through a [`SecretStore`]; the resolved value is handed to the
//! caller and never cached, logged or persisted here.

use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, warn};

static SERVICE: &str = "opencode";
/// Environment variable used to select the secret resolution backend.
pub const SECRETS_BACKEND_ENV_VAR: &str = "OPENCODE_SECRETS_BACKEND";

/// Lookup of a secret value by name.
pub trait SecretStore: Send + Sync {
    /// Returns the secret stored under `name`, or `None` when there is none.
    fn get_secret(&self, name: &str) -> Option<String>;
}

/// Secret resolution backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecretsBackend {
    /// Resolve secrets via the OS keychain (`keyring-rs`).
    Keychain,
    /// Resolve secrets from the process environment variable of the same name.
    Environment,
}

impl SecretsBackend {
    fn from_env_var(raw: Option<String>) -> Self {
        match raw.unwrap_or_default().trim().to_ascii_lowercase().as_str() {
            "env" => Self::Environment,
            _ => Self::Keychain,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Self::Keychain => "keychain",
            Self::Environment => "env",
        }
    }
}

/// Determine the currently configured secrets backend.
pub fn secrets_backend() -> SecretsBackend {
    let configured_value = std::env::var(SECRETS_BACKEND_ENV_VAR).ok();
    SecretsBackend::from_env_var(configured_value)
}

/// Build the store selected by [`SECRETS_BACKEND_ENV_VAR`].
pub fn default_secret_store() -> Arc<dyn SecretStore> {
    match secrets_backend() {
        SecretsBackend::Keychain => Arc::new(KeychainSecretStore::new()),
        SecretsBackend::Environment => Arc::new(EnvironmentSecretStore),
    }
}

/// OS keychain entries under a fixed service name.
#[derive(Debug, Clone)]
pub struct KeychainSecretStore {
    service: String,
}

impl KeychainSecretStore {
    pub fn new() -> Self {
        Self::with_service(SERVICE)
    }

    pub fn with_service(service: impl Into<String>) -> Self {
        Self { service: service.into() }
    }

    fn entry(&self, name: &str) -> Result<keyring::Entry, SecretStoreError> {
        keyring::Entry::new(&self.service, name).map_err(|e| SecretStoreError::KeyringError {
            name: name.to_string(),
            error: e.to_string(),
        })
    }

    /// Store a secret in the OS keychain.
    pub fn store(&self, name: &str, value: &str) -> Result<(), SecretStoreError> {
        self.entry(name)?.set_password(value).map_err(|e| SecretStoreError::KeyringError {
            name: name.to_string(),
            error: e.to_string(),
        })?;
        debug!("Stored secret in keychain: {}", name);
        Ok(())
    }

    /// Remove a secret from the OS keychain.
    pub fn remove(&self, name: &str) -> Result<(), SecretStoreError> {
        self.entry(name)?.delete_credential().map_err(|e| SecretStoreError::KeyringError {
            name: name.to_string(),
            error: e.to_string(),
        })?;
        debug!("Removed secret from keychain: {}", name);
        Ok(())
    }
}

impl Default for KeychainSecretStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SecretStore for KeychainSecretStore {
    fn get_secret(&self, name: &str) -> Option<String> {
        let entry = match self.entry(name) {
            Ok(entry) => entry,
            Err(error) => {
                warn!(%error, "cannot open keychain entry");
                return None;
            }
        };
        match entry.get_password() {
            Ok(value) => Some(value),
            Err(keyring::Error::NoEntry) => {
                debug!(secret = name, "no keychain entry for secret");
                None
            }
            Err(error) => {
                warn!(secret = name, %error, "keyring error");
                None
            }
        }
    }
}

/// Reads secrets from process environment variables.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvironmentSecretStore;

impl SecretStore for EnvironmentSecretStore {
    fn get_secret(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

/// In-memory secrets, for hosts that manage secrets themselves.
#[derive(Debug, Clone, Default)]
pub struct StaticSecretStore {
    secrets: HashMap<String, String>,
}

impl StaticSecretStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_secret(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.secrets.insert(name.into(), value.into());
        self
    }
}

impl SecretStore for StaticSecretStore {
    fn get_secret(&self, name: &str) -> Option<String> {
        self.secrets.get(name).cloned()
    }
}

/// Store a secret using the configured backend. Only the keychain is writable.
pub fn store_secret(name: &str, value: &str) -> Result<(), SecretStoreError> {
    match secrets_backend() {
        SecretsBackend::Keychain => KeychainSecretStore::new().store(name, value),
        backend => Err(SecretStoreError::ReadOnlyBackend { backend: backend.name() }),
    }
}

/// Remove a secret using the configured backend.
pub fn remove_secret(name: &str) -> Result<(), SecretStoreError> {
    match secrets_backend() {
        SecretsBackend::Keychain => KeychainSecretStore::new().remove(name),
        backend => Err(SecretStoreError::ReadOnlyBackend { backend: backend.name() }),
    }
}

/// Errors from writing or opening secret entries.
#[derive(Debug, Error, Clone)]
pub enum SecretStoreError {
    #[error("Keyring error for {name}: {error}")]
    KeyringError { name: String, error: String },

    #[error("The '{backend}' secrets backend is read-only")]
    ReadOnlyBackend { backend: &'static str },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn secrets_backend_defaults_to_keychain_when_env_var_is_missing() {
        temp_env::with_var(SECRETS_BACKEND_ENV_VAR, None::<&str>, || {
            assert_eq!(secrets_backend(), SecretsBackend::Keychain);
        });
    }

    #[test]
    fn secrets_backend_uses_environment_when_configured() {
        temp_env::with_var(SECRETS_BACKEND_ENV_VAR, Some(" ENV "), || {
            assert_eq!(secrets_backend(), SecretsBackend::Environment);
        });
    }

    #[test]
    fn environment_store_reads_process_environment() {
        temp_env::with_var("OPENCODE_TEST_SERVER_PASSWORD", Some("hunter2"), || {
            let store = EnvironmentSecretStore;
            assert_eq!(store.get_secret("OPENCODE_TEST_SERVER_PASSWORD").as_deref(), Some("hunter2"));
            assert_eq!(store.get_secret("OPENCODE_TEST_MISSING_PASSWORD"), None);
        });
    }

    #[test]
    fn environment_backend_refuses_writes() {
        temp_env::with_var(SECRETS_BACKEND_ENV_VAR, Some("env"), || {
            let error = store_secret("anything", "value").expect_err("env backend is read-only");
            assert!(matches!(error, SecretStoreError::ReadOnlyBackend { backend: "env" }));
        });
    }

    #[test]
    fn static_store_returns_configured_values() {
        let store = StaticSecretStore::new().with_secret("server", "secret");
        assert_eq!(store.get_secret("server").as_deref(), Some("secret"));
        assert_eq!(store.get_secret("other"), None);
    }
}
