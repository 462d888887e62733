//! Secret lookup for credential references.

mod secrets;

pub use secrets::{
    EnvironmentSecretStore, KeychainSecretStore, SECRETS_BACKEND_ENV_VAR, SecretStore, SecretStoreError, SecretsBackend,
    StaticSecretStore, default_secret_store, remove_secret, secrets_backend, store_secret,
};
