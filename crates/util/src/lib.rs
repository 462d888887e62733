//! Utilities shared by the OpenCode companion crates: settings persistence,
//! secret lookup, path expansion and log redaction.

pub mod keystore;
pub mod path_processing;
pub mod settings;
pub mod text_processing;

pub use keystore::{
    EnvironmentSecretStore, KeychainSecretStore, SECRETS_BACKEND_ENV_VAR, SecretStore, SecretStoreError, SecretsBackend,
    StaticSecretStore, default_secret_store, remove_secret, secrets_backend, store_secret,
};
pub use path_processing::expand_tilde;
pub use settings::{SETTINGS_FILE_NAME, SETTINGS_PATH_ENV, SettingsError, SettingsStore, parse_host, parse_port};
pub use text_processing::redact_sensitive;
