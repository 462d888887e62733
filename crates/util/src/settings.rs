//! Connection settings persistence.
//!
//! A tiny JSON-backed store for the flat [`ConnectionConfig`] record. The file
//! lives in the standard configuration directory
//! (`~/.config/opencode/settings.json` on most platforms) unless
//! [`SETTINGS_PATH_ENV`] points elsewhere. Missing fields are filled from the
//! defaults, and the `set_*` helpers validate raw user input so an invalid
//! value never reaches the health monitor.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use dirs_next::config_dir;
use opencode_types::{ConnectionConfig, DEFAULT_HOST, DEFAULT_PORT, ParseProtocolError, Protocol};
use thiserror::Error;
use tracing::{debug, warn};

use crate::expand_tilde;

/// Environment variable allowing callers to override the settings file path.
pub const SETTINGS_PATH_ENV: &str = "OPENCODE_SETTINGS_PATH";

/// Default filename for the JSON payload.
pub const SETTINGS_FILE_NAME: &str = "settings.json";

/// Error surfaced when reading, writing or validating settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// I/O failure (for example, permissions or missing directory).
    #[error("settings I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// Serialization or deserialization failure.
    #[error("settings serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("invalid port '{value}': expected a number between 1 and 65535")]
    InvalidPort { value: String },
    #[error("invalid host '{value}'")]
    InvalidHost { value: String },
    #[error(transparent)]
    InvalidProtocol(#[from] ParseProtocolError),
}

/// Parse a port typed by the user.
pub fn parse_port(raw: &str) -> Result<u16, SettingsError> {
    match raw.trim().parse::<u16>() {
        Ok(port) if port != 0 => Ok(port),
        _ => Err(SettingsError::InvalidPort { value: raw.to_string() }),
    }
}

/// Parse a hostname or IP address typed by the user.
///
/// The trimmed input is returned as typed; `url::Host` only validates it.
pub fn parse_host(raw: &str) -> Result<String, SettingsError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || url::Host::parse(trimmed).is_err() {
        return Err(SettingsError::InvalidHost { value: raw.to_string() });
    }
    Ok(trimmed.to_string())
}

/// Thread-safe settings store backed by a JSON file.
#[derive(Debug)]
pub struct SettingsStore {
    path: PathBuf,
    config: Mutex<ConnectionConfig>,
    persist_to_disk: bool,
}

impl SettingsStore {
    /// Open the store at the default path (honoring [`SETTINGS_PATH_ENV`]).
    pub fn open() -> Result<Self, SettingsError> {
        Self::open_at(default_settings_path())
    }

    /// Open the store at an explicit path. A missing file yields defaults.
    pub fn open_at(path: impl Into<PathBuf>) -> Result<Self, SettingsError> {
        let path = path.into();
        let config = load_config(&path)?;
        Ok(Self {
            path,
            config: Mutex::new(config),
            persist_to_disk: true,
        })
    }

    /// Build an in-memory store used as a fallback when the config directory cannot be accessed.
    pub fn ephemeral(config: ConnectionConfig) -> Self {
        Self {
            path: PathBuf::new(),
            config: Mutex::new(config),
            persist_to_disk: false,
        }
    }

    /// Path to the underlying JSON file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Snapshot of the current settings.
    pub fn config(&self) -> ConnectionConfig {
        self.lock().clone()
    }

    /// Re-read the file, replacing the in-memory record.
    pub fn reload(&self) -> Result<ConnectionConfig, SettingsError> {
        if !self.persist_to_disk {
            return Ok(self.config());
        }
        let fresh = load_config(&self.path)?;
        *self.lock() = fresh.clone();
        Ok(fresh)
    }

    /// Apply `edit` to the record and persist it. Returns the new snapshot.
    ///
    /// The in-memory record is only replaced once the write succeeded.
    pub fn update<F>(&self, edit: F) -> Result<ConnectionConfig, SettingsError>
    where
        F: FnOnce(&mut ConnectionConfig),
    {
        let mut current = self.lock();
        let mut edited = current.clone();
        edit(&mut edited);
        if self.persist_to_disk {
            self.save_locked(&edited)?;
        }
        *current = edited.clone();
        Ok(edited)
    }

    pub fn set_host(&self, raw: &str) -> Result<ConnectionConfig, SettingsError> {
        let host = parse_host(raw)?;
        self.update(|config| config.host = host)
    }

    pub fn set_port(&self, raw: &str) -> Result<ConnectionConfig, SettingsError> {
        let port = parse_port(raw)?;
        self.update(|config| config.port = port)
    }

    pub fn set_protocol(&self, raw: &str) -> Result<ConnectionConfig, SettingsError> {
        let protocol: Protocol = raw.parse()?;
        self.update(|config| config.protocol = protocol)
    }

    /// Set the secret name; an empty value clears the credential.
    pub fn set_credential_ref(&self, raw: &str) -> Result<ConnectionConfig, SettingsError> {
        let name = raw.trim().to_string();
        self.update(|config| config.credential_ref = name)
    }

    fn lock(&self) -> MutexGuard<'_, ConnectionConfig> {
        self.config.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn save_locked(&self, config: &ConnectionConfig) -> Result<(), SettingsError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_string_pretty(config)?;
        fs::write(&self.path, data)?;
        debug!(path = %self.path.display(), "saved settings");
        Ok(())
    }
}

fn default_settings_path() -> PathBuf {
    if let Ok(path) = env::var(SETTINGS_PATH_ENV) {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return expand_tilde(trimmed);
        }
    }

    config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("opencode")
        .join(SETTINGS_FILE_NAME)
}

fn load_config(path: &Path) -> Result<ConnectionConfig, SettingsError> {
    let config = match fs::read_to_string(path) {
        Ok(data) => match serde_json::from_str(&data) {
            Ok(config) => config,
            Err(error) => {
                warn!(
                    path = %path.display(),
                    error = %error,
                    "Failed to parse settings file; using defaults"
                );
                ConnectionConfig::default()
            }
        },
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => ConnectionConfig::default(),
        Err(error) => return Err(SettingsError::Io(error)),
    };
    Ok(repair(config, path))
}

/// Replace values the input boundary would have rejected.
fn repair(mut config: ConnectionConfig, path: &Path) -> ConnectionConfig {
    if parse_host(&config.host).is_err() {
        warn!(path = %path.display(), host = %config.host, "invalid host in settings; using default");
        config.host = DEFAULT_HOST.to_string();
    }
    if config.port == 0 {
        warn!(path = %path.display(), "port 0 in settings; using default");
        config.port = DEFAULT_PORT;
    }
    config
}
