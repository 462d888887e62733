use std::{error::Error, fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{DEFAULT_HOST, DEFAULT_PORT, HEALTH_PATH};

/// URL scheme used to reach the server.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    #[default]
    Http,
    Https,
}

impl Protocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Http => "http",
            Self::Https => "https",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Protocol {
    type Err = ParseProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "http" => Ok(Self::Http),
            "https" => Ok(Self::Https),
            _ => Err(ParseProtocolError),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseProtocolError;

impl fmt::Display for ParseProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("invalid protocol; expected 'http' or 'https'")
    }
}

impl Error for ParseProtocolError {}

/// Where the OpenCode server lives and how to authenticate against it.
///
/// Field names on disk match the host plugin's data file so existing settings
/// load unchanged. Missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    /// Hostname or IP address of the server.
    #[serde(rename = "serverHost")]
    pub host: String,
    /// TCP port of the server.
    #[serde(rename = "serverPort")]
    pub port: u16,
    /// Scheme used for both the view and the health probe.
    #[serde(rename = "serverProtocol")]
    pub protocol: Protocol,
    /// Name of the secret holding the server password. Empty means no credential.
    #[serde(rename = "serverPasswordSecretName")]
    pub credential_ref: String,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            protocol: Protocol::Http,
            credential_ref: String::new(),
        }
    }
}

impl ConnectionConfig {
    /// `protocol://host:port`, without a trailing slash.
    pub fn base_url(&self) -> String {
        format!("{}://{}:{}", self.protocol, self.host, self.port)
    }

    /// Target of the health probe.
    pub fn health_url(&self) -> String {
        format!("{}{}", self.base_url(), HEALTH_PATH)
    }

    /// Source URL of the embedded web view.
    pub fn view_url(&self) -> String {
        self.base_url()
    }

    /// The credential reference, if one is configured.
    pub fn credential_ref(&self) -> Option<&str> {
        let trimmed = self.credential_ref.trim();
        (!trimmed.is_empty()).then_some(trimmed)
    }
}
