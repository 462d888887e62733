use std::fmt;

use serde::{Deserialize, Serialize};

/// Reachability of the configured server as last observed.
///
/// `Checking` is only ever set when monitoring (re)starts; probes move the
/// state between `Connected` and `Disconnected`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    #[default]
    Checking,
    Connected,
    Disconnected,
}

impl ConnectionState {
    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            ConnectionState::Checking => "Checking",
            ConnectionState::Connected => "Connected",
            ConnectionState::Disconnected => "Disconnected",
        }
    }

    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionState::Connected)
    }

    /// Derive the state from a probe's outcome.
    pub fn from_probe(healthy: bool) -> Self {
        if healthy {
            ConnectionState::Connected
        } else {
            ConnectionState::Disconnected
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionState::Checking => write!(f, "checking"),
            ConnectionState::Connected => write!(f, "connected"),
            ConnectionState::Disconnected => write!(f, "disconnected"),
        }
    }
}
