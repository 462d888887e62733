//! Shared types for the OpenCode companion.
//!
//! The connection record that the settings layer persists and the health
//! monitor reads, plus the three-valued connection state rendered by every
//! front end.

mod connection;
mod state;

use std::time::Duration;

pub use connection::{ConnectionConfig, ParseProtocolError, Protocol};
pub use state::ConnectionState;

/// Path appended to the base URL to form the health probe target.
pub const HEALTH_PATH: &str = "/global/health";

/// Delay between two scheduled health probes.
pub const HEALTH_CHECK_INTERVAL: Duration = Duration::from_millis(30_000);

/// Hard limit for a single health probe, including connection setup.
pub const CONNECTION_TIMEOUT: Duration = Duration::from_millis(5_000);

/// Fixed username paired with the resolved secret for Basic authentication.
pub const BASIC_AUTH_USERNAME: &str = "opencode";

/// Host used when the persisted record has none.
pub const DEFAULT_HOST: &str = "localhost";

/// Port used when the persisted record has none.
pub const DEFAULT_PORT: u16 = 4096;

/// View type identifier of the embedded web view.
pub const VIEW_TYPE: &str = "opencode-view";

/// Display text of the embedded web view.
pub const VIEW_DISPLAY_TEXT: &str = "Opencode";
