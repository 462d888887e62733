//! Connection-health monitoring for an OpenCode server.
//!
//! - [`HealthMonitor`]: periodic `GET /global/health` probing with a
//!   three-state model (`Checking`, `Connected`, `Disconnected`).
//! - [`HealthTransport`]: the HTTP seam, with [`ReqwestTransport`] as the
//!   production client.
//! - [`StatusIndicator`]: what a status bar should draw for a state.

pub mod indicator;
pub mod monitor;
pub mod transport;

pub use indicator::{IndicatorTone, NOTICE_DURATION, StatusIndicator, manual_test_notice, settings_notice};
pub use monitor::{HealthMonitor, ProbeSettings, RenderCallback};
pub use opencode_types::{ConnectionConfig, ConnectionState};
pub use transport::{HealthTransport, ProbeRequest, ReqwestTransport, TransportError, basic_authorization};
