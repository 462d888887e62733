//! Presentation model for the status-bar indicator.

use std::time::Duration;

use opencode_types::{ConnectionConfig, ConnectionState};

/// How long transient notices stay visible.
pub const NOTICE_DURATION: Duration = Duration::from_millis(5_000);

/// Color role of the indicator dot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndicatorTone {
    /// Waiting for the first probe. Rendered in the error color, pulsing.
    Pending,
    Success,
    Error,
}

/// Everything a front end needs to draw the indicator for one state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusIndicator {
    pub state: ConnectionState,
    pub tone: IndicatorTone,
    pub tooltip: String,
    pub pulsing: bool,
}

impl StatusIndicator {
    pub fn new(state: ConnectionState, config: &ConnectionConfig) -> Self {
        let (tone, tooltip) = match state {
            ConnectionState::Checking => (IndicatorTone::Pending, "OpenCode - Checking...".to_string()),
            ConnectionState::Connected => (IndicatorTone::Success, format!("OpenCode - Connected to {}", config.base_url())),
            ConnectionState::Disconnected => (IndicatorTone::Error, format!("OpenCode - Disconnected from {}", config.base_url())),
        };
        Self {
            state,
            tone,
            tooltip,
            pulsing: matches!(state, ConnectionState::Checking),
        }
    }

    /// The indicator glyph.
    pub fn dot(&self) -> &'static str {
        "●"
    }

    /// Plain-text mark for output without color.
    pub fn symbol(&self) -> &'static str {
        match self.state {
            ConnectionState::Checking => "●",
            ConnectionState::Connected => "✓",
            ConnectionState::Disconnected => "✗",
        }
    }
}

/// Notice shown after a manual connection test.
pub fn manual_test_notice(connected: bool) -> &'static str {
    if connected { "✓ Connected!" } else { "✗ Connection failed" }
}

/// Notice shown when the indicator is activated.
pub fn settings_notice(config: &ConnectionConfig) -> String {
    format!("OpenCode Settings: {}", config.base_url())
}
