//! # OpenCode Status Bar TUI
//!
//! A terminal stand-in for an editor status bar: it shows the connection
//! indicator for the configured OpenCode server, runs manual tests on demand
//! and restarts monitoring when the settings file changes.
//!
//! ## Keys
//!
//! - `t` test the connection now
//! - `Enter` or a click on the status bar: show the server address
//! - `r` reload settings from disk and restart monitoring
//! - `o` show the embedded view URL
//! - `q`, `Esc`, `Ctrl+C` quit

mod app;
mod ui;

use std::sync::Arc;

use anyhow::Result;
use opencode_health::HealthMonitor;
use opencode_util::SettingsStore;

/// Runs the status-bar loop until the user quits.
///
/// The monitor is started with the current settings and stopped on exit.
pub async fn run(settings: Arc<SettingsStore>, monitor: Arc<HealthMonitor>) -> Result<()> {
    ui::runtime::run_app(settings, monitor).await
}
