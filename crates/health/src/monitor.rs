//! Connection-health monitoring for the OpenCode server.
//!
//! [`HealthMonitor`] owns the [`ConnectionState`], probes
//! `{base_url}/global/health` on a fixed schedule and hands every result to a
//! render callback.
//!
//! ## Design
//!
//! - `start` sets `Checking`, notifies the callback and spawns one Tokio task
//!   that probes immediately and then on every interval tick. Restarting aborts
//!   the previous task, so timers never stack.
//! - `probe_once` performs one request under its own timeout. Dropping the
//!   request future on timeout aborts it. Every failure collapses to
//!   `Disconnected`; the boolean result is all a caller learns.
//! - Concurrent `probe_once` calls (a manual test overlapping a scheduled
//!   tick) are not serialized. Whichever finishes last writes the state.
//! - The callback receives a copy of the state and the config that was probed
//!   and has no handle back into the monitor.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use opencode_types::{CONNECTION_TIMEOUT, ConnectionConfig, ConnectionState, HEALTH_CHECK_INTERVAL};
use opencode_util::SecretStore;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior, timeout};
use tracing::{debug, info, warn};

use crate::transport::{HealthTransport, ProbeRequest, TransportError};

/// Presentation callback invoked after every state change or re-check.
pub type RenderCallback = Arc<dyn Fn(ConnectionState, &ConnectionConfig) + Send + Sync>;

/// Timing knobs for the monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeSettings {
    /// Delay between scheduled probes.
    pub interval: Duration,
    /// Hard limit for one probe.
    pub timeout: Duration,
}

impl Default for ProbeSettings {
    fn default() -> Self {
        Self {
            interval: HEALTH_CHECK_INTERVAL,
            timeout: CONNECTION_TIMEOUT,
        }
    }
}

/// What a probe observed, before it is collapsed into a [`ConnectionState`].
#[derive(Debug)]
enum ProbeOutcome {
    Healthy,
    Unhealthy(u16),
    TimedOut(Duration),
    Failed(TransportError),
}

impl ProbeOutcome {
    fn is_healthy(&self) -> bool {
        matches!(self, ProbeOutcome::Healthy)
    }
}

struct Shared {
    transport: Arc<dyn HealthTransport>,
    secrets: Arc<dyn SecretStore>,
    settings: ProbeSettings,
    state: Mutex<ConnectionState>,
    on_change: Mutex<Option<RenderCallback>>,
}

impl Shared {
    async fn probe_once(&self, config: &ConnectionConfig) -> bool {
        let request = ProbeRequest::for_config(config, self.secrets.as_ref());
        let outcome = match timeout(self.settings.timeout, self.transport.get(&request)).await {
            Ok(Ok(200)) => ProbeOutcome::Healthy,
            Ok(Ok(status)) => ProbeOutcome::Unhealthy(status),
            Ok(Err(error)) => ProbeOutcome::Failed(error),
            Err(_) => ProbeOutcome::TimedOut(self.settings.timeout),
        };

        match &outcome {
            ProbeOutcome::Healthy => debug!(url = %request.url, "health probe succeeded"),
            ProbeOutcome::Unhealthy(status) => debug!(url = %request.url, status, "health probe returned non-200"),
            ProbeOutcome::TimedOut(limit) => debug!(url = %request.url, timeout_ms = limit.as_millis() as u64, "health probe timed out"),
            ProbeOutcome::Failed(error) => debug!(url = %request.url, %error, "health probe failed"),
        }

        let healthy = outcome.is_healthy();
        self.publish(ConnectionState::from_probe(healthy), config);
        healthy
    }

    /// Store `state` and notify the callback.
    fn publish(&self, state: ConnectionState, config: &ConnectionConfig) {
        let previous = std::mem::replace(&mut *lock(&self.state), state);
        if previous != state {
            info!(from = %previous, to = %state, url = %config.base_url(), "connection state changed");
        }
        let callback = lock(&self.on_change).clone();
        if let Some(callback) = callback {
            callback(state, config);
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Periodic reachability prober for one server.
///
/// Construct one per endpoint; instances share nothing, so tests can run many
/// side by side. Dropping the monitor stops its schedule.
pub struct HealthMonitor {
    shared: Arc<Shared>,
    schedule: Mutex<Option<JoinHandle<()>>>,
}

impl HealthMonitor {
    /// Create a monitor with the default 30 s interval and 5 s timeout.
    pub fn new(transport: Arc<dyn HealthTransport>, secrets: Arc<dyn SecretStore>) -> Self {
        Self::with_settings(transport, secrets, ProbeSettings::default())
    }

    pub fn with_settings(transport: Arc<dyn HealthTransport>, secrets: Arc<dyn SecretStore>, settings: ProbeSettings) -> Self {
        Self {
            shared: Arc::new(Shared {
                transport,
                secrets,
                settings,
                state: Mutex::new(ConnectionState::Checking),
                on_change: Mutex::new(None),
            }),
            schedule: Mutex::new(None),
        }
    }

    /// Begin monitoring `config`, reporting every result to `on_change`.
    ///
    /// Sets the state to `Checking` and notifies the callback before the first
    /// probe runs. Calling `start` again replaces the previous schedule and
    /// callback. Must be called from within a Tokio runtime; otherwise the
    /// schedule is not spawned and a warning is logged.
    pub fn start<F>(&self, config: ConnectionConfig, on_change: F)
    where
        F: Fn(ConnectionState, &ConnectionConfig) + Send + Sync + 'static,
    {
        *lock(&self.shared.on_change) = Some(Arc::new(on_change));
        self.restart(config);
    }

    /// Restart the schedule for `config`, keeping the current callback.
    ///
    /// Used when the settings change: the state goes back to `Checking`.
    pub fn restart(&self, config: ConnectionConfig) {
        self.stop();
        self.shared.publish(ConnectionState::Checking, &config);

        let Ok(runtime) = Handle::try_current() else {
            warn!("no Tokio runtime available; health monitor not started");
            return;
        };

        let shared = Arc::clone(&self.shared);
        let period = shared.settings.interval;
        let first_tick = Instant::now() + period;
        info!(url = %config.base_url(), interval_ms = period.as_millis() as u64, "health monitor started");

        let handle = runtime.spawn(async move {
            shared.probe_once(&config).await;
            let mut ticker = time::interval_at(first_tick, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                shared.probe_once(&config).await;
            }
        });
        *lock(&self.schedule) = Some(handle);
    }

    /// Cancel the recurring schedule. Safe to call any number of times.
    pub fn stop(&self) {
        if let Some(handle) = lock(&self.schedule).take() {
            handle.abort();
            debug!("health monitor stopped");
        }
    }

    /// Perform one probe now, update the state and notify the callback.
    ///
    /// Never fails: transport errors, timeouts and non-200 responses all
    /// return `false` and leave the state `Disconnected`.
    pub async fn probe_once(&self, config: &ConnectionConfig) -> bool {
        self.shared.probe_once(config).await
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> ConnectionState {
        *lock(&self.shared.state)
    }

    /// Whether a schedule is active.
    pub fn is_running(&self) -> bool {
        lock(&self.schedule).as_ref().is_some_and(|handle| !handle.is_finished())
    }

    pub fn settings(&self) -> ProbeSettings {
        self.shared.settings
    }
}

impl Drop for HealthMonitor {
    fn drop(&mut self) {
        self.stop();
    }
}
