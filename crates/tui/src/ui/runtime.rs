//! Runtime: event loop and terminal lifecycle for the status bar.
//!
//! - Owns the terminal (raw mode, alternate screen, mouse capture).
//! - Feeds terminal input, monitor callbacks and manual-test results into
//!   `App::update` and executes the returned effects.
//! - Smart ticking: fast interval while animating (pulsing dot, pending
//!   test, visible notice), a long interval when idle.
//!
//! The monitor callback runs on the monitor's task, so it only forwards the
//! state over an unbounded channel and never touches `App` directly.

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use futures_util::{StreamExt, stream::FuturesUnordered};
use opencode_health::HealthMonitor;
use opencode_util::SettingsStore;
use ratatui::{Terminal, prelude::*};
use tokio::task::JoinHandle;
use tokio::{
    signal,
    sync::mpsc,
    time::{self, MissedTickBehavior},
};
use tracing::{debug, warn};

use crate::app::{App, Effect, Msg};
use crate::ui::status_bar;
use crate::ui::theme::DraculaTheme;

const FAST_TICK: Duration = Duration::from_millis(500);
const IDLE_TICK: Duration = Duration::from_millis(5000);

/// Spawn a dedicated input thread that blocks on terminal input and forwards
/// `crossterm` events over a Tokio channel.
fn spawn_input_thread() -> mpsc::Receiver<Event> {
    let (sender, receiver) = mpsc::channel(64);
    std::thread::spawn(move || {
        loop {
            match event::read() {
                Ok(event) => {
                    if sender.blocking_send(event).is_err() {
                        break;
                    }
                }
                Err(error) => {
                    warn!(%error, "failed to read terminal event");
                    break;
                }
            }
        }
    });
    receiver
}

/// Put the terminal into raw mode and enter the alternate screen.
fn setup_terminal() -> Result<Terminal<CrosstermBackend<std::io::Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

/// Restore terminal settings and leave the alternate screen.
fn cleanup_terminal(terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;
    Ok(())
}

fn input_message(event: Event) -> Option<Msg> {
    match event {
        Event::Key(key) if key.kind == event::KeyEventKind::Press => Some(Msg::Key(key)),
        Event::Mouse(mouse) => Some(Msg::Mouse(mouse)),
        _ => None,
    }
}

/// Execute effects. Returns `false` when the loop should exit.
fn process_effects(
    effects: Vec<Effect>,
    app: &mut App,
    settings: &SettingsStore,
    monitor: &Arc<HealthMonitor>,
    pending_tests: &mut FuturesUnordered<JoinHandle<bool>>,
) -> bool {
    for effect in effects {
        match effect {
            Effect::Quit => return false,
            Effect::RunManualTest(config) => {
                let monitor = Arc::clone(monitor);
                pending_tests.push(tokio::spawn(async move { monitor.probe_once(&config).await }));
            }
            Effect::ReloadSettings => {
                let msg = match settings.reload() {
                    Ok(config) => {
                        debug!(url = %config.base_url(), "settings reloaded");
                        monitor.restart(config.clone());
                        Msg::SettingsReloaded(config)
                    }
                    Err(error) => {
                        warn!(%error, "failed to reload settings");
                        Msg::Failure(format!("Failed to reload settings: {error}"))
                    }
                };
                app.update(msg, Instant::now());
            }
        }
    }
    true
}

/// Entry point for the TUI runtime: starts the monitor, runs the event loop
/// and restores the terminal on exit.
pub async fn run_app(settings: Arc<SettingsStore>, monitor: Arc<HealthMonitor>) -> Result<()> {
    let config = settings.config();
    let mut app = App::new(config.clone());
    let theme = DraculaTheme::new();

    let (state_sender, mut state_receiver) = mpsc::unbounded_channel();
    monitor.start(config, move |state, config| {
        let _ = state_sender.send(Msg::StateChanged(state, config.clone()));
    });

    let mut input_receiver = spawn_input_thread();
    let mut terminal = setup_terminal()?;
    let mut pending_tests: FuturesUnordered<JoinHandle<bool>> = FuturesUnordered::new();

    // Ticking strategy: fast while animating, very slow when idle.
    let mut current_interval = IDLE_TICK;
    let mut ticker = time::interval(current_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    terminal.draw(|frame| status_bar::render(frame, &mut app, &theme))?;

    loop {
        let target_interval = if app.is_animating() { FAST_TICK } else { IDLE_TICK };
        if target_interval != current_interval {
            current_interval = target_interval;
            ticker = time::interval(current_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        }

        let mut effects = Vec::new();
        tokio::select! {
            maybe_event = input_receiver.recv() => {
                let Some(event) = maybe_event else {
                    // Input channel closed; shut down cleanly.
                    break;
                };
                if let Some(msg) = input_message(event) {
                    effects = app.update(msg, Instant::now());
                }
            }

            Some(msg) = state_receiver.recv() => {
                app.update(msg, Instant::now());
            }

            Some(joined) = pending_tests.next(), if !pending_tests.is_empty() => {
                let connected = joined.unwrap_or_else(|error| {
                    warn!(%error, "manual test task failed");
                    false
                });
                app.update(Msg::ManualTestFinished(connected), Instant::now());
            }

            _ = ticker.tick() => {
                app.update(Msg::Tick, Instant::now());
            }

            _ = signal::ctrl_c() => { break; }
        }

        if !process_effects(effects, &mut app, &settings, &monitor, &mut pending_tests) {
            break;
        }
        terminal.draw(|frame| status_bar::render(frame, &mut app, &theme))?;
    }

    monitor.stop();
    cleanup_terminal(&mut terminal)?;
    Ok(())
}
