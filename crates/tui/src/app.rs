//! Application state for the status-bar TUI.
//!
//! `App` follows a small update loop: input and monitor callbacks arrive as
//! [`Msg`], `App::update` mutates state and returns [`Effect`]s that the
//! runtime executes (probing, reloading settings, quitting).

use std::time::{Duration, Instant};

use chrono::{DateTime, Local};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use opencode_health::{NOTICE_DURATION, StatusIndicator, manual_test_notice, settings_notice};
use opencode_types::{ConnectionConfig, ConnectionState};
use ratatui::layout::{Position, Rect};
use tracing::debug;

/// Messages that drive state changes.
#[derive(Debug, Clone)]
pub enum Msg {
    /// The monitor reported a state (possibly unchanged) for the config it probed.
    StateChanged(ConnectionState, ConnectionConfig),
    /// A manual test finished.
    ManualTestFinished(bool),
    /// Settings were reloaded and the monitor restarted.
    SettingsReloaded(ConnectionConfig),
    /// A failure worth showing to the user.
    Failure(String),
    Key(KeyEvent),
    Mouse(MouseEvent),
    /// Periodic animation tick
    Tick,
}

/// Side effects requested by [`App::update`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    RunManualTest(ConnectionConfig),
    ReloadSettings,
    Quit,
}

/// A transient message shown above the status bar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub text: String,
    pub expires_at: Option<Instant>,
}

pub struct App {
    pub config: ConnectionConfig,
    pub state: ConnectionState,
    pub notice: Option<Notice>,
    /// Wall-clock time of the last settled probe result.
    pub last_checked: Option<DateTime<Local>>,
    /// Whether a manual test is in flight.
    pub testing: bool,
    /// Animation frame for the pulsing dot
    pub pulse_idx: usize,
    /// Screen area of the status bar, recorded at render time for mouse hits.
    pub status_area: Rect,
}

impl App {
    pub fn new(config: ConnectionConfig) -> Self {
        Self {
            config,
            state: ConnectionState::Checking,
            notice: None,
            last_checked: None,
            testing: false,
            pulse_idx: 0,
            status_area: Rect::default(),
        }
    }

    pub fn indicator(&self) -> StatusIndicator {
        StatusIndicator::new(self.state, &self.config)
    }

    /// Whether the UI needs fast ticks.
    pub fn is_animating(&self) -> bool {
        self.indicator().pulsing || self.testing || self.notice.as_ref().is_some_and(|notice| notice.expires_at.is_some())
    }

    /// Dim phase of the pulse animation.
    pub fn pulse_dimmed(&self) -> bool {
        self.pulse_idx % 2 == 1
    }

    fn show_notice(&mut self, text: impl Into<String>, now: Instant, duration: Option<Duration>) {
        self.notice = Some(Notice {
            text: text.into(),
            expires_at: duration.map(|duration| now + duration),
        });
    }

    pub fn update(&mut self, msg: Msg, now: Instant) -> Vec<Effect> {
        let mut effects = Vec::new();
        match msg {
            Msg::StateChanged(state, config) => {
                // Results for a config replaced by a reload are stale.
                if config != self.config {
                    debug!(url = %config.base_url(), "ignoring state for previous settings");
                    return effects;
                }
                self.state = state;
                if state == ConnectionState::Checking {
                    self.pulse_idx = 0;
                } else {
                    self.last_checked = Some(Local::now());
                }
            }
            Msg::ManualTestFinished(connected) => {
                self.testing = false;
                self.show_notice(manual_test_notice(connected), now, Some(NOTICE_DURATION));
            }
            Msg::SettingsReloaded(config) => {
                self.config = config;
                self.show_notice(settings_notice(&self.config), now, Some(NOTICE_DURATION));
            }
            Msg::Failure(message) => {
                self.show_notice(message, now, Some(NOTICE_DURATION));
            }
            Msg::Key(key) => effects.extend(self.handle_key(key, now)),
            Msg::Mouse(mouse) => self.handle_mouse(mouse, now),
            Msg::Tick => {
                if self.indicator().pulsing {
                    self.pulse_idx = (self.pulse_idx + 1) % 2;
                }
                if self.notice.as_ref().and_then(|notice| notice.expires_at).is_some_and(|at| now >= at) {
                    self.notice = None;
                }
            }
        }
        effects
    }

    fn handle_key(&mut self, key: KeyEvent, now: Instant) -> Vec<Effect> {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return vec![Effect::Quit];
        }
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => vec![Effect::Quit],
            KeyCode::Char('t') if !self.testing => {
                self.testing = true;
                self.show_notice("Testing connection...", now, None);
                vec![Effect::RunManualTest(self.config.clone())]
            }
            KeyCode::Char('r') => vec![Effect::ReloadSettings],
            KeyCode::Char('o') => {
                self.show_notice(format!("{}: {}", opencode_types::VIEW_DISPLAY_TEXT, self.config.view_url()), now, Some(NOTICE_DURATION));
                Vec::new()
            }
            KeyCode::Enter => {
                self.show_notice(settings_notice(&self.config), now, Some(NOTICE_DURATION));
                Vec::new()
            }
            _ => Vec::new(),
        }
    }

    fn handle_mouse(&mut self, mouse: MouseEvent, now: Instant) {
        if mouse.kind == MouseEventKind::Down(MouseButton::Left) && self.status_area.contains(Position::new(mouse.column, mouse.row)) {
            self.show_notice(settings_notice(&self.config), now, Some(NOTICE_DURATION));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyEventKind;

    fn key(code: KeyCode) -> Msg {
        Msg::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn click(column: u16, row: u16) -> Msg {
        Msg::Mouse(MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column,
            row,
            modifiers: KeyModifiers::NONE,
        })
    }

    #[test]
    fn starts_checking_and_animating() {
        let app = App::new(ConnectionConfig::default());
        assert_eq!(app.state, ConnectionState::Checking);
        assert!(app.is_animating());
    }

    #[test]
    fn settled_state_records_last_check_and_stops_pulsing() {
        let mut app = App::new(ConnectionConfig::default());
        let now = Instant::now();
        app.update(Msg::Tick, now);
        assert!(app.pulse_dimmed());

        app.update(Msg::StateChanged(ConnectionState::Connected, ConnectionConfig::default()), now);
        assert!(app.last_checked.is_some());
        assert!(!app.is_animating());

        app.update(Msg::Tick, now);
        assert!(app.pulse_dimmed());
    }

    #[test]
    fn manual_test_runs_one_at_a_time() {
        let mut app = App::new(ConnectionConfig::default());
        let now = Instant::now();

        let effects = app.update(key(KeyCode::Char('t')), now);
        assert_eq!(effects, vec![Effect::RunManualTest(ConnectionConfig::default())]);
        assert!(app.testing);
        assert!(app.update(key(KeyCode::Char('t')), now).is_empty());

        app.update(Msg::ManualTestFinished(false), now);
        assert!(!app.testing);
        assert_eq!(app.notice.as_ref().map(|n| n.text.as_str()), Some("✗ Connection failed"));
    }

    #[test]
    fn notices_expire_after_their_duration() {
        let mut app = App::new(ConnectionConfig::default());
        let now = Instant::now();
        app.update(Msg::ManualTestFinished(true), now);
        assert_eq!(app.notice.as_ref().map(|n| n.text.as_str()), Some("✓ Connected!"));

        app.update(Msg::Tick, now + Duration::from_millis(4_999));
        assert!(app.notice.is_some());
        app.update(Msg::Tick, now + NOTICE_DURATION);
        assert!(app.notice.is_none());
    }

    #[test]
    fn quit_keys() {
        let mut app = App::new(ConnectionConfig::default());
        let now = Instant::now();
        assert_eq!(app.update(key(KeyCode::Char('q')), now), vec![Effect::Quit]);
        assert_eq!(app.update(key(KeyCode::Esc), now), vec![Effect::Quit]);
        let ctrl_c = KeyEvent::new_with_kind(KeyCode::Char('c'), KeyModifiers::CONTROL, KeyEventKind::Press);
        assert_eq!(app.update(Msg::Key(ctrl_c), now), vec![Effect::Quit]);
    }

    #[test]
    fn results_for_replaced_settings_do_not_revert_the_config() {
        let mut app = App::new(ConnectionConfig::default());
        let now = Instant::now();
        let edited = ConnectionConfig {
            port: 5001,
            ..ConnectionConfig::default()
        };

        app.update(Msg::SettingsReloaded(edited.clone()), now);
        app.update(Msg::StateChanged(ConnectionState::Checking, edited.clone()), now);
        app.update(Msg::StateChanged(ConnectionState::Connected, ConnectionConfig::default()), now);

        assert_eq!(app.config, edited);
        assert_eq!(app.state, ConnectionState::Checking);
        assert_eq!(app.indicator().tooltip, "OpenCode - Checking...");
        assert_eq!(app.update(key(KeyCode::Char('t')), now), vec![Effect::RunManualTest(edited.clone())]);

        app.update(Msg::StateChanged(ConnectionState::Disconnected, edited), now);
        assert_eq!(app.indicator().tooltip, "OpenCode - Disconnected from http://localhost:5001");
    }

    #[test]
    fn reload_key_requests_settings_reload() {
        let mut app = App::new(ConnectionConfig::default());
        assert_eq!(app.update(key(KeyCode::Char('r')), Instant::now()), vec![Effect::ReloadSettings]);
    }

    #[test]
    fn enter_and_click_show_settings() {
        let mut app = App::new(ConnectionConfig::default());
        let now = Instant::now();
        app.status_area = Rect::new(0, 9, 80, 1);

        app.update(click(5, 2), now);
        assert!(app.notice.is_none());

        app.update(click(5, 9), now);
        assert_eq!(app.notice.as_ref().map(|n| n.text.as_str()), Some("OpenCode Settings: http://localhost:4096"));

        app.notice = None;
        app.update(key(KeyCode::Enter), now);
        assert_eq!(app.notice.as_ref().map(|n| n.text.as_str()), Some("OpenCode Settings: http://localhost:4096"));
    }

    #[test]
    fn open_key_shows_view_url() {
        let mut app = App::new(ConnectionConfig::default());
        app.update(key(KeyCode::Char('o')), Instant::now());
        assert_eq!(app.notice.as_ref().map(|n| n.text.as_str()), Some("Opencode: http://localhost:4096"));
    }
}
