use std::fmt::Debug;

use opencode_health::IndicatorTone;
use ratatui::style::{Color, Modifier, Style};

// Dracula palette (https://draculatheme.com/contribute)
pub const BG: Color = Color::Rgb(0x28, 0x2A, 0x36);
pub const CURRENT_LINE: Color = Color::Rgb(0x44, 0x47, 0x5A);
pub const FOREGROUND: Color = Color::Rgb(0xF8, 0xF8, 0xF2);
pub const COMMENT: Color = Color::Rgb(0x62, 0x72, 0xA4);
pub const CYAN: Color = Color::Rgb(0x8B, 0xE9, 0xFD);
pub const GREEN: Color = Color::Rgb(0x50, 0xFA, 0x7B);
pub const PINK: Color = Color::Rgb(0xFF, 0x79, 0xC6);
pub const RED: Color = Color::Rgb(0xFF, 0x55, 0x55);

/// Semantic color roles used by the status bar.
#[derive(Debug, Clone)]
pub struct ThemeRoles {
    pub background: Color,
    pub surface_muted: Color,
    pub border: Color,

    pub text: Color,
    pub text_muted: Color,

    pub accent_primary: Color,
    pub info: Color,
    pub success: Color,
    pub error: Color,
}

/// Theme trait exposes semantic roles and common style builders.
pub trait Theme: Send + Sync + Debug {
    fn roles(&self) -> &ThemeRoles;

    fn text_primary_style(&self) -> Style {
        Style::default().fg(self.roles().text)
    }
    fn text_muted_style(&self) -> Style {
        Style::default().fg(self.roles().text_muted)
    }
    fn surface_style(&self) -> Style {
        Style::default().bg(self.roles().background)
    }
    fn border_style(&self) -> Style {
        Style::default().fg(self.roles().border)
    }
    fn status_bar_style(&self) -> Style {
        Style::default().fg(self.roles().text).bg(self.roles().surface_muted)
    }
    fn status_info(&self) -> Style {
        Style::default().fg(self.roles().info)
    }
    fn status_success(&self) -> Style {
        Style::default().fg(self.roles().success)
    }
    fn status_error(&self) -> Style {
        Style::default().fg(self.roles().error)
    }
    fn accent_emphasis_style(&self) -> Style {
        Style::default().fg(self.roles().accent_primary).add_modifier(Modifier::BOLD)
    }

    /// Style for the indicator dot. Pending uses the error color and dims on
    /// alternate pulse frames.
    fn indicator_style(&self, tone: IndicatorTone, dimmed: bool) -> Style {
        match tone {
            IndicatorTone::Success => self.status_success(),
            IndicatorTone::Error => self.status_error(),
            IndicatorTone::Pending if dimmed => self.status_error().add_modifier(Modifier::DIM),
            IndicatorTone::Pending => self.status_error().add_modifier(Modifier::BOLD),
        }
    }
}

/// Default Dracula theme tuned for dark terminals.
#[derive(Debug, Clone)]
pub struct DraculaTheme {
    roles: ThemeRoles,
}

impl DraculaTheme {
    pub fn new() -> Self {
        Self {
            roles: ThemeRoles {
                background: BG,
                surface_muted: CURRENT_LINE,
                border: CURRENT_LINE,
                text: FOREGROUND,
                text_muted: COMMENT,
                accent_primary: PINK,
                info: CYAN,
                success: GREEN,
                error: RED,
            },
        }
    }
}

impl Default for DraculaTheme {
    fn default() -> Self {
        Self::new()
    }
}

impl Theme for DraculaTheme {
    fn roles(&self) -> &ThemeRoles {
        &self.roles
    }
}
