//! Drawing for the connection panel and the bottom status bar.

use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Paragraph},
};

use crate::app::App;
use crate::ui::theme::Theme;

const KEY_HINTS: &[(&str, &str)] = &[("t", "test"), ("Enter", "settings"), ("r", "reload"), ("o", "open"), ("q", "quit")];

/// Right-aligned status-bar content: logo, colored dot and tooltip.
pub fn status_line(app: &App, theme: &dyn Theme) -> Line<'static> {
    let indicator = app.indicator();
    Line::from(vec![
        Span::styled(opencode_types::VIEW_DISPLAY_TEXT, theme.accent_emphasis_style()),
        Span::raw(" "),
        Span::styled(indicator.dot(), theme.indicator_style(indicator.tone, app.pulse_dimmed())),
        Span::raw(" "),
        Span::styled(indicator.tooltip, theme.text_primary_style()),
        Span::raw(" "),
    ])
}

fn hint_line(theme: &dyn Theme) -> Line<'static> {
    let mut spans = Vec::with_capacity(KEY_HINTS.len() * 3);
    for (index, (key, label)) in KEY_HINTS.iter().enumerate() {
        if index > 0 {
            spans.push(Span::styled("  ", theme.text_muted_style()));
        }
        spans.push(Span::styled(*key, theme.status_info()));
        spans.push(Span::styled(format!(" {label}"), theme.text_muted_style()));
    }
    Line::from(spans)
}

fn detail_lines(app: &App, theme: &dyn Theme) -> Vec<Line<'static>> {
    let last_checked = app
        .last_checked
        .map(|at| at.format("%H:%M:%S").to_string())
        .unwrap_or_else(|| "never".to_string());
    let credential = app.config.credential_ref().map(str::to_string).unwrap_or_else(|| "none".to_string());

    let row = |label: &str, value: String, style: Style| {
        Line::from(vec![Span::styled(format!("{label:<14}"), theme.text_muted_style()), Span::styled(value, style)])
    };

    let state_style = theme.indicator_style(app.indicator().tone, false);
    vec![
        row("Server", app.config.base_url(), theme.text_primary_style()),
        row("State", app.state.label().to_string(), state_style),
        row("Last checked", last_checked, theme.text_primary_style()),
        row("Credential", credential, theme.text_primary_style()),
    ]
}

/// Draw the whole screen and record the status-bar area on `app`.
pub fn render(frame: &mut Frame, app: &mut App, theme: &dyn Theme) {
    let [body, notice_area, bar_area] = Layout::vertical([Constraint::Min(1), Constraint::Length(1), Constraint::Length(1)]).areas(frame.area());

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme.border_style())
        .style(theme.surface_style())
        .title(Span::styled(" OpenCode ", theme.accent_emphasis_style()));
    let mut lines = detail_lines(app, theme);
    lines.push(Line::default());
    lines.push(hint_line(theme));
    frame.render_widget(Paragraph::new(lines).block(block), body);

    if let Some(notice) = &app.notice {
        frame.render_widget(Paragraph::new(Span::styled(notice.text.clone(), theme.status_info())), notice_area);
    }

    frame.render_widget(
        Paragraph::new(status_line(app, theme)).alignment(Alignment::Right).style(theme.status_bar_style()),
        bar_area,
    );
    app.status_area = bar_area;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::theme::DraculaTheme;
    use opencode_types::{ConnectionConfig, ConnectionState};
    use ratatui::backend::TestBackend;
    use std::time::Instant;

    fn screen_text(terminal: &Terminal<TestBackend>) -> String {
        let buffer = terminal.backend().buffer();
        let width = buffer.area.width as usize;
        buffer
            .content()
            .chunks(width)
            .map(|row| row.iter().map(|cell| cell.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn status_line_shows_dot_and_tooltip() {
        let app = App::new(ConnectionConfig::default());
        let text: String = status_line(&app, &DraculaTheme::new()).spans.iter().map(|span| span.content.as_ref()).collect();
        assert_eq!(text, "Opencode ● OpenCode - Checking... ");
    }

    #[test]
    fn renders_state_and_records_bar_area() {
        let mut app = App::new(ConnectionConfig::default());
        app.update(crate::app::Msg::StateChanged(ConnectionState::Disconnected, ConnectionConfig::default()), Instant::now());
        let mut terminal = Terminal::new(TestBackend::new(80, 10)).expect("terminal");
        let theme = DraculaTheme::new();

        terminal.draw(|frame| render(frame, &mut app, &theme)).expect("draw");

        let text = screen_text(&terminal);
        assert!(text.contains("OpenCode - Disconnected from http://localhost:4096"));
        assert!(text.contains("Disconnected"));
        assert_eq!(app.status_area, Rect::new(0, 9, 80, 1));
    }

    #[test]
    fn pending_dot_uses_error_color() {
        let theme = DraculaTheme::new();
        let app = App::new(ConnectionConfig::default());
        let line = status_line(&app, &theme);
        assert_eq!(line.spans[2].style.fg, Some(theme.roles().error));
    }
}
