use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph, Wrap},
};

use crate::ui::theme::Theme;

/// Rect of `width` x `height` centered in `area`.
pub fn centered_box(width: u16, height: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),
            Constraint::Length(height.min(area.height)),
            Constraint::Min(0),
        ])
        .split(area);

    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Min(0),
            Constraint::Length(width.min(area.width)),
            Constraint::Min(0),
        ])
        .split(vertical[1]);

    horizontal[1]
}

/// Blocking error dialog. Input is ignored until it is dismissed.
pub fn render(frame: &mut Frame<'_>, area: Rect, message: &str, theme: &Theme) {
    let width = (message.chars().count() as u16 + 6).clamp(30, 64);
    let lines = (message.chars().count() as u16 / width.saturating_sub(4).max(1)) + 1;
    let rect = centered_box(width, lines + 5, area);

    let block = Block::default()
        .title(" Error ")
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(theme.error));

    let text = vec![
        Line::from(Span::styled(message.to_string(), Style::default().fg(theme.text))),
        Line::default(),
        Line::from(Span::styled(
            "Enter to dismiss",
            Style::default()
                .fg(theme.text_muted)
                .add_modifier(Modifier::ITALIC),
        )),
    ];

    frame.render_widget(Clear, rect);
    frame.render_widget(
        Paragraph::new(text)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .style(Style::default().bg(theme.background))
            .block(block),
        rect,
    );
}
