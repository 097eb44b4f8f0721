use engine::Route;
use ratatui::{
    Frame,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
};

use crate::ui::theme::Theme;

/// Horizontal tab bar; each tab shows the digit that selects it.
pub fn render_tabs(frame: &mut Frame<'_>, area: Rect, tabs: &[Route], active: Route, theme: &Theme) {
    let mut spans = vec![Span::raw(" ")];

    for (i, route) in tabs.iter().enumerate() {
        if i > 0 {
            spans.push(Span::raw("  "));
        }
        let digit = (i + 1) % 10;
        spans.push(Span::styled(
            format!("{digit}:"),
            Style::default().fg(theme.text_muted),
        ));
        if *route == active {
            spans.push(Span::styled("[", Style::default().fg(theme.accent)));
            spans.push(Span::styled(
                route.label(),
                Style::default()
                    .fg(theme.accent)
                    .add_modifier(Modifier::BOLD),
            ));
            spans.push(Span::styled("]", Style::default().fg(theme.accent)));
        } else {
            spans.push(Span::styled(route.label(), Style::default().fg(theme.text_muted)));
        }
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}
