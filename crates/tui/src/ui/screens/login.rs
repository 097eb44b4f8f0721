use engine::auth::LoginStep;
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph},
};

use crate::{
    app::AppState,
    ui::{components::alert::centered_box, theme::Theme},
};

pub fn render(frame: &mut Frame<'_>, area: Rect, state: &AppState, theme: &Theme) {
    let login = &state.login;
    let card_area = centered_box(44, 8, area);

    frame.render_widget(Clear, card_area);

    let title = match login.step() {
        LoginStep::Request => " sign in ",
        LoginStep::Verify => " enter code ",
    };
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(theme.border));

    let inner = block.inner(card_area);
    frame.render_widget(block, card_area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Email
            Constraint::Length(1), // Spacer
            Constraint::Length(1), // Code
            Constraint::Length(1), // Spacer
            Constraint::Length(1), // Help
        ])
        .margin(1)
        .split(inner);

    let verifying = login.step() == LoginStep::Verify;
    render_input(frame, rows[0], "Email", &login.email, !verifying, theme);
    if verifying {
        render_input(frame, rows[2], "Code ", &login.otp, true, theme);
    }

    let help = match (login.step(), login.is_busy()) {
        (_, true) => "Please wait…",
        (LoginStep::Request, false) => "Enter: send code",
        (LoginStep::Verify, false) => "Enter: verify   Esc: change email",
    };
    frame.render_widget(
        Paragraph::new(Span::styled(help, Style::default().fg(theme.text_muted)))
            .alignment(Alignment::Center),
        rows[4],
    );

    if let Some(message) = login.message() {
        let message_area = Rect {
            x: card_area.x,
            y: card_area.y + card_area.height + 1,
            width: card_area.width,
            height: 1,
        };
        let color = if verifying { theme.text_muted } else { theme.error };
        frame.render_widget(
            Paragraph::new(Span::styled(message, Style::default().fg(color)))
                .alignment(Alignment::Center),
            message_area,
        );
    }
}

fn render_input(
    frame: &mut Frame<'_>,
    area: Rect,
    label: &str,
    value: &str,
    focused: bool,
    theme: &Theme,
) {
    let cursor = if focused { "│" } else { "" };
    let style = if focused {
        Style::default().fg(theme.accent).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(theme.text_muted)
    };
    let line = Line::from(vec![
        Span::styled(format!("{label} "), Style::default().fg(theme.text_muted)),
        Span::styled(format!("{value}{cursor}"), style),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}
