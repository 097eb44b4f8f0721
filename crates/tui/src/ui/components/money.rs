use engine::Money;
use ratatui::{
    style::{Modifier, Style},
    text::Span,
};

use crate::ui::theme::Theme;

/// Money amount colored by sign: credits green with `+`, debits red.
#[must_use]
pub fn styled_amount(minor: i64, theme: &Theme) -> Span<'static> {
    let (color, prefix) = if minor > 0 {
        (theme.positive, "+")
    } else if minor < 0 {
        (theme.error, "")
    } else {
        (theme.text, "")
    };
    Span::styled(format!("{prefix}{}", Money::new(minor)), Style::default().fg(color))
}

/// Neutral amount, bold, for balances and totals.
#[must_use]
pub fn styled_balance(minor: i64, theme: &Theme) -> Span<'static> {
    Span::styled(
        Money::new(minor).to_string(),
        Style::default().fg(theme.text).add_modifier(Modifier::BOLD),
    )
}
