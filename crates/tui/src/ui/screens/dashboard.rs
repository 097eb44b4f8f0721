use engine::Money;
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
};

use crate::{
    app::{AppState, Workspace},
    ui::{
        components::{money::styled_balance, pager::list_block},
        theme::Theme,
    },
};

const UPCOMING_LIMIT: usize = 6;

pub fn render(frame: &mut Frame<'_>, area: Rect, state: &AppState, ws: &Workspace, theme: &Theme) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(4), Constraint::Min(0)])
        .split(area);
    let cards = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(34),
            Constraint::Percentage(33),
            Constraint::Percentage(33),
        ])
        .split(layout[0]);
    let lower = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(layout[1]);

    let muted = Style::default().fg(theme.text_muted);
    let dashboard = &ws.dashboard;
    let Some(summary) = dashboard.summary() else {
        let text = if dashboard.is_loading() {
            "Loading your farm…"
        } else {
            "No summary yet. Press r to refresh."
        };
        frame.render_widget(
            Paragraph::new(Span::styled(text, muted)).block(list_block("Dashboard", theme)),
            area,
        );
        return;
    };

    let card = |title: &'static str, value: Span<'static>, detail: String| {
        Paragraph::new(vec![
            Line::from(value),
            Line::from(Span::styled(detail, muted)),
        ])
        .block(list_block(title, theme))
    };
    frame.render_widget(
        card(
            "Wallet",
            styled_balance(dashboard.balance().minor(), theme),
            "available balance".to_string(),
        ),
        cards[0],
    );
    frame.render_widget(
        card(
            "Products",
            Span::styled(
                summary.product_count.to_string(),
                Style::default().add_modifier(Modifier::BOLD),
            ),
            "listed".to_string(),
        ),
        cards[1],
    );
    frame.render_widget(
        card(
            "Loans",
            Span::styled(
                format!("{} active", summary.active_loans),
                Style::default().add_modifier(Modifier::BOLD),
            ),
            format!("{} outstanding", Money::new(summary.outstanding_loan_minor)),
        ),
        cards[2],
    );

    let today = chrono::Utc::now().with_timezone(&state.timezone).date_naive();
    let upcoming = dashboard.upcoming(today, UPCOMING_LIMIT);
    let activity_lines: Vec<Line> = if upcoming.is_empty() {
        vec![Line::from(Span::styled("Nothing due. Plan a season in the Planner.", muted))]
    } else {
        upcoming
            .iter()
            .map(|activity| {
                let due_soon = (activity.deadline - today).num_days() <= 3;
                let deadline_style = if due_soon {
                    Style::default().fg(theme.warning)
                } else {
                    muted
                };
                Line::from(vec![
                    Span::raw(format!("{}  ", activity.planned_date.format("%d %b"))),
                    Span::styled(format!("{:<28}", activity.name), Style::default().fg(theme.text)),
                    Span::styled(format!("due {}", activity.deadline.format("%d %b")), deadline_style),
                ])
            })
            .collect()
    };
    frame.render_widget(
        Paragraph::new(activity_lines).block(list_block("Upcoming activities", theme)),
        lower[0],
    );

    let price_lines: Vec<Line> = if summary.benchmark_prices.is_empty() {
        vec![Line::from(Span::styled("No benchmark prices.", muted))]
    } else {
        summary
            .benchmark_prices
            .iter()
            .map(|price| {
                Line::from(vec![
                    Span::raw(format!("{:<14}", price.product)),
                    Span::styled(format!("{:<12}", price.region), muted),
                    Span::raw(format!("{}/{}", Money::new(price.price_minor), price.unit)),
                ])
            })
            .collect()
    };
    frame.render_widget(
        Paragraph::new(price_lines).block(list_block("Benchmark prices", theme)),
        lower[1],
    );
}
