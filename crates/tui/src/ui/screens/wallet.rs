use api_types::wallet::{TransactionKind, WalletTransaction};
use engine::wallet::{WalletAction, WalletStep};
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{List, ListItem, ListState, Paragraph},
};

use crate::{
    app::state::WalletScreen,
    ui::{
        components::{
            form::FieldList,
            money::{styled_amount, styled_balance},
            pager::{filter_line, list_block, page_line},
        },
        theme::Theme,
    },
};

pub fn render(frame: &mut Frame<'_>, area: Rect, screen: &WalletScreen, theme: &Theme) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)])
        .split(area);
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(layout[1]);

    render_header(frame, layout[0], screen, theme);
    match screen.flow.step() {
        WalletStep::Selecting => render_actions(frame, columns[0], screen, theme),
        WalletStep::Entering(form) => {
            let label = if form.action.uses_mobile_money() {
                "Method (←→)"
            } else {
                "Destination"
            };
            let second = if form.action.uses_mobile_money() {
                form.method.map(|m| m.label().to_string()).unwrap_or_default()
            } else {
                form.destination.clone()
            };
            let inputs = [form.amount.clone(), second];
            let fields = FieldList {
                title: form.action.label(),
                labels: &["Amount (KES)", label],
                inputs: &inputs,
                focus: Some(screen.field),
                note: screen.flow.message(),
            };
            fields.render(frame, columns[0], theme);
        }
        WalletStep::AwaitingOtp { form, phone, otp, .. } => {
            let inputs = [otp.clone()];
            let note = if screen.flow.is_busy() {
                Some("Working…")
            } else {
                screen.flow.message()
            };
            let title = format!("{} · code sent to {phone}", form.action.label());
            let fields = FieldList {
                title: &title,
                labels: &["Code"],
                inputs: &inputs,
                focus: Some(0),
                note,
            };
            fields.render(frame, columns[0], theme);
        }
    }
    render_history(frame, columns[1], screen, theme);
}

fn render_header(frame: &mut Frame<'_>, area: Rect, screen: &WalletScreen, theme: &Theme) {
    let muted = Style::default().fg(theme.text_muted);
    let mut spans = vec![Span::styled("Balance  ", muted)];
    match screen.flow.balance() {
        Some(balance) => spans.push(styled_balance(balance.balance_minor, theme)),
        None => spans.push(Span::styled("…", muted)),
    }
    if !screen.flow.policy().gate_all {
        spans.push(Span::styled(
            "   transfers and payments skip the code check",
            Style::default().fg(theme.warning),
        ));
    }
    frame.render_widget(
        Paragraph::new(Line::from(spans)).block(list_block("Wallet", theme)),
        area,
    );
}

fn render_actions(frame: &mut Frame<'_>, area: Rect, screen: &WalletScreen, theme: &Theme) {
    let policy = screen.flow.policy();
    let items: Vec<ListItem> = WalletAction::ALL
        .iter()
        .map(|action| {
            let key = match action {
                WalletAction::Deposit => "d",
                WalletAction::Withdraw => "w",
                WalletAction::Transfer => "t",
                WalletAction::Pay => "p",
            };
            let mut spans = vec![
                Span::styled(format!("{key}  "), Style::default().fg(theme.accent)),
                Span::raw(action.label()),
            ];
            if policy.requires_otp(*action) {
                spans.push(Span::styled("  (code)", Style::default().fg(theme.text_muted)));
            }
            ListItem::new(Line::from(spans))
        })
        .collect();

    let block = list_block("Actions", theme);
    let inner = block.inner(area);
    frame.render_widget(block, area);
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)])
        .split(inner);

    let list = List::new(items).highlight_style(Style::default().add_modifier(Modifier::REVERSED));
    let mut state = ListState::default().with_selected(Some(screen.cursor));
    frame.render_stateful_widget(list, rows[0], &mut state);

    if let Some(message) = screen.flow.message() {
        frame.render_widget(
            Paragraph::new(Span::styled(message.to_string(), Style::default().fg(theme.text_muted))),
            rows[1],
        );
    }
}

fn render_history(frame: &mut Frame<'_>, area: Rect, screen: &WalletScreen, theme: &Theme) {
    let history = &screen.flow.history;
    let block = list_block("History", theme);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(inner);

    frame.render_widget(Paragraph::new(filter_line(history, false, "Type", theme)), rows[0]);

    if history.items().is_empty() {
        frame.render_widget(
            Paragraph::new(Span::styled(
                "No transactions yet.",
                Style::default().fg(theme.text_muted),
            ))
            .alignment(Alignment::Center),
            rows[1],
        );
    } else {
        let lines: Vec<Line> = history
            .items()
            .iter()
            .map(|tx| transaction_row(tx, theme))
            .collect();
        frame.render_widget(Paragraph::new(lines), rows[1]);
    }
    frame.render_widget(Paragraph::new(page_line(history, theme)), rows[2]);
}

fn transaction_row(tx: &WalletTransaction, theme: &Theme) -> Line<'static> {
    let signed = match tx.kind {
        TransactionKind::Deposit | TransactionKind::LoanDisbursement => tx.amount_minor,
        _ => -tx.amount_minor,
    };
    Line::from(vec![
        Span::styled(
            format!("{}  ", tx.created_at.format("%Y-%m-%d")),
            Style::default().fg(theme.text_muted),
        ),
        Span::raw(format!("{:<18}", tx.kind.as_str())),
        styled_amount(signed, theme),
        Span::styled(
            format!(
                "  {} {}",
                tx.method.as_deref().unwrap_or(""),
                tx.reference.as_deref().unwrap_or("")
            ),
            Style::default().fg(theme.text_muted),
        ),
    ])
}
