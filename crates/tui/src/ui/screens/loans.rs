use api_types::loan::{Loan, LoanStatus};
use engine::{Money, editor::SaveVerb};
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{List, ListItem, ListState, Paragraph},
};

use crate::{
    app::{forms::FormSpec, state::LoansScreen},
    ui::{
        components::{
            alert::centered_box,
            form::FieldList,
            pager::{filter_line, list_block, page_line},
        },
        theme::Theme,
    },
};

pub fn render(frame: &mut Frame<'_>, area: Rect, screen: &LoansScreen, theme: &Theme) {
    let catalog = &screen.catalog;
    let block = list_block("My loans", theme);
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

    frame.render_widget(
        Paragraph::new(filter_line(&catalog.list, catalog.searching, "Status", theme)),
        rows[0],
    );

    if catalog.list.items().is_empty() {
        frame.render_widget(
            Paragraph::new(Span::styled(
                "No loans. Press a to apply.",
                Style::default().fg(theme.text_muted),
            ))
            .alignment(Alignment::Center),
            rows[1],
        );
    } else {
        let items: Vec<ListItem> = catalog
            .list
            .items()
            .iter()
            .map(|loan| ListItem::new(loan_row(loan, theme)))
            .collect();
        let list = List::new(items).highlight_style(Style::default().add_modifier(Modifier::REVERSED));
        let mut state = ListState::default().with_selected(Some(catalog.cursor));
        frame.render_stateful_widget(list, rows[1], &mut state);
    }
    frame.render_widget(Paragraph::new(page_line(&catalog.list, theme)), rows[2]);

    if let Some(form) = &catalog.form {
        let title = match form.editor.verb() {
            SaveVerb::Create => "Apply for a loan",
            SaveVerb::Update(_) => "Edit application",
        };
        let note = if form.editor.is_saving() {
            Some("Submitting…")
        } else {
            form.editor.error()
        };
        let fields = FieldList {
            title,
            labels: Loan::LABELS,
            inputs: &form.inputs,
            focus: Some(form.focus),
            note,
        };
        fields.render(frame, centered_box(56, fields.height(), area), theme);
    }

    if let Some(repay) = &screen.repay {
        let note = if repay.is_submitting() {
            "Sending…".to_string()
        } else {
            format!("Outstanding: {}", repay.outstanding())
        };
        let inputs = [repay.amount.clone()];
        let fields = FieldList {
            title: "Repay loan",
            labels: &["Amount (KES)"],
            inputs: &inputs,
            focus: Some(0),
            note: Some(&note),
        };
        fields.render(frame, centered_box(46, fields.height(), area), theme);
    }
}

fn loan_row(loan: &Loan, theme: &Theme) -> Line<'static> {
    let status_color = match loan.status {
        LoanStatus::Active | LoanStatus::Approved => theme.positive,
        LoanStatus::Pending => theme.warning,
        LoanStatus::Rejected => theme.error,
        LoanStatus::Repaid => theme.text_muted,
    };
    let due = loan
        .due_date
        .map(|d| format!("due {d}"))
        .unwrap_or_default();
    Line::from(vec![
        Span::raw(format!("{:>16}  ", Money::from_whole(loan.amount).to_string())),
        Span::styled(format!("{:<28}", loan.purpose), Style::default().fg(theme.text)),
        Span::styled(
            format!("{:>3} mo  ", loan.term_months),
            Style::default().fg(theme.text_muted),
        ),
        Span::styled(format!("{:<10}", loan.status.as_str()), Style::default().fg(status_color)),
        Span::raw(format!("{:>16}  ", Money::new(loan.balance_minor).to_string())),
        Span::styled(due, Style::default().fg(theme.text_muted)),
    ])
}
