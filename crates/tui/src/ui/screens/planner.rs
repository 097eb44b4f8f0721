use engine::planner::PlanStage;
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{List, ListItem, ListState, Paragraph},
};

use crate::{
    app::state::{DateField, PlannerScreen},
    ui::{
        components::{alert::centered_box, form::FieldList, pager::list_block},
        theme::Theme,
    },
};

pub fn render(frame: &mut Frame<'_>, area: Rect, screen: &PlannerScreen, theme: &Theme) {
    match screen.wizard.stage() {
        PlanStage::Form => render_form(frame, area, screen, theme),
        PlanStage::Review(_) => render_review(frame, area, screen, theme),
    }
}

fn render_form(frame: &mut Frame<'_>, area: Rect, screen: &PlannerScreen, theme: &Theme) {
    let form = &screen.wizard.form;
    let inputs = [
        form.crop.clone(),
        form.location.clone(),
        form.acreage.clone(),
        form.planting_date.clone(),
    ];
    let note = if screen.wizard.is_busy() {
        Some("Generating your plan…")
    } else if let Some(err) = screen.wizard.error() {
        Some(err)
    } else if !screen.editing {
        Some("Press e to fill in the form. Dates are YYYY-MM-DD.")
    } else {
        None
    };
    let fields = FieldList {
        title: "Plan a season",
        labels: &PlannerScreen::FIELDS,
        inputs: &inputs,
        focus: screen.editing.then_some(screen.focus),
        note,
    };
    let rect = centered_box(60, fields.height(), area);
    fields.render(frame, rect, theme);
}

fn render_review(frame: &mut Frame<'_>, area: Rect, screen: &PlannerScreen, theme: &Theme) {
    let Some(plan) = screen.wizard.plan() else {
        return;
    };
    let muted = Style::default().fg(theme.text_muted);
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(4), Constraint::Min(0)])
        .split(area);

    let season = &plan.season;
    let mut header = vec![
        Line::from(vec![
            Span::styled(
                format!("{} in {}", season.crop, season.location),
                Style::default().fg(theme.text).add_modifier(Modifier::BOLD),
            ),
            Span::styled(format!("  {} acres", season.acreage), muted),
        ]),
        Line::from(Span::styled(
            format!(
                "{} → harvest {}",
                season.start_date, season.expected_harvest
            ),
            muted,
        )),
    ];
    if let Some(err) = screen.wizard.error() {
        header[1]
            .spans
            .push(Span::styled(format!("   {err}"), Style::default().fg(theme.error)));
    } else if screen.wizard.is_busy() {
        header[1].spans.push(Span::styled("   Saving…", Style::default().fg(theme.warning)));
    }
    frame.render_widget(
        Paragraph::new(header).block(list_block("Review plan", theme)),
        layout[0],
    );

    let items: Vec<ListItem> = plan
        .activities
        .iter()
        .map(|activity| {
            let late = activity.deadline < activity.planned_date;
            let deadline_style = if late {
                Style::default().fg(theme.error)
            } else {
                muted
            };
            ListItem::new(Line::from(vec![
                Span::raw(format!("{}  ", activity.planned_date)),
                Span::styled(format!("{:<28}", activity.name), Style::default().fg(theme.text)),
                Span::styled(format!("{:<18}", activity.kind.label()), muted),
                Span::styled(format!("deadline {}", activity.deadline), deadline_style),
            ]))
        })
        .collect();
    let list = List::new(items)
        .block(list_block("Activities", theme))
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED));
    let mut state = ListState::default().with_selected(Some(screen.cursor));
    frame.render_stateful_widget(list, layout[1], &mut state);

    if let Some(edit) = &screen.date_edit {
        let label = match edit.field {
            DateField::Planned => "Planned date",
            DateField::Deadline => "Deadline",
        };
        let inputs = [edit.input.clone()];
        let fields = FieldList {
            title: "Change date",
            labels: &[label],
            inputs: &inputs,
            focus: Some(0),
            note: Some("YYYY-MM-DD"),
        };
        fields.render(frame, centered_box(40, fields.height(), area), theme);
    }
}
