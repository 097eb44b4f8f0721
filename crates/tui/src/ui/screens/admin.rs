use api_types::admin::{ApprovalStatus, Farmer, Group};
use engine::listing::ListController;
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{List, ListItem, ListState, Paragraph},
};

use crate::{
    app::state::AdminScreen,
    ui::{
        components::pager::{filter_line, list_block, page_line},
        theme::Theme,
    },
};

pub fn render_groups(frame: &mut Frame<'_>, area: Rect, screen: &AdminScreen, theme: &Theme) {
    let queue = &screen.console.groups;
    render_queue(
        frame,
        area,
        "Farmer groups",
        &queue.list,
        screen.group_cursor,
        screen.searching,
        queue.is_busy(),
        theme,
        |group: &Group, theme| {
            Line::from(vec![
                Span::styled(format!("{:<26}", group.name), Style::default().fg(theme.text)),
                Span::styled(
                    format!(
                        "{:<16}{:>4} members  ",
                        group.region.as_deref().unwrap_or("-"),
                        group.members
                    ),
                    Style::default().fg(theme.text_muted),
                ),
                status_span(group.status, theme),
            ])
        },
    );
}

pub fn render_farmers(frame: &mut Frame<'_>, area: Rect, screen: &AdminScreen, theme: &Theme) {
    let queue = &screen.console.farmers;
    render_queue(
        frame,
        area,
        "Farmers",
        &queue.list,
        screen.farmer_cursor,
        screen.searching,
        queue.is_busy(),
        theme,
        |farmer: &Farmer, theme| {
            Line::from(vec![
                Span::styled(format!("{:<22}", farmer.name), Style::default().fg(theme.text)),
                Span::styled(
                    format!(
                        "{:<28}{:<14}{:<18}",
                        farmer.email,
                        farmer.region.as_deref().unwrap_or("-"),
                        farmer.group.as_deref().unwrap_or("-")
                    ),
                    Style::default().fg(theme.text_muted),
                ),
                status_span(farmer.status, theme),
            ])
        },
    );
}

fn status_span(status: ApprovalStatus, theme: &Theme) -> Span<'static> {
    let color = match status {
        ApprovalStatus::Pending => theme.warning,
        ApprovalStatus::Approved => theme.positive,
        ApprovalStatus::Rejected => theme.error,
    };
    Span::styled(status.as_str(), Style::default().fg(color))
}

#[allow(clippy::too_many_arguments)]
fn render_queue<T, F>(
    frame: &mut Frame<'_>,
    area: Rect,
    title: &str,
    list: &ListController<T>,
    cursor: usize,
    searching: bool,
    busy: bool,
    theme: &Theme,
    row: F,
) where
    F: Fn(&T, &Theme) -> Line<'static>,
{
    let block = list_block(title, theme);
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

    frame.render_widget(Paragraph::new(filter_line(list, searching, "Status", theme)), rows[0]);

    if list.items().is_empty() {
        frame.render_widget(
            Paragraph::new(Span::styled(
                "Nothing to review.",
                Style::default().fg(theme.text_muted),
            ))
            .alignment(Alignment::Center),
            rows[1],
        );
    } else {
        let items: Vec<ListItem> = list
            .items()
            .iter()
            .map(|item| ListItem::new(row(item, theme)))
            .collect();
        let list = List::new(items).highlight_style(Style::default().add_modifier(Modifier::REVERSED));
        let mut state = ListState::default().with_selected(Some(cursor));
        frame.render_stateful_widget(list, rows[1], &mut state);
    }

    let mut footer = page_line(list, theme);
    if busy {
        footer
            .spans
            .push(Span::styled("  saving decision…", Style::default().fg(theme.warning)));
    }
    frame.render_widget(Paragraph::new(footer), rows[2]);
}
