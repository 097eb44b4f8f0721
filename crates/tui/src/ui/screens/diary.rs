use api_types::planner::Activity;
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{List, ListItem, ListState, Paragraph},
};

use crate::{
    app::state::{DiaryPane, DiaryScreen},
    ui::{
        components::pager::{list_block, page_line},
        theme::Theme,
    },
};

pub fn render(frame: &mut Frame<'_>, area: Rect, screen: &DiaryScreen, theme: &Theme) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(38), Constraint::Percentage(62)])
        .split(area);
    render_seasons(frame, columns[0], screen, theme);
    render_activities(frame, columns[1], screen, theme);
}

fn pane_block<'a>(title: &'a str, active: bool, theme: &Theme) -> ratatui::widgets::Block<'a> {
    let block = list_block(title, theme);
    if active {
        block.border_style(Style::default().fg(theme.accent))
    } else {
        block
    }
}

fn render_seasons(frame: &mut Frame<'_>, area: Rect, screen: &DiaryScreen, theme: &Theme) {
    let seasons = &screen.diary.seasons;
    let active = screen.pane == DiaryPane::Seasons;
    let block = pane_block("Seasons", active, theme);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)])
        .split(inner);

    if seasons.items().is_empty() {
        frame.render_widget(
            Paragraph::new(Span::styled(
                "No seasons yet.",
                Style::default().fg(theme.text_muted),
            ))
            .alignment(Alignment::Center),
            rows[0],
        );
    } else {
        let selected = screen.diary.selected();
        let items: Vec<ListItem> = seasons
            .items()
            .iter()
            .map(|season| {
                let marker = if selected == Some(season.id.as_str()) {
                    "● "
                } else {
                    "  "
                };
                ListItem::new(Line::from(vec![
                    Span::styled(marker, Style::default().fg(theme.accent)),
                    Span::raw(format!("{:<14}", season.crop)),
                    Span::styled(
                        format!("{} · {}", season.location, season.start_date),
                        Style::default().fg(theme.text_muted),
                    ),
                ]))
            })
            .collect();
        let mut list = List::new(items);
        if active {
            list = list.highlight_style(Style::default().add_modifier(Modifier::REVERSED));
        }
        let mut state = ListState::default().with_selected(Some(screen.season_cursor));
        frame.render_stateful_widget(list, rows[0], &mut state);
    }
    frame.render_widget(Paragraph::new(page_line(seasons, theme)), rows[1]);
}

fn render_activities(frame: &mut Frame<'_>, area: Rect, screen: &DiaryScreen, theme: &Theme) {
    let active = screen.pane == DiaryPane::Activities;
    let block = pane_block("Activities", active, theme);
    let muted = Style::default().fg(theme.text_muted);

    let activities = screen.diary.activities();
    if activities.is_empty() {
        let text = if screen.diary.is_loading() {
            "Loading…"
        } else if screen.diary.selected().is_none() {
            "Pick a season and press Enter."
        } else {
            "This season has no activities."
        };
        frame.render_widget(
            Paragraph::new(Span::styled(text, muted))
                .alignment(Alignment::Center)
                .block(block),
            area,
        );
        return;
    }

    let items: Vec<ListItem> = activities
        .iter()
        .map(|activity| ListItem::new(activity_row(activity, theme)))
        .collect();
    let mut list = List::new(items).block(block);
    if active {
        list = list.highlight_style(Style::default().add_modifier(Modifier::REVERSED));
    }
    let mut state = ListState::default().with_selected(Some(screen.activity_cursor));
    frame.render_stateful_widget(list, area, &mut state);
}

fn activity_row(activity: &Activity, theme: &Theme) -> Line<'static> {
    let (mark, style) = if activity.completed {
        ("[x] ", Style::default().fg(theme.text_muted).add_modifier(Modifier::CROSSED_OUT))
    } else {
        ("[ ] ", Style::default().fg(theme.text))
    };
    Line::from(vec![
        Span::styled(mark, Style::default().fg(theme.accent)),
        Span::raw(format!("{}  ", activity.planned_date)),
        Span::styled(format!("{:<28}", activity.name), style),
        Span::styled(
            format!("until {}", activity.deadline),
            Style::default().fg(theme.text_muted),
        ),
    ])
}
