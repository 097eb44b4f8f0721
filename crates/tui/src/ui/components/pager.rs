use engine::listing::ListController;
use ratatui::{
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders},
};

use crate::ui::theme::Theme;

pub fn list_block<'a>(title: &'a str, theme: &Theme) -> Block<'a> {
    Block::default()
        .title(format!(" {title} "))
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(theme.border))
}

/// Search term and active filters of a listing.
pub fn filter_line<T>(
    list: &ListController<T>,
    searching: bool,
    facet_label: &str,
    theme: &Theme,
) -> Line<'static> {
    let muted = Style::default().fg(theme.text_muted);
    let mut spans = vec![Span::styled("Search", muted), Span::raw(": ")];

    let term = list.search_input();
    let shown = if term.is_empty() && !searching { "-" } else { term };
    let mut style = Style::default().fg(theme.text);
    if searching {
        style = style.fg(theme.accent).add_modifier(Modifier::BOLD);
    }
    spans.push(Span::styled(
        format!("{shown}{}", if searching { "│" } else { "" }),
        style,
    ));

    let filters = list.filters();
    spans.push(Span::styled("   Category", muted));
    spans.push(Span::raw(format!(
        ": {}",
        filters.category.as_deref().unwrap_or("all")
    )));
    spans.push(Span::styled(format!("   {facet_label}"), muted));
    spans.push(Span::raw(format!(
        ": {}",
        filters.facet.as_deref().unwrap_or("all")
    )));
    Line::from(spans)
}

/// "Page 2/5 · 48 total", plus loading and error state.
pub fn page_line<T>(list: &ListController<T>, theme: &Theme) -> Line<'static> {
    let muted = Style::default().fg(theme.text_muted);
    let mut spans = vec![Span::styled(
        format!(
            "Page {}/{} · {} total",
            list.page(),
            list.last_page(),
            list.collection().total
        ),
        muted,
    )];
    if list.can_prev() {
        spans.push(Span::styled("  [ prev", muted));
    }
    if list.can_next() {
        spans.push(Span::styled("  ] next", muted));
    }
    if list.is_loading() {
        spans.push(Span::styled("  loading…", Style::default().fg(theme.warning)));
    }
    if let Some(err) = list.error() {
        spans.push(Span::styled(format!("  {err}"), Style::default().fg(theme.error)));
    }
    Line::from(spans)
}
