use ratatui::{
    Frame,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph},
};

use crate::ui::theme::Theme;

/// Labelled text inputs, one per row, with a cursor on the focused one.
pub struct FieldList<'a> {
    pub title: &'a str,
    pub labels: &'a [&'a str],
    pub inputs: &'a [String],
    pub focus: Option<usize>,
    /// Status line under the fields, e.g. the last save error.
    pub note: Option<&'a str>,
}

impl FieldList<'_> {
    /// Rows needed including borders and the note line.
    pub fn height(&self) -> u16 {
        self.labels.len() as u16 + 3
    }

    pub fn render(&self, frame: &mut Frame<'_>, area: Rect, theme: &Theme) {
        let label_width = self.labels.iter().map(|l| l.len()).max().unwrap_or(0);
        let mut lines: Vec<Line> = self
            .labels
            .iter()
            .enumerate()
            .map(|(idx, label)| {
                let value = self.inputs.get(idx).map_or("", String::as_str);
                let focused = self.focus == Some(idx);
                let cursor = if focused { "│" } else { "" };
                let value_style = if focused {
                    Style::default().fg(theme.accent).add_modifier(Modifier::BOLD)
                } else {
                    Style::default().fg(theme.text)
                };
                Line::from(vec![
                    Span::styled(
                        format!("{label:<label_width$}  "),
                        Style::default().fg(theme.text_muted),
                    ),
                    Span::styled(format!("{value}{cursor}"), value_style),
                ])
            })
            .collect();
        if let Some(note) = self.note {
            lines.push(Line::from(Span::styled(
                note.to_string(),
                Style::default().fg(theme.warning),
            )));
        }

        let block = Block::default()
            .title(format!(" {} ", self.title))
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(theme.accent));
        frame.render_widget(Clear, area);
        frame.render_widget(Paragraph::new(lines).block(block), area);
    }
}
