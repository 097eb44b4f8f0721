//! Product and market price listings with their record editors.
use api_types::{
    market::MarketPrice,
    product::{Product, ProductStatus},
};
use engine::{Money, editor::SaveVerb, listing::Faceted};
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{List, ListItem, ListState, Paragraph},
};

use crate::{
    app::{
        forms::FormSpec,
        state::{Catalog, MarketScreen},
    },
    ui::{
        components::{
            alert::centered_box,
            form::FieldList,
            pager::{filter_line, list_block, page_line},
        },
        theme::Theme,
    },
};

pub fn render_products(
    frame: &mut Frame<'_>,
    area: Rect,
    title: &str,
    catalog: &Catalog<Product>,
    theme: &Theme,
) {
    render_catalog(frame, area, title, "Status", "product", catalog, theme, product_row);
}

pub fn render_market(frame: &mut Frame<'_>, area: Rect, market: &MarketScreen, theme: &Theme) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(68), Constraint::Percentage(32)])
        .split(area);

    render_catalog(
        frame,
        columns[0],
        "Market prices",
        "Region",
        "market price",
        &market.catalog,
        theme,
        price_row,
    );
    render_prediction(frame, columns[1], market, theme);

    if let Some(prompt) = &market.prompt {
        let inputs = [prompt.product.clone(), prompt.region.clone()];
        let fields = FieldList {
            title: "Predict price",
            labels: &["Product", "Region"],
            inputs: &inputs,
            focus: Some(prompt.focus),
            note: None,
        };
        let rect = centered_box(50, fields.height(), area);
        fields.render(frame, rect, theme);
    }
}

#[allow(clippy::too_many_arguments)]
fn render_catalog<T, F>(
    frame: &mut Frame<'_>,
    area: Rect,
    title: &str,
    facet_label: &str,
    noun: &str,
    catalog: &Catalog<T>,
    theme: &Theme,
    row: F,
) where
    T: FormSpec + Faceted,
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

    frame.render_widget(
        Paragraph::new(filter_line(&catalog.list, catalog.searching, facet_label, theme)),
        rows[0],
    );

    let items = catalog.list.items();
    if items.is_empty() {
        let text = if catalog.list.is_loading() {
            "Loading…"
        } else {
            "Nothing here yet."
        };
        frame.render_widget(
            Paragraph::new(Span::styled(text, Style::default().fg(theme.text_muted)))
                .alignment(Alignment::Center),
            rows[1],
        );
    } else {
        let list = List::new(
            items
                .iter()
                .map(|item| ListItem::new(row(item, theme)))
                .collect::<Vec<_>>(),
        )
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED));
        let mut state = ListState::default().with_selected(Some(catalog.cursor));
        frame.render_stateful_widget(list, rows[1], &mut state);
    }

    frame.render_widget(Paragraph::new(page_line(&catalog.list, theme)), rows[2]);

    if let Some(form) = &catalog.form {
        let title = match form.editor.verb() {
            SaveVerb::Create => format!("New {noun}"),
            SaveVerb::Update(_) => format!("Edit {noun}"),
        };
        let note = if form.editor.is_saving() {
            Some("Saving…")
        } else {
            form.editor.error()
        };
        let fields = FieldList {
            title: &title,
            labels: T::LABELS,
            inputs: &form.inputs,
            focus: Some(form.focus),
            note,
        };
        let rect = centered_box(60, fields.height(), area);
        fields.render(frame, rect, theme);
    }
}

fn product_row(product: &Product, theme: &Theme) -> Line<'static> {
    let status_color = match product.status {
        ProductStatus::Available => theme.positive,
        ProductStatus::Reserved => theme.warning,
        ProductStatus::SoldOut => theme.text_muted,
    };
    Line::from(vec![
        Span::styled(format!("{:<24}", product.name), Style::default().fg(theme.text)),
        Span::styled(
            format!("{:<12}", product.category),
            Style::default().fg(theme.text_muted),
        ),
        Span::raw(format!("{:>8} {:<5}", product.quantity, product.unit)),
        Span::raw(format!("{:>16}  ", Money::new(product.price_minor).to_string())),
        Span::styled(product.status.as_str(), Style::default().fg(status_color)),
    ])
}

fn price_row(price: &MarketPrice, theme: &Theme) -> Line<'static> {
    let date = price.date.map(|d| d.to_string()).unwrap_or_default();
    let mut spans = vec![
        Span::styled(format!("{:<16}", price.product), Style::default().fg(theme.text)),
        Span::styled(
            format!("{:<12}{:<14}", price.region, price.market),
            Style::default().fg(theme.text_muted),
        ),
        Span::raw(format!(
            "{:>14}/{:<5}",
            Money::new(price.price_minor).to_string(),
            price.unit
        )),
        Span::styled(format!(" {date}"), Style::default().fg(theme.text_muted)),
    ];
    if price.is_benchmark {
        spans.push(Span::styled(" ★", Style::default().fg(theme.accent)));
    }
    Line::from(spans)
}

fn render_prediction(frame: &mut Frame<'_>, area: Rect, market: &MarketScreen, theme: &Theme) {
    let block = list_block("Prediction", theme);
    let muted = Style::default().fg(theme.text_muted);

    let lines = if market.predicting {
        vec![Line::from(Span::styled("Predicting…", muted))]
    } else if let Some(prediction) = &market.prediction {
        vec![
            Line::from(vec![
                Span::styled("Product  ", muted),
                Span::raw(prediction.product.clone()),
            ]),
            Line::from(vec![
                Span::styled("Region   ", muted),
                Span::raw(prediction.region.clone()),
            ]),
            Line::default(),
            Line::from(Span::styled(
                Money::new(prediction.predicted_price_minor).to_string(),
                Style::default().fg(theme.accent).add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(
                format!(
                    "in {} days, {:.0}% confidence",
                    prediction.horizon_days,
                    prediction.confidence * 100.0
                ),
                muted,
            )),
        ]
    } else {
        vec![Line::from(Span::styled(
            "Press P to predict a price.",
            muted,
        ))]
    };

    frame.render_widget(Paragraph::new(lines).block(block), area);
}
