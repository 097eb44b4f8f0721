pub mod components;
pub mod keymap;
pub mod screens;

mod terminal;
mod theme;

use engine::{Route, wallet::WalletStep};
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Paragraph},
};

use crate::app::{AppState, Workspace, state::DiaryPane};
use components::hints::{KeyHint, hint_separator, hints_to_spans};

pub use terminal::{AppTerminal as Terminal, restore_terminal, setup_terminal};
pub use theme::Theme;

pub fn render(frame: &mut Frame<'_>, state: &AppState) {
    let area = frame.area();
    let theme = Theme::from(state.theme);
    frame.render_widget(
        Block::default().style(Style::default().bg(theme.background).fg(theme.text)),
        area,
    );

    match state.workspace.as_ref() {
        Some(ws) if !state.route.is_public() => render_shell(frame, area, state, ws, &theme),
        _ => screens::login::render(frame, area, state, &theme),
    }

    components::toast::render(frame, area, state.toast.as_ref(), &theme);
    if let Some(message) = state.alert.as_deref() {
        components::alert::render(frame, area, message, &theme);
    }
}

fn render_shell(frame: &mut Frame<'_>, area: Rect, state: &AppState, ws: &Workspace, theme: &Theme) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Info bar
            Constraint::Length(2), // Tabs
            Constraint::Min(0),
            Constraint::Length(1), // Hints
        ])
        .split(area);

    render_info_bar(frame, layout[0], state, ws, theme);
    components::tabs::render_tabs(frame, layout[1], &ws.tabs(), state.route, theme);

    let content = layout[2];
    match state.route {
        Route::Dashboard => screens::dashboard::render(frame, content, state, ws, theme),
        Route::Products => {
            screens::catalog::render_products(frame, content, "Marketplace", &ws.products, theme)
        }
        Route::Inventory => {
            screens::catalog::render_products(frame, content, "My inventory", &ws.inventory, theme)
        }
        Route::MarketPrices => screens::catalog::render_market(frame, content, &ws.market, theme),
        Route::Wallet => screens::wallet::render(frame, content, &ws.wallet, theme),
        Route::Loans => screens::loans::render(frame, content, &ws.loans, theme),
        Route::Planner => screens::planner::render(frame, content, &ws.planner, theme),
        Route::Diary => screens::diary::render(frame, content, &ws.diary, theme),
        Route::AdminGroups => screens::admin::render_groups(frame, content, &ws.admin, theme),
        Route::AdminFarmers => screens::admin::render_farmers(frame, content, &ws.admin, theme),
        Route::Root | Route::Login | Route::VerifyOtp => {}
    }

    render_bottom_bar(frame, layout[3], state, ws, theme);
}

fn render_info_bar(frame: &mut Frame<'_>, area: Rect, state: &AppState, ws: &Workspace, theme: &Theme) {
    let user = &ws.session.user;
    let name = user.name.as_deref().unwrap_or(user.email.as_str());
    let role = if ws.session.is_admin() { "admin" } else { "farmer" };
    let now = chrono::Utc::now().with_timezone(&state.timezone);

    let line = Line::from(vec![
        Span::styled("User", Style::default().fg(theme.text_muted)),
        Span::raw(format!(": {name} ({role})  ")),
        Span::styled("Server", Style::default().fg(theme.text_muted)),
        Span::raw(format!(": {}  ", state.base_url)),
        Span::styled("Time", Style::default().fg(theme.text_muted)),
        Span::raw(format!(": {}", now.format("%H:%M"))),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

fn render_bottom_bar(frame: &mut Frame<'_>, area: Rect, state: &AppState, ws: &Workspace, theme: &Theme) {
    let mut parts = hints_to_spans(&context_hints(state.route, ws), theme);
    parts.push(hint_separator(theme));
    parts.extend(hints_to_spans(
        &[
            KeyHint::new("Tab", "next"),
            KeyHint::new("T", "theme"),
            KeyHint::new("L", "logout"),
            KeyHint::new("q", "quit"),
        ],
        theme,
    ));
    frame.render_widget(Paragraph::new(Line::from(parts)), area);
}

fn list_hints() -> Vec<KeyHint> {
    vec![
        KeyHint::new("/", "search"),
        KeyHint::new("c", "category"),
        KeyHint::new("f", "filter"),
        KeyHint::new("x", "clear"),
        KeyHint::new("[ ]", "page"),
    ]
}

fn form_hints() -> Vec<KeyHint> {
    vec![
        KeyHint::new("Tab", "next field"),
        KeyHint::new("Enter", "save"),
        KeyHint::new("Esc", "close"),
    ]
}

/// Keys that make sense on the current screen and in its current mode.
fn context_hints(route: Route, ws: &Workspace) -> Vec<KeyHint> {
    let catalog_hints = |typing: bool, editing: bool| {
        if editing {
            form_hints()
        } else if typing {
            vec![KeyHint::new("Enter", "done"), KeyHint::new("Esc", "done")]
        } else {
            let mut hints = vec![KeyHint::new("a", "add"), KeyHint::new("e", "edit")];
            hints.extend(list_hints());
            hints
        }
    };

    match route {
        Route::Dashboard => vec![KeyHint::new("r", "refresh")],
        Route::Products => catalog_hints(ws.products.searching, ws.products.form.is_some()),
        Route::Inventory => catalog_hints(ws.inventory.searching, ws.inventory.form.is_some()),
        Route::MarketPrices => {
            if ws.market.prompt.is_some() {
                vec![KeyHint::new("Enter", "predict"), KeyHint::new("Esc", "close")]
            } else {
                let catalog = &ws.market.catalog;
                let mut hints = catalog_hints(catalog.searching, catalog.form.is_some());
                if !catalog.is_typing() {
                    hints.insert(0, KeyHint::new("P", "predict"));
                }
                hints
            }
        }
        Route::Wallet => match ws.wallet.flow.step() {
            WalletStep::Selecting => vec![
                KeyHint::new("d/w/t/p", "action"),
                KeyHint::new("f", "type"),
                KeyHint::new("[ ]", "page"),
                KeyHint::new("r", "refresh"),
            ],
            WalletStep::Entering(_) => vec![
                KeyHint::new("Tab", "field"),
                KeyHint::new("←→", "method"),
                KeyHint::new("Enter", "continue"),
                KeyHint::new("Esc", "back"),
            ],
            WalletStep::AwaitingOtp { .. } => {
                vec![KeyHint::new("Enter", "confirm"), KeyHint::new("Esc", "cancel")]
            }
        },
        Route::Loans => {
            if ws.loans.repay.is_some() {
                vec![KeyHint::new("Enter", "repay"), KeyHint::new("Esc", "close")]
            } else {
                let catalog = &ws.loans.catalog;
                let mut hints = catalog_hints(catalog.searching, catalog.form.is_some());
                if !catalog.is_typing() {
                    hints.insert(0, KeyHint::new("p", "repay"));
                }
                hints
            }
        }
        Route::Planner => {
            let planner = &ws.planner;
            if planner.date_edit.is_some() {
                vec![KeyHint::new("Enter", "set date"), KeyHint::new("Esc", "cancel")]
            } else if planner.wizard.plan().is_some() {
                vec![
                    KeyHint::new("p", "planned"),
                    KeyHint::new("d", "deadline"),
                    KeyHint::new("b", "adjust"),
                    KeyHint::new("s", "save"),
                ]
            } else if planner.editing {
                vec![
                    KeyHint::new("Tab", "next field"),
                    KeyHint::new("Enter", "generate"),
                    KeyHint::new("Esc", "stop editing"),
                ]
            } else {
                vec![KeyHint::new("e", "edit")]
            }
        }
        Route::Diary => match ws.diary.pane {
            DiaryPane::Seasons => vec![
                KeyHint::new("Enter", "open"),
                KeyHint::new("→", "activities"),
                KeyHint::new("[ ]", "page"),
            ],
            DiaryPane::Activities => vec![
                KeyHint::new("Space", "done/undo"),
                KeyHint::new("←", "seasons"),
                KeyHint::new("r", "reload"),
            ],
        },
        Route::AdminGroups | Route::AdminFarmers => {
            let mut hints = vec![
                KeyHint::new("y", "approve"),
                KeyHint::new("n", "reject"),
                KeyHint::new("v", "switch"),
            ];
            hints.extend(list_hints());
            hints
        }
        Route::Root | Route::Login | Route::VerifyOtp => Vec::new(),
    }
}
