use std::time::Duration;

use api_types::{
    admin::ApprovalStatus,
    loan::Loan,
    market::{MarketPrice, PricePrediction},
    product::Product,
};
use chrono_tz::Tz;
use engine::{
    EngineError, Route, Session, ThemeChoice,
    admin::AdminConsole,
    auth::LoginFlow,
    dashboard::Dashboard,
    diary::Diary,
    editor::SaveTicket,
    listing::{Faceted, FetchRequest, ListController, cycle_option},
    loans::RepayForm,
    planner::PlanWizard,
    wallet::{OtpPolicy, WalletAction, WalletFlow},
};
use tokio::time::Instant;

use crate::{
    app::forms::{EditForm, FormSpec},
    config::AppConfig,
    ui::keymap::AppAction,
};

pub const TOAST_TTL: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastLevel {
    Info,
    Success,
}

#[derive(Debug, Clone)]
pub struct ToastState {
    pub message: String,
    pub level: ToastLevel,
    pub expires_at: Instant,
}

/// Moves a list cursor by one, clamped to `len`.
pub fn step_cursor(cursor: usize, len: usize, down: bool) -> usize {
    if len == 0 {
        return 0;
    }
    if down {
        (cursor + 1).min(len - 1)
    } else {
        cursor.saturating_sub(1)
    }
}

/// Keeps a cursor inside a list that may have shrunk.
pub fn clamp_index(cursor: usize, len: usize) -> usize {
    cursor.min(len.saturating_sub(1))
}

/// Outcome of a key on a paginated list.
#[derive(Debug, PartialEq, Eq)]
pub enum ListKey {
    Handled,
    Fetch(FetchRequest),
    Unhandled,
}

impl From<Option<FetchRequest>> for ListKey {
    fn from(request: Option<FetchRequest>) -> Self {
        request.map_or(Self::Handled, Self::Fetch)
    }
}

/// Search, filter, paging and cursor keys shared by every listing.
///
/// `fixed_facets` replaces the page-derived facet options for listings whose
/// facet is a closed set.
pub fn list_key<T: Faceted>(
    list: &mut ListController<T>,
    cursor: &mut usize,
    searching: &mut bool,
    fixed_facets: Option<&[&str]>,
    action: AppAction,
    now: Instant,
) -> ListKey {
    if *searching {
        return match action {
            AppAction::Input(ch) => {
                let mut text = list.search_input().to_string();
                text.push(ch);
                list.set_search_input(text, now);
                ListKey::Handled
            }
            AppAction::Backspace => {
                let mut text = list.search_input().to_string();
                text.pop();
                list.set_search_input(text, now);
                ListKey::Handled
            }
            AppAction::Submit | AppAction::Cancel => {
                *searching = false;
                ListKey::Handled
            }
            _ => ListKey::Unhandled,
        };
    }

    match action {
        AppAction::Up | AppAction::Down => {
            *cursor = step_cursor(*cursor, list.items().len(), action == AppAction::Down);
            ListKey::Handled
        }
        AppAction::NextPage => list.next_page().into(),
        AppAction::PrevPage => list.prev_page().into(),
        AppAction::Input('/') => {
            *searching = true;
            ListKey::Handled
        }
        AppAction::Input('c') => {
            let next = cycle_option(list.filters().category.as_deref(), &list.category_options());
            list.set_category(next).into()
        }
        AppAction::Input('f') => {
            let options = match fixed_facets {
                Some(fixed) => fixed.iter().map(|s| s.to_string()).collect(),
                None => list.facet_options(),
            };
            let next = cycle_option(list.filters().facet.as_deref(), &options);
            list.set_facet(next).into()
        }
        AppAction::Input('x') => list.clear_filters().into(),
        AppAction::Input('r') => ListKey::Fetch(list.refresh()),
        _ => ListKey::Unhandled,
    }
}

/// What a catalog screen asks the app to do after a key.
#[derive(Debug)]
pub enum CatalogCommand<T> {
    None,
    Fetch(FetchRequest),
    Save(SaveTicket<T>),
    Invalid(EngineError),
}

/// A listing with an optional record editor on top.
#[derive(Debug)]
pub struct Catalog<T> {
    pub list: ListController<T>,
    pub cursor: usize,
    pub searching: bool,
    pub form: Option<EditForm<T>>,
}

impl<T: FormSpec + Faceted> Catalog<T> {
    pub fn new(list: ListController<T>) -> Self {
        Self {
            list,
            cursor: 0,
            searching: false,
            form: None,
        }
    }

    pub fn selected(&self) -> Option<&T> {
        self.list.items().get(self.cursor)
    }

    pub fn is_typing(&self) -> bool {
        self.searching || self.form.is_some()
    }

    pub fn clamp_cursor(&mut self) {
        self.cursor = clamp_index(self.cursor, self.list.items().len());
    }

    pub fn key(&mut self, action: AppAction, owner: Option<&str>, now: Instant) -> CatalogCommand<T> {
        if let Some(form) = self.form.as_mut() {
            let mut close = false;
            let command = form_key(form, &mut close, action, owner);
            if close {
                self.form = None;
            }
            return command;
        }
        match list_key(
            &mut self.list,
            &mut self.cursor,
            &mut self.searching,
            None,
            action,
            now,
        ) {
            ListKey::Fetch(request) => return CatalogCommand::Fetch(request),
            ListKey::Handled => return CatalogCommand::None,
            ListKey::Unhandled => {}
        }
        match action {
            AppAction::Input('a') => self.form = Some(EditForm::open(None)),
            AppAction::Submit | AppAction::Input('e') => {
                if let Some(record) = self.selected().cloned() {
                    self.form = Some(EditForm::open(Some(record)));
                }
            }
            _ => {}
        }
        CatalogCommand::None
    }

    /// Closes the editor after a save went through and refetches the list.
    pub fn saved(&mut self, result: Result<T, EngineError>) -> Result<FetchRequest, EngineError> {
        let Some(form) = self.form.as_mut() else {
            return Err(EngineError::validation("No editor is open."));
        };
        form.editor.finish_save(result)?;
        self.form = None;
        Ok(self.list.refresh())
    }
}

fn form_key<T: FormSpec>(
    form: &mut EditForm<T>,
    close: &mut bool,
    action: AppAction,
    owner: Option<&str>,
) -> CatalogCommand<T> {
    match action {
        AppAction::Input(ch) => {
            if let Some(input) = form.focused_input() {
                input.push(ch);
            }
        }
        AppAction::Backspace => {
            if let Some(input) = form.focused_input() {
                input.pop();
            }
        }
        AppAction::NextField | AppAction::Down => form.next_field(),
        AppAction::PrevField | AppAction::Up => form.prev_field(),
        AppAction::Cancel if !form.editor.is_saving() => *close = true,
        AppAction::Submit => {
            if form.editor.is_saving() {
                return CatalogCommand::Invalid(EngineError::InFlight);
            }
            if let Err(err) = form.sync() {
                return CatalogCommand::Invalid(err);
            }
            return match form.editor.begin_save(owner) {
                Ok(ticket) => CatalogCommand::Save(ticket),
                Err(err) => CatalogCommand::Invalid(err),
            };
        }
        _ => {}
    }
    CatalogCommand::None
}

#[derive(Debug, Clone, Default)]
pub struct PredictPrompt {
    pub product: String,
    pub region: String,
    pub focus: usize,
}

#[derive(Debug)]
pub struct MarketScreen {
    pub catalog: Catalog<MarketPrice>,
    pub prompt: Option<PredictPrompt>,
    pub prediction: Option<PricePrediction>,
    pub predicting: bool,
}

#[derive(Debug)]
pub struct WalletScreen {
    pub flow: WalletFlow,
    pub cursor: usize,
    pub field: usize,
}

impl WalletScreen {
    pub fn highlighted(&self) -> WalletAction {
        WalletAction::ALL[self.cursor.min(WalletAction::ALL.len() - 1)]
    }
}

#[derive(Debug)]
pub struct LoansScreen {
    pub catalog: Catalog<Loan>,
    pub repay: Option<RepayForm>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateField {
    Planned,
    Deadline,
}

#[derive(Debug, Clone)]
pub struct DateEdit {
    pub field: DateField,
    pub input: String,
}

#[derive(Debug, Default)]
pub struct PlannerScreen {
    pub wizard: PlanWizard,
    pub editing: bool,
    pub focus: usize,
    pub cursor: usize,
    pub date_edit: Option<DateEdit>,
}

impl PlannerScreen {
    pub const FIELDS: [&'static str; 4] = ["Crop", "Location", "Acreage", "Planting date"];

    pub fn focused_input(&mut self) -> &mut String {
        let form = &mut self.wizard.form;
        match self.focus {
            0 => &mut form.crop,
            1 => &mut form.location,
            2 => &mut form.acreage,
            _ => &mut form.planting_date,
        }
    }

    pub fn is_typing(&self) -> bool {
        self.date_edit.is_some() || (self.editing && self.wizard.plan().is_none())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiaryPane {
    Seasons,
    Activities,
}

#[derive(Debug)]
pub struct DiaryScreen {
    pub diary: Diary,
    pub season_cursor: usize,
    pub activity_cursor: usize,
    pub pane: DiaryPane,
}

#[derive(Debug)]
pub struct AdminScreen {
    pub console: AdminConsole,
    pub group_cursor: usize,
    pub farmer_cursor: usize,
    pub searching: bool,
}

pub const APPROVAL_FACETS: [&str; 3] = [
    ApprovalStatus::Pending.as_str(),
    ApprovalStatus::Approved.as_str(),
    ApprovalStatus::Rejected.as_str(),
];

/// Everything that belongs to the signed-in user. Dropped on logout.
#[derive(Debug)]
pub struct Workspace {
    pub session: Session,
    pub dashboard: Dashboard,
    pub products: Catalog<Product>,
    pub inventory: Catalog<Product>,
    pub market: MarketScreen,
    pub wallet: WalletScreen,
    pub loans: LoansScreen,
    pub planner: PlannerScreen,
    pub diary: DiaryScreen,
    pub admin: AdminScreen,
    loaded: Vec<Route>,
}

impl Workspace {
    pub fn new(session: Session, config: &AppConfig, policy: OtpPolicy) -> Self {
        let page_size = config.page_size;
        let delay = config.search_debounce();
        let farmer_id = session.farmer_id().to_string();
        Self {
            dashboard: Dashboard::default(),
            products: Catalog::new(ListController::with_debounce(page_size, delay)),
            inventory: Catalog::new(
                ListController::with_debounce(page_size, delay).scoped(farmer_id.as_str()),
            ),
            market: MarketScreen {
                catalog: Catalog::new(ListController::with_debounce(page_size, delay)),
                prompt: None,
                prediction: None,
                predicting: false,
            },
            wallet: WalletScreen {
                flow: WalletFlow::new(policy, &farmer_id, page_size),
                cursor: 0,
                field: 0,
            },
            loans: LoansScreen {
                catalog: Catalog::new(
                    ListController::with_debounce(page_size, delay).scoped(farmer_id.as_str()),
                ),
                repay: None,
            },
            planner: PlannerScreen::default(),
            diary: DiaryScreen {
                diary: Diary::new(&farmer_id, page_size),
                season_cursor: 0,
                activity_cursor: 0,
                pane: DiaryPane::Seasons,
            },
            admin: AdminScreen {
                console: AdminConsole::new(page_size),
                group_cursor: 0,
                farmer_cursor: 0,
                searching: false,
            },
            session,
            loaded: Vec::new(),
        }
    }

    /// True the first time a route is visited.
    pub fn first_visit(&mut self, route: Route) -> bool {
        if self.loaded.contains(&route) {
            return false;
        }
        self.loaded.push(route);
        true
    }

    /// Forces a reload on the next visit.
    pub fn invalidate(&mut self, route: Route) {
        self.loaded.retain(|r| *r != route);
    }

    pub fn tabs(&self) -> Vec<Route> {
        let mut tabs = vec![
            Route::Dashboard,
            Route::Products,
            Route::Inventory,
            Route::MarketPrices,
            Route::Wallet,
            Route::Loans,
            Route::Planner,
            Route::Diary,
        ];
        if self.session.is_admin() {
            tabs.extend([Route::AdminGroups, Route::AdminFarmers]);
        }
        tabs
    }
}

#[derive(Debug)]
pub struct AppState {
    pub route: Route,
    pub theme: ThemeChoice,
    pub login: LoginFlow,
    pub workspace: Option<Workspace>,
    pub toast: Option<ToastState>,
    /// Blocking alert; dismissed with Enter or Esc.
    pub alert: Option<String>,
    pub base_url: String,
    pub timezone: Tz,
}

#[cfg(test)]
mod tests {
    use super::*;
    use api_types::Paginated;

    fn loaded_catalog(names: &[&str]) -> Catalog<Product> {
        let mut catalog = Catalog::new(ListController::<Product>::new(10));
        let fetch = catalog.list.initial_fetch();
        let data = names
            .iter()
            .map(|name| Product {
                id: Some(format!("id-{name}")),
                name: name.to_string(),
                ..<Product as engine::editor::Draft>::defaults()
            })
            .collect::<Vec<_>>();
        let total = data.len() as u64;
        catalog
            .list
            .apply(
                fetch.seq,
                Ok(Paginated {
                    data,
                    total,
                    page: 1,
                    limit: 10,
                }),
            )
            .unwrap();
        catalog
    }

    #[test]
    fn cursor_is_clamped() {
        assert_eq!(step_cursor(0, 0, true), 0);
        assert_eq!(step_cursor(2, 3, true), 2);
        assert_eq!(step_cursor(0, 3, false), 0);
    }

    #[test]
    fn slash_starts_search_and_typing_is_debounced() {
        let mut catalog = loaded_catalog(&["Maize"]);
        let now = Instant::now();
        catalog.key(AppAction::Input('/'), None, now);
        assert!(catalog.is_typing());
        for ch in ['b', 'e', 'a'] {
            assert!(matches!(catalog.key(AppAction::Input(ch), None, now), CatalogCommand::None));
        }
        assert!(catalog.list.has_pending_search());
        let request = catalog
            .list
            .poll_debounce(now + Duration::from_millis(600))
            .unwrap();
        assert_eq!(request.query.search.as_deref(), Some("bea"));
        assert_eq!(request.query.page, 1);
    }

    #[test]
    fn enter_opens_selected_record_and_submit_saves() {
        let mut catalog = loaded_catalog(&["Maize", "Beans"]);
        let now = Instant::now();
        catalog.key(AppAction::Down, None, now);
        catalog.key(AppAction::Submit, None, now);
        let form = catalog.form.as_ref().unwrap();
        assert_eq!(form.inputs[0], "Beans");

        match catalog.key(AppAction::Submit, Some("f1"), now) {
            CatalogCommand::Save(ticket) => {
                assert_eq!(ticket.payload.id.as_deref(), Some("id-Beans"));
            }
            other => panic!("expected a save, got {other:?}"),
        }
        assert!(matches!(
            catalog.key(AppAction::Submit, Some("f1"), now),
            CatalogCommand::Invalid(EngineError::InFlight)
        ));
    }

    #[test]
    fn escape_closes_the_editor() {
        let mut catalog = loaded_catalog(&["Maize"]);
        let now = Instant::now();
        catalog.key(AppAction::Input('a'), None, now);
        assert!(catalog.form.is_some());
        catalog.key(AppAction::Cancel, None, now);
        assert!(catalog.form.is_none());
    }

    #[test]
    fn fixed_facets_cycle_without_data() {
        let mut list = ListController::<api_types::admin::Group>::new(10);
        let (mut cursor, mut searching) = (0, false);
        let key = list_key(
            &mut list,
            &mut cursor,
            &mut searching,
            Some(&APPROVAL_FACETS),
            AppAction::Input('f'),
            Instant::now(),
        );
        match key {
            ListKey::Fetch(request) => assert_eq!(request.query.facet.as_deref(), Some("pending")),
            other => panic!("expected a fetch, got {other:?}"),
        }
    }
}
