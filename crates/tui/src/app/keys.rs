use api_types::{admin::ApprovalStatus, product::ProductStatus};
use crossterm::event::KeyEvent;
use engine::{
    EngineError, Route,
    auth::LoginStep,
    loans::RepayForm,
    market::prediction_target,
    planner::{PlanStage, parse_date},
    products::next_status,
    wallet::{Continue, PaymentMethod, WalletAction, WalletStep},
};
use tokio::time::Instant;

use super::{
    App,
    events::ProductList,
    fetch::Reviewed,
    forms::{PRODUCT_STATUS_FIELD, parse_product_status},
    state::{
        APPROVAL_FACETS, CatalogCommand, DateEdit, DateField, DiaryPane, ListKey, PredictPrompt,
        PlannerScreen, list_key, step_cursor,
    },
};
use crate::ui::keymap::{AppAction, browse_alias, map_key};

impl App {
    pub(super) fn handle_key(&mut self, key: KeyEvent) {
        let action = map_key(key);
        match action {
            AppAction::None => return,
            AppAction::Quit => {
                self.should_quit = true;
                return;
            }
            _ => {}
        }

        if self.state.alert.is_some() {
            if matches!(action, AppAction::Submit | AppAction::Cancel) {
                self.state.alert = None;
            }
            return;
        }

        if self.state.workspace.is_none() {
            self.login_key(action);
            return;
        }

        let typing = self.is_typing();
        let action = match action {
            AppAction::Input(ch) if !typing => browse_alias(ch),
            other => other,
        };
        if !typing && self.global_key(action) {
            return;
        }

        let now = Instant::now();
        match self.state.route {
            Route::Dashboard => self.dashboard_key(action),
            Route::Products => self.products_key(ProductList::Marketplace, action, now),
            Route::Inventory => self.products_key(ProductList::Inventory, action, now),
            Route::MarketPrices => self.market_key(action, now),
            Route::Wallet => self.wallet_key(action, now),
            Route::Loans => self.loans_key(action, now),
            Route::Planner => self.planner_key(action),
            Route::Diary => self.diary_key(action, now),
            Route::AdminGroups | Route::AdminFarmers => self.admin_key(action, now),
            Route::Root | Route::Login | Route::VerifyOtp => {}
        }
    }

    /// True while a text field has focus, so letters are text, not commands.
    fn is_typing(&self) -> bool {
        let Some(ws) = self.state.workspace.as_ref() else {
            return true;
        };
        match self.state.route {
            Route::Products => ws.products.is_typing(),
            Route::Inventory => ws.inventory.is_typing(),
            Route::MarketPrices => ws.market.catalog.is_typing() || ws.market.prompt.is_some(),
            Route::Wallet => *ws.wallet.flow.step() != WalletStep::Selecting,
            Route::Loans => ws.loans.catalog.is_typing() || ws.loans.repay.is_some(),
            Route::Planner => ws.planner.is_typing(),
            Route::AdminGroups | Route::AdminFarmers => ws.admin.searching,
            _ => false,
        }
    }

    fn global_key(&mut self, action: AppAction) -> bool {
        match action {
            AppAction::Input('q') => self.should_quit = true,
            AppAction::Input('T') => self.toggle_theme(),
            AppAction::Input('L') => self.logout(),
            AppAction::Input(ch @ '0'..='9') => {
                let index = match ch.to_digit(10) {
                    Some(0) => 9,
                    Some(n) => n as usize - 1,
                    None => return false,
                };
                let target = self
                    .state
                    .workspace
                    .as_ref()
                    .and_then(|ws| ws.tabs().get(index).copied());
                if let Some(route) = target {
                    self.navigate(route);
                }
            }
            AppAction::NextField | AppAction::PrevField => {
                let Some(tabs) = self.state.workspace.as_ref().map(|ws| ws.tabs()) else {
                    return false;
                };
                let current = tabs.iter().position(|r| *r == self.state.route).unwrap_or(0);
                let next = if action == AppAction::NextField {
                    (current + 1) % tabs.len()
                } else {
                    current.checked_sub(1).unwrap_or(tabs.len() - 1)
                };
                self.navigate(tabs[next]);
            }
            _ => return false,
        }
        true
    }

    fn login_key(&mut self, action: AppAction) {
        let login = &mut self.state.login;
        match (login.step(), action) {
            (LoginStep::Request, AppAction::Input(ch)) => login.email.push(ch),
            (LoginStep::Request, AppAction::Backspace) => {
                login.email.pop();
            }
            (LoginStep::Request, AppAction::Submit) => match login.begin_request() {
                Ok(body) => self.request_login_otp(body),
                Err(err) => self.fail(err),
            },
            (LoginStep::Verify, AppAction::Input(ch)) if ch.is_ascii_digit() => {
                login.otp.push(ch);
            }
            (LoginStep::Verify, AppAction::Backspace) => {
                login.otp.pop();
            }
            (LoginStep::Verify, AppAction::Submit) => match login.begin_verify() {
                Ok(body) => self.verify_login_otp(body),
                Err(err) => self.fail(err),
            },
            (LoginStep::Verify, AppAction::Cancel) if !login.is_busy() => {
                login.restart();
                self.state.route = Route::Login;
            }
            _ => {}
        }
    }

    fn dashboard_key(&mut self, action: AppAction) {
        if action != AppAction::Input('r') {
            return;
        }
        let Some(ws) = self.state.workspace.as_mut() else {
            return;
        };
        if ws.dashboard.is_loading() {
            return;
        }
        ws.dashboard.begin();
        let farmer_id = ws.session.farmer_id().to_string();
        self.fetch_dashboard(farmer_id);
    }

    fn products_key(&mut self, list: ProductList, action: AppAction, now: Instant) {
        let Some(ws) = self.state.workspace.as_mut() else {
            return;
        };
        let owner = ws.session.farmer_id().to_string();
        let catalog = match list {
            ProductList::Marketplace => &mut ws.products,
            ProductList::Inventory => &mut ws.inventory,
        };

        if let Some(form) = catalog.form.as_mut() {
            if form.focus == PRODUCT_STATUS_FIELD
                && matches!(action, AppAction::Left | AppAction::Right)
            {
                let input = &mut form.inputs[PRODUCT_STATUS_FIELD];
                let current = parse_product_status(input).unwrap_or(ProductStatus::Available);
                *input = next_status(current).as_str().to_string();
                return;
            }
        }

        match catalog.key(action, Some(&owner), now) {
            CatalogCommand::None => {}
            CatalogCommand::Fetch(request) => self.fetch_products(list, request),
            CatalogCommand::Save(ticket) => self.save_product(list, ticket),
            CatalogCommand::Invalid(err) => self.fail(err),
        }
    }

    fn market_key(&mut self, action: AppAction, now: Instant) {
        let Some(ws) = self.state.workspace.as_mut() else {
            return;
        };
        let market = &mut ws.market;

        if let Some(prompt) = market.prompt.as_mut() {
            let field = if prompt.focus == 0 {
                &mut prompt.product
            } else {
                &mut prompt.region
            };
            match action {
                AppAction::Input(ch) => field.push(ch),
                AppAction::Backspace => {
                    field.pop();
                }
                AppAction::NextField
                | AppAction::PrevField
                | AppAction::Up
                | AppAction::Down => prompt.focus = 1 - prompt.focus.min(1),
                AppAction::Cancel => market.prompt = None,
                AppAction::Submit => {
                    if market.predicting {
                        self.fail(EngineError::InFlight);
                        return;
                    }
                    match prediction_target(&prompt.product, &prompt.region) {
                        Ok((product, region)) => {
                            market.predicting = true;
                            market.prompt = None;
                            self.predict_price(product, region);
                        }
                        Err(err) => self.fail(err),
                    }
                }
                _ => {}
            }
            return;
        }

        if !market.catalog.is_typing() && action == AppAction::Input('P') {
            let prompt = market
                .catalog
                .selected()
                .map(|price| PredictPrompt {
                    product: price.product.clone(),
                    region: price.region.clone(),
                    focus: 0,
                })
                .unwrap_or_default();
            market.prompt = Some(prompt);
            return;
        }

        match market.catalog.key(action, None, now) {
            CatalogCommand::None => {}
            CatalogCommand::Fetch(request) => self.fetch_market(request),
            CatalogCommand::Save(ticket) => self.save_market_price(ticket),
            CatalogCommand::Invalid(err) => self.fail(err),
        }
    }

    fn wallet_key(&mut self, action: AppAction, now: Instant) {
        let Some(ws) = self.state.workspace.as_mut() else {
            return;
        };
        let screen = &mut ws.wallet;

        match screen.flow.step().clone() {
            WalletStep::Selecting => {
                let chosen = match action {
                    AppAction::Up | AppAction::Down => {
                        screen.cursor = step_cursor(
                            screen.cursor,
                            WalletAction::ALL.len(),
                            action == AppAction::Down,
                        );
                        return;
                    }
                    AppAction::Submit => Some(screen.highlighted()),
                    AppAction::Input('d') => Some(WalletAction::Deposit),
                    AppAction::Input('w') => Some(WalletAction::Withdraw),
                    AppAction::Input('t') => Some(WalletAction::Transfer),
                    AppAction::Input('p') => Some(WalletAction::Pay),
                    _ => None,
                };
                if let Some(chosen) = chosen {
                    screen.flow.select(chosen);
                    screen.field = 0;
                    return;
                }

                // History paging and filters; the cursor keys belong to the
                // action selector above.
                let (mut cursor, mut searching) = (0, false);
                let refresh = action == AppAction::Input('r');
                let key = list_key(
                    &mut screen.flow.history,
                    &mut cursor,
                    &mut searching,
                    None,
                    action,
                    now,
                );
                let farmer_id = ws.session.farmer_id().to_string();
                if let ListKey::Fetch(request) = key {
                    if refresh {
                        self.fetch_balance(farmer_id);
                    }
                    self.fetch_history(request);
                }
            }
            WalletStep::Entering(form) => match action {
                AppAction::NextField | AppAction::PrevField | AppAction::Up | AppAction::Down => {
                    screen.field = 1 - screen.field.min(1);
                }
                AppAction::Left | AppAction::Right
                    if screen.field == 1 && form.action.uses_mobile_money() =>
                {
                    if let Some(form) = screen.flow.form_mut() {
                        form.method = Some(form.method.map_or(PaymentMethod::Mpesa, |m| m.next()));
                    }
                }
                AppAction::Input(ch) => {
                    let field = screen.field;
                    if let Some(form) = screen.flow.form_mut() {
                        if field == 0 {
                            if ch.is_ascii_digit() {
                                form.amount.push(ch);
                            }
                        } else if !form.action.uses_mobile_money() {
                            form.destination.push(ch);
                        }
                    }
                }
                AppAction::Backspace => {
                    let field = screen.field;
                    if let Some(form) = screen.flow.form_mut() {
                        if field == 0 {
                            form.amount.pop();
                        } else {
                            form.destination.pop();
                        }
                    }
                }
                AppAction::Cancel => {
                    screen.flow.cancel();
                    screen.field = 0;
                }
                AppAction::Submit => match screen.flow.continue_action(&ws.session) {
                    Ok(Continue::RequestOtp(body)) => self.send_wallet_otp(body),
                    Ok(Continue::Execute(pending)) => self.execute_wallet_action(pending),
                    Err(err) => self.fail(err),
                },
                _ => {}
            },
            WalletStep::AwaitingOtp { .. } => match action {
                AppAction::Input(ch) if ch.is_ascii_digit() => {
                    if let Some(otp) = screen.flow.otp_mut() {
                        otp.push(ch);
                    }
                }
                AppAction::Backspace => {
                    if let Some(otp) = screen.flow.otp_mut() {
                        otp.pop();
                    }
                }
                AppAction::Cancel => screen.flow.cancel(),
                AppAction::Submit => match screen.flow.submit_otp() {
                    Ok(confirmation) => self.confirm_wallet_action(confirmation),
                    Err(err) => self.fail(err),
                },
                _ => {}
            },
        }
    }

    fn loans_key(&mut self, action: AppAction, now: Instant) {
        let Some(ws) = self.state.workspace.as_mut() else {
            return;
        };
        let farmer_id = ws.session.farmer_id().to_string();
        let loans = &mut ws.loans;

        if let Some(repay) = loans.repay.as_mut() {
            match action {
                AppAction::Input(ch) if ch.is_ascii_digit() => repay.amount.push(ch),
                AppAction::Backspace => {
                    repay.amount.pop();
                }
                AppAction::Cancel if !repay.is_submitting() => loans.repay = None,
                AppAction::Submit => match repay.begin(&farmer_id) {
                    Ok((loan_id, body)) => self.repay_loan(loan_id, body),
                    Err(err) => self.fail(err),
                },
                _ => {}
            }
            return;
        }

        if !loans.catalog.is_typing() && action == AppAction::Input('p') {
            let Some(loan) = loans.catalog.selected() else {
                return;
            };
            match RepayForm::open(loan) {
                Ok(form) => loans.repay = Some(form),
                Err(err) => self.fail(err),
            }
            return;
        }

        match loans.catalog.key(action, Some(&farmer_id), now) {
            CatalogCommand::None => {}
            CatalogCommand::Fetch(request) => self.fetch_loans(request),
            CatalogCommand::Save(ticket) => self.save_loan(ticket),
            CatalogCommand::Invalid(err) => self.fail(err),
        }
    }

    fn planner_key(&mut self, action: AppAction) {
        let Some(ws) = self.state.workspace.as_mut() else {
            return;
        };
        let farmer_id = ws.session.farmer_id().to_string();
        let planner = &mut ws.planner;

        if matches!(planner.wizard.stage(), PlanStage::Form) {
            if !planner.editing {
                if matches!(action, AppAction::Submit | AppAction::Input('e')) {
                    planner.editing = true;
                }
                return;
            }
            match action {
                AppAction::Input(ch) => planner.focused_input().push(ch),
                AppAction::Backspace => {
                    planner.focused_input().pop();
                }
                AppAction::NextField | AppAction::Down => {
                    planner.focus = (planner.focus + 1) % PlannerScreen::FIELDS.len();
                }
                AppAction::PrevField | AppAction::Up => {
                    planner.focus = planner
                        .focus
                        .checked_sub(1)
                        .unwrap_or(PlannerScreen::FIELDS.len() - 1);
                }
                AppAction::Cancel => planner.editing = false,
                AppAction::Submit => match planner.wizard.begin_generate() {
                    Ok(request) => self.generate_plan(request),
                    Err(err) => self.fail(err),
                },
                _ => {}
            }
            return;
        }

        if let Some(edit) = planner.date_edit.as_mut() {
            match action {
                AppAction::Input(ch) => edit.input.push(ch),
                AppAction::Backspace => {
                    edit.input.pop();
                }
                AppAction::Cancel => planner.date_edit = None,
                AppAction::Submit => {
                    let field = edit.field;
                    let applied = parse_date(&edit.input).and_then(|date| match field {
                        DateField::Planned => planner.wizard.set_planned_date(planner.cursor, date),
                        DateField::Deadline => planner.wizard.set_deadline(planner.cursor, date),
                    });
                    match applied {
                        Ok(()) => planner.date_edit = None,
                        Err(err) => self.fail(err),
                    }
                }
                _ => {}
            }
            return;
        }

        let activities = planner.wizard.plan().map_or(0, |plan| plan.activities.len());
        match action {
            AppAction::Up | AppAction::Down => {
                planner.cursor = step_cursor(planner.cursor, activities, action == AppAction::Down);
            }
            AppAction::Input(key @ ('p' | 'd')) => {
                let Some(activity) = planner
                    .wizard
                    .plan()
                    .and_then(|plan| plan.activities.get(planner.cursor))
                else {
                    return;
                };
                let (field, date) = if key == 'p' {
                    (DateField::Planned, activity.planned_date)
                } else {
                    (DateField::Deadline, activity.deadline)
                };
                planner.date_edit = Some(DateEdit {
                    field,
                    input: date.to_string(),
                });
            }
            AppAction::Input('b') => {
                planner.wizard.adjust();
                planner.cursor = 0;
                planner.editing = true;
            }
            AppAction::Input('s') => match planner.wizard.begin_save(&farmer_id) {
                Ok(body) => self.save_plan(body),
                Err(err) => self.fail(err),
            },
            _ => {}
        }
    }

    fn diary_key(&mut self, action: AppAction, now: Instant) {
        let Some(ws) = self.state.workspace.as_mut() else {
            return;
        };
        let screen = &mut ws.diary;

        match action {
            AppAction::Left => {
                screen.pane = DiaryPane::Seasons;
                return;
            }
            AppAction::Right => {
                screen.pane = DiaryPane::Activities;
                return;
            }
            _ => {}
        }

        match screen.pane {
            DiaryPane::Seasons => {
                if action == AppAction::Submit {
                    let Some(season) = screen.diary.seasons.items().get(screen.season_cursor)
                    else {
                        return;
                    };
                    let season_id = season.id.clone();
                    let fetch = screen.diary.select(&season_id);
                    screen.activity_cursor = 0;
                    screen.pane = DiaryPane::Activities;
                    self.fetch_activities(fetch);
                    return;
                }
                if action == AppAction::Input('/') {
                    return;
                }
                let mut searching = false;
                let key = list_key(
                    &mut screen.diary.seasons,
                    &mut screen.season_cursor,
                    &mut searching,
                    None,
                    action,
                    now,
                );
                if let ListKey::Fetch(request) = key {
                    self.fetch_seasons(request);
                }
            }
            DiaryPane::Activities => match action {
                AppAction::Up | AppAction::Down => {
                    screen.activity_cursor = step_cursor(
                        screen.activity_cursor,
                        screen.diary.activities().len(),
                        action == AppAction::Down,
                    );
                }
                AppAction::Submit | AppAction::Input(' ') => {
                    match screen.diary.begin_toggle(screen.activity_cursor) {
                        Ok((id, update)) => self.update_activity(id, update),
                        Err(err) => self.fail(err),
                    }
                }
                AppAction::Input('r') => {
                    if let Some(fetch) = screen.diary.reload() {
                        self.fetch_activities(fetch);
                    }
                }
                _ => {}
            },
        }
    }

    fn admin_key(&mut self, action: AppAction, now: Instant) {
        let route = self.state.route;
        let Some(ws) = self.state.workspace.as_mut() else {
            return;
        };
        let admin = &mut ws.admin;

        if !admin.searching && action == AppAction::Input('v') {
            let other = if route == Route::AdminGroups {
                Route::AdminFarmers
            } else {
                Route::AdminGroups
            };
            self.navigate(other);
            return;
        }

        let decision = match action {
            AppAction::Input('y') if !admin.searching => Some(ApprovalStatus::Approved),
            AppAction::Input('n') if !admin.searching => Some(ApprovalStatus::Rejected),
            _ => None,
        };

        if route == Route::AdminGroups {
            let queue = &mut admin.console.groups;
            if let Some(status) = decision {
                match queue.begin_decision(admin.group_cursor, status) {
                    Ok((id, body)) => self.decide(Reviewed::Group, id, body),
                    Err(err) => self.fail(err),
                }
                return;
            }
            let key = list_key(
                &mut queue.list,
                &mut admin.group_cursor,
                &mut admin.searching,
                Some(&APPROVAL_FACETS),
                action,
                now,
            );
            if let ListKey::Fetch(request) = key {
                self.fetch_groups(request);
            }
        } else {
            let queue = &mut admin.console.farmers;
            if let Some(status) = decision {
                match queue.begin_decision(admin.farmer_cursor, status) {
                    Ok((id, body)) => self.decide(Reviewed::Farmer, id, body),
                    Err(err) => self.fail(err),
                }
                return;
            }
            let key = list_key(
                &mut queue.list,
                &mut admin.farmer_cursor,
                &mut admin.searching,
                Some(&APPROVAL_FACETS),
                action,
                now,
            );
            if let ListKey::Fetch(request) = key {
                self.fetch_farmers(request);
            }
        }
    }
}
