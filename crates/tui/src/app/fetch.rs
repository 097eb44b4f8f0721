//! Spawners for backend calls. Each one clones the backend into a task and
//! reports through [`AppEvent`].
use api_types::{
    admin::Decision,
    auth::{OtpRequest, OtpVerify},
    loan::{Loan, LoanRepayment},
    market::MarketPrice,
    planner::{ActivityUpdate, PlanRequest, SavePlan},
    product::Product,
    wallet::OtpSend,
};
use engine::{
    EngineError, Route,
    backend::{
        AdminApi, AuthApi, DashboardApi, DiaryApi, LoanApi, MarketApi, PlannerApi, ProductApi,
        WalletApi,
    },
    diary::ActivityFetch,
    editor::SaveTicket,
    listing::FetchRequest,
    loans,
    wallet::{self, Confirmation, PendingAction},
};
use tokio::time::Instant;

use super::{
    App,
    events::{AppEvent, ProductList},
};

impl App {
    /// Loads what a screen shows on its first visit.
    pub(super) fn load_route(&mut self, route: Route) {
        let Some(ws) = self.state.workspace.as_mut() else {
            return;
        };
        let farmer_id = ws.session.farmer_id().to_string();
        match route {
            Route::Dashboard => {
                ws.dashboard.begin();
                self.fetch_dashboard(farmer_id);
            }
            Route::Products => {
                let request = ws.products.list.initial_fetch();
                self.fetch_products(ProductList::Marketplace, request);
            }
            Route::Inventory => {
                let request = ws.inventory.list.initial_fetch();
                self.fetch_products(ProductList::Inventory, request);
            }
            Route::MarketPrices => {
                let request = ws.market.catalog.list.initial_fetch();
                self.fetch_market(request);
            }
            Route::Wallet => {
                let request = ws.wallet.flow.history.initial_fetch();
                self.fetch_balance(farmer_id);
                self.fetch_history(request);
            }
            Route::Loans => {
                let request = ws.loans.catalog.list.initial_fetch();
                self.fetch_loans(request);
            }
            Route::Diary => {
                let request = ws.diary.diary.seasons.initial_fetch();
                let activities = ws.diary.diary.reload();
                self.fetch_seasons(request);
                if let Some(fetch) = activities {
                    self.fetch_activities(fetch);
                }
            }
            Route::AdminGroups => {
                let request = ws.admin.console.groups.list.initial_fetch();
                self.fetch_groups(request);
            }
            Route::AdminFarmers => {
                let request = ws.admin.console.farmers.list.initial_fetch();
                self.fetch_farmers(request);
            }
            Route::Planner | Route::Root | Route::Login | Route::VerifyOtp => {}
        }
    }

    /// Issues the searches whose typing has settled.
    pub(super) fn poll_searches(&mut self, now: Instant) {
        let Some(ws) = self.state.workspace.as_mut() else {
            return;
        };
        let products = ws.products.list.poll_debounce(now);
        let inventory = ws.inventory.list.poll_debounce(now);
        let market = ws.market.catalog.list.poll_debounce(now);
        let loans = ws.loans.catalog.list.poll_debounce(now);
        let groups = ws.admin.console.groups.list.poll_debounce(now);
        let farmers = ws.admin.console.farmers.list.poll_debounce(now);

        if let Some(request) = products {
            self.fetch_products(ProductList::Marketplace, request);
        }
        if let Some(request) = inventory {
            self.fetch_products(ProductList::Inventory, request);
        }
        if let Some(request) = market {
            self.fetch_market(request);
        }
        if let Some(request) = loans {
            self.fetch_loans(request);
        }
        if let Some(request) = groups {
            self.fetch_groups(request);
        }
        if let Some(request) = farmers {
            self.fetch_farmers(request);
        }
    }

    pub(super) fn request_login_otp(&self, body: OtpRequest) {
        let api = self.backend.clone();
        self.spawn(async move {
            let result = api.request_login_otp(&body).await.map_err(EngineError::from);
            AppEvent::LoginOtpRequested(result)
        });
    }

    pub(super) fn verify_login_otp(&self, body: OtpVerify) {
        let api = self.backend.clone();
        self.spawn(async move {
            let result = api.verify_login_otp(&body).await.map_err(EngineError::from);
            AppEvent::LoginVerified(result)
        });
    }

    pub(super) fn fetch_dashboard(&self, farmer_id: String) {
        let api = self.backend.clone();
        self.spawn(async move {
            let result = api.dashboard(&farmer_id).await.map_err(EngineError::from);
            AppEvent::Dashboard(result)
        });
    }

    pub(super) fn fetch_products(&self, list: ProductList, request: FetchRequest) {
        tracing::debug!(?list, seq = request.seq, page = request.query.page, "fetching products");
        let api = self.backend.clone();
        self.spawn(async move {
            let result = api
                .list_products(&request.query)
                .await
                .map_err(EngineError::from);
            AppEvent::Products {
                list,
                seq: request.seq,
                result,
            }
        });
    }

    pub(super) fn save_product(&self, list: ProductList, ticket: SaveTicket<Product>) {
        let api = self.backend.clone();
        self.spawn(async move {
            AppEvent::ProductSaved {
                list,
                result: ticket.submit(&api).await,
            }
        });
    }

    pub(super) fn fetch_market(&self, request: FetchRequest) {
        let api = self.backend.clone();
        self.spawn(async move {
            let result = api
                .list_market_prices(&request.query)
                .await
                .map_err(EngineError::from);
            AppEvent::MarketPrices {
                seq: request.seq,
                result,
            }
        });
    }

    pub(super) fn save_market_price(&self, ticket: SaveTicket<MarketPrice>) {
        let api = self.backend.clone();
        self.spawn(async move { AppEvent::MarketPriceSaved(ticket.submit(&api).await) });
    }

    pub(super) fn predict_price(&self, product: String, region: String) {
        let api = self.backend.clone();
        self.spawn(async move {
            let result = api
                .predict_price(&product, &region)
                .await
                .map_err(EngineError::from);
            AppEvent::Prediction(result)
        });
    }

    pub(super) fn fetch_balance(&self, farmer_id: String) {
        let api = self.backend.clone();
        self.spawn(async move {
            let result = api.balance(&farmer_id).await.map_err(EngineError::from);
            AppEvent::Balance(result)
        });
    }

    pub(super) fn fetch_history(&self, request: FetchRequest) {
        let api = self.backend.clone();
        self.spawn(async move {
            let result = api
                .wallet_history(&request.query)
                .await
                .map_err(EngineError::from);
            AppEvent::History {
                seq: request.seq,
                result,
            }
        });
    }

    pub(super) fn send_wallet_otp(&self, body: OtpSend) {
        let api = self.backend.clone();
        self.spawn(async move {
            let result = api.send_otp(&body).await.map_err(EngineError::from);
            AppEvent::WalletOtpSent(result)
        });
    }

    pub(super) fn execute_wallet_action(&self, pending: PendingAction) {
        let api = self.backend.clone();
        self.spawn(async move {
            AppEvent::WalletCompleted(wallet::execute(&api, &pending).await)
        });
    }

    pub(super) fn confirm_wallet_action(&self, confirmation: Confirmation) {
        let api = self.backend.clone();
        self.spawn(async move {
            AppEvent::WalletCompleted(wallet::confirm(&api, &confirmation).await)
        });
    }

    pub(super) fn fetch_loans(&self, request: FetchRequest) {
        let api = self.backend.clone();
        self.spawn(async move {
            let result = api
                .list_loans(&request.query)
                .await
                .map_err(EngineError::from);
            AppEvent::Loans {
                seq: request.seq,
                result,
            }
        });
    }

    pub(super) fn save_loan(&self, ticket: SaveTicket<Loan>) {
        let api = self.backend.clone();
        self.spawn(async move { AppEvent::LoanSaved(ticket.submit(&api).await) });
    }

    pub(super) fn repay_loan(&self, loan_id: String, body: LoanRepayment) {
        let api = self.backend.clone();
        self.spawn(async move { AppEvent::LoanRepaid(loans::repay(&api, &loan_id, &body).await) });
    }

    pub(super) fn generate_plan(&self, request: PlanRequest) {
        let api = self.backend.clone();
        self.spawn(async move {
            let result = api.generate_plan(&request).await.map_err(EngineError::from);
            AppEvent::PlanGenerated(result)
        });
    }

    pub(super) fn save_plan(&self, body: SavePlan) {
        let api = self.backend.clone();
        self.spawn(async move {
            let result = api.save_plan(&body).await.map_err(EngineError::from);
            AppEvent::PlanSaved(result)
        });
    }

    pub(super) fn fetch_seasons(&self, request: FetchRequest) {
        let api = self.backend.clone();
        self.spawn(async move {
            let result = api
                .list_seasons(&request.query)
                .await
                .map_err(EngineError::from);
            AppEvent::Seasons {
                seq: request.seq,
                result,
            }
        });
    }

    pub(super) fn fetch_activities(&self, fetch: ActivityFetch) {
        let api = self.backend.clone();
        self.spawn(async move {
            let result = api
                .season_activities(&fetch.season_id)
                .await
                .map_err(EngineError::from);
            AppEvent::Activities { fetch, result }
        });
    }

    pub(super) fn update_activity(&self, id: String, update: ActivityUpdate) {
        let api = self.backend.clone();
        self.spawn(async move {
            let result = api
                .update_activity(&id, &update)
                .await
                .map_err(EngineError::from);
            AppEvent::ActivityUpdated(result)
        });
    }

    pub(super) fn fetch_groups(&self, request: FetchRequest) {
        let api = self.backend.clone();
        self.spawn(async move {
            let result = api
                .list_groups(&request.query)
                .await
                .map_err(EngineError::from);
            AppEvent::Groups {
                seq: request.seq,
                result,
            }
        });
    }

    pub(super) fn fetch_farmers(&self, request: FetchRequest) {
        let api = self.backend.clone();
        self.spawn(async move {
            let result = api
                .list_farmers(&request.query)
                .await
                .map_err(EngineError::from);
            AppEvent::Farmers {
                seq: request.seq,
                result,
            }
        });
    }

    pub(super) fn decide(&self, target: Reviewed, id: String, decision: Decision) {
        let api = self.backend.clone();
        self.spawn(async move {
            match target {
                Reviewed::Group => AppEvent::GroupDecided(
                    api.decide_group(&id, &decision)
                        .await
                        .map_err(EngineError::from),
                ),
                Reviewed::Farmer => AppEvent::FarmerDecided(
                    api.decide_farmer(&id, &decision)
                        .await
                        .map_err(EngineError::from),
                ),
            }
        });
    }
}

/// Which review queue a decision belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Reviewed {
    Group,
    Farmer,
}
