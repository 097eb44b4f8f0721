use engine::Route;

use super::{
    App,
    events::{AppEvent, ProductList},
    state::{ToastLevel, clamp_index},
};

impl App {
    pub(super) fn apply_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::LoginOtpRequested(result) => match self.state.login.finish_request(result) {
                Ok(()) => self.state.route = Route::VerifyOtp,
                Err(err) => self.fail(err),
            },
            AppEvent::LoginVerified(result) => {
                match self.state.login.finish_verify(result, &mut self.sessions) {
                    Ok(_) => {
                        self.signed_in();
                        self.notify("Signed in.", ToastLevel::Success);
                    }
                    Err(err) => self.fail(err),
                }
            }
            other => self.apply_workspace_event(other),
        }
    }

    /// Answers that only make sense while signed in.
    fn apply_workspace_event(&mut self, event: AppEvent) {
        let Some(ws) = self.state.workspace.as_mut() else {
            tracing::debug!(?event, "no session, dropping answer");
            return;
        };
        let farmer_id = ws.session.farmer_id().to_string();

        match event {
            AppEvent::LoginOtpRequested(_) | AppEvent::LoginVerified(_) => {}
            AppEvent::Dashboard(result) => {
                if let Err(err) = ws.dashboard.finish(result) {
                    self.fail(err);
                }
            }
            AppEvent::Products { list, seq, result } => {
                let catalog = match list {
                    ProductList::Marketplace => &mut ws.products,
                    ProductList::Inventory => &mut ws.inventory,
                };
                match catalog.list.apply(seq, result) {
                    Ok(_) => catalog.clamp_cursor(),
                    Err(err) => self.fail(err),
                }
            }
            AppEvent::ProductSaved { list, result } => {
                let (catalog, other) = match list {
                    ProductList::Marketplace => (&mut ws.products, Route::Inventory),
                    ProductList::Inventory => (&mut ws.inventory, Route::Products),
                };
                match catalog.saved(result) {
                    Ok(request) => {
                        ws.invalidate(other);
                        ws.invalidate(Route::Dashboard);
                        self.fetch_products(list, request);
                        self.notify("Product saved.", ToastLevel::Success);
                    }
                    Err(err) => self.fail(err),
                }
            }
            AppEvent::MarketPrices { seq, result } => {
                let catalog = &mut ws.market.catalog;
                match catalog.list.apply(seq, result) {
                    Ok(_) => catalog.clamp_cursor(),
                    Err(err) => self.fail(err),
                }
            }
            AppEvent::MarketPriceSaved(result) => match ws.market.catalog.saved(result) {
                Ok(request) => {
                    ws.invalidate(Route::Dashboard);
                    self.fetch_market(request);
                    self.notify("Market price saved.", ToastLevel::Success);
                }
                Err(err) => self.fail(err),
            },
            AppEvent::Prediction(result) => {
                ws.market.predicting = false;
                match result {
                    Ok(prediction) => ws.market.prediction = Some(prediction),
                    Err(err) => self.fail(err),
                }
            }
            AppEvent::Balance(result) => match result {
                Ok(balance) => ws.wallet.flow.set_balance(balance),
                Err(err) => self.fail(err),
            },
            AppEvent::History { seq, result } => {
                if let Err(err) = ws.wallet.flow.history.apply(seq, result) {
                    self.fail(err);
                }
            }
            AppEvent::WalletOtpSent(result) => match ws.wallet.flow.otp_sent(result) {
                Ok(()) => self.notify("Code sent to your phone.", ToastLevel::Info),
                Err(err) => self.fail(err),
            },
            AppEvent::WalletCompleted(result) => match ws.wallet.flow.finish(result) {
                Ok(receipt) => {
                    ws.wallet.field = 0;
                    ws.invalidate(Route::Dashboard);
                    let history = ws.wallet.flow.history.refresh();
                    self.fetch_balance(farmer_id);
                    self.fetch_history(history);
                    self.notify(
                        format!("Done. Reference {}.", receipt.reference),
                        ToastLevel::Success,
                    );
                }
                Err(err) => self.fail(err),
            },
            AppEvent::Loans { seq, result } => {
                let catalog = &mut ws.loans.catalog;
                match catalog.list.apply(seq, result) {
                    Ok(_) => catalog.clamp_cursor(),
                    Err(err) => self.fail(err),
                }
            }
            AppEvent::LoanSaved(result) => match ws.loans.catalog.saved(result) {
                Ok(request) => {
                    ws.invalidate(Route::Dashboard);
                    self.fetch_loans(request);
                    self.notify("Loan application saved.", ToastLevel::Success);
                }
                Err(err) => self.fail(err),
            },
            AppEvent::LoanRepaid(result) => {
                let Some(repay) = ws.loans.repay.as_mut() else {
                    return;
                };
                match repay.finish(result) {
                    Ok(receipt) => {
                        ws.loans.repay = None;
                        ws.invalidate(Route::Wallet);
                        ws.invalidate(Route::Dashboard);
                        let request = ws.loans.catalog.list.refresh();
                        self.fetch_loans(request);
                        self.notify(
                            format!("Repayment sent. Reference {}.", receipt.reference),
                            ToastLevel::Success,
                        );
                    }
                    Err(err) => self.fail(err),
                }
            }
            AppEvent::PlanGenerated(result) => {
                let planner = &mut ws.planner;
                match planner.wizard.finish_generate(result) {
                    Ok(()) => {
                        planner.editing = false;
                        planner.cursor = 0;
                    }
                    Err(err) => self.fail(err),
                }
            }
            AppEvent::PlanSaved(result) => {
                let mut saved = None;
                let outcome = ws
                    .planner
                    .wizard
                    .finish_save(result, |plan| saved = Some(plan));
                if let Err(err) = outcome {
                    self.fail(err);
                    return;
                }
                ws.planner.editing = false;
                ws.planner.cursor = 0;
                ws.invalidate(Route::Diary);
                ws.invalidate(Route::Dashboard);
                if let Some(plan) = saved {
                    // Activities arrive with the diary reload on navigation.
                    ws.diary.diary.focus(&plan.season_id);
                    ws.diary.activity_cursor = 0;
                }
                self.notify("Plan saved to your diary.", ToastLevel::Success);
                self.navigate(Route::Diary);
            }
            AppEvent::Seasons { seq, result } => {
                let screen = &mut ws.diary;
                match screen.diary.seasons.apply(seq, result) {
                    Ok(_) => {
                        screen.season_cursor =
                            clamp_index(screen.season_cursor, screen.diary.seasons.items().len());
                    }
                    Err(err) => self.fail(err),
                }
            }
            AppEvent::Activities { fetch, result } => {
                let screen = &mut ws.diary;
                match screen.diary.apply_activities(&fetch, result) {
                    Ok(()) => {
                        screen.activity_cursor =
                            clamp_index(screen.activity_cursor, screen.diary.activities().len());
                    }
                    Err(err) => self.fail(err),
                }
            }
            AppEvent::ActivityUpdated(result) => {
                let (result, reload) = ws.diary.diary.finish_toggle(result);
                ws.invalidate(Route::Dashboard);
                if let Some(fetch) = reload {
                    self.fetch_activities(fetch);
                }
                match result {
                    Ok(activity) => {
                        let state = if activity.completed { "done" } else { "open" };
                        self.notify(format!("{} marked {state}.", activity.name), ToastLevel::Success);
                    }
                    Err(err) => self.fail(err),
                }
            }
            AppEvent::Groups { seq, result } => {
                let admin = &mut ws.admin;
                match admin.console.groups.list.apply(seq, result) {
                    Ok(_) => {
                        admin.group_cursor = clamp_index(
                            admin.group_cursor,
                            admin.console.groups.list.items().len(),
                        );
                    }
                    Err(err) => self.fail(err),
                }
            }
            AppEvent::Farmers { seq, result } => {
                let admin = &mut ws.admin;
                match admin.console.farmers.list.apply(seq, result) {
                    Ok(_) => {
                        admin.farmer_cursor = clamp_index(
                            admin.farmer_cursor,
                            admin.console.farmers.list.items().len(),
                        );
                    }
                    Err(err) => self.fail(err),
                }
            }
            AppEvent::GroupDecided(result) => {
                let name = result.as_ref().ok().map(|group| group.name.clone());
                match ws.admin.console.groups.finish_decision(result) {
                    Ok(request) => {
                        self.fetch_groups(request);
                        self.notify(
                            format!("Group {} updated.", name.unwrap_or_default()),
                            ToastLevel::Success,
                        );
                    }
                    Err(err) => self.fail(err),
                }
            }
            AppEvent::FarmerDecided(result) => {
                let name = result.as_ref().ok().map(|farmer| farmer.name.clone());
                match ws.admin.console.farmers.finish_decision(result) {
                    Ok(request) => {
                        self.fetch_farmers(request);
                        self.notify(
                            format!("Farmer {} updated.", name.unwrap_or_default()),
                            ToastLevel::Success,
                        );
                    }
                    Err(err) => self.fail(err),
                }
            }
        }
    }
}
