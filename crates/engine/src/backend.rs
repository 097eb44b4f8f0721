//! Ports to the external backend.
//!
//! One trait per area so callers (and test doubles) only depend on what they
//! use. [`HttpBackend`](crate::HttpBackend) implements all of them.
use std::future::Future;

use api_types::{
    PageQuery, Paginated,
    admin::{Decision, Farmer, Group},
    auth::{OtpRequest, OtpVerify, UserRecord},
    dashboard::DashboardSummary,
    loan::{Loan, LoanRepayment},
    market::{MarketPrice, PricePrediction},
    planner::{Activity, ActivityUpdate, GeneratedPlan, PlanRequest, SavePlan, SavedPlan, Season},
    product::Product,
    wallet::{
        MobileMoneyRequest, OtpCheck, OtpSend, PeerPayment, WalletBalance, WalletReceipt,
        WalletTransaction,
    },
};

use crate::ApiError;

pub type ApiResult<T> = Result<T, ApiError>;

pub trait AuthApi {
    fn request_login_otp(&self, body: &OtpRequest) -> impl Future<Output = ApiResult<()>> + Send;
    fn verify_login_otp(
        &self,
        body: &OtpVerify,
    ) -> impl Future<Output = ApiResult<UserRecord>> + Send;
}

pub trait DashboardApi {
    fn dashboard(&self, farmer_id: &str)
    -> impl Future<Output = ApiResult<DashboardSummary>> + Send;
}

pub trait ProductApi {
    fn list_products(
        &self,
        query: &PageQuery,
    ) -> impl Future<Output = ApiResult<Paginated<Product>>> + Send;
    fn create_product(
        &self,
        product: &Product,
        idempotency_key: &str,
    ) -> impl Future<Output = ApiResult<Product>> + Send;
    fn update_product(
        &self,
        id: &str,
        product: &Product,
    ) -> impl Future<Output = ApiResult<Product>> + Send;
}

pub trait MarketApi {
    fn list_market_prices(
        &self,
        query: &PageQuery,
    ) -> impl Future<Output = ApiResult<Paginated<MarketPrice>>> + Send;
    fn create_market_price(
        &self,
        price: &MarketPrice,
        idempotency_key: &str,
    ) -> impl Future<Output = ApiResult<MarketPrice>> + Send;
    fn update_market_price(
        &self,
        id: &str,
        price: &MarketPrice,
    ) -> impl Future<Output = ApiResult<MarketPrice>> + Send;
    fn predict_price(
        &self,
        product: &str,
        region: &str,
    ) -> impl Future<Output = ApiResult<PricePrediction>> + Send;
}

pub trait WalletApi {
    fn balance(&self, farmer_id: &str) -> impl Future<Output = ApiResult<WalletBalance>> + Send;
    /// `query.scope` carries the farmer id, `query.facet` the transaction type.
    fn wallet_history(
        &self,
        query: &PageQuery,
    ) -> impl Future<Output = ApiResult<Paginated<WalletTransaction>>> + Send;
    fn send_otp(&self, body: &OtpSend) -> impl Future<Output = ApiResult<()>> + Send;
    fn verify_otp(&self, body: &OtpCheck) -> impl Future<Output = ApiResult<()>> + Send;
    fn top_up(
        &self,
        body: &MobileMoneyRequest,
    ) -> impl Future<Output = ApiResult<WalletReceipt>> + Send;
    fn withdraw(
        &self,
        body: &MobileMoneyRequest,
    ) -> impl Future<Output = ApiResult<WalletReceipt>> + Send;
    fn transfer(&self, body: &PeerPayment) -> impl Future<Output = ApiResult<WalletReceipt>> + Send;
    fn pay(&self, body: &PeerPayment) -> impl Future<Output = ApiResult<WalletReceipt>> + Send;
}

pub trait LoanApi {
    fn list_loans(
        &self,
        query: &PageQuery,
    ) -> impl Future<Output = ApiResult<Paginated<Loan>>> + Send;
    fn create_loan(
        &self,
        loan: &Loan,
        idempotency_key: &str,
    ) -> impl Future<Output = ApiResult<Loan>> + Send;
    fn update_loan(&self, id: &str, loan: &Loan) -> impl Future<Output = ApiResult<Loan>> + Send;
    fn repay_loan(
        &self,
        id: &str,
        body: &LoanRepayment,
    ) -> impl Future<Output = ApiResult<WalletReceipt>> + Send;
}

pub trait PlannerApi {
    fn generate_plan(
        &self,
        request: &PlanRequest,
    ) -> impl Future<Output = ApiResult<GeneratedPlan>> + Send;
    fn save_plan(&self, plan: &SavePlan) -> impl Future<Output = ApiResult<SavedPlan>> + Send;
}

pub trait DiaryApi {
    fn list_seasons(
        &self,
        query: &PageQuery,
    ) -> impl Future<Output = ApiResult<Paginated<Season>>> + Send;
    fn season_activities(
        &self,
        season_id: &str,
    ) -> impl Future<Output = ApiResult<Vec<Activity>>> + Send;
    fn update_activity(
        &self,
        id: &str,
        update: &ActivityUpdate,
    ) -> impl Future<Output = ApiResult<Activity>> + Send;
}

pub trait AdminApi {
    fn list_groups(
        &self,
        query: &PageQuery,
    ) -> impl Future<Output = ApiResult<Paginated<Group>>> + Send;
    fn list_farmers(
        &self,
        query: &PageQuery,
    ) -> impl Future<Output = ApiResult<Paginated<Farmer>>> + Send;
    fn decide_group(
        &self,
        id: &str,
        decision: &Decision,
    ) -> impl Future<Output = ApiResult<Group>> + Send;
    fn decide_farmer(
        &self,
        id: &str,
        decision: &Decision,
    ) -> impl Future<Output = ApiResult<Farmer>> + Send;
}
