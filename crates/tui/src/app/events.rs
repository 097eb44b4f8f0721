use api_types::{
    Paginated,
    admin::{Farmer, Group},
    auth::UserRecord,
    dashboard::DashboardSummary,
    loan::Loan,
    market::{MarketPrice, PricePrediction},
    planner::{Activity, GeneratedPlan, SavedPlan, Season},
    product::Product,
    wallet::{WalletBalance, WalletReceipt, WalletTransaction},
};
use engine::{EngineError, diary::ActivityFetch};

pub type Outcome<T> = Result<T, EngineError>;

/// Which product listing a response belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductList {
    Marketplace,
    Inventory,
}

/// Results of backend calls, sent from spawned tasks to the UI loop.
#[derive(Debug)]
pub enum AppEvent {
    LoginOtpRequested(Outcome<()>),
    LoginVerified(Outcome<UserRecord>),
    Dashboard(Outcome<DashboardSummary>),
    Products {
        list: ProductList,
        seq: u64,
        result: Outcome<Paginated<Product>>,
    },
    ProductSaved {
        list: ProductList,
        result: Outcome<Product>,
    },
    MarketPrices {
        seq: u64,
        result: Outcome<Paginated<MarketPrice>>,
    },
    MarketPriceSaved(Outcome<MarketPrice>),
    Prediction(Outcome<PricePrediction>),
    Balance(Outcome<WalletBalance>),
    History {
        seq: u64,
        result: Outcome<Paginated<WalletTransaction>>,
    },
    WalletOtpSent(Outcome<()>),
    WalletCompleted(Outcome<WalletReceipt>),
    Loans {
        seq: u64,
        result: Outcome<Paginated<Loan>>,
    },
    LoanSaved(Outcome<Loan>),
    LoanRepaid(Outcome<WalletReceipt>),
    PlanGenerated(Outcome<GeneratedPlan>),
    PlanSaved(Outcome<SavedPlan>),
    Seasons {
        seq: u64,
        result: Outcome<Paginated<Season>>,
    },
    Activities {
        fetch: ActivityFetch,
        result: Outcome<Vec<Activity>>,
    },
    ActivityUpdated(Outcome<Activity>),
    Groups {
        seq: u64,
        result: Outcome<Paginated<Group>>,
    },
    Farmers {
        seq: u64,
        result: Outcome<Paginated<Farmer>>,
    },
    GroupDecided(Outcome<Group>),
    FarmerDecided(Outcome<Farmer>),
}
