use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// One page of a backend collection.
///
/// `page` is 1-based. The backend never returns more than `limit` items.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub limit: u32,
}

impl<T> Paginated<T> {
    pub fn empty(limit: u32) -> Self {
        Self {
            data: Vec::new(),
            total: 0,
            page: 1,
            limit,
        }
    }

    /// Last valid page, `ceil(total / limit)`, never below 1.
    pub fn last_page(&self) -> u32 {
        if self.limit == 0 {
            return 1;
        }
        let pages = self.total.div_ceil(u64::from(self.limit));
        u32::try_from(pages).unwrap_or(u32::MAX).max(1)
    }
}

/// Parameters for fetching one page of a listing.
///
/// `facet` is the listing-specific second filter (region, status or type) and
/// `scope` restricts the listing to one owner (usually the farmer id).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PageQuery {
    pub page: u32,
    pub limit: u32,
    pub search: Option<String>,
    pub category: Option<String>,
    pub facet: Option<String>,
    pub scope: Option<String>,
}

pub mod auth {
    use super::*;

    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum Role {
        #[default]
        Farmer,
        Admin,
    }

    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct OtpRequest {
        pub email: String,
    }

    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct OtpVerify {
        pub email: String,
        pub otp: String,
    }

    /// User record returned by a successful OTP verification.
    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    pub struct UserRecord {
        pub id: String,
        pub email: String,
        #[serde(default)]
        pub name: Option<String>,
        /// Registered mobile number, used for wallet confirmations.
        #[serde(default)]
        pub phone: Option<String>,
        #[serde(default)]
        pub role: Role,
        /// Bearer token, when the backend issues one.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub token: Option<String>,
    }
}

pub mod product {
    use super::*;

    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum ProductStatus {
        #[default]
        Available,
        Reserved,
        SoldOut,
    }

    impl ProductStatus {
        pub const fn as_str(self) -> &'static str {
            match self {
                Self::Available => "available",
                Self::Reserved => "reserved",
                Self::SoldOut => "sold_out",
            }
        }
    }

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    pub struct Product {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub id: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub farmer_id: Option<String>,
        pub name: String,
        pub category: String,
        pub quantity: f64,
        pub unit: String,
        /// Unit price in minor units (cents).
        pub price_minor: i64,
        pub status: ProductStatus,
        #[serde(default)]
        pub description: Option<String>,
    }
}

pub mod market {
    use super::*;

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    pub struct MarketPrice {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub id: Option<String>,
        pub product: String,
        pub category: String,
        pub region: String,
        pub market: String,
        pub unit: String,
        pub price_minor: i64,
        #[serde(default)]
        pub date: Option<NaiveDate>,
        /// Authoritative reference price for the product/region.
        #[serde(default)]
        pub is_benchmark: bool,
        #[serde(default)]
        pub source: Option<String>,
    }

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    pub struct PricePrediction {
        pub product: String,
        pub region: String,
        pub predicted_price_minor: i64,
        /// 0.0 ..= 1.0
        pub confidence: f64,
        pub horizon_days: u32,
    }
}

pub mod wallet {
    use super::*;

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    pub struct WalletBalance {
        pub farmer_id: String,
        pub balance_minor: i64,
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum TransactionKind {
        Deposit,
        Withdraw,
        Transfer,
        Pay,
        LoanDisbursement,
        LoanRepayment,
    }

    impl TransactionKind {
        pub const fn as_str(self) -> &'static str {
            match self {
                Self::Deposit => "deposit",
                Self::Withdraw => "withdraw",
                Self::Transfer => "transfer",
                Self::Pay => "pay",
                Self::LoanDisbursement => "loan_disbursement",
                Self::LoanRepayment => "loan_repayment",
            }
        }
    }

    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum TransactionStatus {
        #[default]
        Pending,
        Completed,
        Failed,
    }

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    pub struct WalletTransaction {
        pub id: String,
        #[serde(rename = "type")]
        pub kind: TransactionKind,
        pub amount_minor: i64,
        #[serde(default)]
        pub method: Option<String>,
        #[serde(default)]
        pub reference: Option<String>,
        #[serde(default)]
        pub status: TransactionStatus,
        pub created_at: DateTime<Utc>,
    }

    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct OtpSend {
        pub phone: String,
    }

    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct OtpCheck {
        pub phone: String,
        pub otp: String,
    }

    /// Top-up and withdraw body. Mobile-money amounts are whole shillings.
    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct MobileMoneyRequest {
        pub farmer_id: String,
        pub amount: u64,
        pub phone_number: String,
    }

    /// Transfer and pay body.
    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct PeerPayment {
        pub farmer_id: String,
        pub amount: u64,
        pub destination: String,
    }

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    pub struct WalletReceipt {
        pub reference: String,
        #[serde(default)]
        pub status: TransactionStatus,
    }
}

pub mod loan {
    use super::*;

    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum LoanStatus {
        #[default]
        Pending,
        Approved,
        Rejected,
        Active,
        Repaid,
    }

    impl LoanStatus {
        pub const fn as_str(self) -> &'static str {
            match self {
                Self::Pending => "pending",
                Self::Approved => "approved",
                Self::Rejected => "rejected",
                Self::Active => "active",
                Self::Repaid => "repaid",
            }
        }
    }

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    pub struct Loan {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub id: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub farmer_id: Option<String>,
        /// Requested principal, whole shillings.
        pub amount: u64,
        pub purpose: String,
        pub term_months: u32,
        #[serde(default)]
        pub status: LoanStatus,
        /// Outstanding balance in minor units, filled by the backend.
        #[serde(default)]
        pub balance_minor: i64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub applied_at: Option<DateTime<Utc>>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub due_date: Option<NaiveDate>,
    }

    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct LoanRepayment {
        pub farmer_id: String,
        pub amount: u64,
    }
}

pub mod planner {
    use super::*;

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    pub struct PlanRequest {
        pub crop: String,
        pub location: String,
        pub acreage: f64,
        pub planting_date: NaiveDate,
    }

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    pub struct SeasonDraft {
        pub crop: String,
        pub location: String,
        pub acreage: f64,
        pub start_date: NaiveDate,
        pub expected_harvest: NaiveDate,
    }

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    pub struct Season {
        pub id: String,
        pub crop: String,
        pub location: String,
        pub acreage: f64,
        pub start_date: NaiveDate,
        pub expected_harvest: NaiveDate,
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum ActivityKind {
        LandPreparation,
        Planting,
        Fertilizing,
        Weeding,
        Spraying,
        Irrigation,
        Harvest,
        #[serde(other)]
        Other,
    }

    impl ActivityKind {
        pub fn label(self) -> &'static str {
            match self {
                Self::LandPreparation => "Land preparation",
                Self::Planting => "Planting",
                Self::Fertilizing => "Fertilizing",
                Self::Weeding => "Weeding",
                Self::Spraying => "Spraying",
                Self::Irrigation => "Irrigation",
                Self::Harvest => "Harvest",
                Self::Other => "Other",
            }
        }
    }

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    pub struct Activity {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub id: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub season_id: Option<String>,
        pub name: String,
        pub kind: ActivityKind,
        pub planned_date: NaiveDate,
        pub deadline: NaiveDate,
        #[serde(default)]
        pub notes: Option<String>,
        #[serde(default)]
        pub completed: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub completed_at: Option<DateTime<Utc>>,
    }

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    pub struct GeneratedPlan {
        pub season: SeasonDraft,
        pub activities: Vec<Activity>,
    }

    /// Season and activities persisted in one call.
    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    pub struct SavePlan {
        pub farmer_id: String,
        pub season: SeasonDraft,
        pub activities: Vec<Activity>,
    }

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    pub struct SavedPlan {
        pub season_id: String,
        #[serde(default)]
        pub activity_ids: Vec<String>,
    }

    #[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
    pub struct ActivityUpdate {
        #[serde(skip_serializing_if = "Option::is_none")]
        pub completed: Option<bool>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub planned_date: Option<NaiveDate>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub deadline: Option<NaiveDate>,
    }
}

pub mod admin {
    use super::*;

    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum ApprovalStatus {
        #[default]
        Pending,
        Approved,
        Rejected,
    }

    impl ApprovalStatus {
        pub const fn as_str(self) -> &'static str {
            match self {
                Self::Pending => "pending",
                Self::Approved => "approved",
                Self::Rejected => "rejected",
            }
        }
    }

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    pub struct Group {
        pub id: String,
        pub name: String,
        #[serde(default)]
        pub region: Option<String>,
        #[serde(default)]
        pub members: u32,
        #[serde(default)]
        pub status: ApprovalStatus,
    }

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    pub struct Farmer {
        pub id: String,
        pub name: String,
        pub email: String,
        #[serde(default)]
        pub phone: Option<String>,
        #[serde(default)]
        pub region: Option<String>,
        #[serde(default)]
        pub group: Option<String>,
        #[serde(default)]
        pub status: ApprovalStatus,
    }

    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct Decision {
        pub status: ApprovalStatus,
    }
}

pub mod dashboard {
    use super::*;

    #[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
    pub struct DashboardSummary {
        pub balance_minor: i64,
        pub product_count: u64,
        pub active_loans: u32,
        pub outstanding_loan_minor: i64,
        #[serde(default)]
        pub upcoming_activities: Vec<planner::Activity>,
        #[serde(default)]
        pub benchmark_prices: Vec<market::MarketPrice>,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_page_rounds_up() {
        let mut page = Paginated::<u8>::empty(10);
        assert_eq!(page.last_page(), 1);
        page.total = 10;
        assert_eq!(page.last_page(), 1);
        page.total = 11;
        assert_eq!(page.last_page(), 2);
    }

    #[test]
    fn zero_limit_has_single_page() {
        let page = Paginated::<u8> {
            data: Vec::new(),
            total: 40,
            page: 1,
            limit: 0,
        };
        assert_eq!(page.last_page(), 1);
    }

    #[test]
    fn product_create_body_omits_missing_id() {
        let product = product::Product {
            id: None,
            farmer_id: None,
            name: "Maize".to_string(),
            category: "produce".to_string(),
            quantity: 0.0,
            unit: "kg".to_string(),
            price_minor: 0,
            status: product::ProductStatus::Available,
            description: None,
        };
        let json = serde_json::to_value(&product).unwrap();
        assert!(json.get("id").is_none());
        assert_eq!(json["status"], "available");
    }

    #[test]
    fn wallet_transaction_kind_uses_type_key() {
        let raw = r#"{"id":"t1","type":"deposit","amount_minor":50000,"created_at":"2026-03-01T10:00:00Z"}"#;
        let tx: wallet::WalletTransaction = serde_json::from_str(raw).unwrap();
        assert_eq!(tx.kind, wallet::TransactionKind::Deposit);
        assert_eq!(tx.status, wallet::TransactionStatus::Pending);
    }

    #[test]
    fn unknown_activity_kind_maps_to_other() {
        let kind: planner::ActivityKind = serde_json::from_str(r#""mulching""#).unwrap();
        assert_eq!(kind, planner::ActivityKind::Other);
    }
}
