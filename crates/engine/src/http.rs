use std::time::Duration;

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
use reqwest::{Method, RequestBuilder, Url};
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::{
    ApiError, EngineError,
    backend::{
        AdminApi, ApiResult, AuthApi, DashboardApi, DiaryApi, LoanApi, MarketApi, PlannerApi,
        ProductApi, WalletApi,
    },
};

const IDEMPOTENCY_HEADER: &str = "Idempotency-Key";

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: String,
}

/// Query parameter names of one listing endpoint.
#[derive(Debug, Clone, Copy)]
struct QueryKeys {
    search: &'static str,
    facet: &'static str,
    scope: &'static str,
}

const PRODUCT_KEYS: QueryKeys = QueryKeys {
    search: "search",
    facet: "status",
    scope: "farmer_id",
};

const MARKET_KEYS: QueryKeys = QueryKeys {
    search: "product",
    facet: "region",
    scope: "farmer_id",
};

const WALLET_KEYS: QueryKeys = QueryKeys {
    search: "search",
    facet: "type",
    scope: "farmer_id",
};

const LOAN_KEYS: QueryKeys = QueryKeys {
    search: "search",
    facet: "status",
    scope: "farmer_id",
};

const SEASON_KEYS: QueryKeys = QueryKeys {
    search: "search",
    facet: "status",
    scope: "farmer_id",
};

const ADMIN_KEYS: QueryKeys = QueryKeys {
    search: "search",
    facet: "status",
    scope: "group_id",
};

fn page_params(query: &PageQuery, keys: QueryKeys) -> Vec<(&'static str, String)> {
    let mut params = vec![
        ("page", query.page.max(1).to_string()),
        ("limit", query.limit.to_string()),
    ];
    let optional = [
        (keys.search, &query.search),
        ("category", &query.category),
        (keys.facet, &query.facet),
        (keys.scope, &query.scope),
    ];
    for (key, value) in optional {
        if let Some(value) = value.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
            params.push((key, value.to_string()));
        }
    }
    params
}

/// Backend client over HTTP/JSON.
///
/// Cheap to clone; the session token is attached as a bearer token once the
/// user is signed in (see [`HttpBackend::with_token`]).
#[derive(Debug, Clone)]
pub struct HttpBackend {
    base_url: Url,
    http: reqwest::Client,
    token: Option<String>,
}

impl HttpBackend {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, EngineError> {
        let mut raw = base_url.trim().to_string();
        // `Url::join` drops the last path segment unless it ends with '/'.
        if !raw.ends_with('/') {
            raw.push('/');
        }
        let base_url =
            Url::parse(&raw).map_err(|err| ApiError::Url(format!("invalid base_url: {err}")))?;
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(ApiError::Transport)?;
        Ok(Self {
            base_url,
            http,
            token: None,
        })
    }

    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token;
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> ApiResult<RequestBuilder> {
        let endpoint = self
            .base_url
            .join(path)
            .map_err(|err| ApiError::Url(format!("{path}: {err}")))?;
        tracing::debug!(%method, %endpoint, "backend request");
        let builder = self.http.request(method, endpoint);
        Ok(match self.token.as_deref() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        })
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&'static str, String)],
    ) -> ApiResult<T> {
        let req = self.request(Method::GET, path)?.query(params);
        read_json(req.send().await?).await
    }

    async fn send_json<B, T>(
        &self,
        method: Method,
        path: &str,
        body: &B,
        idempotency_key: Option<&str>,
    ) -> ApiResult<T>
    where
        B: Serialize + Sync + ?Sized,
        T: DeserializeOwned,
    {
        let mut req = self.request(method, path)?.json(body);
        if let Some(key) = idempotency_key {
            req = req.header(IDEMPOTENCY_HEADER, key);
        }
        read_json(req.send().await?).await
    }

    async fn post_unit<B>(&self, path: &str, body: &B) -> ApiResult<()>
    where
        B: Serialize + Sync + ?Sized,
    {
        let res = self.request(Method::POST, path)?.json(body).send().await?;
        if res.status().is_success() {
            return Ok(());
        }
        Err(error_from(res).await)
    }
}

async fn read_json<T: DeserializeOwned>(res: reqwest::Response) -> ApiResult<T> {
    if res.status().is_success() {
        return res.json::<T>().await.map_err(ApiError::Transport);
    }
    Err(error_from(res).await)
}

async fn error_from(res: reqwest::Response) -> ApiError {
    let status = res.status();
    let body = res
        .json::<ErrorResponse>()
        .await
        .map(|err| err.error)
        .unwrap_or_else(|_| "unknown error".to_string());
    tracing::warn!(status = status.as_u16(), error = %body, "backend refused request");
    ApiError::from_status(status.as_u16(), body)
}

impl AuthApi for HttpBackend {
    async fn request_login_otp(&self, body: &OtpRequest) -> ApiResult<()> {
        self.post_unit("auth/otp/request", body).await
    }

    async fn verify_login_otp(&self, body: &OtpVerify) -> ApiResult<UserRecord> {
        self.send_json(Method::POST, "auth/otp/verify", body, None)
            .await
    }
}

impl DashboardApi for HttpBackend {
    async fn dashboard(&self, farmer_id: &str) -> ApiResult<DashboardSummary> {
        self.get(&format!("dashboard/{farmer_id}"), &[]).await
    }
}

impl ProductApi for HttpBackend {
    async fn list_products(&self, query: &PageQuery) -> ApiResult<Paginated<Product>> {
        self.get("products", &page_params(query, PRODUCT_KEYS))
            .await
    }

    async fn create_product(&self, product: &Product, idempotency_key: &str) -> ApiResult<Product> {
        self.send_json(Method::POST, "products", product, Some(idempotency_key))
            .await
    }

    async fn update_product(&self, id: &str, product: &Product) -> ApiResult<Product> {
        self.send_json(Method::PUT, &format!("products/{id}"), product, None)
            .await
    }
}

impl MarketApi for HttpBackend {
    async fn list_market_prices(&self, query: &PageQuery) -> ApiResult<Paginated<MarketPrice>> {
        self.get("market-prices", &page_params(query, MARKET_KEYS))
            .await
    }

    async fn create_market_price(
        &self,
        price: &MarketPrice,
        idempotency_key: &str,
    ) -> ApiResult<MarketPrice> {
        self.send_json(Method::POST, "market-prices", price, Some(idempotency_key))
            .await
    }

    async fn update_market_price(&self, id: &str, price: &MarketPrice) -> ApiResult<MarketPrice> {
        self.send_json(Method::PUT, &format!("market-prices/{id}"), price, None)
            .await
    }

    async fn predict_price(&self, product: &str, region: &str) -> ApiResult<PricePrediction> {
        let params = [("product", product.to_string()), ("region", region.to_string())];
        self.get("market-prices/predict", &params).await
    }
}

impl WalletApi for HttpBackend {
    async fn balance(&self, farmer_id: &str) -> ApiResult<WalletBalance> {
        self.get(&format!("wallet/{farmer_id}/balance"), &[]).await
    }

    async fn wallet_history(&self, query: &PageQuery) -> ApiResult<Paginated<WalletTransaction>> {
        let farmer_id = query
            .scope
            .as_deref()
            .ok_or_else(|| ApiError::Url("wallet history needs a farmer id".to_string()))?;
        let mut params = page_params(query, WALLET_KEYS);
        params.retain(|(key, _)| *key != WALLET_KEYS.scope);
        self.get(&format!("wallet/{farmer_id}/transactions"), &params)
            .await
    }

    async fn send_otp(&self, body: &OtpSend) -> ApiResult<()> {
        self.post_unit("wallet/otp/send", body).await
    }

    async fn verify_otp(&self, body: &OtpCheck) -> ApiResult<()> {
        self.post_unit("wallet/otp/verify", body).await
    }

    async fn top_up(&self, body: &MobileMoneyRequest) -> ApiResult<WalletReceipt> {
        self.send_json(Method::POST, "wallet/topup", body, None)
            .await
    }

    async fn withdraw(&self, body: &MobileMoneyRequest) -> ApiResult<WalletReceipt> {
        self.send_json(Method::POST, "wallet/withdraw", body, None)
            .await
    }

    async fn transfer(&self, body: &PeerPayment) -> ApiResult<WalletReceipt> {
        self.send_json(Method::POST, "wallet/transfer", body, None)
            .await
    }

    async fn pay(&self, body: &PeerPayment) -> ApiResult<WalletReceipt> {
        self.send_json(Method::POST, "wallet/pay", body, None).await
    }
}

impl LoanApi for HttpBackend {
    async fn list_loans(&self, query: &PageQuery) -> ApiResult<Paginated<Loan>> {
        self.get("loans", &page_params(query, LOAN_KEYS)).await
    }

    async fn create_loan(&self, loan: &Loan, idempotency_key: &str) -> ApiResult<Loan> {
        self.send_json(Method::POST, "loans", loan, Some(idempotency_key))
            .await
    }

    async fn update_loan(&self, id: &str, loan: &Loan) -> ApiResult<Loan> {
        self.send_json(Method::PUT, &format!("loans/{id}"), loan, None)
            .await
    }

    async fn repay_loan(&self, id: &str, body: &LoanRepayment) -> ApiResult<WalletReceipt> {
        self.send_json(Method::POST, &format!("loans/{id}/repay"), body, None)
            .await
    }
}

impl PlannerApi for HttpBackend {
    async fn generate_plan(&self, request: &PlanRequest) -> ApiResult<GeneratedPlan> {
        self.send_json(Method::POST, "planner/generate", request, None)
            .await
    }

    async fn save_plan(&self, plan: &SavePlan) -> ApiResult<SavedPlan> {
        self.send_json(Method::POST, "planner/plans", plan, None)
            .await
    }
}

impl DiaryApi for HttpBackend {
    async fn list_seasons(&self, query: &PageQuery) -> ApiResult<Paginated<Season>> {
        self.get("seasons", &page_params(query, SEASON_KEYS)).await
    }

    async fn season_activities(&self, season_id: &str) -> ApiResult<Vec<Activity>> {
        self.get(&format!("seasons/{season_id}/activities"), &[])
            .await
    }

    async fn update_activity(&self, id: &str, update: &ActivityUpdate) -> ApiResult<Activity> {
        self.send_json(Method::PATCH, &format!("activities/{id}"), update, None)
            .await
    }
}

impl AdminApi for HttpBackend {
    async fn list_groups(&self, query: &PageQuery) -> ApiResult<Paginated<Group>> {
        self.get("admin/groups", &page_params(query, ADMIN_KEYS))
            .await
    }

    async fn list_farmers(&self, query: &PageQuery) -> ApiResult<Paginated<Farmer>> {
        self.get("admin/farmers", &page_params(query, ADMIN_KEYS))
            .await
    }

    async fn decide_group(&self, id: &str, decision: &Decision) -> ApiResult<Group> {
        self.send_json(Method::PATCH, &format!("admin/groups/{id}"), decision, None)
            .await
    }

    async fn decide_farmer(&self, id: &str, decision: &Decision) -> ApiResult<Farmer> {
        self.send_json(Method::PATCH, &format!("admin/farmers/{id}"), decision, None)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_params_skip_empty_filters() {
        let query = PageQuery {
            page: 2,
            limit: 10,
            search: Some("  ".to_string()),
            category: Some("grain".to_string()),
            facet: None,
            scope: Some("f-1".to_string()),
        };
        let params = page_params(&query, PRODUCT_KEYS);
        assert_eq!(
            params,
            vec![
                ("page", "2".to_string()),
                ("limit", "10".to_string()),
                ("category", "grain".to_string()),
                ("farmer_id", "f-1".to_string()),
            ]
        );
    }

    #[test]
    fn market_listing_searches_by_product_and_region() {
        let query = PageQuery {
            page: 1,
            limit: 20,
            search: Some("maize".to_string()),
            facet: Some("Nakuru".to_string()),
            ..PageQuery::default()
        };
        let params = page_params(&query, MARKET_KEYS);
        assert!(params.contains(&("product", "maize".to_string())));
        assert!(params.contains(&("region", "Nakuru".to_string())));
    }

    #[test]
    fn base_url_keeps_its_path_prefix() {
        let backend = HttpBackend::new("http://127.0.0.1:8080/api", Duration::from_secs(5)).unwrap();
        let url = backend.base_url().join("products").unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:8080/api/products");
    }
}
